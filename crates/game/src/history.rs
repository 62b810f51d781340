//! Pose history: the sampled path a moving body leaves behind.

use std::collections::VecDeque;

use engine_core::{Pose, Quat, Vec3};

/// Append-only (at the tail) list of poses, pruned from the head.
///
/// Samples closer than `min_distance` to the last accepted sample are rejected, which
/// keeps consecutive entries spatially distinct.
#[derive(Debug, Clone)]
pub struct PoseHistory {
    poses: VecDeque<Pose>,
    min_distance: f32,
    /// Hard cap; samples beyond it are dropped.
    capacity: Option<usize>,
    last_accepted: Vec3,
}

impl PoseHistory {
    pub fn new(min_distance: f32) -> Self {
        Self {
            poses: VecDeque::new(),
            min_distance,
            capacity: None,
            last_accepted: Vec3::ZERO,
        }
    }

    /// Refuse samples once `capacity` poses are held.
    pub fn with_capacity_limit(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Pose> {
        self.poses.get(index)
    }

    pub fn last(&self) -> Option<&Pose> {
        self.poses.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Pose> + ExactSizeIterator {
        self.poses.iter()
    }

    fn is_full(&self) -> bool {
        self.capacity.is_some_and(|cap| self.poses.len() >= cap)
    }

    /// Record a sample. Returns whether it was kept.
    ///
    /// The distance guard compares against the last accepted sample, starting from the
    /// origin, so a first sample sitting at the origin is rejected.
    pub fn push(&mut self, position: Vec3, rotation: Quat) -> bool {
        if self.last_accepted.distance(position) < self.min_distance {
            return false;
        }
        self.push_unchecked(position, rotation)
    }

    /// Record a sample bypassing the distance guard (the capacity limit still applies).
    pub fn push_unchecked(&mut self, position: Vec3, rotation: Quat) -> bool {
        if self.is_full() {
            return false;
        }
        self.poses.push_back(Pose::from_position_rotation(position, rotation));
        self.last_accepted = position;
        true
    }

    /// Drop `count` poses from the head.
    pub fn prune_front(&mut self, count: usize) {
        let count = count.min(self.poses.len());
        self.poses.drain(..count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_duplicates_are_rejected() {
        let mut history = PoseHistory::new(0.1);
        assert!(history.push(Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY));
        for i in 0..20 {
            let jitter = Vec3::new(1.0 + i as f32 * 0.001, 0.0, 0.0);
            assert!(!history.push(jitter, Quat::IDENTITY));
        }
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn capacity_limit_drops_new_samples() {
        let mut history = PoseHistory::new(0.1).with_capacity_limit(3);
        for i in 1..=5 {
            history.push(Vec3::new(i as f32, 0.0, 0.0), Quat::IDENTITY);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.last().unwrap().position.x, 3.0);
    }

    #[test]
    fn prune_front_keeps_tail() {
        let mut history = PoseHistory::new(0.0);
        for i in 0..10 {
            history.push_unchecked(Vec3::new(i as f32, 0.0, 0.0), Quat::IDENTITY);
        }
        history.prune_front(4);
        assert_eq!(history.len(), 6);
        assert_eq!(history.get(0).unwrap().position.x, 4.0);
        history.prune_front(100);
        assert!(history.is_empty());
    }
}
