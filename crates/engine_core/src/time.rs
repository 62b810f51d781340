//! Time management for the game loop.
//!
//! The host drives the simulation with variable frame durations. [`Time`] keeps the
//! frame statistics and [`MicroStepper`] turns "how far should we have moved this
//! frame" into a whole number of fixed micro-steps, carrying the remainder over.

use std::time::Duration;

/// Frame timing fed by the host's per-frame callback.
#[derive(Debug, Default)]
pub struct Time {
    /// Duration of the last frame.
    delta: Duration,
    /// Total elapsed time since start.
    elapsed: Duration,
    /// Frame count since start.
    frame_count: u64,
}

impl Time {
    /// Create a new time manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new frame of the given duration.
    pub fn update(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
    }

    /// Get the delta time in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get the delta time as a Duration.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Get total elapsed time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the current FPS (averaged over last frame).
    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }
}

/// Splits a continuous amount of motion into fixed-size micro-steps.
#[derive(Debug, Clone)]
pub struct MicroStepper {
    /// Size of one micro-step (radians of pivot rotation).
    step: f32,
    /// Upper bound on steps handed out per call.
    max_steps: u32,
    /// Motion owed from previous calls that did not fill a whole step.
    remainder: f32,
}

impl MicroStepper {
    pub fn new(step: f32, max_steps: u32) -> Self {
        Self {
            step: step.max(f32::EPSILON),
            max_steps,
            remainder: 0.0,
        }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Accumulate `amount` of motion and return how many micro-steps to run now.
    ///
    /// Motion beyond `max_steps` is discarded rather than carried over, so one long
    /// stall cannot snowball into every following frame.
    pub fn advance(&mut self, amount: f32) -> u32 {
        self.remainder += amount.max(0.0);
        let wanted = (self.remainder / self.step).floor();
        if wanted > self.max_steps as f32 {
            log::warn!(
                "Frame asked for {} micro-steps, capping at {}",
                wanted as u64,
                self.max_steps
            );
            self.remainder = 0.0;
            return self.max_steps;
        }
        self.remainder -= wanted * self.step;
        wanted as u32
    }

    /// Forget any carried remainder.
    pub fn reset(&mut self) {
        self.remainder = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_accumulates_host_frames() {
        let mut time = Time::new();
        time.update(Duration::from_millis(16));
        time.update(Duration::from_millis(20));
        assert_eq!(time.frame_count(), 2);
        assert!((time.elapsed_seconds() - 0.036).abs() < 1e-6);
        assert!((time.fps() - 50.0).abs() < 1e-3);
    }

    /// Fractional steps are carried so slow frames still move eventually.
    #[test]
    fn micro_stepper_carries_remainder() {
        let mut stepper = MicroStepper::new(0.001, 1000);
        assert_eq!(stepper.advance(0.0025), 2);
        assert_eq!(stepper.advance(0.0006), 1);
        assert_eq!(stepper.advance(0.0), 0);
    }

    #[test]
    fn micro_stepper_caps_long_stalls() {
        let mut stepper = MicroStepper::new(0.001, 100);
        assert_eq!(stepper.advance(5.0), 100);
        assert_eq!(stepper.advance(0.0), 0);
    }
}
