//! Planet scenery: buildings to ram, crates to collect, and the debris of past hits.

use std::collections::VecDeque;
use std::f32::consts::FRAC_PI_4;

use engine_core::{rotate_towards, Quat, Transform, Vec3};
use procgen::{random_rotation, scatter, Placement, PlanetSurface, ScatterConfig};
use rand::prelude::*;
use renderer::{Material, MeshData, NodeId, SceneGraph, Vertex};

/// Buildings closer than this (great-circle angle to the camera) duck down.
pub const SHRINKING_ANGULAR_DISTANCE: f32 = FRAC_PI_4;
/// Angle under which the train tip hits a building.
pub const COLLISION_ANGULAR_DISTANCE: f32 = 0.02;
/// Angle under which the train tip picks up a crate.
pub const CRATE_ANGULAR_DISTANCE: f32 = 0.03;
/// Punch amount per second of frame time.
pub const PUNCH_RATE: f32 = 2.0;
/// Hit buildings kept flying before the oldest is removed.
pub const MAX_HIT_BUILDINGS: usize = 64;

/// Frame time assumed for the punch applied on impact.
const IMPACT_FRAME: f32 = 1.0 / 60.0;

const PLANET_COLOR: u32 = 0x123456;
const BUILDING_COLOR: u32 = 0xaabbcc;
const CRATE_COLOR: u32 = 0xffcc33;

/// Scale factor for a building at `angular_distance` from the camera: (horizontal, vertical).
pub fn shrink_factors(angular_distance: f32) -> (f32, f32) {
    if angular_distance < SHRINKING_ANGULAR_DISTANCE {
        let factor_y = 0.4 + 0.6 * (angular_distance / SHRINKING_ANGULAR_DISTANCE);
        let factor_xz = 0.2 + 0.8 * factor_y;
        (factor_xz, factor_y)
    } else {
        (1.0, 1.0)
    }
}

/// A scenery instance anchored to the surface.
#[derive(Debug, Clone)]
pub struct Building {
    /// Anchor pivot at the planet centre.
    anchor: NodeId,
    /// Box node on the anchor's +Y arm.
    node: NodeId,
    rotation: Quat,
    /// Distance from the planet centre.
    height: f32,
    scale: Vec3,
}

impl Building {
    /// World-space centre of the instance.
    pub fn world_position(&self) -> Vec3 {
        self.rotation * Vec3::new(0.0, self.height, 0.0)
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    fn local_transform(&self) -> Transform {
        Transform {
            position: Vec3::new(0.0, self.height, 0.0),
            rotation: Quat::IDENTITY,
            scale: self.scale,
        }
    }
}

/// A building knocked loose by the train.
#[derive(Debug, Clone)]
pub struct HitBuilding {
    pivot: NodeId,
    transform: Transform,
    linear_velocity: Vec3,
    target_rotation: Quat,
}

impl HitBuilding {
    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }
}

/// Owner of the planet mesh and all scenery on it.
pub struct Planet {
    surface: PlanetSurface,
    root: NodeId,
    buildings: Vec<Building>,
    /// Base scales, index-aligned with `buildings`.
    scales: Vec<Vec3>,
    hit_buildings: VecDeque<HitBuilding>,
    crates: Vec<Building>,
    rng: StdRng,
}

impl Planet {
    /// Build the planet with `building_count` buildings and `crate_count` crates
    /// scattered from `seed`.
    pub fn new(
        scene: &mut impl SceneGraph,
        parent: NodeId,
        surface: PlanetSurface,
        building_count: usize,
        crate_count: usize,
        seed: u64,
    ) -> Self {
        let buildings = scatter(seed, building_count, ScatterConfig::BUILDINGS);
        let crates = scatter(seed.wrapping_add(1), crate_count, ScatterConfig::CRATES);
        Self::with_placements(scene, parent, surface, &buildings, &crates, seed.wrapping_add(2))
    }

    /// Build the planet from explicit placements.
    pub fn with_placements(
        scene: &mut impl SceneGraph,
        parent: NodeId,
        surface: PlanetSurface,
        buildings: &[Placement],
        crates: &[Placement],
        seed: u64,
    ) -> Self {
        let root = scene.create_node(parent);
        let (vertices, indices) = surface.generate_mesh(32, 32);
        let vertices = vertices
            .into_iter()
            .map(|v| Vertex::new(v.position, v.normal))
            .collect();
        scene.set_mesh(root, MeshData::new(vertices, indices), Material::from_hex(PLANET_COLOR));

        let mut planet = Self {
            surface,
            root,
            buildings: Vec::with_capacity(buildings.len()),
            scales: Vec::with_capacity(buildings.len()),
            hit_buildings: VecDeque::new(),
            crates: Vec::with_capacity(crates.len()),
            rng: StdRng::seed_from_u64(seed),
        };
        for placement in buildings {
            let building = planet.spawn(scene, placement, Material::from_hex(BUILDING_COLOR));
            planet.buildings.push(building);
            planet.scales.push(placement.base_scale);
        }
        for placement in crates {
            let c = planet.spawn(scene, placement, Material::from_hex(CRATE_COLOR));
            planet.crates.push(c);
        }
        log::info!(
            "Planet ready: radius {}, {} buildings, {} crates",
            planet.surface.radius(),
            planet.buildings.len(),
            planet.crates.len()
        );
        planet
    }

    fn spawn(&mut self, scene: &mut impl SceneGraph, placement: &Placement, material: Material) -> Building {
        let anchor = scene.create_node(self.root);
        scene.set_transform(anchor, Transform::from_position_rotation(Vec3::ZERO, placement.rotation));
        let node = scene.create_node(anchor);
        scene.set_mesh(node, MeshData::cuboid(Vec3::ONE), material);
        let building = Building {
            anchor,
            node,
            rotation: placement.rotation,
            height: self.surface.height_at(placement.direction()),
            scale: placement.base_scale,
        };
        scene.set_transform(node, building.local_transform());
        building
    }

    pub fn radius(&self) -> f32 {
        self.surface.radius()
    }

    pub fn surface(&self) -> &PlanetSurface {
        &self.surface
    }

    /// Node carrying the planet mesh; buildings and crates hang below it.
    pub fn root_node(&self) -> NodeId {
        self.root
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn base_scales(&self) -> &[Vec3] {
        &self.scales
    }

    pub fn hit_buildings(&self) -> impl ExactSizeIterator<Item = &HitBuilding> {
        self.hit_buildings.iter()
    }

    pub fn crates(&self) -> &[Building] {
        &self.crates
    }

    /// Shrink buildings near `camera_position` so they do not block the view.
    pub fn reduce_buildings(&mut self, scene: &mut impl SceneGraph, camera_position: Vec3) {
        for (building, base) in self.buildings.iter_mut().zip(self.scales.iter()) {
            let angular_distance = building.world_position().angle_between(camera_position);
            let (xz, y) = shrink_factors(angular_distance);
            building.scale = *base * Vec3::new(xz, y, xz);
            scene.set_transform(building.node, building.local_transform());
        }
    }

    /// Index and angle of the instance closest (by great-circle angle) to `position`.
    fn closest(instances: &[Building], position: Vec3) -> Option<(usize, f32)> {
        instances
            .iter()
            .enumerate()
            .map(|(i, b)| (i, b.world_position().angle_between(position)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Knock over the building under the train tip, if any.
    ///
    /// The hit building leaves the active set immediately, so it can only be hit once.
    pub fn check_collision(
        &mut self,
        scene: &mut impl SceneGraph,
        tip_position: Vec3,
        direction: Vec3,
        speed_factor: f32,
    ) -> bool {
        let Some((index, angle)) = Self::closest(&self.buildings, tip_position) else {
            return false;
        };
        if angle >= COLLISION_ANGULAR_DISTANCE {
            return false;
        }

        let building = self.buildings.swap_remove(index);
        self.scales.swap_remove(index);

        // Detach into a free pivot sitting where the building was.
        let pivot = scene.create_node(self.root);
        let transform = Transform::from_position_rotation(building.world_position(), building.rotation);
        scene.set_transform(pivot, transform);
        scene.reparent(building.node, pivot);
        scene.set_transform(
            building.node,
            Transform {
                scale: building.scale,
                ..Default::default()
            },
        );
        scene.remove_node(building.anchor);

        self.hit_buildings.push_back(HitBuilding {
            pivot,
            transform,
            linear_velocity: direction * speed_factor,
            target_rotation: random_rotation(&mut self.rng),
        });
        while self.hit_buildings.len() > MAX_HIT_BUILDINGS {
            if let Some(old) = self.hit_buildings.pop_front() {
                scene.remove_node(old.pivot);
            }
        }
        let last = self.hit_buildings.len() - 1;
        self.punch(scene, last, IMPACT_FRAME * PUNCH_RATE);
        log::debug!("Building hit at angle {:.4}, {} left", angle, self.buildings.len());
        true
    }

    /// Push hit building `index` along its velocity and spin it toward its target.
    pub fn punch(&mut self, scene: &mut impl SceneGraph, index: usize, quantity: f32) {
        let Some(hit) = self.hit_buildings.get_mut(index) else {
            return;
        };
        hit.transform.position += hit.linear_velocity * quantity;
        hit.transform.rotation = rotate_towards(hit.transform.rotation, hit.target_rotation, quantity);
        scene.set_transform(hit.pivot, hit.transform);
    }

    /// Advance every flying building by one frame of `duration` seconds.
    pub fn update_hit(&mut self, scene: &mut impl SceneGraph, duration: f32) {
        let quantity = duration * PUNCH_RATE;
        for index in 0..self.hit_buildings.len() {
            self.punch(scene, index, quantity);
        }
    }

    /// Collect the crate under `position`, if any. A fresh crate appears elsewhere.
    pub fn check_collision_crate(&mut self, scene: &mut impl SceneGraph, position: Vec3) -> bool {
        let Some((index, angle)) = Self::closest(&self.crates, position) else {
            return false;
        };
        if angle >= CRATE_ANGULAR_DISTANCE {
            return false;
        }
        let collected = self.crates.swap_remove(index);
        scene.remove_node(collected.anchor);
        let placement = ScatterConfig::CRATES.sample(&mut self.rng);
        let fresh = self.spawn(scene, &placement, Material::from_hex(CRATE_COLOR));
        self.crates.push(fresh);
        log::debug!("Crate collected at angle {:.4}", angle);
        true
    }
}
