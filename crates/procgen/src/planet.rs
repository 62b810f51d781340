//! Planet surface generation.
//!
//! **Seed-based replayability:** scatter placement is driven by a seeded `StdRng`, so the
//! same seed always lays out the same scenery. Surface relief is a pure function of the
//! surface direction.

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};
use noise::{NoiseFn, ScaleBias, ScalePoint};
use rand::prelude::*;
use std::f32::consts::TAU;

use crate::value_noise::ValueNoise;

/// Vertex for the planet sphere mesh.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SurfaceVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Configuration for the planet surface.
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    /// Mean radius of the sphere.
    pub radius: f32,
    /// Peak height deviation above/below `radius`.
    pub relief: f32,
    /// Noise frequency (lower = smoother).
    pub frequency: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            relief: 0.0,
            frequency: 4.0,
        }
    }
}

/// Sphere with noise-displaced relief.
pub struct PlanetSurface {
    config: SurfaceConfig,
    displacement: Box<dyn NoiseFn<f64, 3> + Send + Sync>,
}

impl std::fmt::Debug for PlanetSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanetSurface").field("config", &self.config).finish()
    }
}

impl PlanetSurface {
    pub fn new(config: SurfaceConfig) -> Self {
        // Value noise is [0, 1); remap to [-relief, relief).
        let relief = config.relief as f64;
        let displacement = ScaleBias::<f64, _, 3>::new(
            ScalePoint::new(ValueNoise).set_scale(config.frequency),
        )
        .set_scale(2.0 * relief)
        .set_bias(-relief);
        Self {
            config,
            displacement: Box::new(displacement),
        }
    }

    pub fn radius(&self) -> f32 {
        self.config.radius
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Surface height (distance from the planet centre) along `direction`.
    pub fn height_at(&self, direction: Vec3) -> f32 {
        let dir = direction.normalize_or_zero();
        if self.config.relief == 0.0 || dir == Vec3::ZERO {
            return self.config.radius;
        }
        let offset = self
            .displacement
            .get([dir.x as f64, dir.y as f64, dir.z as f64]);
        self.config.radius + offset as f32
    }

    /// Point on the surface along `direction`.
    pub fn surface_point(&self, direction: Vec3) -> Vec3 {
        direction.normalize_or_zero() * self.height_at(direction)
    }

    /// Build a latitude/longitude sphere mesh with relief applied.
    ///
    /// Returns vertices and a triangle index list. Normals are the radial direction,
    /// which is close enough for the small relief used in play.
    pub fn generate_mesh(&self, segments: u32, rings: u32) -> (Vec<SurfaceVertex>, Vec<u32>) {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let theta = v * std::f32::consts::PI;
            for seg in 0..=segments {
                let u = seg as f32 / segments as f32;
                let phi = u * TAU;
                let dir = Vec3::new(-phi.cos() * theta.sin(), theta.cos(), phi.sin() * theta.sin());
                let pos = dir * self.height_at(dir);
                vertices.push(SurfaceVertex {
                    position: pos.to_array(),
                    normal: dir.to_array(),
                });
            }
        }

        let stride = segments + 1;
        let mut indices = Vec::with_capacity((segments * rings * 6) as usize);
        for ring in 0..rings {
            for seg in 0..segments {
                let a = ring * stride + seg;
                let b = a + stride;
                if ring != 0 {
                    indices.extend_from_slice(&[a, b, a + 1]);
                }
                if ring != rings - 1 {
                    indices.extend_from_slice(&[a + 1, b, b + 1]);
                }
            }
        }
        (vertices, indices)
    }
}

/// Uniformly distributed random rotation (Shoemake's subgroup algorithm).
pub fn random_rotation<R: Rng + ?Sized>(rng: &mut R) -> Quat {
    let u1: f32 = rng.gen();
    let s1 = (1.0 - u1).sqrt();
    let s2 = u1.sqrt();
    let t1 = TAU * rng.gen::<f32>();
    let t2 = TAU * rng.gen::<f32>();
    Quat::from_xyzw(s1 * t1.sin(), s1 * t1.cos(), s2 * t2.sin(), s2 * t2.cos()).normalize()
}

/// One scattered scenery placement.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    /// Rotation of the anchor pivot; the instance sits on the pivot's local +Y axis.
    pub rotation: Quat,
    /// Box dimensions before any proximity shrinking.
    pub base_scale: Vec3,
}

impl Placement {
    /// Unit direction from the planet centre to the instance.
    pub fn direction(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

/// Ranges for scattered box scenery.
#[derive(Debug, Clone, Copy)]
pub struct ScatterConfig {
    pub width: (f32, f32),
    pub height: (f32, f32),
}

impl ScatterConfig {
    /// Thin tower blocks.
    pub const BUILDINGS: Self = Self {
        width: (0.1, 0.7),
        height: (2.3, 4.2),
    };
    /// Small pickup crates.
    pub const CRATES: Self = Self {
        width: (0.05, 0.05),
        height: (0.05, 0.05),
    };

    /// Draw one random placement.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Placement {
        let rotation = random_rotation(rng);
        let base_scale = Vec3::new(
            sample_range(rng, self.width),
            sample_range(rng, self.height),
            sample_range(rng, self.width),
        );
        Placement { rotation, base_scale }
    }
}

fn sample_range<R: Rng + ?Sized>(rng: &mut R, (lo, hi): (f32, f32)) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

/// Scatter `count` placements from a seeded generator.
pub fn scatter(seed: u64, count: usize, config: ScatterConfig) -> Vec<Placement> {
    let mut rng = StdRng::seed_from_u64(seed);
    let placements: Vec<Placement> = (0..count).map(|_| config.sample(&mut rng)).collect();
    log::debug!("Scattered {} placements (seed {})", placements.len(), seed);
    placements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_surface_has_constant_height() {
        let surface = PlanetSurface::new(SurfaceConfig { radius: 2.0, ..Default::default() });
        assert_eq!(surface.height_at(Vec3::new(0.3, 0.9, -0.1)), 2.0);
        let p = surface.surface_point(Vec3::new(0.0, 5.0, 0.0));
        assert!((p - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn relief_stays_within_bounds() {
        let surface = PlanetSurface::new(SurfaceConfig {
            radius: 1.0,
            relief: 0.05,
            frequency: 3.0,
        });
        for i in 0..200 {
            let a = i as f32 * 0.31;
            let dir = Vec3::new(a.cos(), (a * 0.7).sin(), a.sin());
            let h = surface.height_at(dir);
            assert!((0.95..=1.05).contains(&h), "height {} out of band", h);
        }
    }

    #[test]
    fn scatter_deterministic_same_seed() {
        let a = scatter(42, 20, ScatterConfig::BUILDINGS);
        let b = scatter(42, 20, ScatterConfig::BUILDINGS);
        assert_eq!(a.len(), 20);
        for (pa, pb) in a.iter().zip(b.iter()) {
            assert_eq!(pa.rotation, pb.rotation);
            assert_eq!(pa.base_scale, pb.base_scale);
        }
    }

    #[test]
    fn scatter_respects_scale_ranges() {
        for p in scatter(7, 100, ScatterConfig::BUILDINGS) {
            assert!((0.1..0.7).contains(&p.base_scale.x));
            assert!((2.3..4.2).contains(&p.base_scale.y));
            assert!((p.rotation.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn sphere_mesh_indices_are_in_bounds() {
        let surface = PlanetSurface::new(SurfaceConfig::default());
        let (vertices, indices) = surface.generate_mesh(32, 32);
        assert_eq!(vertices.len(), 33 * 33);
        assert_eq!(indices.len() % 3, 0);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }
}
