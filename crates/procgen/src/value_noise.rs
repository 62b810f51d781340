//! Lattice value noise.
//!
//! Cheap permutation-polynomial noise (the `mod 289` hash popular in shader code),
//! evaluated on the CPU so surface displacement and scenery placement agree with
//! whatever the GPU side samples. Output lies in `[0, 1)`.

use glam::Vec3;
use noise::NoiseFn;

#[inline]
fn mod289(x: f64) -> f64 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

#[inline]
fn permute(x: f64) -> f64 {
    mod289(((x * 34.0) + 1.0) * x)
}

#[inline]
fn fract(x: f64) -> f64 {
    x - x.trunc()
}

#[inline]
fn lattice_value(k: f64) -> f64 {
    fract(k * (1.0 / 41.0))
}

/// Sample 3D value noise at `point`, in double precision.
pub fn value_noise_3d(point: [f64; 3]) -> f64 {
    let a = [point[0].floor(), point[1].floor(), point[2].floor()];
    // Hermite fade per axis.
    let fade = |t: f64| t * t * (3.0 - 2.0 * t);
    let d = [
        fade(point[0] - a[0]),
        fade(point[1] - a[1]),
        fade(point[2] - a[2]),
    ];

    // Hash x, then y, then z.
    let bx = [a[0], a[0] + 1.0];
    let by = [a[1], a[1] + 1.0];
    let k1 = [permute(bx[0]), permute(bx[1])];
    let k2 = [
        permute(k1[0] + by[0]),
        permute(k1[1] + by[0]),
        permute(k1[0] + by[1]),
        permute(k1[1] + by[1]),
    ];
    let c = k2.map(|k| k + a[2]);
    let near = c.map(|v| lattice_value(permute(v)));
    let far = c.map(|v| lattice_value(permute(v + 1.0)));

    // Trilinear blend: z, then x, then y.
    let z: [f64; 4] = std::array::from_fn(|i| far[i] * d[2] + near[i] * (1.0 - d[2]));
    let x0 = z[1] * d[0] + z[0] * (1.0 - d[0]);
    let x1 = z[3] * d[0] + z[2] * (1.0 - d[0]);
    x1 * d[1] + x0 * (1.0 - d[1])
}

/// Sample 3D value noise at a single-precision position.
pub fn noise_3d(position: Vec3) -> f32 {
    value_noise_3d([
        position.x as f64,
        position.y as f64,
        position.z as f64,
    ]) as f32
}

/// [`value_noise_3d`] as a `noise` crate source, so it can be fed through the crate's
/// scale/bias adapters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueNoise;

impl NoiseFn<f64, 3> for ValueNoise {
    fn get(&self, point: [f64; 3]) -> f64 {
        value_noise_3d(point)
    }
}
