//! Procedural generation for the planet: value noise, surface relief, scatter placement.

pub mod planet;
pub mod value_noise;

pub use planet::*;
pub use value_noise::*;
