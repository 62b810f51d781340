//! Core engine types and utilities for the orbital train.
//!
//! This crate provides the foundational types used across all systems:
//! - Transform / pose types and the `Spatial` capability
//! - Frame timing and fixed micro-step scheduling

pub mod time;
pub mod transform;

pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
