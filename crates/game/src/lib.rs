//! Orbital train: a locomotive circling a small planet on track laid just ahead of it.
//!
//! The crate is renderer-agnostic. Everything visual is pushed through
//! [`renderer::SceneGraph`]; the host drives [`state::GameContext::frame`] once per frame.

pub mod assets;
pub mod camera_rig;
pub mod config;
pub mod history;
pub mod hud;
pub mod planet;
pub mod player;
pub mod rails;
pub mod smoke;
pub mod state;
pub mod train;

pub use config::GameConfig;
pub use state::{GameContext, Phase};
