//! Game configuration (world, motion, camera, models). Loaded from config.ron at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::camera_rig::CameraMode;

/// Errors from reading or writing the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("could not serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Persistent game settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Seed for scenery placement.
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_planet_radius")]
    pub planet_radius: f32,
    /// Peak terrain displacement above or below the radius, in world units.
    #[serde(default = "default_surface_relief")]
    pub surface_relief: f32,
    /// Terrain noise frequency over the unit sphere.
    #[serde(default = "default_surface_frequency")]
    pub surface_frequency: f64,
    /// Forward speed in radians of pivot rotation per second.
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Size of one locomotion micro-step (radians). Keep it small so rails and train
    /// samples stay dense.
    #[serde(default = "default_micro_step")]
    pub micro_step: f32,
    #[serde(default = "default_turn_rate")]
    pub turn_rate: f32,
    #[serde(default = "default_building_count")]
    pub building_count: usize,
    #[serde(default = "default_crate_count")]
    pub crate_count: usize,
    #[serde(default = "default_camera_distance")]
    pub camera_distance: f32,
    #[serde(default = "default_camera_height")]
    pub camera_height: f32,
    #[serde(default)]
    pub camera_mode: CameraMode,
    /// Collisions before the train is launched into space.
    #[serde(default = "default_max_collisions")]
    pub max_collisions: u32,
    /// Micro-steps per frame while the track is being primed.
    #[serde(default = "default_priming_steps")]
    pub priming_steps_per_frame: u32,
    /// Upper bound on micro-steps per frame after a stall.
    #[serde(default = "default_max_steps")]
    pub max_steps_per_frame: u32,
    #[serde(default)]
    pub locomotive_model: Option<PathBuf>,
    #[serde(default)]
    pub wagon_model: Option<PathBuf>,
    /// Model for the first wagon behind the locomotive.
    #[serde(default)]
    pub coal_wagon_model: Option<PathBuf>,
}

fn default_seed() -> u64 {
    42
}
fn default_planet_radius() -> f32 {
    10.0
}
fn default_surface_relief() -> f32 {
    0.02
}
fn default_surface_frequency() -> f64 {
    4.0
}
fn default_speed() -> f32 {
    0.1
}
fn default_micro_step() -> f32 {
    0.001
}
fn default_turn_rate() -> f32 {
    crate::player::DEFAULT_TURN_RATE
}
fn default_building_count() -> usize {
    200
}
fn default_crate_count() -> usize {
    10
}
fn default_camera_distance() -> f32 {
    3.0
}
fn default_camera_height() -> f32 {
    1.0
}
fn default_max_collisions() -> u32 {
    10
}
fn default_priming_steps() -> u32 {
    400
}
fn default_max_steps() -> u32 {
    2000
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            planet_radius: default_planet_radius(),
            surface_relief: default_surface_relief(),
            surface_frequency: default_surface_frequency(),
            speed: default_speed(),
            micro_step: default_micro_step(),
            turn_rate: default_turn_rate(),
            building_count: default_building_count(),
            crate_count: default_crate_count(),
            camera_distance: default_camera_distance(),
            camera_height: default_camera_height(),
            camera_mode: CameraMode::default(),
            max_collisions: default_max_collisions(),
            priming_steps_per_frame: default_priming_steps(),
            max_steps_per_frame: default_max_steps(),
            locomotive_model: None,
            wagon_model: None,
            coal_wagon_model: None,
        }
    }
}

impl GameConfig {
    /// Load config from `config.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        let path = config_path();
        if !path.exists() {
            log::info!("No config at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&data)
    }

    pub fn from_ron(data: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(data)?)
    }

    /// Save current config to `config.ron`. Logs on error.
    pub fn save(&self) {
        let path = config_path();
        if let Err(e) = self.save_to(&path) {
            log::warn!("Could not write config: {}", e);
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let s = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, s).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("config.ron")
}
