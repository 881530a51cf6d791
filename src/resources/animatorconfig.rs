//! Animator configuration resource.
//!
//! Manages animation playback settings loaded from an INI configuration file.
//! Provides defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [animator]
//! default_speed = 1.0
//! cull_mode = auto
//! active_capacity = 2048
//! pending_capacity = 128
//!
//! [camera]
//! vertical_half_extent = 5.0
//! aspect_ratio = 1.7777778
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

use crate::components::spriteanimator::CullingMode;

/// Default safe values for startup
const DEFAULT_SPEED: f32 = 1.0;
const DEFAULT_CULL_MODE: CullingMode = CullingMode::AutoCull;
const DEFAULT_ACTIVE_CAPACITY: usize = 2048;
const DEFAULT_PENDING_CAPACITY: usize = 128;
const DEFAULT_VERTICAL_HALF_EXTENT: f32 = 5.0;
const DEFAULT_ASPECT_RATIO: f32 = 16.0 / 9.0;
const DEFAULT_CONFIG_PATH: &str = "./animator.ini";

/// Animator configuration resource.
#[derive(Resource, Debug, Clone)]
pub struct AnimatorConfig {
    /// Speed multiplier given to newly spawned animators.
    pub default_speed: f32,
    /// Culling mode given to newly spawned animators.
    pub cull_mode: CullingMode,
    /// Initial capacity of the scheduler's active list.
    pub active_capacity: usize,
    /// Initial capacity of the scheduler's pending-removal set.
    pub pending_capacity: usize,
    /// Orthographic half height of the camera in world units.
    pub vertical_half_extent: f32,
    /// Viewport width / height.
    pub aspect_ratio: f32,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_cull_mode(value: &str) -> Option<CullingMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "auto" | "autocull" | "auto_cull" => Some(CullingMode::AutoCull),
        "always" | "alwaysanimate" | "always_animate" => Some(CullingMode::AlwaysAnimate),
        _ => None,
    }
}

fn cull_mode_name(mode: CullingMode) -> &'static str {
    match mode {
        CullingMode::AutoCull => "auto",
        CullingMode::AlwaysAnimate => "always",
    }
}

impl AnimatorConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            default_speed: DEFAULT_SPEED,
            cull_mode: DEFAULT_CULL_MODE,
            active_capacity: DEFAULT_ACTIVE_CAPACITY,
            pending_capacity: DEFAULT_PENDING_CAPACITY,
            vertical_half_extent: DEFAULT_VERTICAL_HALF_EXTENT,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [animator] section
        if let Some(speed) = config.getfloat("animator", "default_speed").ok().flatten() {
            self.default_speed = (speed as f32).max(0.0);
        }
        if let Some(mode) = config.get("animator", "cull_mode") {
            match parse_cull_mode(&mode) {
                Some(mode) => self.cull_mode = mode,
                None => warn!("Unknown cull_mode '{}', keeping {:?}", mode, self.cull_mode),
            }
        }
        if let Some(cap) = config.getuint("animator", "active_capacity").ok().flatten() {
            self.active_capacity = cap as usize;
        }
        if let Some(cap) = config.getuint("animator", "pending_capacity").ok().flatten() {
            self.pending_capacity = cap as usize;
        }

        // [camera] section
        if let Some(h) = config.getfloat("camera", "vertical_half_extent").ok().flatten() {
            self.vertical_half_extent = h as f32;
        }
        if let Some(a) = config.getfloat("camera", "aspect_ratio").ok().flatten() {
            self.aspect_ratio = a as f32;
        }

        info!(
            "Loaded config: speed={}, cull={:?}, capacity={}/{}, camera half={} aspect={}",
            self.default_speed,
            self.cull_mode,
            self.active_capacity,
            self.pending_capacity,
            self.vertical_half_extent,
            self.aspect_ratio
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        // [animator] section
        config.set(
            "animator",
            "default_speed",
            Some(self.default_speed.to_string()),
        );
        config.set(
            "animator",
            "cull_mode",
            Some(cull_mode_name(self.cull_mode).to_string()),
        );
        config.set(
            "animator",
            "active_capacity",
            Some(self.active_capacity.to_string()),
        );
        config.set(
            "animator",
            "pending_capacity",
            Some(self.pending_capacity.to_string()),
        );

        // [camera] section
        config.set(
            "camera",
            "vertical_half_extent",
            Some(self.vertical_half_extent.to_string()),
        );
        config.set("camera", "aspect_ratio", Some(self.aspect_ratio.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}
