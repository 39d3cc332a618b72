use crate::grid::{DEFAULT_CHUNK_SIZE, DEFAULT_VIEW_DISTANCE};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Default noise frequency; lower values give larger forests
pub const DEFAULT_NOISE_SCALE: f64 = 0.08;

/// Default normalised noise level a cell must reach to grow a tree
pub const DEFAULT_PLACEMENT_THRESHOLD: f64 = 0.6;

/// Default offset added to cell coordinates before sampling noise
pub const DEFAULT_WORLD_SEED: f64 = 42.0;

/// Default minimum planar distance between trees in one chunk
pub const DEFAULT_MIN_SPACING: f32 = 3.0;

/// Default maximum offset of a tree from its cell center on each axis
pub const DEFAULT_POSITION_JITTER: f32 = 0.15;

pub const DEFAULT_BASE_SCALE: f32 = 1.0;
pub const DEFAULT_SCALE_VARIATION: f32 = 0.3;

/// Largest accepted variation bound; wider bounds overflow the sampled span
pub const MAX_VARIATION: f32 = f32::MAX / 4.0;

/// Error type for invalid world configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NonPositiveSideLength(i32),
    NegativeSpacing(f32),
    InvalidNoiseScale(f64),
    InvalidSeed(f64),
    InvalidThreshold(f64),
    InvalidVariation { name: &'static str, value: f32 },
    NonPositiveBaseScale(f32),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NonPositiveSideLength(s) => {
                write!(f, "Chunk side length must be positive, got {}", s)
            }
            ConfigError::NegativeSpacing(s) => {
                write!(f, "Minimum spacing must not be negative, got {}", s)
            }
            ConfigError::InvalidNoiseScale(s) => write!(f, "Noise scale must be finite, got {}", s),
            ConfigError::InvalidSeed(s) => write!(f, "World seed must be finite, got {}", s),
            ConfigError::InvalidThreshold(t) => {
                write!(f, "Placement threshold must be finite, got {}", t)
            }
            ConfigError::InvalidVariation { name, value } => {
                write!(f, "{} must be between 0 and {}, got {}", name, MAX_VARIATION, value)
            }
            ConfigError::NonPositiveBaseScale(s) => {
                write!(f, "Base scale must be positive, got {}", s)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// World generation and streaming knobs
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Cells per chunk edge
    pub chunk_size: i32,
    /// Radius of the loaded disc around the observer, in chunks
    pub view_distance: i32,
    pub noise_scale: f64,
    /// Normalised (0..1) noise level at or above which a cell is a candidate
    pub placement_threshold: f64,
    pub world_seed: f64,
    pub min_spacing: f32,
    pub position_jitter: f32,
    pub base_scale: f32,
    pub scale_variation: f32,
    /// Upper bound of the random yaw, in radians
    pub max_rotation: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            view_distance: DEFAULT_VIEW_DISTANCE,
            noise_scale: DEFAULT_NOISE_SCALE,
            placement_threshold: DEFAULT_PLACEMENT_THRESHOLD,
            world_seed: DEFAULT_WORLD_SEED,
            min_spacing: DEFAULT_MIN_SPACING,
            position_jitter: DEFAULT_POSITION_JITTER,
            base_scale: DEFAULT_BASE_SCALE,
            scale_variation: DEFAULT_SCALE_VARIATION,
            max_rotation: TAU,
        }
    }
}

#[cfg(test)]
impl WorldConfig {
    pub fn with_chunk_size(mut self, chunk_size: i32) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_view_distance(mut self, view_distance: i32) -> Self {
        self.view_distance = view_distance;
        self
    }

    pub fn with_noise(mut self, noise_scale: f64, placement_threshold: f64) -> Self {
        self.noise_scale = noise_scale;
        self.placement_threshold = placement_threshold;
        self
    }

    pub fn with_seed(mut self, world_seed: f64) -> Self {
        self.world_seed = world_seed;
        self
    }

    pub fn with_min_spacing(mut self, min_spacing: f32) -> Self {
        self.min_spacing = min_spacing;
        self
    }

    /// Set position, scale and rotation variation in one go
    pub fn with_variation(mut self, position_jitter: f32, scale_variation: f32, max_rotation: f32) -> Self {
        self.position_jitter = position_jitter;
        self.scale_variation = scale_variation;
        self.max_rotation = max_rotation;
        self
    }
}

impl WorldConfig {
    /// Check every knob that would make streaming or placement meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size <= 0 {
            return Err(ConfigError::NonPositiveSideLength(self.chunk_size));
        }
        if !(self.min_spacing >= 0.0) {
            return Err(ConfigError::NegativeSpacing(self.min_spacing));
        }
        if !self.noise_scale.is_finite() {
            return Err(ConfigError::InvalidNoiseScale(self.noise_scale));
        }
        if !self.world_seed.is_finite() {
            return Err(ConfigError::InvalidSeed(self.world_seed));
        }
        if !self.placement_threshold.is_finite() {
            return Err(ConfigError::InvalidThreshold(self.placement_threshold));
        }
        for (name, value) in [
            ("Position jitter", self.position_jitter),
            ("Scale variation", self.scale_variation),
            ("Max rotation", self.max_rotation),
        ] {
            if !(0.0..=MAX_VARIATION).contains(&value) {
                return Err(ConfigError::InvalidVariation { name, value });
            }
        }
        if !(self.base_scale > 0.0) || !self.base_scale.is_finite() {
            return Err(ConfigError::NonPositiveBaseScale(self.base_scale));
        }
        Ok(())
    }

    /// Side length as a cell count, for sizing grids
    pub fn chunk_cells(&self) -> usize {
        self.chunk_size.max(0) as usize
    }
}
