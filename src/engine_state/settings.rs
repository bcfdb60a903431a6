//! Configuration system for the terrain core.
//!
//! Settings are plain serde structures with defaults for every field, so a JSON document
//! only needs to name what it changes:
//!
//! ```
//! use voxel_terrain::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "world": { "render_distance": 4 } }"#)?;
//! assert_eq!(config.world.render_distance, 4);
//! assert_eq!(config.world.cache_distance, 2);
//! # Ok::<(), voxel_terrain::error::EngineError>(())
//! ```

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::engine_state::rendering::MeshStrategy;
use crate::engine_state::voxels::chunk::CHUNK_HEIGHT;
use crate::error::EngineError;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Streaming window and pipeline settings
    pub world: WorldSettings,
    /// Terrain generation parameters
    pub generation: GenerationParameters,
}

/// Streaming window and pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Chebyshev radius, in chunks, of the rendered window around the viewpoint
    pub render_distance: i32,
    /// Extra ring of chunks kept in memory, hidden, beyond the render distance
    pub cache_distance: i32,
    /// Bulk jobs admitted per throttle window
    pub chunks_processed: usize,
    /// Upper bound on bulk jobs started in a single tick
    pub chunks_to_load_per_tick: usize,
    /// Seconds between throttle windows
    pub time_to_load_next_chunks: f32,
    /// Render mesh generation strategy
    pub mesh_strategy: MeshStrategy,
    /// Worker thread count; all cores but one when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_threads: Option<usize>,
    /// Number of edited chunks retained by the in-memory store after eviction
    pub store_capacity: usize,
}

impl Default for WorldSettings {
    fn default() -> Self {
        WorldSettings {
            render_distance: 8,
            cache_distance: 2,
            chunks_processed: 8,
            chunks_to_load_per_tick: 2,
            time_to_load_next_chunks: 0.1,
            mesh_strategy: MeshStrategy::Sequential,
            worker_threads: None,
            store_capacity: 256,
        }
    }
}

/// One fractal noise layer of the height function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseLayer {
    /// Disabled layers are skipped entirely
    pub enabled: bool,
    /// Weight of this layer in the weighted mean of heights
    pub weight: f64,
    /// Feature size in voxels, multiplied by the global scale
    pub scale: f64,
    /// Number of noise octaves summed
    pub octaves: u32,
    /// Frequency multiplier between octaves
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves
    pub persistence: f64,
    /// Gate later layers instead of contributing height
    pub use_as_mask: bool,
    /// Mask samples below this value switch the later layers off
    pub mask_threshold: f64,
}

impl Default for NoiseLayer {
    fn default() -> Self {
        NoiseLayer {
            enabled: true,
            weight: 1.0,
            scale: 128.0,
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            use_as_mask: false,
            mask_threshold: 0.5,
        }
    }
}

/// Terrain generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParameters {
    pub seed: u32,
    /// Multiplier applied to every layer's scale
    pub global_scale: f64,
    /// Water fills submerged columns up to this height
    pub sea_level: u32,
    pub layers: Vec<NoiseLayer>,
    /// Exponent shaping the normalized height; above 1 flattens lowlands
    pub steepness: f64,
    /// Surfaces at or above this height are snow capped and have no soil
    pub mountain_height: u32,
    pub top_soil_thickness: u32,
    /// Surfaces up to this far above sea level are beaches
    pub beach_height: u32,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        GenerationParameters {
            seed: 1337,
            global_scale: 1.0,
            sea_level: 40,
            layers: vec![
                NoiseLayer {
                    scale: 256.0,
                    ..NoiseLayer::default()
                },
                NoiseLayer {
                    weight: 0.0,
                    scale: 512.0,
                    octaves: 2,
                    use_as_mask: true,
                    mask_threshold: 0.55,
                    ..NoiseLayer::default()
                },
                NoiseLayer {
                    weight: 0.8,
                    scale: 96.0,
                    octaves: 5,
                    persistence: 0.55,
                    ..NoiseLayer::default()
                },
            ],
            steepness: 1.4,
            mountain_height: 90,
            top_soil_thickness: 3,
            beach_height: 2,
        }
    }
}

impl EngineConfig {
    /// Parses a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON settings file, then validates it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_json_str(&content)?;
        config.validate()?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Checks every value the core relies on.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.world.validate()?;
        self.generation.validate()
    }
}

fn invalid(message: impl Into<String>) -> EngineError {
    EngineError::InvalidSettings(message.into())
}

impl WorldSettings {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.render_distance < 0 {
            return Err(invalid("render_distance must not be negative"));
        }
        if self.cache_distance < 0 {
            return Err(invalid("cache_distance must not be negative"));
        }
        if self.chunks_processed == 0 {
            return Err(invalid("chunks_processed must be at least 1"));
        }
        if self.chunks_to_load_per_tick == 0 {
            return Err(invalid("chunks_to_load_per_tick must be at least 1"));
        }
        if !self.time_to_load_next_chunks.is_finite() || self.time_to_load_next_chunks < 0.0 {
            return Err(invalid(
                "time_to_load_next_chunks must be a non-negative number of seconds",
            ));
        }
        if self.worker_threads == Some(0) {
            info!("worker_threads is 0, generation stages will run on the control thread");
        }
        Ok(())
    }

    /// Number of chunk instances the pool keeps for reuse.
    pub fn pool_capacity(&self) -> usize {
        let outer = (self.cache_distance + self.render_distance).max(0) as usize;
        let inner = self.render_distance.max(0) as usize;
        (outer * outer).saturating_sub(inner * inner)
    }
}

impl GenerationParameters {
    pub fn validate(&self) -> Result<(), EngineError> {
        let max_height = CHUNK_HEIGHT as u32 - 2;
        if !(self.global_scale > 0.0) {
            return Err(invalid("global_scale must be positive"));
        }
        if self.sea_level > max_height {
            return Err(invalid(format!("sea_level must be at most {}", max_height)));
        }
        if !(self.steepness > 0.0) {
            return Err(invalid("steepness must be positive"));
        }
        if self.layers.is_empty() {
            return Err(invalid("at least one noise layer is required"));
        }
        for (index, layer) in self.layers.iter().enumerate() {
            if layer.octaves == 0 {
                return Err(invalid(format!("layer {} needs at least one octave", index)));
            }
            if !(layer.scale > 0.0) {
                return Err(invalid(format!("layer {} scale must be positive", index)));
            }
            if layer.weight < 0.0 {
                return Err(invalid(format!("layer {} weight must not be negative", index)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{
                "world": { "render_distance": 3, "mesh_strategy": "parallel" },
                "generation": { "seed": 9, "layers": [ { "octaves": 2 } ] }
            }"#,
        )
        .unwrap();
        assert_eq!(config.world.render_distance, 3);
        assert_eq!(config.world.mesh_strategy, MeshStrategy::Parallel);
        assert_eq!(config.world.chunks_processed, 8);
        assert_eq!(config.generation.seed, 9);
        assert_eq!(config.generation.layers.len(), 1);
        assert_eq!(config.generation.layers[0].octaves, 2);
        assert_eq!(config.generation.layers[0].lacunarity, 2.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = EngineConfig::default();
        config.world.chunks_processed = 0;
        assert!(matches!(config.validate(), Err(EngineError::InvalidSettings(_))));

        let mut config = EngineConfig::default();
        config.world.time_to_load_next_chunks = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.world.render_distance = -1;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.generation.layers.clear();
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.generation.layers[0].scale = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            EngineConfig::from_json_str("{ world: }"),
            Err(EngineError::SettingsParse(_))
        ));
    }

    #[test]
    fn missing_files_are_io_errors() {
        assert!(matches!(
            EngineConfig::load("/nonexistent/voxel-terrain.json"),
            Err(EngineError::SettingsIo(_))
        ));
    }

    #[test]
    fn pool_capacity_is_the_cache_ring() {
        let world = WorldSettings {
            render_distance: 2,
            cache_distance: 1,
            ..WorldSettings::default()
        };
        assert_eq!(world.pool_capacity(), 5);
    }
}
