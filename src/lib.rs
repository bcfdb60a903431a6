#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Terrain
//!
//! The core of an infinite-terrain voxel engine: a streaming set of fixed-size chunks
//! around a moving viewpoint, generated asynchronously and recycled through a pool.
//!
//! ## Key Modules
//!
//! * `core` - Cancellation tokens and the shared in-flight job counter
//! * `engine_state` - The world context, settings, worker pool, voxel data, chunk
//!   lifecycle and the mesh/collider generators
//! * `error` - The error type shared by every fallible operation
//!
//! ## Architecture
//!
//! The engine is split between:
//! * A single control thread that owns every chunk and drives the pipeline once per tick
//! * Worker threads that run the terrain, collider and mesh stages on owned buffers
//! * A bit-packed voxel, heightmap and vertex format shared with the rendering side
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     if let Err(e) = voxel_terrain::run() {
//!         eprintln!("{}", e);
//!     }
//! }
//! ```
//!
//! Embedders construct a [`WorldContext`] themselves and call
//! [`WorldContext::update`] once per frame with the viewpoint position.

use std::env;

use cgmath::Point3;
use log::info;
use web_time::Instant;

pub mod core;
pub mod engine_state;
pub mod error;

pub use engine_state::settings::{EngineConfig, GenerationParameters, NoiseLayer, WorldSettings};
pub use engine_state::voxels::{ChunksManager, ChunksManagerStats};
pub use engine_state::WorldContext;
pub use error::EngineError;

/// Environment variable naming the JSON settings file of the headless driver.
pub const CONFIG_ENV_VAR: &str = "VOXEL_TERRAIN_CONFIG";

/// Simulated frame time of the headless driver, in seconds.
const FRAME_TIME: f32 = 1.0 / 60.0;
/// Frames spent at each waypoint of the scripted walk.
const FRAMES_PER_WAYPOINT: usize = 240;

/// Streams terrain along a scripted walk and logs what the pipeline does.
///
/// Logging goes to stdout, filtered by `RUST_LOG`. The configuration is read from the
/// file named by `VOXEL_TERRAIN_CONFIG`, or defaults when it is unset.
pub fn run() -> Result<(), EngineError> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = match env::var(CONFIG_ENV_VAR) {
        Ok(path) => EngineConfig::load(path)?,
        Err(_) => {
            info!("{} not set, using default settings", CONFIG_ENV_VAR);
            EngineConfig::default()
        }
    };

    let mut world = WorldContext::new(config)?;
    let waypoints = [
        Point3::new(8.0, 80.0, 8.0),
        Point3::new(40.0, 80.0, 8.0),
        Point3::new(40.0, 80.0, 72.0),
        Point3::new(-56.0, 80.0, 72.0),
        Point3::new(8.0, 80.0, 8.0),
    ];

    let started = Instant::now();
    for waypoint in waypoints {
        for _ in 0..FRAMES_PER_WAYPOINT {
            world.update(waypoint, FRAME_TIME);
        }
        let stats = world.chunks().stats();
        info!(
            "At ({}, {}): {} active, {} cached, {} generating, {} pooled, {} in flight, {} mesh vertices",
            waypoint.x,
            waypoint.z,
            stats.active,
            stats.cached,
            stats.generating,
            stats.pooled,
            stats.in_flight,
            stats.mesh_size.vertices
        );
    }

    let stats = world.chunks().stats();
    info!(
        "Walk finished in {:?}: {} chunk instances allocated, {} reused from the pool",
        started.elapsed(),
        stats.allocated,
        stats.reused
    );
    Ok(())
}
