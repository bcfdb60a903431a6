//! # Voxel Terrain Headless Driver
//!
//! Runs the library's `run()` function, which streams terrain along a scripted walk.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info VOXEL_TERRAIN_CONFIG=terrain.json cargo run --release
//! ```

fn main() {
    if let Err(e) = voxel_terrain::run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
