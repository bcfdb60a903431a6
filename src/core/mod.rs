//! # Core Module
//!
//! This module provides the concurrency primitives shared between the control thread
//! and the worker threads of the generation pipeline.
//!
//! ## Key Components
//! - `CancellationToken`: Cooperative cancellation flag, with per-job child tokens
//! - `InFlightCounter`: Shared count of generation jobs that have started and not yet
//!   completed or been disposed
//!
//! Both types are cheap handles around an `Arc`; cloning a handle shares the underlying
//! state rather than copying it. They replace process-wide statics: whoever constructs
//! the world context owns the originals and hands clones to the components that need them.
//!
//! ## Usage
//! ```
//! use voxel_terrain::core::{CancellationToken, InFlightCounter};
//!
//! let factory_token = CancellationToken::new();
//! let job_token = factory_token.child();
//!
//! factory_token.cancel();
//! assert!(job_token.is_cancelled());
//!
//! let in_flight = InFlightCounter::new();
//! in_flight.increment();
//! assert_eq!(in_flight.get(), 1);
//! ```

pub mod cancellation;
pub mod in_flight;

pub use cancellation::CancellationToken;
pub use in_flight::InFlightCounter;
