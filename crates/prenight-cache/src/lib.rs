//! `prenight-cache`: in-memory figure cache and asynchronous generation.
//!
//! # Overview
//!
//! [`orchestrator::Orchestrator`] owns a [`registry::PlotRegistry`] of plot
//! builders and a [`cache::FigureCache`]. Scheduling a regeneration marks
//! each plot pending and runs its builder on the blocking pool, gated by one
//! of two semaphores. Sessions read the cache without ever waiting on
//! generation.
//!
//! # Worker pools
//!
//! | Pool        | Permits                          | Used by                |
//! |-------------|----------------------------------|------------------------|
//! | `Shared`    | `generation.worker_pool_size`    | footprint, visit maps  |
//! | `Exclusive` | 1                                | night reward curves    |

pub mod cache;
pub mod error;
pub mod orchestrator;
pub mod registry;

pub use cache::{FigureCache, FigureState};
pub use error::{CacheError, Result};
pub use orchestrator::{Orchestrator, RegenerationBatch};
pub use registry::PlotRegistry;
