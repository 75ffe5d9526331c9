//! Analytics and terroir-matching core for remote-sensing derived indices.
//!
//! `analytics` turns spectral-index summaries, pixel samples, rasters and
//! time series into scores, statistics, trends and zones. `terroir` fuses
//! multi-source observations into a fixed-layout fingerprint, ranks it
//! against reference terroirs and reports gaps against a benchmark.
//!
//! Everything is synchronous and side-effect free apart from `tracing`
//! events and the explicit JSON loaders in `config` and
//! `terroir::reference`.

pub mod analytics;
pub mod config;
pub mod error;
pub mod math;
pub mod raster;
pub mod terroir;

pub use config::EngineConfig;
pub use error::{CoreError, Result};
pub use raster::{null_as_nan_vec, IndexRaster};
