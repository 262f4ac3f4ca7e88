//! Shared data structures for the comfort-index analytics pipeline
//!
//! - `signal`: raw observations read from the external store
//! - `index`: the computed comfort index and its explainability payload
//! - `anomaly`: anomaly detection results
//! - `trend`: trend/forecast results and the enriched per-unit report

mod anomaly;
mod index;
mod signal;
mod trend;

pub use anomaly::*;
pub use index::*;
pub use signal::*;
pub use trend::*;
