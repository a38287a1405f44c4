#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation and analysis over preprocessed charging data.
//!
//! [`AggregationEngine`] joins stations, population and boundaries into one
//! [`Area`] per code. The other stages only read those areas:
//! [`MetricsBuilder`] derives the per-area table, [`DemandAnalyzer`] ranks
//! by residents per station, and [`QualityAnalyzer`] describes the data.

pub mod aggregate;
pub mod demand;
pub mod metrics;
pub mod quality;
pub mod stats;

pub use aggregate::{AggregationEngine, Area};
pub use demand::DemandAnalyzer;
pub use metrics::MetricsBuilder;
pub use quality::{QualityAnalyzer, QualityInputs};
