#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Station and resident preprocessing.
//!
//! Turns loaded [`evision_source::RawTable`]s into cleaned domain records:
//! stations filtered to the target region, repaired, classified and
//! attributed to an area; population rows keyed by canonical area code.
//! Every non-fatal problem is kept as a
//! [`evision_charging_models::DataIssue`] for the quality report.

pub mod residents;
pub mod resolver;
pub mod stations;

pub use residents::ResidentPreprocessor;
pub use resolver::{
    AreaResolver, DeclaredKeyResolver, PolygonResolver, ResolverChain, StationCandidate,
};
pub use stations::StationPreprocessor;
