#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Preprocessing result types.
//!
//! The station and resident preprocessors hand these to the aggregation
//! and quality stages. Row counts and completeness ratios are captured
//! here, before any repair, so the quality report reflects the raw data.

use evision_charging_models::{DataIssue, Dataset, PopulationRecord, Station};
use serde::{Deserialize, Serialize};

/// Share of empty values in one source column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingRatio {
    /// Source the column belongs to.
    pub dataset: Dataset,
    /// Column name as configured.
    pub column: String,
    /// Rows where the field was empty.
    pub missing: u64,
    /// Rows inspected.
    pub total: u64,
    /// `missing / total`, or `0.0` for an empty table.
    pub ratio: f64,
}

impl MissingRatio {
    /// Computes the ratio from raw counts.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(dataset: Dataset, column: impl Into<String>, missing: u64, total: u64) -> Self {
        let ratio = if total == 0 {
            0.0
        } else {
            missing as f64 / total as f64
        };
        Self {
            dataset,
            column: column.into(),
            missing,
            total,
            ratio,
        }
    }
}

/// Counts empty fields per column while scanning rows.
#[derive(Debug, Clone, Default)]
pub struct MissingCounter {
    columns: Vec<(String, u64)>,
    total: u64,
}

impl MissingCounter {
    /// Starts counting for the given columns.
    #[must_use]
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(|c| (c.into(), 0)).collect(),
            total: 0,
        }
    }

    /// Records one row. `fields` must line up with the constructor's
    /// columns.
    pub fn observe<'a>(&mut self, fields: impl IntoIterator<Item = &'a str>) {
        self.total += 1;
        for ((_, missing), value) in self.columns.iter_mut().zip(fields) {
            if value.trim().is_empty() {
                *missing += 1;
            }
        }
    }

    /// Produces one ratio per column.
    #[must_use]
    pub fn finish(self, dataset: Dataset) -> Vec<MissingRatio> {
        let total = self.total;
        self.columns
            .into_iter()
            .map(|(column, missing)| MissingRatio::new(dataset, column, missing, total))
            .collect()
    }
}

/// An in-region station that no resolver could attribute to an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedStation {
    /// Station identifier.
    pub id: String,
    /// Declared area code text, if the field was not empty.
    pub declared_area_code: Option<String>,
    /// Repaired latitude.
    pub latitude: Option<f64>,
    /// Repaired longitude.
    pub longitude: Option<f64>,
    /// Rated power in kilowatts.
    pub power_kw: Option<f64>,
}

/// Row accounting for the station registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationRowCounts {
    /// Data rows in the file.
    pub read: u64,
    /// Rows outside the target region (expected for a national registry).
    pub out_of_region: u64,
    /// Rows with neither an area code nor usable coordinates.
    pub dropped: u64,
    /// Stations attributed to an area.
    pub resolved: u64,
    /// Stations kept aside as unresolvable.
    pub unresolvable: u64,
}

/// Output of the station preprocessor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprocessedStations {
    /// Stations attributed to exactly one area, in source order.
    pub stations: Vec<Station>,
    /// Stations excluded from aggregation.
    pub unresolvable: Vec<UnresolvedStation>,
    /// Non-fatal problems, in source order.
    pub issues: Vec<DataIssue>,
    /// Completeness of the in-region rows before repair.
    pub missing: Vec<MissingRatio>,
    /// Row accounting.
    pub counts: StationRowCounts,
}

/// Row accounting for the population table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidentRowCounts {
    /// Data rows in the file.
    pub read: u64,
    /// Rows whose area code belongs to another region.
    pub out_of_region: u64,
    /// Rows rejected for a malformed code or negative population.
    pub dropped: u64,
    /// Extra rows folded into an earlier row with the same code.
    pub merged_duplicates: u64,
}

/// Output of the resident preprocessor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprocessedResidents {
    /// One record per area code, sorted by code.
    pub records: Vec<PopulationRecord>,
    /// Non-fatal problems, in source order.
    pub issues: Vec<DataIssue>,
    /// Completeness of the in-region rows before repair.
    pub missing: Vec<MissingRatio>,
    /// Row accounting.
    pub counts: ResidentRowCounts,
}
