//! Writes pipeline results to the output directory.

use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use evision_analytics_models::AreaMetrics;
use evision_charging_models::{CoverageLevel, DensityCategory, PriorityClass};
use evision_pipeline::PipelineOutput;
use serde::Serialize;

/// Flat CSV form of [`AreaMetrics`]. The boundary is only in the JSON
/// output.
#[derive(Debug, Serialize)]
struct AreaMetricsRow<'a> {
    area_code: &'a str,
    population: Option<u64>,
    station_count: u64,
    slow: u64,
    normal: u64,
    fast: u64,
    rapid: u64,
    ultra_rapid: u64,
    unknown_power_count: u64,
    total_capacity_kw: f64,
    average_power_kw: Option<f64>,
    fast_charger_count: u64,
    coverage_level: CoverageLevel,
    density_category: Option<DensityCategory>,
    residents_per_station: Option<f64>,
    priority_class: Option<PriorityClass>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl<'a> From<&'a AreaMetrics> for AreaMetricsRow<'a> {
    fn from(m: &'a AreaMetrics) -> Self {
        Self {
            area_code: m.area_code.as_str(),
            population: m.population,
            station_count: m.station_count,
            slow: m.category_counts.slow,
            normal: m.category_counts.normal,
            fast: m.category_counts.fast,
            rapid: m.category_counts.rapid,
            ultra_rapid: m.category_counts.ultra_rapid,
            unknown_power_count: m.unknown_power_count,
            total_capacity_kw: m.total_capacity_kw,
            average_power_kw: m.average_power_kw,
            fast_charger_count: m.fast_charger_count,
            coverage_level: m.coverage_level,
            density_category: m.density_category,
            residents_per_station: m.residents_per_station,
            priority_class: m.priority_class,
            latitude: m.latitude,
            longitude: m.longitude,
        }
    }
}

/// Writes `area_metrics.json`, `area_metrics.csv`, `demand_ranking.json`
/// and `quality_report.json` into `dir`, returning the written paths.
pub fn write_all(
    dir: &Path,
    output: &PipelineOutput,
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir)?;

    let metrics_json = dir.join("area_metrics.json");
    std::fs::write(&metrics_json, serde_json::to_string_pretty(&output.metrics)?)?;

    let metrics_csv = dir.join("area_metrics.csv");
    write_metrics_csv(&metrics_csv, &output.metrics)?;

    let ranking = dir.join("demand_ranking.json");
    std::fs::write(&ranking, serde_json::to_string_pretty(&output.ranking)?)?;

    let quality = dir.join("quality_report.json");
    std::fs::write(&quality, serde_json::to_string_pretty(&output.quality)?)?;

    Ok(vec![metrics_json, metrics_csv, ranking, quality])
}

fn write_metrics_csv(
    path: &Path,
    metrics: &[AreaMetrics],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for row in metrics.iter().map(AreaMetricsRow::from) {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use evision_analytics_models::{CategoryCounts, DemandAnalysis, QualityReport};
    use evision_charging_models::{AreaCode, AreaCodeRange};

    use super::*;

    fn metrics(code: &str, population: Option<u64>) -> AreaMetrics {
        AreaMetrics {
            area_code: AreaCode::parse(code, AreaCodeRange::new(10_001, 14_199)).unwrap(),
            population,
            station_count: 2,
            category_counts: CategoryCounts {
                normal: 1,
                ..CategoryCounts::default()
            },
            unknown_power_count: 1,
            total_capacity_kw: 11.0,
            average_power_kw: Some(11.0),
            fast_charger_count: 0,
            coverage_level: CoverageLevel::Poor,
            density_category: population.map(|_| DensityCategory::Low),
            residents_per_station: population.map(|_| 1500.0),
            priority_class: population.map(|_| PriorityClass::Low),
            latitude: None,
            longitude: None,
            geometry: None,
        }
    }

    fn output() -> PipelineOutput {
        PipelineOutput {
            metrics: vec![metrics("10115", Some(3000)), metrics("10117", None)],
            ranking: DemandAnalysis::default(),
            quality: QualityReport::default(),
        }
    }

    #[test]
    fn writes_all_four_files() {
        let dir = std::env::temp_dir().join("evision_cli_output_files");
        let _ = std::fs::remove_dir_all(&dir);

        let written = write_all(&dir, &output()).unwrap();
        assert_eq!(written.len(), 4);
        for path in &written {
            assert!(path.exists(), "{} missing", path.display());
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn csv_has_one_row_per_area_and_blank_unknowns() {
        let dir = std::env::temp_dir().join("evision_cli_output_csv");
        let _ = std::fs::remove_dir_all(&dir);
        write_all(&dir, &output()).unwrap();

        let content = std::fs::read_to_string(dir.join("area_metrics.csv")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("area_code,population,station_count,slow"));
        assert!(lines[1].starts_with("10115,3000,2,0,1,"));
        assert!(lines[1].contains("POOR"));
        assert!(lines[2].starts_with("10117,,2,"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
