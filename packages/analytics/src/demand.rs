//! Demand scoring and ranking.
//!
//! Priority comes from the residents-per-station ratio alone. Any extra
//! weighting (a density factor, say) belongs here as an explicit input,
//! never as an implicit constant.

use evision_analytics_models::{DemandAnalysis, DemandScore};
use evision_charging_models::PriorityClass;
use evision_config::DemandConfig;

use crate::aggregate::Area;

/// Scores and ranks areas by residents per station.
pub struct DemandAnalyzer {
    config: DemandConfig,
}

impl DemandAnalyzer {
    /// Creates an analyzer with the given thresholds.
    #[must_use]
    pub const fn new(config: DemandConfig) -> Self {
        Self { config }
    }

    /// `population / max(station_count, 1)` and its priority band, or
    /// `None` if the population is unknown.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&self, area: &Area) -> Option<(f64, PriorityClass)> {
        let population = area.population?;
        let ratio = population as f64 / area.station_count().max(1) as f64;
        Some((ratio, self.config.priority_thresholds.classify(ratio)))
    }

    /// Ranks every area with known population, most underserved first.
    ///
    /// Ties on the ratio are broken by larger population, then by smaller
    /// area code, so the order is fully deterministic.
    #[must_use]
    pub fn analyze(&self, areas: &[Area]) -> DemandAnalysis {
        let mut population_unknown = Vec::new();
        let mut scored = Vec::new();

        for area in areas {
            match (area.population, self.score(area)) {
                (Some(population), Some((ratio, priority_class))) => {
                    scored.push(DemandScore {
                        rank: 0,
                        area_code: area.area_code.clone(),
                        population,
                        station_count: area.station_count(),
                        residents_per_station: ratio,
                        priority_class,
                        urgency_score: priority_class.urgency_score(),
                        needs_expansion: ratio > self.config.expansion_ratio,
                    });
                }
                _ => population_unknown.push(area.area_code.clone()),
            }
        }

        scored.sort_by(|a, b| {
            b.residents_per_station
                .total_cmp(&a.residents_per_station)
                .then_with(|| b.population.cmp(&a.population))
                .then_with(|| a.area_code.cmp(&b.area_code))
        });
        for (i, score) in scored.iter_mut().enumerate() {
            score.rank = i + 1;
        }

        log::info!(
            "Ranked {} areas ({} critical, {} need expansion, {} with unknown population)",
            scored.len(),
            scored
                .iter()
                .filter(|s| s.priority_class == PriorityClass::Critical)
                .count(),
            scored.iter().filter(|s| s.needs_expansion).count(),
            population_unknown.len()
        );

        DemandAnalysis {
            ranking: scored,
            population_unknown,
        }
    }
}
