//! Plain-text quality summary for `evision check`.

use std::fmt;

use evision_analytics_models::{AreaMetrics, QualityReport, SummaryStats};
use evision_charging_models::{IssueKind, PowerCategory};
use evision_pipeline::PipelineOutput;

/// Renders the parts of the output a person checks first.
pub fn render(output: &PipelineOutput) -> String {
    Summary {
        report: &output.quality,
        metrics: &output.metrics,
    }
    .to_string()
}

struct Summary<'a> {
    report: &'a QualityReport,
    metrics: &'a [AreaMetrics],
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;

        let s = &report.station_rows;
        writeln!(f, "Stations")?;
        writeln!(
            f,
            "  {} read, {} out of region, {} dropped, {} resolved, {} unresolvable",
            s.read, s.out_of_region, s.dropped, s.resolved, s.unresolvable
        )?;
        let r = &report.resident_rows;
        writeln!(f, "Population")?;
        writeln!(
            f,
            "  {} read, {} out of region, {} dropped, {} merged duplicates",
            r.read, r.out_of_region, r.dropped, r.merged_duplicates
        )?;
        let g = &report.geometry_rows;
        writeln!(f, "Geometry")?;
        writeln!(
            f,
            "  {} read, {} dropped, {} boundaries",
            g.read, g.dropped, g.boundaries
        )?;

        writeln!(f, "\nPower bands")?;
        for category in PowerCategory::ALL {
            let count: u64 = self
                .metrics
                .iter()
                .map(|m| m.category_counts.get(category))
                .sum();
            writeln!(f, "  {:<24} {count}", category.label())?;
        }
        let unknown: u64 = self.metrics.iter().map(|m| m.unknown_power_count).sum();
        writeln!(f, "  {:<24} {unknown}", "Unknown power")?;

        writeln!(f, "\nMissing values")?;
        for m in &report.missing_ratios {
            writeln!(
                f,
                "  {:<10} {:<40} {:>6.1}% ({}/{})",
                m.dataset,
                m.column,
                m.ratio * 100.0,
                m.missing,
                m.total
            )?;
        }

        writeln!(f, "\nDistributions")?;
        for (name, stats) in [
            ("power_kw", report.power_kw),
            ("population", report.population),
            ("station_count", report.station_count),
        ] {
            writeln!(f, "  {name:<14} {}", describe(stats.as_ref()))?;
        }

        writeln!(f, "\nOutliers: {}", report.outliers.len())?;
        for o in &report.outliers {
            writeln!(
                f,
                "  {:<14} {:<12} {} ({} fence, bounds {:.1}..{:.1})",
                o.column, o.entity_id, o.value, o.fence, o.lower_bound, o.upper_bound
            )?;
        }

        writeln!(f, "\nIssues")?;
        for kind in IssueKind::ALL {
            writeln!(f, "  {kind:<22} {}", report.issue_count(kind))?;
        }

        writeln!(f, "\nPopulation/station correlation")?;
        match &report.correlation {
            Some(c) => writeln!(
                f,
                "  r = {:.3} over {} areas ({}){}",
                c.coefficient,
                c.pairs,
                c.strength,
                if c.weak { ", ranking may not track demand" } else { "" }
            ),
            None => writeln!(f, "  undefined (fewer than two areas or no variance)"),
        }
    }
}

fn describe(stats: Option<&SummaryStats>) -> String {
    stats.map_or_else(
        || "no values".to_string(),
        |s| {
            format!(
                "n={} mean={:.1} median={:.1} min={:.1} max={:.1} iqr={:.1}",
                s.count, s.mean, s.median, s.min, s.max, s.iqr
            )
        },
    )
}
