//! Descriptive statistics.
//!
//! Quantiles interpolate linearly between the two closest ranks, and the
//! standard deviation is the sample (n - 1) estimate.

use evision_analytics_models::{Fence, SummaryStats};

/// Arithmetic mean, or `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation, or `None` for fewer than two values.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Returns a sorted copy with non-finite values removed.
#[must_use]
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    out.sort_by(f64::total_cmp);
    out
}

/// The `q`-quantile (`0.0..=1.0`) of already sorted values.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some((sorted[hi] - sorted[lo]).mul_add(frac, sorted[lo]))
}

/// Full distribution summary, or `None` if there are no finite values.
#[must_use]
pub fn summarize(values: &[f64]) -> Option<SummaryStats> {
    let s = sorted(values);
    let q1 = quantile_sorted(&s, 0.25)?;
    let q3 = quantile_sorted(&s, 0.75)?;

    Some(SummaryStats {
        count: s.len() as u64,
        mean: mean(&s)?,
        median: quantile_sorted(&s, 0.5)?,
        std_dev: sample_std_dev(&s),
        min: *s.first()?,
        max: *s.last()?,
        q1,
        q3,
        iqr: q3 - q1,
    })
}

/// Inclusive interval outside which a value is an outlier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrFence {
    /// `q1 - k * iqr`.
    pub lower: f64,
    /// `q3 + k * iqr`.
    pub upper: f64,
}

impl IqrFence {
    /// Builds the fence from a summary and multiplier `k`.
    #[must_use]
    pub fn from_summary(stats: &SummaryStats, k: f64) -> Self {
        Self {
            lower: k.mul_add(-stats.iqr, stats.q1),
            upper: k.mul_add(stats.iqr, stats.q3),
        }
    }

    /// Which fence `value` breaches, if any. Values on the fence are inside.
    #[must_use]
    pub fn breach(&self, value: f64) -> Option<Fence> {
        if value < self.lower {
            Some(Fence::Lower)
        } else if value > self.upper {
            Some(Fence::Upper)
        } else {
            None
        }
    }
}

/// Pearson correlation of paired samples.
///
/// Returns `None` if there are fewer than two pairs, the lengths differ, or
/// either side has zero variance.
#[must_use]
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;

    let (mut cov, mut vx, mut vy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mx, y - my);
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }

    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some((cov / (vx.sqrt() * vy.sqrt())).clamp(-1.0, 1.0))
}
