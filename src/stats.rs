//! Statistics helpers
//!
//! Small, allocation-light numeric routines shared by the outlier detector, the
//! credibility engine and the trend estimator.

/// Median of an unsorted slice
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(median_sorted(&sorted))
}

fn median_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Quantile of an ascending slice using linear interpolation between ranks.
///
/// `q` is clamped to 0-1. Returns None for an empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    match sorted.len() {
        0 => None,
        1 => Some(sorted[0]),
        n => {
            let rank = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let frac = rank - lower as f64;
            Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
        }
    }
}

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); None below two values
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Weighted mean; None when the weights sum to zero
pub fn weighted_mean(values: &[f64], weights: &[f64]) -> Option<f64> {
    let total: f64 = weights.iter().sum();
    if values.is_empty() || total <= 0.0 {
        return None;
    }
    let sum: f64 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
    Some(sum / total)
}

/// Result of a weighted least-squares line fit
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedFit {
    pub slope: f64,
    pub intercept: f64,
    pub mean_x: f64,
    pub mean_y: f64,
    /// Weighted sum of squared x deviations
    pub sxx: f64,
    /// Weighted residual variance, `Σw·r² / df`
    pub residual_variance: f64,
    /// Degrees of freedom, `n - 2` floored at 1
    pub degrees_of_freedom: usize,
    /// Slope over its standard error; None when the fit is exact
    pub t_statistic: Option<f64>,
}

impl WeightedFit {
    /// Fitted value at `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Weighted least-squares regression of `ys` on `xs`.
///
/// Returns None when fewer than two points are given, the weights sum to zero,
/// or every x is identical. The degeneracy check is on the weighted variance of
/// x, so uniformly tiny weights fit the same line as unit weights.
pub fn weighted_linear_fit(xs: &[f64], ys: &[f64], weights: &[f64]) -> Option<WeightedFit> {
    let n = xs.len();
    if n < 2 || ys.len() != n || weights.len() != n {
        return None;
    }

    let total_weight: f64 = weights.iter().sum();
    let mean_x = weighted_mean(xs, weights)?;
    let mean_y = weighted_mean(ys, weights)?;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for ((x, y), w) in xs.iter().zip(ys).zip(weights) {
        sxx += w * (x - mean_x).powi(2);
        sxy += w * (x - mean_x) * (y - mean_y);
    }
    if sxx / total_weight <= f64::EPSILON {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let weighted_sse: f64 = xs
        .iter()
        .zip(ys)
        .zip(weights)
        .map(|((x, y), w)| {
            let residual = y - (slope * x + intercept);
            w * residual * residual
        })
        .sum();

    let degrees_of_freedom = n.saturating_sub(2).max(1);
    let residual_variance = weighted_sse / degrees_of_freedom as f64;
    let std_error = (residual_variance / sxx).sqrt();
    let t_statistic = if std_error > 0.0 {
        Some(slope / std_error)
    } else if slope.abs() <= f64::EPSILON {
        Some(0.0)
    } else {
        None
    };

    Some(WeightedFit {
        slope,
        intercept,
        mean_x,
        mean_y,
        sxx,
        residual_variance,
        degrees_of_freedom,
        t_statistic,
    })
}
