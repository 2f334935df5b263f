//! Numeric kernels shared by the cleaning, reporting and chart stages.
//!
//! Conventions follow pandas so report numbers line up with what an analyst
//! would see in a notebook: standard deviation uses `n - 1`, skewness is the
//! adjusted Fisher-Pearson G1, kurtosis is bias-corrected excess kurtosis G2,
//! and quantiles interpolate linearly between order statistics.

use std::f64::consts::PI;

use crate::data::model::Dataset;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (`n - 1` denominator). Needs two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (n - 1) as f64).sqrt())
}

/// Mean and central moment sums `Σ(x-m)^2`, `Σ(x-m)^3`, `Σ(x-m)^4`.
fn moment_sums(values: &[f64]) -> Option<(f64, f64, f64, f64)> {
    let m = mean(values)?;
    let (s2, s3, s4) = values.iter().fold((0.0, 0.0, 0.0), |(s2, s3, s4), v| {
        let d = v - m;
        let d2 = d * d;
        (s2 + d2, s3 + d2 * d, s4 + d2 * d2)
    });
    Some((m, s2, s3, s4))
}

/// True when a sum of squared deviations is only rounding noise around `mean`.
fn is_constant(sum_sq: f64, mean: f64, n: f64) -> bool {
    sum_sq <= 16.0 * n * (f64::EPSILON * mean.abs().max(1.0)).powi(2)
}

/// Adjusted Fisher-Pearson skewness. Needs three values; constant data is 0.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len() as f64;
    if values.len() < 3 {
        return None;
    }
    let (m, m2, m3, _) = moment_sums(values)?;
    if is_constant(m2, m, n) {
        return Some(0.0);
    }
    Some((n * (n - 1.0).sqrt() / (n - 2.0)) * (m3 / m2.powf(1.5)))
}

/// Bias-corrected excess kurtosis. Needs four values; constant data is 0.
pub fn kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len() as f64;
    if values.len() < 4 {
        return None;
    }
    let (m, m2, _, m4) = moment_sums(values)?;
    if is_constant(m2, m, n) {
        return Some(0.0);
    }
    let adj = 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
    let numerator = n * (n + 1.0) * (n - 1.0) * m4;
    let denominator = (n - 2.0) * (n - 3.0) * m2 * m2;
    Some(numerator / denominator - adj)
}

/// Linear-interpolated quantile of already sorted data.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Sort a copy of `values` (NaN-free input assumed).
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

// ---------------------------------------------------------------------------
// Standardized scores
// ---------------------------------------------------------------------------

/// Standardized scores for a nullable column.
///
/// Returns `None` when the score is undefined for the whole column: fewer than
/// two non-null values, or zero variance. Null cells map to `None`.
pub fn z_scores(values: &[Option<f64>]) -> Option<Vec<Option<f64>>> {
    let valid: Vec<f64> = values.iter().flatten().copied().collect();
    let n = valid.len() as f64;
    let m = mean(&valid)?;
    let sd = sample_std(&valid)?;
    if !sd.is_finite() || is_constant(sd * sd * (n - 1.0), m, n) {
        return None;
    }
    Some(values.iter().map(|v| v.map(|x| (x - m) / sd)).collect())
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Pearson correlation over rows where both cells are present.
///
/// NaN when fewer than two complete pairs exist or either side is constant.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (sxy, sxx, syy) = pairs.iter().fold((0.0, 0.0, 0.0), |(sxy, sxx, syy), (a, b)| {
        let (dx, dy) = (a - mx, b - my);
        (sxy + dx * dy, sxx + dx * dx, syy + dy * dy)
    });
    if is_constant(sxx, mx, n) || is_constant(syy, my, n) {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Square, symmetric Pearson matrix over the numeric columns of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `columns.len()²` entries.
    values: Vec<f64>,
}

impl CorrelationMatrix {
    pub fn compute(dataset: &Dataset) -> Self {
        let numeric: Vec<(&str, &[Option<f64>])> = dataset
            .numeric_columns()
            .filter_map(|c| Some((c.name.as_str(), c.as_numeric()?)))
            .collect();
        let k = numeric.len();
        let mut values = vec![f64::NAN; k * k];

        for i in 0..k {
            let defined = z_scores(numeric[i].1).is_some();
            values[i * k + i] = if defined { 1.0 } else { f64::NAN };
            for j in (i + 1)..k {
                let r = pearson(numeric[i].1, numeric[j].1);
                values[i * k + j] = r;
                values[j * k + i] = r;
            }
        }

        CorrelationMatrix {
            columns: numeric.iter().map(|(n, _)| n.to_string()).collect(),
            values,
        }
    }

    pub fn size(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.size() + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let k = self.size();
        &self.values[row * k..(row + 1) * k]
    }
}

// ---------------------------------------------------------------------------
// Histogram binning and kernel density
// ---------------------------------------------------------------------------

/// Upper bound on histogram bins so pathological data cannot explode a chart.
const MAX_BINS: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `counts.len() + 1` ascending edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        self.edges[1] - self.edges[0]
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Equal-width histogram using numpy's "auto" rule: the smaller of the
/// Sturges and Freedman-Diaconis widths, falling back to Sturges when the
/// interquartile range is zero.
pub fn histogram(values: &[f64]) -> Option<Histogram> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    let data = sorted(&finite);
    let n = data.len() as f64;
    let (mut lo, mut hi) = (data[0], data[data.len() - 1]);
    let spread = hi - lo;
    if spread == 0.0 {
        lo -= 0.5;
        hi += 0.5;
    }
    let range = hi - lo;

    // widths come from the real spread, so constant data gets a single bin
    let sturges = spread / (n.log2() + 1.0);
    let iqr = quantile_sorted(&data, 0.75)? - quantile_sorted(&data, 0.25)?;
    let fd = 2.0 * iqr * n.powf(-1.0 / 3.0);
    let width = if fd > 0.0 { fd.min(sturges) } else { sturges };

    let bins = if width > 0.0 {
        ((range / width).ceil() as usize).clamp(1, MAX_BINS)
    } else {
        1
    };
    let step = range / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + step * i as f64).collect();

    let mut counts = vec![0usize; bins];
    for &v in &data {
        let idx = (((v - lo) / step) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Some(Histogram { edges, counts })
}

/// Gaussian kernel density estimate with Scott's bandwidth rule.
#[derive(Debug, Clone)]
pub struct Kde {
    points: Vec<f64>,
    bandwidth: f64,
}

impl Kde {
    /// `None` for fewer than two points or zero spread.
    pub fn fit(values: &[f64]) -> Option<Kde> {
        let points: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let sd = sample_std(&points)?;
        if sd <= 0.0 || !sd.is_finite() {
            return None;
        }
        let bandwidth = sd * (points.len() as f64).powf(-0.2);
        Some(Kde { points, bandwidth })
    }

    pub fn density(&self, x: f64) -> f64 {
        let h = self.bandwidth;
        let norm = 1.0 / (self.points.len() as f64 * h * (2.0 * PI).sqrt());
        norm * self
            .points
            .iter()
            .map(|p| (-0.5 * ((x - p) / h).powi(2)).exp())
            .sum::<f64>()
    }

    /// `samples` evenly spaced `(x, density)` pairs across `[lo, hi]`.
    pub fn curve(&self, lo: f64, hi: f64, samples: usize) -> Vec<(f64, f64)> {
        let samples = samples.max(2);
        let step = (hi - lo) / (samples - 1) as f64;
        (0..samples)
            .map(|i| {
                let x = lo + step * i as f64;
                (x, self.density(x))
            })
            .collect()
    }
}
