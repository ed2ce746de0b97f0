use std::f64::consts::PI;

/// Five-number summary plus the boxplot whiskers.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
    /// Furthest values within 1.5 × IQR of the quartiles.
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Linear-interpolated quantile of already sorted, non-empty data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

pub fn summarize(values: &[f64]) -> Option<Summary> {
    let data = sorted(values);
    if data.is_empty() {
        return None;
    }

    let q1 = quantile(&data, 0.25);
    let q3 = quantile(&data, 0.75);
    let reach = 1.5 * (q3 - q1);
    let (low_fence, high_fence) = (q1 - reach, q3 + reach);

    let whisker_low = data.iter().copied().find(|v| *v >= low_fence).unwrap_or(q1);
    let whisker_high = data.iter().rev().copied().find(|v| *v <= high_fence).unwrap_or(q3);
    let outliers = data
        .iter()
        .copied()
        .filter(|v| *v < whisker_low || *v > whisker_high)
        .collect();

    Some(Summary {
        count: data.len(),
        min: data[0],
        q1,
        median: quantile(&data, 0.5),
        q3,
        max: data[data.len() - 1],
        mean: data.iter().sum::<f64>() / data.len() as f64,
        whisker_low,
        whisker_high,
        outliers,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: u64,
}

/// Sturges' rule.
pub fn auto_bin_count(n: usize) -> usize {
    if n <= 1 {
        1
    } else {
        (n as f64).log2().ceil() as usize + 1
    }
}

/// Equal-width bins spanning the data; the last bin includes the maximum.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let data = sorted(values);
    if data.is_empty() || bins == 0 {
        return Vec::new();
    }

    let (min, max) = (data[0], data[data.len() - 1]);
    if min == max {
        return vec![HistogramBin { start: min, end: max, count: data.len() as u64 }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for v in data {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// Gaussian kernel density estimate on `points` evenly spaced samples.
///
/// Bandwidth follows Scott's rule (sample std × n^(-1/5)); the grid extends
/// three bandwidths past the data on each side.
pub fn kde(values: &[f64], points: usize) -> Vec<(f64, f64)> {
    let data = sorted(values);
    let n = data.len();
    if n < 2 || points < 2 {
        return Vec::new();
    }

    let mean = data.iter().sum::<f64>() / n as f64;
    let variance = data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = variance.sqrt();
    if std == 0.0 {
        return Vec::new();
    }

    let bandwidth = std * (n as f64).powf(-0.2);
    let lo = data[0] - 3.0 * bandwidth;
    let hi = data[n - 1] + 3.0 * bandwidth;
    let step = (hi - lo) / (points - 1) as f64;
    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * PI).sqrt());

    (0..points)
        .map(|i| {
            let x = lo + step * i as f64;
            let density = data
                .iter()
                .map(|xi| {
                    let u = (x - xi) / bandwidth;
                    (-0.5 * u * u).exp()
                })
                .sum::<f64>()
                * norm;
            (x, density)
        })
        .collect()
}
