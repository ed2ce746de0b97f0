//! Derived views over extracted series. Nothing here performs I/O or
//! mutates its input.

use crate::error::{Result, StatsError};
use crate::model::{
    EntitySnapshot, MonthKey, MonthlyMetricSeries, Platform, PlatformCounts, PlatformShares,
    ReleaseRecord,
};

/// Number of leading months left out of growth sequences.
pub const GROWTH_SKIP: usize = 2;

/// Lowest growth rate ever reported.
pub const GROWTH_FLOOR: f64 = 0.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GrowthPoint {
    pub month: MonthKey,
    /// `None` when the previous month was zero.
    pub rate: Option<f64>,
}

impl GrowthPoint {
    pub fn value(&self) -> Result<f64> {
        self.rate.ok_or_else(|| StatsError::DivisionUndefined {
            month: self.month.to_string(),
        })
    }
}

/// Shrinking months are reported as zero growth, never negative.
pub fn floor_negative_growth(rate: f64) -> f64 {
    rate.max(GROWTH_FLOOR)
}

/// Month-over-month growth in percent, from the third month on.
pub fn growth_rate(series: &MonthlyMetricSeries) -> Vec<GrowthPoint> {
    let points: Vec<(&MonthKey, u64)> = series.iter().map(|(m, v)| (m, *v)).collect();

    points
        .iter()
        .enumerate()
        .skip(GROWTH_SKIP)
        .map(|(i, &(month, current))| {
            let previous = points[i - 1].1;
            let rate = if previous == 0 {
                None
            } else {
                let delta = current as f64 - previous as f64;
                Some(floor_negative_growth(delta / previous as f64 * 100.0))
            };
            GrowthPoint { month: month.clone(), rate }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcentrationPoint {
    pub n: usize,
    pub percent: f64,
}

/// Share of the total metric held by the top `n` entities, for each threshold.
pub fn top_n_concentration(snapshot: &EntitySnapshot, thresholds: &[usize]) -> Vec<ConcentrationPoint> {
    let sorted = snapshot.sorted_desc();
    let total = snapshot.total();

    thresholds
        .iter()
        .map(|&n| {
            let percent = if total == 0 {
                0.0
            } else {
                let top: u64 = sorted.iter().take(n).map(|e| e.value).sum();
                top as f64 / total as f64 * 100.0
            };
            ConcentrationPoint { n, percent }
        })
        .collect()
}

/// Each platform's percentage of the combined count. All zero when nothing was counted.
pub fn platform_share(counts: &PlatformCounts) -> PlatformShares {
    let total: u64 = counts.values().sum();
    counts
        .iter()
        .map(|(&platform, &count)| {
            let share = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            };
            (platform, share)
        })
        .collect()
}

pub fn release_shares(records: &[ReleaseRecord]) -> Vec<(String, PlatformShares)> {
    records
        .iter()
        .map(|r| (r.version.clone(), platform_share(&r.downloads)))
        .collect()
}

pub fn platform_totals(records: &[ReleaseRecord]) -> PlatformCounts {
    let mut totals = crate::model::empty_platform_counts();
    for record in records {
        for platform in Platform::ALL {
            *totals.entry(platform).or_insert(0) += record.downloads.get(&platform).copied().unwrap_or(0);
        }
    }
    totals
}
