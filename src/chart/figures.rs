//! Builders that turn aggregated data into chart descriptions.

use super::{Figure, FigureKind, FigureSize, LinePanel, UnitScale};
use crate::aggregate::{ConcentrationPoint, GrowthPoint};
use crate::distribution::{self, HistogramBin};
use crate::model::{MonthlyMetricSeries, Platform, PlatformCounts, PlatformShares};

const WIDE: FigureSize = FigureSize::new(15.0, 7.0);
const TALL: FigureSize = FigureSize::new(7.0, 10.0);
const KDE_POINTS: usize = 200;

fn month_labels(series: &MonthlyMetricSeries) -> Vec<String> {
    series.keys().map(|m| m.to_string()).collect()
}

pub fn monthly_bar(title: &str, y_label: &str, series: &MonthlyMetricSeries, unit_scale: UnitScale) -> Figure {
    Figure {
        title: title.to_string(),
        size: WIDE,
        kind: FigureKind::Bar {
            labels: month_labels(series),
            values: series.values().copied().collect(),
            unit_scale,
            y_label: y_label.to_string(),
        },
    }
}

/// Undefined growth points keep their slot on the x axis but are not plotted.
pub fn growth_line(title: &str, growth: &[GrowthPoint]) -> Figure {
    let points = growth
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.value().ok().map(|rate| (i as f64, rate)))
        .collect();

    Figure {
        title: title.to_string(),
        size: WIDE,
        kind: FigureKind::Line {
            x_labels: growth.iter().map(|p| p.month.to_string()).collect(),
            points,
            x_label: "Month".into(),
            y_label: "Growth Rate (%)".into(),
        },
    }
}

pub fn concentration_line(title: &str, points: &[ConcentrationPoint]) -> Figure {
    Figure {
        title: title.to_string(),
        size: FigureSize::new(10.0, 6.0),
        kind: FigureKind::Line {
            x_labels: points.iter().map(|p| p.n.to_string()).collect(),
            points: points.iter().enumerate().map(|(i, p)| (i as f64, p.percent)).collect(),
            x_label: "Top N Plugins".into(),
            y_label: "Percentage of downloads".into(),
        },
    }
}

/// Counts and metric over the months of `counts`; months the metric lacks plot as zero.
pub fn counts_and_metric(
    title: &str,
    counts: &MonthlyMetricSeries,
    metric: &MonthlyMetricSeries,
    counts_label: &str,
    metric_label: &str,
) -> Figure {
    Figure {
        title: title.to_string(),
        size: FigureSize::new(25.0, 7.0),
        kind: FigureKind::DualLine {
            x_labels: month_labels(counts),
            left: LinePanel {
                label: counts_label.to_string(),
                values: counts.values().map(|v| *v as f64).collect(),
            },
            right: LinePanel {
                label: metric_label.to_string(),
                values: counts
                    .keys()
                    .map(|m| metric.get(m).copied().unwrap_or(0) as f64)
                    .collect(),
            },
        },
    }
}

pub fn platform_pie(title: &str, totals: &PlatformCounts) -> Figure {
    Figure {
        title: title.to_string(),
        size: FigureSize::new(8.0, 8.0),
        kind: FigureKind::Pie {
            slices: Platform::ALL
                .iter()
                .map(|p| (p.as_str().to_string(), totals.get(p).copied().unwrap_or(0) as f64))
                .collect(),
        },
    }
}

pub fn platform_stack(title: &str, shares: &[(String, PlatformShares)]) -> Figure {
    let segments = Platform::ALL
        .iter()
        .map(|p| {
            let values = shares
                .iter()
                .map(|(_, s)| s.get(p).copied().unwrap_or(0.0))
                .collect();
            (p.as_str().to_string(), values)
        })
        .collect();

    Figure {
        title: title.to_string(),
        size: FigureSize::new(10.0, 6.0),
        kind: FigureKind::StackedBar {
            labels: shares.iter().map(|(version, _)| version.clone()).collect(),
            segments,
        },
    }
}

pub fn histogram(title: &str, values: &[f64], bins: Option<usize>, log_scale: bool) -> Figure {
    let bins: Vec<HistogramBin> = distribution::histogram(
        values,
        bins.unwrap_or_else(|| distribution::auto_bin_count(values.len())),
    );
    Figure {
        title: title.to_string(),
        size: if log_scale { FigureSize::new(12.0, 6.0) } else { TALL },
        kind: FigureKind::Histogram {
            bins,
            log_scale,
            x_label: "Downloads".into(),
        },
    }
}

/// `with_stats` puts the median and mean into the title.
pub fn kde(title: &str, values: &[f64], with_stats: bool) -> Figure {
    let summary = distribution::summarize(values);
    let title = match (&summary, with_stats) {
        (Some(s), true) => format!("{title} (Median: {:.0}, Average: {:.2})", s.median, s.mean),
        _ => title.to_string(),
    };
    Figure {
        title,
        size: TALL,
        kind: FigureKind::Kde {
            curve: distribution::kde(values, KDE_POINTS),
            summary,
            x_label: "Downloads".into(),
        },
    }
}

/// `None` when there is nothing to summarize.
pub fn boxplot(title: &str, values: &[f64], with_stats: bool) -> Option<Figure> {
    let summary = distribution::summarize(values)?;
    let title = if with_stats {
        format!("{title} (Median: {:.0}, Average: {:.2})", summary.median, summary.mean)
    } else {
        title.to_string()
    };
    Some(Figure {
        title,
        size: TALL,
        kind: FigureKind::Boxplot {
            summary,
            y_label: "Downloads".into(),
        },
    })
}
