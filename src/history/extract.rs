use super::index::monthly_index;
use crate::config::{FileFormat, KindSettings};
use crate::error::{Result, StatsError};
use crate::model::{ChangeEvent, EntitySnapshot, MonthlyHistory, MonthlyMetricSeries};
use crate::source::HistorySource;
use crate::store::Store;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

/// How a kind's monthly history was obtained.
#[derive(Debug)]
pub enum HistoryOutcome {
    Fresh(MonthlyHistory),
    /// The source was unreachable; the counts series was read from `path`.
    Cached { history: MonthlyHistory, path: PathBuf },
    /// Neither the source nor the cache had data. Holds a `NoDataAvailable` error.
    Unavailable(StatsError),
}

impl HistoryOutcome {
    pub fn into_history(self) -> Option<MonthlyHistory> {
        match self {
            HistoryOutcome::Fresh(history) | HistoryOutcome::Cached { history, .. } => Some(history),
            HistoryOutcome::Unavailable(_) => None,
        }
    }
}

/// Reduce a change timeline to monthly entity counts and metric sums.
///
/// Snapshots are fetched one month at a time; the first failure aborts.
pub fn extract<F>(events: &[ChangeEvent], fetch: F) -> Result<MonthlyHistory>
where
    F: FnMut(&str) -> Result<EntitySnapshot>,
{
    extract_with_progress(events, fetch, false)
}

pub fn extract_with_progress<F>(
    events: &[ChangeEvent],
    mut fetch: F,
    show_progress: bool,
) -> Result<MonthlyHistory>
where
    F: FnMut(&str) -> Result<EntitySnapshot>,
{
    let index = monthly_index(events)?;

    let pb = if show_progress {
        let pb = ProgressBar::new(index.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut counts = MonthlyMetricSeries::new();
    let mut metric = MonthlyMetricSeries::new();

    for (month, snapshot_id) in &index {
        pb.set_message(format!("snapshot {month}"));
        let snapshot = match fetch(snapshot_id) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                pb.abandon_with_message(format!("failed at {month}"));
                return Err(e);
            }
        };
        counts.insert(month.clone(), snapshot.len() as u64);
        metric.insert(month.clone(), snapshot.total());
        pb.inc(1);
    }

    pb.finish_and_clear();
    tracing::debug!(months = counts.len(), events = events.len(), "history extracted");
    Ok(MonthlyHistory { counts, metric })
}

/// Fetch a kind's history, falling back one level to its persisted series
/// when the commit listing cannot be enumerated. Saved series are looked up
/// in `format` first and then in the other format.
pub fn load_history<S: HistorySource>(
    source: &S,
    settings: &KindSettings,
    store: &Store,
    format: FileFormat,
    show_progress: bool,
) -> Result<HistoryOutcome> {
    let (Some(manifest), Some(counts_series)) = (settings.manifest_path, settings.counts_series) else {
        return Err(StatsError::InvalidConfig(format!("{} has no tracked manifest", settings.kind)));
    };

    let events = match source.change_events(manifest) {
        Ok(events) => events,
        Err(err) if err.is_recoverable() => {
            tracing::warn!(kind = %settings.kind, error = %err, "commit history unavailable, trying saved series");
            return load_cached(counts_series, settings.metric_series, store, format, err);
        }
        Err(err) => return Err(err),
    };

    let history = extract_with_progress(
        &events,
        |sha| source.snapshot(sha, manifest, settings.metric_field),
        show_progress,
    )?;
    Ok(HistoryOutcome::Fresh(history))
}

fn load_cached(
    counts_series: &str,
    metric_series: Option<&str>,
    store: &Store,
    format: FileFormat,
    cause: StatsError,
) -> Result<HistoryOutcome> {
    let Some((counts, counts_path)) = store.load_series_any(counts_series, format)? else {
        let path = store.series_path(counts_series, format);
        return Ok(HistoryOutcome::Unavailable(missing(cause, &path)));
    };

    let metric = match metric_series {
        Some(name) => match store.load_series_any(name, format)? {
            Some((metric, _)) => metric,
            None => {
                let path = store.series_path(name, format);
                return Ok(HistoryOutcome::Unavailable(missing(cause, &path)));
            }
        },
        None => MonthlyMetricSeries::new(),
    };

    Ok(HistoryOutcome::Cached {
        history: MonthlyHistory { counts, metric },
        path: counts_path,
    })
}

fn missing(cause: StatsError, path: &std::path::Path) -> StatsError {
    StatsError::NoDataAvailable(format!("{cause}; no saved data at {}", path.display()))
}
