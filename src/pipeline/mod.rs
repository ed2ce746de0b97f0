//! Runs the selected kinds and views against a source, a store and a chart sink.

mod plugins;
mod releases;
mod themes;

use crate::chart::{ChartSink, Figure};
use crate::config::{Config, FileFormat, KindSettings};
use crate::history::{load_history, HistoryOutcome};
use crate::model::{EntityKind, EntitySnapshot, MonthlyHistory};
use crate::source::{GithubSource, Transport};
use crate::store::Store;
use anyhow::Context;
use chrono::NaiveDate;
use console::style;
use std::fmt::Display;
use std::path::Path;

/// Which outputs were requested. No flag at all means the kind's default set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Views {
    pub save: bool,
    pub latest: bool,
    pub history: bool,
}

impl Views {
    pub fn is_default(&self) -> bool {
        !(self.save || self.latest || self.history)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub kinds: Vec<EntityKind>,
    pub views: Views,
}

impl RunPlan {
    /// Kinds always run as themes, plugins, releases regardless of flag order.
    pub fn new(plugins: bool, themes: bool, releases: bool, all: bool, views: Views) -> Self {
        let mut kinds = Vec::new();
        if themes || all {
            kinds.push(EntityKind::Themes);
        }
        if plugins || all {
            kinds.push(EntityKind::Plugins);
        }
        if releases || all {
            kinds.push(EntityKind::Releases);
        }
        Self { kinds, views }
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// History for one kind and whether it came straight from the source.
struct LoadedHistory {
    history: MonthlyHistory,
    fresh: bool,
}

pub struct Runner<'a, T> {
    config: &'a Config,
    source: GithubSource<T>,
    sink: &'a mut dyn ChartSink,
    today: NaiveDate,
    show_progress: bool,
}

impl<'a, T: Transport> Runner<'a, T> {
    pub fn new(config: &'a Config, source: GithubSource<T>, sink: &'a mut dyn ChartSink) -> Self {
        Self {
            config,
            source,
            sink,
            today: crate::util::today(),
            show_progress: false,
        }
    }

    /// Date stamped into snapshot file names.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn run(&mut self, plan: &RunPlan) -> anyhow::Result<()> {
        for &kind in &plan.kinds {
            tracing::info!(%kind, views = ?plan.views, "processing");
            let result = match kind {
                EntityKind::Themes => themes::exec(self, plan.views),
                EntityKind::Plugins => plugins::exec(self, plan.views),
                EntityKind::Releases => releases::exec(self, plan.views),
            };
            result.with_context(|| format!("Failed to process {kind}"))?;
        }
        Ok(())
    }

    fn format(&self) -> FileFormat {
        self.config.format
    }

    fn show(&mut self, figure: Figure) -> anyhow::Result<()> {
        self.sink
            .show(&figure)
            .with_context(|| format!("Failed to render '{}'", figure.title))
    }

    fn show_all<I: IntoIterator<Item = Figure>>(&mut self, figures: I) -> anyhow::Result<()> {
        figures.into_iter().try_for_each(|figure| self.show(figure))
    }

    /// `None` (after a warning) when neither the source nor the cache had data.
    fn history(&self, settings: &KindSettings, store: &Store) -> anyhow::Result<Option<LoadedHistory>> {
        let outcome = load_history(&self.source, settings, store, self.format(), self.show_progress)
            .with_context(|| format!("Failed to load {} history", settings.kind))?;

        Ok(match outcome {
            HistoryOutcome::Fresh(history) => Some(LoadedHistory { history, fresh: true }),
            HistoryOutcome::Cached { history, path } => {
                notice(format!(
                    "{} history unavailable from GitHub, using saved data from {}",
                    settings.kind,
                    path.display()
                ));
                Some(LoadedHistory { history, fresh: false })
            }
            HistoryOutcome::Unavailable(err) => {
                warn(format!("skipping {} history: {err}", settings.kind));
                None
            }
        })
    }

    /// Current stats, or `None` (after a warning) when the endpoint is unreachable.
    fn latest(&self, settings: &KindSettings) -> anyhow::Result<Option<EntitySnapshot>> {
        match self.source.latest_snapshot(&settings.latest_url, settings.metric_field) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) if err.is_recoverable() => {
                warn(format!("skipping latest {} stats: {err}", settings.kind));
                Ok(None)
            }
            Err(err) => Err(err)
                .with_context(|| format!("Failed to read latest {} stats", settings.kind)),
        }
    }

    fn save_latest(
        &self,
        settings: &KindSettings,
        store: &Store,
        latest: Option<&EntitySnapshot>,
    ) -> anyhow::Result<()> {
        let Some(snapshot) = latest else {
            warn(format!("no latest {} stats to save", settings.kind));
            return Ok(());
        };
        let header = settings
            .snapshot_header
            .with_context(|| format!("{} has no latest-stats file", settings.kind))?;
        let field = settings.metric_field.unwrap_or("downloads");
        // dated snapshots are always CSV
        let path = store
            .save_snapshot(
                settings.snapshot_prefix,
                header,
                field,
                snapshot,
                self.today,
                FileFormat::Csv,
            )
            .context("Failed to save latest stats")?;
        saved("latest data", &path);
        Ok(())
    }

    /// Persist the counts series (and the metric series when tracked).
    /// Series read back from the cache are left untouched.
    fn save_history(
        &self,
        settings: &KindSettings,
        store: &Store,
        loaded: Option<&LoadedHistory>,
        counts_label: &str,
        metric_label: &str,
    ) -> anyhow::Result<()> {
        let (Some(loaded), Some(counts_series)) = (loaded, settings.counts_series) else {
            return Ok(());
        };
        if !loaded.fresh {
            notice(format!("{} series not re-saved from cached data", settings.kind));
            return Ok(());
        }

        if let Some(name) = settings.metric_series {
            let path = store
                .save_series(name, metric_label, &loaded.history.metric, self.format())
                .context("Failed to save monthly metric series")?;
            saved("monthly series", &path);
        }
        let path = store
            .save_series(counts_series, counts_label, &loaded.history.counts, self.format())
            .context("Failed to save monthly counts")?;
        saved("monthly counts", &path);
        Ok(())
    }
}

fn saved(what: &str, path: &Path) {
    println!("{} {what} to {}", style("Saved").green().bold(), path.display());
}

fn notice<M: Display>(message: M) {
    tracing::debug!("{message}");
    eprintln!("{} {message}", style("note:").cyan().bold());
}

fn warn<M: Display>(message: M) {
    tracing::debug!("{message}");
    eprintln!("{} {message}", style("warning:").yellow().bold());
}
