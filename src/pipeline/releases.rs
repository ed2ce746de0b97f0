use super::{saved, warn, Runner, Views};
use crate::aggregate::{platform_totals, release_shares};
use crate::chart::figures;
use crate::config::FileFormat;
use crate::model::EntityKind;
use crate::source::Transport;
use crate::store::Store;
use anyhow::Context;

/// Releases have no latest view; `-l` on its own falls through to the default set.
pub(super) fn exec<T: Transport>(runner: &mut Runner<'_, T>, views: Views) -> anyhow::Result<()> {
    let settings = runner.config.kind(EntityKind::Releases);
    let store = Store::for_kind(&settings);
    let default = !(views.save || views.history);

    let records = match runner.source.releases(&settings.latest_url) {
        Ok(records) => records,
        Err(err) if err.is_recoverable() => {
            warn(format!("skipping releases: {err}"));
            return Ok(());
        }
        Err(err) => return Err(err).context("Failed to read releases"),
    };
    tracing::debug!(releases = records.len(), "releases loaded");

    if views.save || default {
        let path = store
            .save_releases(settings.snapshot_prefix, &records, runner.today, FileFormat::Csv)
            .context("Failed to save releases")?;
        saved("release data", &path);
    }

    if views.history || default {
        let charts = vec![
            figures::platform_stack(
                "Stacked Bar Chart of Downloads by Version and Platform",
                &release_shares(&records),
            ),
            figures::platform_pie(
                "Cumulative Download Numbers by Platform",
                &platform_totals(&records),
            ),
        ];
        runner.show_all(charts)?;
    }

    Ok(())
}
