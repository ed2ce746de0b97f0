use super::{Runner, Views};
use crate::aggregate::{growth_rate, top_n_concentration};
use crate::chart::{figures, Figure, UnitScale};
use crate::model::{EntityKind, EntitySnapshot, MonthlyHistory};
use crate::source::Transport;
use crate::store::Store;

const COUNTS_LABEL: &str = "Plugin Count";
const DOWNLOADS_LABEL: &str = "Downloads";

pub(super) fn exec<T: Transport>(runner: &mut Runner<'_, T>, views: Views) -> anyhow::Result<()> {
    let settings = runner.config.kind(EntityKind::Plugins);
    let store = Store::for_kind(&settings);
    let default = views.is_default();

    let history = if views.save || views.history || default {
        runner.history(&settings, &store)?
    } else {
        None
    };
    let latest = if views.save || views.latest || default {
        runner.latest(&settings)?
    } else {
        None
    };

    if views.save || default {
        runner.save_latest(&settings, &store, latest.as_ref())?;
        runner.save_history(&settings, &store, history.as_ref(), COUNTS_LABEL, DOWNLOADS_LABEL)?;
    }

    if views.latest {
        if let Some(snapshot) = &latest {
            let charts = vec![
                concentration(snapshot, &runner.config.top_n),
                figures::kde("KDE Plot", &snapshot.values(), true),
            ];
            runner.show_all(charts)?;
        }
    }

    if views.history || default {
        if let Some(loaded) = &history {
            runner.show_all(history_figures(&loaded.history))?;
        }
    }

    if default {
        if let Some(snapshot) = &latest {
            let mut charts = vec![concentration(snapshot, &runner.config.top_n)];
            charts.extend(figures::boxplot("Boxplot", &snapshot.values(), true));
            runner.show_all(charts)?;
        }
    }

    Ok(())
}

fn concentration(snapshot: &EntitySnapshot, top_n: &[usize]) -> Figure {
    figures::concentration_line(
        "Percentage of downloads for top N plugins",
        &top_n_concentration(snapshot, top_n),
    )
}

fn history_figures(history: &MonthlyHistory) -> Vec<Figure> {
    vec![
        figures::monthly_bar(
            "Monthly Download Counts (values in millions)",
            "Downloads (in millions)",
            &history.metric,
            UnitScale::Millions,
        ),
        figures::monthly_bar("Monthly Plugin Counts", "Plugin Counts", &history.counts, UnitScale::Units),
        figures::growth_line("Monthly Plugin Growth Rate", &growth_rate(&history.counts)),
        figures::counts_and_metric(
            "Monthly Plugin Counts and Downloads",
            &history.counts,
            &history.metric,
            "Plugin Counts",
            "Monthly Downloads",
        ),
    ]
}
