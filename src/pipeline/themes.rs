use super::{Runner, Views};
use crate::aggregate::growth_rate;
use crate::chart::{figures, Figure, UnitScale};
use crate::model::{EntityKind, MonthlyHistory};
use crate::source::Transport;
use crate::store::Store;

const COUNTS_LABEL: &str = "Theme Count";
const DISTRIBUTION_BINS: usize = 50;

pub(super) fn exec<T: Transport>(runner: &mut Runner<'_, T>, views: Views) -> anyhow::Result<()> {
    let settings = runner.config.kind(EntityKind::Themes);
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
        runner.save_history(&settings, &store, history.as_ref(), COUNTS_LABEL, "")?;
        runner.save_latest(&settings, &store, latest.as_ref())?;
    }

    let downloads = latest.as_ref().map(|snapshot| snapshot.values());

    if views.latest {
        if let Some(values) = &downloads {
            let charts = vec![
                distribution(values),
                figures::histogram("Histogram of Theme Downloads", values, None, false),
                figures::kde("KDE Plot of Theme Downloads", values, false),
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
        if let Some(values) = &downloads {
            let mut charts = vec![distribution(values)];
            charts.extend(figures::boxplot("Boxplot of Theme Downloads", values, false));
            charts.push(figures::histogram("Histogram of Theme Downloads", values, None, false));
            runner.show_all(charts)?;
        }
    }

    Ok(())
}

fn distribution(values: &[f64]) -> Figure {
    figures::histogram(
        "Distribution of Theme Downloads",
        values,
        Some(DISTRIBUTION_BINS),
        true,
    )
}

fn history_figures(history: &MonthlyHistory) -> Vec<Figure> {
    vec![
        figures::monthly_bar("Monthly Theme Counts", "Theme Counts", &history.counts, UnitScale::Units),
        figures::growth_line("Monthly Theme Growth Rate", &growth_rate(&history.counts)),
    ]
}
