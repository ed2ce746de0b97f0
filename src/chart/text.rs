use super::draw::draw_figure;
use super::{ChartSink, ChartStyle, Figure, FigureSize};
use crate::error::Result;
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::io::Write;

/// Renders figures off-screen and writes them as plain text.
pub struct TextSink<W: Write> {
    out: W,
    style: ChartStyle,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W, style: ChartStyle) -> Self {
        Self { out, style }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Cell grid for a figure size given in inches.
fn cells(size: FigureSize) -> (u16, u16) {
    let cols = (size.width * 10.0).round().clamp(40.0, 200.0) as u16;
    let rows = (size.height * 4.0).round().clamp(12.0, 60.0) as u16;
    (cols, rows)
}

pub fn render_to_string(figure: &Figure, style: &ChartStyle) -> Result<String> {
    let (cols, rows) = cells(figure.size);
    let mut terminal = Terminal::new(TestBackend::new(cols, rows))?;
    terminal.draw(|f| {
        let area = f.size();
        draw_figure(f, area, figure, style);
    })?;

    let buffer = terminal.backend().buffer();
    let mut text = String::new();
    for row in buffer.content.chunks(cols as usize) {
        let line: String = row.iter().map(|cell| cell.symbol()).collect();
        text.push_str(line.trim_end());
        text.push('\n');
    }
    Ok(text)
}

impl<W: Write> ChartSink for TextSink<W> {
    fn show(&mut self, figure: &Figure) -> Result<()> {
        let text = render_to_string(figure, &self.style)?;
        writeln!(self.out, "{text}")?;
        self.out.flush()?;
        tracing::debug!(title = %figure.title, "rendered figure as text");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::figures;
    use crate::chart::UnitScale;
    use crate::model::{MonthKey, MonthlyMetricSeries};

    fn style() -> ChartStyle {
        ChartStyle::from_hex("#773ee9").unwrap()
    }

    #[test]
    fn cell_grid_is_clamped() {
        assert_eq!(cells(FigureSize::new(15.0, 7.0)), (150, 28));
        assert_eq!(cells(FigureSize::new(25.0, 20.0)), (200, 60));
        assert_eq!(cells(FigureSize::new(1.0, 1.0)), (40, 12));
    }

    #[test]
    fn bar_chart_text_has_title_and_months() {
        let series: MonthlyMetricSeries = [("2024-01", 1200), ("2024-02", 1250)]
            .into_iter()
            .map(|(m, v)| (MonthKey::parse(m).unwrap(), v))
            .collect();
        let figure = figures::monthly_bar("Monthly Plugin Counts", "Plugin Counts", &series, UnitScale::Units);

        let mut sink = TextSink::new(Vec::new(), style());
        sink.show(&figure).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.contains("Monthly Plugin Counts"));
        assert!(text.contains("2024-02"));
    }

    #[test]
    fn every_figure_kind_renders() {
        let values: Vec<f64> = (1..=40).map(|v| (v * v) as f64).collect();
        let counts: MonthlyMetricSeries = [("2024-01", 10), ("2024-02", 12), ("2024-03", 18)]
            .into_iter()
            .map(|(m, v)| (MonthKey::parse(m).unwrap(), v))
            .collect();
        let growth = crate::aggregate::growth_rate(&counts);
        let totals: crate::model::PlatformCounts = [
            (crate::model::Platform::Linux, 5),
            (crate::model::Platform::Windows, 3),
            (crate::model::Platform::MacOS, 2),
        ]
        .into_iter()
        .collect();

        let all = vec![
            figures::growth_line("Growth", &growth),
            figures::histogram("Histogram", &values, Some(50), true),
            figures::histogram("Auto Histogram", &values, None, false),
            figures::kde("KDE", &values, true),
            figures::boxplot("Boxplot", &values, false).unwrap(),
            figures::platform_pie("Pie", &totals),
        ];
        for figure in all {
            let text = render_to_string(&figure, &style()).unwrap();
            assert!(text.contains(&figure.title), "missing title in\n{text}");
        }
    }
}
