use super::color::{base_color, gradient_colors};
use super::{ChartStyle, Figure, FigureKind, LinePanel, UnitScale};
use crate::distribution::{HistogramBin, Summary};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::block::{Position, Title};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine, Points, Rectangle};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph,
};
use ratatui::Frame;
use std::f64::consts::PI;

const MONTH_BAR_WIDTH: u16 = 7;
const PIE_START_DEGREES: f64 = 140.0;
const MUTED: Color = Color::Gray;

pub fn draw_figure(f: &mut Frame, area: Rect, figure: &Figure, style: &ChartStyle) {
    match &figure.kind {
        FigureKind::Bar { labels, values, unit_scale, y_label } => {
            draw_bars(f, area, &figure.title, labels, values, *unit_scale, y_label, style)
        }
        FigureKind::Line { x_labels, points, x_label, y_label } => {
            let block = frame_block(&figure.title, Some(x_label.clone()));
            draw_line(f, area, block, x_labels, points, y_label, base_color(style.base_color));
        }
        FigureKind::DualLine { x_labels, left, right } => {
            draw_dual(f, area, &figure.title, x_labels, left, right, style)
        }
        FigureKind::Pie { slices } => draw_pie(f, area, &figure.title, slices, style),
        FigureKind::StackedBar { labels, segments } => {
            draw_stack(f, area, &figure.title, labels, segments, style)
        }
        FigureKind::Histogram { bins, log_scale, x_label } => {
            draw_histogram(f, area, &figure.title, bins, *log_scale, x_label, style)
        }
        FigureKind::Kde { curve, summary, x_label } => {
            draw_kde(f, area, &figure.title, curve, summary.as_ref(), x_label, style)
        }
        FigureKind::Boxplot { summary, y_label } => {
            draw_boxplot(f, area, &figure.title, summary, y_label, style)
        }
    }
}

fn frame_block(title: &str, footer: Option<String>) -> Block<'static> {
    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        title.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    match footer {
        Some(text) => block.title(
            Title::from(text)
                .position(Position::Bottom)
                .alignment(Alignment::Center),
        ),
        None => block,
    }
}

fn draw_empty(f: &mut Frame, area: Rect, title: &str) {
    let notice = Paragraph::new("no data")
        .alignment(Alignment::Center)
        .block(frame_block(title, None));
    f.render_widget(notice, area);
}

/// Short human form for axis ticks.
fn axis_value(v: f64) -> String {
    let magnitude = v.abs();
    if magnitude >= 1_000_000.0 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if magnitude >= 1_000.0 {
        format!("{:.1}k", v / 1_000.0)
    } else if magnitude >= 1.0 || v == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v:.1e}")
    }
}

fn span_bounds(lo: f64, hi: f64) -> [f64; 2] {
    if (hi - lo).abs() < f64::EPSILON {
        [lo - 1.0, hi + 1.0]
    } else {
        [lo, hi]
    }
}

fn tick_labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .iter()
        .map(|v| Span::raw(axis_value(*v)))
        .collect()
}

/// First, middle and last label; the axis spreads them evenly.
fn category_ticks(labels: &[String]) -> Vec<Span<'static>> {
    match labels {
        [] => Vec::new(),
        [only] => vec![Span::raw(only.clone())],
        _ => {
            let mid = labels.len() / 2;
            vec![
                Span::raw(labels[0].clone()),
                Span::raw(labels[mid].clone()),
                Span::raw(labels[labels.len() - 1].clone()),
            ]
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_bars(
    f: &mut Frame,
    area: Rect,
    title: &str,
    labels: &[String],
    values: &[u64],
    unit_scale: UnitScale,
    y_label: &str,
    style: &ChartStyle,
) {
    if values.is_empty() {
        return draw_empty(f, area, title);
    }

    // newest bars are kept when the area is too narrow for all of them
    let slot = (MONTH_BAR_WIDTH + 1) as usize;
    let fits = (area.width.saturating_sub(2) as usize / slot).max(1);
    let start = values.len().saturating_sub(fits);

    // oldest bars are lightest
    let mut colors = gradient_colors(style.base_color, values.len());
    colors.reverse();

    let bars: Vec<Bar> = values
        .iter()
        .zip(labels)
        .zip(colors)
        .skip(start)
        .map(|((&value, label), color)| {
            Bar::default()
                .value(value)
                .label(Line::from(label.clone()))
                .text_value(unit_scale.format(value))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect();

    let footer = if start > 0 {
        format!("Month (latest {} of {}) / {y_label}", values.len() - start, values.len())
    } else {
        format!("Month / {y_label}")
    };
    let chart = BarChart::default()
        .block(frame_block(title, Some(footer)))
        .data(BarGroup::default().bars(&bars))
        .bar_width(MONTH_BAR_WIDTH)
        .bar_gap(1);
    f.render_widget(chart, area);
}

fn draw_line(
    f: &mut Frame,
    area: Rect,
    block: Block<'static>,
    x_labels: &[String],
    points: &[(f64, f64)],
    y_label: &str,
    color: Color,
) {
    let x_bounds = [0.0, (x_labels.len().saturating_sub(1)).max(1) as f64];
    let y_max = points.iter().map(|p| p.1).fold(0.0, f64::max);
    let y_min = points.iter().map(|p| p.1).fold(0.0, f64::min);
    let y_bounds = span_bounds(y_min, y_max * 1.1);

    let datasets = vec![
        Dataset::default()
            .name(y_label.to_string())
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color))
            .data(points),
        Dataset::default()
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .data(points),
    ];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds(x_bounds)
                .labels(category_ticks(x_labels))
                .style(Style::default().fg(MUTED)),
        )
        .y_axis(
            Axis::default()
                .title(y_label.to_string())
                .bounds(y_bounds)
                .labels(tick_labels(y_bounds))
                .style(Style::default().fg(MUTED)),
        );
    f.render_widget(chart, area);
}

fn draw_dual(
    f: &mut Frame,
    area: Rect,
    title: &str,
    x_labels: &[String],
    left: &LinePanel,
    right: &LinePanel,
    style: &ChartStyle,
) {
    let outer = frame_block(title, Some("Month".to_string()));
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let panes = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    for (pane, panel, color) in [
        (panes[0], left, base_color(style.base_color)),
        (panes[1], right, MUTED),
    ] {
        let points: Vec<(f64, f64)> = panel
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v))
            .collect();
        let block = Block::default()
            .borders(Borders::TOP)
            .title(Span::styled(panel.label.clone(), Style::default().fg(color)));
        draw_line(f, pane, block, x_labels, &points, &panel.label, color);
    }
}

fn draw_pie(f: &mut Frame, area: Rect, title: &str, slices: &[(String, f64)], style: &ChartStyle) {
    let total: f64 = slices.iter().map(|s| s.1).sum();
    if total <= 0.0 {
        return draw_empty(f, area, title);
    }

    let block = frame_block(title, None);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(inner);

    let colors = gradient_colors(style.base_color, slices.len());

    // terminal cells are about twice as tall as wide
    let canvas_area = columns[0];
    let aspect = canvas_area.width.max(1) as f64 / (2.0 * canvas_area.height.max(1) as f64);
    let y_span = 1.1;
    let x_span = y_span * aspect;

    let mut wedges = Vec::with_capacity(slices.len());
    let mut angle = PIE_START_DEGREES.to_radians();
    for ((_, value), color) in slices.iter().zip(&colors) {
        let sweep = value / total * 2.0 * PI;
        wedges.push((angle, angle + sweep, *color));
        angle += sweep;
    }

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([-x_span, x_span])
        .y_bounds([-y_span, y_span])
        .paint(|ctx| {
            for &(from, to, color) in &wedges {
                let steps = ((to - from) / (PI / 180.0)).ceil().max(1.0) as usize;
                for step in 0..=steps {
                    let theta = from + (to - from) * step as f64 / steps as f64;
                    ctx.draw(&CanvasLine {
                        x1: 0.0,
                        y1: 0.0,
                        x2: theta.cos(),
                        y2: theta.sin(),
                        color,
                    });
                }
            }
        });
    f.render_widget(canvas, canvas_area);

    let legend: Vec<Line> = slices
        .iter()
        .zip(&colors)
        .map(|((label, value), color)| {
            Line::from(vec![
                Span::styled("■ ", Style::default().fg(*color)),
                Span::raw(format!("{label}: {:.1}%", value / total * 100.0)),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(legend), columns[1]);
}

fn draw_stack(
    f: &mut Frame,
    area: Rect,
    title: &str,
    labels: &[String],
    segments: &[(String, Vec<f64>)],
    style: &ChartStyle,
) {
    if labels.is_empty() {
        return draw_empty(f, area, title);
    }

    let colors = gradient_colors(style.base_color, segments.len());
    let legend: Vec<Span> = segments
        .iter()
        .zip(&colors)
        .flat_map(|((name, _), color)| {
            [
                Span::styled(" ■ ", Style::default().fg(*color)),
                Span::raw(name.clone()),
            ]
        })
        .collect();
    let range = format!("Version {} .. {}", labels[0], labels[labels.len() - 1]);

    let block = frame_block(title, Some(range)).title(
        Title::from(Line::from(legend))
            .position(Position::Top)
            .alignment(Alignment::Right),
    );

    let n = labels.len() as f64;
    // braille packs two dots per cell horizontally
    let dots_per_bar = (area.width.saturating_sub(2) as f64 * 2.0 / n).max(1.0);
    let fill = (dots_per_bar * 0.7).ceil().max(1.0) as usize;

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, n])
        .y_bounds([0.0, 100.0])
        .paint(|ctx| {
            for i in 0..labels.len() {
                let mut base = 0.0;
                for ((_, values), color) in segments.iter().zip(&colors) {
                    let share = values.get(i).copied().unwrap_or(0.0);
                    if share > 0.0 {
                        for k in 0..fill {
                            let x = i as f64 + 0.15 + 0.7 * k as f64 / fill as f64;
                            ctx.draw(&CanvasLine {
                                x1: x,
                                y1: base,
                                x2: x,
                                y2: base + share,
                                color: *color,
                            });
                        }
                    }
                    base += share;
                }
            }
        });
    f.render_widget(canvas, area);
}

fn draw_histogram(
    f: &mut Frame,
    area: Rect,
    title: &str,
    bins: &[HistogramBin],
    log_scale: bool,
    x_label: &str,
    style: &ChartStyle,
) {
    if bins.is_empty() {
        return draw_empty(f, area, title);
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let (bar_width, bar_gap) = if inner_width >= bins.len() * 2 {
        ((inner_width / bins.len()).saturating_sub(1).max(1) as u16, 1)
    } else {
        (1, 0)
    };

    let color = base_color(style.base_color);
    let bars: Vec<Bar> = bins
        .iter()
        .map(|bin| {
            // log bars keep empty bins at zero height
            let height = if log_scale {
                ((bin.count as f64 + 1.0).ln() * 100.0) as u64
            } else {
                bin.count
            };
            Bar::default()
                .value(height)
                .text_value(if bar_width >= 3 { bin.count.to_string() } else { String::new() })
                .style(Style::default().fg(color))
        })
        .collect();

    let scale = if log_scale { " (log scale)" } else { "" };
    let footer = format!(
        "{x_label} {} .. {}, {} bins{scale}",
        axis_value(bins[0].start),
        axis_value(bins[bins.len() - 1].end),
        bins.len()
    );
    let chart = BarChart::default()
        .block(frame_block(title, Some(footer)))
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(bar_gap);
    f.render_widget(chart, area);
}

fn draw_kde(
    f: &mut Frame,
    area: Rect,
    title: &str,
    curve: &[(f64, f64)],
    summary: Option<&Summary>,
    x_label: &str,
    style: &ChartStyle,
) {
    if curve.is_empty() {
        return draw_empty(f, area, title);
    }

    let x_bounds = span_bounds(curve[0].0, curve[curve.len() - 1].0);
    let peak = curve.iter().map(|p| p.1).fold(0.0, f64::max);
    let y_bounds = span_bounds(0.0, peak * 1.1);

    let median_marker: Vec<(f64, f64)> = summary
        .map(|s| vec![(s.median, 0.0), (s.median, peak)])
        .unwrap_or_default();

    let mut datasets = vec![Dataset::default()
        .name("Density")
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(base_color(style.base_color)))
        .data(curve)];
    if !median_marker.is_empty() {
        datasets.push(
            Dataset::default()
                .name("Median")
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(MUTED))
                .data(&median_marker),
        );
    }

    let chart = Chart::new(datasets)
        .block(frame_block(title, None))
        .x_axis(
            Axis::default()
                .title(x_label.to_string())
                .bounds(x_bounds)
                .labels(tick_labels(x_bounds))
                .style(Style::default().fg(MUTED)),
        )
        .y_axis(
            Axis::default()
                .title("Density")
                .bounds(y_bounds)
                .labels(tick_labels(y_bounds))
                .style(Style::default().fg(MUTED)),
        );
    f.render_widget(chart, area);
}

fn draw_boxplot(
    f: &mut Frame,
    area: Rect,
    title: &str,
    summary: &Summary,
    y_label: &str,
    style: &ChartStyle,
) {
    let [lo, hi] = span_bounds(summary.min, summary.max);
    let pad = (hi - lo) * 0.05;
    let color = base_color(style.base_color);

    let footer = format!(
        "{y_label}: Q1 {} / median {} / Q3 {}",
        axis_value(summary.q1),
        axis_value(summary.median),
        axis_value(summary.q3)
    );
    let outliers: Vec<(f64, f64)> = summary.outliers.iter().map(|v| (0.5, *v)).collect();

    let canvas = Canvas::default()
        .block(frame_block(title, Some(footer)))
        .marker(Marker::Braille)
        .x_bounds([0.0, 1.0])
        .y_bounds([lo - pad, hi + pad])
        .paint(|ctx| {
            ctx.draw(&Rectangle {
                x: 0.3,
                y: summary.q1,
                width: 0.4,
                height: summary.q3 - summary.q1,
                color,
            });
            let hline = |y: f64, from: f64, to: f64, color: Color| CanvasLine {
                x1: from,
                y1: y,
                x2: to,
                y2: y,
                color,
            };
            ctx.draw(&hline(summary.median, 0.3, 0.7, Color::White));
            ctx.draw(&hline(summary.whisker_low, 0.4, 0.6, color));
            ctx.draw(&hline(summary.whisker_high, 0.4, 0.6, color));
            ctx.draw(&CanvasLine { x1: 0.5, y1: summary.whisker_low, x2: 0.5, y2: summary.q1, color });
            ctx.draw(&CanvasLine { x1: 0.5, y1: summary.q3, x2: 0.5, y2: summary.whisker_high, color });
            ctx.draw(&Points { coords: &outliers, color: MUTED });
            ctx.print(0.0, hi, Line::from(axis_value(hi)));
            ctx.print(0.0, lo, Line::from(axis_value(lo)));
        });
    f.render_widget(canvas, area);
}
