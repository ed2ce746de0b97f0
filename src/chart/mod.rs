//! Chart descriptions and the sinks that display them.
//!
//! Builders in [`figures`] turn aggregated series into [`Figure`]s; a
//! [`ChartSink`] decides where they end up (an interactive terminal or a
//! plain-text writer).

mod color;
mod draw;
pub mod figures;
mod terminal;
mod text;

pub use color::{gradient_colors, parse_hex_color};
pub use draw::draw_figure;
pub use terminal::TerminalSink;
pub use text::TextSink;

use crate::distribution::{HistogramBin, Summary};
use crate::error::Result;

/// Nominal figure size in inches; sinks scale it to cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureSize {
    pub width: f32,
    pub height: f32,
}

impl FigureSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitScale {
    Units,
    Millions,
}

impl UnitScale {
    pub fn format(&self, value: u64) -> String {
        match self {
            UnitScale::Units => value.to_string(),
            UnitScale::Millions => format!("{:.1}M", value as f64 / 1_000_000.0),
        }
    }
}

/// One pane of a [`FigureKind::DualLine`].
#[derive(Debug, Clone, PartialEq)]
pub struct LinePanel {
    pub label: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FigureKind {
    Bar {
        labels: Vec<String>,
        values: Vec<u64>,
        unit_scale: UnitScale,
        y_label: String,
    },
    /// `points` use the position in `x_labels` as their x coordinate.
    Line {
        x_labels: Vec<String>,
        points: Vec<(f64, f64)>,
        x_label: String,
        y_label: String,
    },
    DualLine {
        x_labels: Vec<String>,
        left: LinePanel,
        right: LinePanel,
    },
    Pie {
        slices: Vec<(String, f64)>,
    },
    /// Each segment holds one value per label, in percent.
    StackedBar {
        labels: Vec<String>,
        segments: Vec<(String, Vec<f64>)>,
    },
    Histogram {
        bins: Vec<HistogramBin>,
        log_scale: bool,
        x_label: String,
    },
    Kde {
        curve: Vec<(f64, f64)>,
        summary: Option<Summary>,
        x_label: String,
    },
    Boxplot {
        summary: Summary,
        y_label: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub size: FigureSize,
    pub kind: FigureKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartStyle {
    pub base_color: (u8, u8, u8),
}

impl ChartStyle {
    pub fn from_hex(hex: &str) -> Result<Self> {
        Ok(Self { base_color: parse_hex_color(hex)? })
    }
}

pub trait ChartSink {
    fn show(&mut self, figure: &Figure) -> Result<()>;
}
