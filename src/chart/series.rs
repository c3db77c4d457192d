use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::data::domain::SourceKind;

/// One observation of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub date: NaiveDate,
    /// `None` marks a missing or unparseable value; the renderer leaves a gap.
    pub value: Option<f64>,
}

/// Line color handed to the renderer.
///
/// # Default policy
/// `Auto` means no color was configured for the series and the renderer picks
/// one from its own cycle. `Named` carries a CSS color name or hex code.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineColor {
    Named(String),
    #[default]
    Auto,
}

impl LineColor {
    pub fn as_named(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Auto => None,
        }
    }
}

/// Stroke style; regulatory series are dashed to tell the sources apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    Solid,
    Dash,
}

impl From<SourceKind> for LineStyle {
    fn from(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Broker => Self::Solid,
            SourceKind::Regulatory => Self::Dash,
        }
    }
}

/// A labeled, date-ordered series ready for drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    pub source: SourceKind,
    pub color: LineColor,
    pub line: LineStyle,
    pub points: Vec<Point>,
}

impl Series {
    pub fn new(label: String, source: SourceKind, color: LineColor, points: Vec<Point>) -> Self {
        Self {
            label,
            source,
            color,
            line: source.into(),
            points,
        }
    }

    pub fn is_dashed(&self) -> bool {
        self.line == LineStyle::Dash
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn values(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.points.iter().map(|p| p.value)
    }
}
