use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

use crate::error::SelectionError;

// ================================================================================================
// Sources
// ================================================================================================

/// The two position datasets being compared.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Broker-level positions, one row per (date, entity).
    Broker,
    /// Regulatory (CFTC-style) aggregates, one row per report date.
    Regulatory,
}

/// A regulatory trader classification.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Category {
    #[strum(serialize = "Managed Money")]
    #[serde(rename = "Managed Money")]
    ManagedMoney,

    #[strum(serialize = "Noncommercial")]
    #[serde(rename = "Noncommercial")]
    Noncommercial,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

// ================================================================================================
// Metrics
// ================================================================================================

/// The six logical metrics, one chart each.
///
/// The declaration order is the chart order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TotalLong,
    TotalLongChangeRate,
    TotalShort,
    TotalShortChangeRate,
    Net,
    NetChangeRate,
}

/// Static description of a [`Metric`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDefinition {
    pub metric: Metric,
    pub title: &'static str,
    /// Week-over-week change metrics are eligible for smoothing.
    pub is_rate: bool,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn is_rate(&self) -> bool {
        matches!(
            self,
            Self::TotalLongChangeRate | Self::TotalShortChangeRate | Self::NetChangeRate
        )
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::TotalLong => "Total Long Position",
            Self::TotalLongChangeRate => "Total Long Position Change Rate",
            Self::TotalShort => "Total Short Position",
            Self::TotalShortChangeRate => "Total Short Position Change Rate",
            Self::Net => "Net Position",
            Self::NetChangeRate => "Net Position Change Rate",
        }
    }

    pub fn definition(&self) -> MetricDefinition {
        MetricDefinition {
            metric: *self,
            title: self.title(),
            is_rate: self.is_rate(),
        }
    }
}

// ================================================================================================
// Smoothing Window
// ================================================================================================

/// Length of the trailing moving average applied to change-rate metrics.
///
/// Serialized as the plain number of points (`1`, `7` or `30`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
)]
#[serde(try_from = "u16", into = "u16")]
pub enum SmoothingWindow {
    #[strum(serialize = "1")]
    One,
    #[default]
    #[strum(serialize = "7")]
    Seven,
    #[strum(serialize = "30")]
    Thirty,
}

impl SmoothingWindow {
    pub fn size(&self) -> usize {
        match self {
            Self::One => 1,
            Self::Seven => 7,
            Self::Thirty => 30,
        }
    }

    /// A window of one point leaves the series untouched.
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::One)
    }
}

impl TryFrom<u16> for SmoothingWindow {
    type Error = SelectionError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            7 => Ok(Self::Seven),
            30 => Ok(Self::Thirty),
            other => Err(SelectionError::InvalidWindow(other)),
        }
    }
}

impl From<SmoothingWindow> for u16 {
    fn from(window: SmoothingWindow) -> Self {
        window.size() as u16
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_metric_order_and_rate_flags() {
        let metrics = Metric::iter().collect::<Vec<_>>();
        assert_eq!(metrics.len(), Metric::COUNT);
        assert_eq!(
            metrics,
            vec![
                Metric::TotalLong,
                Metric::TotalLongChangeRate,
                Metric::TotalShort,
                Metric::TotalShortChangeRate,
                Metric::Net,
                Metric::NetChangeRate,
            ]
        );

        let rates = metrics
            .iter()
            .filter(|m| m.definition().is_rate)
            .copied()
            .collect::<Vec<_>>();
        assert_eq!(
            rates,
            vec![
                Metric::TotalLongChangeRate,
                Metric::TotalShortChangeRate,
                Metric::NetChangeRate
            ]
        );
    }

    #[test]
    fn test_metric_names() {
        assert_eq!(Metric::NetChangeRate.as_str(), "net_change_rate");
        assert_eq!(
            Metric::from_str("total_short").unwrap(),
            Metric::TotalShort
        );
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(
            Category::from_str("Managed Money").unwrap(),
            Category::ManagedMoney
        );
        assert_eq!(
            Category::from_str("noncommercial").unwrap(),
            Category::Noncommercial
        );
        assert!(Category::from_str("Swap Dealers").is_err());
        assert_eq!(Category::ManagedMoney.to_string(), "Managed Money");
    }

    #[test]
    fn test_smoothing_window_conversion() {
        assert_eq!(SmoothingWindow::try_from(1).unwrap(), SmoothingWindow::One);
        assert_eq!(SmoothingWindow::try_from(7).unwrap(), SmoothingWindow::Seven);
        assert_eq!(
            SmoothingWindow::try_from(30).unwrap(),
            SmoothingWindow::Thirty
        );
        assert_eq!(
            SmoothingWindow::try_from(5),
            Err(SelectionError::InvalidWindow(5))
        );
        assert_eq!(SmoothingWindow::default(), SmoothingWindow::Seven);
        assert!(SmoothingWindow::One.is_identity());
    }

    #[test]
    fn test_smoothing_window_serde() {
        let json = serde_json::to_string(&SmoothingWindow::Thirty).unwrap();
        assert_eq!(json, "30");

        let parsed: SmoothingWindow = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, SmoothingWindow::Seven);

        assert!(serde_json::from_str::<SmoothingWindow>("14").is_err());
    }
}
