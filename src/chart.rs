pub mod assembler;
pub mod io;
pub mod palette;
pub mod series;

use serde::{Deserialize, Serialize};

use crate::{chart::series::Series, data::domain::Metric};

/// All series drawn for one logical metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub metric: Metric,
    pub title: String,
    /// Broker series first, then regulatory, each in selection order.
    /// Empty means nothing was selected for this metric.
    pub series: Vec<Series>,
}

impl Chart {
    pub fn new(metric: Metric, series: Vec<Series>) -> Self {
        Self {
            metric,
            title: metric.definition().title.to_string(),
            series,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// The six charts of one request, in [`Metric`] declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    charts: Vec<Chart>,
}

impl Dashboard {
    pub(crate) fn new(charts: Vec<Chart>) -> Self {
        Self { charts }
    }

    pub fn charts(&self) -> &[Chart] {
        &self.charts
    }

    pub fn chart(&self, metric: Metric) -> Option<&Chart> {
        self.charts.iter().find(|c| c.metric == metric)
    }
}
