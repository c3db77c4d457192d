use std::{fs, path::Path};

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    chart::{assembler::Comparison, palette::Palette},
    data::{
        domain::SmoothingWindow,
        filter::FilterSelection,
        schema::{BrokerColumns, RegulatoryColumns},
        table::{BrokerTable, RegulatoryTable},
    },
    error::{CotlensResult, IoError},
};

/// Everything about a comparison that does not change between requests.
///
/// Every field falls back to its default, so `{}` is a valid configuration
/// reproducing the stock column names and color table.
///
/// ```json
/// {
///   "broker": { "entity": "broker_name" },
///   "regulatory": { "category": "Category" },
///   "palette": { "Alpha": "purple" },
///   "default_window": 30
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub broker: BrokerColumns,
    pub regulatory: RegulatoryColumns,
    pub palette: Palette,
    pub default_window: SmoothingWindow,
}

impl DashboardConfig {
    pub fn from_json_str(json: &str) -> CotlensResult<Self> {
        Ok(serde_json::from_str(json).map_err(IoError::Json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> CotlensResult<Self> {
        let path = path.as_ref();
        let body = fs::read_to_string(path).map_err(|e| {
            IoError::ReadFailed(format!("Failed to read config '{}': {e}", path.display()))
        })?;
        debug!(path = %path.display(), "Loading dashboard config");
        Self::from_json_str(&body)
    }

    pub fn with_palette(self, palette: Palette) -> Self {
        Self { palette, ..self }
    }

    pub fn with_default_window(self, default_window: SmoothingWindow) -> Self {
        Self {
            default_window,
            ..self
        }
    }

    /// A selection over `years` that starts at the configured default window.
    pub fn selection(&self, years: impl IntoIterator<Item = i32>) -> FilterSelection {
        FilterSelection::new(years).with_window(self.default_window)
    }

    pub fn broker_table(&self, df: DataFrame) -> CotlensResult<BrokerTable> {
        BrokerTable::new(df, self.broker.clone())
    }

    pub fn regulatory_table(&self, df: DataFrame) -> CotlensResult<RegulatoryTable> {
        RegulatoryTable::new(df, self.regulatory.clone())
    }

    pub fn comparison<'a>(
        &'a self,
        broker: &'a BrokerTable,
        regulatory: &'a RegulatoryTable,
    ) -> Comparison<'a> {
        Comparison::new(broker, regulatory, &self.palette)
    }
}
