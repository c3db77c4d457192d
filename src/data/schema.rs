//! Typed column lookup for both source schemas.
//!
//! The broker schema maps every [`Metric`] to one column regardless of the
//! entity. The regulatory schema carries one parallel column set per
//! [`Category`], so resolution needs the category as an extra key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    data::domain::{Category, Metric},
    error::{CotlensResult, DataError},
};

// ================================================================================================
// Canonical Column Names
// ================================================================================================

/// Canonical broker column names.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum BrokerCol {
    Date,
    EntityName,
    TotalLong,
    TotalLongChangeRate,
    TotalShort,
    TotalShortChangeRate,
    Net,
    NetChangeRate,
}

impl BrokerCol {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl From<Metric> for BrokerCol {
    fn from(metric: Metric) -> Self {
        match metric {
            Metric::TotalLong => Self::TotalLong,
            Metric::TotalLongChangeRate => Self::TotalLongChangeRate,
            Metric::TotalShort => Self::TotalShort,
            Metric::TotalShortChangeRate => Self::TotalShortChangeRate,
            Metric::Net => Self::Net,
            Metric::NetChangeRate => Self::NetChangeRate,
        }
    }
}

/// Column names of the CFTC disaggregated / legacy report export.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
pub enum CftcCol {
    #[strum(serialize = "ReportDateAsYyyyMmDd")]
    ReportDate,

    // === Managed Money ===
    #[strum(serialize = "MMoneyPositionsLongAll")]
    MMoneyLong,
    #[strum(serialize = "MMoneyPositionsShortAll")]
    MMoneyShort,
    #[strum(serialize = "MMNetPosition")]
    MMoneyNet,
    #[strum(serialize = "MMPL%")]
    MMoneyLongPct,
    #[strum(serialize = "MMPS%")]
    MMoneyShortPct,
    #[strum(serialize = "MMNet%")]
    MMoneyNetPct,

    // === Noncommercial ===
    #[strum(serialize = "NonCommPositionsLongAll")]
    NonCommLong,
    #[strum(serialize = "NonCommPositionsShortAll")]
    NonCommShort,
    #[strum(serialize = "NonCommNetPosition")]
    NonCommNet,
    #[strum(serialize = "NonCommPL%")]
    NonCommLongPct,
    #[strum(serialize = "NonCommPS%")]
    NonCommShortPct,
    #[strum(serialize = "NonCommNet%")]
    NonCommNetPct,
}

// ================================================================================================
// Broker Schema
// ================================================================================================

/// Column names of the broker table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerColumns {
    pub date: String,
    pub entity: String,
    pub total_long: String,
    pub total_long_change_rate: String,
    pub total_short: String,
    pub total_short_change_rate: String,
    pub net: String,
    pub net_change_rate: String,
}

impl Default for BrokerColumns {
    fn default() -> Self {
        Self {
            date: BrokerCol::Date.to_string(),
            entity: BrokerCol::EntityName.to_string(),
            total_long: BrokerCol::TotalLong.to_string(),
            total_long_change_rate: BrokerCol::TotalLongChangeRate.to_string(),
            total_short: BrokerCol::TotalShort.to_string(),
            total_short_change_rate: BrokerCol::TotalShortChangeRate.to_string(),
            net: BrokerCol::Net.to_string(),
            net_change_rate: BrokerCol::NetChangeRate.to_string(),
        }
    }
}

impl BrokerColumns {
    /// Column backing `metric`. Independent of the entity.
    pub fn column(&self, metric: Metric) -> &str {
        match metric {
            Metric::TotalLong => &self.total_long,
            Metric::TotalLongChangeRate => &self.total_long_change_rate,
            Metric::TotalShort => &self.total_short,
            Metric::TotalShortChangeRate => &self.total_short_change_rate,
            Metric::Net => &self.net,
            Metric::NetChangeRate => &self.net_change_rate,
        }
    }
}

// ================================================================================================
// Regulatory Schema
// ================================================================================================

/// The six value columns of one regulatory category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryColumns {
    pub long: String,
    pub short: String,
    pub net: String,
    pub long_pct: String,
    pub short_pct: String,
    pub net_pct: String,
}

impl CategoryColumns {
    fn from_cftc(cols: [CftcCol; 6]) -> Self {
        let [long, short, net, long_pct, short_pct, net_pct] = cols.map(|c| c.to_string());
        Self {
            long,
            short,
            net,
            long_pct,
            short_pct,
            net_pct,
        }
    }

    /// Change-rate metrics map onto the percentage columns.
    pub fn column(&self, metric: Metric) -> &str {
        match metric {
            Metric::TotalLong => &self.long,
            Metric::TotalLongChangeRate => &self.long_pct,
            Metric::TotalShort => &self.short,
            Metric::TotalShortChangeRate => &self.short_pct,
            Metric::Net => &self.net,
            Metric::NetChangeRate => &self.net_pct,
        }
    }

    pub fn managed_money() -> Self {
        Self::from_cftc([
            CftcCol::MMoneyLong,
            CftcCol::MMoneyShort,
            CftcCol::MMoneyNet,
            CftcCol::MMoneyLongPct,
            CftcCol::MMoneyShortPct,
            CftcCol::MMoneyNetPct,
        ])
    }

    pub fn noncommercial() -> Self {
        Self::from_cftc([
            CftcCol::NonCommLong,
            CftcCol::NonCommShort,
            CftcCol::NonCommNet,
            CftcCol::NonCommLongPct,
            CftcCol::NonCommShortPct,
            CftcCol::NonCommNetPct,
        ])
    }
}

/// Column names of the regulatory table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegulatoryColumns {
    pub date: String,

    /// Optional category key column.
    ///
    /// - `None`: the table is wide (one row per date) and categories are told
    ///   apart by column names only.
    /// - `Some(col)`: rows are additionally restricted to `col == category`.
    pub category: Option<String>,

    pub categories: BTreeMap<Category, CategoryColumns>,
}

impl Default for RegulatoryColumns {
    fn default() -> Self {
        Self {
            date: CftcCol::ReportDate.to_string(),
            category: None,
            categories: BTreeMap::from([
                (Category::ManagedMoney, CategoryColumns::managed_money()),
                (Category::Noncommercial, CategoryColumns::noncommercial()),
            ]),
        }
    }
}

impl RegulatoryColumns {
    /// Resolves `metric` for the category named `category`.
    ///
    /// # Errors
    /// - [`DataError::UnknownCategory`] if the name is not a known category.
    /// - [`DataError::UnmappedCategory`] if the category has no column set.
    pub fn column(&self, category: &str, metric: Metric) -> CotlensResult<&str> {
        let category = category
            .parse::<Category>()
            .map_err(|_| DataError::UnknownCategory(category.to_string()))?;

        self.categories
            .get(&category)
            .map(|cols| cols.column(metric))
            .ok_or_else(|| DataError::UnmappedCategory(category.to_string()).into())
    }
}
