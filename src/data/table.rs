use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate};
use itertools::Itertools;
use polars::prelude::{Column, DataFrame, DataType, Expr, IntoLazy, StrptimeOptions, col, lit};
use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use crate::{
    data::{
        domain::{Category, Metric, SourceKind},
        schema::{BrokerColumns, RegulatoryColumns},
    },
    error::{CotlensResult, DataError, polars_err},
};

/// Date format tried on string date columns. Trailing time components are ignored.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ================================================================================================
// Traits
// ================================================================================================

/// Common read-only view over a loaded source table.
///
/// Implementors are immutable after construction; every method takes `&self`
/// so one table can serve any number of requests at once.
pub trait PositionSource {
    fn kind(&self) -> SourceKind;

    fn as_df(&self) -> &DataFrame;

    fn date_column(&self) -> &str;

    /// Resolves the column backing `metric` for the entity or category `key`
    /// and checks that the table actually carries it.
    fn resolve(&self, metric: Metric, key: &str) -> CotlensResult<&str>;

    /// Row predicate selecting `key`, or `None` if every row belongs to it.
    fn key_predicate(&self, key: &str) -> Option<Expr>;

    /// Legend label of the series drawn for `key`.
    fn label(&self, key: &str) -> String;

    /// Name looked up in the color palette for `key`.
    fn palette_key(&self, key: &str) -> String;
}

// ================================================================================================
// Broker Table
// ================================================================================================

/// Broker positions, one row per (date, entity).
///
/// Short positions are stored as magnitudes; the net column keeps the value
/// computed upstream from the signed short figure.
#[derive(Debug, Clone)]
pub struct BrokerTable {
    df: DataFrame,
    columns: BrokerColumns,
}

impl BrokerTable {
    /// Validates, coerces and sign-normalizes a raw broker table.
    ///
    /// # Errors
    /// - [`DataError::MissingColumn`] if the date or entity column is absent.
    /// - [`DataError::InvalidDateColumn`] if the date column is not date-like.
    #[tracing::instrument(skip_all, fields(rows = df.height()))]
    pub fn new(df: DataFrame, columns: BrokerColumns) -> CotlensResult<Self> {
        let kind = SourceKind::Broker;
        require_column(&df, &columns.date, kind)?;
        require_column(&df, &columns.entity, kind)?;

        let value_cols = Metric::iter()
            .map(|m| columns.column(m))
            .filter(|c| has_column(&df, c))
            .unique()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let df = coerce_dates(df, &columns.date, kind)?;
        let df = coerce_numeric(df, &value_cols, kind)?;
        let df = normalize_short_positions(df, &columns.total_short)?;

        info!(
            rows = df.height(),
            value_columns = value_cols.len(),
            "Loaded broker table"
        );
        Ok(Self { df, columns })
    }

    pub fn columns(&self) -> &BrokerColumns {
        &self.columns
    }

    /// Sorted calendar years present in the table.
    pub fn available_years(&self) -> CotlensResult<Vec<i32>> {
        years_of(&self.df, &self.columns.date)
    }

    /// Entity names in order of first appearance.
    pub fn available_entities(&self) -> CotlensResult<Vec<String>> {
        let names = self
            .df
            .column(&self.columns.entity)
            .and_then(|c| c.str())
            .map_err(|e| polars_err("Failed to read entity column", e))?;

        Ok(names
            .into_iter()
            .flatten()
            .unique()
            .map(str::to_string)
            .collect())
    }
}

impl PositionSource for BrokerTable {
    fn kind(&self) -> SourceKind {
        SourceKind::Broker
    }

    fn as_df(&self) -> &DataFrame {
        &self.df
    }

    fn date_column(&self) -> &str {
        &self.columns.date
    }

    fn resolve(&self, metric: Metric, _key: &str) -> CotlensResult<&str> {
        let column = self.columns.column(metric);
        ensure_column(&self.df, column, metric, self.kind())?;
        Ok(column)
    }

    fn key_predicate(&self, key: &str) -> Option<Expr> {
        Some(col(self.columns.entity.as_str()).eq(lit(key)))
    }

    fn label(&self, key: &str) -> String {
        key.to_string()
    }

    fn palette_key(&self, key: &str) -> String {
        key.to_string()
    }
}

// ================================================================================================
// Regulatory Table
// ================================================================================================

/// Regulatory aggregates with one parallel column set per [`Category`].
#[derive(Debug, Clone)]
pub struct RegulatoryTable {
    df: DataFrame,
    columns: RegulatoryColumns,
}

impl RegulatoryTable {
    /// Validates and coerces a raw regulatory table.
    ///
    /// # Errors
    /// - [`DataError::MissingColumn`] if the date column, or a configured
    ///   category key column, is absent.
    /// - [`DataError::InvalidDateColumn`] if the date column is not date-like.
    #[tracing::instrument(skip_all, fields(rows = df.height()))]
    pub fn new(df: DataFrame, columns: RegulatoryColumns) -> CotlensResult<Self> {
        let kind = SourceKind::Regulatory;
        require_column(&df, &columns.date, kind)?;
        if let Some(category_col) = &columns.category {
            require_column(&df, category_col, kind)?;
        }

        let mut value_cols = Vec::new();
        for (category, cols) in &columns.categories {
            for metric in Metric::iter() {
                let name = cols.column(metric);
                if has_column(&df, name) {
                    value_cols.push(name.to_string());
                } else {
                    debug!(%category, %metric, column = name, "Mapped column not in table");
                }
            }
        }
        let value_cols = value_cols.into_iter().unique().collect::<Vec<_>>();

        let df = coerce_dates(df, &columns.date, kind)?;
        let df = coerce_numeric(df, &value_cols, kind)?;

        info!(
            rows = df.height(),
            value_columns = value_cols.len(),
            "Loaded regulatory table"
        );
        Ok(Self { df, columns })
    }

    pub fn columns(&self) -> &RegulatoryColumns {
        &self.columns
    }

    /// Sorted calendar years present in the table.
    pub fn available_years(&self) -> CotlensResult<Vec<i32>> {
        years_of(&self.df, &self.columns.date)
    }

    /// Categories that are mapped and backed by at least one column.
    pub fn available_categories(&self) -> Vec<Category> {
        self.columns
            .categories
            .iter()
            .filter(|(_, cols)| Metric::iter().any(|m| has_column(&self.df, cols.column(m))))
            .map(|(category, _)| *category)
            .collect()
    }
}

impl PositionSource for RegulatoryTable {
    fn kind(&self) -> SourceKind {
        SourceKind::Regulatory
    }

    fn as_df(&self) -> &DataFrame {
        &self.df
    }

    fn date_column(&self) -> &str {
        &self.columns.date
    }

    fn resolve(&self, metric: Metric, key: &str) -> CotlensResult<&str> {
        let column = self.columns.column(key, metric)?;
        ensure_column(&self.df, column, metric, self.kind())?;
        Ok(column)
    }

    fn key_predicate(&self, key: &str) -> Option<Expr> {
        let category_col = self.columns.category.as_deref()?;
        let value = key
            .parse::<Category>()
            .map(|c| c.as_str())
            .unwrap_or(key);
        Some(col(category_col).eq(lit(value)))
    }

    fn label(&self, key: &str) -> String {
        format!("CFTC {}", self.palette_key(key))
    }

    fn palette_key(&self, key: &str) -> String {
        key.parse::<Category>()
            .map(|c| c.to_string())
            .unwrap_or_else(|_| key.to_string())
    }
}

// ================================================================================================
// Sign Normalization
// ================================================================================================

/// Rewrites the short-position column to its absolute value.
///
/// Only `short_col` is touched; the net column keeps whatever was loaded.
/// A table without `short_col` is returned unchanged. Applying this twice
/// yields the same table as applying it once.
pub fn normalize_short_positions(df: DataFrame, short_col: &str) -> CotlensResult<DataFrame> {
    if !has_column(&df, short_col) {
        debug!(column = short_col, "No short column; skipping sign normalization");
        return Ok(df);
    }

    df.lazy()
        .with_column(col(short_col).abs())
        .collect()
        .map_err(|e| polars_err("Failed to normalize short positions", e))
}

// ================================================================================================
// Helper Functions
// ================================================================================================

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

fn require_column(df: &DataFrame, name: &str, kind: SourceKind) -> CotlensResult<()> {
    if has_column(df, name) {
        Ok(())
    } else {
        Err(DataError::MissingColumn {
            column: name.to_string(),
            source_kind: kind.to_string(),
        }
        .into())
    }
}

fn ensure_column(df: &DataFrame, name: &str, metric: Metric, kind: SourceKind) -> CotlensResult<()> {
    if has_column(df, name) {
        Ok(())
    } else {
        Err(DataError::ColumnNotFound {
            column: name.to_string(),
            metric: metric.to_string(),
            source_kind: kind.to_string(),
        }
        .into())
    }
}

fn null_count(df: &DataFrame, name: &str) -> usize {
    df.column(name).map(Column::null_count).unwrap_or(0)
}

/// Casts the date column to `Date`. Unparseable values become null.
fn coerce_dates(df: DataFrame, date_col: &str, kind: SourceKind) -> CotlensResult<DataFrame> {
    let dtype = df
        .column(date_col)
        .map(|c| c.dtype().clone())
        .map_err(|e| polars_err("Failed to read date column", e))?;

    let expr = match dtype {
        DataType::Date => return Ok(df),
        DataType::Datetime(_, _) => col(date_col).cast(DataType::Date),
        DataType::String => col(date_col).str().to_date(StrptimeOptions {
            format: Some(DATE_FORMAT.into()),
            strict: false,
            exact: false,
            ..Default::default()
        }),
        other => {
            return Err(DataError::InvalidDateColumn {
                column: date_col.to_string(),
                source_kind: kind.to_string(),
                dtype: other.to_string(),
            }
            .into());
        }
    };

    let before = null_count(&df, date_col);
    let out = df
        .lazy()
        .with_column(expr)
        .collect()
        .map_err(|e| polars_err("Failed to parse date column", e))?;

    let invalid = null_count(&out, date_col).saturating_sub(before);
    if invalid > 0 {
        warn!(
            source = %kind,
            column = date_col,
            invalid,
            "Unparseable dates treated as missing"
        );
    }
    Ok(out)
}

/// Casts value columns to `Float64`. Non-numeric values become null.
fn coerce_numeric(df: DataFrame, value_cols: &[String], kind: SourceKind) -> CotlensResult<DataFrame> {
    if value_cols.is_empty() {
        return Ok(df);
    }

    let before = value_cols
        .iter()
        .map(|c| null_count(&df, c))
        .collect::<Vec<_>>();

    let out = df
        .lazy()
        .with_columns(
            value_cols
                .iter()
                .map(|c| col(c.as_str()).cast(DataType::Float64))
                .collect::<Vec<_>>(),
        )
        .collect()
        .map_err(|e| polars_err("Failed to cast value columns", e))?;

    for (name, before) in value_cols.iter().zip(before) {
        let invalid = null_count(&out, name).saturating_sub(before);
        if invalid > 0 {
            warn!(
                source = %kind,
                column = name.as_str(),
                invalid,
                "Non-numeric values treated as missing"
            );
        }
    }
    Ok(out)
}

/// Reads a `Date` column into calendar dates.
pub(crate) fn dates(column: &Column) -> CotlensResult<Vec<Option<NaiveDate>>> {
    let ca = column
        .date()
        .map_err(|e| polars_err("Expected a date column", e))?;

    Ok(ca
        .physical()
        .into_iter()
        .map(|days| days.and_then(date_from_epoch_days))
        .collect())
}

fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    DateTime::from_timestamp(i64::from(days) * 86_400, 0).map(|dt| dt.date_naive())
}

fn years_of(df: &DataFrame, date_col: &str) -> CotlensResult<Vec<i32>> {
    let column = df
        .column(date_col)
        .map_err(|e| polars_err("Failed to read date column", e))?;

    let years = dates(column)?
        .into_iter()
        .flatten()
        .map(|d| d.year())
        .collect::<BTreeSet<_>>();
    Ok(years.into_iter().collect())
}
