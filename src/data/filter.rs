use std::collections::BTreeSet;

use itertools::Itertools;
use polars::prelude::{DataFrame, Expr, IntoLazy, SortMultipleOptions, col, lit};
use serde::{Deserialize, Serialize};

use crate::{
    data::{
        domain::{Category, SmoothingWindow},
        table::PositionSource,
    },
    error::{CotlensResult, SelectionError, polars_err},
};

/// One user interaction's worth of filter values.
///
/// # Semantics
/// - `years` is required; an empty set is rejected with [`SelectionError::NoYears`].
/// - `entities` and `categories` are opt-in: leaving one empty hides that
///   source entirely rather than showing everything.
/// - Entity and category order is kept and determines series order.
///
/// # Example
/// ```
/// # use cotlens::prelude::*;
/// let selection = FilterSelection::new([2023, 2024])
///     .with_entities(["Alpha"])
///     .with_categories(["Managed Money"])
///     .with_window(SmoothingWindow::Thirty);
/// assert!(selection.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    years: BTreeSet<i32>,
    entities: Vec<String>,
    categories: Vec<String>,
    window: SmoothingWindow,
}

impl FilterSelection {
    pub fn new(years: impl IntoIterator<Item = i32>) -> Self {
        Self {
            years: years.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Broker entities to draw. Duplicates are dropped, first occurrence wins.
    pub fn with_entities<I, S>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entities = entities.into_iter().map(Into::into).unique().collect();
        self
    }

    /// Regulatory categories to draw. Duplicates are dropped, first occurrence wins.
    ///
    /// Known categories compare by [`Category`], so `"managed money"` and
    /// `"Managed Money"` are the same entry. Unknown names compare verbatim.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories
            .into_iter()
            .map(Into::into)
            .unique_by(|name: &String| {
                name.parse::<Category>()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|_| name.clone())
            })
            .collect();
        self
    }

    pub fn with_window(mut self, window: SmoothingWindow) -> Self {
        self.window = window;
        self
    }

    pub fn years(&self) -> &BTreeSet<i32> {
        &self.years
    }

    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn window(&self) -> SmoothingWindow {
        self.window
    }

    /// True if neither source has anything selected.
    pub fn is_blank(&self) -> bool {
        self.entities.is_empty() && self.categories.is_empty()
    }

    pub fn validate(&self) -> Result<(), SelectionError> {
        if self.years.is_empty() {
            return Err(SelectionError::NoYears);
        }
        Ok(())
    }
}

/// Restricts `source` to rows dated in `years` and belonging to one of `keys`.
///
/// Returns a new frame sorted by ascending date; the source table is never
/// modified. Rows without a valid date belong to no year and are excluded.
/// An empty `keys` yields an empty frame.
///
/// # Errors
/// [`SelectionError::NoYears`] if `years` is empty.
pub fn filter<S: PositionSource>(
    source: &S,
    years: &BTreeSet<i32>,
    keys: &[String],
) -> CotlensResult<DataFrame> {
    let date_col = source.date_column();
    let in_years = year_predicate(date_col, years).ok_or(SelectionError::NoYears)?;

    let mut lf = source.as_df().clone().lazy().filter(in_years);

    if keys.is_empty() {
        lf = lf.filter(lit(false));
    } else if let Some(in_keys) = keys
        .iter()
        .filter_map(|k| source.key_predicate(k))
        .reduce(|a, b| a.or(b))
    {
        lf = lf.filter(in_keys);
    }

    lf.sort(
        [date_col],
        SortMultipleOptions::default().with_maintain_order(true),
    )
    .collect()
    .map_err(|e| polars_err(&format!("Failed to filter {} table", source.kind()), e))
}

/// `year(date) ∈ years`, or `None` for an empty set.
fn year_predicate(date_col: &str, years: &BTreeSet<i32>) -> Option<Expr> {
    years
        .iter()
        .map(|y| col(date_col).dt().year().eq(lit(*y)))
        .reduce(|a, b| a.or(b))
}
