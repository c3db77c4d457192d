use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{chart::series::LineColor, data::domain::Category};

/// Fixed colors for known entities and categories.
///
/// Keys are entity names (broker) or category names (regulatory). Anything
/// not listed gets [`LineColor::Auto`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette(BTreeMap<String, String>);

impl Default for Palette {
    fn default() -> Self {
        Self(BTreeMap::from([
            ("摩根大通".to_string(), "blue".to_string()),
            ("乾坤期货".to_string(), "red".to_string()),
            (Category::ManagedMoney.to_string(), "green".to_string()),
            (Category::Noncommercial.to_string(), "orange".to_string()),
        ]))
    }
}

impl Palette {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with_color(mut self, key: impl Into<String>, color: impl Into<String>) -> Self {
        self.0.insert(key.into(), color.into());
        self
    }

    pub fn color_for(&self, key: &str) -> LineColor {
        self.0
            .get(key)
            .map(|c| LineColor::Named(c.clone()))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
