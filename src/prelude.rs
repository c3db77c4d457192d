// 1. Traits
pub use crate::chart::io::{ExportName, ToJson, ToJsonFile};
pub use crate::data::table::PositionSource;

// 2. Tables & Requests
pub use crate::chart::assembler::Comparison;
pub use crate::data::filter::FilterSelection;
pub use crate::data::table::{BrokerTable, RegulatoryTable};

// 3. Domain Types
pub use crate::data::domain::{Category, Metric, SmoothingWindow, SourceKind};

// 4. Output
pub use crate::chart::palette::Palette;
pub use crate::chart::series::{LineColor, LineStyle, Point, Series};
pub use crate::chart::{Chart, Dashboard};

// 5. Configuration
pub use crate::config::DashboardConfig;
pub use crate::data::schema::{BrokerColumns, CategoryColumns, RegulatoryColumns};

// 6. Errors
pub use crate::error::{CotlensError, CotlensResult, DataError, IoError, SelectionError};

// 7. Loading
pub use crate::io::read_csv;
