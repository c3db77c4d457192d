//! Side-by-side comparison of broker-level and regulatory (CFTC-style)
//! futures positioning.
//!
//! Two tables go in: broker positions keyed by (date, entity) and regulatory
//! aggregates keyed by report date with one column set per trader category.
//! A [`FilterSelection`](data::filter::FilterSelection) goes in per request,
//! and a [`Dashboard`](chart::Dashboard) of six renderer-ready charts comes
//! out.

pub mod chart;
pub mod config;
pub mod data;
pub mod error;
pub mod io;
pub mod prelude;
