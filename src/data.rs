pub mod domain;
pub mod filter;
pub mod schema;
pub mod smoothing;
pub mod table;
