#![allow(dead_code)]

use std::path::PathBuf;

use cotlens::prelude::*;

pub const JPM: &str = "摩根大通";
pub const QIANKUN: &str = "乾坤期货";

pub fn fixture(name: &str) -> PathBuf {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    assert!(path.exists(), "Test fixture missing: {}", path.display());
    path
}

pub fn setup_tables(config: &DashboardConfig) -> (BrokerTable, RegulatoryTable) {
    let broker = read_csv(fixture("broker_positions.csv")).expect("Failed to read broker fixture");
    let regulatory =
        read_csv(fixture("cftc_positions.csv")).expect("Failed to read regulatory fixture");

    (
        config
            .broker_table(broker)
            .expect("Failed to load broker table"),
        config
            .regulatory_table(regulatory)
            .expect("Failed to load regulatory table"),
    )
}

pub fn values(series: &Series) -> Vec<Option<f64>> {
    series.values().collect()
}

pub fn assert_close(actual: &[Option<f64>], expected: &[Option<f64>]) {
    assert_eq!(actual.len(), expected.len(), "Length mismatch: {actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        match (a, e) {
            (Some(a), Some(e)) => assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}"),
            (None, None) => {}
            _ => panic!("Gap mismatch: {actual:?} vs {expected:?}"),
        }
    }
}
