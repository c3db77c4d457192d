use polars::prelude::{DataFrame, DataType, IntoLazy, col};
use strum::IntoEnumIterator;
use tracing::{debug, warn};

use crate::{
    chart::{
        Chart, Dashboard,
        palette::Palette,
        series::{Point, Series},
    },
    data::{
        domain::{Metric, SmoothingWindow},
        filter::{FilterSelection, filter},
        smoothing::smooth,
        table::{BrokerTable, PositionSource, RegulatoryTable, dates},
    },
    error::{CotlensResult, polars_err},
};

/// Read-only handle over both source tables.
///
/// Every request is a pure function of the two tables, the palette and the
/// [`FilterSelection`]; nothing is cached between calls, so one `Comparison`
/// can be shared across threads and called concurrently.
#[derive(Debug, Clone, Copy)]
pub struct Comparison<'a> {
    broker: &'a BrokerTable,
    regulatory: &'a RegulatoryTable,
    palette: &'a Palette,
}

/// Both source tables narrowed to one selection.
struct Narrowed {
    broker: DataFrame,
    regulatory: DataFrame,
}

impl<'a> Comparison<'a> {
    pub fn new(
        broker: &'a BrokerTable,
        regulatory: &'a RegulatoryTable,
        palette: &'a Palette,
    ) -> Self {
        Self {
            broker,
            regulatory,
            palette,
        }
    }

    /// Builds all six charts for `selection`.
    ///
    /// # Errors
    /// [`SelectionError::NoYears`](crate::error::SelectionError::NoYears) if
    /// no year is selected. Unresolvable (key, metric) pairs are skipped, not
    /// reported as errors.
    #[tracing::instrument(skip_all, fields(
        years = selection.years().len(),
        entities = selection.entities().len(),
        categories = selection.categories().len(),
        window = %selection.window(),
    ))]
    pub fn render(&self, selection: &FilterSelection) -> CotlensResult<Dashboard> {
        let narrowed = self.narrow(selection)?;
        let charts = Metric::iter()
            .map(|metric| Chart::new(metric, self.series_for(metric, &narrowed, selection)))
            .collect::<Vec<_>>();

        debug!(
            series = charts.iter().map(|c| c.series.len()).sum::<usize>(),
            "Dashboard assembled"
        );
        Ok(Dashboard::new(charts))
    }

    /// Builds the series of a single metric for `selection`.
    #[tracing::instrument(skip_all, fields(metric = %metric))]
    pub fn assemble(&self, metric: Metric, selection: &FilterSelection) -> CotlensResult<Vec<Series>> {
        let narrowed = self.narrow(selection)?;
        Ok(self.series_for(metric, &narrowed, selection))
    }

    fn narrow(&self, selection: &FilterSelection) -> CotlensResult<Narrowed> {
        selection.validate()?;
        Ok(Narrowed {
            broker: filter(self.broker, selection.years(), selection.entities())?,
            regulatory: filter(self.regulatory, selection.years(), selection.categories())?,
        })
    }

    fn series_for(&self, metric: Metric, narrowed: &Narrowed, selection: &FilterSelection) -> Vec<Series> {
        let window = selection.window();

        let broker = selection.entities().iter().filter_map(|entity| {
            self.project(self.broker, &narrowed.broker, metric, entity, window)
        });
        let regulatory = selection.categories().iter().filter_map(|category| {
            self.project(self.regulatory, &narrowed.regulatory, metric, category, window)
        });

        broker.chain(regulatory).collect()
    }

    /// Projects one (key, metric) pair out of already narrowed rows.
    ///
    /// Returns `None` when the pair cannot be resolved; the rest of the
    /// request is unaffected.
    fn project<S: PositionSource>(
        &self,
        source: &S,
        rows: &DataFrame,
        metric: Metric,
        key: &str,
        window: SmoothingWindow,
    ) -> Option<Series> {
        let column = match source.resolve(metric, key) {
            Ok(column) => column,
            Err(e) => {
                warn!(source = %source.kind(), key, %metric, error = %e, "Skipping series");
                return None;
            }
        };

        let mut points = match extract_points(source, rows, column, key) {
            Ok(points) => points,
            Err(e) => {
                warn!(source = %source.kind(), key, %metric, error = %e, "Skipping series");
                return None;
            }
        };

        if metric.definition().is_rate && !window.is_identity() {
            let values = points.iter().map(|p| p.value).collect::<Vec<_>>();
            for (point, value) in points.iter_mut().zip(smooth(&values, window)) {
                point.value = value;
            }
        }

        Some(Series::new(
            source.label(key),
            source.kind(),
            self.palette.color_for(&source.palette_key(key)),
            points,
        ))
    }
}

/// Reads `(date, value)` pairs for `key` in row order (ascending date).
fn extract_points<S: PositionSource>(
    source: &S,
    rows: &DataFrame,
    column: &str,
    key: &str,
) -> CotlensResult<Vec<Point>> {
    let date_col = source.date_column();

    let mut lf = rows.clone().lazy();
    if let Some(predicate) = source.key_predicate(key) {
        lf = lf.filter(predicate);
    }

    let df = lf
        .select([col(date_col), col(column).cast(DataType::Float64)])
        .collect()
        .map_err(|e| polars_err("Failed to project series", e))?;

    let dates = dates(
        df.column(date_col)
            .map_err(|e| polars_err("Missing date column", e))?,
    )?;
    let values = df
        .column(column)
        .and_then(|c| c.f64())
        .map_err(|e| polars_err("Failed to read value column", e))?;

    Ok(dates
        .into_iter()
        .zip(values)
        .filter_map(|(date, value)| {
            date.map(|date| Point {
                date,
                value: value.filter(|v| !v.is_nan()),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use polars::prelude::df;

    use super::*;
    use crate::{
        chart::series::{LineColor, LineStyle},
        data::{
            domain::SourceKind,
            schema::{BrokerColumns, RegulatoryColumns},
        },
        error::{CotlensError, SelectionError},
    };

    fn tables() -> (BrokerTable, RegulatoryTable) {
        let broker = df![
            "date" => &["2023-01-13", "2023-01-06", "2023-01-06", "2022-12-30"],
            "entity_name" => &["Alpha", "Alpha", "Beta", "Alpha"],
            "total_long" => &[10.0, 10.0, 7.0, 9.0],
            "total_long_change_rate" => &[0.0, 0.1, 0.2, 0.3],
            "total_short" => &[-3.0, -5.0, -1.0, -4.0],
            "total_short_change_rate" => &[0.5, 0.5, 0.5, 0.5],
            "net" => &[13.0, 15.0, 8.0, 13.0],
            "net_change_rate" => &[-0.2, 0.4, 0.0, 0.1],
        ]
        .unwrap();
        let regulatory = df![
            "ReportDateAsYyyyMmDd" => &["2023-01-03", "2023-01-10", "2022-12-27"],
            "MMoneyPositionsLongAll" => &[100.0, 110.0, 90.0],
            "MMNetPosition" => &[50.0, 60.0, 40.0],
            "MMNet%" => &[2.0, 4.0, 100.0],
        ]
        .unwrap();

        (
            BrokerTable::new(broker, BrokerColumns::default()).unwrap(),
            RegulatoryTable::new(regulatory, RegulatoryColumns::default()).unwrap(),
        )
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_render_produces_six_charts_in_order() {
        let (broker, regulatory) = tables();
        let palette = Palette::default();
        let cmp = Comparison::new(&broker, &regulatory, &palette);

        let dashboard = cmp
            .render(&FilterSelection::new([2023]).with_entities(["Alpha"]))
            .unwrap();

        let metrics = dashboard.charts().iter().map(|c| c.metric).collect::<Vec<_>>();
        assert_eq!(metrics, Metric::iter().collect::<Vec<_>>());
        assert_eq!(dashboard.charts()[0].title, "Total Long Position");
        assert!(dashboard.charts().iter().all(|c| c.series.len() == 1));
    }

    #[test]
    fn test_broker_series_is_sorted_and_year_restricted() {
        let (broker, regulatory) = tables();
        let palette = Palette::default();
        let cmp = Comparison::new(&broker, &regulatory, &palette);
        let sel = FilterSelection::new([2023]).with_entities(["Alpha"]);

        let series = cmp.assemble(Metric::TotalShort, &sel).unwrap();
        assert_eq!(series.len(), 1);

        let alpha = &series[0];
        assert_eq!(alpha.label, "Alpha");
        assert_eq!(alpha.source, SourceKind::Broker);
        assert_eq!(alpha.line, LineStyle::Solid);
        assert_eq!(alpha.color, LineColor::Auto);
        assert_eq!(
            alpha.dates().collect::<Vec<_>>(),
            vec![day(2023, 1, 6), day(2023, 1, 13)]
        );
        assert_eq!(alpha.values().collect::<Vec<_>>(), vec![Some(5.0), Some(3.0)]);

        let net = cmp.assemble(Metric::Net, &sel).unwrap();
        assert_eq!(net[0].values().collect::<Vec<_>>(), vec![Some(15.0), Some(13.0)]);
    }

    #[test]
    fn test_rate_metrics_are_smoothed_within_selected_years() {
        let (broker, regulatory) = tables();
        let palette = Palette::default();
        let cmp = Comparison::new(&broker, &regulatory, &palette);

        let sel = FilterSelection::new([2023])
            .with_entities(["Alpha"])
            .with_window(SmoothingWindow::Seven);
        let series = cmp.assemble(Metric::NetChangeRate, &sel).unwrap();
        let values = series[0].values().collect::<Vec<_>>();

        // 2022's 0.1 is outside the selection and must not leak into the mean.
        assert_eq!(values.len(), 2);
        assert!((values[0].unwrap() - 0.4).abs() < 1e-12);
        assert!((values[1].unwrap() - 0.1).abs() < 1e-12);

        let raw = cmp
            .assemble(Metric::NetChangeRate, &sel.clone().with_window(SmoothingWindow::One))
            .unwrap();
        assert_eq!(
            raw[0].values().collect::<Vec<_>>(),
            vec![Some(0.4), Some(-0.2)]
        );
    }

    #[test]
    fn test_level_metrics_are_never_smoothed() {
        let (broker, regulatory) = tables();
        let palette = Palette::default();
        let cmp = Comparison::new(&broker, &regulatory, &palette);

        let sel = FilterSelection::new([2022, 2023])
            .with_entities(["Alpha"])
            .with_window(SmoothingWindow::Thirty);
        let series = cmp.assemble(Metric::TotalLong, &sel).unwrap();
        assert_eq!(
            series[0].values().collect::<Vec<_>>(),
            vec![Some(9.0), Some(10.0), Some(10.0)]
        );
    }

    #[test]
    fn test_regulatory_series_is_dashed_and_colored() {
        let (broker, regulatory) = tables();
        let palette = Palette::default();
        let cmp = Comparison::new(&broker, &regulatory, &palette);

        let sel = FilterSelection::new([2023])
            .with_categories(["Managed Money"])
            .with_window(SmoothingWindow::Seven);
        let series = cmp.assemble(Metric::NetChangeRate, &sel).unwrap();

        assert_eq!(series.len(), 1);
        let mm = &series[0];
        assert_eq!(mm.label, "CFTC Managed Money");
        assert!(mm.is_dashed());
        assert_eq!(mm.color, LineColor::Named("green".into()));
        assert_eq!(
            mm.dates().collect::<Vec<_>>(),
            vec![day(2023, 1, 3), day(2023, 1, 10)]
        );
        assert_eq!(mm.values().collect::<Vec<_>>(), vec![Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_unresolvable_pairs_are_skipped() {
        let (broker, regulatory) = tables();
        let palette = Palette::default();
        let cmp = Comparison::new(&broker, &regulatory, &palette);

        let sel = FilterSelection::new([2023])
            .with_entities(["Alpha"])
            .with_categories(["Swap Dealers", "Noncommercial", "Managed Money"]);

        // Noncommercial is known but has no columns in this table.
        let series = cmp.assemble(Metric::TotalShort, &sel).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].label, "Alpha");

        let series = cmp.assemble(Metric::TotalLong, &sel).unwrap();
        let labels = series.iter().map(|s| s.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["Alpha", "CFTC Managed Money"]);
    }

    #[test]
    fn test_category_spellings_draw_one_series() {
        let (broker, regulatory) = tables();
        let palette = Palette::default();
        let cmp = Comparison::new(&broker, &regulatory, &palette);

        let sel = FilterSelection::new([2023]).with_categories(["Managed Money", "managed money"]);
        let series = cmp.assemble(Metric::Net, &sel).unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].label, "CFTC Managed Money");
        assert_eq!(series[0].values().collect::<Vec<_>>(), vec![Some(50.0), Some(60.0)]);
    }

    #[test]
    fn test_long_regulatory_layout_keeps_categories_apart() {
        let (broker, _) = tables();
        let raw = df![
            "ReportDateAsYyyyMmDd" => &["2023-01-03", "2023-01-03", "2023-01-10", "2023-01-10"],
            "Category" => &["Managed Money", "Noncommercial", "Managed Money", "Noncommercial"],
            "MMNet%" => &[1.0, 100.0, 3.0, 300.0],
            "NonCommNet%" => &[50.0, 10.0, 70.0, 30.0],
        ]
        .unwrap();
        let columns = RegulatoryColumns {
            category: Some("Category".to_string()),
            ..RegulatoryColumns::default()
        };
        let regulatory = RegulatoryTable::new(raw, columns).unwrap();
        let palette = Palette::default();
        let cmp = Comparison::new(&broker, &regulatory, &palette);

        let sel = FilterSelection::new([2023])
            .with_categories(["Managed Money", "Noncommercial"])
            .with_window(SmoothingWindow::Seven);
        let series = cmp.assemble(Metric::NetChangeRate, &sel).unwrap();

        assert_eq!(series.len(), 2);
        let (mm, nc) = (&series[0], &series[1]);
        assert_eq!(mm.label, "CFTC Managed Money");
        assert_eq!(nc.label, "CFTC Noncommercial");
        for s in [mm, nc] {
            assert_eq!(
                s.dates().collect::<Vec<_>>(),
                vec![day(2023, 1, 3), day(2023, 1, 10)]
            );
        }
        assert_eq!(mm.values().collect::<Vec<_>>(), vec![Some(1.0), Some(2.0)]);
        assert_eq!(nc.values().collect::<Vec<_>>(), vec![Some(10.0), Some(20.0)]);
    }

    #[test]
    fn test_blank_selection_yields_empty_charts() {
        let (broker, regulatory) = tables();
        let palette = Palette::default();
        let cmp = Comparison::new(&broker, &regulatory, &palette);

        let dashboard = cmp.render(&FilterSelection::new([2022, 2023])).unwrap();
        assert_eq!(dashboard.charts().len(), 6);
        assert!(dashboard.charts().iter().all(Chart::is_empty));
    }

    #[test]
    fn test_no_years_is_rejected() {
        let (broker, regulatory) = tables();
        let palette = Palette::default();
        let cmp = Comparison::new(&broker, &regulatory, &palette);

        let err = cmp
            .render(&FilterSelection::new([]).with_entities(["Alpha"]))
            .unwrap_err();
        assert!(matches!(
            err,
            CotlensError::Selection(SelectionError::NoYears)
        ));
    }

    #[test]
    fn test_unknown_entity_yields_empty_series() {
        let (broker, regulatory) = tables();
        let palette = Palette::default();
        let cmp = Comparison::new(&broker, &regulatory, &palette);

        let series = cmp
            .assemble(Metric::Net, &FilterSelection::new([2023]).with_entities(["Gamma"]))
            .unwrap();
        assert_eq!(series.len(), 1);
        assert!(series[0].points.is_empty());
    }
}
