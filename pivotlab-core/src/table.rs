//! Per-bar level table: every method's level sets and touch records,
//! aligned with the bar series, and its wide polars frame.

use crate::classify::{classify_series, TouchRecord};
use crate::domain::{Bar, BarSeries};
use crate::levels::{
    ExpectedMove, ExpectedMoveLevels, LevelEngine, LevelMethod, RangeEngine, RangeLevels,
    SkewLevels,
};
use crate::stats::{tally_records, ExpectedMoveSummary, MethodStatistics, RecordFilter};
use polars::prelude::*;

/// Level sets of one method, one entry per bar.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodLevels {
    Range(Vec<Option<RangeLevels>>),
    ExpectedMove(Vec<Option<ExpectedMoveLevels>>),
}

impl MethodLevels {
    pub fn len(&self) -> usize {
        match self {
            MethodLevels::Range(v) => v.len(),
            MethodLevels::ExpectedMove(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of bars with a defined level set.
    pub fn defined(&self) -> usize {
        match self {
            MethodLevels::Range(v) => v.iter().flatten().count(),
            MethodLevels::ExpectedMove(v) => v.iter().flatten().count(),
        }
    }
}

/// Output of one method over the series.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRun {
    pub method: LevelMethod,
    pub levels: MethodLevels,
    pub records: Vec<Option<TouchRecord>>,
}

impl MethodRun {
    fn from_engine<E, F>(engine: &E, series: &BarSeries, wrap: F) -> Self
    where
        E: LevelEngine,
        F: FnOnce(Vec<Option<E::Levels>>) -> MethodLevels,
    {
        let levels = engine.compute(series);
        let records = classify_series(series.bars(), &levels);
        Self {
            method: engine.method(),
            levels: wrap(levels),
            records,
        }
    }
}

/// Bars plus the level sets and records of every requested method.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelTable {
    series: BarSeries,
    runs: Vec<MethodRun>,
}

impl LevelTable {
    /// Run every method over `series`. Methods are deduplicated and ordered.
    pub fn build(series: BarSeries, methods: &[LevelMethod], with_skew: bool) -> Self {
        let mut methods = methods.to_vec();
        methods.sort();
        methods.dedup();

        let runs = methods
            .into_iter()
            .map(|method| match method {
                LevelMethod::Range { window } => {
                    MethodRun::from_engine(&RangeEngine::new(window), &series, MethodLevels::Range)
                }
                LevelMethod::ExpectedMove { lookback } => MethodRun::from_engine(
                    &ExpectedMove::new(lookback).with_skew(with_skew),
                    &series,
                    MethodLevels::ExpectedMove,
                ),
            })
            .collect();

        Self { series, runs }
    }

    pub fn series(&self) -> &BarSeries {
        &self.series
    }

    pub fn bars(&self) -> &[Bar] {
        self.series.bars()
    }

    pub fn runs(&self) -> &[MethodRun] {
        &self.runs
    }

    pub fn run(&self, method: LevelMethod) -> Option<&MethodRun> {
        self.runs.iter().find(|r| r.method == method)
    }

    /// Statistics of one method's records under `filter`.
    pub fn statistics(&self, method: LevelMethod, filter: RecordFilter) -> Option<MethodStatistics> {
        let run = self.run(method)?;
        let tally = tally_records(self.bars(), &run.records, filter);
        Some(MethodStatistics::new(method, filter.year, tally))
    }

    /// Descriptive summaries of every expected-move method.
    pub fn expected_move_summaries(&self) -> Vec<ExpectedMoveSummary> {
        self.runs
            .iter()
            .filter_map(|run| match (&run.method, &run.levels) {
                (LevelMethod::ExpectedMove { lookback }, MethodLevels::ExpectedMove(levels)) => {
                    Some(ExpectedMoveSummary::compute(*lookback, levels))
                }
                _ => None,
            })
            .collect()
    }

    /// Wide frame: one row per bar, OHLCV then `{prefix}_{field}` columns
    /// for every method. Undefined values are null.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let bars = self.bars();
        // NaiveDate::default() is 1970-01-01
        let epoch = chrono::NaiveDate::default();
        let dates: Vec<i32> = bars
            .iter()
            .map(|b| (b.date - epoch).num_days() as i32)
            .collect();

        let mut columns = vec![
            Column::new("date".into(), dates).cast(&DataType::Date)?,
            Column::new("open".into(), bars.iter().map(|b| b.open).collect::<Vec<_>>()),
            Column::new("high".into(), bars.iter().map(|b| b.high).collect::<Vec<_>>()),
            Column::new("low".into(), bars.iter().map(|b| b.low).collect::<Vec<_>>()),
            Column::new("close".into(), bars.iter().map(|b| b.close).collect::<Vec<_>>()),
            Column::new("volume".into(), bars.iter().map(|b| b.volume).collect::<Vec<_>>()),
        ];

        for run in &self.runs {
            let prefix = run.method.column_prefix();
            match &run.levels {
                MethodLevels::Range(levels) => {
                    let rows: Vec<Option<[f64; 27]>> =
                        levels.iter().map(|l| l.map(|l| l.values())).collect();
                    push_f64_columns(&mut columns, &prefix, &RangeLevels::FIELD_NAMES, &rows);
                }
                MethodLevels::ExpectedMove(levels) => {
                    let rows: Vec<Option<[f64; 8]>> =
                        levels.iter().map(|l| l.map(|l| l.values())).collect();
                    push_f64_columns(&mut columns, &prefix, &ExpectedMoveLevels::FIELD_NAMES, &rows);

                    for (k, name) in ExpectedMoveLevels::COUNT_NAMES.iter().enumerate() {
                        let values: Vec<Option<u32>> =
                            levels.iter().map(|l| l.map(|l| l.counts()[k])).collect();
                        columns.push(Column::new(format!("{prefix}_{name}").into(), values));
                    }

                    let skew: Vec<Option<[f64; 14]>> = levels
                        .iter()
                        .map(|l| l.and_then(|l| l.skew).map(|s| s.values()))
                        .collect();
                    let skew_prefix = format!("{prefix}_skew");
                    push_f64_columns(&mut columns, &skew_prefix, &SkewLevels::FIELD_NAMES, &skew);
                }
            }

            let flags: Vec<Option<[bool; 12]>> =
                run.records.iter().map(|r| r.map(|r| r.flags())).collect();
            for (k, name) in TouchRecord::FLAG_NAMES.iter().enumerate() {
                let values: Vec<Option<bool>> = flags.iter().map(|f| f.map(|f| f[k])).collect();
                columns.push(Column::new(format!("{prefix}_{name}").into(), values));
            }
            let magnitudes: Vec<Option<[f64; 4]>> =
                run.records.iter().map(|r| r.map(|r| r.magnitudes())).collect();
            push_f64_columns(&mut columns, &prefix, &TouchRecord::MAGNITUDE_NAMES, &magnitudes);
        }

        DataFrame::new(columns)
    }
}

fn push_f64_columns<const N: usize>(
    columns: &mut Vec<Column>,
    prefix: &str,
    names: &[&str; N],
    rows: &[Option<[f64; N]>],
) {
    for (k, name) in names.iter().enumerate() {
        let values: Vec<Option<f64>> = rows.iter().map(|r| r.map(|r| r[k])).collect();
        columns.push(Column::new(format!("{prefix}_{name}").into(), values));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_helpers::make_bars;
    use crate::levels::RangeWindow;

    fn methods() -> Vec<LevelMethod> {
        vec![
            LevelMethod::ExpectedMove { lookback: 3 },
            LevelMethod::Range {
                window: RangeWindow::ThreeDay,
            },
            LevelMethod::Range {
                window: RangeWindow::OneDay,
            },
            LevelMethod::Range {
                window: RangeWindow::OneDay,
            },
        ]
    }

    fn table() -> LevelTable {
        let closes = [100.0, 102.0, 101.0, 104.0, 103.0, 106.0, 105.0];
        let series = BarSeries::new(make_bars(&closes)).unwrap();
        LevelTable::build(series, &methods(), true)
    }

    #[test]
    fn methods_are_sorted_and_deduplicated() {
        let t = table();
        let labels: Vec<String> = t.runs().iter().map(|r| r.method.label()).collect();
        assert_eq!(labels, vec!["1D", "3D", "EM3"]);
    }

    #[test]
    fn every_run_is_aligned_with_bars() {
        let t = table();
        for run in t.runs() {
            assert_eq!(run.levels.len(), t.bars().len());
            assert_eq!(run.records.len(), t.bars().len());
        }
        let one_day = t
            .run(LevelMethod::Range {
                window: RangeWindow::OneDay,
            })
            .unwrap();
        assert_eq!(one_day.levels.defined(), 6);
        assert!(one_day.records[0].is_none());
    }

    #[test]
    fn statistics_for_unknown_method_is_none() {
        let t = table();
        assert!(t
            .statistics(LevelMethod::ExpectedMove { lookback: 50 }, RecordFilter::all())
            .is_none());
        let stats = t
            .statistics(LevelMethod::ExpectedMove { lookback: 3 }, RecordFilter::all())
            .unwrap();
        assert_eq!(stats.tally.total, 4);
    }

    #[test]
    fn dataframe_has_null_for_undefined_levels() {
        let df = table().to_dataframe().unwrap();
        assert_eq!(df.height(), 7);

        let q1 = df.column("d3_q1").unwrap().f64().unwrap();
        assert_eq!(q1.get(0), None);
        assert_eq!(q1.get(2), None);
        assert!(q1.get(3).is_some());

        let touch = df.column("d1_touch_q1").unwrap().bool().unwrap();
        assert_eq!(touch.get(0), None);
        assert!(touch.get(1).is_some());

        assert!(df.column("em3_skew_z2h").is_ok());
        assert!(df.column("em3_bullish_days").is_ok());
        assert!(df.column("em3_points_above_q1").is_ok());
    }

    #[test]
    fn expected_move_summaries_cover_em_runs() {
        let summaries = table().expected_move_summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].lookback, 3);
        assert_eq!(summaries[0].days_defined, 4);
    }
}
