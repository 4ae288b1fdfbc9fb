//! Consolidation of raw rows into a clean bar series.
//!
//! Steps, all on a polars `LazyFrame`:
//! 1. stable sort by date, so rows sharing a date keep input order
//! 2. de-duplicate by date, keeping the first occurrence
//! 3. split by the market-logic predicate into valid and rejected rows; kept
//!    rows must also pass [`Bar::is_sane`](crate::domain::Bar::is_sane)
//!
//! Rows carry their input index through the plan; the surviving indices are
//! mapped back to the original [`RawBar`]s.

use super::provider::{DataError, RawBar};
use crate::domain::BarSeries;
use polars::prelude::*;
use tracing::{info, warn};

/// Result of consolidating one or more input files.
#[derive(Debug, Clone)]
pub struct Consolidated {
    pub series: BarSeries,
    pub input_rows: usize,
    pub duplicates_dropped: usize,
    /// Rows failing market-logic validation, in date order.
    pub rejected: Vec<RawBar>,
}

/// Sort by date and drop repeated dates, keeping the first row seen.
pub fn canonicalize(frame: LazyFrame) -> LazyFrame {
    frame
        .sort(
            ["date"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .unique_stable(Some(vec!["date".into()]), UniqueKeepStrategy::First)
}

/// Market-logic predicate: no NaN price, high >= low, open and close within
/// [low, high], positive prices and positive volume.
///
/// Polars orders NaN above every number, so the comparisons alone would
/// accept a NaN high.
pub fn market_logic() -> Expr {
    col("open")
        .is_not_nan()
        .and(col("high").is_not_nan())
        .and(col("low").is_not_nan())
        .and(col("close").is_not_nan())
        .and(col("high").gt_eq(col("low")))
        .and(col("high").gt_eq(col("open")))
        .and(col("high").gt_eq(col("close")))
        .and(col("low").lt_eq(col("open")))
        .and(col("low").lt_eq(col("close")))
        .and(col("open").gt(lit(0.0)))
        .and(col("high").gt(lit(0.0)))
        .and(col("low").gt(lit(0.0)))
        .and(col("close").gt(lit(0.0)))
        .and(col("volume").gt(lit(0i64)))
}

/// Build a frame of raw rows with a `row` column holding the input index.
pub fn raw_to_dataframe(raw: &[RawBar]) -> Result<DataFrame, DataError> {
    let epoch = chrono::NaiveDate::default();
    let rows: Vec<u32> = (0..raw.len() as u32).collect();
    let dates: Vec<i32> = raw
        .iter()
        .map(|b| (b.date - epoch).num_days() as i32)
        .collect();

    let df = DataFrame::new(vec![
        Column::new("row".into(), rows),
        Column::new("date".into(), dates).cast(&DataType::Date)?,
        Column::new("open".into(), raw.iter().map(|b| b.open).collect::<Vec<_>>()),
        Column::new("high".into(), raw.iter().map(|b| b.high).collect::<Vec<_>>()),
        Column::new("low".into(), raw.iter().map(|b| b.low).collect::<Vec<_>>()),
        Column::new("close".into(), raw.iter().map(|b| b.close).collect::<Vec<_>>()),
        Column::new("volume".into(), raw.iter().map(|b| b.volume).collect::<Vec<_>>()),
    ])?;
    Ok(df)
}

fn select_rows(raw: &[RawBar], df: &DataFrame) -> Result<Vec<RawBar>, DataError> {
    let rows = df.column("row")?.u32()?;
    Ok(rows
        .into_iter()
        .flatten()
        .filter_map(|i| raw.get(i as usize).copied())
        .collect())
}

/// Consolidate raw rows into a validated, strictly ordered bar series.
pub fn consolidate(raw: &[RawBar]) -> Result<Consolidated, DataError> {
    let input_rows = raw.len();
    let canonical = canonicalize(raw_to_dataframe(raw)?.lazy()).collect()?;
    let duplicates_dropped = input_rows - canonical.height();

    let valid = canonical.clone().lazy().filter(market_logic()).collect()?;
    let invalid = canonical.lazy().filter(market_logic().not()).collect()?;

    let mut rejected = select_rows(raw, &invalid)?;
    let mut bars = Vec::with_capacity(valid.height());
    for row in select_rows(raw, &valid)? {
        let bar = row.to_bar();
        if bar.is_sane() {
            bars.push(bar);
        } else {
            rejected.push(row);
        }
    }
    rejected.sort_by_key(|r| r.date);

    for bar in &rejected {
        warn!(
            date = %bar.date,
            open = bar.open,
            high = bar.high,
            low = bar.low,
            close = bar.close,
            volume = bar.volume,
            "rejected invalid daily row"
        );
    }

    if bars.is_empty() {
        return Err(DataError::NoValidBars {
            rejected: rejected.len(),
        });
    }
    let series = BarSeries::new(bars)?;

    info!(
        input_rows,
        duplicates_dropped,
        rejected = rejected.len(),
        bars = series.len(),
        first = %series.first_date(),
        last = %series.last_date(),
        "consolidated daily bars"
    );

    Ok(Consolidated {
        series,
        input_rows,
        duplicates_dropped,
        rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    fn raw(day: u32, open: f64, high: f64, low: f64, close: f64, volume: i64) -> RawBar {
        RawBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn sorts_by_date() {
        let input = vec![
            raw(4, 10.0, 12.0, 9.0, 11.0, 100),
            raw(2, 10.0, 12.0, 9.0, 11.0, 100),
            raw(3, 10.0, 12.0, 9.0, 11.0, 100),
        ];
        let out = consolidate(&input).unwrap();
        let days: Vec<NaiveDate> = out.series.bars().iter().map(|b| b.date).collect();
        assert!(days.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(out.duplicates_dropped, 0);
    }

    #[test]
    fn duplicate_dates_keep_first_occurrence() {
        let input = vec![
            raw(2, 10.0, 12.0, 9.0, 11.0, 100),
            raw(3, 20.0, 22.0, 19.0, 21.0, 100),
            raw(2, 30.0, 32.0, 29.0, 31.0, 100),
        ];
        let out = consolidate(&input).unwrap();
        assert_eq!(out.input_rows, 3);
        assert_eq!(out.duplicates_dropped, 1);
        assert_eq!(out.series.len(), 2);
        assert_eq!(out.series.bars()[0].open, 10.0);
    }

    #[test]
    fn invalid_rows_are_rejected() {
        let input = vec![
            raw(2, 10.0, 12.0, 9.0, 11.0, 100),
            // high below low
            raw(3, 10.0, 8.0, 9.0, 9.5, 100),
            // zero volume
            raw(4, 10.0, 12.0, 9.0, 11.0, 0),
            // close above high
            raw(5, 10.0, 12.0, 9.0, 13.0, 100),
            raw(8, 11.0, 12.5, 10.0, 12.0, 100),
        ];
        let out = consolidate(&input).unwrap();
        assert_eq!(out.series.len(), 2);
        assert_eq!(out.rejected.len(), 3);
        assert_eq!(out.rejected[0].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }

    #[test]
    fn nan_prices_are_rejected() {
        let input = vec![
            raw(2, 10.0, 12.0, 9.0, 11.0, 100),
            raw(3, f64::NAN, 12.0, 9.0, 11.0, 100),
            raw(4, 10.0, f64::NAN, 9.0, 11.0, 100),
            raw(5, 10.0, 12.0, f64::NAN, 11.0, 100),
            raw(8, 10.0, 12.0, 9.0, f64::NAN, 100),
        ];
        let out = consolidate(&input).unwrap();
        assert_eq!(out.series.len(), 1);
        assert_eq!(out.rejected.len(), 4);
        assert!(out.series.bars().iter().all(|b| b.is_sane()));
        let days: Vec<u32> = out.rejected.iter().map(|r| r.date.day()).collect();
        assert_eq!(days, vec![3, 4, 5, 8]);
    }

    #[test]
    fn market_logic_matches_bar_sanity() {
        let rows = vec![
            raw(2, 10.0, 12.0, 9.0, 11.0, 100),
            raw(3, 10.0, f64::NAN, 9.0, 11.0, 100),
            raw(4, 10.0, 8.0, 9.0, 9.5, 100),
            raw(5, 0.0, 12.0, 0.0, 11.0, 100),
            raw(8, 10.0, 12.0, 9.0, 11.0, -5),
        ];
        let valid = raw_to_dataframe(&rows)
            .unwrap()
            .lazy()
            .filter(market_logic())
            .collect()
            .unwrap();
        let kept = select_rows(&rows, &valid).unwrap();
        let expected: Vec<RawBar> = rows.iter().copied().filter(|r| r.to_bar().is_sane()).collect();
        assert_eq!(kept, expected);
    }

    #[test]
    fn all_invalid_is_error() {
        let input = vec![raw(2, -1.0, 12.0, 9.0, 11.0, 100)];
        assert!(matches!(
            consolidate(&input),
            Err(DataError::NoValidBars { rejected: 1 })
        ));
    }
}
