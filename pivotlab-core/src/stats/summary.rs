//! Report tables derived from a tally: touches, closes, both-touched outcomes.

use super::tally::TouchTally;
use crate::levels::LevelMethod;
use serde::{Deserialize, Serialize};

/// `count / total * 100`, or 0 when `total` is 0.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Touches,
    Closes,
    BothTouched,
}

impl TableKind {
    pub fn title(&self) -> &'static str {
        match self {
            TableKind::Touches => "Touch summary",
            TableKind::Closes => "Close analysis",
            TableKind::BothTouched => "Both pivots touched",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StatValue {
    Count(usize),
    /// Undefined over an empty subset.
    Mean(Option<f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRow {
    pub label: String,
    pub value: StatValue,
    /// Percentage of the table's base count; absent for mean rows.
    pub percentage: Option<f64>,
}

impl StatRow {
    fn total(label: &str, count: usize) -> Self {
        Self {
            label: label.to_string(),
            value: StatValue::Count(count),
            percentage: Some(100.0),
        }
    }

    fn count(label: &str, count: usize, base: usize) -> Self {
        Self {
            label: label.to_string(),
            value: StatValue::Count(count),
            percentage: Some(percentage(count, base)),
        }
    }

    fn mean(label: &str, mean: Option<f64>) -> Self {
        Self {
            label: label.to_string(),
            value: StatValue::Mean(mean),
            percentage: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatTable {
    pub kind: TableKind,
    pub rows: Vec<StatRow>,
}

impl StatTable {
    pub fn row(&self, label: &str) -> Option<&StatRow> {
        self.rows.iter().find(|r| r.label == label)
    }
}

/// Tally of one method over one year filter, with its report tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodStatistics {
    pub method: LevelMethod,
    /// `None` means the full history.
    pub year: Option<i32>,
    pub tally: TouchTally,
}

impl MethodStatistics {
    pub fn new(method: LevelMethod, year: Option<i32>, tally: TouchTally) -> Self {
        Self {
            method,
            year,
            tally,
        }
    }

    pub fn scope_label(&self) -> String {
        match self.year {
            Some(year) => year.to_string(),
            None => "all".to_string(),
        }
    }

    pub fn touches_table(&self) -> StatTable {
        let t = &self.tally;
        StatTable {
            kind: TableKind::Touches,
            rows: vec![
                StatRow::total("Days analysed", t.total),
                StatRow::count("Touched Q1", t.touches_upper, t.total),
                StatRow::count("Touched Q4", t.touches_lower, t.total),
                StatRow::count("Touched both", t.touches_both, t.total),
                StatRow::count("Touched Q1 only", t.touches_upper_only, t.total),
                StatRow::count("Touched Q4 only", t.touches_lower_only, t.total),
                StatRow::mean("Mean points above Q1", t.mean_points_above_upper()),
                StatRow::mean("Mean points below Q4", t.mean_points_below_lower()),
            ],
        }
    }

    pub fn closes_table(&self) -> StatTable {
        let t = &self.tally;
        StatTable {
            kind: TableKind::Closes,
            rows: vec![
                StatRow::total("Days analysed", t.total),
                StatRow::count("Closed below Q1", t.closes_below_upper, t.total),
                StatRow::count("Closed at or above Q1", t.closes_at_or_above_upper, t.total),
                StatRow::count("Closed above Q4", t.closes_above_lower, t.total),
                StatRow::count("Closed at or below Q4", t.closes_at_or_below_lower, t.total),
            ],
        }
    }

    pub fn both_touched_table(&self) -> StatTable {
        let t = &self.tally;
        let base = t.touches_both;
        StatTable {
            kind: TableKind::BothTouched,
            rows: vec![
                StatRow::total("Days touching both", base),
                StatRow::count("Closed above Q1", t.both_close_above_upper, base),
                StatRow::count("Closed below Q4", t.both_close_below_lower, base),
                StatRow::count("Closed between", t.both_close_between, base),
                StatRow::mean("Mean close points above Q1", t.mean_close_points_above_upper()),
                StatRow::mean("Mean close points below Q4", t.mean_close_points_below_lower()),
            ],
        }
    }

    pub fn tables(&self) -> [StatTable; 3] {
        [
            self.touches_table(),
            self.closes_table(),
            self.both_touched_table(),
        ]
    }
}
