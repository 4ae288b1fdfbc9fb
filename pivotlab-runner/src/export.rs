//! Reporting and export: JSON, CSV, Parquet and Markdown artifacts.
//!
//! - **JSON**: the full `AnalysisResult`, schema versioned
//! - **CSV**: statistics in long form, expected-move summaries, clean bars
//! - **Level table**: the wide per-bar frame as CSV and optionally Parquet
//! - **Markdown**: a human-readable report
//!
//! Unknown schema versions are rejected on load.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use polars::prelude::{CsvWriter, DataFrame, ParquetWriter, SerWriter};

use pivotlab_core::data::quality::OUTLIER_Z;
use pivotlab_core::stats::{ExpectedMoveSummary, StatValue};
use pivotlab_core::{BarSeries, LevelTable, MethodStatistics};

use crate::runner::{Analysis, AnalysisResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &AnalysisResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize AnalysisResult to JSON")
}

/// Deserialize an `AnalysisResult`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<AnalysisResult> {
    let result: AnalysisResult =
        serde_json::from_str(json).context("failed to deserialize AnalysisResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_default()
}

/// Export statistics in long form, one row per table row.
///
/// Columns: method, year, table, statistic, value, percentage.
/// Undefined means and mean-row percentages are empty cells.
pub fn export_statistics_csv(statistics: &[MethodStatistics]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["method", "year", "table", "statistic", "value", "percentage"])?;

    for stats in statistics {
        let method = stats.method.label();
        let scope = stats.scope_label();
        for table in stats.tables() {
            for row in &table.rows {
                let value = match row.value {
                    StatValue::Count(n) => n.to_string(),
                    StatValue::Mean(m) => fmt_opt(m),
                };
                wtr.write_record([
                    method.as_str(),
                    scope.as_str(),
                    table.kind.title(),
                    row.label.as_str(),
                    value.as_str(),
                    fmt_opt(row.percentage).as_str(),
                ])?;
            }
        }
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export one row per expected-move lookback.
pub fn export_expected_move_csv(summaries: &[ExpectedMoveSummary]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "lookback",
        "multiplier",
        "days_defined",
        "mean_bullish_avg",
        "mean_bearish_avg",
        "mean_emh",
        "mean_eml",
        "mean_range",
        "min_range",
        "max_range",
        "mean_range_pct_of_open",
        "inverted_days",
        "off_tick_days",
    ])?;
    for s in summaries {
        wtr.write_record([
            s.lookback.to_string(),
            s.multiplier.to_string(),
            s.days_defined.to_string(),
            fmt_opt(s.mean_bullish_avg),
            fmt_opt(s.mean_bearish_avg),
            fmt_opt(s.mean_emh),
            fmt_opt(s.mean_eml),
            fmt_opt(s.mean_range),
            fmt_opt(s.min_range),
            fmt_opt(s.max_range),
            fmt_opt(s.mean_range_pct_of_open),
            s.inverted_days.to_string(),
            s.off_tick_days.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export a bar series as headered `Date,Open,High,Low,Close,Volume` CSV.
pub fn export_bars_csv(series: &BarSeries) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Date", "Open", "High", "Low", "Close", "Volume"])?;
    for bar in series.bars() {
        wtr.write_record([
            bar.date.to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Level table ────────────────────────────────────────────────────

fn level_frame(table: &LevelTable) -> Result<DataFrame> {
    table.to_dataframe().context("failed to build level table frame")
}

/// Write the wide level table as CSV. Undefined values become empty cells.
pub fn write_level_table_csv(table: &LevelTable, path: &Path) -> Result<()> {
    let mut df = level_frame(table)?;
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Write the wide level table as Parquet.
pub fn write_level_table_parquet(table: &LevelTable, path: &Path) -> Result<()> {
    let mut df = level_frame(table)?;
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    ParquetWriter::new(&mut file)
        .finish(&mut df)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Default run label: short dataset hash plus a local timestamp.
pub fn default_run_label(result: &AnalysisResult) -> String {
    let hash = result.dataset_hash.get(..8).unwrap_or(&result.dataset_hash);
    format!("{hash}_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

/// Save the full artifact set under `{output_dir}/{label}/`:
/// - `manifest.json`: the full `AnalysisResult`
/// - `statistics.csv`: long-form statistics
/// - `expected_move.csv`: per-lookback expected-move summaries
/// - `levels.csv` (and `levels.parquet` when `parquet`): the wide level table
/// - `report.md`: Markdown report
///
/// Returns the path to the created directory.
pub fn save_artifacts(
    analysis: &Analysis,
    output_dir: &Path,
    label: &str,
    parquet: bool,
) -> Result<PathBuf> {
    let run_dir = output_dir.join(label);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let result = &analysis.result;
    std::fs::write(run_dir.join("manifest.json"), export_json(result)?)?;
    std::fs::write(
        run_dir.join("statistics.csv"),
        export_statistics_csv(&result.statistics)?,
    )?;
    std::fs::write(
        run_dir.join("expected_move.csv"),
        export_expected_move_csv(&result.expected_move)?,
    )?;
    write_level_table_csv(&analysis.table, &run_dir.join("levels.csv"))?;
    if parquet {
        write_level_table_parquet(&analysis.table, &run_dir.join("levels.parquet"))?;
    }
    std::fs::write(run_dir.join("report.md"), generate_report(result))?;

    tracing::info!(dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

/// Load an `AnalysisResult` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<AnalysisResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

fn md_value(value: StatValue) -> String {
    match value {
        StatValue::Count(n) => n.to_string(),
        StatValue::Mean(Some(m)) => format!("{m:.2}"),
        StatValue::Mean(None) => "n/a".to_string(),
    }
}

/// Generate a Markdown report for one analysis run.
pub fn generate_report(result: &AnalysisResult) -> String {
    let mut md = String::with_capacity(4096);

    md.push_str("# Pivot Level Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Period | {} to {} |\n",
        result.start_date, result.end_date
    ));
    md.push_str(&format!("| Bars | {} |\n", result.bar_count));
    let methods: Vec<String> = result.methods.iter().map(|m| m.label()).collect();
    md.push_str(&format!("| Methods | {} |\n", methods.join(", ")));
    md.push_str(&format!(
        "| Skew | {} |\n",
        if result.skew { "on" } else { "off" }
    ));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    if result.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    for stats in &result.statistics {
        md.push_str(&format!(
            "## {} ({})\n\n",
            stats.method.label(),
            stats.scope_label()
        ));
        for table in stats.tables() {
            md.push_str(&format!("### {}\n\n", table.kind.title()));
            md.push_str("| Statistic | Value | % |\n");
            md.push_str("| --- | ---: | ---: |\n");
            for row in &table.rows {
                let pct = row
                    .percentage
                    .map(|p| format!("{p:.1}%"))
                    .unwrap_or_default();
                md.push_str(&format!(
                    "| {} | {} | {} |\n",
                    row.label,
                    md_value(row.value),
                    pct
                ));
            }
            md.push('\n');
        }
    }

    if !result.expected_move.is_empty() {
        md.push_str("## Expected Move\n\n");
        md.push_str("| Lookback | Days | Mean EMH | Mean EML | Mean Range | Min | Max | Range % Open |\n");
        md.push_str("| ---: | ---: | ---: | ---: | ---: | ---: | ---: | ---: |\n");
        let cell = |v: Option<f64>| v.map(|x| format!("{x:.2}")).unwrap_or_else(|| "n/a".into());
        for s in &result.expected_move {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
                s.lookback,
                s.days_defined,
                cell(s.mean_emh),
                cell(s.mean_eml),
                cell(s.mean_range),
                cell(s.min_range),
                cell(s.max_range),
                cell(s.mean_range_pct_of_open),
            ));
        }
        md.push('\n');
    }

    let q = &result.quality;
    md.push_str("## Data Quality\n\n");
    md.push_str(&format!(
        "- Up days: {} ({:.1}%), down days: {}\n",
        q.up_days, q.up_pct, q.down_days
    ));
    md.push_str(&format!("- Mean daily range: {:.2}\n", q.mean_range));
    md.push_str(&format!("- Prices off the 0.25 tick: {}\n", q.off_tick_prices));
    md.push_str(&format!("- Largest calendar gap: {} days\n", q.max_gap_days));
    if let Some(rejected) = q.rejected_rows {
        md.push_str(&format!("- Rejected input rows: {rejected}\n"));
    }
    if let Some(dups) = q.duplicates_dropped {
        md.push_str(&format!("- Duplicate dates dropped: {dups}\n"));
    }
    if let Some(r) = &q.returns {
        md.push_str(&format!(
            "- Daily returns: mean {:.4}%, median {:.4}%, std {:.4}%, min {:.2}%, max {:.2}%\n",
            r.mean, r.median, r.std_dev, r.min, r.max
        ));
        let pcts: Vec<String> = r
            .percentiles
            .iter()
            .map(|(p, v)| format!("p{p} {v:.2}%"))
            .collect();
        md.push_str(&format!("- Return percentiles: {}\n", pcts.join(", ")));
        md.push_str(&format!(
            "- Return outliers (|z| > {OUTLIER_Z}): {}\n",
            r.outliers.len()
        ));
        for o in &r.outliers {
            md.push_str(&format!(
                "  - {}: {:.2}% (z {:.2}, close {:.2})\n",
                o.date, o.ret, o.z, o.close
            ));
        }
    }
    for warn in &result.warnings {
        md.push_str(&format!("- WARNING: {warn}\n"));
    }
    md.push('\n');

    md
}
