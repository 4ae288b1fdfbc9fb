//! PivotLab CLI: pivot-level statistics over daily futures bars.
//!
//! Commands:
//! - `run`: derive levels, classify every day and report touch/close statistics
//! - `check`: load and consolidate input files, print a data-quality report
//! - `consolidate`: merge input files into one clean `Date,Open,High,Low,Close,Volume` CSV

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use pivotlab_core::data::quality::OUTLIER_Z;
use pivotlab_core::data::{load_series, DataFormat, QualityReport};
use pivotlab_core::stats::StatValue;
use pivotlab_core::RangeWindow;
use pivotlab_runner::export::export_bars_csv;
use pivotlab_runner::{
    default_run_label, run_single_analysis, save_artifacts, AnalysisConfig, AnalysisResult,
    LoadOptions, TracingObserver,
};

#[derive(Parser)]
#[command(
    name = "pivotlab",
    about = "PivotLab CLI: pivot-level touch and close statistics for daily bars"
)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Auto,
    Csv,
    Ninjatrader,
}

impl From<FormatArg> for DataFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Auto => DataFormat::Auto,
            FormatArg::Csv => DataFormat::Csv,
            FormatArg::Ninjatrader => DataFormat::NinjaTrader,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Derive levels and report statistics. Flags override the config file.
    Run {
        /// Input files or directories.
        inputs: Vec<PathBuf>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Input layout.
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Range windows in days (1 or 3). Repeatable.
        #[arg(long = "window")]
        windows: Vec<usize>,

        /// Expected-move lookbacks. Repeatable.
        #[arg(long = "em-lookback")]
        em_lookbacks: Vec<usize>,

        /// Skip skew levels on expected-move bands.
        #[arg(long, default_value_t = false)]
        no_skew: bool,

        /// Also report statistics for this calendar year.
        #[arg(long)]
        year: Option<i32>,

        /// Also report statistics for every calendar year present.
        #[arg(long, default_value_t = false)]
        per_year: bool,

        /// Generate this many synthetic bars instead of reading input.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for --synthetic.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Output directory for artifacts.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Artifact directory name. Defaults to `{hash}_{timestamp}`.
        #[arg(long)]
        label: Option<String>,

        /// Also write the level table as Parquet.
        #[arg(long, default_value_t = false)]
        parquet: bool,
    },
    /// Print a data-quality report for the input.
    Check {
        /// Input files or directories.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[arg(long, value_enum, default_value = "auto")]
        format: FormatArg,
    },
    /// Merge input files into one clean CSV.
    Consolidate {
        /// Input files or directories.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[arg(long, value_enum, default_value = "auto")]
        format: FormatArg,

        /// Output CSV path.
        #[arg(long, short)]
        output: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            inputs,
            config,
            format,
            windows,
            em_lookbacks,
            no_skew,
            year,
            per_year,
            synthetic,
            seed,
            output_dir,
            label,
            parquet,
        } => {
            let mut cfg = match config {
                Some(path) => AnalysisConfig::from_file(&path)?,
                None => AnalysisConfig::default(),
            };
            if !inputs.is_empty() {
                cfg.data.paths = inputs;
            }
            if let Some(format) = format {
                cfg.data.format = format.into();
            }
            if !windows.is_empty() {
                cfg.levels.range_windows = windows
                    .into_iter()
                    .map(RangeWindow::try_from)
                    .collect::<Result<_, _>>()
                    .map_err(anyhow::Error::msg)?;
            }
            if !em_lookbacks.is_empty() {
                cfg.levels.expected_move_lookbacks = em_lookbacks;
            }
            if no_skew {
                cfg.levels.skew = false;
            }
            if year.is_some() {
                cfg.stats.year = year;
            }
            cfg.stats.per_year |= per_year;
            if let Some(dir) = output_dir {
                cfg.output.dir = dir;
            }
            cfg.output.parquet |= parquet;

            if synthetic.is_none() {
                cfg.validate()?;
            }
            let opts = LoadOptions {
                synthetic,
                seed,
                ..LoadOptions::from_config(&cfg)
            };
            run_cmd(&cfg, &opts, label)
        }
        Commands::Check { inputs, format } => check_cmd(&inputs, format.into()),
        Commands::Consolidate {
            inputs,
            format,
            output,
        } => consolidate_cmd(&inputs, format.into(), &output),
    }
}

fn run_cmd(config: &AnalysisConfig, opts: &LoadOptions, label: Option<String>) -> Result<()> {
    let analysis = run_single_analysis(config, opts, &TracingObserver)?;

    print_summary(&analysis.result);

    let label = label.unwrap_or_else(|| default_run_label(&analysis.result));
    let run_dir = save_artifacts(&analysis, &config.output.dir, &label, config.output.parquet)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn check_cmd(inputs: &[PathBuf], format: DataFormat) -> Result<()> {
    let consolidated = load_series(inputs, format)?;
    let q = QualityReport::from_consolidated(&consolidated);

    println!("Bars:        {}", q.bars);
    println!("Period:      {} to {}", q.first_date, q.last_date);
    if let (Some(rows), Some(dups), Some(rejected)) =
        (q.input_rows, q.duplicates_dropped, q.rejected_rows)
    {
        println!("Input rows:  {rows} ({dups} duplicate dates, {rejected} rejected)");
    }
    println!(
        "Up / down:   {} / {} ({:.1}% up)",
        q.up_days, q.down_days, q.up_pct
    );
    println!("Mean range:  {:.2}", q.mean_range);
    println!("Off-tick:    {} prices", q.off_tick_prices);
    println!("Max gap:     {} days", q.max_gap_days);
    println!();
    println!("{:<6} {:>6}", "Year", "Bars");
    println!("{}", "-".repeat(13));
    for (year, bars) in &q.bars_per_year {
        println!("{:<6} {:>6}", year, bars);
    }

    if let Some(r) = &q.returns {
        println!();
        println!("Daily returns ({} days, %)", r.count);
        println!(
            "  mean {:.4}  median {:.4}  std {:.4}  min {:.4}  max {:.4}",
            r.mean, r.median, r.std_dev, r.min, r.max
        );
        for (p, value) in &r.percentiles {
            println!("  p{:<3} {:>8.2}", p, value);
        }
        println!("Outliers (|z| > {OUTLIER_Z}): {}", r.outliers.len());
        for o in &r.outliers {
            println!(
                "  {}  return {:>7.2}%  z {:>5.2}  close {:.2}",
                o.date, o.ret, o.z, o.close
            );
        }
    }

    Ok(())
}

fn consolidate_cmd(inputs: &[PathBuf], format: DataFormat, output: &Path) -> Result<()> {
    let consolidated = load_series(inputs, format)?;
    let csv = export_bars_csv(&consolidated.series)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(output, csv).with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "Wrote {} bars to {} ({} duplicates dropped, {} rows rejected)",
        consolidated.series.len(),
        output.display(),
        consolidated.duplicates_dropped,
        consolidated.rejected.len()
    );
    Ok(())
}

fn print_summary(result: &AnalysisResult) {
    println!();
    println!(
        "=== {} bars, {} to {}{} ===",
        result.bar_count,
        result.start_date,
        result.end_date,
        if result.has_synthetic { " [SYNTHETIC]" } else { "" }
    );

    for stats in &result.statistics {
        println!();
        println!("--- {} ({}) ---", stats.method.label(), stats.scope_label());
        for table in stats.tables() {
            println!("{}", table.kind.title());
            for row in &table.rows {
                let value = match row.value {
                    StatValue::Count(n) => n.to_string(),
                    StatValue::Mean(Some(m)) => format!("{m:.2}"),
                    StatValue::Mean(None) => "n/a".to_string(),
                };
                let pct = row
                    .percentage
                    .map(|p| format!("{p:>6.1}%"))
                    .unwrap_or_default();
                println!("  {:<28} {:>8} {}", row.label, value, pct);
            }
        }
    }

    if !result.expected_move.is_empty() {
        println!();
        println!(
            "{:<6} {:>6} {:>10} {:>10} {:>10}",
            "EM", "Days", "Mean EMH", "Mean EML", "Range"
        );
        println!("{}", "-".repeat(46));
        for s in &result.expected_move {
            let cell = |v: Option<f64>| v.map(|x| format!("{x:.2}")).unwrap_or_else(|| "n/a".into());
            println!(
                "{:<6} {:>6} {:>10} {:>10} {:>10}",
                s.lookback,
                s.days_defined,
                cell(s.mean_emh),
                cell(s.mean_eml),
                cell(s.mean_range)
            );
        }
    }

    for warn in &result.warnings {
        println!("WARNING: {warn}");
    }
    println!();
}
