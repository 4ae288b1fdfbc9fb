//! End-to-end runner tests: config file → NinjaTrader files → statistics → artifacts.

use std::path::Path;

use pivotlab_core::{LevelMethod, RangeWindow};
use pivotlab_runner::export::{export_statistics_csv, load_artifacts};
use pivotlab_runner::{
    load_bars, run_analysis, run_single_analysis, save_artifacts, AnalysisConfig, LoadOptions,
    NullObserver,
};
use proptest::prelude::*;

const ONE_DAY: LevelMethod = LevelMethod::Range {
    window: RangeWindow::OneDay,
};

/// Two overlapping contract files. 2025-01-02 appears in both (first file wins)
/// and 2025-01-06 has high below low.
fn write_fixture(dir: &Path) {
    let data = dir.join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(
        data.join("NQ 03-25.Last.txt"),
        "20241230;100;110;100;105;1000\n\
         20241231;106;112;104;111;1200\n\
         20250102;108;113;103;104;900\n",
    )
    .unwrap();
    std::fs::write(
        data.join("NQ 06-25.Last.txt"),
        "20250102;200;210;190;205;50\n\
         20250103;104;105;101;102;800\n\
         20250106;104;100;105;102;700\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("pivotlab.toml"),
        format!(
            "[data]\npaths = [{:?}]\nformat = \"ninjatrader\"\n\n\
             [levels]\nrange_windows = [1]\nexpected_move_lookbacks = []\n\n\
             [stats]\nyear = 2025\nper_year = true\n",
            data.display().to_string()
        ),
    )
    .unwrap();
}

#[test]
fn config_file_drives_full_analysis() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let config = AnalysisConfig::from_file(&dir.path().join("pivotlab.toml")).unwrap();
    config.validate().unwrap();
    let analysis =
        run_single_analysis(&config, &LoadOptions::from_config(&config), &NullObserver).unwrap();
    let r = &analysis.result;

    assert_eq!(r.bar_count, 4);
    assert_eq!(r.start_date, "2024-12-30");
    assert_eq!(r.end_date, "2025-01-03");
    assert_eq!(r.quality.duplicates_dropped, Some(1));
    assert_eq!(r.quality.rejected_rows, Some(1));
    assert!(r.warnings.iter().any(|w| w.contains("market-logic")));
    assert_eq!(r.methods, vec![ONE_DAY]);
    assert!(r.expected_move.is_empty());

    // Scopes: all, 2024, 2025.
    assert_eq!(r.statistics.len(), 3);

    let all = &r.statistics_for(ONE_DAY, None).unwrap().tally;
    assert_eq!(all.total, 3);
    assert_eq!(all.touches_upper, 2);
    assert_eq!(all.touches_lower, 2);
    assert_eq!(all.touches_both, 1);
    assert_eq!(all.touches_upper_only, 1);
    assert_eq!(all.touches_lower_only, 1);
    assert_eq!(all.closes_below_upper, 2);
    assert_eq!(all.closes_at_or_above_upper, 1);
    assert_eq!(all.closes_above_lower, 1);
    assert_eq!(all.closes_at_or_below_lower, 2);
    assert_eq!(all.both_close_between, 1);
    assert_eq!(all.mean_points_above_upper(), Some(1.0));
    assert_eq!(all.mean_points_below_lower(), Some(1.0));
    assert_eq!(all.mean_close_points_above_upper(), Some(0.0));

    let y2024 = &r.statistics_for(ONE_DAY, Some(2024)).unwrap().tally;
    assert_eq!(y2024.total, 1);
    assert_eq!(y2024.touches_upper, 1);
    assert_eq!(y2024.touches_both, 0);
    assert_eq!(y2024.mean_close_points_above_upper(), None);

    let y2025 = &r.statistics_for(ONE_DAY, Some(2025)).unwrap().tally;
    assert_eq!(y2025.total, 2);
    assert_eq!(y2025.touches_lower, 2);
    assert_eq!(y2025.touches_upper_only, 0);
    assert_eq!(y2024.merge(y2025), *all);
}

#[test]
fn artifacts_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let config = AnalysisConfig::from_file(&dir.path().join("pivotlab.toml")).unwrap();
    let analysis =
        run_single_analysis(&config, &LoadOptions::from_config(&config), &NullObserver).unwrap();

    let out = dir.path().join("results");
    let run_dir = save_artifacts(&analysis, &out, "nq", false).unwrap();
    assert!(!run_dir.join("levels.parquet").exists());

    let loaded = load_artifacts(&run_dir).unwrap();
    assert_eq!(loaded.dataset_hash, analysis.result.dataset_hash);
    assert_eq!(loaded.statistics.len(), 3);

    let stats_csv = std::fs::read_to_string(run_dir.join("statistics.csv")).unwrap();
    assert!(stats_csv.contains("1D,2025,Touch summary,Touched Q4,2,100.0000"));
    assert!(stats_csv.contains("1D,2024,Both pivots touched,Mean close points above Q1,,"));

    let levels = std::fs::read_to_string(run_dir.join("levels.csv")).unwrap();
    let mut lines = levels.lines();
    let header: Vec<&str> = lines.next().unwrap().split(',').collect();
    let q1 = header.iter().position(|h| *h == "d1_q1").unwrap();
    let first: Vec<&str> = lines.next().unwrap().split(',').collect();
    let second: Vec<&str> = lines.next().unwrap().split(',').collect();
    assert_eq!(first[q1], "", "first bar has no prior day");
    assert_eq!(second[q1].parse::<f64>().unwrap(), 110.0);
}

#[test]
fn same_input_gives_same_hash_and_statistics() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let config = AnalysisConfig::from_file(&dir.path().join("pivotlab.toml")).unwrap();
    let opts = LoadOptions::from_config(&config);

    let a = run_single_analysis(&config, &opts, &NullObserver).unwrap().result;
    let b = run_single_analysis(&config, &opts, &NullObserver).unwrap().result;
    assert_eq!(a.dataset_hash, b.dataset_hash);
    assert_eq!(
        export_statistics_csv(&a.statistics).unwrap(),
        export_statistics_csv(&b.statistics).unwrap()
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn per_year_statistics_partition_full_history(seed in 0u64..1_000, bars in 260usize..800) {
        let data = load_bars(&LoadOptions {
            synthetic: Some(bars),
            seed,
            ..Default::default()
        })
        .unwrap();
        let mut config = AnalysisConfig::default();
        config.stats.per_year = true;
        let result = run_analysis(&data, &config, &NullObserver).unwrap().result;

        for method in &result.methods {
            let all = result.statistics_for(*method, None).unwrap().tally;
            let merged = result
                .statistics
                .iter()
                .filter(|s| s.method == *method && s.year.is_some())
                .fold(Default::default(), |acc: pivotlab_core::TouchTally, s| acc.merge(&s.tally));
            prop_assert_eq!(merged.total, all.total);
            prop_assert_eq!(merged.touches_both, all.touches_both);
            prop_assert_eq!(merged.closes_at_or_below_lower, all.closes_at_or_below_lower);
            prop_assert_eq!(merged.both_close_between, all.both_close_between);
        }
    }
}
