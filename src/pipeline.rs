use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::{AnalysisConfig, Credential, OutlierSource};
use crate::data::loader::load_csv;
use crate::data::model::{ColumnKind, Dataset};
use crate::error::{AnalysisError, Result};
use crate::outliers::{detect_outliers, OutlierReport};
use crate::preprocess::{impute, remove_outliers, summarize_missing, MissingValueReport};
use crate::render::{ChartArtifact, ChartFailure, Visualizer};
use crate::report;
use crate::stats::CorrelationMatrix;
use crate::summary::{summarize, ColumnSummary};

// ---------------------------------------------------------------------------
// Analysis results
// ---------------------------------------------------------------------------

/// Everything computed from one dataset, before anything touches the disk.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub dataset_name: String,
    pub rows_loaded: usize,
    /// Column names and inferred kinds of the raw dataset.
    pub columns: Vec<(String, ColumnKind)>,
    /// Null counts of the raw dataset.
    pub missing: MissingValueReport,
    /// Imputed dataset with outlier rows removed.
    pub cleaned: Dataset,
    pub outliers: OutlierReport,
    /// Threshold the outlier counts were taken at.
    pub outlier_threshold: f64,
    /// Computed over `cleaned`.
    pub correlation: CorrelationMatrix,
    /// Computed over `cleaned`.
    pub summaries: Vec<ColumnSummary>,
}

impl AnalysisRun {
    pub fn compute(raw: &Dataset, config: &AnalysisConfig) -> Self {
        let missing = summarize_missing(raw);
        debug!("{} missing values in '{}'", missing.total(), raw.name);

        let imputed = impute(raw);
        let cleaned = remove_outliers(&imputed, config.removal_z_threshold, config.zero_variance);

        let outlier_input = match config.outlier_source {
            OutlierSource::Imputed => &imputed,
            OutlierSource::Cleaned => &cleaned,
        };
        let outliers =
            detect_outliers(outlier_input, config.report_z_threshold, config.zero_variance);

        AnalysisRun {
            dataset_name: raw.name.clone(),
            rows_loaded: raw.row_count(),
            columns: raw.columns().iter().map(|c| (c.name.clone(), c.kind)).collect(),
            missing,
            correlation: CorrelationMatrix::compute(&cleaned),
            summaries: summarize(&cleaned),
            outliers,
            outlier_threshold: config.report_z_threshold,
            cleaned,
        }
    }

    pub fn rows_after_cleaning(&self) -> usize {
        self.cleaned.row_count()
    }
}

/// Files produced by one run.
#[derive(Debug, Clone)]
pub struct AnalysisArtifacts {
    pub output_dir: PathBuf,
    pub charts: Vec<ChartArtifact>,
    pub failures: Vec<ChartFailure>,
    pub report: PathBuf,
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Load `dataset_path`, analyse it and write charts plus the report into
/// `output_dir`.
///
/// Loading and report writing are fatal; chart failures are collected in the
/// returned artifacts.
pub fn run(
    dataset_path: &Path,
    output_dir: &Path,
    config: &AnalysisConfig,
    credential: &Credential,
) -> Result<AnalysisArtifacts> {
    debug!("credential present: {}", credential.is_present());

    let raw = load_csv(dataset_path)?;
    fs::create_dir_all(output_dir).map_err(|e| AnalysisError::write(output_dir, e))?;

    let analysis = AnalysisRun::compute(&raw, config);
    info!(
        "'{}': {} rows loaded, {} after cleaning",
        analysis.dataset_name,
        analysis.rows_loaded,
        analysis.rows_after_cleaning()
    );

    let rendered = Visualizer::new(config).render_all(
        &analysis.cleaned,
        &analysis.correlation,
        &analysis.missing,
        output_dir,
    );
    if !rendered.failures.is_empty() {
        info!("{} chart(s) could not be rendered", rendered.failures.len());
    }

    let markdown = report::render_markdown(&analysis, &rendered);
    let report = report::write_report(output_dir, &config.report_file, &markdown)?;
    info!("report written to {}", report.display());

    Ok(AnalysisArtifacts {
        output_dir: output_dir.to_path_buf(),
        charts: rendered.charts,
        failures: rendered.failures,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChartSettings, ZeroVariancePolicy};
    use crate::data::loader::parse_csv_bytes;
    use crate::render::ChartKind;
    use std::fmt::Write as _;

    fn small_config() -> AnalysisConfig {
        AnalysisConfig {
            chart: ChartSettings {
                histogram_width: 240,
                histogram_height: 160,
                heatmap_size: 240,
                pair_cell_size: 60,
            },
            ..AnalysisConfig::default()
        }
    }

    fn write_csv(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    /// 100 rows of three smooth, bounded numeric columns.
    fn well_behaved_csv() -> String {
        let mut text = String::from("a,b,c\n");
        for i in 0..100 {
            let t = i as f64 / 10.0;
            writeln!(text, "{},{:.4},{:.4}", i, t.sin(), (i % 7) as f64 * 1.5).unwrap();
        }
        text
    }

    /// 100 rows with a single extreme value in `x`.
    fn extreme_value_csv() -> String {
        let mut text = String::from("x,y\n");
        for i in 0..100 {
            let x = if i == 42 { 1000.0 } else { (i % 10) as f64 };
            writeln!(text, "{x},{}", (i % 13) as f64).unwrap();
        }
        text
    }

    #[test]
    fn clean_numeric_dataset_produces_every_numeric_chart() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "clean.csv", &well_behaved_csv());
        let out = dir.path().join("clean");

        let artifacts = run(&path, &out, &small_config(), &Credential::default()).unwrap();
        let markdown = fs::read_to_string(&artifacts.report).unwrap();
        assert!(markdown.contains("- Rows after cleaning: 100"));

        assert_eq!(artifacts.charts.len(), 5);
        let kinds: Vec<&ChartKind> = artifacts.charts.iter().map(|c| &c.kind).collect();
        let histograms = kinds
            .iter()
            .filter(|k| matches!(k, ChartKind::Distribution(_)))
            .count();
        assert_eq!(histograms, 3);
        assert!(kinds.contains(&&ChartKind::CorrelationHeatmap));
        assert!(kinds.contains(&&ChartKind::PairGrid));
        assert!(!kinds.contains(&&ChartKind::MissingValues));
        assert!(artifacts.failures.is_empty());
        for chart in &artifacts.charts {
            assert!(chart.path.exists(), "{}", chart.path.display());
        }

        assert!(markdown.contains("| a | 0 |"));
        assert!(markdown.contains("| b | 0 |"));
        assert!(markdown.contains("| c | 0 |"));
    }

    #[test]
    fn clean_numeric_dataset_keeps_every_row() {
        let raw = parse_csv_bytes("clean", well_behaved_csv().as_bytes()).unwrap();
        let analysis = AnalysisRun::compute(&raw, &AnalysisConfig::default());
        assert_eq!(analysis.rows_after_cleaning(), 100);
        assert!(analysis.outliers.entries().iter().all(|(_, n)| *n == 0));
        assert!(!analysis.missing.has_missing());
    }

    #[test]
    fn extreme_value_is_removed_but_still_counted() {
        let raw = parse_csv_bytes("extreme", extreme_value_csv().as_bytes()).unwrap();
        let analysis = AnalysisRun::compute(&raw, &AnalysisConfig::default());

        assert_eq!(analysis.rows_loaded, 100);
        assert_eq!(analysis.rows_after_cleaning(), 99);
        assert_eq!(analysis.outliers.get("x"), Some(1));
        assert_eq!(analysis.outliers.get("y"), Some(0));

        let cleaned_source = AnalysisConfig {
            outlier_source: OutlierSource::Cleaned,
            ..AnalysisConfig::default()
        };
        let analysis = AnalysisRun::compute(&raw, &cleaned_source);
        assert_eq!(analysis.outliers.get("x"), Some(0));
    }

    #[test]
    fn missing_counts_precede_imputation() {
        let raw = parse_csv_bytes("gaps", b"a,b\n1,x\n,y\n3,\n4,x\n").unwrap();
        let analysis = AnalysisRun::compute(&raw, &AnalysisConfig::default());
        assert_eq!(analysis.missing.get("a"), Some(1));
        assert_eq!(analysis.missing.get("b"), Some(1));
        let a = analysis.cleaned.column("a").unwrap();
        assert_eq!(a.null_count(), 0);
    }

    #[test]
    fn text_only_dataset_skips_numeric_charts() {
        let dir = tempfile::tempdir().unwrap();
        let text = "name,comment\nann,hello there\nbob,good day\ncy,so long\n";
        let path = write_csv(dir.path(), "words.csv", text);
        let out = dir.path().join("words");

        let artifacts = run(&path, &out, &small_config(), &Credential::default()).unwrap();
        assert!(artifacts.charts.is_empty());
        assert!(artifacts.failures.is_empty());

        let markdown = fs::read_to_string(&artifacts.report).unwrap();
        assert!(markdown.contains("No numeric columns"));
        assert!(!out.join("correlation_heatmap.png").exists());
    }

    #[test]
    fn single_numeric_column_has_no_heatmap_or_pair_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "one.csv", "v,label\n1,a\n2,b\n3,a\n5,b\n8,a\n");
        let out = dir.path().join("one");

        let artifacts = run(&path, &out, &small_config(), &Credential::default()).unwrap();
        assert_eq!(artifacts.charts.len(), 1);
        assert!(!out.join("correlation_heatmap.png").exists());
        assert!(!out.join("pairplot.png").exists());
    }

    #[test]
    fn gaps_produce_missing_values_chart() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "gaps.csv", "a,b\n1,2\n,3\n4,\n6,7\n8,9\n");
        let out = dir.path().join("gaps");

        let artifacts = run(&path, &out, &small_config(), &Credential::default()).unwrap();
        assert!(artifacts.charts.iter().any(|c| c.kind == ChartKind::MissingValues));
        assert!(out.join("missing_values.png").exists());
    }

    #[test]
    fn rerun_produces_identical_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "again.csv", &extreme_value_csv());
        let out = dir.path().join("again");
        let config = small_config();

        let first = run(&path, &out, &config, &Credential::default()).unwrap();
        let before = fs::read_to_string(&first.report).unwrap();
        let second = run(&path, &out, &config, &Credential::default()).unwrap();
        let after = fs::read_to_string(&second.report).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn missing_dataset_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            &dir.path().join("nope.csv"),
            &dir.path().join("nope"),
            &small_config(),
            &Credential::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::DataLoad { .. }));
        assert!(!dir.path().join("nope").exists());
    }

    #[test]
    fn zero_variance_policy_reaches_both_stages() {
        let raw = parse_csv_bytes("flat", b"k,v\n5,1\n5,2\n5,3\n5,4\n").unwrap();
        let keep = AnalysisRun::compute(&raw, &AnalysisConfig::default());
        assert_eq!(keep.rows_after_cleaning(), 4);
        assert_eq!(keep.outliers.get("k"), Some(0));

        let strict = AnalysisConfig {
            zero_variance: ZeroVariancePolicy::AlwaysOutlier,
            ..AnalysisConfig::default()
        };
        let dropped = AnalysisRun::compute(&raw, &strict);
        assert_eq!(dropped.rows_after_cleaning(), 0);
        assert_eq!(dropped.outliers.get("k"), Some(4));
    }
}
