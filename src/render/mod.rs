//! Chart rendering with plotters onto in-memory rasters saved as PNG.
//!
//! ```text
//!   Dataset ──┬── distribution ──► <column>_distribution.png  (per numeric column)
//!             ├── heatmap ───────► correlation_heatmap.png    (≥ 2 numeric columns)
//!             ├── pair grid ─────► pairplot.png               (≥ 2 numeric columns)
//!   Missing ──┴── bar chart ─────► missing_values.png         (any nulls)
//! ```
//!
//! Each chart is attempted on its own; a failure is logged and recorded
//! without stopping the others.
pub mod charts;
pub mod raster;

use std::fmt;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::config::{AnalysisConfig, ChartSettings};
use crate::data::model::Dataset;
use crate::error::{AnalysisError, Result};
use crate::preprocess::MissingValueReport;
use crate::stats::CorrelationMatrix;
use raster::Raster;

// ---------------------------------------------------------------------------
// Chart identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartKind {
    Distribution(String),
    CorrelationHeatmap,
    PairGrid,
    MissingValues,
}

impl ChartKind {
    /// Deterministic output file name for this chart.
    pub fn file_name(&self) -> String {
        match self {
            ChartKind::Distribution(column) => format!("{}_distribution.png", sanitize(column)),
            ChartKind::CorrelationHeatmap => "correlation_heatmap.png".to_string(),
            ChartKind::PairGrid => "pairplot.png".to_string(),
            ChartKind::MissingValues => "missing_values.png".to_string(),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::Distribution(column) => write!(f, "Distribution of {column}"),
            ChartKind::CorrelationHeatmap => write!(f, "Correlation Heatmap"),
            ChartKind::PairGrid => write!(f, "Pairwise Relationships"),
            ChartKind::MissingValues => write!(f, "Missing Values"),
        }
    }
}

/// Keep file names portable: anything outside `[A-Za-z0-9._-]` becomes `_`.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "column".to_string()
    } else {
        cleaned
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// A chart written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartArtifact {
    pub kind: ChartKind,
    pub path: PathBuf,
}

/// A chart that could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartFailure {
    pub kind: ChartKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutcome {
    pub charts: Vec<ChartArtifact>,
    pub failures: Vec<ChartFailure>,
}

// ---------------------------------------------------------------------------
// Visualizer
// ---------------------------------------------------------------------------

pub struct Visualizer<'a> {
    settings: &'a ChartSettings,
    pairplot_max_columns: Option<usize>,
}

impl<'a> Visualizer<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Visualizer {
            settings: &config.chart,
            pairplot_max_columns: config.pairplot_max_columns,
        }
    }

    /// Render every chart that applies to `dataset` into `out_dir`.
    pub fn render_all(
        &self,
        dataset: &Dataset,
        correlation: &CorrelationMatrix,
        missing: &MissingValueReport,
        out_dir: &Path,
    ) -> RenderOutcome {
        let mut outcome = RenderOutcome::default();

        match numeric_series(dataset) {
            Ok(series) => {
                for (name, cells) in &series {
                    let values: Vec<f64> = cells.iter().flatten().copied().collect();
                    let kind = ChartKind::Distribution(name.clone());
                    self.attempt(&mut outcome, kind, out_dir, || {
                        charts::distribution(name, &values, self.settings)
                    });
                }

                if series.len() >= 2 {
                    self.attempt(&mut outcome, ChartKind::CorrelationHeatmap, out_dir, || {
                        charts::correlation_heatmap(correlation, self.settings)
                    });
                    let limit = self.pairplot_max_columns.unwrap_or(series.len());
                    let subset = &series[..limit.min(series.len())];
                    self.attempt(&mut outcome, ChartKind::PairGrid, out_dir, || {
                        charts::pair_grid(subset, self.settings)
                    });
                } else {
                    info!("fewer than two numeric columns; skipping heatmap and pair grid");
                }
            }
            Err(e) => info!("skipping numeric charts: {e}"),
        }

        if missing.has_missing() {
            self.attempt(&mut outcome, ChartKind::MissingValues, out_dir, || {
                charts::missing_values(missing, self.settings)
            });
        }

        outcome
    }

    fn attempt(
        &self,
        outcome: &mut RenderOutcome,
        kind: ChartKind,
        out_dir: &Path,
        draw: impl FnOnce() -> Result<Raster>,
    ) {
        let path = out_dir.join(kind.file_name());
        let result = draw().and_then(|raster| raster.save_png(&path, &kind.to_string()));
        match result {
            Ok(()) => {
                info!("wrote {}", path.display());
                outcome.charts.push(ChartArtifact { kind, path });
            }
            Err(e) => {
                warn!("{e}");
                outcome.failures.push(ChartFailure {
                    kind,
                    message: e.to_string(),
                });
            }
        }
    }
}

/// Numeric columns as `(name, cells)`, or `EmptyNumericData` when none exist.
fn numeric_series(dataset: &Dataset) -> Result<Vec<(String, Vec<Option<f64>>)>> {
    let series: Vec<(String, Vec<Option<f64>>)> = dataset
        .numeric_columns()
        .filter_map(|c| Some((c.name.clone(), c.as_numeric()?.to_vec())))
        .collect();
    if series.is_empty() {
        return Err(AnalysisError::EmptyNumericData(dataset.name.clone()));
    }
    Ok(series)
}
