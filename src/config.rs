use std::fmt;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// How a column whose standardized score is undefined (zero variance) is
/// treated by the removal and reporting steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroVariancePolicy {
    /// The column never marks a value as an outlier.
    #[default]
    NeverOutlier,
    /// Every non-null value of the column counts as an outlier.
    AlwaysOutlier,
}

/// Which copy of the data the outlier detector counts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierSource {
    /// Mean-imputed data, before outlier rows are removed.
    #[default]
    Imputed,
    /// Data after outlier rows were removed.
    Cleaned,
}

/// Pixel sizes for the rendered charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub histogram_width: u32,
    pub histogram_height: u32,
    pub heatmap_size: u32,
    pub pair_cell_size: u32,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            histogram_width: 800,
            histogram_height: 500,
            heatmap_size: 800,
            pair_cell_size: 250,
        }
    }
}

// ---------------------------------------------------------------------------
// AnalysisConfig
// ---------------------------------------------------------------------------

/// Everything a run can be tuned with. Missing JSON fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Rows with any numeric |z| at or above this value are removed.
    pub removal_z_threshold: f64,
    /// Values with z strictly above this value are counted as outliers.
    pub report_z_threshold: f64,
    pub zero_variance: ZeroVariancePolicy,
    pub outlier_source: OutlierSource,
    /// Limit the pairwise grid to the first N numeric columns; `null` draws
    /// every numeric column, still bounded by the chart pixel limit.
    pub pairplot_max_columns: Option<usize>,
    pub credential_var: String,
    pub strict_credential_check: bool,
    /// Known output directories; a dataset whose name is contained in one of
    /// them writes there instead of a directory named after itself.
    pub output_aliases: Vec<String>,
    pub report_file: String,
    pub chart: ChartSettings,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            removal_z_threshold: 3.0,
            report_z_threshold: 3.0,
            zero_variance: ZeroVariancePolicy::default(),
            outlier_source: OutlierSource::default(),
            pairplot_max_columns: Some(3),
            credential_var: "AIPROXY_TOKEN".to_string(),
            strict_credential_check: false,
            output_aliases: vec![
                "goodreads".to_string(),
                "happiness".to_string(),
                "media".to_string(),
            ],
            report_file: "README.md".to_string(),
            chart: ChartSettings::default(),
        }
    }
}

impl AnalysisConfig {
    /// Read a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AnalysisError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&text).map_err(|message| AnalysisError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_json(text: &str) -> std::result::Result<Self, String> {
        let config: AnalysisConfig = serde_json::from_str(text).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if !(self.removal_z_threshold.is_finite() && self.removal_z_threshold > 0.0) {
            return Err("removal_z_threshold must be a positive number".into());
        }
        if !(self.report_z_threshold.is_finite() && self.report_z_threshold > 0.0) {
            return Err("report_z_threshold must be a positive number".into());
        }
        if self.report_file.is_empty() || self.report_file.contains(['/', '\\']) {
            return Err("report_file must be a plain file name".into());
        }
        if self.pairplot_max_columns == Some(0) {
            return Err("pairplot_max_columns must be at least 1".into());
        }
        Ok(())
    }

    /// Output directory for `dataset_name` under `root`.
    ///
    /// A configured alias containing the dataset name wins; otherwise the
    /// directory is named after the dataset, or `output` for an empty name.
    pub fn output_dir(&self, root: &Path, dataset_name: &str) -> PathBuf {
        let name = self
            .output_aliases
            .iter()
            .find(|alias| !dataset_name.is_empty() && alias.contains(dataset_name))
            .map(String::as_str)
            .unwrap_or(if dataset_name.is_empty() { "output" } else { dataset_name });
        root.join(name)
    }
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// API token resolved once at start-up and handed to the run explicitly.
#[derive(Clone, Default)]
pub struct Credential(Option<String>);

impl Credential {
    pub fn new(token: Option<String>) -> Self {
        Credential(token.filter(|t| !t.is_empty()))
    }

    /// Read the configured variable from the environment.
    ///
    /// With `strict_credential_check` a missing value is an error; otherwise
    /// it is logged and the run continues without one.
    pub fn resolve(config: &AnalysisConfig) -> Result<Self> {
        let credential = Credential::new(std::env::var(&config.credential_var).ok());
        if !credential.is_present() {
            if config.strict_credential_check {
                return Err(AnalysisError::MissingCredential(config.credential_var.clone()));
            }
            warn!("{} is not set; continuing without a credential", config.credential_var);
        }
        Ok(credential)
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => write!(f, "Credential(<redacted>)"),
            None => write!(f, "Credential(<none>)"),
        }
    }
}
