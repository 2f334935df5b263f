//! Missing-value accounting, mean imputation and z-score row removal.
//!
//! Order matters: [`summarize_missing`] must see the raw dataset, and
//! [`remove_outliers`] should run on the output of [`impute`] so that nulls do
//! not leak into the scores.

use log::{debug, info};

use crate::config::ZeroVariancePolicy;
use crate::data::filter::{retain_rows, RowMask};
use crate::data::model::{Column, Dataset};
use crate::stats;

/// Null count per column, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingValueReport {
    entries: Vec<(String, usize)>,
}

impl MissingValueReport {
    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    #[cfg(test)]
    pub fn get(&self, column: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, n)| *n)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    pub fn has_missing(&self) -> bool {
        self.total() > 0
    }
}

pub fn summarize_missing(dataset: &Dataset) -> MissingValueReport {
    MissingValueReport {
        entries: dataset
            .columns()
            .iter()
            .map(|c| (c.name.clone(), c.null_count()))
            .collect(),
    }
}

/// Fill numeric nulls with the mean of the column's non-null values.
///
/// Non-numeric columns are returned untouched, nulls included.
pub fn impute(dataset: &Dataset) -> Dataset {
    dataset.map_columns(|column| {
        let Some(cells) = column.as_numeric() else {
            return column.clone();
        };
        let Some(fill) = stats::mean(&column.valid_numbers()) else {
            return column.clone();
        };
        let filled = cells.iter().filter(|c| c.is_none()).count();
        if filled > 0 {
            debug!("imputed {filled} values in '{}' with mean {fill}", column.name);
        }
        Column::numeric(
            column.name.clone(),
            cells.iter().map(|c| Some(c.unwrap_or(fill))).collect(),
        )
    })
}

/// Drop every row where some numeric column has |z| ≥ `threshold`.
///
/// A row survives only when all of its numeric scores are strictly below the
/// threshold. Null cells never cause removal. Columns with an undefined score
/// follow `zero_variance`.
pub fn remove_outliers(
    dataset: &Dataset,
    threshold: f64,
    zero_variance: ZeroVariancePolicy,
) -> Dataset {
    let masks: Vec<RowMask> = dataset
        .numeric_columns()
        .filter_map(|column| column.as_numeric())
        .map(|cells| match stats::z_scores(cells) {
            Some(z) => z.iter().map(|s| s.map_or(true, |s| s.abs() < threshold)).collect(),
            None => match zero_variance {
                ZeroVariancePolicy::NeverOutlier => vec![true; cells.len()],
                ZeroVariancePolicy::AlwaysOutlier => cells.iter().map(Option::is_none).collect(),
            },
        })
        .collect();

    let cleaned = retain_rows(dataset, &masks);
    info!(
        "outlier removal kept {} of {} rows (|z| < {threshold})",
        cleaned.row_count(),
        dataset.row_count()
    );
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ColumnKind;

    fn with_gaps() -> Dataset {
        Dataset::new(
            "gaps",
            vec![
                Column::numeric("a", vec![Some(1.0), None, Some(3.0)]),
                Column::strings("s", ColumnKind::Text, vec![None, Some("x".into()), None]),
            ],
        )
        .unwrap()
    }

    /// Nineteen values near 10 and one far out.
    fn spiked() -> Dataset {
        let mut x: Vec<Option<f64>> = (0..19).map(|i| Some(10.0 + (i % 3) as f64)).collect();
        x.push(Some(1000.0));
        let y: Vec<Option<f64>> = (0..20).map(|i| Some(i as f64)).collect();
        Dataset::new("spiked", vec![Column::numeric("x", x), Column::numeric("y", y)]).unwrap()
    }

    #[test]
    fn missing_counts_reflect_raw_data() {
        let raw = with_gaps();
        let report = summarize_missing(&raw);
        assert_eq!(report.get("a"), Some(1));
        assert_eq!(report.get("s"), Some(2));
        assert_eq!(report.total(), 3);
        assert!(report.has_missing());

        // counting after imputation would give a different answer
        let after = summarize_missing(&impute(&raw));
        assert_eq!(after.get("a"), Some(0));
        assert_eq!(report.get("a"), Some(1));
    }

    #[test]
    fn impute_fills_numeric_with_mean_only() {
        let filled = impute(&with_gaps());
        assert_eq!(
            filled.column("a").unwrap().as_numeric().unwrap(),
            &[Some(1.0), Some(2.0), Some(3.0)]
        );
        assert_eq!(filled.column("s").unwrap().null_count(), 2);
        assert!(filled.numeric_columns().all(|c| c.null_count() == 0));
    }

    #[test]
    fn remove_outliers_drops_extreme_row() {
        let cleaned = remove_outliers(&spiked(), 3.0, ZeroVariancePolicy::NeverOutlier);
        assert_eq!(cleaned.row_count(), 19);
        assert!(cleaned
            .column("x")
            .unwrap()
            .valid_numbers()
            .iter()
            .all(|v| *v < 100.0));
    }

    #[test]
    fn removal_is_two_sided() {
        let mut x: Vec<Option<f64>> = (0..19).map(|i| Some(10.0 + (i % 3) as f64)).collect();
        x.push(Some(-1000.0));
        let ds = Dataset::new("neg", vec![Column::numeric("x", x)]).unwrap();
        let cleaned = remove_outliers(&ds, 3.0, ZeroVariancePolicy::NeverOutlier);
        assert_eq!(cleaned.row_count(), 19);
    }

    #[test]
    fn zero_variance_policy() {
        let ds = Dataset::new(
            "flat",
            vec![
                Column::numeric("flat", vec![Some(5.0); 4]),
                Column::numeric("v", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
            ],
        )
        .unwrap();
        assert_eq!(
            remove_outliers(&ds, 3.0, ZeroVariancePolicy::NeverOutlier).row_count(),
            4
        );
        assert_eq!(
            remove_outliers(&ds, 3.0, ZeroVariancePolicy::AlwaysOutlier).row_count(),
            0
        );
    }

    #[test]
    fn no_numeric_columns_keeps_all_rows() {
        let ds = Dataset::new(
            "text",
            vec![Column::strings("s", ColumnKind::Text, vec![Some("a".into()), None])],
        )
        .unwrap();
        assert_eq!(remove_outliers(&ds, 3.0, ZeroVariancePolicy::NeverOutlier).row_count(), 2);
    }
}
