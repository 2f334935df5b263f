use log::debug;

use crate::config::ZeroVariancePolicy;
use crate::data::model::Dataset;
use crate::stats;

/// Per numeric column, how many values sit above the reporting threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlierReport {
    entries: Vec<(String, usize)>,
}

impl OutlierReport {
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

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Count values with a standardized score strictly above `threshold`.
///
/// Only the upper tail is counted, unlike row removal which looks at |z|.
/// Nulls are not counted. Zero-variance columns count nothing under
/// `NeverOutlier` and every non-null value under `AlwaysOutlier`.
pub fn detect_outliers(
    dataset: &Dataset,
    threshold: f64,
    zero_variance: ZeroVariancePolicy,
) -> OutlierReport {
    let entries = dataset
        .numeric_columns()
        .filter_map(|column| Some((column.name.clone(), column.as_numeric()?)))
        .map(|(name, cells)| {
            let count = match stats::z_scores(cells) {
                Some(z) => z.iter().flatten().filter(|&&s| s > threshold).count(),
                None => match zero_variance {
                    ZeroVariancePolicy::NeverOutlier => 0,
                    ZeroVariancePolicy::AlwaysOutlier => cells.iter().flatten().count(),
                },
            };
            debug!("'{name}': {count} values with z > {threshold}");
            (name, count)
        })
        .collect();
    OutlierReport { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZeroVariancePolicy::NeverOutlier;
    use crate::data::model::{Column, ColumnKind};
    use crate::preprocess::remove_outliers;

    fn series(tail: f64) -> Vec<Option<f64>> {
        let mut v: Vec<Option<f64>> = (0..19).map(|i| Some(10.0 + (i % 3) as f64)).collect();
        v.push(Some(tail));
        v
    }

    #[test]
    fn counts_upper_tail_only() {
        let ds = Dataset::new(
            "t",
            vec![
                Column::numeric("high", series(1000.0)),
                Column::numeric("low", series(-1000.0)),
                Column::strings("s", ColumnKind::Text, vec![Some("a".into()); 20]),
            ],
        )
        .unwrap();
        let report = detect_outliers(&ds, 3.0, NeverOutlier);
        assert_eq!(report.get("high"), Some(1));
        assert_eq!(report.get("low"), Some(0));
        assert_eq!(report.get("s"), None);
        assert_eq!(report.entries().len(), 2);
    }

    #[test]
    fn detector_on_uncleaned_copy_still_sees_removed_value() {
        let ds = Dataset::new("t", vec![Column::numeric("x", series(1000.0))]).unwrap();
        let cleaned = remove_outliers(&ds, 3.0, NeverOutlier);
        assert_eq!(cleaned.row_count(), 19);
        assert_eq!(detect_outliers(&ds, 3.0, NeverOutlier).get("x"), Some(1));
        assert_eq!(detect_outliers(&cleaned, 3.0, NeverOutlier).get("x"), Some(0));
    }

    #[test]
    fn counts_are_bounded_by_rows() {
        let ds = Dataset::new("t", vec![Column::numeric("x", vec![Some(4.0); 6])]).unwrap();
        for policy in [NeverOutlier, ZeroVariancePolicy::AlwaysOutlier] {
            let n = detect_outliers(&ds, 3.0, policy).get("x").unwrap();
            assert!(n <= ds.row_count());
        }
        assert_eq!(
            detect_outliers(&ds, 3.0, ZeroVariancePolicy::AlwaysOutlier).get("x"),
            Some(6)
        );
    }

    #[test]
    fn threshold_is_strict() {
        // sample sd of [-1, 1] is sqrt(2), so the scores are ±1/sqrt(2)
        let ds =
            Dataset::new("t", vec![Column::numeric("x", vec![Some(-1.0), Some(1.0)])]).unwrap();
        let z = 1.0 / 2f64.sqrt();
        assert_eq!(detect_outliers(&ds, z, NeverOutlier).get("x"), Some(0));
        assert_eq!(detect_outliers(&ds, z - 1e-9, NeverOutlier).get("x"), Some(1));
    }
}
