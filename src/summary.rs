use std::collections::HashMap;

use crate::data::model::{Column, ColumnKind, ColumnValues, Dataset};
use crate::stats;

/// Descriptive statistics for a numeric column. Undefined values are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

/// Counts for a categorical or text column.
#[derive(Debug, Clone, PartialEq)]
pub struct NonNumericSummary {
    pub name: String,
    pub kind: ColumnKind,
    pub count: usize,
    pub unique: usize,
    /// Most frequent value; ties go to the value seen first.
    pub top: Option<String>,
    pub freq: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSummary {
    Numeric(NumericSummary),
    NonNumeric(NonNumericSummary),
}

/// Summaries for every column, in column order.
pub fn summarize(dataset: &Dataset) -> Vec<ColumnSummary> {
    dataset.columns().iter().map(summarize_column).collect()
}

pub fn summarize_column(column: &Column) -> ColumnSummary {
    match &column.values {
        ColumnValues::Numeric(_) => ColumnSummary::Numeric(numeric_summary(column)),
        ColumnValues::Strings(cells) => ColumnSummary::NonNumeric(string_summary(column, cells)),
    }
}

fn numeric_summary(column: &Column) -> NumericSummary {
    let valid = column.valid_numbers();
    let sorted = stats::sorted(&valid);
    let q = |p: f64| stats::quantile_sorted(&sorted, p).unwrap_or(f64::NAN);

    NumericSummary {
        name: column.name.clone(),
        count: valid.len(),
        mean: stats::mean(&valid).unwrap_or(f64::NAN),
        std: stats::sample_std(&valid).unwrap_or(f64::NAN),
        min: q(0.0),
        q1: q(0.25),
        median: q(0.5),
        q3: q(0.75),
        max: q(1.0),
        skewness: stats::skewness(&valid).unwrap_or(f64::NAN),
        kurtosis: stats::kurtosis(&valid).unwrap_or(f64::NAN),
    }
}

fn string_summary(column: &Column, cells: &[Option<String>]) -> NonNumericSummary {
    // (first-seen order, count)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (order, value) in cells.iter().flatten().enumerate() {
        counts.entry(value.as_str()).or_insert((order, 0)).1 += 1;
    }

    let top = counts
        .iter()
        .max_by(|(_, (oa, ca)), (_, (ob, cb))| ca.cmp(cb).then(ob.cmp(oa)))
        .map(|(value, (_, count))| (value.to_string(), *count));

    NonNumericSummary {
        name: column.name.clone(),
        kind: column.kind,
        count: cells.iter().flatten().count(),
        unique: counts.len(),
        freq: top.as_ref().map(|t| t.1).unwrap_or(0),
        top: top.map(|t| t.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_summary_matches_describe() {
        let col = Column::numeric("x", vec![Some(1.0), Some(2.0), None, Some(3.0), Some(4.0)]);
        let ColumnSummary::Numeric(s) = summarize_column(&col) else {
            panic!("expected numeric summary");
        };
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, 2.5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.q1, 1.75);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.q3, 3.25);
        assert_eq!(s.max, 4.0);
        assert!((s.std - 1.290_994_448_735_805_6).abs() < 1e-12);
        assert!(s.skewness.abs() < 1e-12);
        assert!((s.kurtosis + 1.2).abs() < 1e-9);
    }

    #[test]
    fn empty_numeric_column_is_nan() {
        let col = Column::numeric("x", vec![]);
        let ColumnSummary::Numeric(s) = summarize_column(&col) else {
            panic!("expected numeric summary");
        };
        assert_eq!(s.count, 0);
        assert!(s.mean.is_nan() && s.std.is_nan() && s.max.is_nan());
    }

    #[test]
    fn string_summary_top_and_ties() {
        let col = Column::strings(
            "city",
            ColumnKind::Categorical,
            vec![
                Some("Oslo".into()),
                Some("Rome".into()),
                None,
                Some("Rome".into()),
                Some("Oslo".into()),
                Some("Lima".into()),
            ],
        );
        let ColumnSummary::NonNumeric(s) = summarize_column(&col) else {
            panic!("expected non-numeric summary");
        };
        assert_eq!(s.count, 5);
        assert_eq!(s.unique, 3);
        assert_eq!(s.top.as_deref(), Some("Oslo"));
        assert_eq!(s.freq, 2);
        assert_eq!(s.kind, ColumnKind::Categorical);
    }

    #[test]
    fn summarize_keeps_column_order() {
        let ds = Dataset::new(
            "d",
            vec![
                Column::strings("b", ColumnKind::Text, vec![None]),
                Column::numeric("a", vec![Some(1.0)]),
            ],
        )
        .unwrap();
        let summaries = summarize(&ds);
        assert_eq!(summaries.len(), 2);
        assert!(matches!(&summaries[0], ColumnSummary::NonNumeric(s) if s.name == "b"));
        assert!(matches!(&summaries[1], ColumnSummary::Numeric(s) if s.name == "a"));
    }
}
