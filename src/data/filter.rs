use super::model::Dataset;

// ---------------------------------------------------------------------------
// Row predicates: which rows survive a set of per-column masks
// ---------------------------------------------------------------------------

/// One keep/drop flag per row, produced for a single column.
pub type RowMask = Vec<bool>;

/// Return indices of rows that pass every mask.
///
/// A row passes when each mask has `true` at its index. With no masks every
/// row passes.
pub fn passing_indices(masks: &[RowMask], row_count: usize) -> Vec<usize> {
    debug_assert!(masks.iter().all(|m| m.len() == row_count));
    (0..row_count)
        .filter(|&row| masks.iter().all(|mask| mask[row]))
        .collect()
}

/// Keep only the rows that pass every mask.
pub fn retain_rows(dataset: &Dataset, masks: &[RowMask]) -> Dataset {
    let keep = passing_indices(masks, dataset.row_count());
    dataset.select_rows(&keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    #[test]
    fn no_masks_keeps_everything() {
        assert_eq!(passing_indices(&[], 3), vec![0, 1, 2]);
    }

    #[test]
    fn row_must_pass_all_masks() {
        let masks = vec![vec![true, false, true, true], vec![true, true, false, true]];
        assert_eq!(passing_indices(&masks, 4), vec![0, 3]);
    }

    #[test]
    fn retain_rows_selects_cells() {
        let ds = Dataset::new(
            "t",
            vec![Column::numeric("x", vec![Some(1.0), Some(2.0), Some(3.0)])],
        )
        .unwrap();
        let kept = retain_rows(&ds, &[vec![false, true, true]]);
        assert_eq!(kept.column("x").unwrap().as_numeric().unwrap(), &[Some(2.0), Some(3.0)]);
    }
}
