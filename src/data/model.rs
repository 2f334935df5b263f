use std::fmt;

// ---------------------------------------------------------------------------
// ColumnKind – semantic type inferred for a column
// ---------------------------------------------------------------------------

/// Semantic type of a column, decided once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Numeric,
    /// Low-cardinality strings.
    Categorical,
    /// Free-form strings, or a column with no values at all.
    Text,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
            ColumnKind::Text => write!(f, "text"),
        }
    }
}

// ---------------------------------------------------------------------------
// Column – one named, typed column
// ---------------------------------------------------------------------------

/// Cell storage. `None` marks a null.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Strings(Vec<Option<String>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Strings(v) => v.len(),
        }
    }

    pub fn null_count(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnValues::Strings(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }

    fn select(&self, rows: &[usize]) -> ColumnValues {
        match self {
            ColumnValues::Numeric(v) => ColumnValues::Numeric(rows.iter().map(|&r| v[r]).collect()),
            ColumnValues::Strings(v) => {
                ColumnValues::Strings(rows.iter().map(|&r| v[r].clone()).collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: ColumnValues,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Column {
            name: name.into(),
            kind: ColumnKind::Numeric,
            values: ColumnValues::Numeric(values),
        }
    }

    pub fn strings(name: impl Into<String>, kind: ColumnKind, values: Vec<Option<String>>) -> Self {
        debug_assert!(kind != ColumnKind::Numeric, "string storage with numeric kind");
        Column {
            name: name.into(),
            kind,
            values: ColumnValues::Strings(values),
        }
    }

    /// Numeric cells, or `None` for non-numeric columns.
    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match &self.values {
            ColumnValues::Numeric(v) => Some(v),
            ColumnValues::Strings(_) => None,
        }
    }

    #[cfg(test)]
    pub fn as_strings(&self) -> Option<&[Option<String>]> {
        match &self.values {
            ColumnValues::Strings(v) => Some(v),
            ColumnValues::Numeric(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Numeric
    }

    pub fn null_count(&self) -> usize {
        self.values.null_count()
    }

    /// Non-null numeric values in row order (empty for non-numeric columns).
    pub fn valid_numbers(&self) -> Vec<f64> {
        self.as_numeric()
            .map(|v| v.iter().flatten().copied().collect())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// An ordered set of equally long columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Display name, usually the source file stem.
    pub name: String,
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Build a dataset; every column must have `row_count` cells.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self, String> {
        let row_count = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.values.len() != row_count) {
            return Err(format!(
                "column '{}' has {} rows, expected {row_count}",
                bad.name,
                bad.values.len()
            ));
        }
        Ok(Dataset {
            name: name.into(),
            columns,
            row_count,
        })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[cfg(test)]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_numeric())
    }

    /// Replace every column through `f`, keeping names and order.
    pub fn map_columns(&self, mut f: impl FnMut(&Column) -> Column) -> Dataset {
        Dataset {
            name: self.name.clone(),
            columns: self.columns.iter().map(&mut f).collect(),
            row_count: self.row_count,
        }
    }

    /// A new dataset holding only `rows`, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Dataset {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                kind: c.kind,
                values: c.values.select(rows),
            })
            .collect();
        Dataset {
            name: self.name.clone(),
            columns,
            row_count: rows.len(),
        }
    }
}
