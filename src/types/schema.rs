//! Column metadata shared by every row of one result cursor.

use crate::types::SqlType;

/// Column metadata from a result stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Column name
    pub name: String,
    /// Declared type
    pub sql_type: SqlType,
}

impl ColumnMetadata {
    /// Create column metadata.
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
        }
    }
}

/// Ordered column metadata for a result cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultMetadata {
    columns: Vec<ColumnMetadata>,
}

impl ResultMetadata {
    /// Create metadata from an ordered column list.
    pub fn new(columns: Vec<ColumnMetadata>) -> Self {
        Self { columns }
    }

    /// Add a column.
    pub fn with_column(mut self, name: impl Into<String>, sql_type: SqlType) -> Self {
        self.columns.push(ColumnMetadata::new(name, sql_type));
        self
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// All columns in result order.
    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    /// Column at a 1-based position.
    pub fn column(&self, position: usize) -> Option<&ColumnMetadata> {
        position
            .checked_sub(1)
            .and_then(|zero_based| self.columns.get(zero_based))
    }

    /// 1-based position of the first column with this name.
    ///
    /// Exact matches win over case-insensitive ones.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(name))
            })
            .map(|zero_based| zero_based + 1)
    }

    /// Column names in result order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}
