//! Values exchanged with the remote query engine.

use crate::query::Parameter;
use crate::types::Cell;
use std::collections::BTreeMap;

/// One result row, cells in column order.
pub type Row = Vec<Cell>;

/// A positional parameter inside a bound statement.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    /// 1-based position
    pub index: usize,
    /// Bound value
    pub value: Parameter,
}

/// Query text plus positional parameter values, ready for execution.
///
/// Immutable once built. Parameters are kept in ascending index order; gaps
/// are not filled in, so a statement with missing positions is forwarded as is
/// and rejected by the remote side if it needs them.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    sql: String,
    parameters: Vec<BoundParameter>,
}

impl BoundStatement {
    /// Start building a statement for `sql`.
    pub fn builder(sql: impl Into<String>) -> BoundStatementBuilder {
        BoundStatementBuilder {
            sql: sql.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Query text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Parameters in ascending index order.
    pub fn parameters(&self) -> &[BoundParameter] {
        &self.parameters
    }

    /// Value bound at a 1-based position.
    pub fn parameter(&self, index: usize) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.index == index)
            .map(|p| &p.value)
    }
}

/// Builder for [`BoundStatement`].
#[derive(Debug, Clone)]
pub struct BoundStatementBuilder {
    sql: String,
    parameters: BTreeMap<usize, Parameter>,
}

impl BoundStatementBuilder {
    /// Bind a value. A later bind at the same index replaces the earlier one.
    pub fn bind(mut self, index: usize, value: Parameter) -> Self {
        self.parameters.insert(index, value);
        self
    }

    /// Bind every entry of an index-ordered map.
    pub fn bind_all(mut self, parameters: &BTreeMap<usize, Parameter>) -> Self {
        for (index, value) in parameters {
            self.parameters.insert(*index, value.clone());
        }
        self
    }

    /// Finish the statement.
    pub fn build(self) -> BoundStatement {
        BoundStatement {
            sql: self.sql,
            parameters: self
                .parameters
                .into_iter()
                .map(|(index, value)| BoundParameter { index, value })
                .collect(),
        }
    }
}
