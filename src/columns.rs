// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Columns known to a statement after identifier resolution.

use alloc::{borrow::ToOwned, string::String, vec::Vec};
use core::fmt;

use serde::Serialize;

use crate::type_analysis::ResolvedType;

/// Index of a column inside a [`ColumnCatalog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ColumnId(pub u32);

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "column#{}", self.0)
    }
}

/// Where a column gets its type from.
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    /// Column of a schema table. The type is fixed by the schema.
    Table {
        table: String,
        name: String,
        ty: ResolvedType,
    },
    /// Column defined by an expression, e.g. a result column of a subquery
    /// or common table expression. `expr` is the defining expression's eidx.
    Expression { name: String, expr: u32 },
    /// Column forwarding to another column, e.g. a CTE column renamed by an
    /// explicit column list.
    Delegated {
        name: String,
        inner: Option<ColumnId>,
    },
}

impl Column {
    pub fn name(&self) -> &str {
        match self {
            Column::Table { name, .. }
            | Column::Expression { name, .. }
            | Column::Delegated { name, .. } => name,
        }
    }
}

/// Arena of all columns referenced by one statement.
#[derive(Clone, Debug, Default)]
pub struct ColumnCatalog {
    columns: Vec<Column>,
}

impl ColumnCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, column: Column) -> ColumnId {
        let id = ColumnId(self.columns.len() as u32);
        self.columns.push(column);
        id
    }

    pub fn add_table_column(&mut self, table: &str, name: &str, ty: ResolvedType) -> ColumnId {
        self.add(Column::Table {
            table: table.to_owned(),
            name: name.to_owned(),
            ty,
        })
    }

    pub fn add_expression_column(&mut self, name: &str, expr: u32) -> ColumnId {
        self.add(Column::Expression {
            name: name.to_owned(),
            expr,
        })
    }

    pub fn add_delegated_column(&mut self, name: &str, inner: Option<ColumnId>) -> ColumnId {
        self.add(Column::Delegated {
            name: name.to_owned(),
            inner,
        })
    }

    pub fn get(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColumnId, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| (ColumnId(idx as u32), column))
    }
}
