// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

use crate::ast::Operator;
use crate::columns::ColumnId;

use super::model::Typeable;

/// Contract violations. Any of these aborts the resolution run: they mean
/// an upstream component handed the resolver a tree it cannot have produced
/// correctly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Token in a unary position that no unary rule covers
    #[error("operator `{0}` cannot appear in a unary expression")]
    UnsupportedUnaryOperator(Operator),
    /// Token in a binary position that no binary rule covers
    #[error("operator `{0}` cannot appear in a binary expression")]
    UnsupportedBinaryOperator(Operator),
    /// Reference resolved to a column missing from the catalog
    #[error("{0} is not part of the column catalog")]
    UnknownColumn(ColumnId),
    /// Type requested before the graph knew it
    #[error("type of {0} was requested before it was known")]
    TypeNotKnown(Typeable),
}
