// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Static type and nullability inference for parsed SQL statements.
//!
//! The crate walks a statement tree produced by an upstream parser (after
//! identifier resolution has attached columns to references) and infers a
//! [`ResolvedType`] for every expression, column and bound parameter.
//!
//! Resolution happens in two phases:
//!
//! 1. [`TypeResolver`] traverses the tree top-down, handing each child an
//!    inherited [`TypeExpectation`]. Types that are structurally obvious are
//!    recorded directly; everything else becomes a [`Relationship`] in the
//!    [`TypeGraph`].
//! 2. [`TypeGraph::finish`] closes all relationships to a fixpoint and
//!    reports anything left unresolved or contradictory as diagnostics.
//!
//! Most callers only need [`TypeChecker`], which runs both phases.

#![no_std]

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod ast;
pub mod columns;
pub mod schema;
pub mod type_analysis;
pub mod type_checker;

pub use columns::{Column, ColumnCatalog, ColumnId};
pub use schema::{SqliteTypeNames, TypeNameResolver};
pub use type_analysis::{
    BasicType, Nullability, Relationship, ResolveError, ResolvedType, ResolvedTypes,
    TypeDiagnostic, TypeDiagnosticKind, TypeExpectation, TypeGraph, TypeResolution,
    TypeResolver, TypeResolverOptions, Typeable,
};
pub use type_checker::TypeChecker;

#[cfg(test)]
mod tests;
