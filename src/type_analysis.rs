// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Type and nullability resolution for SQL statements.
//!
//! The module is split across a couple of dedicated files:
//!
//! * `model.rs` contains the type representations shared across the
//!   resolution: kinds, nullability, expectations and diagnostics.
//! * `relationships.rs` describes the deferred constraints between nodes.
//! * `graph.rs` keeps per-node types and closes relationships to a
//!   fixpoint once traversal is over.
//! * `propagation/` contains the top-down traversal, split into statement
//!   rules and one file per expression family.
//! * `result.rs` exposes the final types keyed the way callers ask for them.

pub mod error;
pub mod graph;
pub mod model;
pub mod propagation;
pub mod relationships;
pub mod result;

pub use error::ResolveError;
pub use graph::{ResolvedTypes, TypeGraph};
pub use model::{
    BasicType, Nullability, ResolvedType, RoughCategory, TypeDiagnostic, TypeDiagnosticKind,
    TypeDiagnosticSeverity, TypeExpectation, Typeable,
};
pub use propagation::{LazyCopy, OptionsError, TypeResolver, TypeResolverOptions};
pub use relationships::{CastMode, Relationship};
pub use result::TypeResolution;
