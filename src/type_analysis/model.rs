// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.
use alloc::{string::String, vec::Vec};
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::columns::ColumnId;

/// The value kinds a SQL expression can resolve to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasicType {
    Null,
    Bool,
    Int,
    Real,
    Text,
    Blob,
}

impl BasicType {
    pub const fn label(&self) -> &'static str {
        match self {
            BasicType::Null => "null",
            BasicType::Bool => "bool",
            BasicType::Int => "int",
            BasicType::Real => "real",
            BasicType::Text => "text",
            BasicType::Blob => "blob",
        }
    }

    pub const fn is_numeric(&self) -> bool {
        matches!(self, BasicType::Int | BasicType::Real)
    }

    /// Position on the numeric widening ladder `null < bool < int < real`.
    const fn numeric_rank(&self) -> Option<u8> {
        match self {
            BasicType::Null => Some(0),
            BasicType::Bool => Some(1),
            BasicType::Int => Some(2),
            BasicType::Real => Some(3),
            BasicType::Text | BasicType::Blob => None,
        }
    }

    /// Whether two kinds may be compared or unified without a diagnostic.
    pub fn agrees_with(&self, other: &BasicType) -> bool {
        self == other
            || *self == BasicType::Null
            || *other == BasicType::Null
            || (self.is_numeric() && other.is_numeric())
    }

    /// Narrowest kind able to represent both `self` and `other`.
    pub fn encapsulate(&self, other: &BasicType) -> Option<BasicType> {
        if self == other {
            return Some(*self);
        }
        if *self == BasicType::Null {
            return Some(*other);
        }
        if *other == BasicType::Null {
            return Some(*self);
        }
        match (self.numeric_rank(), other.numeric_rank()) {
            (Some(lhs), Some(rhs)) if lhs >= rhs => Some(*self),
            (Some(_), Some(_)) => Some(*other),
            _ => None,
        }
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Three-valued nullability. Serialized as `true`, `false` or `null`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Nullability {
    #[default]
    Unknown,
    Nullable,
    NonNull,
}

impl Nullability {
    pub const fn is_known(&self) -> bool {
        !matches!(self, Nullability::Unknown)
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Nullability::Unknown => None,
            Nullability::Nullable => Some(true),
            Nullability::NonNull => Some(false),
        }
    }
}

impl From<bool> for Nullability {
    fn from(nullable: bool) -> Self {
        if nullable {
            Nullability::Nullable
        } else {
            Nullability::NonNull
        }
    }
}

impl From<Option<bool>> for Nullability {
    fn from(nullable: Option<bool>) -> Self {
        nullable.map_or(Nullability::Unknown, Nullability::from)
    }
}

impl From<Nullability> for Option<bool> {
    fn from(nullability: Nullability) -> Self {
        nullability.as_bool()
    }
}

/// A basic kind together with its nullability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedType {
    #[serde(rename = "type")]
    pub kind: BasicType,
    #[serde(default)]
    pub nullable: Nullability,
}

impl ResolvedType {
    /// A type of the given kind with unknown nullability.
    pub const fn new(kind: BasicType) -> Self {
        ResolvedType {
            kind,
            nullable: Nullability::Unknown,
        }
    }

    /// The type of the `NULL` literal.
    pub const fn null() -> Self {
        ResolvedType {
            kind: BasicType::Null,
            nullable: Nullability::Nullable,
        }
    }

    pub const fn bool() -> Self {
        Self::new(BasicType::Bool)
    }

    pub const fn int() -> Self {
        Self::new(BasicType::Int)
    }

    pub const fn real() -> Self {
        Self::new(BasicType::Real)
    }

    pub const fn text() -> Self {
        Self::new(BasicType::Text)
    }

    pub const fn blob() -> Self {
        Self::new(BasicType::Blob)
    }

    pub const fn with_nullability(mut self, nullable: Nullability) -> Self {
        self.nullable = nullable;
        self
    }

    pub const fn nullable(self, nullable: bool) -> Self {
        self.with_nullability(if nullable {
            Nullability::Nullable
        } else {
            Nullability::NonNull
        })
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.nullable {
            Nullability::Unknown => write!(f, "{}", self.kind),
            Nullability::Nullable => write!(f, "{} nullable", self.kind),
            Nullability::NonNull => write!(f, "{} not null", self.kind),
        }
    }
}

/// Kind categories usable as rough expectations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoughCategory {
    Numeric,
}

impl RoughCategory {
    pub fn contains(&self, kind: &BasicType) -> bool {
        match self {
            RoughCategory::Numeric => kind.is_numeric(),
        }
    }
}

/// Constraint handed from a parent node to a child during traversal.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum TypeExpectation {
    #[default]
    None,
    Exact {
        ty: ResolvedType,
        /// Permit SQL-style implicit coercions at the boundary.
        lax: bool,
    },
    Rough(RoughCategory),
    /// One expectation per output column of a row-producing construct.
    Select(Vec<TypeExpectation>),
}

impl TypeExpectation {
    pub const fn exact(ty: ResolvedType) -> Self {
        TypeExpectation::Exact { ty, lax: false }
    }

    pub const fn lax(ty: ResolvedType) -> Self {
        TypeExpectation::Exact { ty, lax: true }
    }

    pub const fn lax_bool() -> Self {
        Self::lax(ResolvedType::bool())
    }

    pub const fn numeric() -> Self {
        TypeExpectation::Rough(RoughCategory::Numeric)
    }

    /// Expectation for the output column at `index` of a `select`
    /// expectation. Anything else, or an exhausted list, yields `none`.
    pub fn column(&self, index: usize) -> TypeExpectation {
        match self {
            TypeExpectation::Select(columns) => columns.get(index).cloned().unwrap_or_default(),
            _ => TypeExpectation::None,
        }
    }

    /// Whether a value of `kind` satisfies this expectation. `NULL` fits
    /// every expectation.
    pub fn accepts(&self, kind: &BasicType) -> bool {
        if *kind == BasicType::Null {
            return true;
        }
        match self {
            TypeExpectation::None | TypeExpectation::Select(_) => true,
            TypeExpectation::Rough(category) => category.contains(kind),
            TypeExpectation::Exact { ty, lax } => {
                ty.kind == *kind
                    || (*lax
                        && matches!(
                            (ty.kind, *kind),
                            (BasicType::Bool, BasicType::Int)
                                | (BasicType::Int, BasicType::Bool)
                                | (BasicType::Real, BasicType::Int)
                                | (BasicType::Text, BasicType::Int | BasicType::Real)
                        ))
            }
        }
    }
}

impl fmt::Display for TypeExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpectation::None => f.write_str("anything"),
            TypeExpectation::Exact { ty, lax: false } => write!(f, "{}", ty.kind),
            TypeExpectation::Exact { ty, lax: true } => write!(f, "{} (or coercible)", ty.kind),
            TypeExpectation::Rough(RoughCategory::Numeric) => f.write_str("a numeric value"),
            TypeExpectation::Select(columns) => write!(f, "a row of {} columns", columns.len()),
        }
    }
}

/// A node of the type graph. Identity is positional (expression index or
/// column id), never structural.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Typeable {
    Expr(u32),
    Column(ColumnId),
}

impl fmt::Display for Typeable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Typeable::Expr(eidx) => write!(f, "expression#{eidx}"),
            Typeable::Column(column) => write!(f, "{column}"),
        }
    }
}

/// Diagnostics emitted while resolving types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TypeDiagnosticSeverity {
    Error,
}

#[derive(Clone, Debug, Serialize)]
pub struct TypeDiagnostic {
    pub message: String,
    pub kind: TypeDiagnosticKind,
    pub severity: TypeDiagnosticSeverity,
    pub node: Typeable,
    /// Source rendering of the offending expression, once the diagnostic
    /// has been tied back to its statement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TypeDiagnosticKind {
    /// A directly resolved type violates the expectation handed to it.
    TypeMismatch,
    /// Two nodes required to share a type resolved to disagreeing kinds.
    Contradiction,
    /// No common kind can represent all sources of a combining node.
    IncompatibleTypes,
    /// A node of the graph never received a kind.
    Unresolved,
}
