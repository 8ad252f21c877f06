// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.
use alloc::{vec, vec::Vec};

use super::model::{BasicType, Typeable};

/// Rule deriving a target kind from a source kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastMode {
    /// Numeric conversion as performed by unary minus.
    Numeric,
}

impl CastMode {
    pub fn cast(&self, kind: BasicType) -> BasicType {
        match self {
            CastMode::Numeric => match kind {
                BasicType::Null => BasicType::Null,
                BasicType::Bool | BasicType::Int => BasicType::Int,
                BasicType::Real | BasicType::Text | BasicType::Blob => BasicType::Real,
            },
        }
    }
}

/// Deferred constraint between typeable nodes, closed by
/// [`TypeGraph::finish`](super::TypeGraph::finish).
#[derive(Clone, Debug, PartialEq)]
pub enum Relationship {
    /// `target` takes exactly the type of `source`.
    CopyTypeFrom { target: Typeable, source: Typeable },
    /// `target` takes the type of `source` converted by `mode`.
    CopyAndCast {
        target: Typeable,
        source: Typeable,
        mode: CastMode,
    },
    /// `target` takes the narrowest type representing every source.
    CopyEncapsulating {
        target: Typeable,
        sources: Vec<Typeable>,
    },
    /// `target` is nullable as soon as any of `others` is, and non-null
    /// once all of them are.
    NullableIfAny {
        target: Typeable,
        others: Vec<Typeable>,
    },
    /// Both sides must end up with the same type.
    HaveSameType { first: Typeable, second: Typeable },
}

impl Relationship {
    pub fn copy_from(target: Typeable, source: Typeable) -> Self {
        Relationship::CopyTypeFrom { target, source }
    }

    pub fn nullable_if_any(target: Typeable, others: Vec<Typeable>) -> Self {
        Relationship::NullableIfAny { target, others }
    }

    /// Every node the relationship mentions.
    pub fn nodes(&self) -> Vec<Typeable> {
        match self {
            Relationship::CopyTypeFrom { target, source }
            | Relationship::CopyAndCast { target, source, .. } => vec![*target, *source],
            Relationship::CopyEncapsulating {
                target,
                sources: others,
            }
            | Relationship::NullableIfAny { target, others } => {
                let mut nodes = Vec::with_capacity(others.len() + 1);
                nodes.push(*target);
                nodes.extend(others.iter().copied());
                nodes
            }
            Relationship::HaveSameType { first, second } => vec![*first, *second],
        }
    }

    /// The node the relationship derives a type for. Unification has no
    /// single target.
    pub fn target(&self) -> Option<Typeable> {
        match self {
            Relationship::CopyTypeFrom { target, .. }
            | Relationship::CopyAndCast { target, .. }
            | Relationship::CopyEncapsulating { target, .. }
            | Relationship::NullableIfAny { target, .. } => Some(*target),
            Relationship::HaveSameType { .. } => None,
        }
    }

    /// Whether the relationship only ever writes nullability.
    pub fn is_nullability_only(&self) -> bool {
        matches!(self, Relationship::NullableIfAny { .. })
    }

    /// Whether a source of the relationship is its own target.
    pub(crate) fn is_self_referential(&self) -> bool {
        match self {
            Relationship::CopyTypeFrom { target, source }
            | Relationship::CopyAndCast { target, source, .. } => target == source,
            Relationship::CopyEncapsulating {
                target,
                sources: others,
            }
            | Relationship::NullableIfAny { target, others } => others.contains(target),
            Relationship::HaveSameType { first, second } => first == second,
        }
    }
}
