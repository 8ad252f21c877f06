// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, Literal, Node, Variable};
use crate::type_analysis::error::ResolveError;
use crate::type_analysis::graph::TypeGraph;
use crate::type_analysis::model::{BasicType, ResolvedType, TypeExpectation, Typeable};
use crate::type_analysis::propagation::pipeline::TypeResolver;

impl TypeResolver<'_> {
    pub(crate) fn visit_literal(
        &self,
        node: Typeable,
        literal: &Literal,
        expectation: &TypeExpectation,
        graph: &mut TypeGraph,
    ) {
        graph.direct_resolve(node, literal_type(literal), expectation);
    }

    /// Bound parameters take an annotated type first, then whatever an
    /// exact expectation asks for. Rough expectations tell nothing yet.
    pub(crate) fn visit_variable(
        &self,
        expr: &Expr,
        node: Typeable,
        variable: &Variable,
        expectation: &TypeExpectation,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        let annotated = self.options.variable_type(variable);
        let inferred = match expectation {
            TypeExpectation::Exact { ty, .. } => Some(*ty),
            _ => None,
        };

        match annotated.or(inferred) {
            Some(ty) => graph.mark_resolved(node, ty),
            None => graph.register(node),
        }
        self.visit_children(Node::Expr(expr), expectation, graph)
    }
}

/// Structural type of a literal. Only `NULL` is nullable.
pub(crate) fn literal_type(literal: &Literal) -> ResolvedType {
    let kind = match literal {
        Literal::Null => return ResolvedType::null(),
        Literal::Boolean(_) => BasicType::Bool,
        Literal::Numeric(_) if literal.is_integer() => BasicType::Int,
        Literal::Numeric(_) => BasicType::Real,
        Literal::String {
            is_binary: false, ..
        } => BasicType::Text,
        Literal::String {
            is_binary: true, ..
        } => BasicType::Blob,
    };
    ResolvedType::new(kind).nullable(false)
}
