// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::vec;

use crate::ast::{Expr, Operator};
use crate::type_analysis::error::ResolveError;
use crate::type_analysis::graph::TypeGraph;
use crate::type_analysis::model::{ResolvedType, TypeExpectation, Typeable};
use crate::type_analysis::propagation::pipeline::TypeResolver;
use crate::type_analysis::relationships::{CastMode, Relationship};

impl TypeResolver<'_> {
    pub(crate) fn visit_unary(
        &self,
        node: Typeable,
        op: Operator,
        operand: &Expr,
        expectation: &TypeExpectation,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        let inner = Typeable::Expr(operand.eidx());

        match op {
            Operator::Plus => {
                graph.add_relationship(Relationship::copy_from(node, inner));
                self.visit_expr(operand, expectation, graph)
            }
            Operator::Not => {
                graph.direct_resolve(node, ResolvedType::bool(), expectation);
                graph.add_relationship(Relationship::nullable_if_any(node, vec![inner]));
                self.visit_expr(operand, &TypeExpectation::lax_bool(), graph)
            }
            Operator::Minus => {
                graph.add_relationship(Relationship::CopyAndCast {
                    target: node,
                    source: inner,
                    mode: CastMode::Numeric,
                });
                self.visit_expr(operand, &TypeExpectation::numeric(), graph)
            }
            Operator::Tilde => {
                graph.direct_resolve(node, ResolvedType::int(), expectation);
                graph.add_relationship(Relationship::nullable_if_any(node, vec![inner]));
                self.visit_expr(operand, &TypeExpectation::None, graph)
            }
            _ => Err(ResolveError::UnsupportedUnaryOperator(op)),
        }
    }
}
