// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::vec;

use crate::ast::{Expr, Operator};
use crate::type_analysis::error::ResolveError;
use crate::type_analysis::graph::TypeGraph;
use crate::type_analysis::model::{ResolvedType, TypeExpectation, Typeable};
use crate::type_analysis::propagation::pipeline::TypeResolver;
use crate::type_analysis::relationships::Relationship;

/// Operator families of binary expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BinaryClass {
    Logical,
    Comparison,
    Arithmetic,
    IntegerOnly,
    Concatenation,
}

fn classify(op: Operator) -> Option<BinaryClass> {
    Some(match op {
        Operator::And | Operator::Or => BinaryClass::Logical,
        Operator::Equal
        | Operator::DoubleEqual
        | Operator::ExclamationEqual
        | Operator::LessMore
        | Operator::Less
        | Operator::LessEqual
        | Operator::More
        | Operator::MoreEqual => BinaryClass::Comparison,
        Operator::Plus | Operator::Minus | Operator::Star | Operator::Slash => {
            BinaryClass::Arithmetic
        }
        Operator::ShiftLeft
        | Operator::ShiftRight
        | Operator::Ampersand
        | Operator::Pipe
        | Operator::Percent => BinaryClass::IntegerOnly,
        Operator::DoublePipe => BinaryClass::Concatenation,
        Operator::Tilde | Operator::Not => return None,
    })
}

impl TypeResolver<'_> {
    pub(crate) fn visit_binary(
        &self,
        node: Typeable,
        op: Operator,
        left: &Expr,
        right: &Expr,
        expectation: &TypeExpectation,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        let class = classify(op).ok_or(ResolveError::UnsupportedBinaryOperator(op))?;
        let lhs = Typeable::Expr(left.eidx());
        let rhs = Typeable::Expr(right.eidx());

        let operand_expectation = match class {
            BinaryClass::Logical => {
                graph.direct_resolve(node, ResolvedType::bool(), expectation);
                graph.add_relationship(Relationship::nullable_if_any(node, vec![lhs, rhs]));
                TypeExpectation::lax_bool()
            }
            BinaryClass::Comparison => {
                graph.direct_resolve(node, ResolvedType::bool(), expectation);
                graph.add_relationship(Relationship::nullable_if_any(node, vec![lhs, rhs]));
                graph.add_relationship(Relationship::HaveSameType {
                    first: lhs,
                    second: rhs,
                });
                TypeExpectation::None
            }
            BinaryClass::Arithmetic => {
                graph.add_relationship(Relationship::CopyEncapsulating {
                    target: node,
                    sources: vec![lhs, rhs],
                });
                TypeExpectation::None
            }
            BinaryClass::IntegerOnly => {
                graph.direct_resolve(node, ResolvedType::int(), expectation);
                graph.add_relationship(Relationship::nullable_if_any(node, vec![lhs, rhs]));
                TypeExpectation::lax(ResolvedType::int())
            }
            BinaryClass::Concatenation => {
                graph.direct_resolve(node, ResolvedType::text(), expectation);
                graph.add_relationship(Relationship::nullable_if_any(node, vec![lhs, rhs]));
                TypeExpectation::lax(ResolvedType::text())
            }
        };

        self.visit_expr(left, &operand_expectation, graph)?;
        self.visit_expr(right, &operand_expectation, graph)
    }
}
