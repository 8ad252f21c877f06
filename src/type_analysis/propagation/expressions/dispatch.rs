// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::Expr;
use crate::type_analysis::error::ResolveError;
use crate::type_analysis::graph::TypeGraph;
use crate::type_analysis::model::{TypeExpectation, Typeable};
use crate::type_analysis::propagation::pipeline::TypeResolver;
use crate::type_analysis::relationships::Relationship;

impl TypeResolver<'_> {
    pub(crate) fn visit_expr(
        &self,
        expr: &Expr,
        expectation: &TypeExpectation,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        let node = Typeable::Expr(expr.eidx());

        match expr {
            Expr::Literal { value, .. } => {
                self.visit_literal(node, value, expectation, graph);
                Ok(())
            }
            Expr::Variable { variable, .. } => {
                self.visit_variable(expr, node, variable, expectation, graph)
            }
            Expr::Unary { op, operand, .. } => {
                self.visit_unary(node, *op, operand, expectation, graph)
            }
            Expr::Binary {
                op, left, right, ..
            } => self.visit_binary(node, *op, left, right, expectation, graph),
            Expr::Is { left, right, .. } => self.visit_is(node, left, right, expectation, graph),
            Expr::Between {
                check,
                lower,
                upper,
                ..
            } => self.visit_between(node, check, lower, upper, expectation, graph),
            Expr::In { left, values, .. } => {
                self.visit_in(node, left, values, expectation, graph)
            }
            Expr::Exists { select, .. } => self.visit_exists(node, select, expectation, graph),
            Expr::Cast {
                operand, type_name, ..
            } => self.visit_cast(node, operand, type_name, expectation, graph),
            Expr::Parentheses { inner, .. } => {
                graph.add_relationship(Relationship::copy_from(
                    node,
                    Typeable::Expr(inner.eidx()),
                ));
                self.visit_expr(inner, expectation, graph)
            }
            Expr::Reference { resolved, .. } => self.visit_reference(node, *resolved, graph),
        }
    }
}
