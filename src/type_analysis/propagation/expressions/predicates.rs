// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::vec::Vec;

use crate::ast::{Expr, SelectStatement};
use crate::type_analysis::error::ResolveError;
use crate::type_analysis::graph::TypeGraph;
use crate::type_analysis::model::{ResolvedType, TypeExpectation, Typeable};
use crate::type_analysis::propagation::pipeline::TypeResolver;
use crate::type_analysis::relationships::Relationship;

impl TypeResolver<'_> {
    /// `left IS [NOT] right` is never null.
    pub(crate) fn visit_is(
        &self,
        node: Typeable,
        left: &Expr,
        right: &Expr,
        expectation: &TypeExpectation,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        graph.direct_resolve(node, ResolvedType::bool().nullable(false), expectation);
        self.visit_expr(left, &TypeExpectation::None, graph)?;
        self.visit_expr(right, &TypeExpectation::None, graph)
    }

    pub(crate) fn visit_between(
        &self,
        node: Typeable,
        check: &Expr,
        lower: &Expr,
        upper: &Expr,
        expectation: &TypeExpectation,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        self.visit_membership(node, check, [lower, upper], expectation, graph)
    }

    pub(crate) fn visit_in(
        &self,
        node: Typeable,
        left: &Expr,
        values: &[Expr],
        expectation: &TypeExpectation,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        self.visit_membership(node, left, values, expectation, graph)
    }

    pub(crate) fn visit_exists(
        &self,
        node: Typeable,
        select: &SelectStatement,
        expectation: &TypeExpectation,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        graph.direct_resolve(node, ResolvedType::bool().nullable(false), expectation);
        self.visit_select(select, &TypeExpectation::None, graph)
    }

    /// BETWEEN and IN: a boolean that is null when any operand is, with
    /// every candidate sharing the type of the checked value.
    fn visit_membership<'e>(
        &self,
        node: Typeable,
        check: &Expr,
        candidates: impl IntoIterator<Item = &'e Expr>,
        expectation: &TypeExpectation,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        let candidates: Vec<&Expr> = candidates.into_iter().collect();
        let checked = Typeable::Expr(check.eidx());

        graph.direct_resolve(node, ResolvedType::bool(), expectation);
        let mut operands = Vec::with_capacity(candidates.len() + 1);
        operands.push(checked);
        operands.extend(candidates.iter().map(|expr| Typeable::Expr(expr.eidx())));
        graph.add_relationship(Relationship::nullable_if_any(node, operands));

        for candidate in &candidates {
            graph.add_relationship(Relationship::HaveSameType {
                first: checked,
                second: Typeable::Expr(candidate.eidx()),
            });
        }

        self.visit_expr(check, &TypeExpectation::None, graph)?;
        for candidate in candidates {
            self.visit_expr(candidate, &TypeExpectation::None, graph)?;
        }
        Ok(())
    }
}
