// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::vec;

use crate::ast::Expr;
use crate::type_analysis::error::ResolveError;
use crate::type_analysis::graph::TypeGraph;
use crate::type_analysis::model::{Nullability, TypeExpectation, Typeable};
use crate::type_analysis::propagation::pipeline::TypeResolver;
use crate::type_analysis::relationships::Relationship;

impl TypeResolver<'_> {
    /// `CAST(operand AS type_name)`: the declared type fixes the kind, the
    /// operand decides nullability.
    pub(crate) fn visit_cast(
        &self,
        node: Typeable,
        operand: &Expr,
        type_name: &str,
        expectation: &TypeExpectation,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        let ty = self
            .type_names
            .resolve_type_name(type_name)
            .with_nullability(Nullability::Unknown);

        graph.direct_resolve(node, ty, expectation);
        graph.add_relationship(Relationship::nullable_if_any(
            node,
            vec![Typeable::Expr(operand.eidx())],
        ));
        self.visit_expr(operand, &TypeExpectation::None, graph)
    }
}
