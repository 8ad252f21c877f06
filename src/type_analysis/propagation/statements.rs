// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::vec::Vec;

use crate::ast::{
    Expr, InsertSource, InsertStatement, Join, Limit, Node, Queryable, ResultColumn,
    SelectStatement, SetComponent,
};
use crate::type_analysis::error::ResolveError;
use crate::type_analysis::graph::TypeGraph;
use crate::type_analysis::model::{ResolvedType, TypeExpectation, Typeable};
use crate::type_analysis::propagation::pipeline::TypeResolver;

impl TypeResolver<'_> {
    /// Generic rule for statements carrying a WHERE clause: the predicate is
    /// visited first as a boolean, then every other child in order.
    pub(crate) fn visit_with_where_clause(
        &self,
        node: Node<'_>,
        expectation: &TypeExpectation,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        match node.where_clause() {
            Some(predicate) => {
                self.visit_expr(predicate, &TypeExpectation::lax_bool(), graph)?;
                self.visit_children_except(node, Node::Expr(predicate), expectation, graph)
            }
            None => self.visit_children(node, expectation, graph),
        }
    }

    /// Result columns take the positional entries of a `select`
    /// expectation; wildcards consume as many positions as they expand to.
    pub(crate) fn visit_select(
        &self,
        select: &SelectStatement,
        expectation: &TypeExpectation,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        let node = Node::Select(select);
        let where_clause = select.where_clause.as_ref().map(Node::Expr);
        let having = select.having.as_ref().map(Node::Expr);

        if let Some(Node::Expr(predicate)) = where_clause {
            self.visit_expr(predicate, &TypeExpectation::lax_bool(), graph)?;
        }

        let mut column_index = 0usize;
        for child in node.children() {
            if where_clause.is_some_and(|predicate| predicate.is(&child)) {
                continue;
            }
            if having.is_some_and(|predicate| predicate.is(&child)) {
                self.visit(child, &TypeExpectation::lax_bool(), graph)?;
                continue;
            }

            match child {
                Node::ResultColumn(ResultColumn::Expression { expr, .. }) => {
                    self.visit_expr(expr, &expectation.column(column_index), graph)?;
                    column_index += 1;
                }
                Node::ResultColumn(column @ ResultColumn::Star { .. }) => {
                    column_index += column.width();
                }
                // A CTE defines its own rows; positional expectations stop
                // at its boundary.
                Node::With(_) => self.visit(child, &TypeExpectation::None, graph)?,
                _ => self.visit(child, expectation, graph)?,
            }
        }
        Ok(())
    }

    pub(crate) fn visit_insert(
        &self,
        insert: &InsertStatement,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        if let Some(with) = &insert.with {
            self.visit(Node::With(with), &TypeExpectation::None, graph)?;
        }
        for target in &insert.target_columns {
            self.visit_expr(target, &TypeExpectation::None, graph)?;
        }

        let mut expectations = Vec::with_capacity(insert.resolved_targets.len());
        for column in &insert.resolved_targets {
            self.handle_column(*column, graph)?;
            let expectation = graph
                .type_of(Typeable::Column(*column))
                .map(|ty| self.target_expectation(ty))
                .unwrap_or_default();
            expectations.push(expectation);
        }

        match &insert.source {
            InsertSource::Select(select) => {
                self.visit_select(select, &TypeExpectation::Select(expectations), graph)
            }
            InsertSource::Values(rows) => {
                for row in rows {
                    for (index, value) in row.iter().enumerate() {
                        let expectation = expectations.get(index).cloned().unwrap_or_default();
                        self.visit_expr(value, &expectation, graph)?;
                    }
                }
                Ok(())
            }
            InsertSource::DefaultValues => Ok(()),
        }
    }

    pub(crate) fn visit_queryable(
        &self,
        queryable: &Queryable,
        expectation: &TypeExpectation,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        match queryable {
            // A subquery used as a table source has no positional
            // constraints of its own.
            Queryable::Subquery { select, .. } => {
                self.visit_select(select, &TypeExpectation::None, graph)
            }
            _ => self.visit_children(Node::Queryable(queryable), expectation, graph),
        }
    }

    pub(crate) fn visit_join(
        &self,
        join: &Join,
        expectation: &TypeExpectation,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        let node = Node::Join(join);
        match join.on_expression() {
            Some(on) => {
                self.visit_expr(on, &TypeExpectation::lax_bool(), graph)?;
                self.visit_children_except(node, Node::Expr(on), expectation, graph)
            }
            None => self.visit_children(node, expectation, graph),
        }
    }

    pub(crate) fn visit_limit(&self, limit: &Limit, graph: &mut TypeGraph) -> Result<(), ResolveError> {
        let expectation = TypeExpectation::lax(ResolvedType::int());
        self.visit_expr(&limit.count, &expectation, graph)?;
        if let Some(offset) = &limit.offset {
            self.visit_expr(offset, &expectation, graph)?;
        }
        Ok(())
    }

    /// `SET column = value`: the value is checked against the column type.
    pub(crate) fn visit_set_component(
        &self,
        component: &SetComponent,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        self.visit_expr(&component.column, &TypeExpectation::None, graph)?;

        let expectation = match &component.column {
            Expr::Reference {
                resolved: Some(column),
                ..
            } => graph
                .type_of(Typeable::Column(*column))
                .map(|ty| self.target_expectation(ty))
                .unwrap_or_default(),
            _ => TypeExpectation::None,
        };
        self.visit_expr(&component.value, &expectation, graph)
    }
}
