// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::vec::Vec;

use log::debug;

use crate::ast::{Node, ResultColumn, Statement};
use crate::columns::{Column, ColumnCatalog, ColumnId};
use crate::schema::TypeNameResolver;
use crate::type_analysis::error::ResolveError;
use crate::type_analysis::graph::TypeGraph;
use crate::type_analysis::model::{ResolvedType, TypeExpectation, Typeable};
use crate::type_analysis::relationships::Relationship;
use crate::type_analysis::result::TypeResolution;

use super::TypeResolverOptions;

/// Walks a resolved statement top-down, handing expectations from parents
/// to children and recording types and relationships in a [`TypeGraph`].
pub struct TypeResolver<'a> {
    pub(crate) columns: &'a ColumnCatalog,
    pub(crate) type_names: &'a dyn TypeNameResolver,
    pub(crate) options: TypeResolverOptions,
}

/// How the type of one node is carried over to another.
#[derive(Clone, Debug, PartialEq)]
pub enum LazyCopy {
    /// The source is fully known; record the type right away.
    Now(ResolvedType),
    /// The source is still open; defer to the graph.
    Deferred(Relationship),
}

impl LazyCopy {
    pub fn plan(graph: &TypeGraph, target: Typeable, source: Typeable) -> Self {
        match graph.type_of(source) {
            Ok(ty) if graph.knows_type(source) => LazyCopy::Now(ty),
            _ => LazyCopy::Deferred(Relationship::copy_from(target, source)),
        }
    }
}

impl<'a> TypeResolver<'a> {
    pub fn new(
        columns: &'a ColumnCatalog,
        type_names: &'a dyn TypeNameResolver,
        options: TypeResolverOptions,
    ) -> Self {
        TypeResolver {
            columns,
            type_names,
            options,
        }
    }

    pub fn options(&self) -> &TypeResolverOptions {
        &self.options
    }

    /// Runs both phases over `statement`.
    pub fn resolve(&self, statement: &Statement) -> Result<TypeResolution, ResolveError> {
        let mut graph = TypeGraph::new();
        self.traverse(statement, &mut graph)?;
        Ok(TypeResolution::new(statement, graph.finish()))
    }

    /// First phase only: records what the statement tells about its nodes.
    /// The caller finishes `graph` once every statement of interest went
    /// through it.
    pub fn traverse(&self, statement: &Statement, graph: &mut TypeGraph) -> Result<(), ResolveError> {
        let kind = match statement {
            Statement::Select(_) => "SELECT",
            Statement::Insert(_) => "INSERT",
            Statement::Update(_) => "UPDATE",
            Statement::Delete(_) => "DELETE",
            Statement::CreateIndex(_) => "CREATE INDEX",
        };
        debug!("resolving types of {kind} statement");
        let root = Node::from(statement);
        self.visit(root, &TypeExpectation::None, graph)?;
        self.resolve_wildcard_columns(root, graph)
    }

    /// Wildcards are skipped by the SELECT rule; the columns they expand to
    /// are brought into the graph here so result rows can be typed.
    fn resolve_wildcard_columns(&self, root: Node<'_>, graph: &mut TypeGraph) -> Result<(), ResolveError> {
        let mut columns = Vec::new();
        root.walk(&mut |node| {
            if let Node::ResultColumn(ResultColumn::Star { expanded, .. }) = node {
                columns.extend(expanded.iter().copied());
            }
        });
        for column in columns {
            self.handle_column(column, graph)?;
        }
        Ok(())
    }

    pub(crate) fn visit(
        &self,
        node: Node<'_>,
        expectation: &TypeExpectation,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        match node {
            Node::Select(select) => self.visit_select(select, expectation, graph),
            Node::Insert(insert) => self.visit_insert(insert, graph),
            Node::Update(_) | Node::Delete(_) | Node::CreateIndex(_) => {
                self.visit_with_where_clause(node, expectation, graph)
            }
            Node::Queryable(queryable) => self.visit_queryable(queryable, expectation, graph),
            Node::Join(join) => self.visit_join(join, expectation, graph),
            Node::Limit(limit) => self.visit_limit(limit, graph),
            Node::SetComponent(component) => self.visit_set_component(component, graph),
            Node::Expr(expr) => self.visit_expr(expr, expectation, graph),
            _ => self.visit_children(node, expectation, graph),
        }
    }

    /// Visits every child of `node` in source order with the inherited
    /// expectation.
    pub(crate) fn visit_children(
        &self,
        node: Node<'_>,
        expectation: &TypeExpectation,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        for child in node.children() {
            self.visit(child, expectation, graph)?;
        }
        Ok(())
    }

    /// Like [`Self::visit_children`], skipping the child that is `skip`.
    pub(crate) fn visit_children_except(
        &self,
        node: Node<'_>,
        skip: Node<'_>,
        expectation: &TypeExpectation,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        for child in node.children() {
            if !child.is(&skip) {
                self.visit(child, expectation, graph)?;
            }
        }
        Ok(())
    }

    /// Makes the type of `column` available in the graph, either right away
    /// or through a relationship with its origin. Returns `false` for a
    /// column with no known origin, which stays out of the graph.
    pub(crate) fn handle_column(
        &self,
        column: ColumnId,
        graph: &mut TypeGraph,
    ) -> Result<bool, ResolveError> {
        let node = Typeable::Column(column);
        if graph.knows_type(node) {
            return Ok(true);
        }

        match self
            .columns
            .get(column)
            .ok_or(ResolveError::UnknownColumn(column))?
        {
            Column::Table { ty, .. } => graph.mark_resolved(node, *ty),
            Column::Expression { expr, .. } => self.lazy_copy(node, Typeable::Expr(*expr), graph),
            Column::Delegated {
                inner: Some(inner), ..
            } => {
                if !self.handle_column(*inner, graph)? {
                    return Ok(false);
                }
                self.lazy_copy(node, Typeable::Column(*inner), graph);
            }
            Column::Delegated { inner: None, .. } => return Ok(false),
        }
        Ok(true)
    }

    pub(crate) fn lazy_copy(&self, target: Typeable, source: Typeable, graph: &mut TypeGraph) {
        match LazyCopy::plan(graph, target, source) {
            LazyCopy::Now(ty) => graph.mark_resolved(target, ty),
            LazyCopy::Deferred(relationship) => graph.add_relationship(relationship),
        }
    }

    /// Expectation for a value written into a column of type `ty`.
    pub(crate) fn target_expectation(&self, ty: ResolvedType) -> TypeExpectation {
        if self.options.lax_insert_targets {
            TypeExpectation::lax(ty)
        } else {
            TypeExpectation::exact(ty)
        }
    }
}
