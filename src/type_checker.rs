// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! High-level type checker for SQL statements.
//!
//! This module bundles a statement with the column catalog identifier
//! resolution produced for it, runs both resolution phases and caches the
//! outcome for querying.

use crate::ast::Statement;
use crate::columns::ColumnCatalog;
use crate::schema::{SqliteTypeNames, TypeNameResolver};
use crate::type_analysis::{ResolvedType, TypeResolution, TypeResolver, TypeResolverOptions};

use anyhow::{anyhow, Result};

/// High-level type checker for one SQL statement.
///
/// # Example
///
/// ```no_run
/// # use sqlinfer::*;
/// # use sqlinfer::ast::{Builder, Operator, ResultColumn, SelectStatement, Statement};
/// # fn main() -> anyhow::Result<()> {
/// let mut columns = ColumnCatalog::new();
/// let id = columns.add_table_column("users", "id", ResolvedType::int().nullable(false));
///
/// let mut b = Builder::new();
/// let reference = b.reference("id", Some(id));
/// let param = b.variable(1);
/// let predicate = b.binary(Operator::Equal, reference, param);
/// let select = SelectStatement {
///     columns: vec![ResultColumn::Star { table: None, expanded: vec![id] }],
///     where_clause: Some(predicate),
///     ..Default::default()
/// };
///
/// let mut checker = TypeChecker::new(Statement::Select(select), columns);
/// checker.check()?;
///
/// if let Some(result) = checker.get_result() {
///     println!("?1 is {:?}", result.variable_type("?1"));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TypeChecker<N: TypeNameResolver = SqliteTypeNames> {
    statement: Statement,
    columns: ColumnCatalog,
    type_names: N,
    options: TypeResolverOptions,
    result: Option<TypeResolution>,
}

impl TypeChecker<SqliteTypeNames> {
    /// Create a new TypeChecker resolving declared type names with SQLite
    /// affinity rules.
    pub fn new(statement: Statement, columns: ColumnCatalog) -> Self {
        Self::with_type_names(statement, columns, SqliteTypeNames::new())
    }
}

impl<N: TypeNameResolver> TypeChecker<N> {
    pub fn with_type_names(statement: Statement, columns: ColumnCatalog, type_names: N) -> Self {
        Self {
            statement,
            columns,
            type_names,
            options: TypeResolverOptions::default(),
            result: None,
        }
    }

    /// Replace the resolver options.
    ///
    /// Invalidates any cached result.
    pub fn set_options(&mut self, options: TypeResolverOptions) {
        self.options = options;
        self.result = None;
    }

    /// Load resolver options from their JSON form.
    pub fn set_options_json(&mut self, json: &str) -> Result<()> {
        let options = TypeResolverOptions::from_json_str(json)
            .map_err(|e| anyhow!("invalid type resolver options: {e}"))?;
        self.set_options(options);
        Ok(())
    }

    pub fn get_options(&self) -> &TypeResolverOptions {
        &self.options
    }

    /// Annotate the bound parameter `key` (`?1`, `:name`, ...) with a type.
    pub fn set_variable_type(&mut self, key: &str, ty: ResolvedType) -> Result<()> {
        let options = self.options.clone().with_variable_type(key, ty);
        options
            .validate()
            .map_err(|e| anyhow!("cannot annotate `{key}`: {e}"))?;
        self.set_options(options);
        Ok(())
    }

    /// Run type resolution over the statement.
    ///
    /// Type errors do not fail the check; they are reported as diagnostics
    /// of the result. An error is returned only when the statement tree
    /// breaks an upstream contract (an operator in the wrong position, a
    /// reference to a column missing from the catalog).
    pub fn check(&mut self) -> Result<()> {
        let resolver = TypeResolver::new(&self.columns, &self.type_names, self.options.clone());
        let result = resolver
            .resolve(&self.statement)
            .map_err(|e| anyhow!("type resolution failed: {e}"))?;

        self.result = Some(result);
        Ok(())
    }

    /// Get the resolution result.
    ///
    /// Returns `None` if type checking hasn't been run yet via [`check()`](Self::check).
    pub fn get_result(&self) -> Option<&TypeResolution> {
        self.result.as_ref()
    }

    /// Returns `None` if type checking hasn't been run yet.
    pub fn has_errors(&self) -> Option<bool> {
        self.result.as_ref().map(|r| !r.is_well_typed())
    }

    /// Returns `None` if type checking hasn't been run yet.
    pub fn diagnostic_count(&self) -> Option<usize> {
        self.result.as_ref().map(|r| r.diagnostics().len())
    }

    pub fn get_statement(&self) -> &Statement {
        &self.statement
    }

    /// Replace the statement and its catalog.
    ///
    /// This invalidates all cached results.
    pub fn set_statement(&mut self, statement: Statement, columns: ColumnCatalog) {
        self.statement = statement;
        self.columns = columns;
        self.invalidate();
    }

    /// Clear cached results and force re-resolution on next check.
    pub fn invalidate(&mut self) {
        self.result = None;
    }
}
