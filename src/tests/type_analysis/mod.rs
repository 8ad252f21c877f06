// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{
    Builder, DeleteStatement, Expr, InsertSource, InsertStatement, Limit, Literal, Operator,
    ResultColumn, SelectStatement, SetComponent, Statement, UpdateStatement,
};
use crate::columns::{Column, ColumnCatalog, ColumnId};
use crate::schema::SqliteTypeNames;
use crate::type_analysis::{
    BasicType, ResolvedType, TypeDiagnosticKind, TypeResolution, TypeResolver, TypeResolverOptions,
};

use alloc::{
    boxed::Box,
    collections::BTreeMap,
    format,
    string::{String, ToString},
    vec::Vec,
};
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use test_generator::test_resources;

mod graph;

/// Column catalog, expression builder and options for one statement under
/// test.
pub(super) struct Fixture {
    pub b: Builder,
    pub columns: ColumnCatalog,
    pub options: TypeResolverOptions,
}

impl Fixture {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Fixture {
            b: Builder::new(),
            columns: ColumnCatalog::new(),
            options: TypeResolverOptions::default(),
        }
    }

    pub fn column(&mut self, table: &str, name: &str, ty: ResolvedType) -> ColumnId {
        self.columns.add_table_column(table, name, ty)
    }

    pub fn resolve(&self, statement: &Statement) -> Result<TypeResolution> {
        let type_names = SqliteTypeNames::new();
        let resolver = TypeResolver::new(&self.columns, &type_names, self.options.clone());
        Ok(resolver.resolve(statement)?)
    }
}

pub(super) fn select(columns: Vec<Expr>) -> SelectStatement {
    SelectStatement {
        columns: columns
            .into_iter()
            .map(|expr| ResultColumn::Expression { expr, alias: None })
            .collect(),
        ..Default::default()
    }
}

/// `SELECT <expr>`, the resolution and the type of `expr`.
pub(super) fn resolve_single(
    fixture: &Fixture,
    expr: Expr,
) -> Result<(TypeResolution, Option<ResolvedType>)> {
    let eidx = expr.eidx();
    let resolution = fixture.resolve(&Statement::Select(select(alloc::vec![expr])))?;
    let ty = resolution.expr_type(eidx);
    Ok((resolution, ty))
}

pub(super) fn diagnostic_kinds(resolution: &TypeResolution) -> Vec<TypeDiagnosticKind> {
    resolution.diagnostics().iter().map(|d| d.kind).collect()
}

#[derive(Debug, Deserialize)]
struct ResolutionYamlTest {
    cases: Vec<ResolutionCase>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResolutionCase {
    note: String,
    #[serde(default)]
    columns: Vec<ColumnDef>,
    #[serde(default)]
    options: TypeResolverOptions,
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    statement: StatementDef,
    #[serde(default)]
    expect: Expectations,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ColumnDef {
    table: String,
    name: String,
    #[serde(rename = "type")]
    kind: BasicType,
    #[serde(default)]
    nullable: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ExprDef {
    Literal(serde_yaml::Value),
    Blob(String),
    Param(String),
    Column(String),
    Unresolved(String),
    Unary(String, Box<ExprDef>),
    Binary(String, Box<ExprDef>, Box<ExprDef>),
    Is(Box<ExprDef>, Box<ExprDef>),
    Between(Box<ExprDef>, Box<ExprDef>, Box<ExprDef>),
    In(Box<ExprDef>, Vec<ExprDef>),
    Cast(Box<ExprDef>, String),
    Parens(Box<ExprDef>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ResultColumnDef {
    Expr(ExprDef),
    /// Expands to every column of the named table, or of the catalog.
    Star(Option<String>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SelectDef {
    #[serde(default)]
    columns: Vec<ResultColumnDef>,
    #[serde(default, rename = "where")]
    where_clause: Option<ExprDef>,
    #[serde(default)]
    having: Option<ExprDef>,
    #[serde(default)]
    limit: Option<ExprDef>,
    #[serde(default)]
    offset: Option<ExprDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InsertDef {
    table: String,
    #[serde(default)]
    targets: Vec<String>,
    #[serde(default)]
    values: Vec<Vec<ExprDef>>,
    #[serde(default)]
    select: Option<SelectDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SetDef {
    column: String,
    value: ExprDef,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateDef {
    table: String,
    set: Vec<SetDef>,
    #[serde(default, rename = "where")]
    where_clause: Option<ExprDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeleteDef {
    table: String,
    #[serde(default, rename = "where")]
    where_clause: Option<ExprDef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum StatementDef {
    Select(SelectDef),
    Insert(InsertDef),
    Update(UpdateDef),
    Delete(DeleteDef),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Expectations {
    /// Bound parameter types; `null` for a parameter left untyped.
    #[serde(default)]
    params: BTreeMap<String, Option<ResolvedType>>,
    /// Output row of a SELECT statement.
    #[serde(default)]
    row: Option<Vec<Option<ResolvedType>>>,
    /// Type of the statement's WHERE clause.
    #[serde(default, rename = "where")]
    where_type: Option<ResolvedType>,
    /// Diagnostic kinds in reporting order.
    #[serde(default)]
    diagnostics: Vec<String>,
    /// The statement breaks a traversal contract.
    #[serde(default)]
    error: bool,
}

struct CaseBuilder<'a> {
    b: Builder,
    columns: &'a ColumnCatalog,
}

impl CaseBuilder<'_> {
    fn lookup(&self, name: &str) -> Result<ColumnId> {
        let (table, name) = match name.split_once('.') {
            Some((table, column)) => (Some(table), column),
            None => (None, name),
        };
        self.columns
            .iter()
            .find(|(_, column)| match column {
                Column::Table {
                    table: t, name: n, ..
                } => n == name && table.map_or(true, |table| t == table),
                _ => false,
            })
            .map(|(id, _)| id)
            .ok_or_else(|| anyhow!("no column `{name}` in the catalog"))
    }

    fn table_columns(&self, table: Option<&str>) -> Vec<ColumnId> {
        self.columns
            .iter()
            .filter(|(_, column)| match column {
                Column::Table { table: t, .. } => table.map_or(true, |table| t == table),
                _ => false,
            })
            .map(|(id, _)| id)
            .collect()
    }

    fn operator(token: &str) -> Result<Operator> {
        Operator::from_token(token).ok_or_else(|| anyhow!("unknown operator `{token}`"))
    }

    fn expr(&mut self, def: &ExprDef) -> Result<Expr> {
        Ok(match def {
            ExprDef::Literal(value) => {
                let literal = match value {
                    serde_yaml::Value::Null => Literal::Null,
                    serde_yaml::Value::Bool(value) => Literal::Boolean(*value),
                    serde_yaml::Value::Number(number) => Literal::Numeric(number.to_string()),
                    serde_yaml::Value::String(value) => Literal::String {
                        value: value.clone(),
                        is_binary: false,
                    },
                    _ => bail!("unsupported literal {value:?}"),
                };
                self.b.literal(literal)
            }
            ExprDef::Blob(hex) => self.b.blob(hex),
            ExprDef::Param(key) => match key.strip_prefix('?') {
                Some(index) => self.b.variable(index.parse()?),
                None => self.b.named_variable(key),
            },
            ExprDef::Column(name) => {
                let id = self.lookup(name)?;
                self.b.reference(name, Some(id))
            }
            ExprDef::Unresolved(name) => self.b.reference(name, None),
            ExprDef::Unary(op, operand) => {
                let operand = self.expr(operand)?;
                self.b.unary(Self::operator(op)?, operand)
            }
            ExprDef::Binary(op, left, right) => {
                let left = self.expr(left)?;
                let right = self.expr(right)?;
                self.b.binary(Self::operator(op)?, left, right)
            }
            ExprDef::Is(left, right) => {
                let left = self.expr(left)?;
                let right = self.expr(right)?;
                self.b.is(false, left, right)
            }
            ExprDef::Between(check, lower, upper) => {
                let check = self.expr(check)?;
                let lower = self.expr(lower)?;
                let upper = self.expr(upper)?;
                self.b.between(false, check, lower, upper)
            }
            ExprDef::In(left, values) => {
                let left = self.expr(left)?;
                let values = values
                    .iter()
                    .map(|value| self.expr(value))
                    .collect::<Result<Vec<_>>>()?;
                self.b.in_list(false, left, values)
            }
            ExprDef::Cast(operand, type_name) => {
                let operand = self.expr(operand)?;
                self.b.cast(operand, type_name)
            }
            ExprDef::Parens(inner) => {
                let inner = self.expr(inner)?;
                self.b.parens(inner)
            }
        })
    }

    fn optional(&mut self, def: &Option<ExprDef>) -> Result<Option<Expr>> {
        def.as_ref().map(|def| self.expr(def)).transpose()
    }

    fn select(&mut self, def: &SelectDef) -> Result<SelectStatement> {
        let mut columns = Vec::with_capacity(def.columns.len());
        for column in &def.columns {
            columns.push(match column {
                ResultColumnDef::Expr(expr) => ResultColumn::Expression {
                    expr: self.expr(expr)?,
                    alias: None,
                },
                ResultColumnDef::Star(table) => ResultColumn::Star {
                    table: table.clone(),
                    expanded: self.table_columns(table.as_deref()),
                },
            });
        }

        let limit = match &def.limit {
            Some(count) => Some(Limit {
                count: self.expr(count)?,
                offset: self.optional(&def.offset)?,
            }),
            None => None,
        };

        Ok(SelectStatement {
            columns,
            where_clause: self.optional(&def.where_clause)?,
            having: self.optional(&def.having)?,
            limit,
            ..Default::default()
        })
    }

    fn statement(&mut self, def: &StatementDef) -> Result<Statement> {
        Ok(match def {
            StatementDef::Select(select) => Statement::Select(self.select(select)?),
            StatementDef::Insert(insert) => {
                let (target_columns, resolved_targets) = if insert.targets.is_empty() {
                    (Vec::new(), self.table_columns(Some(&insert.table)))
                } else {
                    let mut references = Vec::new();
                    let mut ids = Vec::new();
                    for name in &insert.targets {
                        let id = self.lookup(&format!("{}.{name}", insert.table))?;
                        references.push(self.b.reference(name, Some(id)));
                        ids.push(id);
                    }
                    (references, ids)
                };

                let source = match (&insert.select, insert.values.is_empty()) {
                    (Some(select), true) => InsertSource::Select(self.select(select)?),
                    (None, false) => InsertSource::Values(
                        insert
                            .values
                            .iter()
                            .map(|row| row.iter().map(|v| self.expr(v)).collect())
                            .collect::<Result<Vec<Vec<Expr>>>>()?,
                    ),
                    (None, true) => InsertSource::DefaultValues,
                    (Some(_), false) => bail!("insert has both values and a select"),
                };

                Statement::Insert(InsertStatement {
                    with: None,
                    table: insert.table.clone(),
                    target_columns,
                    resolved_targets,
                    source,
                })
            }
            StatementDef::Update(update) => {
                let mut set = Vec::with_capacity(update.set.len());
                for component in &update.set {
                    let id = self.lookup(&format!("{}.{}", update.table, component.column))?;
                    set.push(SetComponent {
                        column: self.b.reference(&component.column, Some(id)),
                        value: self.expr(&component.value)?,
                    });
                }
                Statement::Update(UpdateStatement {
                    with: None,
                    table: update.table.clone(),
                    set,
                    where_clause: self.optional(&update.where_clause)?,
                })
            }
            StatementDef::Delete(delete) => Statement::Delete(DeleteStatement {
                with: None,
                table: delete.table.clone(),
                where_clause: self.optional(&delete.where_clause)?,
            }),
        })
    }
}

fn where_clause(statement: &Statement) -> Option<&Expr> {
    match statement {
        Statement::Select(select) => select.where_clause.as_ref(),
        Statement::Update(update) => update.where_clause.as_ref(),
        Statement::Delete(delete) => delete.where_clause.as_ref(),
        Statement::Insert(_) | Statement::CreateIndex(_) => None,
    }
}

fn run_case(case: &ResolutionCase) -> Result<()> {
    let mut columns = ColumnCatalog::new();
    for column in &case.columns {
        let ty = ResolvedType::new(column.kind).with_nullability(column.nullable.into());
        columns.add_table_column(&column.table, &column.name, ty);
    }

    let mut builder = CaseBuilder {
        b: Builder::new(),
        columns: &columns,
    };
    let statement = builder.statement(&case.statement)?;

    let type_names = SqliteTypeNames::new();
    let resolver = TypeResolver::new(&columns, &type_names, case.options.clone());
    let resolution = match (resolver.resolve(&statement), case.expect.error) {
        (Ok(resolution), false) => resolution,
        (Err(_), true) => return Ok(()),
        (Ok(_), true) => bail!("expected resolution to fail"),
        (Err(err), false) => return Err(err.into()),
    };

    for (key, expected) in &case.expect.params {
        let actual = resolution.variable_type(key);
        if actual != *expected {
            bail!("parameter {key}: expected {expected:?}, got {actual:?}");
        }
    }

    if let Some(expected) = &case.expect.row {
        let Statement::Select(select) = &statement else {
            bail!("`row` expectations need a SELECT statement");
        };
        let actual = resolution.result_column_types(select);
        if actual != *expected {
            bail!("row: expected {expected:?}, got {actual:?}");
        }
    }

    if let Some(expected) = case.expect.where_type {
        let predicate = where_clause(&statement).ok_or_else(|| anyhow!("no WHERE clause"))?;
        let actual = resolution.type_of(predicate);
        if actual != Some(expected) {
            bail!("where: expected {expected:?}, got {actual:?}");
        }
    }

    let actual: Vec<String> = resolution
        .diagnostics()
        .iter()
        .map(|d| format!("{:?}", d.kind))
        .collect();
    if actual != case.expect.diagnostics {
        let messages: Vec<&str> = resolution
            .diagnostics()
            .iter()
            .map(|d| d.message.as_str())
            .collect();
        bail!(
            "diagnostics: expected {:?}, got {actual:?} ({})",
            case.expect.diagnostics,
            messages.join("; ")
        );
    }

    Ok(())
}

fn yaml_test_impl(path: &str) -> Result<()> {
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read yaml test file {path}"))?;
    let test: ResolutionYamlTest = serde_yaml::from_str(&yaml)
        .with_context(|| format!("failed to parse yaml test file {path}"))?;

    for case in test.cases.iter() {
        run_case(case).with_context(|| format!("case `{}`", case.note))?;
    }

    Ok(())
}

#[test_resources("tests/type_analysis/**/*.yaml")]
fn run(path: &str) {
    yaml_test_impl(path).unwrap();
}
