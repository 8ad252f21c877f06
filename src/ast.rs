// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Statement trees consumed by the type resolver.
//!
//! Trees are produced by an upstream parser and decorated by identifier
//! resolution: column references carry the [`ColumnId`] they resolved to,
//! INSERT statements carry their resolved target columns and wildcards carry
//! the columns they expand to. Every expression owns a unique `eidx` handed
//! out by [`Builder`], which is what the type graph keys on.

mod builder;

pub use builder::Builder;

use alloc::{
    borrow::ToOwned,
    boxed::Box,
    format,
    string::{String, ToString},
    vec::Vec,
};
use core::fmt;

use crate::columns::ColumnId;

/// Operator tokens. Unary and binary expressions share the token set; each
/// position only accepts a subset of it.
#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Tilde,
    Not,
    And,
    Or,
    Equal,
    DoubleEqual,
    ExclamationEqual,
    LessMore,
    Less,
    LessEqual,
    More,
    MoreEqual,
    ShiftLeft,
    ShiftRight,
    Ampersand,
    Pipe,
    DoublePipe,
}

impl Operator {
    pub const ALL: [Operator; 22] = [
        Operator::Plus,
        Operator::Minus,
        Operator::Star,
        Operator::Slash,
        Operator::Percent,
        Operator::Tilde,
        Operator::Not,
        Operator::And,
        Operator::Or,
        Operator::Equal,
        Operator::DoubleEqual,
        Operator::ExclamationEqual,
        Operator::LessMore,
        Operator::Less,
        Operator::LessEqual,
        Operator::More,
        Operator::MoreEqual,
        Operator::ShiftLeft,
        Operator::ShiftRight,
        Operator::Ampersand,
        Operator::Pipe,
        Operator::DoublePipe,
    ];

    /// Operator spelled `token`; keywords match case-insensitively.
    pub fn from_token(token: &str) -> Option<Operator> {
        Self::ALL
            .into_iter()
            .find(|op| op.token().eq_ignore_ascii_case(token))
    }

    pub const fn token(&self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Percent => "%",
            Operator::Tilde => "~",
            Operator::Not => "NOT",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Equal => "=",
            Operator::DoubleEqual => "==",
            Operator::ExclamationEqual => "!=",
            Operator::LessMore => "<>",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::More => ">",
            Operator::MoreEqual => ">=",
            Operator::ShiftLeft => "<<",
            Operator::ShiftRight => ">>",
            Operator::Ampersand => "&",
            Operator::Pipe => "|",
            Operator::DoublePipe => "||",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum Literal {
    Null,
    Boolean(bool),
    /// Numeric literal kept in its source spelling.
    Numeric(String),
    /// String literal. `is_binary` is set for `X'..'` blob literals.
    String { value: String, is_binary: bool },
}

impl Literal {
    /// Whether a numeric literal spells an integer (decimal or `0x` hex).
    pub fn is_integer(&self) -> bool {
        let Literal::Numeric(text) = self else {
            return false;
        };

        let text = text.trim();
        if let Some(hex) = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
        {
            return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
        }
        text.parse::<i64>().is_ok()
    }
}

/// A bound parameter placeholder.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum Variable {
    /// `?` or `?NNN`; the index is the one assigned by the parser.
    Numbered(u32),
    /// `:name`, `@name` or `$name`, including the prefix.
    Named(String),
}

impl Variable {
    /// Key used to look up out-of-band type annotations.
    pub fn key(&self) -> String {
        match self {
            Variable::Numbered(index) => format!("?{index}"),
            Variable::Named(name) => name.clone(),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum Expr {
    Literal {
        value: Literal,
        eidx: u32,
    },

    Variable {
        variable: Variable,
        eidx: u32,
    },

    Unary {
        op: Operator,
        operand: Box<Expr>,
        eidx: u32,
    },

    Binary {
        op: Operator,
        left: Box<Expr>,
        right: Box<Expr>,
        eidx: u32,
    },

    // `left IS [NOT] right`
    Is {
        negated: bool,
        left: Box<Expr>,
        right: Box<Expr>,
        eidx: u32,
    },

    Between {
        negated: bool,
        check: Box<Expr>,
        lower: Box<Expr>,
        upper: Box<Expr>,
        eidx: u32,
    },

    In {
        negated: bool,
        left: Box<Expr>,
        values: Vec<Expr>,
        eidx: u32,
    },

    Exists {
        negated: bool,
        select: Box<SelectStatement>,
        eidx: u32,
    },

    Cast {
        operand: Box<Expr>,
        type_name: String,
        eidx: u32,
    },

    Parentheses {
        inner: Box<Expr>,
        eidx: u32,
    },

    Reference {
        table: Option<String>,
        column: String,
        /// Filled in by identifier resolution.
        resolved: Option<ColumnId>,
        eidx: u32,
    },
}

impl Expr {
    pub const fn eidx(&self) -> u32 {
        match *self {
            Self::Literal { eidx, .. }
            | Self::Variable { eidx, .. }
            | Self::Unary { eidx, .. }
            | Self::Binary { eidx, .. }
            | Self::Is { eidx, .. }
            | Self::Between { eidx, .. }
            | Self::In { eidx, .. }
            | Self::Exists { eidx, .. }
            | Self::Cast { eidx, .. }
            | Self::Parentheses { eidx, .. }
            | Self::Reference { eidx, .. } => eidx,
        }
    }

    /// Short human readable rendering used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Expr::Literal { value, .. } => match value {
                Literal::Null => "NULL".to_owned(),
                Literal::Boolean(true) => "TRUE".to_owned(),
                Literal::Boolean(false) => "FALSE".to_owned(),
                Literal::Numeric(text) => text.clone(),
                Literal::String {
                    value,
                    is_binary: false,
                } => format!("'{value}'"),
                Literal::String {
                    value,
                    is_binary: true,
                } => format!("X'{value}'"),
            },
            Expr::Variable { variable, .. } => variable.key(),
            Expr::Unary { op, .. } => format!("{op} expression"),
            Expr::Binary { op, .. } => format!("{op} expression"),
            Expr::Is { .. } => "IS expression".to_owned(),
            Expr::Between { .. } => "BETWEEN expression".to_owned(),
            Expr::In { .. } => "IN expression".to_owned(),
            Expr::Exists { .. } => "EXISTS expression".to_owned(),
            Expr::Cast { type_name, .. } => format!("CAST(.. AS {type_name})"),
            Expr::Parentheses { inner, .. } => format!("({})", inner.describe()),
            Expr::Reference {
                table: Some(table),
                column,
                ..
            } => format!("{table}.{column}"),
            Expr::Reference { column, .. } => column.to_string(),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum ResultColumn {
    /// `*` or `table.*`. `expanded` lists the columns the wildcard stands
    /// for, as determined by identifier resolution.
    Star {
        table: Option<String>,
        expanded: Vec<ColumnId>,
    },
    Expression {
        expr: Expr,
        alias: Option<String>,
    },
}

impl ResultColumn {
    /// Number of output columns this result column contributes.
    pub fn width(&self) -> usize {
        match self {
            ResultColumn::Star { expanded, .. } => expanded.len(),
            ResultColumn::Expression { .. } => 1,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Default)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum JoinOperator {
    #[default]
    Comma,
    Inner,
    Left,
    Cross,
    Natural,
}

#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum JoinConstraint {
    On(Expr),
    Using(Vec<String>),
}

#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct Join {
    pub operator: JoinOperator,
    pub query: Queryable,
    pub constraint: Option<JoinConstraint>,
}

impl Join {
    pub fn on_expression(&self) -> Option<&Expr> {
        match &self.constraint {
            Some(JoinConstraint::On(expr)) => Some(expr),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct JoinClause {
    pub primary: Queryable,
    pub joins: Vec<Join>,
}

/// A table-valued source in a FROM clause.
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum Queryable {
    Table {
        name: String,
        alias: Option<String>,
    },
    Subquery {
        select: Box<SelectStatement>,
        alias: Option<String>,
    },
    Join(Box<JoinClause>),
}

#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct OrderingTerm {
    pub expr: Expr,
    pub descending: bool,
}

#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct Limit {
    pub count: Expr,
    pub offset: Option<Expr>,
}

#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct CommonTableExpression {
    pub name: String,
    pub column_names: Vec<String>,
    pub select: SelectStatement,
}

#[derive(Debug, PartialEq, Clone, Default)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct WithClause {
    pub recursive: bool,
    pub ctes: Vec<CommonTableExpression>,
}

#[derive(Debug, PartialEq, Clone, Default)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct SelectStatement {
    pub with: Option<WithClause>,
    pub distinct: bool,
    pub columns: Vec<ResultColumn>,
    pub from: Option<Queryable>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderingTerm>,
    pub limit: Option<Limit>,
}

#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum InsertSource {
    Select(SelectStatement),
    Values(Vec<Vec<Expr>>),
    DefaultValues,
}

#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct InsertStatement {
    pub with: Option<WithClause>,
    pub table: String,
    /// Explicit target column list as written (column references).
    pub target_columns: Vec<Expr>,
    /// Columns the rows are written to, in order. Filled in by identifier
    /// resolution (all table columns when no explicit list was given).
    pub resolved_targets: Vec<ColumnId>,
    pub source: InsertSource,
}

#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct SetComponent {
    /// Column reference being assigned.
    pub column: Expr,
    pub value: Expr,
}

#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct UpdateStatement {
    pub with: Option<WithClause>,
    pub table: String,
    pub set: Vec<SetComponent>,
    pub where_clause: Option<Expr>,
}

#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct DeleteStatement {
    pub with: Option<WithClause>,
    pub table: String,
    pub where_clause: Option<Expr>,
}

#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct IndexedColumn {
    pub expr: Expr,
    pub descending: bool,
}

#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct CreateIndexStatement {
    pub name: String,
    pub on_table: String,
    pub unique: bool,
    pub columns: Vec<IndexedColumn>,
    /// Predicate of a partial index.
    pub where_clause: Option<Expr>,
}

#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    CreateIndex(CreateIndexStatement),
}

/// Borrowed view over any node of a statement tree.
///
/// The resolver dispatches on this enum; `children` yields the direct
/// children of a node in source order.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Select(&'a SelectStatement),
    Insert(&'a InsertStatement),
    Update(&'a UpdateStatement),
    Delete(&'a DeleteStatement),
    CreateIndex(&'a CreateIndexStatement),
    With(&'a WithClause),
    CommonTableExpression(&'a CommonTableExpression),
    ResultColumn(&'a ResultColumn),
    Queryable(&'a Queryable),
    JoinClause(&'a JoinClause),
    Join(&'a Join),
    OrderingTerm(&'a OrderingTerm),
    Limit(&'a Limit),
    InsertSource(&'a InsertSource),
    SetComponent(&'a SetComponent),
    IndexedColumn(&'a IndexedColumn),
    Expr(&'a Expr),
}

impl<'a> From<&'a Statement> for Node<'a> {
    fn from(statement: &'a Statement) -> Self {
        match statement {
            Statement::Select(s) => Node::Select(s),
            Statement::Insert(s) => Node::Insert(s),
            Statement::Update(s) => Node::Update(s),
            Statement::Delete(s) => Node::Delete(s),
            Statement::CreateIndex(s) => Node::CreateIndex(s),
        }
    }
}

impl<'a> Node<'a> {
    pub fn children(&self) -> Vec<Node<'a>> {
        let mut children = Vec::new();
        match *self {
            Node::Select(select) => {
                children.extend(select.with.as_ref().map(Node::With));
                children.extend(select.columns.iter().map(Node::ResultColumn));
                children.extend(select.from.as_ref().map(Node::Queryable));
                children.extend(select.where_clause.as_ref().map(Node::Expr));
                children.extend(select.group_by.iter().map(Node::Expr));
                children.extend(select.having.as_ref().map(Node::Expr));
                children.extend(select.order_by.iter().map(Node::OrderingTerm));
                children.extend(select.limit.as_ref().map(Node::Limit));
            }
            Node::Insert(insert) => {
                children.extend(insert.with.as_ref().map(Node::With));
                children.extend(insert.target_columns.iter().map(Node::Expr));
                children.push(Node::InsertSource(&insert.source));
            }
            Node::Update(update) => {
                children.extend(update.with.as_ref().map(Node::With));
                children.extend(update.set.iter().map(Node::SetComponent));
                children.extend(update.where_clause.as_ref().map(Node::Expr));
            }
            Node::Delete(delete) => {
                children.extend(delete.with.as_ref().map(Node::With));
                children.extend(delete.where_clause.as_ref().map(Node::Expr));
            }
            Node::CreateIndex(create) => {
                children.extend(create.columns.iter().map(Node::IndexedColumn));
                children.extend(create.where_clause.as_ref().map(Node::Expr));
            }
            Node::With(with) => {
                children.extend(with.ctes.iter().map(Node::CommonTableExpression));
            }
            Node::CommonTableExpression(cte) => children.push(Node::Select(&cte.select)),
            Node::ResultColumn(column) => match column {
                ResultColumn::Star { .. } => {}
                ResultColumn::Expression { expr, .. } => children.push(Node::Expr(expr)),
            },
            Node::Queryable(queryable) => match queryable {
                Queryable::Table { .. } => {}
                Queryable::Subquery { select, .. } => children.push(Node::Select(select)),
                Queryable::Join(clause) => children.push(Node::JoinClause(clause)),
            },
            Node::JoinClause(clause) => {
                children.push(Node::Queryable(&clause.primary));
                children.extend(clause.joins.iter().map(Node::Join));
            }
            Node::Join(join) => {
                children.push(Node::Queryable(&join.query));
                children.extend(join.on_expression().map(Node::Expr));
            }
            Node::OrderingTerm(term) => children.push(Node::Expr(&term.expr)),
            Node::Limit(limit) => {
                children.push(Node::Expr(&limit.count));
                children.extend(limit.offset.as_ref().map(Node::Expr));
            }
            Node::InsertSource(source) => match source {
                InsertSource::Select(select) => children.push(Node::Select(select)),
                InsertSource::Values(rows) => {
                    children.extend(rows.iter().flatten().map(Node::Expr));
                }
                InsertSource::DefaultValues => {}
            },
            Node::SetComponent(component) => {
                children.push(Node::Expr(&component.column));
                children.push(Node::Expr(&component.value));
            }
            Node::IndexedColumn(column) => children.push(Node::Expr(&column.expr)),
            Node::Expr(expr) => match expr {
                Expr::Literal { .. } | Expr::Variable { .. } | Expr::Reference { .. } => {}
                Expr::Unary { operand, .. } => children.push(Node::Expr(operand)),
                Expr::Binary { left, right, .. } | Expr::Is { left, right, .. } => {
                    children.push(Node::Expr(left));
                    children.push(Node::Expr(right));
                }
                Expr::Between {
                    check,
                    lower,
                    upper,
                    ..
                } => {
                    children.push(Node::Expr(check));
                    children.push(Node::Expr(lower));
                    children.push(Node::Expr(upper));
                }
                Expr::In { left, values, .. } => {
                    children.push(Node::Expr(left));
                    children.extend(values.iter().map(Node::Expr));
                }
                Expr::Exists { select, .. } => children.push(Node::Select(select)),
                Expr::Cast { operand, .. } => children.push(Node::Expr(operand)),
                Expr::Parentheses { inner, .. } => children.push(Node::Expr(inner)),
            },
        }
        children
    }

    /// Calls `visit` on this node and every node below it, parents first.
    pub fn walk(&self, visit: &mut impl FnMut(Node<'a>)) {
        visit(*self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// WHERE clause of the statements that carry one.
    pub fn where_clause(&self) -> Option<&'a Expr> {
        match *self {
            Node::Select(select) => select.where_clause.as_ref(),
            Node::Update(update) => update.where_clause.as_ref(),
            Node::Delete(delete) => delete.where_clause.as_ref(),
            Node::CreateIndex(create) => create.where_clause.as_ref(),
            _ => None,
        }
    }

    /// Node identity: two views are the same node when they point at the
    /// same tree element.
    pub fn is(&self, other: &Node<'_>) -> bool {
        match (self, other) {
            (Node::Expr(a), Node::Expr(b)) => a.eidx() == b.eidx(),
            _ => {
                core::mem::discriminant(self) == core::mem::discriminant(other)
                    && core::ptr::eq(self.addr(), other.addr())
            }
        }
    }

    fn addr(&self) -> *const () {
        match *self {
            Node::Select(n) => n as *const _ as *const (),
            Node::Insert(n) => n as *const _ as *const (),
            Node::Update(n) => n as *const _ as *const (),
            Node::Delete(n) => n as *const _ as *const (),
            Node::CreateIndex(n) => n as *const _ as *const (),
            Node::With(n) => n as *const _ as *const (),
            Node::CommonTableExpression(n) => n as *const _ as *const (),
            Node::ResultColumn(n) => n as *const _ as *const (),
            Node::Queryable(n) => n as *const _ as *const (),
            Node::JoinClause(n) => n as *const _ as *const (),
            Node::Join(n) => n as *const _ as *const (),
            Node::OrderingTerm(n) => n as *const _ as *const (),
            Node::Limit(n) => n as *const _ as *const (),
            Node::InsertSource(n) => n as *const _ as *const (),
            Node::SetComponent(n) => n as *const _ as *const (),
            Node::IndexedColumn(n) => n as *const _ as *const (),
            Node::Expr(n) => n as *const _ as *const (),
        }
    }
}
