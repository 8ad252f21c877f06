// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::{borrow::ToOwned, boxed::Box, string::ToString, vec::Vec};

use super::{Expr, Literal, Operator, SelectStatement, Variable};
use crate::columns::ColumnId;

/// Constructs expressions with unique expression indices.
///
/// All expressions of one statement must come from the same builder so that
/// their `eidx` values do not collide.
#[derive(Debug, Default, Clone)]
pub struct Builder {
    num_expressions: u32,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of expressions created so far.
    pub fn num_expressions(&self) -> u32 {
        self.num_expressions
    }

    fn next_eidx(&mut self) -> u32 {
        let eidx = self.num_expressions;
        self.num_expressions += 1;
        eidx
    }

    pub fn literal(&mut self, value: Literal) -> Expr {
        Expr::Literal {
            value,
            eidx: self.next_eidx(),
        }
    }

    pub fn null(&mut self) -> Expr {
        self.literal(Literal::Null)
    }

    pub fn boolean(&mut self, value: bool) -> Expr {
        self.literal(Literal::Boolean(value))
    }

    pub fn numeric(&mut self, text: &str) -> Expr {
        self.literal(Literal::Numeric(text.to_owned()))
    }

    pub fn integer(&mut self, value: i64) -> Expr {
        self.literal(Literal::Numeric(value.to_string()))
    }

    pub fn string(&mut self, value: &str) -> Expr {
        self.literal(Literal::String {
            value: value.to_owned(),
            is_binary: false,
        })
    }

    pub fn blob(&mut self, hex: &str) -> Expr {
        self.literal(Literal::String {
            value: hex.to_owned(),
            is_binary: true,
        })
    }

    pub fn variable(&mut self, index: u32) -> Expr {
        Expr::Variable {
            variable: Variable::Numbered(index),
            eidx: self.next_eidx(),
        }
    }

    pub fn named_variable(&mut self, name: &str) -> Expr {
        Expr::Variable {
            variable: Variable::Named(name.to_owned()),
            eidx: self.next_eidx(),
        }
    }

    pub fn unary(&mut self, op: Operator, operand: Expr) -> Expr {
        Expr::Unary {
            op,
            operand: Box::new(operand),
            eidx: self.next_eidx(),
        }
    }

    pub fn binary(&mut self, op: Operator, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            eidx: self.next_eidx(),
        }
    }

    pub fn is(&mut self, negated: bool, left: Expr, right: Expr) -> Expr {
        Expr::Is {
            negated,
            left: Box::new(left),
            right: Box::new(right),
            eidx: self.next_eidx(),
        }
    }

    pub fn between(&mut self, negated: bool, check: Expr, lower: Expr, upper: Expr) -> Expr {
        Expr::Between {
            negated,
            check: Box::new(check),
            lower: Box::new(lower),
            upper: Box::new(upper),
            eidx: self.next_eidx(),
        }
    }

    pub fn in_list(&mut self, negated: bool, left: Expr, values: Vec<Expr>) -> Expr {
        Expr::In {
            negated,
            left: Box::new(left),
            values,
            eidx: self.next_eidx(),
        }
    }

    pub fn exists(&mut self, negated: bool, select: SelectStatement) -> Expr {
        Expr::Exists {
            negated,
            select: Box::new(select),
            eidx: self.next_eidx(),
        }
    }

    pub fn cast(&mut self, operand: Expr, type_name: &str) -> Expr {
        Expr::Cast {
            operand: Box::new(operand),
            type_name: type_name.to_owned(),
            eidx: self.next_eidx(),
        }
    }

    pub fn parens(&mut self, inner: Expr) -> Expr {
        Expr::Parentheses {
            inner: Box::new(inner),
            eidx: self.next_eidx(),
        }
    }

    pub fn reference(&mut self, column: &str, resolved: Option<ColumnId>) -> Expr {
        Expr::Reference {
            table: None,
            column: column.to_owned(),
            resolved,
            eidx: self.next_eidx(),
        }
    }

    pub fn qualified_reference(
        &mut self,
        table: &str,
        column: &str,
        resolved: Option<ColumnId>,
    ) -> Expr {
        Expr::Reference {
            table: Some(table.to_owned()),
            column: column.to_owned(),
            resolved,
            eidx: self.next_eidx(),
        }
    }
}
