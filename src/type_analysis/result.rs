// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Final types of one resolved statement, keyed the way callers look them
//! up.

use alloc::{
    collections::{BTreeMap, BTreeSet},
    string::String,
    vec::Vec,
};

use crate::ast::{Expr, Node, ResultColumn, SelectStatement, Statement};
use crate::columns::ColumnId;
use crate::type_analysis::graph::ResolvedTypes;
use crate::type_analysis::model::{ResolvedType, TypeDiagnostic, Typeable};

#[derive(Clone, Debug, Default)]
pub struct TypeResolution {
    types: ResolvedTypes,
    /// Every occurrence of each bound parameter, keyed by variable key.
    variables: BTreeMap<String, Vec<u32>>,
}

impl TypeResolution {
    pub(crate) fn new(statement: &Statement, mut types: ResolvedTypes) -> Self {
        let flagged: BTreeSet<u32> = types
            .diagnostics()
            .iter()
            .filter_map(|diagnostic| match diagnostic.node {
                Typeable::Expr(eidx) => Some(eidx),
                Typeable::Column(_) => None,
            })
            .collect();

        let mut variables: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        let mut subjects = BTreeMap::new();
        Node::from(statement).walk(&mut |node| {
            let Node::Expr(expr) = node else {
                return;
            };
            if flagged.contains(&expr.eidx()) {
                subjects.insert(expr.eidx(), expr.describe());
            }
            if let Expr::Variable { variable, eidx } = expr {
                variables.entry(variable.key()).or_default().push(*eidx);
            }
        });
        types.describe_subjects(&subjects);

        TypeResolution { types, variables }
    }

    pub fn expr_type(&self, eidx: u32) -> Option<ResolvedType> {
        self.types.get(Typeable::Expr(eidx))
    }

    pub fn type_of(&self, expr: &Expr) -> Option<ResolvedType> {
        self.expr_type(expr.eidx())
    }

    pub fn column_type(&self, column: ColumnId) -> Option<ResolvedType> {
        self.types.get(Typeable::Column(column))
    }

    /// Type of the bound parameter `key` (`?1`, `:name`, ...). A parameter
    /// used more than once takes the type of its first typed occurrence.
    pub fn variable_type(&self, key: &str) -> Option<ResolvedType> {
        self.variables
            .get(key)?
            .iter()
            .find_map(|eidx| self.expr_type(*eidx))
    }

    /// Every bound parameter of the statement with its type, if inferred.
    pub fn variable_types(&self) -> BTreeMap<String, Option<ResolvedType>> {
        self.variables
            .keys()
            .map(|key| (key.clone(), self.variable_type(key)))
            .collect()
    }

    /// Types of the output row of `select`, wildcards expanded.
    pub fn result_column_types(&self, select: &SelectStatement) -> Vec<Option<ResolvedType>> {
        let mut types = Vec::new();
        for column in &select.columns {
            match column {
                ResultColumn::Expression { expr, .. } => types.push(self.type_of(expr)),
                ResultColumn::Star { expanded, .. } => {
                    types.extend(expanded.iter().map(|column| self.column_type(*column)))
                }
            }
        }
        types
    }

    pub fn types(&self) -> &ResolvedTypes {
        &self.types
    }

    pub fn diagnostics(&self) -> &[TypeDiagnostic] {
        self.types.diagnostics()
    }

    /// Whether resolution finished without any diagnostic.
    pub fn is_well_typed(&self) -> bool {
        self.diagnostics().is_empty()
    }
}
