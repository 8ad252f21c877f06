// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::{
    collections::BTreeMap,
    format,
    string::{String, ToString},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast::Variable;
use crate::type_analysis::model::ResolvedType;

/// Configuration for the type resolver.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypeResolverOptions {
    /// Out-of-band annotations for bound parameters, keyed by `?N` or by
    /// the prefixed parameter name (`:id`, `@id`, `$id`).
    pub variable_types: BTreeMap<String, ResolvedType>,
    /// Let INSERT values coerce into their target columns instead of
    /// requiring the exact column kind.
    pub lax_insert_targets: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("JSON parse error: {0}")]
    JsonParseError(String),
    #[error("`{0}` is not a parameter key; expected `?N`, `:name`, `@name` or `$name`")]
    InvalidVariableKey(String),
}

impl From<serde_json::Error> for OptionsError {
    fn from(err: serde_json::Error) -> Self {
        OptionsError::JsonParseError(format!("{err}"))
    }
}

impl TypeResolverOptions {
    /// Parses options from their JSON form, e.g.
    /// `{"variable_types": {"?1": {"type": "int", "nullable": false}}}`.
    pub fn from_json_str(json: &str) -> Result<Self, OptionsError> {
        let options: TypeResolverOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        match self.variable_types.keys().find(|key| !is_variable_key(key)) {
            Some(key) => Err(OptionsError::InvalidVariableKey(key.clone())),
            None => Ok(()),
        }
    }

    pub fn with_variable_type(mut self, key: &str, ty: ResolvedType) -> Self {
        self.variable_types.insert(key.to_string(), ty);
        self
    }

    pub fn with_lax_insert_targets(mut self, lax: bool) -> Self {
        self.lax_insert_targets = lax;
        self
    }

    /// Annotated type of `variable`, if any.
    pub fn variable_type(&self, variable: &Variable) -> Option<ResolvedType> {
        self.variable_types.get(&variable.key()).copied()
    }
}

fn is_variable_key(key: &str) -> bool {
    if let Some(index) = key.strip_prefix('?') {
        return !index.is_empty() && index.chars().all(|c| c.is_ascii_digit());
    }
    key.len() > 1 && key.starts_with([':', '@', '$'])
}
