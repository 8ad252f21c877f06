// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Resolution of declared type names (as used in `CAST` and column
//! declarations) to resolved types.

use alloc::{collections::BTreeMap, string::String};

use crate::type_analysis::{BasicType, ResolvedType};

/// Schema collaborator turning a declared type name into a type.
pub trait TypeNameResolver {
    /// The returned type's nullability is normally `unknown`; nullability of
    /// a column comes from its constraints, not from its type name.
    fn resolve_type_name(&self, type_name: &str) -> ResolvedType;
}

/// Resolves type names with SQLite's column affinity rules, extended with a
/// boolean affinity for names containing `BOOL`.
///
/// Rules are applied in order on the upper-cased name:
///
/// 1. contains `BOOL` → bool
/// 2. contains `INT` → int
/// 3. contains `CHAR`, `CLOB` or `TEXT` → text
/// 4. contains `BLOB`, or is empty → blob
/// 5. anything else (`REAL`, `FLOAT`, `DOUBLE`, `NUMERIC`, ...) → real
#[derive(Clone, Debug, Default)]
pub struct SqliteTypeNames {
    overrides: BTreeMap<String, BasicType>,
}

impl SqliteTypeNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps an exact type name (case-insensitive) to a fixed kind, bypassing
    /// the affinity rules.
    pub fn with_override(mut self, type_name: &str, kind: BasicType) -> Self {
        self.overrides
            .insert(type_name.trim().to_ascii_uppercase(), kind);
        self
    }

    pub fn affinity(type_name: &str) -> BasicType {
        let upper = type_name.to_ascii_uppercase();
        let upper = upper.trim();

        if upper.contains("BOOL") {
            BasicType::Bool
        } else if upper.contains("INT") {
            BasicType::Int
        } else if ["CHAR", "CLOB", "TEXT"].iter().any(|n| upper.contains(n)) {
            BasicType::Text
        } else if upper.is_empty() || upper.contains("BLOB") {
            BasicType::Blob
        } else {
            // REAL affinity and NUMERIC affinity both land here.
            BasicType::Real
        }
    }
}

impl TypeNameResolver for SqliteTypeNames {
    fn resolve_type_name(&self, type_name: &str) -> ResolvedType {
        let key = type_name.trim().to_ascii_uppercase();
        let kind = match self.overrides.get(&key) {
            Some(kind) => *kind,
            None => Self::affinity(&key),
        };
        ResolvedType::new(kind)
    }
}
