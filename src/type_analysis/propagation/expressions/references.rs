// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::columns::ColumnId;
use crate::type_analysis::error::ResolveError;
use crate::type_analysis::graph::TypeGraph;
use crate::type_analysis::model::Typeable;
use crate::type_analysis::propagation::pipeline::TypeResolver;

impl TypeResolver<'_> {
    /// Links a column reference to the column it resolved to. References
    /// identifier resolution could not bind, and references to columns
    /// without an origin, are left alone.
    pub(crate) fn visit_reference(
        &self,
        node: Typeable,
        resolved: Option<ColumnId>,
        graph: &mut TypeGraph,
    ) -> Result<(), ResolveError> {
        let Some(column) = resolved else {
            return Ok(());
        };

        if self.handle_column(column, graph)? {
            self.lazy_copy(node, Typeable::Column(column), graph);
        }
        Ok(())
    }
}
