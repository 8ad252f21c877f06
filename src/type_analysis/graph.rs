// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The type graph: per-node kinds and nullability plus the relationships
//! still waiting to be closed.

use alloc::{
    collections::{BTreeMap, BTreeSet},
    format,
    string::String,
    vec::Vec,
};

use log::{debug, trace};

use super::error::ResolveError;
use super::model::{
    BasicType, Nullability, ResolvedType, TypeDiagnostic, TypeDiagnosticKind,
    TypeDiagnosticSeverity, TypeExpectation, Typeable,
};
use super::relationships::Relationship;

#[derive(Clone, Copy, Debug, Default)]
struct NodeState {
    kind: Option<BasicType>,
    nullable: Nullability,
}

impl NodeState {
    fn resolved(&self) -> Option<ResolvedType> {
        self.kind
            .map(|kind| ResolvedType::new(kind).with_nullability(self.nullable))
    }
}

/// A relationship together with the dimensions it has already settled.
#[derive(Clone, Debug)]
struct Pending {
    relationship: Relationship,
    kind_done: bool,
    nullability_done: bool,
}

/// Nodes that are still the target of an open relationship, per dimension.
#[derive(Debug, Default)]
struct Waiting {
    kind: BTreeSet<Typeable>,
    nullability: BTreeSet<Typeable>,
}

impl Waiting {
    fn collect(pending: &[Pending]) -> Self {
        let mut waiting = Waiting::default();
        for entry in pending {
            let Some(target) = entry.relationship.target() else {
                continue;
            };
            if !entry.kind_done {
                waiting.kind.insert(target);
            }
            if !entry.nullability_done {
                waiting.nullability.insert(target);
            }
        }
        waiting
    }
}

/// Mutable type graph filled during traversal.
///
/// The graph is finished exactly once: [`TypeGraph::finish`] consumes it, so
/// no relationship can be added after closing.
#[derive(Clone, Debug, Default)]
pub struct TypeGraph {
    nodes: BTreeMap<Typeable, NodeState>,
    pending: Vec<Pending>,
    diagnostics: Vec<TypeDiagnostic>,
    /// Nodes whose kind failed with a diagnostic already; they are not
    /// reported again as unresolved.
    failed: BTreeSet<Typeable>,
}

impl TypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `node` part of the graph without typing it.
    pub fn register(&mut self, node: Typeable) {
        self.nodes.entry(node).or_default();
    }

    /// Whether both kind and nullability of `node` are fixed.
    pub fn knows_type(&self, node: Typeable) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|state| state.kind.is_some() && state.nullable.is_known())
    }

    /// Kind of `node`, if known.
    pub fn kind_of(&self, node: Typeable) -> Option<BasicType> {
        self.nodes.get(&node).and_then(|state| state.kind)
    }

    pub fn type_of(&self, node: Typeable) -> Result<ResolvedType, ResolveError> {
        self.nodes
            .get(&node)
            .and_then(NodeState::resolved)
            .ok_or(ResolveError::TypeNotKnown(node))
    }

    /// Records a final type for `node`. A type with unknown nullability
    /// keeps any nullability already recorded.
    pub fn mark_resolved(&mut self, node: Typeable, ty: ResolvedType) {
        trace!("{node} resolved to {ty}");
        let state = self.nodes.entry(node).or_default();
        state.kind = Some(ty.kind);
        if ty.nullable.is_known() {
            state.nullable = ty.nullable;
        }
    }

    /// Validates `ty` against `expectation`, then records it.
    pub fn direct_resolve(
        &mut self,
        node: Typeable,
        ty: ResolvedType,
        expectation: &TypeExpectation,
    ) {
        if !expectation.accepts(&ty.kind) {
            self.report(
                node,
                TypeDiagnosticKind::TypeMismatch,
                format!("expected {expectation}, but {node} is {}", ty.kind),
            );
        }
        self.mark_resolved(node, ty);
    }

    /// Queues `relationship` for [`TypeGraph::finish`]. A relationship
    /// deriving a node from itself carries no information and is dropped.
    pub fn add_relationship(&mut self, relationship: Relationship) {
        if relationship.is_self_referential() {
            trace!("ignoring self-referential relationship {relationship:?}");
            return;
        }
        trace!("relationship {relationship:?}");

        for node in relationship.nodes() {
            self.register(node);
        }
        let kind_done = relationship.is_nullability_only();
        self.pending.push(Pending {
            relationship,
            kind_done,
            nullability_done: false,
        });
    }

    pub fn hint_nullability(&mut self, node: Typeable, nullable: bool) {
        trace!("{node} nullable: {nullable}");
        self.nodes.entry(node).or_default().nullable = Nullability::from(nullable);
    }

    pub fn diagnostics(&self) -> &[TypeDiagnostic] {
        &self.diagnostics
    }

    /// Closes all relationships to a fixpoint and reports what is left.
    ///
    /// Unification only fills a node once nothing else is left to derive
    /// it. When no pass makes progress any more, one more pass lets
    /// unification fill nodes whose own relationships are stuck.
    pub fn finish(mut self) -> ResolvedTypes {
        let mut pending = core::mem::take(&mut self.pending);
        debug!(
            "closing {} relationships over {} nodes",
            pending.len(),
            self.nodes.len()
        );

        let mut passes = 0usize;
        let mut unify_waiting = false;
        loop {
            passes += 1;
            let waiting = if unify_waiting {
                Waiting::default()
            } else {
                Waiting::collect(&pending)
            };
            let mut progress = false;
            for entry in pending.iter_mut() {
                progress |= self.apply(entry, &waiting);
            }
            pending.retain(|entry| !(entry.kind_done && entry.nullability_done));

            if progress {
                unify_waiting = false;
            } else if !unify_waiting && !pending.is_empty() {
                trace!("pass {passes} stalled, unifying nodes with open relationships");
                unify_waiting = true;
            } else {
                break;
            }
        }
        debug!(
            "fixpoint reached after {passes} passes, {} relationships left open",
            pending.len()
        );

        let unresolved: Vec<Typeable> = self
            .nodes
            .iter()
            .filter(|(node, state)| state.kind.is_none() && !self.failed.contains(node))
            .map(|(node, _)| *node)
            .collect();
        for node in unresolved {
            self.report(
                node,
                TypeDiagnosticKind::Unresolved,
                format!("could not infer a type for {node}"),
            );
        }

        let types = self
            .nodes
            .iter()
            .filter_map(|(node, state)| state.resolved().map(|ty| (*node, ty)))
            .collect();
        debug!("type graph finished with {} diagnostics", self.diagnostics.len());

        ResolvedTypes {
            types,
            diagnostics: self.diagnostics,
        }
    }

    fn report(&mut self, node: Typeable, kind: TypeDiagnosticKind, message: String) {
        trace!("diagnostic on {node}: {message}");
        self.diagnostics.push(TypeDiagnostic {
            message,
            kind,
            severity: TypeDiagnosticSeverity::Error,
            node,
            subject: None,
        });
    }

    fn state(&self, node: Typeable) -> NodeState {
        self.nodes.get(&node).copied().unwrap_or_default()
    }

    /// Derives the kind of `node`. A node that already has a disagreeing
    /// kind keeps it and is reported.
    fn set_kind(&mut self, node: Typeable, kind: BasicType) {
        match self.state(node).kind {
            None => self.nodes.entry(node).or_default().kind = Some(kind),
            Some(existing) if existing.agrees_with(&kind) => {}
            Some(existing) => self.report(
                node,
                TypeDiagnosticKind::Contradiction,
                format!("{node} resolved to {existing}, but is also derived as {kind}"),
            ),
        }
    }

    fn set_nullability(&mut self, node: Typeable, nullable: Nullability) {
        if !nullable.is_known() {
            return;
        }
        let existing = self.state(node).nullable;
        if !existing.is_known() {
            self.nodes.entry(node).or_default().nullable = nullable;
        } else if existing != nullable {
            let label = |n: Nullability| {
                if n == Nullability::Nullable {
                    "nullable"
                } else {
                    "non-null"
                }
            };
            self.report(
                node,
                TypeDiagnosticKind::Contradiction,
                format!(
                    "{node} is {}, but is also derived as {}",
                    label(existing),
                    label(nullable)
                ),
            );
        }
    }

    /// Applies one relationship. Returns whether anything changed, which
    /// includes settling a dimension of the relationship itself.
    fn apply(&mut self, entry: &mut Pending, waiting: &Waiting) -> bool {
        let mut changed = false;

        match &entry.relationship {
            Relationship::CopyTypeFrom { target, source } => {
                let source = self.state(*source);
                if !entry.kind_done {
                    if let Some(kind) = source.kind {
                        self.set_kind(*target, kind);
                        entry.kind_done = true;
                        changed = true;
                    }
                }
                if !entry.nullability_done && source.nullable.is_known() {
                    self.set_nullability(*target, source.nullable);
                    entry.nullability_done = true;
                    changed = true;
                }
            }
            Relationship::CopyAndCast {
                target,
                source,
                mode,
            } => {
                let source = self.state(*source);
                if !entry.kind_done {
                    if let Some(kind) = source.kind {
                        self.set_kind(*target, mode.cast(kind));
                        entry.kind_done = true;
                        changed = true;
                    }
                }
                if !entry.nullability_done && source.nullable.is_known() {
                    self.set_nullability(*target, source.nullable);
                    entry.nullability_done = true;
                    changed = true;
                }
            }
            Relationship::CopyEncapsulating { target, sources } => {
                let target = *target;
                let states: Vec<NodeState> = sources.iter().map(|s| self.state(*s)).collect();

                if !entry.kind_done && states.iter().all(|state| state.kind.is_some()) {
                    let encapsulated = states
                        .iter()
                        .filter_map(|state| state.kind)
                        .try_fold(BasicType::Null, |acc, kind| acc.encapsulate(&kind));
                    match encapsulated {
                        Some(kind) => {
                            self.set_kind(target, kind);
                        }
                        None => {
                            let kinds: Vec<&str> = states
                                .iter()
                                .filter_map(|state| state.kind.as_ref().map(BasicType::label))
                                .collect();
                            self.failed.insert(target);
                            self.report(
                                target,
                                TypeDiagnosticKind::IncompatibleTypes,
                                format!(
                                    "no common type for {target} can represent {}",
                                    kinds.join(", ")
                                ),
                            );
                        }
                    }
                    entry.kind_done = true;
                    changed = true;
                }

                if !entry.nullability_done {
                    if let Some(nullable) = Self::combined_nullability(&states) {
                        self.set_nullability(target, nullable);
                        entry.nullability_done = true;
                        changed = true;
                    }
                }
            }
            Relationship::NullableIfAny { target, others } => {
                let states: Vec<NodeState> = others.iter().map(|s| self.state(*s)).collect();
                if let Some(nullable) = Self::combined_nullability(&states) {
                    self.set_nullability(*target, nullable);
                    entry.nullability_done = true;
                    changed = true;
                }
            }
            Relationship::HaveSameType { first, second } => {
                let (first, second) = (*first, *second);
                let lhs = self.state(first);
                let rhs = self.state(second);

                if !entry.kind_done {
                    match (lhs.kind, rhs.kind) {
                        (Some(kind), None) if !waiting.kind.contains(&second) => {
                            self.set_kind(second, kind);
                            entry.kind_done = true;
                        }
                        (None, Some(kind)) if !waiting.kind.contains(&first) => {
                            self.set_kind(first, kind);
                            entry.kind_done = true;
                        }
                        (Some(lhs_kind), Some(rhs_kind)) => {
                            if !lhs_kind.agrees_with(&rhs_kind) {
                                self.report(
                                    second,
                                    TypeDiagnosticKind::Contradiction,
                                    format!(
                                        "{first} and {second} must have the same type, \
                                         but resolved to {lhs_kind} and {rhs_kind}"
                                    ),
                                );
                            }
                            entry.kind_done = true;
                        }
                        _ => {}
                    }
                    changed |= entry.kind_done;
                }

                if !entry.nullability_done {
                    match (lhs.nullable.is_known(), rhs.nullable.is_known()) {
                        (true, true) => entry.nullability_done = true,
                        (true, false) if !waiting.nullability.contains(&second) => {
                            self.set_nullability(second, lhs.nullable);
                            entry.nullability_done = true;
                        }
                        (false, true) if !waiting.nullability.contains(&first) => {
                            self.set_nullability(first, rhs.nullable);
                            entry.nullability_done = true;
                        }
                        _ => {}
                    }
                    changed |= entry.nullability_done;
                }
            }
        }

        changed
    }

    /// `Nullable` as soon as any state is nullable, `NonNull` once all are
    /// non-null, `None` while undecided.
    fn combined_nullability(states: &[NodeState]) -> Option<Nullability> {
        if states
            .iter()
            .any(|state| state.nullable == Nullability::Nullable)
        {
            Some(Nullability::Nullable)
        } else if states
            .iter()
            .all(|state| state.nullable == Nullability::NonNull)
        {
            Some(Nullability::NonNull)
        } else {
            None
        }
    }
}

/// Outcome of a finished graph: every typed node plus diagnostics.
#[derive(Clone, Debug, Default)]
pub struct ResolvedTypes {
    types: BTreeMap<Typeable, ResolvedType>,
    diagnostics: Vec<TypeDiagnostic>,
}

impl ResolvedTypes {
    pub fn get(&self, node: Typeable) -> Option<ResolvedType> {
        self.types.get(&node).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Typeable, ResolvedType)> + '_ {
        self.types.iter().map(|(node, ty)| (*node, *ty))
    }

    pub fn diagnostics(&self) -> &[TypeDiagnostic] {
        &self.diagnostics
    }

    /// Names the offending expression of every diagnostic found in
    /// `subjects`.
    pub(crate) fn describe_subjects(&mut self, subjects: &BTreeMap<u32, String>) {
        for diagnostic in &mut self.diagnostics {
            if let Typeable::Expr(eidx) = diagnostic.node {
                diagnostic.subject = subjects.get(&eidx).cloned();
            }
        }
    }
}
