// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::type_analysis::{
    BasicType, CastMode, LazyCopy, Nullability, Relationship, ResolveError, ResolvedType,
    TypeDiagnosticKind, TypeExpectation, TypeGraph, Typeable,
};

use alloc::{vec, vec::Vec};
use anyhow::Result;

const A: Typeable = Typeable::Expr(0);
const B: Typeable = Typeable::Expr(1);
const C: Typeable = Typeable::Expr(2);
const D: Typeable = Typeable::Expr(3);

fn kinds(diagnostics: &[crate::type_analysis::TypeDiagnostic]) -> Vec<TypeDiagnosticKind> {
    diagnostics.iter().map(|d| d.kind).collect()
}

#[test]
fn copy_from_waits_for_source() {
    let mut graph = TypeGraph::new();
    graph.add_relationship(Relationship::copy_from(A, B));
    graph.mark_resolved(B, ResolvedType::int().nullable(false));

    let types = graph.finish();
    assert_eq!(types.get(A), Some(ResolvedType::int().nullable(false)));
    assert!(types.diagnostics().is_empty());
}

#[test]
fn copy_chain_resolves_in_any_order() {
    let mut graph = TypeGraph::new();
    graph.add_relationship(Relationship::copy_from(A, B));
    graph.add_relationship(Relationship::copy_from(B, C));
    graph.mark_resolved(C, ResolvedType::text().nullable(true));

    let types = graph.finish();
    assert_eq!(types.get(A), Some(ResolvedType::text().nullable(true)));
    assert_eq!(types.get(B), Some(ResolvedType::text().nullable(true)));
}

#[test]
fn copy_from_copies_kind_before_nullability() {
    let mut graph = TypeGraph::new();
    graph.add_relationship(Relationship::copy_from(A, B));
    graph.mark_resolved(B, ResolvedType::real());

    let types = graph.finish();
    // Unknown nullability is a valid final state.
    assert_eq!(types.get(A), Some(ResolvedType::real()));
    assert!(types.diagnostics().is_empty());
}

#[test]
fn copy_and_cast_numeric() {
    let cases = [
        (BasicType::Null, BasicType::Null),
        (BasicType::Bool, BasicType::Int),
        (BasicType::Int, BasicType::Int),
        (BasicType::Real, BasicType::Real),
        (BasicType::Text, BasicType::Real),
        (BasicType::Blob, BasicType::Real),
    ];

    for (source, expected) in cases {
        assert_eq!(CastMode::Numeric.cast(source), expected);

        let mut graph = TypeGraph::new();
        graph.add_relationship(Relationship::CopyAndCast {
            target: A,
            source: B,
            mode: CastMode::Numeric,
        });
        graph.mark_resolved(B, ResolvedType::new(source).nullable(true));
        let types = graph.finish();
        assert_eq!(types.get(A), Some(ResolvedType::new(expected).nullable(true)));
    }
}

#[test]
fn copy_encapsulating_widens() {
    let mut graph = TypeGraph::new();
    graph.add_relationship(Relationship::CopyEncapsulating {
        target: A,
        sources: vec![B, C],
    });
    graph.mark_resolved(B, ResolvedType::int().nullable(false));
    graph.mark_resolved(C, ResolvedType::real().nullable(false));

    let types = graph.finish();
    assert_eq!(types.get(A), Some(ResolvedType::real().nullable(false)));
}

#[test]
fn copy_encapsulating_is_nullable_as_soon_as_one_source_is() {
    let mut graph = TypeGraph::new();
    graph.add_relationship(Relationship::CopyEncapsulating {
        target: A,
        sources: vec![B, C],
    });
    graph.mark_resolved(B, ResolvedType::null());
    graph.mark_resolved(C, ResolvedType::int());

    let types = graph.finish();
    assert_eq!(types.get(A), Some(ResolvedType::int().nullable(true)));
}

#[test]
fn copy_encapsulating_rejects_text_and_numbers() {
    let mut graph = TypeGraph::new();
    graph.add_relationship(Relationship::CopyEncapsulating {
        target: A,
        sources: vec![B, C],
    });
    graph.mark_resolved(B, ResolvedType::text().nullable(false));
    graph.mark_resolved(C, ResolvedType::int().nullable(false));

    let types = graph.finish();
    // Reported once, not again as unresolved.
    assert_eq!(
        kinds(types.diagnostics()),
        vec![TypeDiagnosticKind::IncompatibleTypes]
    );
    assert_eq!(types.diagnostics()[0].node, A);
    assert_eq!(types.get(A), None);
}

#[test]
fn nullable_if_any() {
    let mut graph = TypeGraph::new();
    graph.mark_resolved(A, ResolvedType::bool());
    graph.add_relationship(Relationship::nullable_if_any(A, vec![B, C]));
    graph.mark_resolved(B, ResolvedType::int().nullable(false));
    graph.mark_resolved(C, ResolvedType::int().nullable(false));
    assert_eq!(
        graph.finish().get(A),
        Some(ResolvedType::bool().nullable(false))
    );

    let mut graph = TypeGraph::new();
    graph.mark_resolved(A, ResolvedType::bool());
    graph.add_relationship(Relationship::nullable_if_any(A, vec![B, C]));
    graph.mark_resolved(B, ResolvedType::int());
    graph.mark_resolved(C, ResolvedType::int().nullable(true));
    assert_eq!(
        graph.finish().get(A),
        Some(ResolvedType::bool().nullable(true))
    );

    let mut graph = TypeGraph::new();
    graph.mark_resolved(A, ResolvedType::bool());
    graph.add_relationship(Relationship::nullable_if_any(A, vec![B, C]));
    graph.mark_resolved(B, ResolvedType::int());
    graph.mark_resolved(C, ResolvedType::int().nullable(false));
    assert_eq!(graph.finish().get(A), Some(ResolvedType::bool()));
}

#[test]
fn have_same_type_flows_both_ways() {
    let mut graph = TypeGraph::new();
    graph.add_relationship(Relationship::HaveSameType {
        first: A,
        second: B,
    });
    graph.mark_resolved(B, ResolvedType::text().nullable(false));
    let types = graph.finish();
    assert_eq!(types.get(A), Some(ResolvedType::text().nullable(false)));

    let mut graph = TypeGraph::new();
    graph.add_relationship(Relationship::HaveSameType {
        first: A,
        second: B,
    });
    graph.mark_resolved(A, ResolvedType::blob().nullable(true));
    let types = graph.finish();
    assert_eq!(types.get(B), Some(ResolvedType::blob().nullable(true)));
}

#[test]
fn have_same_type_is_idempotent() {
    let build = |times: usize| {
        let mut graph = TypeGraph::new();
        for _ in 0..times {
            graph.add_relationship(Relationship::HaveSameType {
                first: A,
                second: B,
            });
        }
        graph.mark_resolved(A, ResolvedType::int().nullable(false));
        graph.finish()
    };

    let once = build(1);
    let twice = build(2);
    assert_eq!(once.get(B), Some(ResolvedType::int().nullable(false)));
    assert_eq!(once.get(B), twice.get(B));
    assert!(twice.diagnostics().is_empty());
}

#[test]
fn have_same_type_contradiction() {
    let mut graph = TypeGraph::new();
    graph.add_relationship(Relationship::HaveSameType {
        first: A,
        second: B,
    });
    graph.mark_resolved(A, ResolvedType::text());
    graph.mark_resolved(B, ResolvedType::int());

    let types = graph.finish();
    assert_eq!(
        kinds(types.diagnostics()),
        vec![TypeDiagnosticKind::Contradiction]
    );
}

#[test]
fn have_same_type_numbers_agree() {
    let mut graph = TypeGraph::new();
    graph.add_relationship(Relationship::HaveSameType {
        first: A,
        second: B,
    });
    graph.mark_resolved(A, ResolvedType::real().nullable(false));
    graph.mark_resolved(B, ResolvedType::int().nullable(false));
    graph.add_relationship(Relationship::HaveSameType {
        first: B,
        second: C,
    });
    graph.mark_resolved(C, ResolvedType::null());

    assert!(graph.finish().diagnostics().is_empty());
}

#[test]
fn have_same_type_waits_for_copy() {
    let mut graph = TypeGraph::new();
    graph.add_relationship(Relationship::HaveSameType {
        first: A,
        second: B,
    });
    graph.mark_resolved(B, ResolvedType::text().nullable(false));
    graph.add_relationship(Relationship::copy_from(A, C));
    graph.mark_resolved(C, ResolvedType::int().nullable(true));

    let types = graph.finish();
    assert_eq!(types.get(A), Some(ResolvedType::int().nullable(true)));
    assert_eq!(
        kinds(types.diagnostics()),
        vec![TypeDiagnosticKind::Contradiction]
    );
    assert_eq!(types.diagnostics()[0].node, B);
}

#[test]
fn have_same_type_waits_for_encapsulation() {
    let mut graph = TypeGraph::new();
    graph.add_relationship(Relationship::HaveSameType {
        first: B,
        second: A,
    });
    graph.mark_resolved(B, ResolvedType::blob().nullable(false));
    graph.add_relationship(Relationship::CopyEncapsulating {
        target: A,
        sources: vec![C, D],
    });
    graph.mark_resolved(C, ResolvedType::int().nullable(false));
    graph.mark_resolved(D, ResolvedType::real().nullable(false));

    let types = graph.finish();
    assert_eq!(types.get(A), Some(ResolvedType::real().nullable(false)));
    assert_eq!(
        kinds(types.diagnostics()),
        vec![TypeDiagnosticKind::Contradiction]
    );
}

#[test]
fn have_same_type_waits_for_nullability() {
    let mut graph = TypeGraph::new();
    graph.add_relationship(Relationship::HaveSameType {
        first: A,
        second: B,
    });
    graph.mark_resolved(B, ResolvedType::bool().nullable(false));
    graph.mark_resolved(A, ResolvedType::bool());
    graph.add_relationship(Relationship::nullable_if_any(A, vec![C]));
    graph.mark_resolved(C, ResolvedType::int().nullable(true));

    let types = graph.finish();
    assert_eq!(types.get(A), Some(ResolvedType::bool().nullable(true)));
    assert!(types.diagnostics().is_empty());
}

#[test]
fn have_same_type_fills_stuck_nodes() {
    let mut graph = TypeGraph::new();
    graph.add_relationship(Relationship::HaveSameType {
        first: A,
        second: B,
    });
    graph.mark_resolved(B, ResolvedType::int().nullable(false));
    // C never gets a type, so the copy into A cannot fire.
    graph.add_relationship(Relationship::copy_from(A, C));

    let types = graph.finish();
    assert_eq!(types.get(A), Some(ResolvedType::int().nullable(false)));
    assert_eq!(
        kinds(types.diagnostics()),
        vec![TypeDiagnosticKind::Unresolved]
    );
    assert_eq!(types.diagnostics()[0].node, C);
}

#[test]
fn conflicting_derivations_are_reported() {
    let mut graph = TypeGraph::new();
    graph.mark_resolved(A, ResolvedType::text().nullable(false));
    graph.add_relationship(Relationship::copy_from(A, B));
    graph.mark_resolved(B, ResolvedType::int().nullable(false));

    let types = graph.finish();
    // The first kind stays.
    assert_eq!(types.get(A), Some(ResolvedType::text().nullable(false)));
    assert_eq!(
        kinds(types.diagnostics()),
        vec![TypeDiagnosticKind::Contradiction]
    );

    let mut graph = TypeGraph::new();
    graph.mark_resolved(A, ResolvedType::int().nullable(false));
    graph.add_relationship(Relationship::CopyAndCast {
        target: A,
        source: B,
        mode: CastMode::Numeric,
    });
    graph.mark_resolved(B, ResolvedType::bool().nullable(true));
    assert_eq!(
        kinds(graph.finish().diagnostics()),
        vec![TypeDiagnosticKind::Contradiction]
    );

    // Agreeing derivations are fine.
    let mut graph = TypeGraph::new();
    graph.mark_resolved(A, ResolvedType::real().nullable(true));
    graph.add_relationship(Relationship::copy_from(A, B));
    graph.mark_resolved(B, ResolvedType::int().nullable(true));
    assert!(graph.finish().diagnostics().is_empty());
}

#[test]
fn self_referential_relationships_are_ignored() {
    let mut graph = TypeGraph::new();
    graph.add_relationship(Relationship::copy_from(A, A));
    graph.add_relationship(Relationship::nullable_if_any(B, vec![B]));
    graph.mark_resolved(B, ResolvedType::int());

    let types = graph.finish();
    assert!(types.diagnostics().is_empty());
    assert_eq!(types.get(A), None);
    assert_eq!(types.get(B), Some(ResolvedType::int()));
}

#[test]
fn unresolved_nodes_are_reported() {
    let mut graph = TypeGraph::new();
    graph.register(A);
    graph.add_relationship(Relationship::copy_from(B, C));

    let types = graph.finish();
    assert_eq!(
        kinds(types.diagnostics()),
        vec![TypeDiagnosticKind::Unresolved; 3]
    );
    assert!(types.iter().next().is_none());
}

#[test]
fn direct_resolve_validates_expectation() {
    let mut graph = TypeGraph::new();
    graph.direct_resolve(
        A,
        ResolvedType::text().nullable(false),
        &TypeExpectation::exact(ResolvedType::int()),
    );
    assert_eq!(
        kinds(graph.diagnostics()),
        vec![TypeDiagnosticKind::TypeMismatch]
    );
    // The structural type is kept.
    assert_eq!(graph.kind_of(A), Some(BasicType::Text));

    graph.direct_resolve(B, ResolvedType::null(), &TypeExpectation::exact(ResolvedType::int()));
    graph.direct_resolve(C, ResolvedType::int(), &TypeExpectation::lax_bool());
    assert_eq!(graph.diagnostics().len(), 1);
}

#[test]
fn expectation_acceptance() {
    let strict_int = TypeExpectation::exact(ResolvedType::int());
    let lax_int = TypeExpectation::lax(ResolvedType::int());
    let lax_real = TypeExpectation::lax(ResolvedType::real());
    let lax_text = TypeExpectation::lax(ResolvedType::text());

    assert!(strict_int.accepts(&BasicType::Int));
    assert!(strict_int.accepts(&BasicType::Null));
    assert!(!strict_int.accepts(&BasicType::Bool));
    assert!(lax_int.accepts(&BasicType::Bool));
    assert!(!lax_int.accepts(&BasicType::Real));
    assert!(lax_real.accepts(&BasicType::Int));
    assert!(lax_text.accepts(&BasicType::Real));
    assert!(!lax_text.accepts(&BasicType::Blob));
    assert!(TypeExpectation::lax_bool().accepts(&BasicType::Int));
    assert!(!TypeExpectation::lax_bool().accepts(&BasicType::Text));

    assert!(TypeExpectation::numeric().accepts(&BasicType::Real));
    assert!(!TypeExpectation::numeric().accepts(&BasicType::Text));
    assert!(TypeExpectation::None.accepts(&BasicType::Blob));
    assert!(TypeExpectation::Select(vec![]).accepts(&BasicType::Blob));
}

#[test]
fn select_expectation_columns() {
    let row = TypeExpectation::Select(vec![
        TypeExpectation::exact(ResolvedType::int()),
        TypeExpectation::exact(ResolvedType::text()),
    ]);
    assert_eq!(row.column(0), TypeExpectation::exact(ResolvedType::int()));
    assert_eq!(row.column(1), TypeExpectation::exact(ResolvedType::text()));
    assert_eq!(row.column(2), TypeExpectation::None);
    assert_eq!(TypeExpectation::numeric().column(0), TypeExpectation::None);
}

#[test]
fn type_of_unknown_node_is_an_error() {
    let mut graph = TypeGraph::new();
    graph.register(A);
    assert_eq!(graph.type_of(A), Err(ResolveError::TypeNotKnown(A)));
    assert_eq!(graph.type_of(B), Err(ResolveError::TypeNotKnown(B)));
}

#[test]
fn knows_type_needs_nullability() -> Result<()> {
    let mut graph = TypeGraph::new();
    graph.mark_resolved(A, ResolvedType::int());
    assert!(!graph.knows_type(A));
    assert_eq!(graph.type_of(A)?, ResolvedType::int());

    graph.hint_nullability(A, true);
    assert!(graph.knows_type(A));
    assert_eq!(graph.type_of(A)?.nullable, Nullability::Nullable);

    // Unknown nullability does not erase a known one.
    graph.mark_resolved(A, ResolvedType::int());
    assert!(graph.knows_type(A));
    Ok(())
}

#[test]
fn lazy_copy_branches() {
    let mut graph = TypeGraph::new();
    assert_eq!(
        LazyCopy::plan(&graph, A, B),
        LazyCopy::Deferred(Relationship::copy_from(A, B))
    );

    graph.mark_resolved(B, ResolvedType::int());
    assert_eq!(
        LazyCopy::plan(&graph, A, B),
        LazyCopy::Deferred(Relationship::copy_from(A, B))
    );

    graph.hint_nullability(B, false);
    assert_eq!(
        LazyCopy::plan(&graph, A, B),
        LazyCopy::Now(ResolvedType::int().nullable(false))
    );
}

#[test]
fn relationship_nodes() {
    let relationship = Relationship::nullable_if_any(A, vec![B, C]);
    assert_eq!(relationship.nodes(), vec![A, B, C]);
    assert!(relationship.is_nullability_only());
    assert!(!Relationship::copy_from(A, B).is_nullability_only());
    assert!(Relationship::copy_from(A, A).is_self_referential());
    assert_eq!(relationship.target(), Some(A));
    assert_eq!(
        Relationship::HaveSameType {
            first: A,
            second: B
        }
        .target(),
        None
    );
}

#[test]
fn resolved_type_json() -> Result<()> {
    let ty: ResolvedType = serde_json::from_str(r#"{"type": "int", "nullable": false}"#)?;
    assert_eq!(ty, ResolvedType::int().nullable(false));

    let ty: ResolvedType = serde_json::from_str(r#"{"type": "text"}"#)?;
    assert_eq!(ty, ResolvedType::text());

    assert_eq!(
        serde_json::to_string(&ResolvedType::real().nullable(true))?,
        r#"{"type":"real","nullable":true}"#
    );
    assert_eq!(
        serde_json::to_string(&ResolvedType::blob())?,
        r#"{"type":"blob","nullable":null}"#
    );
    Ok(())
}
