//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - Chain construction (no repeated tokens, every classified resource grouped)
//! - Merge order independence for linear dependency paths
//! - Evaluation determinism
//! - Quote-aware argument splitting in expressions

use crate::catalog::{Comparator, ControlCatalog, ControlData};
use crate::engine::{EvaluationInput, evaluate};
use crate::expression::{DeploymentContext, ExpressionResolver, Resolved};
use crate::graph::build_graph;
use crate::test_support::{catalog, control, feature, resource};
use proptest::prelude::*;
use serde_json::{Value, json};

// ============================================================================
// Strategies
// ============================================================================

/// Up to eight resources, each optionally depending on any resource (itself included).
fn arb_dependency_edges() -> impl Strategy<Value = Vec<Option<usize>>> {
    (1usize..8).prop_flat_map(|n| prop::collection::vec(prop::option::of(0..n), n))
}

/// A permutation of `0..n` used as declaration order for a linear path.
fn arb_declaration_order() -> impl Strategy<Value = Vec<usize>> {
    (2usize..8).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
}

fn node_name(i: usize) -> String {
    format!("n{i:02}")
}

fn node_type(i: usize) -> String {
    format!("Test.Provider/r{i:02}")
}

fn template_from_edges(edges: &[Option<usize>]) -> Value {
    let resources: Vec<Value> = edges
        .iter()
        .enumerate()
        .map(|(i, dep)| {
            let deps: Vec<String> = dep
                .iter()
                .map(|d| format!("{}/{}", node_type(*d), node_name(*d)))
                .collect();
            let deps: Vec<&str> = deps.iter().map(String::as_str).collect();
            let mut r = resource(&node_type(i), &node_name(i), &deps);
            r["properties"] = json!({ "size": i });
            r
        })
        .collect();
    json!({ "resources": resources })
}

fn test_catalog() -> ControlCatalog {
    catalog(vec![feature(
        "Test",
        &["Test.Provider"],
        vec![control(
            "Test_Size",
            &["$.properties.size"],
            ControlData::IntegerValue {
                comparator: Comparator::GreaterThan,
                value: 3,
            },
        )],
    )])
}

// ============================================================================
// Property tests: chain construction
// ============================================================================

proptest! {
    /// No chain ever holds a token twice, even for cyclic input.
    #[test]
    fn chains_never_repeat_tokens(edges in arb_dependency_edges()) {
        let template = template_from_edges(&edges);
        let cat = test_catalog();
        let ctx = DeploymentContext::default();
        let resolver = ExpressionResolver::new(&template, None, &ctx);

        let graph = build_graph(&template, &resolver, &cat).expect("graph builds");
        for chain in &graph.chains {
            let mut tokens = chain.members.clone();
            tokens.sort();
            tokens.dedup();
            prop_assert_eq!(tokens.len(), chain.members.len(), "repeated token in {:?}", chain);
        }

        // Every classified resource takes part in at least one chain.
        for node in &graph.nodes {
            prop_assert!(graph.chains.iter().any(|c| c.contains(node.token)));
        }
    }

    /// A linear dependency path ends up as one chain whatever the declaration order.
    #[test]
    fn linear_paths_merge_regardless_of_order(order in arb_declaration_order()) {
        let n = order.len();
        let resources: Vec<Value> = order
            .iter()
            .map(|&i| {
                let dep = (i + 1 < n).then(|| node_name(i + 1));
                let deps: Vec<&str> = dep.iter().map(String::as_str).collect();
                resource(&node_type(i), &node_name(i), &deps)
            })
            .collect();
        let template = json!({ "resources": resources });
        let cat = test_catalog();
        let ctx = DeploymentContext::default();
        let resolver = ExpressionResolver::new(&template, None, &ctx);

        let graph = build_graph(&template, &resolver, &cat).expect("graph builds");
        prop_assert_eq!(graph.chains.len(), 1);
        let names: Vec<String> = graph.chains[0]
            .members
            .iter()
            .map(|t| graph.node(*t).resolved_name.clone())
            .collect();
        let expected: Vec<String> = (0..n).map(node_name).collect();
        prop_assert_eq!(names, expected);
    }

    /// Evaluating the same inputs twice yields identical result lists.
    #[test]
    fn evaluation_is_repeatable(edges in arb_dependency_edges()) {
        let template = template_from_edges(&edges);
        let cat = test_catalog();
        let ctx = DeploymentContext::default();
        let input = EvaluationInput { template: &template, parameters: None, deployment: &ctx };

        let first = evaluate(&input, &cat).expect("evaluates");
        let second = evaluate(&input, &cat).expect("evaluates");
        prop_assert_eq!(first, second);
    }
}

// ============================================================================
// Property tests: expressions
// ============================================================================

proptest! {
    /// Commas and spaces inside quoted literals never split an argument.
    #[test]
    fn concat_of_quoted_literals_joins_them(parts in prop::collection::vec("[a-z ,()]{0,8}", 1..5)) {
        let args: Vec<String> = parts.iter().map(|p| format!("'{p}'")).collect();
        let expr = format!("[concat({})]", args.join(", "));
        let template = json!({});
        let ctx = DeploymentContext::default();
        let resolver = ExpressionResolver::new(&template, None, &ctx);

        let resolved = resolver.resolve_str(&expr).expect("resolves");
        prop_assert_eq!(resolved, Resolved::Value(Value::String(parts.concat())));
    }
}
