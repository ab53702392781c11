use crate::catalog::{Control, ControlCatalog, FeatureControlSet, classify_in};
use crate::error::EvaluationError;
use crate::expression::{DeploymentContext, ExpressionResolver};
use crate::fingerprint::fingerprint_for_result;
use crate::graph::{NodeToken, ResourceChain, ResourceGraph, ResourceNode, build_graph};
use crate::json::{Match, snippet};
use crate::report::DomainReport;
use crate::rules::{self, RuleOutcome};
use armguard_types::{ControlResult, ControlSeverity, DataMarker, VerificationResult, ids};
use rayon::prelude::*;
use serde_json::Value;

const RESOURCE_SNIPPET_CHARS: usize = 150;
const NOT_SUPPORTED_SNIPPET_CHARS: usize = 250;
const MATCH_SNIPPET_CHARS: usize = 150;

/// The already-parsed documents for one evaluation run.
#[derive(Clone, Copy, Debug)]
pub struct EvaluationInput<'a> {
    pub template: &'a Value,
    pub parameters: Option<&'a Value>,
    pub deployment: &'a DeploymentContext,
}

pub fn evaluate(
    input: &EvaluationInput<'_>,
    catalog: &ControlCatalog,
) -> Result<DomainReport, EvaluationError> {
    let resolver = ExpressionResolver::new(input.template, input.parameters, input.deployment);
    let graph = build_graph(input.template, &resolver, catalog)?;

    let mut covered = vec![false; graph.nodes.len()];
    let mut nested: Vec<(usize, NodeToken, Vec<ControlResult>)> = Vec::new();
    for node in graph.top_level() {
        let Some(feature) = node.feature else { continue };
        if node.children.is_empty() {
            continue;
        }
        let mut out = Vec::new();
        evaluate_nested(
            &graph,
            node,
            &catalog.feature(feature).nested,
            &resolver,
            &mut covered,
            &mut out,
        );
        nested.push((feature, node.token, out));
    }

    // Groups are independent once the graph is built.
    let grouped: Vec<Vec<ControlResult>> = graph
        .chains
        .par_iter()
        .map(|chain| evaluate_chain(&graph, chain, catalog, &resolver))
        .collect();

    let mut results = Vec::new();
    for (i, group) in grouped.into_iter().enumerate() {
        results.extend(group);
        for (feature, parent, out) in nested.iter_mut() {
            if first_chain_of(&graph.chains, *feature, *parent) == Some(i) {
                results.append(out);
            }
        }
    }
    for (_, _, out) in nested.iter_mut() {
        results.append(out);
    }

    for node in &graph.nodes {
        if node.feature.is_none() && !covered[node.token.0] {
            results.push(not_supported(node));
        }
    }

    tracing::debug!(
        resources = graph.nodes.len(),
        groups = graph.chains.len(),
        results = results.len(),
        "template evaluated"
    );
    Ok(DomainReport::new(results, graph.nodes.len() as u32))
}

/// First group of `feature` that holds `token`; groups of other features may also hold it
/// after cross-feature completion.
fn first_chain_of(chains: &[ResourceChain], feature: usize, token: NodeToken) -> Option<usize> {
    chains
        .iter()
        .position(|c| c.feature == feature && c.contains(token))
}

fn evaluate_chain(
    graph: &ResourceGraph<'_>,
    chain: &ResourceChain,
    catalog: &ControlCatalog,
    resolver: &ExpressionResolver<'_>,
) -> Vec<ControlResult> {
    let set = catalog.feature(chain.feature);
    set.controls
        .iter()
        .filter(|c| c.enabled)
        .map(|control| evaluate_on_members(graph, &chain.members, set, control, resolver))
        .collect()
}

/// The first member where the control's property is present decides the result.
fn evaluate_on_members(
    graph: &ResourceGraph<'_>,
    members: &[NodeToken],
    set: &FeatureControlSet,
    control: &Control,
    resolver: &ExpressionResolver<'_>,
) -> ControlResult {
    for &token in members {
        let node = graph.node(token);
        let found = rules::lookup(control, node.resource, &node.pointer);
        if !found.is_empty() {
            let outcome = rules::evaluate_control(control, &found, resolver);
            return build_result(set, control, node, outcome, &found);
        }
    }

    let root = graph.node(members[0]);
    let outcome = rules::evaluate_control(control, &[], resolver);
    let mut result = build_result(set, control, root, outcome, &[]);
    result.attempted_paths = members
        .iter()
        .flat_map(|t| {
            let pointer = &graph.node(*t).pointer;
            control
                .selectors
                .iter()
                .map(move |s| format!("{pointer}:{}", s.as_str()))
        })
        .collect();
    result.result_data_markers = result
        .attempted_paths
        .iter()
        .map(DataMarker::missing)
        .collect();
    result
}

/// Children declared inline are evaluated against the parent feature's nested control sets.
fn evaluate_nested(
    graph: &ResourceGraph<'_>,
    parent: &ResourceNode<'_>,
    sets: &[FeatureControlSet],
    resolver: &ExpressionResolver<'_>,
    covered: &mut [bool],
    out: &mut Vec<ControlResult>,
) {
    for &child_token in &parent.children {
        let child = graph.node(child_token);
        covered[child_token.0] = true;

        let matched = classify_in(sets, &child.resource_type)
            .or_else(|| classify_in(sets, &child.raw_type));
        let Some(index) = matched else {
            out.push(not_supported(child));
            continue;
        };

        let set = &sets[index];
        for control in set.controls.iter().filter(|c| c.enabled) {
            out.push(evaluate_on_members(graph, &[child_token], set, control, resolver));
        }
        evaluate_nested(graph, child, &set.nested, resolver, covered, out);
    }
}

fn build_result(
    set: &FeatureControlSet,
    control: &Control,
    node: &ResourceNode<'_>,
    outcome: RuleOutcome,
    found: &[Match<'_>],
) -> ControlResult {
    ControlResult {
        id: control.id.clone(),
        control_id: control.control_id.clone(),
        description: control.description.clone(),
        rationale: control.rationale.clone(),
        recommendation: control.recommendation.clone(),
        severity: control.severity,
        feature_name: Some(set.feature_name.clone()),
        supported_resources: set.supported_resources.clone(),
        resource_type: node.resource_type.clone(),
        resource_name: Some(node.resolved_name.clone()).filter(|n| !n.is_empty()),
        verification_result: outcome.result,
        is_token_not_found: outcome.is_token_not_found,
        is_token_not_valid: outcome.is_token_not_valid,
        expected_property: control.expected_property(),
        expected_value: outcome.expected_value,
        attempted_paths: Vec::new(),
        resource_data_marker: marker(&node.pointer, node.resource, RESOURCE_SNIPPET_CHARS),
        result_data_markers: found
            .iter()
            .map(|m| marker(&m.pointer, m.value, MATCH_SNIPPET_CHARS))
            .collect(),
        message: outcome.message,
        fingerprint: fingerprint_for_result(&control.id, &node.resource_type, &node.pointer),
    }
}

/// Result for a resource no control set covers.
fn not_supported(node: &ResourceNode<'_>) -> ControlResult {
    ControlResult {
        id: ids::CONTROL_NOT_SUPPORTED.to_string(),
        control_id: ids::CONTROL_NOT_SUPPORTED.to_string(),
        description: format!("No controls are defined for resource type '{}'", node.raw_type),
        rationale: String::new(),
        recommendation: String::new(),
        severity: ControlSeverity::Low,
        feature_name: None,
        supported_resources: Vec::new(),
        resource_type: node.raw_type.clone(),
        resource_name: Some(node.resolved_name.clone()).filter(|n| !n.is_empty()),
        verification_result: VerificationResult::NotApplicable,
        is_token_not_found: false,
        is_token_not_valid: false,
        expected_property: String::new(),
        expected_value: String::new(),
        attempted_paths: Vec::new(),
        resource_data_marker: marker(&node.pointer, node.resource, NOT_SUPPORTED_SNIPPET_CHARS),
        result_data_markers: Vec::new(),
        message: None,
        fingerprint: fingerprint_for_result(
            ids::CONTROL_NOT_SUPPORTED,
            &node.raw_type,
            &node.pointer,
        ),
    }
}

fn marker(pointer: &str, value: &Value, max_chars: usize) -> DataMarker {
    DataMarker {
        line: None,
        pointer: pointer.to_string(),
        snippet: snippet(value, max_chars),
    }
}
