//! Resource graph construction.
//!
//! Resources are flattened into an arena of [`ResourceNode`]s addressed by [`NodeToken`].
//! Chains are ordered token lists, so merging two chains never clones a node.

use crate::catalog::ControlCatalog;
use crate::error::EvaluationError;
use crate::expression::{ExpressionResolver, Resolved};
use crate::json::{get_ci, get_entry_ci, get_str_ci, plain_string, pointer_push};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeToken(pub usize);

#[derive(Clone, Debug)]
pub struct ResourceNode<'t> {
    pub token: NodeToken,
    /// Type used for classification; children declared inline get `parent-type/child-type`.
    pub resource_type: String,
    /// Type exactly as written in the document.
    pub raw_type: String,
    pub name: String,
    /// Name after expression resolution (the raw name when resolution fails).
    pub resolved_name: String,
    /// Index into the catalog's feature list; `None` means unclassified.
    pub feature: Option<usize>,
    pub resource: &'t Value,
    /// JSON pointer of the resource object within the template.
    pub pointer: String,
    pub depends_on: Vec<String>,
    pub parent: Option<NodeToken>,
    pub children: Vec<NodeToken>,
}

/// Root-first sequence of causally linked resources of one feature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceChain {
    pub feature: usize,
    pub members: Vec<NodeToken>,
}

impl ResourceChain {
    fn new(feature: usize, members: Vec<NodeToken>) -> Self {
        Self { feature, members }
    }

    pub fn span(&self) -> usize {
        self.members.len()
    }

    pub fn head(&self) -> NodeToken {
        self.members[0]
    }

    pub fn tail(&self) -> NodeToken {
        self.members[self.members.len() - 1]
    }

    pub fn contains(&self, token: NodeToken) -> bool {
        self.members.contains(&token)
    }
}

#[derive(Clone, Debug)]
pub struct ResourceGraph<'t> {
    pub nodes: Vec<ResourceNode<'t>>,
    /// Sorted by feature index, then head token.
    pub chains: Vec<ResourceChain>,
}

impl<'t> ResourceGraph<'t> {
    pub fn node(&self, token: NodeToken) -> &ResourceNode<'t> {
        &self.nodes[token.0]
    }

    pub fn top_level(&self) -> impl Iterator<Item = &ResourceNode<'t>> {
        self.nodes.iter().filter(|n| n.parent.is_none())
    }
}

/// Build the flattened node arena and the merged chains for one template.
pub fn build_graph<'t>(
    template: &'t Value,
    resolver: &ExpressionResolver<'_>,
    catalog: &ControlCatalog,
) -> Result<ResourceGraph<'t>, EvaluationError> {
    if !template.is_object() {
        return Err(EvaluationError::TemplateNotObject);
    }
    let (key, resources) =
        get_entry_ci(template, "resources").ok_or(EvaluationError::MissingResources)?;
    let resources = resources
        .as_array()
        .ok_or(EvaluationError::MissingResources)?;

    let mut nodes = Vec::new();
    flatten(
        resources,
        &pointer_push("", key),
        None,
        resolver,
        catalog,
        &mut nodes,
    );

    let targets = resolve_targets(&nodes, resolver);
    let mut builder = ChainBuilder {
        nodes: &nodes,
        targets: &targets,
        catalog,
        chains: Vec::new(),
        active: Vec::new(),
    };
    builder.link();
    builder.merge()?;
    builder.dedup();
    builder.add_singletons();
    builder.complete_within_feature();
    builder.complete_across_features();
    let chains = builder.finish()?;

    tracing::debug!(
        resources = nodes.len(),
        chains = chains.len(),
        "resource graph built"
    );
    Ok(ResourceGraph { nodes, chains })
}

fn flatten<'t>(
    items: &'t [Value],
    base_pointer: &str,
    parent: Option<NodeToken>,
    resolver: &ExpressionResolver<'_>,
    catalog: &ControlCatalog,
    nodes: &mut Vec<ResourceNode<'t>>,
) {
    for (i, resource) in items.iter().enumerate() {
        let pointer = pointer_push(base_pointer, &i.to_string());
        let raw_type = get_str_ci(resource, "type").unwrap_or_default().to_string();
        let resource_type = match parent {
            Some(p) if !raw_type.is_empty() && !raw_type.contains('/') => {
                format!("{}/{}", nodes[p.0].resource_type, raw_type)
            }
            _ => raw_type.clone(),
        };

        let name = get_ci(resource, "name").map(plain_string).unwrap_or_default();
        let resolved_name = match resolver.resolve_str(&name) {
            Ok(Resolved::Opaque(raw)) => raw,
            Ok(resolved) => plain_string(&resolved.into_value()),
            Err(e) => {
                tracing::debug!(resource = %pointer, error = %e, "resource name left unresolved");
                name.clone()
            }
        };

        let depends_on = get_ci(resource, "dependsOn")
            .and_then(Value::as_array)
            .map(|deps| {
                deps.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let token = NodeToken(nodes.len());
        nodes.push(ResourceNode {
            token,
            feature: catalog.classify(&resource_type),
            resource_type,
            raw_type,
            name,
            resolved_name,
            resource,
            pointer: pointer.clone(),
            depends_on,
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            nodes[p.0].children.push(token);
        }

        if let Some((key, Value::Array(children))) = get_entry_ci(resource, "resources") {
            let child_base = pointer_push(&pointer, key);
            flatten(children, &child_base, Some(token), resolver, catalog, nodes);
        }
    }
}

/// Classified nodes each dependency of a classified node resolves to.
///
/// Unresolvable dependencies are skipped: the node simply gets no edge for them.
fn resolve_targets(
    nodes: &[ResourceNode<'_>],
    resolver: &ExpressionResolver<'_>,
) -> Vec<Vec<NodeToken>> {
    let classified: Vec<&ResourceNode<'_>> = nodes.iter().filter(|n| n.feature.is_some()).collect();
    let mut targets = vec![Vec::new(); nodes.len()];

    for node in &classified {
        for dep in &node.depends_on {
            let path = match resolver.resolve_dependency(dep) {
                Ok(path) => path,
                Err(e) => {
                    tracing::debug!(
                        resource = %node.pointer,
                        dependency = %dep,
                        error = %e,
                        "dependency skipped"
                    );
                    continue;
                }
            };
            for candidate in &classified {
                if candidate.token != node.token
                    && path.matches(&candidate.resource_type, &candidate.resolved_name)
                    && !targets[node.token.0].contains(&candidate.token)
                {
                    targets[node.token.0].push(candidate.token);
                }
            }
        }
    }
    targets
}

struct ChainBuilder<'g, 't> {
    nodes: &'g [ResourceNode<'t>],
    targets: &'g [Vec<NodeToken>],
    catalog: &'g ControlCatalog,
    chains: Vec<ResourceChain>,
    active: Vec<bool>,
}

impl ChainBuilder<'_, '_> {
    fn feature_of(&self, token: NodeToken) -> Option<usize> {
        self.nodes[token.0].feature
    }

    fn push(&mut self, chain: ResourceChain) {
        self.chains.push(chain);
        self.active.push(true);
    }

    /// Each classified node links to its last matched dependency of the same feature.
    fn link(&mut self) {
        for node in self.nodes {
            let Some(feature) = node.feature else { continue };
            let mut members = vec![node.token];
            if let Some(dep) = self.targets[node.token.0]
                .iter()
                .rev()
                .find(|t| self.feature_of(**t) == Some(feature))
            {
                members.push(*dep);
            }
            self.push(ResourceChain::new(feature, members));
        }
    }

    /// Splice chains whose remainder continues another chain's tail until nothing changes.
    fn merge(&mut self) -> Result<(), EvaluationError> {
        let n = self.nodes.len();
        let cap = n * (n + 1) + 1;
        let mut splices = 0usize;

        loop {
            let mut changed = false;
            for a in 0..self.chains.len() {
                if !self.active[a] {
                    continue;
                }
                while let Some(b) = self.find_continuation(a) {
                    splices += 1;
                    if splices > cap {
                        return Err(EvaluationError::MergeDidNotConverge {
                            stage: "chain merge",
                            iterations: splices,
                        });
                    }
                    self.splice(a, b);
                    changed = true;
                }
            }
            if !changed {
                return Ok(());
            }
        }
    }

    /// Another active chain that would add tokens to chain `a`, or be absorbed by it.
    fn find_continuation(&self, a: usize) -> Option<usize> {
        let chain = &self.chains[a];
        let tail = chain.tail();
        (0..self.chains.len()).find(|&b| {
            if b == a || !self.active[b] || self.chains[b].feature != chain.feature {
                return false;
            }
            let other = &self.chains[b];
            match other.members.iter().position(|t| *t == tail) {
                Some(pos) => {
                    let adds = other.members.get(pos + 1).is_some_and(|t| !chain.contains(*t));
                    let absorbs = pos == 0 && other.members.iter().all(|t| chain.contains(*t));
                    adds || absorbs
                }
                None => false,
            }
        })
    }

    fn splice(&mut self, a: usize, b: usize) {
        let tail = self.chains[a].tail();
        let other = self.chains[b].members.clone();
        let Some(pos) = other.iter().position(|t| *t == tail) else { return };

        for token in &other[pos + 1..] {
            // Stop at the first token already linked: the input declares a cycle.
            if self.chains[a].contains(*token) {
                break;
            }
            self.chains[a].members.push(*token);
        }
        if pos == 0 && other.iter().all(|t| self.chains[a].contains(*t)) {
            self.active[b] = false;
        }
    }

    /// Chains ending at the same resource: the larger span wins, then the lower head token.
    fn dedup(&mut self) {
        let mut best: BTreeMap<NodeToken, usize> = BTreeMap::new();
        for (i, chain) in self.chains.iter().enumerate() {
            if !self.active[i] {
                continue;
            }
            best.entry(chain.tail())
                .and_modify(|current| {
                    let cur = &self.chains[*current];
                    let better = chain.span() > cur.span()
                        || (chain.span() == cur.span() && chain.head() < cur.head());
                    if better {
                        *current = i;
                    }
                })
                .or_insert(i);
        }
        for (i, chain) in self.chains.iter().enumerate() {
            if self.active[i] && best.get(&chain.tail()) != Some(&i) {
                self.active[i] = false;
            }
        }
    }

    /// Classified nodes left out of every chain are evaluated on their own.
    fn add_singletons(&mut self) {
        let mut covered = vec![false; self.nodes.len()];
        for (i, chain) in self.chains.iter().enumerate() {
            if self.active[i] {
                for t in &chain.members {
                    covered[t.0] = true;
                }
            }
        }
        for node in self.nodes {
            if let Some(feature) = node.feature
                && !covered[node.token.0]
            {
                self.push(ResourceChain::new(feature, vec![node.token]));
            }
        }
    }

    /// Pull in dependencies of a type the chain's feature supports but the chain lacks.
    fn complete_within_feature(&mut self) {
        let (catalog, targets, nodes) = (self.catalog, self.targets, self.nodes);
        for a in 0..self.chains.len() {
            if !self.active[a] {
                continue;
            }
            let feature = catalog.feature(self.chains[a].feature);
            let present: Vec<Option<usize>> = self.chains[a]
                .members
                .iter()
                .map(|t| feature.matching_type(&nodes[t.0].resource_type))
                .collect();
            let mut missing: Vec<usize> = (0..feature.supported_resources.len())
                .filter(|i| !present.contains(&Some(*i)))
                .collect();

            let mut i = 0;
            while i < self.chains[a].members.len() && !missing.is_empty() {
                let member = self.chains[a].members[i];
                for &target in &targets[member.0] {
                    if self.chains[a].contains(target)
                        || self.feature_of(target) != Some(self.chains[a].feature)
                    {
                        continue;
                    }
                    let Some(idx) = feature.matching_type(&nodes[target.0].resource_type)
                    else {
                        continue;
                    };
                    if let Some(at) = missing.iter().position(|m| *m == idx) {
                        missing.remove(at);
                        self.chains[a].members.push(target);
                        self.retire_singleton(a, target);
                    }
                }
                i += 1;
            }
        }
    }

    fn retire_singleton(&mut self, keep: usize, token: NodeToken) {
        for (i, chain) in self.chains.iter().enumerate() {
            if i != keep && self.active[i] && chain.members == [token] {
                self.active[i] = false;
            }
        }
    }

    /// One pass attaching nodes of other features that depend on a member of this chain.
    fn complete_across_features(&mut self) {
        for a in 0..self.chains.len() {
            if !self.active[a] {
                continue;
            }
            let mut additions = Vec::new();
            for (b, other) in self.chains.iter().enumerate() {
                if b == a || !self.active[b] {
                    continue;
                }
                for &m in &other.members {
                    let chain = &self.chains[a];
                    if chain.contains(m)
                        || additions.contains(&m)
                        || self.feature_of(m) == Some(chain.feature)
                    {
                        continue;
                    }
                    let depends_on_chain = self.targets[m.0].iter().any(|t| chain.contains(*t));
                    let m_type = &self.nodes[m.0].resource_type;
                    let type_present = chain
                        .members
                        .iter()
                        .chain(additions.iter())
                        .any(|t| self.nodes[t.0].resource_type.eq_ignore_ascii_case(m_type));
                    if depends_on_chain && !type_present {
                        additions.push(m);
                    }
                }
            }
            self.chains[a].members.extend(additions);
        }
    }

    fn finish(self) -> Result<Vec<ResourceChain>, EvaluationError> {
        let mut chains: Vec<ResourceChain> = self
            .chains
            .into_iter()
            .zip(self.active)
            .filter_map(|(chain, active)| active.then_some(chain))
            .collect();

        for chain in &chains {
            let mut seen = vec![false; self.nodes.len()];
            for t in &chain.members {
                if std::mem::replace(&mut seen[t.0], true) {
                    return Err(EvaluationError::RepeatedToken { token: t.0 });
                }
            }
        }

        chains.sort_by_key(|c| (c.feature, c.head()));
        Ok(chains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::DeploymentContext;
    use crate::test_support::{catalog, feature, resource};
    use serde_json::json;

    fn graph_types(tpl: &Value, cat: &ControlCatalog) -> Vec<Vec<String>> {
        let ctx = DeploymentContext::default();
        let resolver = ExpressionResolver::new(tpl, None, &ctx);
        let graph = build_graph(tpl, &resolver, cat).unwrap();
        graph
            .chains
            .iter()
            .map(|c| {
                c.members
                    .iter()
                    .map(|t| graph.node(*t).resolved_name.clone())
                    .collect()
            })
            .collect()
    }

    fn network_catalog() -> ControlCatalog {
        catalog(vec![feature(
            "Network",
            &[
                "Microsoft.Network/loadBalancers",
                "Microsoft.Network/networkInterfaces",
                "Microsoft.Network/publicIPAddresses",
            ],
            Vec::new(),
        )])
    }

    #[test]
    fn template_must_have_resources() {
        let ctx = DeploymentContext::default();
        let cat = network_catalog();
        let tpl = json!({ "parameters": {} });
        let resolver = ExpressionResolver::new(&tpl, None, &ctx);
        assert_eq!(
            build_graph(&tpl, &resolver, &cat).unwrap_err(),
            EvaluationError::MissingResources
        );

        let tpl = json!([1, 2]);
        let resolver = ExpressionResolver::new(&tpl, None, &ctx);
        assert_eq!(
            build_graph(&tpl, &resolver, &cat).unwrap_err(),
            EvaluationError::TemplateNotObject
        );
    }

    #[test]
    fn transitive_dependencies_merge_into_one_chain() {
        let tpl = json!({
            "resources": [
                resource("Microsoft.Network/publicIPAddresses", "pip", &[]),
                resource(
                    "Microsoft.Network/loadBalancers",
                    "lb",
                    &["[resourceId('Microsoft.Network/networkInterfaces', 'nic')]"]
                ),
                resource("Microsoft.Network/networkInterfaces", "nic", &["Microsoft.Network/publicIPAddresses/pip"]),
            ]
        });
        assert_eq!(graph_types(&tpl, &network_catalog()), vec![vec!["lb", "nic", "pip"]]);
    }

    #[test]
    fn unresolvable_dependencies_leave_resources_independent() {
        let tpl = json!({
            "resources": [
                resource("Microsoft.Network/loadBalancers", "lb", &["[parameters('missing')]"]),
                resource("Microsoft.Network/networkInterfaces", "nic", &["[reference('x')]"]),
            ]
        });
        assert_eq!(
            graph_types(&tpl, &network_catalog()),
            vec![vec!["lb".to_string()], vec!["nic".to_string()]]
        );
    }

    #[test]
    fn dependency_cycles_do_not_repeat_tokens() {
        let tpl = json!({
            "resources": [
                resource("Microsoft.Network/loadBalancers", "lb", &["nic"]),
                resource("Microsoft.Network/networkInterfaces", "nic", &["pip"]),
                resource("Microsoft.Network/publicIPAddresses", "pip", &["lb"]),
            ]
        });
        let chains = graph_types(&tpl, &network_catalog());
        assert!(!chains.is_empty());
        for chain in chains {
            let mut sorted = chain.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), chain.len());
        }
    }

    #[test]
    fn shared_endpoint_keeps_the_longer_chain() {
        let tpl = json!({
            "resources": [
                resource("Microsoft.Network/publicIPAddresses", "pip", &[]),
                resource("Microsoft.Network/networkInterfaces", "nic", &["pip"]),
                resource("Microsoft.Network/loadBalancers", "lb", &["nic"]),
                resource("Microsoft.Network/loadBalancers", "lb2", &["pip"]),
            ]
        });
        assert_eq!(
            graph_types(&tpl, &network_catalog()),
            vec![vec!["lb", "nic", "pip"], vec!["lb2", "pip"]]
        );
    }

    #[test]
    fn unclassified_resources_form_no_chain() {
        let tpl = json!({
            "resources": [
                resource("Microsoft.Web/sites", "site", &["nic"]),
                resource("Microsoft.Network/networkInterfaces", "nic", &[]),
            ]
        });
        let ctx = DeploymentContext::default();
        let cat = network_catalog();
        let resolver = ExpressionResolver::new(&tpl, None, &ctx);
        let graph = build_graph(&tpl, &resolver, &cat).unwrap();
        assert_eq!(graph.chains.len(), 1);
        assert_eq!(graph.nodes[0].feature, None);
        assert_eq!(graph.chains[0].members, vec![NodeToken(1)]);
    }

    #[test]
    fn nested_children_get_composite_types() {
        let tpl = json!({
            "resources": [{
                "type": "Microsoft.Sql/servers",
                "name": "srv",
                "resources": [
                    { "type": "databases", "name": "db" },
                    { "type": "Microsoft.Sql/servers/firewallRules", "name": "srv/fw" }
                ]
            }]
        });
        let ctx = DeploymentContext::default();
        let cat = catalog(vec![feature("SQL", &["Microsoft.Sql/servers"], Vec::new())]);
        let resolver = ExpressionResolver::new(&tpl, None, &ctx);
        let graph = build_graph(&tpl, &resolver, &cat).unwrap();

        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.nodes[1].resource_type, "Microsoft.Sql/servers/databases");
        assert_eq!(graph.nodes[1].raw_type, "databases");
        assert_eq!(graph.nodes[1].pointer, "/resources/0/resources/0");
        assert_eq!(graph.nodes[2].resource_type, "Microsoft.Sql/servers/firewallRules");
        assert_eq!(graph.nodes[0].children, vec![NodeToken(1), NodeToken(2)]);
        assert_eq!(graph.nodes[2].resolved_name, "srv/fw");
        assert_eq!(graph.top_level().count(), 1);
    }

    #[test]
    fn cross_feature_dependents_join_the_chain() {
        let tpl = json!({
            "resources": [
                resource("Microsoft.Network/networkInterfaces", "nic", &[]),
                resource("Microsoft.Compute/virtualMachines", "vm", &["[resourceId('Microsoft.Network/networkInterfaces', 'nic')]"]),
            ]
        });
        let cat = catalog(vec![
            feature("Compute", &["Microsoft.Compute/virtualMachines"], Vec::new()),
            feature("Network", &["Microsoft.Network/networkInterfaces"], Vec::new()),
        ]);
        assert_eq!(
            graph_types(&tpl, &cat),
            vec![vec!["vm".to_string()], vec!["nic".to_string(), "vm".to_string()]]
        );
    }
}
