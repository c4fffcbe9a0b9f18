//! The declared resource graph and its dependency ordering.
//!
//! Nodes carry a kind tag, a field map, and the keys of the nodes they
//! depend on. Ordering uses `petgraph`: edges point from a dependency to
//! its dependent so a topological sort yields dependencies first.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use lamina_common::error::{LaminaError, Result};
use lamina_common::types::{Reference, ResourceKey};
use petgraph::graph::NodeIndex;
use serde::Serialize;
use serde_json::Value;

/// Kind tag of a resource node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Execution role assumed by the function.
    ExecutionRole,
    /// Managed policy attached to the execution role.
    RolePolicyAttachment,
    /// Inline policy document on the execution role.
    InlinePolicy,
    /// Log group receiving function logs.
    LogGroup,
    /// The function itself.
    Function,
    /// Provisioned concurrency on the published version.
    ProvisionedConcurrencyConfig,
    /// Public HTTP endpoint.
    PublicEndpoint,
    /// Named version alias.
    Alias,
    /// Event-stream subscription.
    EventSubscription,
    /// Resource-based invoke permission.
    InvokePermission,
    /// Asynchronous invocation settings.
    EventInvokeConfig,
}

impl ResourceKind {
    /// Stable lowercase name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExecutionRole => "execution_role",
            Self::RolePolicyAttachment => "role_policy_attachment",
            Self::InlinePolicy => "inline_policy",
            Self::LogGroup => "log_group",
            Self::Function => "function",
            Self::ProvisionedConcurrencyConfig => "provisioned_concurrency_config",
            Self::PublicEndpoint => "public_endpoint",
            Self::Alias => "alias",
            Self::EventSubscription => "event_subscription",
            Self::InvokePermission => "invoke_permission",
            Self::EventInvokeConfig => "event_invoke_config",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single declared resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceNode {
    /// Stable key of this node.
    pub key: ResourceKey,
    /// Kind tag.
    pub kind: ResourceKind,
    /// Field values, literal or `${key.attribute}` references.
    pub fields: BTreeMap<String, Value>,
    /// Keys of the nodes this node depends on.
    pub depends_on: BTreeSet<ResourceKey>,
}

impl ResourceNode {
    /// Creates a node with no fields and no dependencies.
    #[must_use]
    pub fn new(key: ResourceKey, kind: ResourceKind) -> Self {
        Self {
            key,
            kind,
            fields: BTreeMap::new(),
            depends_on: BTreeSet::new(),
        }
    }

    /// Sets a field, builder style.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a field only when `value` is present.
    #[must_use]
    pub fn with_opt<T: Into<Value>>(mut self, name: &str, value: Option<T>) -> Self {
        if let Some(v) = value {
            self.set(name, v);
        }
        self
    }

    /// Adds a dependency, builder style.
    #[must_use]
    pub fn after(mut self, key: &ResourceKey) -> Self {
        let _ = self.depends_on.insert(key.clone());
        self
    }

    /// Sets a field.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let _ = self.fields.insert(name.to_owned(), value.into());
    }

    /// Returns a field value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns a string field value.
    #[must_use]
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    /// Collects every `${key.attribute}` reference in the field values,
    /// including nested ones.
    #[must_use]
    pub fn references(&self) -> Vec<Reference> {
        let mut out = Vec::new();
        for value in self.fields.values() {
            collect_references(value, &mut out);
        }
        out
    }
}

fn collect_references(value: &Value, out: &mut Vec<Reference>) {
    match value {
        Value::String(s) => out.extend(Reference::parse(s)),
        Value::Array(items) => items.iter().for_each(|v| collect_references(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_references(v, out)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// The full set of declared resources for one configuration record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceGraph {
    nodes: BTreeMap<ResourceKey, ResourceNode>,
}

impl ResourceGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node.
    ///
    /// # Errors
    ///
    /// Returns an assembly error if a node with the same key exists.
    pub fn insert(&mut self, node: ResourceNode) -> Result<()> {
        tracing::debug!(key = %node.key, kind = %node.kind, "declaring resource");
        if self.nodes.contains_key(&node.key) {
            return Err(LaminaError::Assembly {
                message: format!("resource \"{}\" is declared twice", node.key),
            });
        }
        let _ = self.nodes.insert(node.key.clone(), node);
        Ok(())
    }

    /// Returns the node with the given key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ResourceNode> {
        self.nodes.get(&ResourceKey::new(key))
    }

    /// Returns `true` if a node with the given key exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over all nodes in key order.
    pub fn nodes(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.values()
    }

    /// Iterates over the nodes of one kind in key order.
    pub fn nodes_of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.values().filter(move |n| n.kind == kind)
    }

    /// Number of declared nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` when nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Builds the dependency graph of the declared nodes.
    ///
    /// # Errors
    ///
    /// Returns an assembly error if a node depends on an undeclared key.
    pub fn dependency_graph(&self) -> Result<DependencyGraph> {
        let mut graph = DependencyGraph::new();
        let mut index = HashMap::new();
        for key in self.nodes.keys() {
            let _ = index.insert(key, graph.add_resource(key.clone()));
        }
        for node in self.nodes.values() {
            for dep in &node.depends_on {
                let Some(&dependency) = index.get(dep) else {
                    return Err(LaminaError::Assembly {
                        message: format!("\"{}\" depends on undeclared \"{dep}\"", node.key),
                    });
                };
                graph.add_dependency(index[&node.key], dependency);
            }
        }
        Ok(graph)
    }

    /// Returns the keys in an order that creates dependencies first.
    ///
    /// # Errors
    ///
    /// Returns an assembly error on dangling or cyclic dependencies.
    pub fn deployment_order(&self) -> Result<Vec<ResourceKey>> {
        self.dependency_graph()?.resolve_order()
    }
}

/// A dependency graph of resource keys.
#[derive(Debug)]
pub struct DependencyGraph {
    /// Internal petgraph representation.
    graph: petgraph::Graph<ResourceKey, ()>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: petgraph::Graph::new(),
        }
    }

    /// Adds a resource node to the graph.
    pub fn add_resource(&mut self, key: ResourceKey) -> NodeIndex {
        self.graph.add_node(key)
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// The graph edge points from `dependency` to `dependent`
    /// so that topological sort yields dependencies first.
    pub fn add_dependency(&mut self, dependent: NodeIndex, dependency: NodeIndex) {
        let _ = self.graph.add_edge(dependency, dependent, ());
    }

    /// Returns a topological ordering of resources for provisioning.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn resolve_order(&self) -> Result<Vec<ResourceKey>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => Err(LaminaError::Assembly {
                message: format!(
                    "cyclic dependency detected at \"{}\"",
                    self.graph[cycle.node_id()]
                ),
            }),
        }
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> ResourceKey {
        ResourceKey::new(name)
    }

    #[test]
    fn empty_graph_resolves_to_empty() {
        let graph = DependencyGraph::new();
        let order = graph.resolve_order().expect("should resolve");
        assert!(order.is_empty());
    }

    #[test]
    fn linear_dependency_chain() {
        let mut graph = DependencyGraph::new();
        let alias = graph.add_resource(key("alias.live"));
        let function = graph.add_resource(key("function"));
        graph.add_dependency(alias, function);

        let order = graph.resolve_order().expect("should resolve");
        assert_eq!(order, vec![key("function"), key("alias.live")]);
    }

    #[test]
    fn diamond_dependency() {
        let mut graph = DependencyGraph::new();
        let function = graph.add_resource(key("function"));
        let role = graph.add_resource(key("role"));
        let logs = graph.add_resource(key("log_group"));
        let attach = graph.add_resource(key("role_policy_attachment.basic_execution"));
        graph.add_dependency(function, attach);
        graph.add_dependency(function, logs);
        graph.add_dependency(attach, role);
        graph.add_dependency(function, role);

        let order = graph.resolve_order().expect("should resolve");
        let pos = |name: &str| order.iter().position(|k| k.as_str() == name).expect(name);
        assert!(pos("role") < pos("role_policy_attachment.basic_execution"));
        assert!(pos("role_policy_attachment.basic_execution") < pos("function"));
        assert!(pos("log_group") < pos("function"));
    }

    #[test]
    fn cycle_detection() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_resource(key("a"));
        let b = graph.add_resource(key("b"));
        graph.add_dependency(a, b);
        graph.add_dependency(b, a);

        let msg = graph.resolve_order().unwrap_err().to_string();
        assert!(msg.contains("cyclic"), "got: {msg}");
    }

    #[test]
    fn resource_graph_rejects_duplicate_keys() {
        let mut graph = ResourceGraph::new();
        graph
            .insert(ResourceNode::new(key("function"), ResourceKind::Function))
            .expect("first insert");
        let err = graph
            .insert(ResourceNode::new(key("function"), ResourceKind::Function))
            .unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn resource_graph_rejects_dangling_dependencies() {
        let mut graph = ResourceGraph::new();
        let alias =
            ResourceNode::new(key("alias.live"), ResourceKind::Alias).after(&key("function"));
        graph.insert(alias).expect("insert");
        let err = graph.deployment_order().unwrap_err();
        assert!(err.to_string().contains("undeclared \"function\""), "got: {err}");
    }

    #[test]
    fn node_builders_set_fields() {
        let node = ResourceNode::new(key("log_group"), ResourceKind::LogGroup)
            .with("name", "/aws/lambda/f")
            .with_opt("retention_in_days", Some(14))
            .with_opt::<String>("kms_key_id", None);
        assert_eq!(node.field_str("name"), Some("/aws/lambda/f"));
        assert_eq!(node.field("retention_in_days"), Some(&Value::from(14)));
        assert!(node.field("kms_key_id").is_none());
    }

    #[test]
    fn nodes_of_kind_filters() {
        let mut graph = ResourceGraph::new();
        graph
            .insert(ResourceNode::new(key("alias.a"), ResourceKind::Alias))
            .expect("insert");
        graph
            .insert(ResourceNode::new(key("alias.b"), ResourceKind::Alias))
            .expect("insert");
        graph
            .insert(ResourceNode::new(key("function"), ResourceKind::Function))
            .expect("insert");
        assert_eq!(graph.nodes_of_kind(ResourceKind::Alias).count(), 2);
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn references_are_collected_from_nested_fields() {
        let node = ResourceNode::new(key("function"), ResourceKind::Function)
            .with("role", key("role").attr("arn"))
            .with(
                "logging_config",
                serde_json::json!({ "log_group": "${log_group.name}", "log_format": "Text" }),
            )
            .with("runtime", "python3.12");
        let refs: Vec<String> = node.references().iter().map(ToString::to_string).collect();
        assert_eq!(refs, vec!["${log_group.name}", "${role.arn}"]);
    }
}
