//! Gold layer: the business-level integration workflow built from Silver.
//!
//! Flow nodes and edges form a small graph whose referential integrity is
//! checked at construction; see [`FlowGraph::build`].
use super::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    pub id: RecordId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationTask {
    pub id: RecordId,
    pub task_slug: String,
    pub provider_code: String,
    pub description: String,
    pub workflow_template_code: Option<String>,
    pub constraints: TaskBrief,
}

/// Output of task understanding: which operations the task targets and the
/// fields flowing in and out of the integration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskBrief {
    pub task_description: String,
    /// Detected task category, e.g. `checkout` or `generic`.
    pub category: String,
    pub target_operations: Vec<TargetOperation>,
    pub required_inputs: Vec<TaskField>,
    pub expected_outputs: Vec<TaskField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetOperation {
    pub operation_id: Option<String>,
    pub method: String,
    pub path: String,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl TaskField {
    pub fn new(name: &str, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowNodeType {
    Validation,
    ApiCall,
    Transform,
    Output,
}

impl FlowNodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowNodeType::Validation => "validation",
            FlowNodeType::ApiCall => "api_call",
            FlowNodeType::Transform => "transform",
            FlowNodeType::Output => "output",
        }
    }
}

impl fmt::Display for FlowNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: RecordId,
    /// Unique within the task.
    pub node_key: String,
    pub node_type: FlowNodeType,
    pub label: String,
    pub description: String,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub id: RecordId,
    pub from_node_key: String,
    pub to_node_key: String,
    pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FlowGraphError {
    #[error("duplicate flow node key {0:?}")]
    DuplicateNodeKey(String),
    #[error("flow edge {from:?} -> {to:?} references unknown node {missing:?}")]
    DanglingEdge {
        from: String,
        to: String,
        missing: String,
    },
    #[error("endpoint binding references unknown flow node {0:?}")]
    DanglingBinding(String),
}

/// Nodes plus edges whose keys are known to be unique and whose edges only
/// reference existing nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowGraph {
    nodes: Vec<FlowNode>,
    edges: Vec<FlowEdge>,
}

impl FlowGraph {
    pub fn build(nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) -> Result<Self, FlowGraphError> {
        let mut keys = BTreeSet::new();
        for node in &nodes {
            if !keys.insert(node.node_key.as_str()) {
                return Err(FlowGraphError::DuplicateNodeKey(node.node_key.clone()));
            }
        }
        for edge in &edges {
            for key in [&edge.from_node_key, &edge.to_node_key] {
                if !keys.contains(key.as_str()) {
                    return Err(FlowGraphError::DanglingEdge {
                        from: edge.from_node_key.clone(),
                        to: edge.to_node_key.clone(),
                        missing: key.clone(),
                    });
                }
            }
        }
        Ok(Self { nodes, edges })
    }

    /// Build a linear chain: each node is connected to the next one.
    pub fn linear(nodes: Vec<FlowNode>) -> Result<Self, FlowGraphError> {
        let edges = nodes
            .windows(2)
            .map(|pair| FlowEdge {
                id: None,
                from_node_key: pair[0].node_key.clone(),
                to_node_key: pair[1].node_key.clone(),
                condition: None,
            })
            .collect();
        Self::build(nodes, edges)
    }

    pub fn into_parts(self) -> (Vec<FlowNode>, Vec<FlowEdge>) {
        (self.nodes, self.edges)
    }
}

/// Report every referential-integrity violation across nodes, edges and
/// bindings; an empty result means the Gold graph is consistent.
pub fn integrity_violations(
    nodes: &[FlowNode],
    edges: &[FlowEdge],
    bindings: &[EndpointBinding],
) -> Vec<FlowGraphError> {
    let mut violations = Vec::new();
    let mut keys = BTreeSet::new();
    for node in nodes {
        if !keys.insert(node.node_key.as_str()) {
            violations.push(FlowGraphError::DuplicateNodeKey(node.node_key.clone()));
        }
    }
    for edge in edges {
        for key in [&edge.from_node_key, &edge.to_node_key] {
            if !keys.contains(key.as_str()) {
                violations.push(FlowGraphError::DanglingEdge {
                    from: edge.from_node_key.clone(),
                    to: edge.to_node_key.clone(),
                    missing: key.clone(),
                });
            }
        }
    }
    for binding in bindings {
        if !keys.contains(binding.flow_node_key.as_str()) {
            violations.push(FlowGraphError::DanglingBinding(
                binding.flow_node_key.clone(),
            ));
        }
    }
    violations
}

/// Binds a flow node to one Silver endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointBinding {
    pub id: RecordId,
    pub flow_node_key: String,
    /// Index into the run's endpoint list.
    pub endpoint_index: usize,
    pub operation_id: Option<String>,
    pub method: String,
    pub path: String,
    pub request_mapping: BTreeMap<String, String>,
    pub response_mapping: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Auth,
    Retry,
    Logging,
    Idempotency,
    RateLimit,
}

impl PolicyKind {
    /// Every recognized kind, in attachment order.
    pub const ALL: [PolicyKind; 5] = [
        PolicyKind::Auth,
        PolicyKind::Retry,
        PolicyKind::Logging,
        PolicyKind::Idempotency,
        PolicyKind::RateLimit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Auth => "auth",
            PolicyKind::Retry => "retry",
            PolicyKind::Logging => "logging",
            PolicyKind::Idempotency => "idempotency",
            PolicyKind::RateLimit => "rate_limit",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: RecordId,
    pub kind: PolicyKind,
    /// `flow_node`, `workflow` or `endpoint`.
    pub scope: String,
    pub scope_ref: Option<String>,
    pub config: Value,
}
