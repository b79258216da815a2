//! Domain records for the Silver (spec model) and Gold (workflow model) layers.
//!
//! Every record carries an `id` that stays `None` until an external persister
//! assigns one; within a run records are identified by position or key.
pub mod artifact;
pub mod gold;
pub mod silver;

pub use artifact::{ArtifactKind, CodeArtifact};
pub use gold::{
    integrity_violations, EndpointBinding, FlowEdge, FlowGraph, FlowGraphError, FlowNode,
    FlowNodeType, IntegrationTask, Policy, PolicyKind, TaskBrief, TaskField, TargetOperation,
    WorkflowTemplate,
};
pub use silver::{
    ChunkEmbedding, Endpoint, EndpointParameter, Entity, EntityRelationship, Event, Schema,
    SchemaField, SourceSystem, SpecDocument,
};

/// Identity assigned by a persister; `None` means "not yet persisted".
pub type RecordId = Option<u64>;
