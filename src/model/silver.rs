//! Silver layer: structurally extracted view of the raw specification.
use super::RecordId;
use serde::{Deserialize, Serialize};

/// The third-party API being integrated with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSystem {
    pub id: RecordId,
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// A raw specification document as ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecDocument {
    pub id: RecordId,
    pub uri: String,
    pub content_type: String,
    pub sha256: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: RecordId,
    pub path: String,
    /// Upper-case HTTP verb.
    pub method: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub auth_required: bool,
}

impl Endpoint {
    /// `"POST /v1/checkout/sessions"`.
    pub fn signature(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointParameter {
    pub id: RecordId,
    /// Index into the run's endpoint list.
    pub endpoint_index: usize,
    pub name: String,
    /// `path`, `query`, `header` or `cookie`.
    pub location: String,
    pub required: bool,
    pub schema_type: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub id: RecordId,
    pub name: String,
    /// JSON pointer of the component, e.g. `#/components/schemas/Session`.
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub id: RecordId,
    pub schema_name: String,
    pub name: String,
    pub json_path: String,
    pub field_type: String,
    pub format: Option<String>,
    pub required: bool,
    pub description: Option<String>,
}

/// A schema promoted to a domain entity (it declares an `id` property).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: RecordId,
    pub name: String,
    pub schema_name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRelationship {
    pub id: RecordId,
    pub from_schema: String,
    pub to_schema: String,
    pub via_field: String,
    pub relationship_type: String,
    pub cardinality: String,
}

/// A webhook or callback declared by the API document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: RecordId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkEmbedding {
    pub id: RecordId,
    pub chunk_index: usize,
    pub content_preview: String,
    pub vector: Vec<f32>,
}
