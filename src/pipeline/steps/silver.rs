//! Builds the Silver API model from the parsed spec.
use crate::model::{
    Endpoint, EndpointParameter, Entity, EntityRelationship, Event, Schema, SchemaField,
    SourceSystem,
};
use crate::pipeline::{StepContext, StepError};
use crate::state::WorkflowState;
use serde_json::{Map, Value};

const HTTP_METHODS: &[&str] = &["get", "post", "put", "patch", "delete", "head", "options"];
const DEFAULT_TYPE: &str = "string";
const WEBHOOK_KEYS: &[&str] = &["webhooks", "x-webhooks"];

/// Everything the Silver step extracts from one spec.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SilverModel {
    pub source_system: Option<SourceSystem>,
    pub endpoints: Vec<Endpoint>,
    pub parameters: Vec<EndpointParameter>,
    pub schemas: Vec<Schema>,
    pub schema_fields: Vec<SchemaField>,
    pub entities: Vec<Entity>,
    pub relationships: Vec<EntityRelationship>,
    pub events: Vec<Event>,
}

pub fn build_silver_api_model(
    state: &mut WorkflowState,
    _ctx: &StepContext<'_>,
) -> Result<(), StepError> {
    let Some(spec) = state.parsed_spec.as_ref() else {
        return Err(StepError::MissingInput(
            "No parsed_spec available for Silver model".to_string(),
        ));
    };
    let model = extract(spec, &state.plan.provider_code);
    tracing::info!(
        endpoints = model.endpoints.len(),
        parameters = model.parameters.len(),
        schemas = model.schemas.len(),
        entities = model.entities.len(),
        relationships = model.relationships.len(),
        events = model.events.len(),
        "built silver model"
    );
    state.source_system = model.source_system;
    state.endpoints = model.endpoints;
    state.parameters = model.parameters;
    state.schemas = model.schemas;
    state.schema_fields = model.schema_fields;
    state.entities = model.entities;
    state.relationships = model.relationships;
    state.events = model.events;
    Ok(())
}

pub fn extract(spec: &Value, provider_code: &str) -> SilverModel {
    let mut model = SilverModel {
        source_system: Some(source_system(spec, provider_code)),
        ..SilverModel::default()
    };
    extract_endpoints(spec, &mut model);
    extract_schemas(spec, &mut model);
    extract_events(spec, &mut model);
    model
}

fn source_system(spec: &Value, provider_code: &str) -> SourceSystem {
    let code = if provider_code.is_empty() {
        "unknown".to_string()
    } else {
        provider_code.to_string()
    };
    let name = spec
        .pointer("/info/title")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| code.clone());
    SourceSystem {
        id: None,
        code,
        name,
        base_url: base_url(spec),
    }
}

/// `servers[0].url` (OpenAPI 3) or `scheme://host/basePath` (Swagger 2).
fn base_url(spec: &Value) -> Option<String> {
    if let Some(url) = spec.pointer("/servers/0/url").and_then(Value::as_str) {
        return Some(url.to_string());
    }
    let host = spec.get("host").and_then(Value::as_str)?;
    let scheme = spec
        .pointer("/schemes/0")
        .and_then(Value::as_str)
        .unwrap_or("https");
    let base_path = spec.get("basePath").and_then(Value::as_str).unwrap_or("");
    Some(format!("{scheme}://{host}{base_path}"))
}

fn extract_endpoints(spec: &Value, model: &mut SilverModel) {
    let Some(paths) = spec.get("paths").and_then(Value::as_object) else {
        return;
    };
    let spec_security = spec.get("security").is_some();
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        let shared_params = item
            .get("parameters")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for (method, operation) in item {
            let method = method.to_ascii_lowercase();
            if !HTTP_METHODS.contains(&method.as_str()) {
                continue;
            }
            let Some(operation) = operation.as_object() else {
                continue;
            };
            let endpoint_index = model.endpoints.len();
            model.endpoints.push(Endpoint {
                id: None,
                path: path.clone(),
                method: method.to_ascii_uppercase(),
                operation_id: string_field(operation, "operationId"),
                summary: string_field(operation, "summary"),
                description: string_field(operation, "description"),
                auth_required: operation.contains_key("security") || spec_security,
            });

            let own_params = operation
                .get("parameters")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let own: Vec<EndpointParameter> = own_params
                .iter()
                .filter_map(|param| parameter(spec, param, endpoint_index))
                .collect();
            // Path-level parameters apply unless the operation redeclares them.
            for param in shared_params
                .iter()
                .filter_map(|param| parameter(spec, param, endpoint_index))
            {
                let overridden = own
                    .iter()
                    .any(|op| op.name == param.name && op.location == param.location);
                if !overridden {
                    model.parameters.push(param);
                }
            }
            model.parameters.extend(own);
        }
    }
}

fn parameter(spec: &Value, raw: &Value, endpoint_index: usize) -> Option<EndpointParameter> {
    let param = resolve_ref(spec, raw).as_object()?;
    let name = param.get("name").and_then(Value::as_str)?;
    let schema_type = param
        .get("schema")
        .and_then(|schema| schema.get("type"))
        .or_else(|| param.get("type"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_TYPE);
    Some(EndpointParameter {
        id: None,
        endpoint_index,
        name: name.to_string(),
        location: param
            .get("in")
            .and_then(Value::as_str)
            .unwrap_or("query")
            .to_string(),
        required: param
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        schema_type: schema_type.to_string(),
        description: string_field(param, "description"),
    })
}

/// Follow a local `#/...` reference once; anything else is returned as-is.
fn resolve_ref<'a>(spec: &'a Value, value: &'a Value) -> &'a Value {
    value
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|reference| reference.strip_prefix('#'))
        .and_then(|pointer| spec.pointer(pointer))
        .unwrap_or(value)
}

fn extract_schemas(spec: &Value, model: &mut SilverModel) {
    let (schemas, prefix) = match spec.pointer("/components/schemas").and_then(Value::as_object) {
        Some(schemas) => (schemas, "#/components/schemas/"),
        None => match spec.get("definitions").and_then(Value::as_object) {
            Some(schemas) => (schemas, "#/definitions/"),
            None => return,
        },
    };
    for (name, schema) in schemas {
        model.schemas.push(Schema {
            id: None,
            name: name.clone(),
            reference: format!("{prefix}{name}"),
        });
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
            continue;
        };

        for (field, property) in properties {
            let property_map = property.as_object();
            model.schema_fields.push(SchemaField {
                id: None,
                schema_name: name.clone(),
                name: field.clone(),
                json_path: format!("$.{field}"),
                field_type: property
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_TYPE)
                    .to_string(),
                format: property_map.and_then(|map| string_field(map, "format")),
                required: required.contains(&field.as_str()),
                description: property_map.and_then(|map| string_field(map, "description")),
            });

            if let Some(target) = ref_target(property) {
                model.relationships.push(relationship(name, target, field, "one-to-one"));
            } else if let Some(target) = property.get("items").and_then(ref_target) {
                model.relationships.push(relationship(name, target, field, "one-to-many"));
            }
        }

        if properties.contains_key("id") {
            model.entities.push(Entity {
                id: None,
                name: name.clone(),
                schema_name: name.clone(),
                description: schema
                    .as_object()
                    .and_then(|map| string_field(map, "description")),
            });
        }
    }
}

fn ref_target(value: &Value) -> Option<&str> {
    value
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|reference| reference.rsplit('/').next())
        .filter(|target| !target.is_empty())
}

fn relationship(from: &str, to: &str, via: &str, cardinality: &str) -> EntityRelationship {
    EntityRelationship {
        id: None,
        from_schema: from.to_string(),
        to_schema: to.to_string(),
        via_field: via.to_string(),
        relationship_type: "references".to_string(),
        cardinality: cardinality.to_string(),
    }
}

fn extract_events(spec: &Value, model: &mut SilverModel) {
    for key in WEBHOOK_KEYS {
        let Some(webhooks) = spec.get(*key).and_then(Value::as_object) else {
            continue;
        };
        for (name, item) in webhooks {
            let description = item.as_object().and_then(|operations| {
                operations
                    .values()
                    .filter_map(Value::as_object)
                    .find_map(|operation| string_field(operation, "summary"))
            });
            model.events.push(Event {
                id: None,
                name: name.clone(),
                description,
            });
        }
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
#[path = "silver_tests.rs"]
mod tests;
