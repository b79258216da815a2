//! Structured parsing of the ingested spec document.
use crate::pipeline::{StepContext, StepError};
use crate::state::WorkflowState;
use serde_json::{Map, Number, Value};

const FORMAT_MARKERS: &[&str] = &["openapi", "swagger"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

pub fn detect_and_parse_spec(
    state: &mut WorkflowState,
    _ctx: &StepContext<'_>,
) -> Result<(), StepError> {
    let Some(document) = state.spec_documents.first() else {
        return Err(StepError::MissingInput(
            "No spec_documents to parse".to_string(),
        ));
    };
    let parsed = parse_spec(&document.content, &document.content_type)?;
    tracing::debug!(uri = %document.uri, "parsed spec");
    state.parsed_spec = Some(parsed);
    Ok(())
}

/// Parse `content`, trying the format hinted by `content_type` first.
pub fn parse_spec(content: &str, content_type: &str) -> Result<Value, StepError> {
    let order = if content_type.contains("json") {
        [Format::Json, Format::Yaml]
    } else {
        [Format::Yaml, Format::Json]
    };
    let mut first_error = None;
    let mut parsed = None;
    for format in order {
        match parse_as(content, format) {
            Ok(value) => {
                parsed = Some(value);
                break;
            }
            Err(message) => {
                first_error.get_or_insert(message);
            }
        }
    }
    let Some(value) = parsed else {
        return Err(StepError::Parse(format!(
            "Failed to parse spec: {}",
            first_error.unwrap_or_default()
        )));
    };

    let Some(map) = value.as_object() else {
        return Err(StepError::Parse("Parsed spec is not a mapping".to_string()));
    };
    if !FORMAT_MARKERS.iter().any(|marker| map.contains_key(*marker)) {
        return Err(StepError::Parse(
            "Parsed spec does not appear to be OpenAPI/Swagger format".to_string(),
        ));
    }
    Ok(value)
}

fn parse_as(content: &str, format: Format) -> Result<Value, String> {
    match format {
        Format::Json => serde_json::from_str(content).map_err(|err| err.to_string()),
        Format::Yaml => serde_yaml::from_str::<serde_yaml::Value>(content)
            .map(yaml_to_json)
            .map_err(|err| err.to_string()),
    }
}

/// YAML allows non-string keys (`200:` under `responses`); they become
/// strings here.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(flag) => Value::Bool(flag),
        serde_yaml::Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Value::from(int)
            } else if let Some(uint) = number.as_u64() {
                Value::from(uint)
            } else {
                number
                    .as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(text) => Value::String(text),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(yaml_key(key), yaml_to_json(value));
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(text) => text,
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Bool(flag) => flag.to_string(),
        serde_yaml::Value::Number(number) => number.to_string(),
        other => yaml_to_json(other).to_string(),
    }
}
