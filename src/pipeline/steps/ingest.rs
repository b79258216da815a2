//! Fetches the primary spec and splits it into chunks.
use crate::model::SpecDocument;
use crate::pipeline::{StepContext, StepError};
use crate::providers::FetchError;
use crate::state::WorkflowState;
use crate::util::sha256_hex;

const CHUNK_SOFT_LIMIT: usize = 1000;
const SECTION_MARKERS: &[&str] = &["paths:", "components:", "\"paths\"", "\"components\""];

pub fn ingest_spec(state: &mut WorkflowState, ctx: &StepContext<'_>) -> Result<(), StepError> {
    let Some(spec_ref) = state.spec_refs.first().cloned() else {
        return Err(StepError::MissingInput("No spec_refs provided".to_string()));
    };
    if state.spec_refs.len() > 1 {
        tracing::warn!(
            count = state.spec_refs.len(),
            "only the first spec ref is ingested"
        );
    }

    let fetched = ctx.providers.fetcher.fetch(&spec_ref).map_err(|err| match err {
        FetchError::NotFound(_) | FetchError::Read { .. } => {
            StepError::Io(format!("Failed to ingest spec: {err}"))
        }
        FetchError::Status { .. } | FetchError::Transport { .. } => {
            StepError::Io(format!("Failed to fetch spec: {err}"))
        }
    })?;

    let chunks = chunk_content(&fetched.content);
    tracing::debug!(
        spec_ref = %spec_ref,
        bytes = fetched.content.len(),
        chunks = chunks.len(),
        "ingested spec"
    );
    state.spec_documents.push(SpecDocument {
        id: None,
        uri: spec_ref,
        content_type: fetched.content_type,
        sha256: sha256_hex(fetched.content.as_bytes()),
        content: fetched.content,
    });
    state.chunks = chunks;
    Ok(())
}

/// Accumulate lines until the soft limit is reached or a section marker
/// line is seen; the marker line closes the current chunk. Lines are joined
/// with `\n`, so joining the chunks with `\n` restores the content.
pub fn chunk_content(content: &str) -> Vec<String> {
    if content.is_empty() {
        return Vec::new();
    }
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut size = 0;
    for line in content.split('\n') {
        current.push(line);
        size += line.len() + 1;
        let trimmed = line.trim();
        let is_marker = SECTION_MARKERS
            .iter()
            .any(|marker| trimmed.starts_with(marker));
        if size >= CHUNK_SOFT_LIMIT || is_marker {
            chunks.push(current.join("\n"));
            current.clear();
            size = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current.join("\n"));
    }
    chunks
}
