use crate::model::ChunkEmbedding;
use crate::pipeline::{StepContext, StepError};
use crate::state::WorkflowState;
use crate::util::truncate_string;

const PREVIEW_BYTES: usize = 500;

/// One embedding per chunk, in chunk order.
pub fn embed_spec_chunks(
    state: &mut WorkflowState,
    ctx: &StepContext<'_>,
) -> Result<(), StepError> {
    if state.chunks.is_empty() {
        return Err(StepError::MissingInput("No chunks to embed".to_string()));
    }
    let embedder = &ctx.providers.embedder;
    let mut embeddings = Vec::with_capacity(state.chunks.len());
    for (chunk_index, chunk) in state.chunks.iter().enumerate() {
        let vector = embedder
            .embed(chunk)
            .map_err(|err| StepError::Io(format!("Failed to embed chunk {chunk_index}: {err:#}")))?;
        embeddings.push(ChunkEmbedding {
            id: None,
            chunk_index,
            content_preview: truncate_string(chunk, PREVIEW_BYTES),
            vector,
        });
    }
    tracing::debug!(model = embedder.model(), chunks = embeddings.len(), "embedded chunks");
    state.embeddings = embeddings;
    Ok(())
}
