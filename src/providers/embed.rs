use crate::util::sha256_bytes;
use anyhow::Result;

pub trait EmbeddingProvider {
    fn model(&self) -> &str;
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Deterministic stand-in for a real embedding model.
///
/// Vector components are the bytes of the text's sha256 digest, repeated to
/// fill `dimensions` and mapped onto `[-1, 1]`. Identical text always yields
/// an identical vector.
#[derive(Debug, Clone)]
pub struct PlaceholderEmbedder {
    model: String,
    dimensions: usize,
}

impl PlaceholderEmbedder {
    pub fn new(model: &str, dimensions: usize) -> Self {
        Self {
            model: model.to_string(),
            dimensions,
        }
    }
}

impl EmbeddingProvider for PlaceholderEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let digest = sha256_bytes(text.as_bytes());
        Ok(digest
            .iter()
            .cycle()
            .take(self.dimensions)
            .map(|byte| f32::from(*byte) / 127.5 - 1.0)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_vectors_are_deterministic_and_bounded() {
        let embedder = PlaceholderEmbedder::new("placeholder-sha256", 64);
        let first = embedder.embed("paths:").expect("embed");
        let second = embedder.embed("paths:").expect("embed");
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.iter().all(|value| (-1.0..=1.0).contains(value)));
        assert_ne!(first, embedder.embed("components:").expect("embed"));
    }
}
