//! Capability interfaces for the pipeline's external collaborators.
//!
//! Steps only talk to these traits, so a run can be driven entirely by
//! deterministic fakes in tests and a real backend can be swapped in without
//! touching step logic.
pub mod embed;
pub mod fetch;
pub mod persist;
pub mod understand;

pub use embed::{EmbeddingProvider, PlaceholderEmbedder};
pub use fetch::{DefaultSpecFetcher, FetchError, FetchedSpec, SpecFetcher};
pub use persist::{InMemoryPersister, PersistSummary, Persister};
pub use understand::{
    CommandTaskUnderstander, KeywordTaskUnderstander, TaskUnderstander, UnderstandRequest,
};

use crate::config::RuntimeConfig;

/// The set of collaborators a run is wired with.
pub struct Collaborators {
    pub fetcher: Box<dyn SpecFetcher>,
    pub understander: Box<dyn TaskUnderstander>,
    pub embedder: Box<dyn EmbeddingProvider>,
    pub persister: Box<dyn Persister>,
}

impl Collaborators {
    /// Default wiring: HTTP/file fetcher, keyword understanding (or the
    /// configured LM command), placeholder embeddings, in-memory persistence.
    pub fn from_config(config: &RuntimeConfig) -> Self {
        let understander: Box<dyn TaskUnderstander> = match config.lm_command.as_deref() {
            Some(command) => Box::new(CommandTaskUnderstander::new(command)),
            None => Box::new(KeywordTaskUnderstander),
        };
        Self {
            fetcher: Box::new(DefaultSpecFetcher::new(config.http_timeout())),
            understander,
            embedder: Box::new(PlaceholderEmbedder::new(
                &config.embedding_model,
                config.embedding_dimensions,
            )),
            persister: Box::new(InMemoryPersister),
        }
    }

    pub fn with_fetcher(mut self, fetcher: impl SpecFetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    pub fn with_understander(mut self, understander: impl TaskUnderstander + 'static) -> Self {
        self.understander = Box::new(understander);
        self
    }

    pub fn with_embedder(mut self, embedder: impl EmbeddingProvider + 'static) -> Self {
        self.embedder = Box::new(embedder);
        self
    }

    pub fn with_persister(mut self, persister: impl Persister + 'static) -> Self {
        self.persister = Box::new(persister);
        self
    }
}
