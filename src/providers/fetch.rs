use std::fs;
use std::path::Path;
use std::time::Duration;

/// Raw spec content plus the content type it was served or stored as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSpec {
    pub content: String,
    pub content_type: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("spec file not found: {0}")]
    NotFound(String),
    #[error("failed to read spec {reference}: {message}")]
    Read { reference: String, message: String },
    #[error("spec fetch from {reference} returned HTTP {status}")]
    Status { reference: String, status: u16 },
    #[error("failed to fetch spec from {reference}: {message}")]
    Transport { reference: String, message: String },
}

pub trait SpecFetcher {
    fn fetch(&self, spec_ref: &str) -> Result<FetchedSpec, FetchError>;
}

/// Fetches `http(s)://` references with a bounded blocking request and reads
/// everything else from the local filesystem.
pub struct DefaultSpecFetcher {
    agent: ureq::Agent,
}

impl DefaultSpecFetcher {
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }

    fn fetch_http(&self, url: &str) -> Result<FetchedSpec, FetchError> {
        tracing::debug!(url, "fetching spec over http");
        let response = self.agent.get(url).call().map_err(|err| match err {
            ureq::Error::StatusCode(status) => FetchError::Status {
                reference: url.to_string(),
                status,
            },
            other => FetchError::Transport {
                reference: url.to_string(),
                message: other.to_string(),
            },
        })?;
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let content = response
            .into_body()
            .read_to_string()
            .map_err(|err| FetchError::Transport {
                reference: url.to_string(),
                message: err.to_string(),
            })?;
        Ok(FetchedSpec {
            content,
            content_type,
        })
    }

    fn fetch_file(&self, reference: &str) -> Result<FetchedSpec, FetchError> {
        let path = Path::new(reference);
        if !path.is_file() {
            return Err(FetchError::NotFound(reference.to_string()));
        }
        let content = fs::read_to_string(path).map_err(|err| FetchError::Read {
            reference: reference.to_string(),
            message: err.to_string(),
        })?;
        Ok(FetchedSpec {
            content,
            content_type: content_type_for_path(path).to_string(),
        })
    }
}

impl SpecFetcher for DefaultSpecFetcher {
    fn fetch(&self, spec_ref: &str) -> Result<FetchedSpec, FetchError> {
        if is_remote(spec_ref) {
            self.fetch_http(spec_ref)
        } else {
            self.fetch_file(spec_ref)
        }
    }
}

pub fn is_remote(spec_ref: &str) -> bool {
    spec_ref.starts_with("http://") || spec_ref.starts_with("https://")
}

/// Guess a content type from the file suffix.
pub fn content_type_for_path(path: &Path) -> &'static str {
    let suffix = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match suffix.as_deref() {
        Some("yaml") | Some("yml") => "application/yaml",
        Some("json") => "application/json",
        _ => "text/plain",
    }
}
