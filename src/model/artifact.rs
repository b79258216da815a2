use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Client,
    Flow,
    Test,
    Config,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Client => "client",
            ArtifactKind::Flow => "flow",
            ArtifactKind::Test => "test",
            ArtifactKind::Config => "config",
        }
    }

    /// Repo profile layout hint naming the directory for this kind.
    pub fn layout_hint_key(&self) -> &'static str {
        match self {
            ArtifactKind::Client => "clients_dir",
            ArtifactKind::Flow => "flows_dir",
            ArtifactKind::Test => "tests_dir",
            ArtifactKind::Config => "config_dir",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated code unit ready to be placed into a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeArtifact {
    pub kind: ArtifactKind,
    pub language: String,
    pub module_name: String,
    /// Path relative to the target directory chosen by the repo planner.
    pub rel_path: String,
    pub content: String,
}
