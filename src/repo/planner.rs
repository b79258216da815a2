//! Repository change planning.
//!
//! Maps artifacts to repository paths and classifies each as create or update.
//! Planning only reads the repository; writing belongs to [`super::apply`].
use super::profile::RepoProfile;
use crate::model::{ArtifactKind, CodeArtifact};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Create,
    Update,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Repository-relative, `/`-separated.
    pub rel_path: String,
    pub kind: ChangeKind,
    pub artifact_kind: ArtifactKind,
    /// Prior content for updates.
    pub before: Option<String>,
    pub after: String,
}

impl FileChange {
    /// Update whose content already matches what would be written.
    pub fn is_unchanged(&self) -> bool {
        self.before.as_deref() == Some(self.after.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoChangeSet {
    pub repo_root: PathBuf,
    pub changes: Vec<FileChange>,
    /// Set once the changes were written to disk.
    pub applied: bool,
}

impl RepoChangeSet {
    pub fn files_created(&self) -> usize {
        self.count(ChangeKind::Create)
    }

    pub fn files_updated(&self) -> usize {
        self.count(ChangeKind::Update)
    }

    fn count(&self, kind: ChangeKind) -> usize {
        self.changes
            .iter()
            .filter(|change| change.kind == kind)
            .count()
    }

    /// `"CREATE: src/x.py"` lines, in plan order.
    pub fn summary_lines(&self) -> Vec<String> {
        self.changes
            .iter()
            .map(|change| {
                format!(
                    "{}: {}",
                    change.kind.as_str().to_ascii_uppercase(),
                    change.rel_path
                )
            })
            .collect()
    }
}

fn default_dir(kind: ArtifactKind) -> Option<&'static str> {
    match kind {
        ArtifactKind::Client => Some("src/integrations/clients"),
        ArtifactKind::Flow => Some("src/integrations/flows"),
        ArtifactKind::Test => Some("tests/integrations"),
        ArtifactKind::Config => None,
    }
}

/// Repository-relative target path for one artifact under `profile`.
///
/// Client, flow and test artifacts land in their kind's directory (layout
/// hint, else the built-in default) under the artifact's file name; config
/// artifacts without a hint keep their relative path as-is.
pub fn target_path(artifact: &CodeArtifact, profile: &RepoProfile) -> Result<String> {
    validate_relative(&artifact.rel_path)?;
    let hinted = profile
        .layout_hints
        .get(artifact.kind.layout_hint_key())
        .map(String::as_str);
    let target = match hinted.or_else(|| default_dir(artifact.kind)) {
        Some(dir) => {
            let file_name = artifact
                .rel_path
                .rsplit('/')
                .next()
                .unwrap_or(&artifact.rel_path);
            format!("{}/{}", dir.trim_end_matches('/'), file_name)
        }
        None => artifact.rel_path.clone(),
    };
    validate_relative(&target)?;
    Ok(target)
}

/// Plan one file change per artifact, reading existing files for `before`.
pub fn plan_changes(
    repo_root: &Path,
    artifacts: &[CodeArtifact],
    profile: &RepoProfile,
) -> Result<RepoChangeSet> {
    let mut changes = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let rel_path = target_path(artifact, profile)?;
        let full_path = repo_root.join(&rel_path);
        let before = if full_path.is_file() {
            Some(
                fs::read_to_string(&full_path)
                    .with_context(|| format!("read {}", full_path.display()))?,
            )
        } else {
            None
        };
        let kind = if before.is_some() {
            ChangeKind::Update
        } else {
            ChangeKind::Create
        };
        tracing::debug!(path = %rel_path, kind = %kind, "planned repo change");
        changes.push(FileChange {
            rel_path,
            kind,
            artifact_kind: artifact.kind,
            before,
            after: artifact.content.clone(),
        });
    }
    Ok(RepoChangeSet {
        repo_root: repo_root.to_path_buf(),
        changes,
        applied: false,
    })
}

/// Reject absolute paths and `..` so changes stay inside the repository.
fn validate_relative(rel_path: &str) -> Result<()> {
    let path = Path::new(rel_path);
    if rel_path.is_empty() || path.is_absolute() {
        return Err(anyhow!("artifact path must be relative: {rel_path:?}"));
    }
    if path
        .components()
        .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir))
    {
        return Err(anyhow!("artifact path escapes the repository: {rel_path:?}"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
