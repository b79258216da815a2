//! Read-only snapshot of a target repository.
use crate::util::truncate_string;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const SKIPPED_DIRS: &[&str] = &[
    ".git",
    "target",
    "node_modules",
    "__pycache__",
    ".venv",
    "venv",
    ".pytest_cache",
];
const MAX_FILE_BYTES: u64 = 256 * 1024;
const SAMPLE_FILES: usize = 5;
const SAMPLE_BYTES: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoFile {
    pub rel_path: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoStats {
    pub total_files: usize,
    pub total_bytes: u64,
    /// Files over the size cap plus entries that could not be read.
    pub skipped_files: usize,
    pub extensions: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSnapshot {
    pub repo_name: String,
    pub files: Vec<RepoFile>,
    pub stats: RepoStats,
    pub tree_markdown: String,
    /// Tree plus a short sample of the first few files.
    pub full_markdown: String,
}

/// Walk `root` and summarize its files.
///
/// Only metadata is read during the walk; file contents are read for the
/// first few files (in path order) that make up the markdown sample.
pub fn build_snapshot(root: &Path) -> Result<RepoSnapshot> {
    if !root.is_dir() {
        return Err(anyhow!("repo root does not exist: {}", root.display()));
    }
    fs::read_dir(root).with_context(|| format!("read {}", root.display()))?;
    let repo_name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());

    let mut files = Vec::new();
    let mut stats = RepoStats::default();
    walk(root, root, &mut files, &mut stats);
    files.sort_by(|lhs, rhs| lhs.rel_path.cmp(&rhs.rel_path));

    let tree_markdown = render_tree(&repo_name, &files);
    let mut full_markdown = tree_markdown.clone();
    full_markdown.push_str("\n\n## File Contents (Sample)\n");
    for file in files.iter().take(SAMPLE_FILES) {
        let sample = read_sample(&root.join(&file.rel_path));
        full_markdown.push_str(&format!("\n### {}\n\n```\n{}\n```\n", file.rel_path, sample));
    }

    Ok(RepoSnapshot {
        repo_name,
        files,
        stats,
        tree_markdown,
        full_markdown,
    })
}

fn read_sample(path: &Path) -> String {
    match fs::read(path).map(String::from_utf8) {
        Ok(Ok(text)) => truncate_string(&text, SAMPLE_BYTES),
        Ok(Err(_)) => "(binary content omitted)".to_string(),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "unreadable sample file");
            "(unreadable)".to_string()
        }
    }
}

/// Unreadable directories and entries are counted as skipped, never fatal.
fn walk(root: &Path, dir: &Path, files: &mut Vec<RepoFile>, stats: &mut RepoStats) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(dir = %dir.display(), error = %err, "skipping unreadable directory");
            stats.skipped_files += 1;
            return;
        }
    };
    for entry in entries {
        let Ok(entry) = entry else {
            stats.skipped_files += 1;
            continue;
        };
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            stats.skipped_files += 1;
            continue;
        };
        if file_type.is_dir() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if SKIPPED_DIRS.iter().any(|skipped| *skipped == name) {
                continue;
            }
            walk(root, &path, files, stats);
            continue;
        }
        if !file_type.is_file() {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            stats.skipped_files += 1;
            continue;
        };
        let size_bytes = metadata.len();
        if size_bytes > MAX_FILE_BYTES {
            stats.skipped_files += 1;
            continue;
        }
        let Ok(rel_path) = path.strip_prefix(root) else {
            continue;
        };
        let rel_path = rel_path.to_string_lossy().replace('\\', "/");
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        *stats.extensions.entry(extension).or_insert(0) += 1;
        stats.total_files += 1;
        stats.total_bytes += size_bytes;
        files.push(RepoFile {
            rel_path,
            size_bytes,
        });
    }
}

fn render_tree(repo_name: &str, files: &[RepoFile]) -> String {
    let mut lines = vec![format!("# {repo_name} Repository Structure"), String::new()];
    for file in files {
        let depth = file.rel_path.matches('/').count();
        let name = file.rel_path.rsplit('/').next().unwrap_or(&file.rel_path);
        lines.push(format!("{}- {}", "  ".repeat(depth), name));
    }
    lines.join("\n")
}
