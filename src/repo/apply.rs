//! Writes a planned change set into the repository.
//!
//! Every file is written in full through a temp file in its target directory
//! and renamed into place. A failure part-way through restores the files
//! already written. Runs against the same repository root serialize on an
//! advisory lock kept in the system temp directory.
use super::planner::{FileChange, RepoChangeSet};
use crate::util::sha256_hex;
use anyhow::{anyhow, Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Exclusive advisory lock for one repository root; released on drop.
pub struct RepoLock {
    file: File,
}

impl RepoLock {
    pub fn acquire(repo_root: &Path) -> Result<Self> {
        let path = lock_path(repo_root)?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("open lock {}", path.display()))?;
        FileExt::lock_exclusive(&file).with_context(|| format!("lock {}", path.display()))?;
        tracing::debug!(lock = %path.display(), "acquired repo lock");
        Ok(Self { file })
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Lock file location for `repo_root`, keyed by its canonical path.
pub fn lock_path(repo_root: &Path) -> Result<PathBuf> {
    let canonical = repo_root
        .canonicalize()
        .with_context(|| format!("canonicalize {}", repo_root.display()))?;
    let digest = sha256_hex(canonical.to_string_lossy().as_bytes());
    Ok(std::env::temp_dir().join(format!("apiweave-{}.lock", &digest[..16])))
}

/// Write every change in `change_set` and mark it applied.
pub fn apply_changes(change_set: &mut RepoChangeSet) -> Result<usize> {
    let root = change_set.repo_root.clone();
    if !root.is_dir() {
        return Err(anyhow!("repo root does not exist: {}", root.display()));
    }
    let _lock = RepoLock::acquire(&root)?;

    let mut written: Vec<&FileChange> = Vec::new();
    for change in &change_set.changes {
        let dest = root.join(&change.rel_path);
        if let Err(err) = write_file(&dest, &change.after) {
            rollback(&root, &written);
            return Err(err);
        }
        written.push(change);
    }
    let count = written.len();
    change_set.applied = true;
    tracing::info!(root = %root.display(), files = count, "applied repo changes");
    Ok(count)
}

fn write_file(dest: &Path, content: &str) -> Result<()> {
    let parent = dest
        .parent()
        .ok_or_else(|| anyhow!("no parent directory for {}", dest.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    let mut staged =
        NamedTempFile::new_in(parent).with_context(|| format!("stage {}", dest.display()))?;
    staged
        .write_all(content.as_bytes())
        .with_context(|| format!("write {}", dest.display()))?;
    staged
        .persist(dest)
        .map_err(|err| err.error)
        .with_context(|| format!("publish {}", dest.display()))?;
    Ok(())
}

fn rollback(root: &Path, written: &[&FileChange]) {
    for change in written.iter().rev() {
        let dest = root.join(&change.rel_path);
        let restored = match &change.before {
            Some(before) => write_file(&dest, before),
            None => fs::remove_file(&dest)
                .with_context(|| format!("remove {}", dest.display())),
        };
        if let Err(err) = restored {
            tracing::warn!(path = %dest.display(), error = %format!("{err:#}"), "rollback failed");
        }
    }
}
