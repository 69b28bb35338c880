//! Scoped temporary files for materialized inputs

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

use crate::error::Result;

/// A not-yet-created file path inside a private temporary directory.
///
/// The directory and everything in it are removed when this value drops,
/// on success and error paths alike.
#[derive(Debug)]
pub struct ScopedTempFile {
    dir: TempDir,
    path: PathBuf,
}

impl ScopedTempFile {
    /// Reserve `<uuid><suffix>` in a fresh temporary directory.
    pub fn new(suffix: &str) -> Result<Self> {
        Ok(Self::reserve(scratch_dir(None)?, suffix))
    }

    /// Like [`ScopedTempFile::new`], with the directory created under `root`.
    pub fn new_in(root: &Path, suffix: &str) -> Result<Self> {
        Ok(Self::reserve(scratch_dir(Some(root))?, suffix))
    }

    fn reserve(dir: TempDir, suffix: &str) -> Self {
        let path = dir
            .path()
            .join(format!("{}{}", Uuid::new_v4().simple(), suffix));
        Self { dir, path }
    }

    /// Keep the caller's file name inside a fresh temporary directory.
    pub fn named(file_name: &str) -> Result<Self> {
        let dir = scratch_dir(None)?;
        let name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let path = dir.path().join(name);
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

fn scratch_dir(root: Option<&Path>) -> Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("doc-extract-");
    let dir = match root {
        Some(root) => builder.tempdir_in(root)?,
        None => builder.tempdir()?,
    };
    Ok(dir)
}

/// Suffix (with dot, original case) of a storage key; "" if none.
pub fn suffix_of_key(key: &str) -> String {
    Path::new(key)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Suffix of a URL's last path segment. Query and fragment are ignored.
pub fn suffix_of_url(url: &reqwest::Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(suffix_of_key)
        .unwrap_or_default()
}
