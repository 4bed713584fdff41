//! Filepath: src/infra/walk.rs
//! Filesystem-backed directory listing.
//! - One directory level per call, sorted by file name
//! - No gitignore, hidden-file or parent-ignore filtering: every entry counts
//! - Symlinks are followed; a broken link is an error, not a silent skip
//! - Non-UTF-8 names are an error since paths flow into the report
//!
//! Backed by ripgrep's `ignore` crate with its standard filters disabled.
//! Ignore globs are applied by the tree builder, not here.

use std::fs;
use std::path::Path;

use camino::Utf8Path;
use ignore::WalkBuilder;
use tracing::trace;

use crate::core::listing::{DirectoryListing, Entry, ListingError, PathKind};

/// Reads the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsListing;

impl FsListing
{
    pub fn new() -> Self
    {
        Self
    }

    /// Internal: construct a walker that yields exactly the children of `dir`.
    fn build_walk(dir: &Path) -> WalkBuilder
    {
        let mut b = WalkBuilder::new(dir);

        // Every entry is significant to the linter
        b.standard_filters(false);
        b.hidden(false);
        b.parents(false);

        // Depth 0 is `dir` itself
        b.max_depth(Some(1));
        b.follow_links(true);

        // Deterministic order (stable CLI & tests)
        b.sort_by_file_name(|a, b| a.cmp(b));

        b
    }
}

impl DirectoryListing for FsListing
{
    fn list(
        &self,
        dir: &Utf8Path,
    ) -> Result<Vec<Entry>, ListingError>
    {
        // Surface permission errors on the directory itself up front
        fs::read_dir(dir).map_err(|source| ListingError::Io { path: dir.to_path_buf(), source })?;

        let mut out = Vec::new();

        for result in Self::build_walk(dir.as_std_path()).build()
        {
            let entry = result
                .map_err(|e| ListingError::Walk { path: dir.to_path_buf(), message: e.to_string() })?;

            if entry.depth() == 0
            {
                continue;
            }

            let name = entry
                .file_name()
                .to_str()
                .ok_or_else(|| ListingError::NonUtf8 {
                    parent: dir.to_path_buf(),
                    name: entry
                        .file_name()
                        .to_string_lossy()
                        .into_owned(),
                })?
                .to_string();

            // With follow_links the type is the link target's
            let is_dir = entry
                .file_type()
                .is_some_and(|ft| ft.is_dir());

            trace!(%dir, %name, is_dir, "listed entry");
            out.push(Entry { name, is_dir });
        }

        Ok(out)
    }

    fn read_to_string(
        &self,
        path: &Utf8Path,
    ) -> Result<String, ListingError>
    {
        fs::read_to_string(path).map_err(|source| ListingError::Io { path: path.to_path_buf(), source })
    }

    fn kind(
        &self,
        path: &Utf8Path,
    ) -> PathKind
    {
        match fs::metadata(path)
        {
            Ok(meta) if meta.is_dir() => PathKind::Directory,
            Ok(meta) if meta.is_file() => PathKind::File,
            Ok(_) => PathKind::Other,
            Err(_) => PathKind::Missing,
        }
    }
}
