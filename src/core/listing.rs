//! Abstract directory enumeration consumed by the tree builder.
//!
//! The builder never touches the OS directly; it asks a
//! [`DirectoryListing`] for the children of a directory or the text of a
//! file. [`crate::infra::walk::FsListing`] backs this with the real
//! filesystem, [`MemoryTree`] with an in-memory fixture.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Entry
{
    pub name: String,
    pub is_dir: bool,
}

/// What a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind
{
    Directory,
    File,
    Missing,
    /// Exists but is neither a regular file nor a directory.
    Other,
}

/// Failure to enumerate or read part of a tree.
#[derive(Debug, thiserror::Error)]
pub enum ListingError
{
    #[error("cannot read {path}: {source}")]
    Io
    {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot list {path}: {message}")]
    Walk
    {
        path: Utf8PathBuf,
        message: String,
    },

    #[error("entry in {parent} has a non-UTF-8 name: {name}")]
    NonUtf8
    {
        parent: Utf8PathBuf,
        name: String,
    },

    #[error("{path} does not exist")]
    NotFound
    {
        path: Utf8PathBuf,
    },
}

/// Read-only enumeration capability.
pub trait DirectoryListing
{
    /// Children of `dir`, sorted by name.
    fn list(
        &self,
        dir: &Utf8Path,
    ) -> Result<Vec<Entry>, ListingError>;

    /// Full text of the file at `path`.
    fn read_to_string(
        &self,
        path: &Utf8Path,
    ) -> Result<String, ListingError>;

    /// Classify `path` without failing on missing entries.
    fn kind(
        &self,
        path: &Utf8Path,
    ) -> PathKind;
}

#[derive(Debug, Clone)]
enum MemoryEntry
{
    Dir(BTreeMap<String, MemoryEntry>),
    File(String),
}

/// In-memory tree addressed by `/`-separated paths.
///
/// ```
/// use camino::Utf8Path;
/// use jdlint::core::listing::{DirectoryListing, MemoryTree};
///
/// let tree = MemoryTree::new("files")
///     .dir("00-09 System/01 System Stuff/01.01 Inbox")
///     .file("00-09 System/01 System Stuff/01.01 Inbox/todo.txt", "");
/// let entries = tree.list(Utf8Path::new("files/00-09 System")).unwrap();
/// assert_eq!(entries[0].name, "01 System Stuff");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryTree
{
    root: Utf8PathBuf,
    entries: BTreeMap<String, MemoryEntry>,
}

impl MemoryTree
{
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self
    {
        Self { root: root.into(), entries: BTreeMap::new() }
    }

    pub fn root(&self) -> &Utf8Path
    {
        &self.root
    }

    /// Add a directory (and any missing parents) relative to the root.
    pub fn dir(
        mut self,
        rel: &str,
    ) -> Self
    {
        let parts: Vec<&str> = split(rel).collect();
        Self::ensure_dirs(&mut self.entries, &parts);
        self
    }

    /// Add a file (creating parent directories) relative to the root.
    pub fn file(
        mut self,
        rel: &str,
        contents: &str,
    ) -> Self
    {
        let parts: Vec<&str> = split(rel).collect();
        if let Some((name, parents)) = parts.split_last()
        {
            let dir = Self::ensure_dirs(&mut self.entries, parents);
            dir.insert(name.to_string(), MemoryEntry::File(contents.to_string()));
        }
        self
    }

    fn ensure_dirs<'a>(
        mut current: &'a mut BTreeMap<String, MemoryEntry>,
        parts: &[&str],
    ) -> &'a mut BTreeMap<String, MemoryEntry>
    {
        for part in parts
        {
            let slot = current
                .entry(part.to_string())
                .or_insert_with(|| MemoryEntry::Dir(BTreeMap::new()));

            // A later `dir` call over an existing file replaces it
            if let MemoryEntry::File(_) = *slot
            {
                *slot = MemoryEntry::Dir(BTreeMap::new());
            }

            current = match slot
            {
                MemoryEntry::Dir(children) => children,
                MemoryEntry::File(_) => unreachable!("replaced above"),
            };
        }
        current
    }

    fn resolve(
        &self,
        path: &Utf8Path,
    ) -> Option<Resolved<'_>>
    {
        let rel = path
            .strip_prefix(&self.root)
            .ok()?;

        let mut current = &self.entries;
        let mut parts = rel
            .components()
            .map(|c| c.as_str())
            .peekable();

        if parts
            .peek()
            .is_none()
        {
            return Some(Resolved::Dir(current));
        }

        while let Some(part) = parts.next()
        {
            match current.get(part)?
            {
                MemoryEntry::Dir(children) if parts.peek().is_none() =>
                {
                    return Some(Resolved::Dir(children));
                }
                MemoryEntry::Dir(children) => current = children,
                MemoryEntry::File(text) if parts.peek().is_none() =>
                {
                    return Some(Resolved::File(text));
                }
                MemoryEntry::File(_) => return None,
            }
        }
        None
    }
}

enum Resolved<'a>
{
    Dir(&'a BTreeMap<String, MemoryEntry>),
    File(&'a str),
}

fn split(rel: &str) -> impl Iterator<Item = &str>
{
    rel.split('/')
        .filter(|p| !p.is_empty())
}

impl DirectoryListing for MemoryTree
{
    fn list(
        &self,
        dir: &Utf8Path,
    ) -> Result<Vec<Entry>, ListingError>
    {
        match self.resolve(dir)
        {
            Some(Resolved::Dir(children)) => Ok(children
                .iter()
                .map(|(name, entry)| Entry {
                    name: name.clone(),
                    is_dir: matches!(entry, MemoryEntry::Dir(_)),
                })
                .collect()),
            _ => Err(ListingError::NotFound { path: dir.to_path_buf() }),
        }
    }

    fn read_to_string(
        &self,
        path: &Utf8Path,
    ) -> Result<String, ListingError>
    {
        match self.resolve(path)
        {
            Some(Resolved::File(text)) => Ok(text.to_string()),
            _ => Err(ListingError::NotFound { path: path.to_path_buf() }),
        }
    }

    fn kind(
        &self,
        path: &Utf8Path,
    ) -> PathKind
    {
        match self.resolve(path)
        {
            Some(Resolved::Dir(_)) => PathKind::Directory,
            Some(Resolved::File(_)) => PathKind::File,
            None => PathKind::Missing,
        }
    }
}
