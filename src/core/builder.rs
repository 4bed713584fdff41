//! Tree builder: turns a listed root into an [`EntityGraph`].
//!
//! One entry point serves the organized file tree and the three JDex
//! layouts. Whatever the physical shape, the output is the same graph type,
//! so every rule downstream is layout-agnostic. Structural findings made
//! during the walk (unparseable names, stray files, inbox contents, physical
//! parents) are recorded in the graph and reported by the rule registry.

use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, instrument, trace};

use super::graph::{
    AreaKey, CategoryKey, EntityGraph, GraphSource, IdKey, JdexLayout, Level, Node, NodeId,
    NodeKind, NumericKey,
};
use super::listing::{DirectoryListing, Entry, ListingError, PathKind};
use super::name::{self, ParsedName};

/// Which shape of tree to expect under the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Area → Category → Id directories holding the actual files.
    FilesRoot,
    /// Area → Category directories holding one note per Id.
    JdexNested,
    /// One directory of notes; the number alone decides the slot.
    JdexFlat,
    /// A single index document, parsed on a best-effort basis.
    JdexSingleFile,
}

impl BuildMode {
    fn source(self) -> GraphSource {
        match self {
            BuildMode::FilesRoot => GraphSource::Files,
            BuildMode::JdexNested => GraphSource::Jdex(JdexLayout::Nested),
            BuildMode::JdexFlat => GraphSource::Jdex(JdexLayout::Flat),
            BuildMode::JdexSingleFile => GraphSource::Jdex(JdexLayout::SingleFile),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Listing(#[from] ListingError),

    #[error("{path} is not a directory")]
    NotADirectory { path: Utf8PathBuf },

    #[error("JDex path {path} is neither a file nor a directory")]
    InvalidJdexPath { path: Utf8PathBuf },

    #[error("invalid ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Glob patterns matched against file names only.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    set: GlobSet,
}

impl IgnoreMatcher {
    pub fn new(patterns: &[String]) -> Result<Self, BuildError> {
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|source| BuildError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }

        let set = builder.build().map_err(|source| BuildError::InvalidPattern {
            pattern: patterns.join(", "),
            source,
        })?;
        Ok(Self { set })
    }

    pub fn empty() -> Self {
        Self {
            set: GlobSet::empty(),
        }
    }

    pub fn is_ignored(&self, file_name: &str) -> bool {
        self.set.is_match(file_name)
    }
}

impl Default for IgnoreMatcher {
    fn default() -> Self {
        Self::empty()
    }
}

/// Knobs shared by every build of one run.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub ignore: IgnoreMatcher,
    /// Alternative zeros: area management lives in `00-09`, area headers
    /// are recognized in flat JDex directories.
    pub altzeros: bool,
}

/// Walks one root through a [`DirectoryListing`].
pub struct TreeBuilder<'a, L: DirectoryListing + ?Sized> {
    listing: &'a L,
    options: &'a BuildOptions,
}

impl<'a, L: DirectoryListing + ?Sized> TreeBuilder<'a, L> {
    pub fn new(listing: &'a L, options: &'a BuildOptions) -> Self {
        Self { listing, options }
    }

    /// Build the graph for `root` in the given mode.
    #[instrument(skip(self), fields(altzeros = self.options.altzeros))]
    pub fn build(&self, root: &Utf8Path, mode: BuildMode) -> Result<EntityGraph, BuildError> {
        let mut graph = EntityGraph::new(mode.source(), root);

        match mode {
            BuildMode::FilesRoot | BuildMode::JdexNested => {
                self.require_dir(root)?;
                self.walk_level(&mut graph, root, Level::Area, None)?;
            }
            BuildMode::JdexFlat => {
                self.require_dir(root)?;
                self.build_flat(&mut graph, root)?;
            }
            BuildMode::JdexSingleFile => self.build_single_file(&mut graph, root)?,
        }

        debug!(nodes = graph.len(), "built entity graph");
        Ok(graph)
    }

    fn require_dir(&self, root: &Utf8Path) -> Result<(), BuildError> {
        match self.listing.kind(root) {
            PathKind::Directory => Ok(()),
            _ => Err(BuildError::NotADirectory {
                path: root.to_path_buf(),
            }),
        }
    }

    /// Children of `dir` that are not matched by an ignore glob.
    fn visible(&self, dir: &Utf8Path) -> Result<Vec<Entry>, ListingError> {
        let entries = self.listing.list(dir)?;
        Ok(entries
            .into_iter()
            .filter(|e| {
                let ignored = self.options.ignore.is_ignored(&e.name);
                if ignored {
                    trace!(%dir, name = %e.name, "ignored entry");
                }
                !ignored
            })
            .collect())
    }

    /// Shared walk for the files tree and nested JDex directories.
    fn walk_level(
        &self,
        graph: &mut EntityGraph,
        dir: &Utf8Path,
        level: Level,
        parent: Option<NodeId>,
    ) -> Result<(), ListingError> {
        let jdex = graph.is_jdex();
        let parent_key = parent.and_then(|p| graph.node(p).key);

        for entry in self.visible(dir)? {
            let path = dir.join(&entry.name);

            // Files only belong at the leaf of a JDex; anywhere else they are strays
            let leaf_note = jdex && level == Level::Id;
            if !entry.is_dir && !leaf_note {
                graph.insert(plain_node(path, false, parent_key), parent);
                continue;
            }

            let segment = if entry.is_dir {
                entry.name.as_str()
            } else {
                name::strip_note_extension(&entry.name)
            };

            let parsed = match name::parse(segment, level) {
                Ok(parsed) => parsed,
                Err(err) => {
                    debug!(%path, %err, "unparseable name");
                    graph.insert(unkeyed_node(level, segment, path, entry.is_dir, parent_key), parent);
                    continue;
                }
            };

            let key = parsed.key;
            let node = graph.insert(keyed_node(parsed, parent_key, path.clone(), entry.is_dir), parent);

            match level {
                Level::Area => self.walk_level(graph, &path, Level::Category, Some(node))?,
                Level::Category => self.walk_level(graph, &path, Level::Id, Some(node))?,
                Level::Id if entry.is_dir && !jdex => self.collect_contents(graph, &path, node, key)?,
                Level::Id => {}
            }
        }

        Ok(())
    }

    /// Record the (non-ignored) items stored in an Id directory.
    fn collect_contents(
        &self,
        graph: &mut EntityGraph,
        dir: &Utf8Path,
        id: NodeId,
        key: NumericKey,
    ) -> Result<(), ListingError> {
        for entry in self.visible(dir)? {
            graph.insert(plain_node(dir.join(&entry.name), entry.is_dir, Some(key)), Some(id));
        }
        Ok(())
    }

    /// Flat JDex: every note sits in one directory.
    fn build_flat(&self, graph: &mut EntityGraph, root: &Utf8Path) -> Result<(), ListingError> {
        for entry in self.visible(root)? {
            let path = root.join(&entry.name);

            if entry.is_dir {
                debug!(%path, "skipping directory inside flat JDex");
                continue;
            }

            let stem = name::strip_note_extension(&entry.name);

            if self.options.altzeros
                && let Some((area, label)) = name::parse_area_header(stem)
            {
                graph.insert(
                    Node {
                        key: Some(NumericKey::Area(area)),
                        label,
                        kind: NodeKind::AreaHeader,
                        actual_parent_key: None,
                        parent: None,
                        children: Vec::new(),
                        source_path: path,
                        is_dir: false,
                    },
                    None,
                );
                continue;
            }

            match name::parse(stem, Level::Id) {
                Ok(ParsedName {
                    key: NumericKey::Id(id),
                    label,
                }) => self.place_flat_note(graph, id, label, path),
                Ok(other) => {
                    // parse(.., Level::Id) only yields Id keys
                    debug!(%path, key = %other.key, "unexpected key for flat note");
                }
                Err(err) => {
                    debug!(%path, %err, "unparseable flat note");
                    graph.insert(unkeyed_node(Level::Id, stem, path, false, None), None);
                }
            }
        }
        Ok(())
    }

    fn place_flat_note(&self, graph: &mut EntityGraph, id: IdKey, label: String, path: Utf8PathBuf) {
        let category = id.category();
        let canonical = name::canonical_label(&label);

        match flat_slot(id, self.options.altzeros) {
            FlatSlot::AreaManagement(area) => {
                trace!(%path, %area, "area management note");
                graph.insert(flat_node(NumericKey::Area(area), &canonical, &path), None);

                if self.options.altzeros {
                    // `0N.00` also names the management category `0N`
                    graph.insert(flat_node(NumericKey::Category(category), &canonical, &path), None);
                } else {
                    graph.imply(NumericKey::Category(category));
                }
                graph.imply(NumericKey::Id(id));
            }
            FlatSlot::CategoryManagement => {
                trace!(%path, %category, "category management note");
                graph.insert(flat_node(NumericKey::Category(category), &canonical, &path), None);
                graph.imply(NumericKey::Id(id));
            }
            FlatSlot::Id => {
                graph.insert(flat_node(NumericKey::Id(id), &label, &path), None);
            }
        }
    }

    /// Single-file JDex: index lines are picked out of a document.
    ///
    /// Only lines that look like an area, category or ID entry count; every
    /// other line is ignored and nothing about the document's overall
    /// structure is validated.
    fn build_single_file(&self, graph: &mut EntityGraph, path: &Utf8Path) -> Result<(), ListingError> {
        let text = self.listing.read_to_string(path)?;

        for (index, raw) in text.lines().enumerate() {
            let line = clean_index_line(raw);
            if line.is_empty() {
                continue;
            }

            let parsed = [Level::Area, Level::Id, Level::Category]
                .into_iter()
                .find_map(|level| name::parse(line, level).ok());

            if let Some(parsed) = parsed {
                let location = Utf8PathBuf::from(format!("{path}:{}", index + 1));
                let label = parsed.label.clone();
                graph.insert(flat_node(parsed.key, &label, &location), None);
            }
        }
        Ok(())
    }
}

/// Where a flat-JDex note with the given number belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlatSlot {
    AreaManagement(AreaKey),
    CategoryManagement,
    Id,
}

fn flat_slot(id: IdKey, altzeros: bool) -> FlatSlot {
    if !id.is_management() {
        return FlatSlot::Id;
    }

    let category: CategoryKey = id.category();

    if altzeros {
        // `0N.00` manages area `N0-N9`
        if category.area().start() == 0
            && let Some(area) = AreaKey::from_digit(category.number())
        {
            return FlatSlot::AreaManagement(area);
        }
        FlatSlot::CategoryManagement
    } else if category.number() % 10 == 0 {
        // `N0.00` manages area `N0-N9`
        FlatSlot::AreaManagement(category.area())
    } else {
        FlatSlot::CategoryManagement
    }
}

/// Strip list/heading markers and trailing `//` comments from an index line.
fn clean_index_line(raw: &str) -> &str {
    let line = raw
        .trim()
        .trim_start_matches(|c: char| matches!(c, '#' | '-' | '*' | '+' | '>') || c.is_whitespace());

    match line.find("//") {
        Some(at) => line[..at].trim_end(),
        None => line.trim_end(),
    }
}

fn keyed_node(parsed: ParsedName, parent_key: Option<NumericKey>, path: Utf8PathBuf, is_dir: bool) -> Node {
    Node {
        key: Some(parsed.key),
        label: parsed.label,
        kind: parsed.key.level().into(),
        actual_parent_key: parent_key,
        parent: None,
        children: Vec::new(),
        source_path: path,
        is_dir,
    }
}

fn unkeyed_node(
    level: Level,
    segment: &str,
    path: Utf8PathBuf,
    is_dir: bool,
    parent_key: Option<NumericKey>,
) -> Node {
    Node {
        key: None,
        label: segment.to_string(),
        kind: level.into(),
        actual_parent_key: parent_key,
        parent: None,
        children: Vec::new(),
        source_path: path,
        is_dir,
    }
}

fn plain_node(path: Utf8PathBuf, is_dir: bool, parent_key: Option<NumericKey>) -> Node {
    Node {
        key: None,
        label: path.file_name().unwrap_or_default().to_string(),
        kind: NodeKind::PlainFile,
        actual_parent_key: parent_key,
        parent: None,
        children: Vec::new(),
        source_path: path,
        is_dir,
    }
}

/// Node without a physical parent, as produced by flat and single-file JDex.
fn flat_node(key: NumericKey, label: &str, path: &Utf8Path) -> Node {
    Node {
        key: Some(key),
        label: label.to_string(),
        kind: key.level().into(),
        actual_parent_key: None,
        parent: None,
        children: Vec::new(),
        source_path: path.to_path_buf(),
        is_dir: false,
    }
}

/// Work out which JDex layout lives at `path`.
///
/// A file is a single-file JDex. A directory is nested when any visible
/// top-level entry is a directory named like an area, and flat otherwise.
#[instrument(skip(listing, ignore))]
pub fn detect_jdex_mode<L: DirectoryListing + ?Sized>(
    listing: &L,
    path: &Utf8Path,
    ignore: &IgnoreMatcher,
) -> Result<BuildMode, BuildError> {
    let mode = match listing.kind(path) {
        PathKind::File => BuildMode::JdexSingleFile,
        PathKind::Directory => {
            let nested = listing.list(path)?.iter().any(|e| {
                e.is_dir && !ignore.is_ignored(&e.name) && name::parse(&e.name, Level::Area).is_ok()
            });
            if nested {
                BuildMode::JdexNested
            } else {
                BuildMode::JdexFlat
            }
        }
        PathKind::Missing | PathKind::Other => {
            return Err(BuildError::InvalidJdexPath {
                path: path.to_path_buf(),
            });
        }
    };

    debug!(?mode, "detected JDex layout");
    Ok(mode)
}
