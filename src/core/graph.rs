//! Entity graph shared by the tree builder and the rule registry.
//!
//! Both the organized file tree and every JDex layout normalize into the
//! same [`EntityGraph`]: an arena of [`Node`]s plus a `by_key` index from
//! [`NumericKey`] to every node carrying that key. Duplicates are kept, so a
//! key maps to an ordered set of nodes rather than a single one.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};

/// Start of an area range; `AreaKey(10)` is `10-19`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AreaKey(u8);

impl AreaKey
{
    /// Area for a single leading digit (`1` → `10-19`).
    pub fn from_digit(digit: u8) -> Option<Self>
    {
        (digit <= 9).then_some(Self(digit * 10))
    }

    pub fn start(self) -> u8
    {
        self.0
    }
}

impl fmt::Display for AreaKey
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        write!(f, "{:02}-{:02}", self.0, self.0 + 9)
    }
}

/// Two-digit category number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CategoryKey(u8);

impl CategoryKey
{
    pub fn new(number: u8) -> Option<Self>
    {
        (number <= 99).then_some(Self(number))
    }

    pub fn number(self) -> u8
    {
        self.0
    }

    /// The area this category belongs to by number.
    pub fn area(self) -> AreaKey
    {
        AreaKey(self.0 / 10 * 10)
    }
}

impl fmt::Display for CategoryKey
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        write!(f, "{:02}", self.0)
    }
}

/// `AC.NN` identifier.
///
/// The sub-number keeps its written width, so `11.1` and `11.01` are
/// different IDs and each displays the way it was named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdKey
{
    category: CategoryKey,
    number: u32,
    width: u8,
}

impl IdKey
{
    /// `width` is the digit count of the sub-number as written.
    pub fn new(
        category: CategoryKey,
        number: u32,
        width: u8,
    ) -> Self
    {
        Self { category, number, width: width.max(1) }
    }

    /// The category this ID belongs to by number.
    pub fn category(self) -> CategoryKey
    {
        self.category
    }

    /// `AC.01` is the conventional inbox of category `AC`.
    pub fn is_inbox(self) -> bool
    {
        self.number == 1 && self.width == 2
    }

    /// `AC.00` is the management note of category `AC`.
    pub fn is_management(self) -> bool
    {
        self.number == 0 && self.width == 2
    }
}

impl fmt::Display for IdKey
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        write!(f, "{}.{:0width$}", self.category, self.number, width = usize::from(self.width))
    }
}

/// Identifier at one of the three Johnny Decimal granularities.
///
/// Keys order hierarchically: an area sorts before its categories, and a
/// category before its IDs, so `10-19 < 10 < 10.00 < 11 < 11.01 < 20-29`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKey
{
    Area(AreaKey),
    Category(CategoryKey),
    Id(IdKey),
}

impl NumericKey
{
    /// Parent implied by the number alone; areas have none.
    pub fn implied_parent(self) -> Option<NumericKey>
    {
        match self
        {
            NumericKey::Area(_) => None,
            NumericKey::Category(c) => Some(NumericKey::Area(c.area())),
            NumericKey::Id(id) => Some(NumericKey::Category(id.category())),
        }
    }

    pub fn level(self) -> Level
    {
        match self
        {
            NumericKey::Area(_) => Level::Area,
            NumericKey::Category(_) => Level::Category,
            NumericKey::Id(_) => Level::Id,
        }
    }

    fn sort_tuple(self) -> (u8, Option<u8>, Option<(u32, u8)>)
    {
        match self
        {
            NumericKey::Area(a) => (a.start(), None, None),
            NumericKey::Category(c) => (c.area().start(), Some(c.number()), None),
            NumericKey::Id(id) =>
            {
                let c = id.category();
                (c.area().start(), Some(c.number()), Some((id.number, id.width)))
            }
        }
    }
}

impl Ord for NumericKey
{
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering
    {
        self.sort_tuple()
            .cmp(&other.sort_tuple())
    }
}

impl PartialOrd for NumericKey
{
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering>
    {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NumericKey
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        match self
        {
            NumericKey::Area(a) => a.fmt(f),
            NumericKey::Category(c) => c.fmt(f),
            NumericKey::Id(id) => id.fmt(f),
        }
    }
}

/// Structural level of the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level
{
    Area,
    Category,
    Id,
}

impl fmt::Display for Level
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        match self
        {
            Level::Area => write!(f, "area"),
            Level::Category => write!(f, "category"),
            Level::Id => write!(f, "ID"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind
{
    Area,
    Category,
    Id,
    AreaHeader,
    PlainFile,
}

impl From<Level> for NodeKind
{
    fn from(level: Level) -> Self
    {
        match level
        {
            Level::Area => NodeKind::Area,
            Level::Category => NodeKind::Category,
            Level::Id => NodeKind::Id,
        }
    }
}

/// Index of a node inside its owning graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// One entry of an entity graph.
#[derive(Debug, Clone)]
pub struct Node
{
    /// `None` when the name could not be parsed at its level.
    pub key: Option<NumericKey>,
    /// Display name with the numbering removed.
    pub label: String,
    pub kind: NodeKind,
    /// Key of the physical parent, when there is one and it parsed.
    pub actual_parent_key: Option<NumericKey>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub source_path: Utf8PathBuf,
    pub is_dir: bool,
}

/// Where a graph was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphSource
{
    Files,
    Jdex(JdexLayout),
}

/// Physical layout of a JDex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JdexLayout
{
    Nested,
    Flat,
    SingleFile,
}

impl fmt::Display for JdexLayout
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        match self
        {
            JdexLayout::Nested => write!(f, "nested"),
            JdexLayout::Flat => write!(f, "flat"),
            JdexLayout::SingleFile => write!(f, "single-file"),
        }
    }
}

/// Normalized view of one tree root.
#[derive(Debug, Clone)]
pub struct EntityGraph
{
    source: GraphSource,
    root: Utf8PathBuf,
    nodes: Vec<Node>,
    by_key: BTreeMap<NumericKey, Vec<NodeId>>,
    headers: BTreeMap<AreaKey, Vec<NodeId>>,
    implied: BTreeSet<NumericKey>,
}

impl EntityGraph
{
    pub fn new(
        source: GraphSource,
        root: impl Into<Utf8PathBuf>,
    ) -> Self
    {
        Self {
            source,
            root: root.into(),
            nodes: Vec::new(),
            by_key: BTreeMap::new(),
            headers: BTreeMap::new(),
            implied: BTreeSet::new(),
        }
    }

    pub fn source(&self) -> GraphSource
    {
        self.source
    }

    pub fn is_jdex(&self) -> bool
    {
        matches!(self.source, GraphSource::Jdex(_))
    }

    pub fn root(&self) -> &Utf8Path
    {
        &self.root
    }

    /// Add a node under `parent` (or at the top level) and index it.
    pub fn insert(
        &mut self,
        mut node: Node,
        parent: Option<NodeId>,
    ) -> NodeId
    {
        let id = NodeId(self.nodes.len());
        node.parent = parent;

        match node.kind
        {
            NodeKind::AreaHeader =>
            {
                if let Some(NumericKey::Area(area)) = node.key
                {
                    self.headers
                        .entry(area)
                        .or_default()
                        .push(id);
                }
            }
            NodeKind::PlainFile =>
            {}
            _ =>
            {
                if let Some(key) = node.key
                {
                    self.by_key
                        .entry(key)
                        .or_default()
                        .push(id);
                }
            }
        }

        if let Some(p) = parent
        {
            self.nodes[p.0]
                .children
                .push(id);
        }

        self.nodes
            .push(node);
        id
    }

    /// Record a key documented indirectly (flat JDex management notes).
    pub fn imply(
        &mut self,
        key: NumericKey,
    )
    {
        self.implied
            .insert(key);
    }

    pub fn node(
        &self,
        id: NodeId,
    ) -> &Node
    {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)>
    {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i), n))
    }

    /// Nodes carrying `key`, ordered by source path.
    pub fn lookup(
        &self,
        key: NumericKey,
    ) -> Vec<&Node>
    {
        let mut found: Vec<&Node> = self
            .by_key
            .get(&key)
            .map(|ids| {
                ids.iter()
                    .map(|id| self.node(*id))
                    .collect()
            })
            .unwrap_or_default();
        found.sort_by(|a, b| {
            a.source_path
                .cmp(&b.source_path)
        });
        found
    }

    /// Every key with its nodes, in key order.
    pub fn keyed(&self) -> impl Iterator<Item = (NumericKey, Vec<&Node>)>
    {
        self.by_key
            .keys()
            .map(|k| (*k, self.lookup(*k)))
    }

    /// True when the key has a node or is implied by a management note.
    pub fn documents(
        &self,
        key: NumericKey,
    ) -> bool
    {
        self.by_key
            .contains_key(&key)
            || self
                .implied
                .contains(&key)
    }

    /// Area headers by area, each group ordered by source path.
    pub fn headers(&self) -> impl Iterator<Item = (AreaKey, Vec<&Node>)>
    {
        self.headers
            .iter()
            .map(|(area, ids)| {
                let mut nodes: Vec<&Node> = ids
                    .iter()
                    .map(|id| self.node(*id))
                    .collect();
                nodes.sort_by(|a, b| {
                    a.source_path
                        .cmp(&b.source_path)
                });
                (*area, nodes)
            })
    }

    pub fn len(&self) -> usize
    {
        self.nodes
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.nodes
            .is_empty()
    }
}
