//! Rule registry.
//!
//! Every diagnostic the linter can produce comes from one entry of the
//! static [`RULES`] table. An entry pairs a [`RuleId`] with a [`Check`], a
//! small description of which family of condition it evaluates and on which
//! graph. Rules are pure: they read the graphs and return diagnostics.

use std::fmt;
use std::str::FromStr;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use super::graph::{EntityGraph, Level, Node, NodeKind, NumericKey};
use super::name::canonical_label;

/// Stable identifier of a rule, serialized as `SCREAMING_SNAKE_CASE`.
///
/// Variants are declared in alphabetical order of their ids, so the derived
/// ordering matches the textual one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleId {
    AreaDifferentFromJdex,
    AreaNotInJdex,
    CategoryDifferentFromJdex,
    CategoryInWrongArea,
    CategoryNotInJdex,
    DuplicateArea,
    DuplicateCategory,
    DuplicateId,
    FileOutsideId,
    IdDifferentFromJdex,
    IdInWrongCategory,
    IdNotInJdex,
    InvalidAreaName,
    InvalidCategoryName,
    InvalidIdName,
    JdexAreaHeaderDifferentFromArea,
    JdexAreaHeaderWithoutArea,
    JdexCategoryInWrongArea,
    JdexDuplicateArea,
    JdexDuplicateAreaHeader,
    JdexDuplicateCategory,
    JdexDuplicateId,
    JdexFileOutsideCategory,
    JdexIdInWrongCategory,
    JdexInvalidAreaName,
    JdexInvalidCategoryName,
    JdexInvalidIdName,
    NonemptyInbox,
}

impl RuleId {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleId::AreaDifferentFromJdex => "AREA_DIFFERENT_FROM_JDEX",
            RuleId::AreaNotInJdex => "AREA_NOT_IN_JDEX",
            RuleId::CategoryDifferentFromJdex => "CATEGORY_DIFFERENT_FROM_JDEX",
            RuleId::CategoryInWrongArea => "CATEGORY_IN_WRONG_AREA",
            RuleId::CategoryNotInJdex => "CATEGORY_NOT_IN_JDEX",
            RuleId::DuplicateArea => "DUPLICATE_AREA",
            RuleId::DuplicateCategory => "DUPLICATE_CATEGORY",
            RuleId::DuplicateId => "DUPLICATE_ID",
            RuleId::FileOutsideId => "FILE_OUTSIDE_ID",
            RuleId::IdDifferentFromJdex => "ID_DIFFERENT_FROM_JDEX",
            RuleId::IdInWrongCategory => "ID_IN_WRONG_CATEGORY",
            RuleId::IdNotInJdex => "ID_NOT_IN_JDEX",
            RuleId::InvalidAreaName => "INVALID_AREA_NAME",
            RuleId::InvalidCategoryName => "INVALID_CATEGORY_NAME",
            RuleId::InvalidIdName => "INVALID_ID_NAME",
            RuleId::JdexAreaHeaderDifferentFromArea => "JDEX_AREA_HEADER_DIFFERENT_FROM_AREA",
            RuleId::JdexAreaHeaderWithoutArea => "JDEX_AREA_HEADER_WITHOUT_AREA",
            RuleId::JdexCategoryInWrongArea => "JDEX_CATEGORY_IN_WRONG_AREA",
            RuleId::JdexDuplicateArea => "JDEX_DUPLICATE_AREA",
            RuleId::JdexDuplicateAreaHeader => "JDEX_DUPLICATE_AREA_HEADER",
            RuleId::JdexDuplicateCategory => "JDEX_DUPLICATE_CATEGORY",
            RuleId::JdexDuplicateId => "JDEX_DUPLICATE_ID",
            RuleId::JdexFileOutsideCategory => "JDEX_FILE_OUTSIDE_CATEGORY",
            RuleId::JdexIdInWrongCategory => "JDEX_ID_IN_WRONG_CATEGORY",
            RuleId::JdexInvalidAreaName => "JDEX_INVALID_AREA_NAME",
            RuleId::JdexInvalidCategoryName => "JDEX_INVALID_CATEGORY_NAME",
            RuleId::JdexInvalidIdName => "JDEX_INVALID_ID_NAME",
            RuleId::NonemptyInbox => "NONEMPTY_INBOX",
        }
    }

    /// Every rule id, in id order.
    pub fn all() -> impl Iterator<Item = RuleId> {
        RULES.iter().map(|r| r.id)
    }

    /// The registry entry for this id.
    pub fn rule(self) -> &'static Rule {
        // RULES holds exactly one entry per variant, in variant order
        &RULES[self as usize]
    }

    pub fn explanation(self) -> &'static str {
        self.rule().explanation
    }

    pub fn fix(self) -> &'static str {
        self.rule().fix
    }

    /// Whether the rule can only fire when a JDex is supplied.
    pub fn needs_jdex(self) -> bool {
        self.rule().check.needs_jdex()
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rule id '{0}' (see --explain for the list)")]
pub struct UnknownRule(pub String);

impl FromStr for RuleId {
    type Err = UnknownRule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        RuleId::all()
            .find(|id| id.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownRule(s.to_string()))
    }
}

/// Every rule reports at the same severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    #[default]
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One finding. Only `rule`, `paths` and `message` are serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub rule: RuleId,
    #[serde(skip)]
    pub severity: Severity,
    /// Sort key; `None` for findings about unnumbered entries.
    #[serde(skip)]
    pub key: Option<NumericKey>,
    pub paths: Vec<Utf8PathBuf>,
    pub message: String,
}

impl Diagnostic {
    fn new(rule: RuleId, key: Option<NumericKey>, paths: Vec<Utf8PathBuf>, message: String) -> Self {
        Self {
            rule,
            severity: Severity::Error,
            key,
            paths,
            message,
        }
    }
}

/// Which of the two graphs a check reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Files,
    Jdex,
}

/// Family of condition evaluated by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// More than one node for a key at `level`.
    Duplicates { side: Side, level: Level },
    /// Physical parent differs from the number's implied parent.
    Placement { side: Side, level: Level },
    /// Keyless node found at `level`.
    InvalidName { side: Side, level: Level },
    /// Files label differs from every JDex label for the same key.
    NamingSync { level: Level },
    /// Files key not documented by the JDex.
    Presence { level: Level },
    /// Plain file outside an Id (files) or outside a category (nested JDex).
    StrayFiles { side: Side },
    NonemptyInbox,
    DuplicateHeaders,
    HeaderSync,
    HeaderWithoutArea,
}

impl Check {
    fn needs_jdex(self) -> bool {
        match self {
            Check::Duplicates { side, .. }
            | Check::Placement { side, .. }
            | Check::InvalidName { side, .. }
            | Check::StrayFiles { side } => side == Side::Jdex,
            Check::NamingSync { .. }
            | Check::Presence { .. }
            | Check::DuplicateHeaders
            | Check::HeaderSync
            | Check::HeaderWithoutArea => true,
            Check::NonemptyInbox => false,
        }
    }
}

/// One registry entry.
#[derive(Debug)]
pub struct Rule {
    pub id: RuleId,
    pub check: Check,
    pub explanation: &'static str,
    pub fix: &'static str,
}

const UPDATE_EITHER: &str = "Update whichever of the two is wrong.";
const AREA_FORMAT: &str = "Valid area names look like \"10-19 Life Admin\"; rename it to match.";
const CATEGORY_FORMAT: &str = "Valid category names look like \"11 Me, Myself, & I\"; rename it to match.";
const ID_FORMAT: &str = "Valid ID names look like \"11.11 A Cool Project\"; rename it to match.";

/// The full registry, one entry per [`RuleId`] in id order.
pub static RULES: [Rule; 28] = [
    Rule {
        id: RuleId::AreaDifferentFromJdex,
        check: Check::NamingSync { level: Level::Area },
        explanation: "An area is named differently from its JDex entry.",
        fix: UPDATE_EITHER,
    },
    Rule {
        id: RuleId::AreaNotInJdex,
        check: Check::Presence { level: Level::Area },
        explanation: "An area in your files is missing from your JDex.",
        fix: "Add a matching entry to your JDex, or remove the area if it is unused.",
    },
    Rule {
        id: RuleId::CategoryDifferentFromJdex,
        check: Check::NamingSync { level: Level::Category },
        explanation: "A category is named differently from its JDex entry.",
        fix: UPDATE_EITHER,
    },
    Rule {
        id: RuleId::CategoryInWrongArea,
        check: Check::Placement {
            side: Side::Files,
            level: Level::Category,
        },
        explanation: "A category sits in an area its number does not belong to.",
        fix: "Move it into the matching area folder.",
    },
    Rule {
        id: RuleId::CategoryNotInJdex,
        check: Check::Presence {
            level: Level::Category,
        },
        explanation: "A category in your files is missing from your JDex.",
        fix: "Add a matching entry to your JDex.",
    },
    Rule {
        id: RuleId::DuplicateArea,
        check: Check::Duplicates {
            side: Side::Files,
            level: Level::Area,
        },
        explanation: "The same area number is used more than once.",
        fix: "Give all but one of them a new area.",
    },
    Rule {
        id: RuleId::DuplicateCategory,
        check: Check::Duplicates {
            side: Side::Files,
            level: Level::Category,
        },
        explanation: "The same category number is used more than once.",
        fix: "Give all but one of them a new category.",
    },
    Rule {
        id: RuleId::DuplicateId,
        check: Check::Duplicates {
            side: Side::Files,
            level: Level::Id,
        },
        explanation: "The same ID is used more than once.",
        fix: "Give all but one of them a new ID.",
    },
    Rule {
        id: RuleId::FileOutsideId,
        check: Check::StrayFiles { side: Side::Files },
        explanation: "A file sits outside of any ID.",
        fix: "Keep files inside IDs only, not higher up the hierarchy.",
    },
    Rule {
        id: RuleId::IdDifferentFromJdex,
        check: Check::NamingSync { level: Level::Id },
        explanation: "An ID is named differently from its JDex entry.",
        fix: UPDATE_EITHER,
    },
    Rule {
        id: RuleId::IdInWrongCategory,
        check: Check::Placement {
            side: Side::Files,
            level: Level::Id,
        },
        explanation: "An ID sits in a category its number does not belong to.",
        fix: "Move it into the matching category folder.",
    },
    Rule {
        id: RuleId::IdNotInJdex,
        check: Check::Presence { level: Level::Id },
        explanation: "An ID in your files is missing from your JDex.",
        fix: "Add a matching entry to your JDex.",
    },
    Rule {
        id: RuleId::InvalidAreaName,
        check: Check::InvalidName {
            side: Side::Files,
            level: Level::Area,
        },
        explanation: "An area folder has an invalid name.",
        fix: AREA_FORMAT,
    },
    Rule {
        id: RuleId::InvalidCategoryName,
        check: Check::InvalidName {
            side: Side::Files,
            level: Level::Category,
        },
        explanation: "A category folder has an invalid name.",
        fix: CATEGORY_FORMAT,
    },
    Rule {
        id: RuleId::InvalidIdName,
        check: Check::InvalidName {
            side: Side::Files,
            level: Level::Id,
        },
        explanation: "An ID folder has an invalid name.",
        fix: ID_FORMAT,
    },
    Rule {
        id: RuleId::JdexAreaHeaderDifferentFromArea,
        check: Check::HeaderSync,
        explanation: "A JDex area header is named differently from its area entry.",
        fix: UPDATE_EITHER,
    },
    Rule {
        id: RuleId::JdexAreaHeaderWithoutArea,
        check: Check::HeaderWithoutArea,
        explanation: "A JDex area header has no matching area entry.",
        fix: "Add the area entry to your JDex, or delete the header if it is no longer needed.",
    },
    Rule {
        id: RuleId::JdexCategoryInWrongArea,
        check: Check::Placement {
            side: Side::Jdex,
            level: Level::Category,
        },
        explanation: "A JDex category sits in an area its number does not belong to.",
        fix: "Move it into the matching area folder, or use a flat JDex.",
    },
    Rule {
        id: RuleId::JdexDuplicateArea,
        check: Check::Duplicates {
            side: Side::Jdex,
            level: Level::Area,
        },
        explanation: "The same area number is used more than once in the JDex.",
        fix: "Give all but one of them a new area.",
    },
    Rule {
        id: RuleId::JdexDuplicateAreaHeader,
        check: Check::DuplicateHeaders,
        explanation: "The JDex has more than one header for the same area.",
        fix: "Delete the wrong header or correct its area number.",
    },
    Rule {
        id: RuleId::JdexDuplicateCategory,
        check: Check::Duplicates {
            side: Side::Jdex,
            level: Level::Category,
        },
        explanation: "The same category number is used more than once in the JDex.",
        fix: "Give all but one of them a new category.",
    },
    Rule {
        id: RuleId::JdexDuplicateId,
        check: Check::Duplicates {
            side: Side::Jdex,
            level: Level::Id,
        },
        explanation: "The same ID is used more than once in the JDex.",
        fix: "Give all but one of them a new ID.",
    },
    Rule {
        id: RuleId::JdexFileOutsideCategory,
        check: Check::StrayFiles { side: Side::Jdex },
        explanation: "A nested JDex has a file outside of any category.",
        fix: "Keep the JDex flat, or nest every note under its area and category.",
    },
    Rule {
        id: RuleId::JdexIdInWrongCategory,
        check: Check::Placement {
            side: Side::Jdex,
            level: Level::Id,
        },
        explanation: "A JDex ID sits in a category its number does not belong to.",
        fix: "Move it into the matching category folder, or use a flat JDex.",
    },
    Rule {
        id: RuleId::JdexInvalidAreaName,
        check: Check::InvalidName {
            side: Side::Jdex,
            level: Level::Area,
        },
        explanation: "A JDex area has an invalid name.",
        fix: AREA_FORMAT,
    },
    Rule {
        id: RuleId::JdexInvalidCategoryName,
        check: Check::InvalidName {
            side: Side::Jdex,
            level: Level::Category,
        },
        explanation: "A JDex category has an invalid name.",
        fix: CATEGORY_FORMAT,
    },
    Rule {
        id: RuleId::JdexInvalidIdName,
        check: Check::InvalidName {
            side: Side::Jdex,
            level: Level::Id,
        },
        explanation: "A JDex ID has an invalid name.",
        fix: ID_FORMAT,
    },
    Rule {
        id: RuleId::NonemptyInbox,
        check: Check::NonemptyInbox,
        explanation: "An inbox has items in it.",
        fix: "Sort them into the IDs where they belong.",
    },
];

impl Rule {
    /// Evaluate this rule. JDex checks yield nothing without a JDex graph.
    pub fn evaluate(&self, files: &EntityGraph, jdex: Option<&EntityGraph>) -> Vec<Diagnostic> {
        let id = self.id;
        let side_graph = |side: Side| match side {
            Side::Files => Some(files),
            Side::Jdex => jdex,
        };

        match self.check {
            Check::Duplicates { side, level } => side_graph(side)
                .map(|g| duplicates(id, g, level))
                .unwrap_or_default(),
            Check::Placement { side, level } => side_graph(side)
                .map(|g| placement(id, g, level))
                .unwrap_or_default(),
            Check::InvalidName { side, level } => side_graph(side)
                .map(|g| invalid_names(id, g, level))
                .unwrap_or_default(),
            Check::StrayFiles { side } => side_graph(side)
                .map(|g| stray_files(id, g))
                .unwrap_or_default(),
            Check::NamingSync { level } => jdex
                .map(|j| naming_sync(id, files, j, level))
                .unwrap_or_default(),
            Check::Presence { level } => jdex
                .map(|j| presence(id, files, j, level))
                .unwrap_or_default(),
            Check::NonemptyInbox => nonempty_inboxes(id, files),
            Check::DuplicateHeaders => jdex.map(|j| duplicate_headers(id, j)).unwrap_or_default(),
            Check::HeaderSync => jdex.map(|j| header_sync(id, j)).unwrap_or_default(),
            Check::HeaderWithoutArea => jdex
                .map(|j| headers_without_area(id, j))
                .unwrap_or_default(),
        }
    }
}

fn paths(nodes: &[&Node]) -> Vec<Utf8PathBuf> {
    nodes.iter().map(|n| n.source_path.clone()).collect()
}

fn keyed_at(graph: &EntityGraph, level: Level) -> impl Iterator<Item = (NumericKey, Vec<&Node>)> {
    graph.keyed().filter(move |(key, _)| key.level() == level)
}

fn duplicates(id: RuleId, graph: &EntityGraph, level: Level) -> Vec<Diagnostic> {
    keyed_at(graph, level)
        .filter(|(_, nodes)| nodes.len() > 1)
        .map(|(key, nodes)| {
            let message = format!("{level} {key} is used {} times", nodes.len());
            Diagnostic::new(id, Some(key), paths(&nodes), message)
        })
        .collect()
}

fn placement(id: RuleId, graph: &EntityGraph, level: Level) -> Vec<Diagnostic> {
    let mut out = Vec::new();

    for (key, nodes) in keyed_at(graph, level) {
        let Some(expected) = key.implied_parent() else {
            continue;
        };

        for node in nodes {
            let Some(actual) = node.actual_parent_key else {
                continue;
            };
            if actual != expected {
                let message = format!(
                    "{level} {key} is in {} {actual}, expected {} {expected}",
                    actual.level(),
                    expected.level(),
                );
                out.push(Diagnostic::new(id, Some(key), vec![node.source_path.clone()], message));
            }
        }
    }
    out
}

fn invalid_names(id: RuleId, graph: &EntityGraph, level: Level) -> Vec<Diagnostic> {
    let kind = NodeKind::from(level);

    graph
        .nodes()
        .filter(|(_, n)| n.key.is_none() && n.kind == kind)
        .map(|(_, n)| {
            let message = format!("'{}' is not a valid {level} name", n.label);
            Diagnostic::new(id, None, vec![n.source_path.clone()], message)
        })
        .collect()
}

/// Level a plain file sits at, or `None` when it is inside an Id.
fn stray_level(node: &Node) -> Option<Level> {
    match node.actual_parent_key {
        None => Some(Level::Area),
        Some(NumericKey::Area(_)) => Some(Level::Category),
        Some(NumericKey::Category(_)) => Some(Level::Id),
        Some(NumericKey::Id(_)) => None,
    }
}

fn stray_files(id: RuleId, graph: &EntityGraph) -> Vec<Diagnostic> {
    graph
        .nodes()
        .filter(|(_, n)| n.kind == NodeKind::PlainFile)
        .filter_map(|(_, n)| {
            let level = stray_level(n)?;
            let noun = if n.is_dir { "directory" } else { "file" };
            let message = format!("{noun} '{}' is at the {level} level", n.label);
            Some(Diagnostic::new(id, None, vec![n.source_path.clone()], message))
        })
        .collect()
}

fn naming_sync(id: RuleId, files: &EntityGraph, jdex: &EntityGraph, level: Level) -> Vec<Diagnostic> {
    let mut out = Vec::new();

    for (key, file_nodes) in keyed_at(files, level) {
        let jdex_nodes = jdex.lookup(key);
        let Some(first) = jdex_nodes.first() else {
            continue;
        };

        for node in file_nodes {
            let label = canonical_label(&node.label);
            if jdex_nodes.iter().any(|j| canonical_label(&j.label) == label) {
                continue;
            }

            let message = format!(
                "{level} {key} is named '{label}' but the JDex has '{}'",
                canonical_label(&first.label)
            );
            out.push(Diagnostic::new(
                id,
                Some(key),
                vec![node.source_path.clone(), first.source_path.clone()],
                message,
            ));
        }
    }
    out
}

fn presence(id: RuleId, files: &EntityGraph, jdex: &EntityGraph, level: Level) -> Vec<Diagnostic> {
    keyed_at(files, level)
        .filter(|(key, _)| !jdex.documents(*key))
        .flat_map(|(key, nodes)| {
            nodes.into_iter().map(move |n| {
                let message = format!("{level} {key} '{}' is not in the JDex", n.label);
                Diagnostic::new(id, Some(key), vec![n.source_path.clone()], message)
            })
        })
        .collect()
}

fn nonempty_inboxes(id: RuleId, files: &EntityGraph) -> Vec<Diagnostic> {
    graph_inboxes(files)
        .filter(|n| !n.children.is_empty())
        .map(|n| {
            let count = n.children.len();
            let items = if count == 1 { "item" } else { "items" };
            let message = format!("inbox '{}' holds {count} {items}", n.label);
            Diagnostic::new(id, n.key, vec![n.source_path.clone()], message)
        })
        .collect()
}

fn graph_inboxes(graph: &EntityGraph) -> impl Iterator<Item = &Node> {
    graph.nodes().map(|(_, n)| n).filter(|n| {
        n.kind == NodeKind::Id && matches!(n.key, Some(NumericKey::Id(id)) if id.is_inbox())
    })
}

fn duplicate_headers(id: RuleId, jdex: &EntityGraph) -> Vec<Diagnostic> {
    jdex.headers()
        .filter(|(_, headers)| headers.len() > 1)
        .map(|(area, headers)| {
            let message = format!("area {area} has {} headers", headers.len());
            Diagnostic::new(id, Some(NumericKey::Area(area)), paths(&headers), message)
        })
        .collect()
}

fn header_sync(id: RuleId, jdex: &EntityGraph) -> Vec<Diagnostic> {
    let mut out = Vec::new();

    for (area, headers) in jdex.headers() {
        let key = NumericKey::Area(area);
        let areas = jdex.lookup(key);
        let Some(first) = areas.first() else {
            continue;
        };

        for header in headers {
            let label = canonical_label(&header.label);
            if areas.iter().any(|a| canonical_label(&a.label) == label) {
                continue;
            }

            let message = format!(
                "header for area {area} is '{label}' but the area is named '{}'",
                canonical_label(&first.label)
            );
            out.push(Diagnostic::new(
                id,
                Some(key),
                vec![header.source_path.clone(), first.source_path.clone()],
                message,
            ));
        }
    }
    out
}

fn headers_without_area(id: RuleId, jdex: &EntityGraph) -> Vec<Diagnostic> {
    jdex.headers()
        .filter(|(area, _)| jdex.lookup(NumericKey::Area(*area)).is_empty())
        .flat_map(|(area, headers)| {
            headers.into_iter().map(move |h| {
                let message = format!("header '{}' names area {area}, which has no entry", h.label);
                Diagnostic::new(id, Some(NumericKey::Area(area)), vec![h.source_path.clone()], message)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::{BuildMode, BuildOptions, TreeBuilder};
    use crate::core::listing::MemoryTree;

    fn build(tree: &MemoryTree, mode: BuildMode) -> EntityGraph {
        TreeBuilder::new(tree, &BuildOptions::default())
            .build(tree.root(), mode)
            .unwrap()
    }

    fn fire(id: RuleId, files: &EntityGraph, jdex: Option<&EntityGraph>) -> Vec<Diagnostic> {
        id.rule().evaluate(files, jdex)
    }

    #[test]
    fn registry_covers_every_id_in_order() {
        let ids: Vec<RuleId> = RuleId::all().collect();
        assert_eq!(ids.len(), 28);

        for (index, rule) in RULES.iter().enumerate() {
            assert_eq!(rule.id as usize, index, "{}", rule.id);
        }

        let mut by_name = ids.clone();
        by_name.sort_by_key(|id| id.as_str());
        assert_eq!(by_name, ids);
    }

    #[test]
    fn ids_parse_and_serialize() {
        assert_eq!("DUPLICATE_ID".parse::<RuleId>().unwrap(), RuleId::DuplicateId);
        assert_eq!("nonempty_inbox".parse::<RuleId>().unwrap(), RuleId::NonemptyInbox);
        assert!("NOT_A_RULE".parse::<RuleId>().is_err());

        for id in RuleId::all() {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.as_str()));
        }
    }

    #[test]
    fn jdex_rules_are_silent_without_jdex() {
        let tree = MemoryTree::new("files").dir("00-09 System/01 Stuff/01.02 Thing");
        let files = build(&tree, BuildMode::FilesRoot);

        for id in RuleId::all().filter(|id| id.needs_jdex()) {
            assert!(fire(id, &files, None).is_empty(), "{id}");
        }
        assert!(!RuleId::NonemptyInbox.needs_jdex());
    }

    #[test]
    fn duplicate_lists_every_path() {
        let tree = MemoryTree::new("files")
            .dir("00-09 System/01 Stuff/01.11 An ID")
            .dir("00-09 System/01 Stuff/01.11 A Reuse")
            .dir("00-09 System/01 Stuff/01.11 A Third");
        let files = build(&tree, BuildMode::FilesRoot);

        let found = fire(RuleId::DuplicateId, &files, None);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].paths.len(), 3);
        assert_eq!(found[0].message, "ID 01.11 is used 3 times");
    }

    #[test]
    fn placement_compares_against_the_number() {
        let tree = MemoryTree::new("files")
            .dir("10-19 Life/21 Work Stuff")
            .dir("10-19 Life/11 Me/12.01 Misplaced");
        let files = build(&tree, BuildMode::FilesRoot);

        let cats = fire(RuleId::CategoryInWrongArea, &files, None);
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].message, "category 21 is in area 10-19, expected area 20-29");

        let ids = fire(RuleId::IdInWrongCategory, &files, None);
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].paths, vec![Utf8PathBuf::from("files/10-19 Life/11 Me/12.01 Misplaced")]);
    }

    #[test]
    fn stray_files_report_their_level() {
        let tree = MemoryTree::new("files")
            .file("top.txt", "")
            .file("10-19 Life/mid.txt", "")
            .file("10-19 Life/11 Me/low.txt", "")
            .file("10-19 Life/11 Me/11.02 Fine/ok.txt", "");
        let files = build(&tree, BuildMode::FilesRoot);

        let messages: Vec<String> = fire(RuleId::FileOutsideId, &files, None)
            .into_iter()
            .map(|d| d.message)
            .collect();
        // Walk order: deepest entries of `10-19 Life` come before `top.txt`
        assert_eq!(
            messages,
            vec![
                "file 'low.txt' is at the ID level",
                "file 'mid.txt' is at the category level",
                "file 'top.txt' is at the area level",
            ]
        );
    }

    #[test]
    fn naming_and_presence_against_jdex() {
        let files_tree = MemoryTree::new("files")
            .dir("00-09 System/01 Stuff/01.02 A Name")
            .dir("00-09 System/01 Stuff/01.03 Unlisted");
        let jdex_tree = MemoryTree::new("jdex")
            .file("00-09 Systme/01 Stuff/01.02 A Name.md", "");
        let files = build(&files_tree, BuildMode::FilesRoot);
        let jdex = build(&jdex_tree, BuildMode::JdexNested);

        let renamed = fire(RuleId::AreaDifferentFromJdex, &files, Some(&jdex));
        assert_eq!(renamed.len(), 1);
        assert_eq!(
            renamed[0].paths,
            vec![Utf8PathBuf::from("files/00-09 System"), Utf8PathBuf::from("jdex/00-09 Systme")]
        );

        let missing = fire(RuleId::IdNotInJdex, &files, Some(&jdex));
        assert_eq!(missing.len(), 1);
        assert!(missing[0].message.contains("01.03"));

        assert!(fire(RuleId::CategoryDifferentFromJdex, &files, Some(&jdex)).is_empty());
        assert!(fire(RuleId::IdDifferentFromJdex, &files, Some(&jdex)).is_empty());
    }

    #[test]
    fn implied_keys_count_as_documented() {
        let files_tree = MemoryTree::new("files").dir("10-19 Life Admin/10 Life Admin/10.00 Life Admin");
        let jdex_tree = MemoryTree::new("jdex").file("10.00 Life Admin Area Management.md", "");
        let files = build(&files_tree, BuildMode::FilesRoot);
        let jdex = build(&jdex_tree, BuildMode::JdexFlat);

        for id in [RuleId::AreaNotInJdex, RuleId::CategoryNotInJdex, RuleId::IdNotInJdex] {
            assert!(fire(id, &files, Some(&jdex)).is_empty(), "{id}");
        }
        assert!(fire(RuleId::AreaDifferentFromJdex, &files, Some(&jdex)).is_empty());
    }

    #[test]
    fn inbox_counts_items() {
        let tree = MemoryTree::new("files")
            .file("00-09 System/01 Stuff/01.01 Inbox/a.pdf", "")
            .dir("00-09 System/01 Stuff/01.01 Inbox/folder")
            .dir("00-09 System/01 Stuff/02.01 Empty Inbox");
        let files = build(&tree, BuildMode::FilesRoot);

        let found = fire(RuleId::NonemptyInbox, &files, None);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "inbox 'Inbox' holds 2 items");
    }

    #[test]
    fn area_headers() {
        let tree = MemoryTree::new("jdex")
            .file("1. Life Admin.md", "")
            .file("10. Life Admin.md", "")
            .file("2. Work.md", "")
            .file("3. Hobbies.md", "")
            .file("01.00 Life Admin Area Management.md", "")
            .file("02.00 Job Area Management.md", "");
        let options = BuildOptions {
            altzeros: true,
            ..BuildOptions::default()
        };
        let jdex = TreeBuilder::new(&tree, &options)
            .build(tree.root(), BuildMode::JdexFlat)
            .unwrap();
        let files = EntityGraph::new(crate::core::graph::GraphSource::Files, "files");

        let dupes = fire(RuleId::JdexDuplicateAreaHeader, &files, Some(&jdex));
        assert_eq!(dupes.len(), 1);
        assert_eq!(dupes[0].paths.len(), 2);

        let renamed = fire(RuleId::JdexAreaHeaderDifferentFromArea, &files, Some(&jdex));
        assert_eq!(renamed.len(), 1);
        assert!(renamed[0].message.contains("'Work'"));

        let orphans = fire(RuleId::JdexAreaHeaderWithoutArea, &files, Some(&jdex));
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].key.map(|k| k.to_string()).as_deref(), Some("30-39"));
    }
}
