//! Reconciliation engine: runs the registry over one or two graphs.

use std::collections::BTreeSet;

use tracing::{debug, instrument, trace};

use super::graph::EntityGraph;
use super::rules::{Diagnostic, RuleId, RULES};

/// Run every registered rule, drop disabled rule ids, and order the result.
///
/// Diagnostics are sorted by numeric key (unnumbered findings first), then
/// rule id, then paths. The order never depends on traversal order, so the
/// same input always produces the same output.
#[instrument(skip_all, fields(jdex = jdex.is_some(), disabled = disabled.len()))]
pub fn run(files: &EntityGraph, jdex: Option<&EntityGraph>, disabled: &BTreeSet<RuleId>) -> Vec<Diagnostic> {
    let mut out: Vec<Diagnostic> = RULES
        .iter()
        .flat_map(|rule| {
            let found = rule.evaluate(files, jdex);
            trace!(rule = %rule.id, count = found.len(), "evaluated rule");
            found
        })
        .collect();

    let total = out.len();
    out.retain(|d| !disabled.contains(&d.rule));
    out.sort_by(|a, b| {
        a.key
            .cmp(&b.key)
            .then_with(|| a.rule.cmp(&b.rule))
            .then_with(|| a.paths.cmp(&b.paths))
            .then_with(|| a.message.cmp(&b.message))
    });

    debug!(total, reported = out.len(), "reconciliation finished");
    out
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::core::builder::{BuildMode, BuildOptions, IgnoreMatcher, TreeBuilder};
    use crate::core::listing::MemoryTree;

    fn graph(tree: &MemoryTree, mode: BuildMode) -> EntityGraph {
        let options = BuildOptions {
            ignore: IgnoreMatcher::new(&[".DS_Store".to_string()]).unwrap(),
            altzeros: false,
        };
        TreeBuilder::new(tree, &options)
            .build(tree.root(), mode)
            .unwrap()
    }

    fn system_files() -> MemoryTree {
        MemoryTree::new("files")
            .dir("00-09 System/01 System Stuff/01.00 An ID")
            .dir("00-09 System/01 System Stuff/01.02 A Name")
            .dir("00-09 System/01 System Stuff/01.03 Another ID")
    }

    fn system_jdex(area: &str) -> MemoryTree {
        let cat = format!("{area}/01 System Stuff");
        MemoryTree::new("jdex")
            .file(&format!("{cat}/01.00 An ID.md"), "")
            .file(&format!("{cat}/01.02 A Name.md"), "")
            .file(&format!("{cat}/01.03 Another ID.md"), "")
    }

    fn rules_of(found: &[Diagnostic]) -> Vec<&'static str> {
        found.iter().map(|d| d.rule.as_str()).collect()
    }

    #[test]
    fn matching_trees_are_clean() {
        let files = graph(&system_files(), BuildMode::FilesRoot);
        let jdex = graph(&system_jdex("00-09 System"), BuildMode::JdexNested);

        assert!(run(&files, Some(&jdex), &BTreeSet::new()).is_empty());
    }

    #[test]
    fn misspelled_jdex_area() {
        let files = graph(&system_files(), BuildMode::FilesRoot);
        let jdex = graph(&system_jdex("00-09 Systme"), BuildMode::JdexNested);

        let found = run(&files, Some(&jdex), &BTreeSet::new());
        assert_eq!(rules_of(&found), vec!["AREA_DIFFERENT_FROM_JDEX"]);
        assert_eq!(found[0].paths[0], "files/00-09 System");
        assert_eq!(found[0].paths[1], "jdex/00-09 Systme");
    }

    #[test]
    fn reused_id() {
        let tree = MemoryTree::new("files")
            .dir("00-09 System/01 System Stuff/01.11 An ID")
            .dir("00-09 System/01 System Stuff/01.11 A Reuse");
        let files = graph(&tree, BuildMode::FilesRoot);

        let found = run(&files, None, &BTreeSet::new());
        assert_eq!(rules_of(&found), vec!["DUPLICATE_ID"]);
        assert_eq!(found[0].paths.len(), 2);
    }

    #[test]
    fn inbox_with_only_ignored_files_is_clean() {
        let busy = MemoryTree::new("files").file("00-09 System/01 System Stuff/01.01 Inbox/todo.txt", "");
        let idle = MemoryTree::new("files").file("00-09 System/01 System Stuff/01.01 Inbox/.DS_Store", "");

        let found = run(&graph(&busy, BuildMode::FilesRoot), None, &BTreeSet::new());
        assert_eq!(rules_of(&found), vec!["NONEMPTY_INBOX"]);

        assert!(run(&graph(&idle, BuildMode::FilesRoot), None, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn malformed_category_gets_no_placement_check() {
        let tree = MemoryTree::new("files").dir("00-09 System/2 Malformed/01.01 Inbox");
        let files = graph(&tree, BuildMode::FilesRoot);

        let found = run(&files, None, &BTreeSet::new());
        assert_eq!(rules_of(&found), vec!["INVALID_CATEGORY_NAME"]);
    }

    #[test]
    fn differently_written_sub_numbers_are_distinct_ids() {
        let tree = MemoryTree::new("files")
            .dir("10-19 Life/11 Me/11.1 Short")
            .file("10-19 Life/11 Me/11.1 Short/receipt.pdf", "")
            .dir("10-19 Life/11 Me/11.01 Long");
        let files = graph(&tree, BuildMode::FilesRoot);

        // 11.1 is neither a duplicate of 11.01 nor an inbox
        assert!(run(&files, None, &BTreeSet::new()).is_empty());
    }

    /// A files tree plus an optional JDex that trips exactly one rule.
    struct Fixture {
        files: MemoryTree,
        jdex: Option<(MemoryTree, BuildMode)>,
        altzeros: bool,
    }

    impl Fixture {
        fn files(files: MemoryTree) -> Self {
            Self {
                files,
                jdex: None,
                altzeros: false,
            }
        }

        fn nested(files: MemoryTree, jdex: MemoryTree) -> Self {
            Self {
                files,
                jdex: Some((jdex, BuildMode::JdexNested)),
                altzeros: false,
            }
        }

        fn altzeros_flat(jdex: MemoryTree) -> Self {
            Self {
                files: MemoryTree::new("files"),
                jdex: Some((jdex, BuildMode::JdexFlat)),
                altzeros: true,
            }
        }

        fn run(&self) -> Vec<Diagnostic> {
            let options = BuildOptions {
                ignore: IgnoreMatcher::default(),
                altzeros: self.altzeros,
            };
            let builder = |tree: &MemoryTree, mode| {
                TreeBuilder::new(tree, &options)
                    .build(tree.root(), mode)
                    .unwrap()
            };

            let files = builder(&self.files, BuildMode::FilesRoot);
            let jdex = self.jdex.as_ref().map(|(tree, mode)| builder(tree, *mode));
            run(&files, jdex.as_ref(), &BTreeSet::new())
        }
    }

    fn passport_files() -> MemoryTree {
        MemoryTree::new("files").dir("10-19 Life/11 Me/11.02 Passport")
    }

    fn passport_jdex() -> MemoryTree {
        MemoryTree::new("jdex").file("10-19 Life/11 Me/11.02 Passport.md", "")
    }

    fn jdex(paths: &[&str]) -> MemoryTree {
        paths.iter().fold(MemoryTree::new("jdex"), |tree, path| {
            if path.ends_with(".md") {
                tree.file(path, "")
            } else {
                tree.dir(path)
            }
        })
    }

    fn fixture(id: RuleId) -> Fixture {
        let empty = || MemoryTree::new("files");

        match id {
            RuleId::AreaDifferentFromJdex => {
                Fixture::nested(passport_files(), jdex(&["10-19 Lief/11 Me/11.02 Passport.md"]))
            }
            RuleId::AreaNotInJdex => Fixture::nested(passport_files().dir("20-29 Work"), passport_jdex()),
            RuleId::CategoryDifferentFromJdex => {
                Fixture::nested(passport_files(), jdex(&["10-19 Life/11 Myself/11.02 Passport.md"]))
            }
            RuleId::CategoryInWrongArea => Fixture::files(empty().dir("10-19 Life/21 Job")),
            RuleId::CategoryNotInJdex => {
                Fixture::nested(passport_files().dir("10-19 Life/12 Other"), passport_jdex())
            }
            RuleId::DuplicateArea => Fixture::files(empty().dir("10-19 Life").dir("10-19 Living")),
            RuleId::DuplicateCategory => {
                Fixture::files(empty().dir("10-19 Life/11 Me").dir("10-19 Life/11 Myself"))
            }
            RuleId::DuplicateId => {
                Fixture::files(passport_files().dir("10-19 Life/11 Me/11.02 Passport Copy"))
            }
            RuleId::FileOutsideId => Fixture::files(empty().file("10-19 Life/notes.txt", "")),
            RuleId::IdDifferentFromJdex => {
                Fixture::nested(passport_files(), jdex(&["10-19 Life/11 Me/11.02 Passports.md"]))
            }
            RuleId::IdInWrongCategory => Fixture::files(empty().dir("10-19 Life/11 Me/12.02 Misplaced")),
            RuleId::IdNotInJdex => {
                Fixture::nested(passport_files().dir("10-19 Life/11 Me/11.03 Taxes"), passport_jdex())
            }
            RuleId::InvalidAreaName => Fixture::files(empty().dir("Life")),
            RuleId::InvalidCategoryName => Fixture::files(empty().dir("10-19 Life/Me")),
            RuleId::InvalidIdName => Fixture::files(empty().dir("10-19 Life/11 Me/Passport")),
            RuleId::JdexAreaHeaderDifferentFromArea => {
                Fixture::altzeros_flat(jdex(&["01.00 Life Area Management.md", "1. Living.md"]))
            }
            RuleId::JdexAreaHeaderWithoutArea => Fixture::altzeros_flat(jdex(&["2. Work.md"])),
            RuleId::JdexCategoryInWrongArea => {
                Fixture::nested(empty(), jdex(&["10-19 Life/21 Job/21.02 Thing.md"]))
            }
            RuleId::JdexDuplicateArea => Fixture::nested(empty(), jdex(&["10-19 Life", "10-19 Living"])),
            RuleId::JdexDuplicateAreaHeader => Fixture::altzeros_flat(jdex(&[
                "01.00 Life Area Management.md",
                "1. Life.md",
                "10. Life.md",
            ])),
            RuleId::JdexDuplicateCategory => {
                Fixture::nested(empty(), jdex(&["10-19 Life/11 Me", "10-19 Life/11 Myself"]))
            }
            RuleId::JdexDuplicateId => Fixture::nested(
                empty(),
                jdex(&["10-19 Life/11 Me/11.02 One.md", "10-19 Life/11 Me/11.02 Two.md"]),
            ),
            RuleId::JdexFileOutsideCategory => Fixture::nested(empty(), jdex(&["10-19 Life/overview.md"])),
            RuleId::JdexIdInWrongCategory => {
                Fixture::nested(empty(), jdex(&["10-19 Life/11 Me/12.02 Thing.md"]))
            }
            RuleId::JdexInvalidAreaName => Fixture::nested(empty(), jdex(&["Life"])),
            RuleId::JdexInvalidCategoryName => Fixture::nested(empty(), jdex(&["10-19 Life/Me"])),
            RuleId::JdexInvalidIdName => Fixture::nested(empty(), jdex(&["10-19 Life/11 Me/Passport.md"])),
            RuleId::NonemptyInbox => {
                Fixture::files(empty().file("10-19 Life/11 Me/11.01 Inbox/scan.pdf", ""))
            }
        }
    }

    #[test]
    fn every_rule_fires_alone_on_its_fixture() {
        for id in RuleId::all() {
            let found = fixture(id).run();
            assert_eq!(rules_of(&found), vec![id.as_str()], "{id}: {found:#?}");
        }
    }

    #[test]
    fn disable_removes_exactly_that_rule() {
        let tree = MemoryTree::new("files")
            .dir("10-19 Life/21 Elsewhere")
            .dir("10-19 Life/11 Me/11.05 Dup")
            .dir("10-19 Life/11 Me/11.05 Dup Again")
            .file("stray.txt", "");
        let files = graph(&tree, BuildMode::FilesRoot);

        let all = run(&files, None, &BTreeSet::new());
        let disabled: BTreeSet<RuleId> = [RuleId::DuplicateId].into();
        let filtered = run(&files, None, &disabled);

        let expected: Vec<Diagnostic> = all
            .iter()
            .filter(|d| d.rule != RuleId::DuplicateId)
            .cloned()
            .collect();
        assert_eq!(filtered, expected);
        assert_eq!(all.len(), filtered.len() + 1);
    }

    #[test]
    fn ordering_is_by_key_then_rule() {
        let tree = MemoryTree::new("files")
            .file("stray.txt", "")
            .dir("Not An Area")
            .dir("10-19 Life/21 Elsewhere")
            .dir("10-19 Life/11 Me/11.05 Dup")
            .dir("10-19 Life/11 Me/11.05 Dup Again")
            .file("10-19 Life/11 Me/11.01 Inbox/scan.pdf", "")
            .dir("00-09 System")
            .dir("00-09 Also System");
        let files = graph(&tree, BuildMode::FilesRoot);

        let ids: Vec<String> = run(&files, None, &BTreeSet::new())
            .iter()
            .map(|d| match d.key {
                Some(key) => format!("{key} {}", d.rule),
                None => format!("unnumbered {}", d.rule),
            })
            .collect();

        insta::assert_yaml_snapshot!(ids, @r#"
        - unnumbered FILE_OUTSIDE_ID
        - unnumbered INVALID_AREA_NAME
        - 00-09 DUPLICATE_AREA
        - 11.01 NONEMPTY_INBOX
        - 11.05 DUPLICATE_ID
        - 21 CATEGORY_IN_WRONG_AREA
        "#);
    }

    fn arbitrary_tree() -> impl Strategy<Value = MemoryTree> {
        let segment = prop_oneof![
            Just("10-19 Life".to_string()),
            Just("20-29 Work".to_string()),
            Just("11 Me".to_string()),
            Just("21 Job".to_string()),
            Just("11.01 Inbox".to_string()),
            Just("11.02 Passport".to_string()),
            Just("21.02 Passport".to_string()),
            Just("junk".to_string()),
        ];
        prop::collection::vec(prop::collection::vec(segment, 1..4), 0..12).prop_map(|paths| {
            paths
                .into_iter()
                .fold(MemoryTree::new("files"), |tree, parts| tree.dir(&parts.join("/")))
        })
    }

    proptest! {
        #[test]
        fn runs_are_idempotent(tree in arbitrary_tree()) {
            let files = graph(&tree, BuildMode::FilesRoot);
            let first = run(&files, None, &BTreeSet::new());
            let second = run(&files, None, &BTreeSet::new());
            prop_assert_eq!(&first, &second);

            let mut resorted = first.clone();
            resorted.reverse();
            resorted.sort_by(|a, b| {
                (a.key, a.rule, &a.paths, &a.message).cmp(&(b.key, b.rule, &b.paths, &b.message))
            });
            prop_assert_eq!(resorted, first);
        }
    }
}
