//! **jdlint** - Linter for Johnny Decimal file trees and their JDex
//!
//! Parses the organized file tree and, optionally, a JDex (nested, flat or
//! single-file) into one entity graph shape, then runs a fixed registry of
//! rules over both and reports every deviation in a deterministic order.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// One lint invocation end to end, plus exit-code mapping
pub mod lint;

/// Core model and checks - no direct filesystem access
pub mod core {
    /// Area / category / ID name parsing and label canonicalization
    pub mod name;

    /// Numeric keys, nodes and the per-tree entity graph
    pub mod graph;
    pub use graph::{EntityGraph, NumericKey};

    /// Directory enumeration capability and an in-memory implementation
    pub mod listing;
    pub use listing::{DirectoryListing, MemoryTree};

    /// Tree builder for the files tree and every JDex layout
    pub mod builder;
    pub use builder::{BuildMode, BuildOptions, TreeBuilder, detect_jdex_mode};

    /// Rule ids, diagnostics and the static rule registry
    pub mod rules;
    pub use rules::{Diagnostic, RuleId};

    /// Runs the registry, filters disabled rules, orders the output
    pub mod engine;

    /// Text, JSON and explanation-table rendering
    pub mod report;
}

/// Infrastructure - Configuration, logging and the filesystem adapter
pub mod infra {
    /// Layered configuration (file, environment, command line)
    pub mod config;
    pub use config::{Config, load_config};

    /// Tracing subscriber setup
    pub mod logging;

    /// Filesystem-backed directory listing
    pub mod walk;
    pub use walk::FsListing;
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli};
pub use core::{Diagnostic, EntityGraph, RuleId};
pub use infra::{Config, FsListing, load_config};
pub use lint::{LintError, Outcome, exit_code_for};
