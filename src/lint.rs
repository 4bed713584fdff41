//! One invocation, start to finish: configuration, both builds, the engine,
//! and the report. `main` only maps the outcome to an exit code.

use std::collections::BTreeSet;
use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

use crate::cli::{AppContext, Cli};
use crate::completion;
use crate::core::builder::{self, BuildError, BuildMode, BuildOptions, IgnoreMatcher, TreeBuilder};
use crate::core::engine;
use crate::core::graph::EntityGraph;
use crate::core::listing::{DirectoryListing, ListingError, PathKind};
use crate::core::report::{self, TextOptions};
use crate::core::rules::{Diagnostic, RuleId};
use crate::infra::config::{self, Config};
use crate::infra::walk::FsListing;

/// How a completed run went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to report (or an informational flag such as `--explain`).
    Clean,
    /// At least one diagnostic survived the disable filter.
    Findings,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Clean => 0,
            Outcome::Findings => 1,
        }
    }
}

/// Run-level failures, each mapped to an exit code by [`exit_code_for`].
#[derive(Debug, thiserror::Error)]
pub enum LintError {
    /// Bad flags, bad config, bad paths: nothing was traversed.
    #[error("{0:#}")]
    Config(anyhow::Error),

    /// A directory or file could not be read during traversal.
    #[error(transparent)]
    Filesystem(#[from] ListingError),

    #[error("cannot write output: {0}")]
    Output(#[from] io::Error),
}

impl From<BuildError> for LintError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::Listing(e) => LintError::Filesystem(e),
            other => LintError::Config(other.into()),
        }
    }
}

/// Centralized exit code mapping
pub fn exit_code_for(e: &LintError) -> i32 {
    match e {
        LintError::Config(_) => 2,
        LintError::Filesystem(_) => 3,
        LintError::Output(_) => 3,
    }
}

/// Execute the command line against the real filesystem, writing to `out`.
pub fn run<W: Write>(cli: &Cli, ctx: &AppContext, out: &mut W) -> Result<Outcome, LintError> {
    run_with(&FsListing::new(), cli, ctx, out)
}

/// Same as [`run`] over any listing.
///
/// `out` is flushed before returning, so a report that cannot be delivered
/// is an [`LintError::Output`] rather than a silent truncation.
pub fn run_with<L, W>(listing: &L, cli: &Cli, ctx: &AppContext, out: &mut W) -> Result<Outcome, LintError>
where
    L: DirectoryListing + ?Sized,
    W: Write,
{
    let outcome = dispatch(listing, cli, ctx, out)?;
    out.flush()?;
    Ok(outcome)
}

fn dispatch<L, W>(listing: &L, cli: &Cli, ctx: &AppContext, out: &mut W) -> Result<Outcome, LintError>
where
    L: DirectoryListing + ?Sized,
    W: Write,
{
    if let Some(shell) = cli.completions {
        completion::write(shell, out);
        return Ok(Outcome::Clean);
    }

    if cli.explain {
        if cli.json {
            report::write_explain_json(out)?;
        } else {
            report::write_explain_table(out)?;
        }
        return Ok(Outcome::Clean);
    }

    let settings = config::load_config(cli.config.as_deref().map(Utf8Path::as_std_path))
        .map_err(LintError::Config)?
        .apply_cli(cli);

    if cli.show_config {
        let toml = settings.to_toml().map_err(LintError::Config)?;
        write!(out, "{toml}")?;
        return Ok(Outcome::Clean);
    }

    let diagnostics = lint(listing, cli, &settings)?;

    if cli.json {
        report::write_json(out, &diagnostics)?;
    } else {
        let color = !ctx.no_color && std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        report::write_text(
            out,
            &diagnostics,
            TextOptions {
                color,
                quiet: ctx.quiet,
            },
        )?;
    }

    Ok(if diagnostics.is_empty() {
        Outcome::Clean
    } else {
        Outcome::Findings
    })
}

fn lint<L: DirectoryListing + ?Sized>(
    listing: &L,
    cli: &Cli,
    settings: &Config,
) -> Result<Vec<Diagnostic>, LintError> {
    let root = match &cli.root {
        Some(root) => expand(root)?,
        None => return Err(LintError::Config(anyhow!("a ROOT directory is required"))),
    };
    match listing.kind(&root) {
        PathKind::Directory => {}
        PathKind::Missing => return Err(LintError::Config(anyhow!("root {root} does not exist"))),
        PathKind::File | PathKind::Other => {
            return Err(LintError::Config(anyhow!("root {root} is not a directory")));
        }
    }

    let options = BuildOptions {
        ignore: IgnoreMatcher::new(&settings.ignore_patterns)?,
        altzeros: settings.altzeros,
    };
    let builder = TreeBuilder::new(listing, &options);

    // Resolve the JDex before traversal so a bad path fails fast
    let jdex_plan = match &settings.jdex {
        Some(path) => {
            let path = expand(path)?;
            let mode = builder::detect_jdex_mode(listing, &path, &options.ignore)?;
            Some((path, mode))
        }
        None => None,
    };

    let files = builder.build(&root, BuildMode::FilesRoot)?;
    let jdex: Option<EntityGraph> = match jdex_plan {
        Some((path, mode)) => {
            let graph = builder.build(&path, mode)?;
            debug!(root = %graph.root(), source = ?graph.source(), nodes = graph.len(), "built JDex graph");
            Some(graph)
        }
        None => None,
    };

    let disabled: BTreeSet<RuleId> = settings.disable.iter().copied().collect();
    let diagnostics = engine::run(&files, jdex.as_ref(), &disabled);

    info!(
        root = %files.root(),
        files = files.len(),
        jdex = jdex.as_ref().map_or(0, EntityGraph::len),
        diagnostics = diagnostics.len(),
        "lint finished"
    );
    Ok(diagnostics)
}

/// Expand `~` and `$VAR` in a user-supplied path.
fn expand(path: &Utf8Path) -> Result<Utf8PathBuf, LintError> {
    let expanded = shellexpand::full(path.as_str())
        .map_err(|e| LintError::Config(anyhow!("cannot expand {path}: {e}")))?;
    debug!(%path, expanded = %expanded, "expanded path");
    Ok(Utf8PathBuf::from(expanded.into_owned()))
}
