use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::core::rules::RuleId;

/// Config file names searched in the working directory, first match wins.
pub const CONFIG_FILES: [&str; 4] = ["jdlint.toml", "jdlint.yaml", "jdlint.json", ".jdlint.toml"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// File-name globs skipped at every level of both trees
    pub ignore_patterns: Vec<String>,

    /// Rule ids removed from the report
    pub disable: Vec<RuleId>,

    /// Alternative zeros numbering for flat JDex directories
    pub altzeros: bool,

    /// Default JDex location when `--jdex` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jdex: Option<Utf8PathBuf>,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                "desktop.ini".to_string(),
            ],
            disable: Vec::new(),
            altzeros: false,
            jdex: None,
        }
    }
}

impl Config
{
    /// Fold command-line flags over the loaded configuration.
    ///
    /// Lists are extended, scalars are overridden when the flag is given.
    pub fn apply_cli(
        mut self,
        cli: &Cli,
    ) -> Self
    {
        for pattern in &cli.ignore
        {
            if !self
                .ignore_patterns
                .contains(pattern)
            {
                self.ignore_patterns
                    .push(pattern.clone());
            }
        }

        for id in &cli.disable
        {
            if !self
                .disable
                .contains(id)
            {
                self.disable
                    .push(*id);
            }
        }

        self.altzeros |= cli.altzeros;

        if let Some(jdex) = &cli.jdex
        {
            self.jdex = Some(jdex.clone());
        }
        self
    }

    /// Effective configuration as TOML, for `--show-config`.
    pub fn to_toml(&self) -> Result<String>
    {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Load configuration from `explicit`, or from the first config file found
/// in the working directory, then overlay `JDLINT_*` environment variables.
pub fn load_config(explicit: Option<&Path>) -> Result<Config>
{
    load_config_in(Path::new("."), explicit)
}

/// Like [`load_config`], searching `dir` instead of the working directory.
pub fn load_config_in(
    dir: &Path,
    explicit: Option<&Path>,
) -> Result<Config>
{
    let mut builder = config::Config::builder();

    match explicit
    {
        Some(path) =>
        {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        None =>
        {
            if let Some(path) = find_config_file(dir)
            {
                tracing::debug!(path = %path.display(), "using config file");
                builder = builder.add_source(config::File::from(path));
            }
        }
    }

    // JDLINT_ALTZEROS=true, JDLINT_DISABLE=NONEMPTY_INBOX,DUPLICATE_ID, ...
    builder = builder.add_source(
        config::Environment::with_prefix("JDLINT")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("ignore_patterns")
            .with_list_parse_key("disable"),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

fn find_config_file(dir: &Path) -> Option<PathBuf>
{
    CONFIG_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}
