//! Reporter: human text, JSON, and the rule explanation table.
//!
//! Everything renders into an [`io::Write`] so the binary can target stdout
//! and tests can target a buffer.

use std::io::{self, Write};

use itertools::Itertools;
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled};

use super::rules::{Diagnostic, RuleId};

/// Presentation switches for the text report.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextOptions {
    pub color: bool,
    /// Omit the trailing summary line.
    pub quiet: bool,
}

/// Diagnostics grouped by rule, in rule-id order.
///
/// Each group opens with `RULE_ID: explanation`, lists its diagnostics
/// (severity, message, paths), and closes with the suggested fix.
pub fn write_text<W: Write>(out: &mut W, diagnostics: &[Diagnostic], opts: TextOptions) -> io::Result<()> {
    let groups = diagnostics
        .iter()
        .sorted_by_key(|d| d.rule)
        .chunk_by(|d| d.rule);

    for (rule, group) in &groups {
        let header = if opts.color {
            rule.as_str().red().bold().to_string()
        } else {
            rule.to_string()
        };
        writeln!(out, "{header}: {}", rule.explanation())?;

        for diagnostic in group {
            let severity = if opts.color {
                diagnostic.severity.to_string().red().to_string()
            } else {
                diagnostic.severity.to_string()
            };
            writeln!(out, "  {severity}: {}", diagnostic.message)?;
            for path in &diagnostic.paths {
                let path = if opts.color {
                    path.as_str().cyan().to_string()
                } else {
                    path.to_string()
                };
                writeln!(out, "    {path}")?;
            }
        }

        let fix = if opts.color {
            "fix:".green().to_string()
        } else {
            "fix:".to_string()
        };
        writeln!(out, "  {fix} {}", rule.fix())?;
        writeln!(out)?;
    }

    if !opts.quiet {
        writeln!(out, "{}", summary(diagnostics, opts.color))?;
    }
    Ok(())
}

fn summary(diagnostics: &[Diagnostic], color: bool) -> String {
    if diagnostics.is_empty() {
        let line = "No problems found.";
        return if color {
            line.green().to_string()
        } else {
            line.to_string()
        };
    }

    let rules = diagnostics.iter().map(|d| d.rule).unique().count();
    let line = format!(
        "Found {} {} across {} {}.",
        diagnostics.len(),
        plural(diagnostics.len(), "problem", "problems"),
        rules,
        plural(rules, "rule", "rules"),
    );
    if color {
        line.yellow().bold().to_string()
    } else {
        line
    }
}

fn plural(n: usize, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 { one } else { many }
}

/// Pretty-printed JSON array of `{rule, paths, message}` objects.
pub fn write_json<W: Write>(out: &mut W, diagnostics: &[Diagnostic]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, diagnostics)?;
    writeln!(out)
}

#[derive(Tabled, Serialize)]
struct RuleRow {
    #[tabled(rename = "Rule")]
    rule: &'static str,
    #[tabled(rename = "Needs JDex")]
    #[serde(rename = "needs_jdex")]
    jdex: &'static str,
    #[tabled(rename = "Explanation")]
    explanation: &'static str,
    #[tabled(rename = "Fix")]
    fix: &'static str,
}

fn rule_rows() -> Vec<RuleRow> {
    RuleId::all()
        .map(|id| RuleRow {
            rule: id.as_str(),
            jdex: if id.needs_jdex() { "yes" } else { "no" },
            explanation: id.explanation(),
            fix: id.fix(),
        })
        .collect()
}

/// Every rule with its explanation and fix, as a table.
pub fn write_explain_table<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", Table::new(rule_rows()))
}

/// Every rule with its explanation and fix, as JSON.
pub fn write_explain_json<W: Write>(out: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, &rule_rows())?;
    writeln!(out)
}
