//! Name parser for single path segments.
//!
//! Classifies a segment as an area (`10-19 Life Admin`), category
//! (`11 Me`), ID (`11.01 Inbox`) or flat-JDex area header (`1. Life Admin`)
//! and splits it into a [`NumericKey`] and a display label. Malformed names
//! are reported as [`Unparseable`]; parsing never panics.

use std::sync::LazyLock;

use regex::Regex;

use super::graph::{AreaKey, CategoryKey, IdKey, Level, NumericKey};

static AREA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9])0-([0-9])9\s+(\S.*)$").expect("area regex"));
static CATEGORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2})\s+(\S.*)$").expect("category regex"));
static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2})\.([0-9]+)\s+(\S.*)$").expect("id regex"));
static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9])0?\.\s+(\S.*)$").expect("header regex"));

/// Trailing phrases dropped from JDex note names, matched case-insensitively.
const MANAGEMENT_SUFFIXES: [&str; 3] = ["area management", "category management", "index"];

/// Note extensions treated as part of the file format, not the name.
const NOTE_EXTENSIONS: [&str; 2] = [".md", ".markdown"];

/// A segment split into its key and label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName
{
    pub key: NumericKey,
    pub label: String,
}

/// The segment does not follow the naming convention for its level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{segment}' is not a valid {level} name")]
pub struct Unparseable
{
    pub segment: String,
    pub level: Level,
}

/// Parse `segment` as a name at `level`.
pub fn parse(
    segment: &str,
    level: Level,
) -> Result<ParsedName, Unparseable>
{
    let parsed = match level
    {
        Level::Area => parse_area(segment),
        Level::Category => parse_category(segment),
        Level::Id => parse_id(segment),
    };

    parsed.ok_or_else(|| Unparseable { segment: segment.to_string(), level })
}

fn parse_area(segment: &str) -> Option<ParsedName>
{
    let caps = AREA_RE.captures(segment)?;
    let first = digit(&caps[1])?;
    let last = digit(&caps[2])?;

    // `10-29` style ranges are not areas
    if first != last
    {
        return None;
    }

    Some(ParsedName {
        key: NumericKey::Area(AreaKey::from_digit(first)?),
        label: caps[3]
            .trim()
            .to_string(),
    })
}

fn parse_category(segment: &str) -> Option<ParsedName>
{
    let caps = CATEGORY_RE.captures(segment)?;
    let number: u8 = caps[1]
        .parse()
        .ok()?;

    Some(ParsedName {
        key: NumericKey::Category(CategoryKey::new(number)?),
        label: caps[2]
            .trim()
            .to_string(),
    })
}

fn parse_id(segment: &str) -> Option<ParsedName>
{
    let caps = ID_RE.captures(segment)?;
    let category: u8 = caps[1]
        .parse()
        .ok()?;
    // Absurdly long sub-numbers overflow and are treated as malformed
    let number: u32 = caps[2]
        .parse()
        .ok()?;
    let width = u8::try_from(caps[2].len()).ok()?;

    Some(ParsedName {
        key: NumericKey::Id(IdKey::new(CategoryKey::new(category)?, number, width)),
        label: caps[3]
            .trim()
            .to_string(),
    })
}

/// Parse a flat-JDex area header such as `1. Life Admin.md` or
/// `10. Life Admin`. Returns the area and the header label with any note
/// extension removed.
pub fn parse_area_header(segment: &str) -> Option<(AreaKey, String)>
{
    let caps = HEADER_RE.captures(segment)?;
    let area = AreaKey::from_digit(digit(&caps[1])?)?;
    let label = strip_note_extension(caps[2].trim());

    (!label.is_empty()).then(|| (area, label.to_string()))
}

fn digit(s: &str) -> Option<u8>
{
    s.parse()
        .ok()
}

/// Remove a trailing `.md`-like extension, case-insensitively.
pub fn strip_note_extension(name: &str) -> &str
{
    for ext in NOTE_EXTENSIONS
    {
        if let Some(stem) = strip_suffix_ci(name, ext)
        {
            return stem;
        }
    }
    name
}

/// Canonical form of a label used when comparing names across trees.
///
/// Repeatedly drops a trailing note extension and the phrases "area
/// management", "category management" and "index" (case-insensitive, each
/// preceded by whitespace), then trims. Applying it twice gives the same
/// result as applying it once.
pub fn canonical_label(label: &str) -> String
{
    let mut current = label.trim();

    loop
    {
        let before = current.len();

        current = strip_note_extension(current).trim_end();

        for phrase in MANAGEMENT_SUFFIXES
        {
            if let Some(stem) = strip_suffix_ci(current, phrase)
                && stem.ends_with(char::is_whitespace)
                && !stem
                    .trim()
                    .is_empty()
            {
                current = stem.trim_end();
            }
        }

        if current.len() == before
        {
            return current.to_string();
        }
    }
}

fn strip_suffix_ci<'a>(
    s: &'a str,
    suffix: &str,
) -> Option<&'a str>
{
    let split = s
        .len()
        .checked_sub(suffix.len())?;

    if !s.is_char_boundary(split)
    {
        return None;
    }

    let (stem, tail) = s.split_at(split);
    tail.eq_ignore_ascii_case(suffix)
        .then_some(stem)
}
