//! Turns `pip list` output into package records.
//!
//! Two layouts are understood, picked by [`OutputFormat`]:
//! - `Json`: a JSON array (what `--format=json` prints) or one JSON object per line.
//! - `Columns`: whitespace-separated columns, optionally under pip's title row and dash rule.
//!
//! Lines that cannot be decomposed are returned in [`Listing::skipped`] instead of
//! failing the whole listing.

use crate::error::{ParseError, Result};
use crate::models::{canonical_name, OutputFormat, PackageRecord};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Parsed packages plus the lines that had to be skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub packages: Vec<PackageRecord>,
    pub skipped: Vec<ParseError>,
}

impl Listing {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListingKind {
    Installed,
    Outdated,
}

/// One entry of `pip list --format=json`. Extra keys (`latest_filetype`,
/// `editable_project_location`, ...) are ignored.
#[derive(Debug, Deserialize)]
struct JsonEntry {
    name: String,
    version: String,
    #[serde(default)]
    latest_version: Option<String>,
}

/// Parses the output of `pip list`.
pub fn parse_listing(raw: &str, format: OutputFormat) -> Result<Listing> {
    parse(raw, format, ListingKind::Installed)
}

/// Parses the output of `pip list --outdated`. Every returned record has a
/// `latest_version` that differs from its installed version.
pub fn parse_outdated(raw: &str, format: OutputFormat) -> Result<Listing> {
    parse(raw, format, ListingKind::Outdated)
}

fn parse(raw: &str, format: OutputFormat, kind: ListingKind) -> Result<Listing> {
    let mut builder = ListingBuilder::new(kind);
    match format {
        OutputFormat::Json => parse_json(raw, &mut builder)?,
        OutputFormat::Columns => parse_columns(raw, &mut builder),
    }
    let listing = builder.finish();
    debug!(
        "Parsed {} {:?} record(s), skipped {}",
        listing.packages.len(),
        kind,
        listing.skipped.len()
    );
    Ok(listing)
}

fn parse_json(raw: &str, builder: &mut ListingBuilder) -> Result<()> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(());
    }

    if trimmed.starts_with('[') {
        let values: Vec<serde_json::Value> = serde_json::from_str(trimmed).map_err(|e| {
            ParseError::new(e.line(), format!("invalid JSON listing: {}", e))
        })?;
        for (index, value) in values.into_iter().enumerate() {
            match serde_json::from_value::<JsonEntry>(value) {
                Ok(entry) => builder.push(index + 1, entry.name, entry.version, entry.latest_version),
                Err(e) => builder.skip(ParseError::new(index + 1, format!("malformed entry: {}", e))),
            }
        }
        return Ok(());
    }

    for (index, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<JsonEntry>(line) {
            Ok(entry) => builder.push(index + 1, entry.name, entry.version, entry.latest_version),
            Err(e) => builder.skip(ParseError::new(index + 1, format!("malformed entry: {}", e))),
        }
    }
    Ok(())
}

fn parse_columns(raw: &str, builder: &mut ListingBuilder) {
    let lines: Vec<(usize, &str)> = raw
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();

    // pip prints a title row then a dash rule; when the rule sits in the second
    // row both rows are dropped by position. Without it every row is data.
    let header_rows = if lines.len() >= 2 && is_rule(lines[1].1) { 2 } else { 0 };

    let needed = match builder.kind {
        ListingKind::Installed => 2,
        ListingKind::Outdated => 3,
    };

    for &(number, line) in &lines[header_rows..] {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < needed {
            builder.skip(ParseError::new(
                number,
                format!("expected at least {} columns, found {}", needed, fields.len()),
            ));
            continue;
        }
        let latest = (builder.kind == ListingKind::Outdated).then(|| fields[2].to_string());
        builder.push(number, fields[0].to_string(), fields[1].to_string(), latest);
    }
}

fn is_rule(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c == '-' || c.is_whitespace())
}

/// Applies the record invariants shared by both layouts.
struct ListingBuilder {
    kind: ListingKind,
    seen: HashSet<String>,
    listing: Listing,
}

impl ListingBuilder {
    fn new(kind: ListingKind) -> Self {
        Self {
            kind,
            seen: HashSet::new(),
            listing: Listing::default(),
        }
    }

    fn push(&mut self, line: usize, name: String, version: String, latest: Option<String>) {
        let name = name.trim().to_string();
        let version = version.trim().to_string();
        if name.is_empty() || version.is_empty() {
            self.skip(ParseError::new(line, "missing package name or version"));
            return;
        }

        let latest = match self.kind {
            ListingKind::Installed => None,
            ListingKind::Outdated => match latest
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
            {
                None => {
                    self.skip(ParseError::new(line, format!("{}: missing latest version", name)));
                    return;
                },
                Some(l) if l == version => {
                    self.skip(ParseError::new(
                        line,
                        format!("{}: latest version equals installed version {}", name, version),
                    ));
                    return;
                },
                Some(l) => Some(l),
            },
        };

        if !self.seen.insert(canonical_name(&name)) {
            self.skip(ParseError::new(line, format!("duplicate package {}", name)));
            return;
        }

        let record = match latest {
            Some(latest) => PackageRecord::outdated(name, version, latest),
            None => PackageRecord::installed(name, version),
        };
        self.listing.packages.push(record);
    }

    fn skip(&mut self, err: ParseError) {
        warn!("Skipping installer output {}", err);
        self.listing.skipped.push(err);
    }

    fn finish(self) -> Listing {
        self.listing
    }
}
