//! Pure formatting: every function here returns the text to print and writes nothing.
//!
//! Colors come from `colored` (and `comfy-table` for cells), both of which follow the
//! process-wide switch set by [`crate::config::ColorMode::apply`]. With colors off the
//! same layout is produced without escape sequences.

use crate::models::{BatchOutcome, PackageRecord};
use chrono::NaiveTime;
use colored::{ColoredString, Colorize};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};

const BANNER: [&str; 7] = [
    "╭──────────────────────────────────────────────╮",
    "│                                              │",
    "│           Python Package Manager             │",
    "│                                              │",
    "│    List, Update, and Remove pip packages     │",
    "│                                              │",
    "╰──────────────────────────────────────────────╯",
];

/// Kind of a status line; picks its glyph and color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Info,
    Success,
    Warning,
    Error,
    Processing,
}

impl Status {
    pub fn glyph(self) -> &'static str {
        match self {
            Status::Info => "ℹ",
            Status::Success => "✓",
            Status::Warning => "⚠",
            Status::Error => "✗",
            Status::Processing => "⟳",
        }
    }

    fn paint(self, text: &str) -> ColoredString {
        match self {
            Status::Info => text.blue(),
            Status::Success => text.green(),
            Status::Warning | Status::Processing => text.yellow(),
            Status::Error => text.red(),
        }
    }
}

fn colors_enabled() -> bool {
    colored::control::SHOULD_COLORIZE.should_colorize()
}

/// A horizontal rule across the terminal.
pub fn rule(width: usize) -> String {
    "─".repeat(width.max(1))
}

/// Bold section title framed by rules.
pub fn section(title: &str, width: usize) -> String {
    format!("\n{}\n{}", title.bold(), rule(width))
}

/// The boxed title, centered in `width` columns.
pub fn banner(width: usize) -> String {
    let lines: Vec<String> = BANNER
        .iter()
        .map(|line| {
            let padding = width.saturating_sub(line.chars().count()) / 2;
            format!("{}{}", " ".repeat(padding), line)
                .bright_blue()
                .bold()
                .to_string()
        })
        .collect();
    format!("\n{}", lines.join("\n"))
}

/// The numbered main menu.
pub fn menu(options: &[&str], width: usize) -> String {
    let mut out = format!("\n{}\n{}\n", "MAIN MENU".bold(), rule(width));
    for (i, option) in options.iter().enumerate() {
        out.push_str(&format!("{} {}\n", format!("{}.", i + 1).blue(), option));
    }
    out.push_str(&rule(width));
    out
}

/// `[HH:MM:SS] <glyph> message`, colored by status.
pub fn status_line(status: Status, message: &str, at: NaiveTime) -> String {
    let line = format!("[{}] {} {}", at.format("%H:%M:%S"), status.glyph(), message);
    status.paint(&line).to_string()
}

fn base_table(width: usize) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_HORIZONTAL_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(width.clamp(20, u16::MAX as usize) as u16);
    if colors_enabled() {
        table.enforce_styling();
    } else {
        table.force_no_tty();
    }
    table
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

/// Installed packages, numbered from 1 so the numbers can be typed back in.
pub fn package_table(title: &str, packages: &[PackageRecord], width: usize) -> String {
    let mut table = base_table(width);
    table.set_header(vec![
        header_cell("#"),
        header_cell("Package Name"),
        header_cell("Version"),
    ]);
    for (i, pkg) in packages.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&pkg.name),
            Cell::new(&pkg.installed_version),
        ]);
    }
    format!("\n{}\n{}", title.bold(), table)
}

/// Outdated packages with the newer version highlighted.
pub fn outdated_table(packages: &[PackageRecord], width: usize) -> String {
    let mut table = base_table(width);
    table.set_header(vec![
        header_cell("#"),
        header_cell("Package Name"),
        header_cell("Current"),
        header_cell("Latest"),
    ]);
    for (i, pkg) in packages.iter().enumerate() {
        let latest = pkg.latest_version.as_deref().unwrap_or("N/A");
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&pkg.name),
            Cell::new(&pkg.installed_version),
            Cell::new(latest).fg(Color::Yellow),
        ]);
    }
    format!("\n{}\n{}", "OUTDATED PACKAGES".bold(), table)
}

/// `name - <error>`, with the error cut to 50 characters.
pub fn failure_entry(name: &str, detail: &str) -> String {
    let detail = detail.trim();
    if detail.chars().count() > 50 {
        let short: String = detail.chars().take(50).collect();
        format!("{} - {}...", name, short)
    } else {
        format!("{} - {}", name, detail)
    }
}

/// Labels for one kind of batch summary.
#[derive(Debug, Clone, Copy)]
pub struct SummaryLabels<'a> {
    pub title: &'a str,
    pub succeeded: &'a str,
    pub failed: &'a str,
    /// Caption for the completion rate line; `None` leaves the line out.
    pub rate: Option<&'a str>,
}

pub const UPDATE_SUMMARY: SummaryLabels<'static> = SummaryLabels {
    title: "PACKAGE UPDATE SUMMARY",
    succeeded: "Successfully updated",
    failed: "Failed to update",
    rate: Some("Update completion rate"),
};

pub const REMOVAL_SUMMARY: SummaryLabels<'static> = SummaryLabels {
    title: "PACKAGE REMOVAL SUMMARY",
    succeeded: "Successfully removed",
    failed: "Failed to remove",
    rate: None,
};

/// Lists what succeeded and what failed in a batch.
pub fn batch_summary(labels: SummaryLabels<'_>, outcome: &BatchOutcome, width: usize) -> String {
    let mut out = format!("\n{}\n{}\n{}\n", rule(width), labels.title.bold(), rule(width));

    if !outcome.succeeded.is_empty() {
        let header = format!("✓ {} ({}):", labels.succeeded, outcome.succeeded.len());
        out.push_str(&format!("\n{}\n", header.green()));
        for item in &outcome.succeeded {
            out.push_str(&format!("  • {}\n", item));
        }
    }

    if !outcome.failed.is_empty() {
        let header = format!("✗ {} ({}):", labels.failed, outcome.failed.len());
        out.push_str(&format!("\n{}\n", header.red()));
        for item in &outcome.failed {
            out.push_str(&format!("  • {}\n", item));
        }
    }

    if let Some(caption) = labels.rate {
        out.push_str(&format!(
            "\n{}\n{}: {:.1}%\n",
            rule(width),
            caption,
            outcome.completion_rate()
        ));
    }
    out.push_str(&rule(width));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColorMode;
    use serial_test::serial;

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 30, 5).unwrap()
    }

    #[test]
    #[serial]
    fn test_status_line_plain() {
        ColorMode::Never.apply();
        assert_eq!(
            status_line(Status::Success, "Updated numpy to 2.0.0", noon()),
            "[12:30:05] ✓ Updated numpy to 2.0.0"
        );
        assert_eq!(
            status_line(Status::Error, "Invalid selection: 9", noon()),
            "[12:30:05] ✗ Invalid selection: 9"
        );
        ColorMode::Auto.apply();
    }

    #[test]
    #[serial]
    fn test_status_line_colored() {
        ColorMode::Always.apply();
        let line = status_line(Status::Warning, "careful", noon());
        assert!(line.starts_with("\u{1b}["));
        assert!(line.contains("[12:30:05] ⚠ careful"));
        ColorMode::Auto.apply();
    }

    #[test]
    #[serial]
    fn test_no_color_tables_have_no_escapes() {
        ColorMode::Never.apply();
        let packages = vec![
            PackageRecord::outdated("numpy", "1.26.0", "2.0.0"),
            PackageRecord::outdated("requests", "2.31.0", "2.32.3"),
        ];
        let table = outdated_table(&packages, 80);
        assert!(!table.contains('\u{1b}'));
        assert!(table.contains("numpy"));
        assert!(table.contains("2.32.3"));
        assert!(table.contains("Latest"));

        let installed = package_table("INSTALLED PACKAGES", &packages, 80);
        assert!(installed.contains("INSTALLED PACKAGES"));
        assert!(installed.contains("1.26.0"));
        assert!(!installed.contains("2.0.0"));
        ColorMode::Auto.apply();
    }

    #[test]
    #[serial]
    fn test_menu_numbers_every_option() {
        ColorMode::Never.apply();
        let text = menu(&["List", "Exit"], 20);
        assert!(text.contains("1. List"));
        assert!(text.contains("2. Exit"));
        assert!(text.contains(&rule(20)));
        ColorMode::Auto.apply();
    }

    #[test]
    #[serial]
    fn test_banner_is_centered() {
        ColorMode::Never.apply();
        let text = banner(100);
        let first = text.lines().nth(1).unwrap();
        let padding = (100 - BANNER[0].chars().count()) / 2;
        assert!(first.starts_with(&format!("{}╭", " ".repeat(padding))));
        assert!(text.contains("Python Package Manager"));
        // Narrow terminals get no padding rather than a panic.
        assert!(banner(10).lines().nth(1).unwrap().starts_with('╭'));
        ColorMode::Auto.apply();
    }

    #[test]
    #[serial]
    fn test_update_summary() {
        ColorMode::Never.apply();
        let outcome = BatchOutcome {
            succeeded: vec!["numpy (1.26.0 → 2.0.0)".to_string()],
            failed: vec!["requests - boom".to_string()],
        };
        let text = batch_summary(UPDATE_SUMMARY, &outcome, 40);
        assert!(text.contains("✓ Successfully updated (1):"));
        assert!(text.contains("  • numpy (1.26.0 → 2.0.0)"));
        assert!(text.contains("✗ Failed to update (1):"));
        assert!(text.contains("Update completion rate: 50.0%"));

        let removal = batch_summary(REMOVAL_SUMMARY, &outcome, 40);
        assert!(!removal.contains("completion rate"));
        ColorMode::Auto.apply();
    }

    #[test]
    fn test_failure_entry_truncates() {
        assert_eq!(failure_entry("numpy", "boom"), "numpy - boom");
        let long = "x".repeat(80);
        assert_eq!(
            failure_entry("numpy", &long),
            format!("numpy - {}...", "x".repeat(50))
        );
    }
}
