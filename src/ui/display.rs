//! Terminal rendering for forms and their outcomes.

use std::path::{Path, PathBuf};

use anyhow::Result;
use bytesize::ByteSize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use console::{Term, style};
use figlet_rs::FIGfont;

use crate::analyzer::Finding;
use crate::config::APP_NAME;
use crate::file::guess_mime_type;
use crate::lockout::AttemptStatus;
use crate::preview::PreviewResource;
use crate::strength::{MAX_SCORE, PasswordStrength, StrengthLevel};

const MAX_NAME_WIDTH: usize = 32;

/// Clears the terminal screen.
pub fn clear_screen() -> Result<()> {
    Term::stdout().clear_screen().map_err(|e| anyhow::anyhow!("failed to clear screen: {e}"))
}

/// Prints the application banner.
pub fn print_banner() {
    let banner = FIGfont::standard().ok().and_then(|font| font.convert(APP_NAME).map(|figure| figure.to_string()));
    println!("{}", style(banner.unwrap_or_else(|| APP_NAME.to_owned())).green().bold());
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() > MAX_NAME_WIDTH {
        let head: String = name.chars().take(MAX_NAME_WIDTH - 3).collect();
        format!("{head}...")
    } else {
        name.to_owned()
    }
}

/// Table of candidate carriers.
pub fn files_table(files: &[PathBuf]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic).set_header(vec!["No", "Name", "Size", "Type"]);

    for (i, path) in files.iter().enumerate() {
        let name = path.file_name().map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
        let size = std::fs::metadata(path).map_or_else(|_| "-".to_owned(), |meta| ByteSize(meta.len()).to_string());
        let mime = guess_mime_type(&name);
        table.add_row(vec![Cell::new(i + 1), Cell::new(truncate_name(&name)).fg(Color::Green), Cell::new(size), Cell::new(mime)]);
    }

    table
}

pub fn show_files(files: &[PathBuf]) {
    if files.is_empty() {
        println!("{}", style("No files found").yellow());
        return;
    }

    println!();
    println!("{} {}", style("✓").green(), style(format!("Found {} file(s):", files.len())).bold());
    println!("{}", files_table(files));
    println!();
}

/// Shows the selected carrier, its preview location and any format warning.
pub fn show_selection(preview: Option<&PreviewResource>, warning: Option<&str>) {
    let Some(preview) = preview else { return };
    let file = preview.file();
    println!("{} {} ({}, {})", style("•").cyan(), style(file.name()).bold(), ByteSize(file.len()), file.mime());

    if let Some(url) = preview.url() {
        println!("  {} {}", style("Preview:").dim(), url);
    }
    if let Some(warning) = warning {
        println!("  {} {}", style("!").yellow(), style(warning).yellow());
    }
}

/// Four-segment strength meter followed by its label.
pub fn strength_meter(strength: PasswordStrength) -> String {
    let filled = usize::from(strength.score());
    let empty = usize::from(MAX_SCORE) - filled;
    let bar = format!("{}{}", "■".repeat(filled), "□".repeat(empty));

    match strength.level() {
        Some(level) => format!("{bar} {}", level.label()),
        None => bar,
    }
}

pub fn show_strength(strength: PasswordStrength) {
    let meter = strength_meter(strength);
    let styled = match strength.level() {
        Some(StrengthLevel::Weak) | None => style(meter).red(),
        Some(StrengthLevel::Fair) => style(meter).yellow(),
        Some(StrengthLevel::Good | StrengthLevel::Strong) => style(meter).green(),
    };
    println!("  {} {styled}", style("Strength:").dim());
}

/// Table of sensitive patterns found in the message.
pub fn findings_table(findings: &[Finding]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic).set_header(vec!["Type", "Value"]);

    for finding in findings {
        table.add_row(vec![Cell::new(&finding.kind).fg(Color::Yellow), Cell::new(&finding.value)]);
    }

    table
}

pub fn show_findings(findings: &[Finding]) {
    if findings.is_empty() {
        return;
    }

    println!();
    println!("{} {}", style("!").yellow(), style("Your message appears to contain sensitive information:").yellow().bold());
    println!("{}", findings_table(findings));
}

pub fn show_saved(path: &Path) {
    println!();
    println!("{} {}", style("✓").green(), style(format!("Message hidden successfully: {}", path.display())).bold());
}

pub fn show_decoded(message: &str) {
    println!();
    println!("{} {}", style("✓").green(), style("Decoded message:").bold());
    println!("{}", style(message).cyan());
}

pub fn show_error(message: &str) {
    println!("{} {}", style("✗").red(), style(message).red());
}

/// "N attempts remaining" once an attempt has been used.
pub fn show_attempts(status: AttemptStatus) {
    if status.should_display() {
        println!("  {}", style(format!("({} attempts remaining)", status.remaining)).yellow());
    }
}

pub fn show_lockout(message: &str) {
    println!();
    println!("{} {}", style("Locked").red().bold().reverse(), style(message).red());
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("photo.png"), "photo.png");

        let long = "a_really_long_holiday_photo_name_2024.png";
        let short = truncate_name(long);
        assert_eq!(short.chars().count(), MAX_NAME_WIDTH);
        assert!(short.ends_with("..."));
    }

    #[test]
    fn test_strength_meter() {
        assert_eq!(strength_meter(PasswordStrength::of("")), "□□□□");
        assert_eq!(strength_meter(PasswordStrength::of("Secr3t!")), "■■■□ Good");
    }

    #[test]
    fn test_findings_table_lists_every_finding() {
        let findings = vec![Finding { kind: "email".into(), value: "a@b.io".into() }, Finding { kind: "credit_card".into(), value: "4111 1111".into() }];

        let rendered = findings_table(&findings).to_string();

        assert!(rendered.contains("a@b.io"));
        assert!(rendered.contains("credit_card"));
    }

    #[test]
    fn test_files_table_shows_sizes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cat.png");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let rendered = files_table(&[path]).to_string();

        assert!(rendered.contains("cat.png"));
        assert!(rendered.contains("image/png"));
    }
}
