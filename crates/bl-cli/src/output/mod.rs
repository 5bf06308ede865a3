//! Output formatting utilities for the CLI
//!
//! Tables for ports and claimed boards, human-readable ages, and colored
//! status messages.

use std::time::Duration;

use tabled::{settings::Style, Table, Tabled};

use bl_core::PortInfo;
use bl_orchestrator::ConnectionState;

/// Format enumerated ports as an ASCII table
///
/// Ports whose manufacturer is in `manufacturers` are marked as boards.
pub fn format_ports(ports: &[PortInfo], manufacturers: &[String]) -> String {
    if ports.is_empty() {
        return "No serial ports found".to_string();
    }

    #[derive(Tabled)]
    struct PortRow {
        #[tabled(rename = "PORT")]
        name: String,
        #[tabled(rename = "MANUFACTURER")]
        manufacturer: String,
        #[tabled(rename = "BOARD")]
        board: String,
    }

    let rows: Vec<PortRow> = ports
        .iter()
        .map(|p| PortRow {
            name: p.name.clone(),
            manufacturer: p.manufacturer.clone().unwrap_or_else(|| "-".to_string()),
            board: match &p.manufacturer {
                Some(m) if manufacturers.contains(m) => "yes".to_string(),
                _ => "-".to_string(),
            },
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format the shared connection state as an ASCII table
///
/// A record younger than `window` at `now` is shown as a live claim.
pub fn format_state(state: &ConnectionState, now: u64, window: Duration) -> String {
    if state.is_empty() {
        return "No boards claimed".to_string();
    }

    #[derive(Tabled)]
    struct ClaimRow {
        #[tabled(rename = "ADDRESS")]
        address: String,
        #[tabled(rename = "PROJECT")]
        project: String,
        #[tabled(rename = "AGE")]
        age: String,
        #[tabled(rename = "STATUS")]
        status: String,
    }

    let rows: Vec<ClaimRow> = state
        .iter()
        .map(|(address, record)| ClaimRow {
            address: address.clone(),
            project: if record.project.is_empty() {
                "-".to_string()
            } else {
                truncate(&record.project, 32)
            },
            age: format_age(record.age(now)),
            status: if record.is_live(now, window) { "live" } else { "stale" }.to_string(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format a millisecond age in human-readable form
pub fn format_age(millis: u64) -> String {
    let secs = millis / 1000;
    if secs < 60 {
        format!("{}.{}s", secs, (millis % 1000) / 100)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Truncate a string with ellipsis if too long
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
///
/// Outputs to stderr.
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow with a warning symbol prefix
///
/// Outputs to stderr.
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan with an info symbol prefix
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}
