/*!
 * Switchboard CLI Style System
 *
 * Styling helpers for the human-facing run summary: themed text, a header
 * box and tables for the report and per-file outcomes.
 */

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use console::{style, StyledObject};

use crate::core::export::OperatorBucket;
use crate::stats::{format_count, format_duration, FileOutcome, RunReport};

// ============================================================================
// THEME COLORS
// ============================================================================

pub struct Theme;

impl Theme {
    /// Primary accent color (cyan)
    pub fn primary<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan()
    }

    pub fn success<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).green()
    }

    pub fn warning<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).yellow()
    }

    pub fn error<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).red()
    }

    /// Muted/secondary text (dim)
    pub fn muted<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).dim()
    }

    /// Header style (bold cyan)
    pub fn header<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan().bold()
    }
}

// ============================================================================
// ICONS
// ============================================================================

pub struct Icons;

impl Icons {
    pub const SUCCESS: &'static str = "✓";
    pub const ERROR: &'static str = "✗";
    pub const WARNING: &'static str = "⚠";
    pub const STATS: &'static str = "📊";
    pub const FOLDER: &'static str = "📁";
    pub const ARROW_RIGHT: &'static str = "→";
}

// ============================================================================
// BOX DRAWING
// ============================================================================

/// Draw a styled header box
pub fn header_box(title: &str, subtitle: Option<&str>) {
    let width = 56;
    let top = format!("╔{}╗", "═".repeat(width));
    let bottom = format!("╚{}╝", "═".repeat(width));

    println!("{}", Theme::primary(&top));
    println!("{}", boxed_line(title, width, true));
    if let Some(sub) = subtitle {
        println!("{}", boxed_line(sub, width, false));
    }
    println!("{}", Theme::primary(&bottom));
}

fn boxed_line(text: &str, width: usize, emphasize: bool) -> String {
    let len = text.chars().count().min(width);
    let padding = (width - len) / 2;
    let body = if emphasize {
        Theme::header(text).to_string()
    } else {
        Theme::muted(text).to_string()
    };
    format!(
        "{}{}{}{}{}",
        Theme::primary("║"),
        " ".repeat(padding),
        body,
        " ".repeat(width - padding - len),
        Theme::primary("║")
    )
}

/// Draw a section header with a line
pub fn section_header(title: &str) {
    let line_len = 50 - title.len().min(40);
    println!(
        "\n{} {}",
        Theme::header(title),
        Theme::muted("─".repeat(line_len))
    );
}

// ============================================================================
// TABLES
// ============================================================================

pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Final report as a two-column table
pub fn run_summary_table(report: &RunReport) -> Table {
    let mut table = create_table();
    table.set_header(vec![
        Cell::new("Run Summary")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(""),
    ]);

    table.add_row(vec![
        Cell::new("Files processed"),
        Cell::new(format!("{}/{}", report.files_succeeded, report.files_total))
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
    ]);

    if report.files_failed > 0 {
        table.add_row(vec![
            Cell::new("Files failed"),
            Cell::new(report.files_failed.to_string())
                .fg(Color::Red)
                .add_attribute(Attribute::Bold),
        ]);
    }

    table.add_row(vec![
        Cell::new("Unique records"),
        Cell::new(format_count(report.unique_records)).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("Rows seen"),
        Cell::new(format_count(report.rows_seen)),
    ]);
    table.add_row(vec![
        Cell::new("CSV files written"),
        Cell::new(format_count(report.output_files)),
    ]);

    if report.bucket_failures > 0 {
        table.add_row(vec![
            Cell::new("Bucket write failures"),
            Cell::new(report.bucket_failures.to_string()).fg(Color::Yellow),
        ]);
    }

    table.add_row(vec![
        Cell::new("Success rate"),
        Cell::new(format!("{:.1}%", report.success_rate())).fg(Color::Cyan),
    ]);
    table.add_row(vec![
        Cell::new("Duration"),
        Cell::new(format_duration(report.elapsed())),
    ]);

    table
}

/// One row per source file with its carrier distribution
pub fn outcomes_table(outcomes: &[FileOutcome]) -> Table {
    let mut table = create_table();
    let mut header = vec![
        Cell::new("File").add_attribute(Attribute::Bold),
        Cell::new("Region").add_attribute(Attribute::Bold),
        Cell::new("Unique").add_attribute(Attribute::Bold),
    ];
    header.extend(
        OperatorBucket::ALL
            .iter()
            .map(|b| Cell::new(b.to_string()).add_attribute(Attribute::Bold)),
    );
    header.push(Cell::new("Status").add_attribute(Attribute::Bold));
    table.set_header(header);

    for outcome in outcomes {
        let mut row = vec![
            Cell::new(outcome.file_name()),
            Cell::new(&outcome.region),
            Cell::new(format_count(outcome.unique_records)),
        ];
        row.extend(OperatorBucket::ALL.iter().map(|b| {
            let count = outcome.distribution.map_or(0, |d| d.count(*b));
            Cell::new(format_count(count as u64))
        }));
        row.push(status_cell(outcome));
        table.add_row(row);
    }

    table
}

fn status_cell(outcome: &FileOutcome) -> Cell {
    match &outcome.status {
        Ok(()) if outcome.bucket_failures.is_empty() => {
            Cell::new(format!("{} ok", Icons::SUCCESS)).fg(Color::Green)
        }
        Ok(()) => Cell::new(format!(
            "{} {} bucket(s) failed",
            Icons::WARNING,
            outcome.bucket_failures.len()
        ))
        .fg(Color::Yellow),
        Err(failure) => {
            Cell::new(format!("{} {}", Icons::ERROR, failure.stage)).fg(Color::Red)
        }
    }
}

// ============================================================================
// MESSAGES
// ============================================================================

/// Print a styled error message with optional suggestion
pub fn print_error(message: &str, suggestion: Option<&str>) {
    eprintln!(
        "\n{} {}",
        Theme::error(format!("{} Error:", Icons::ERROR)),
        message
    );

    if let Some(hint) = suggestion {
        eprintln!(
            "  {} {}",
            Theme::muted(Icons::ARROW_RIGHT),
            Theme::muted(hint)
        );
    }
    eprintln!();
}

pub fn print_warning(message: &str) {
    eprintln!(
        "{} {}",
        Theme::warning(Icons::WARNING.to_string()),
        Theme::warning(message)
    );
}

pub fn print_success(message: &str) {
    println!(
        "{} {}",
        Theme::success(Icons::SUCCESS.to_string()),
        Theme::success(message)
    );
}

// ============================================================================
// TESTS
// ============================================================================
