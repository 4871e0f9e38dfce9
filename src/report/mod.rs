//! Presentation of the score sheet: terminal table, markdown and HTML

mod html;

pub use html::{render_html, save_html};

use crate::scoring::{ReportView, ScoreState};
use crate::session::SessionSummary;
use chrono::{DateTime, Utc};
use colored::Colorize;
use uuid::Uuid;

/// Where a report came from
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub session_id: Option<Uuid>,
    pub generated_at: DateTime<Utc>,
}

impl ReportContext {
    pub fn stored() -> Self {
        Self {
            session_id: None,
            generated_at: Utc::now(),
        }
    }

    pub fn for_session(summary: &SessionSummary) -> Self {
        Self {
            session_id: Some(summary.session_id),
            generated_at: summary.finished_at,
        }
    }
}

pub(crate) fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:?}", v),
        None => "None".to_string(),
    }
}

fn row_cells(view: &ReportView) -> Vec<[String; 4]> {
    view.rows
        .iter()
        .map(|row| {
            [
                row.label.clone(),
                format_value(row.current),
                format_value(row.last),
                format_value(row.best),
            ]
        })
        .collect()
}

/// Render the score table for a terminal. Better rows are green and worse
/// rows red when `color` is set.
///
/// Painting goes through `colored`, so `colored::control::set_override`
/// and the usual `NO_COLOR`/`CLICOLOR` variables still apply.
pub fn render_terminal(view: &ReportView, color: bool) -> String {
    let cells = row_cells(view);

    let mut widths = view.header.map(|h| h.chars().count());
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let widths = widths.map(|w| w + 4);
    let total: usize = widths.iter().sum();

    let format_line = |line: &[String]| -> String {
        line.iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<String>()
            .trim_end()
            .to_string()
    };

    let title = " Score Sheet ";
    let side = total.saturating_sub(title.len()) / 2;
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!(
        "{}{}{}\n\n",
        "=".repeat(side),
        title,
        "=".repeat(total.saturating_sub(side + title.len()))
    ));
    out.push_str(&format_line(&view.header.map(String::from)));
    out.push('\n');
    out.push_str(&"-".repeat(total));
    out.push('\n');

    for (line, state) in cells.iter().zip(&view.states) {
        let text = format_line(line);
        let text = match state {
            ScoreState::Better if color => text.green().to_string(),
            ScoreState::Worse if color => text.red().bold().to_string(),
            _ => text,
        };
        out.push_str(&text);
        out.push('\n');
    }
    out.push_str(&"=".repeat(total));
    out.push('\n');
    out
}

/// Generate a markdown report of the sheet
pub fn generate_report(view: &ReportView, context: &ReportContext) -> String {
    let mut report = String::new();

    report.push_str("# Score Report\n\n");
    if let Some(session_id) = context.session_id {
        report.push_str(&format!("Session ID: {}\n", session_id));
    }
    report.push_str(&format!("Generated: {}\n\n", context.generated_at));

    let better = view.states.iter().filter(|s| **s == ScoreState::Better).count();
    let worse = view.states.iter().filter(|s| **s == ScoreState::Worse).count();
    report.push_str("## Summary\n\n");
    report.push_str(&format!("- Scores: {}\n", view.rows.len()));
    report.push_str(&format!("- Better than best: {}\n", better));
    report.push_str(&format!("- Worse than best: {}\n\n", worse));

    report.push_str("## Scores\n\n");
    report.push_str(&format!("| {} | State |\n", view.header.join(" | ")));
    report.push_str("|-----------|---------|------|------|-------|\n");
    for (cells, state) in row_cells(view).iter().zip(&view.states) {
        report.push_str(&format!("| {} | {} |\n", cells.join(" | "), state));
    }

    report
}

/// Human-readable lines for the failures and warnings of a session
pub fn session_messages(summary: &SessionSummary) -> Vec<String> {
    let mut lines = Vec::new();
    for changed in &summary.advisories {
        lines.push(format!(
            "warning: evaluator for {}:{} changed ({} -> {})",
            changed.test_name, changed.tag, changed.previous, changed.current
        ));
    }
    for failure in &summary.failures {
        lines.push(format!(
            "FAILED {}:{} = {}: {}",
            failure.test_name, failure.tag, failure.value, failure.error
        ));
    }
    lines
}
