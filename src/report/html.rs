use super::{format_value, ReportContext};
use crate::scoring::ReportView;
use anyhow::{Context, Result};
use askama::Template;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Template)]
#[template(path = "score_report.html")]
struct ScoreReportPage {
    generated_at: String,
    session_id: Option<String>,
    header: Vec<&'static str>,
    rows: Vec<PageRow>,
}

struct PageRow {
    label: String,
    current: String,
    last: String,
    best: String,
    state: String,
}

/// Render the sheet as a standalone HTML page
pub fn render_html(view: &ReportView, context: &ReportContext) -> Result<String> {
    let page = ScoreReportPage {
        generated_at: context.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        session_id: context.session_id.map(|id| id.to_string()),
        header: view.header.to_vec(),
        rows: view
            .iter()
            .map(|(row, state)| PageRow {
                label: row.label.clone(),
                current: format_value(row.current),
                last: format_value(row.last),
                best: format_value(row.best),
                state: state.to_string(),
            })
            .collect(),
    };
    page.render().context("Failed to render HTML report")
}

/// Write the HTML report to `dir/index.html`
pub fn save_html(dir: &Path, view: &ReportView, context: &ReportContext) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).context(format!("Failed to create directory {:?}", dir))?;
    let path = dir.join("index.html");
    std::fs::write(&path, render_html(view, context)?)
        .context(format!("Failed to write HTML report: {:?}", path))?;
    info!("Saved HTML report to {:?}", path);
    Ok(path)
}
