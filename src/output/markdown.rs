//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of scrape runs,
//! including year counts and the years that were given up on.

use crate::output::summary::{OutputResult, RunDigest};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown summary of a run
///
/// # Arguments
///
/// * `summary` - The run summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &RunDigest, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run summary as markdown
pub fn format_markdown_summary(summary: &RunDigest) -> String {
    let mut md = String::new();

    md.push_str("# American League Scrape Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run ID**: {}\n", summary.run_id));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Year counts
    md.push_str("## Years\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Succeeded | {} |\n", summary.years_succeeded));
    md.push_str(&format!("| Abandoned | {} |\n", summary.years_abandoned));
    md.push_str(&format!("| Total | {} |\n\n", summary.years_total));

    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        summary.success_rate()
    ));
    md.push_str(&format!("- **Retries**: {}\n", summary.retries()));
    md.push_str(&format!(
        "- **Tables Written**: {}\n\n",
        summary.tables_written
    ));

    if !summary.abandoned.is_empty() {
        md.push_str("## Abandoned Years\n\n");
        md.push_str("| Year | Attempts | Last Error |\n");
        md.push_str("|------|----------|------------|\n");
        for year in &summary.abandoned {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                year.year,
                year.attempts,
                year.error.as_deref().unwrap_or("").replace('|', "\\|")
            ));
        }
        md.push('\n');
    }

    md
}
