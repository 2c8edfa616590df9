//! Terminal output utilities

use console::style;
use relaymesh_reconcile::{BatchReport, SiteOutcome, SiteResult};
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Print a header
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Row of the per-site summary table
#[derive(Tabled, Debug, PartialEq, Eq)]
pub struct SiteRow {
    site: String,
    outcome: String,
    central: String,
    definitions: String,
    detail: String,
}

impl From<&SiteResult> for SiteRow {
    fn from(result: &SiteResult) -> Self {
        match &result.outcome {
            SiteOutcome::Done(report) => Self {
                site: result.site.clone(),
                outcome: "Done".to_string(),
                central: report
                    .central
                    .map(|s| format!("{} created, {} existing", s.created, s.existing))
                    .unwrap_or_else(|| "skipped".to_string()),
                definitions: report
                    .definitions
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "skipped".to_string()),
                detail: String::new(),
            },
            SiteOutcome::Failed { stage, reason } => Self {
                site: result.site.clone(),
                outcome: format!("Failed({})", stage),
                central: "-".to_string(),
                definitions: "-".to_string(),
                detail: reason.clone(),
            },
        }
    }
}

/// Print the per-site outcome table
pub fn site_summary(report: &BatchReport) {
    header("Reconciliation summary");
    if report.results.is_empty() {
        info("No site specifications found");
        return;
    }

    let rows: Vec<SiteRow> = report.results.iter().map(SiteRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);
}
