use std::collections::HashSet;
use std::ops::RangeInclusive;

use super::prompt::Prompt;
use super::{parse_id, ExportRecord, Exporter};
use crate::error::{ExportError, Result};
use crate::providers::WorkItemSource;

/// Widest range accepted in one token, so a typo like `1-999999` does not
/// turn into a million requests.
pub const MAX_RANGE_LEN: u32 = 500;
const PREVIEW_IDS: usize = 10;
const TITLE_PREVIEW: usize = 60;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IdList {
    /// Unique ids in first-seen order.
    pub ids: Vec<u32>,
    /// Rejected tokens with the reason they were rejected.
    pub skipped: Vec<String>,
}

/// Parse ids separated by commas or whitespace. Tokens of the form `a-b`
/// expand to the inclusive range.
pub fn parse_id_list(input: &str) -> IdList {
    let mut list = IdList::default();
    let mut seen = HashSet::new();
    for token in input.replace(',', " ").split_whitespace() {
        match parse_token(token) {
            Ok(range) => {
                for id in range {
                    if seen.insert(id) {
                        list.ids.push(id);
                    }
                }
            }
            Err(reason) => list.skipped.push(format!("{token} ({reason})")),
        }
    }
    list
}

fn parse_token(token: &str) -> std::result::Result<RangeInclusive<u32>, &'static str> {
    let Some((start, end)) = token.split_once('-') else {
        return parse_id(token)
            .map(|id| id..=id)
            .ok_or("not a positive number");
    };
    let (Some(start), Some(end)) = (parse_id(start), parse_id(end)) else {
        return Err("invalid range");
    };
    if start > end {
        return Err("range is reversed");
    }
    if end - start >= MAX_RANGE_LEN {
        return Err("range too large");
    }
    Ok(start..=end)
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub exported: Vec<ExportRecord>,
    pub failed: Vec<(u32, ExportError)>,
}

impl BatchReport {
    pub fn missing_criteria(&self) -> Vec<u32> {
        self.exported
            .iter()
            .filter(|r| !r.has_criteria)
            .map(|r| r.id)
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Export every id with its default filename. One failure does not stop the
/// rest of the batch.
pub async fn export_all<S, P>(
    exporter: &mut Exporter<S>,
    ids: &[u32],
    prompt: &mut P,
) -> BatchReport
where
    S: WorkItemSource,
    P: Prompt,
{
    let mut report = BatchReport::default();
    let total = ids.len();

    for (i, &id) in ids.iter().enumerate() {
        prompt.notice(&format!("\n[{}/{total}] Processing ID: {id}...", i + 1));
        match exporter.export(id, None).await {
            Ok(record) => {
                let name = record
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                prompt.notice(&format!("  ✓ Exported: {name}"));
                prompt.notice(&format!("    {}", preview(&record.title)));
                if !record.has_criteria {
                    prompt.notice("    ⚠ No acceptance criteria found");
                }
                report.exported.push(record);
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "export failed");
                prompt.notice(&format!("  ✗ Failed: {e}"));
                report.failed.push((id, e));
            }
        }
    }

    report
}

fn preview(title: &str) -> String {
    if title.chars().count() > TITLE_PREVIEW {
        let cut: String = title.chars().take(TITLE_PREVIEW).collect();
        format!("{cut}...")
    } else {
        title.to_string()
    }
}

fn join_ids(ids: &[u32]) -> String {
    ids.iter().map(u32::to_string).collect::<Vec<_>>().join(", ")
}

pub fn print_summary<S, P>(exporter: &Exporter<S>, report: &BatchReport, prompt: &mut P)
where
    S: WorkItemSource,
    P: Prompt,
{
    let rule = "=".repeat(70);
    prompt.notice(&format!("\n{rule}\nBATCH EXPORT COMPLETE\n{rule}"));
    prompt.notice(&format!("✓ Successfully exported: {}", report.exported.len()));

    let missing = report.missing_criteria();
    if !missing.is_empty() {
        prompt.notice(&format!("⚠ Missing acceptance criteria: {}", missing.len()));
        prompt.notice(&format!("   IDs: {}", join_ids(&missing)));
    }

    if !report.failed.is_empty() {
        prompt.notice(&format!("✗ Failed: {}", report.failed.len()));
        for (id, err) in &report.failed {
            prompt.notice(&format!("   ID {id}: {err}"));
        }
    }

    prompt.notice(&format!(
        "\nAll files saved to: {}/",
        exporter.config().output_dir.display()
    ));
}

/// Full batch flow. `raw` holds ids from the command line; without it the
/// operator is asked. Returns `None` when the operator declines to proceed.
pub async fn run<S, P>(
    exporter: &mut Exporter<S>,
    raw: Option<String>,
    assume_yes: bool,
    prompt: &mut P,
) -> Result<Option<BatchReport>>
where
    S: WorkItemSource,
    P: Prompt,
{
    let raw = match raw {
        Some(raw) => raw,
        None => {
            prompt.notice("\nEnter user story IDs in one of these formats:");
            prompt.notice("  • Comma-separated: 118556, 118558, 118559");
            prompt.notice("  • Space-separated: 118556 118558 118559");
            prompt.notice("  • Range: 118556-118560 (exports IDs 118556 through 118560)");
            prompt.notice("  • Mixed: 118556, 118558-118560, 118562");
            prompt.ask("Enter user story IDs")?.unwrap_or_default()
        }
    };

    if raw.trim().is_empty() {
        return Err(ExportError::Input("no work item IDs provided".into()));
    }

    let list = parse_id_list(&raw);
    for skipped in &list.skipped {
        prompt.notice(&format!("  ⚠ Skipping {skipped}"));
    }
    if list.ids.is_empty() {
        return Err(ExportError::Input("no valid work item IDs provided".into()));
    }

    let shown = &list.ids[..list.ids.len().min(PREVIEW_IDS)];
    let more = if list.ids.len() > PREVIEW_IDS { "..." } else { "" };
    prompt.notice(&format!(
        "\n✓ Found {} user story ID(s) to process",
        list.ids.len()
    ));
    prompt.notice(&format!("  IDs: {}{more}", join_ids(shown)));

    if !assume_yes {
        let answer = prompt.ask("Proceed with batch export? (y/n)")?;
        let confirmed =
            answer.is_some_and(|a| matches!(a.trim().to_lowercase().as_str(), "y" | "yes"));
        if !confirmed {
            prompt.notice("Batch export cancelled.");
            return Ok(None);
        }
    }

    let report = export_all(exporter, &list.ids, prompt).await;
    print_summary(exporter, &report, prompt);
    Ok(Some(report))
}
