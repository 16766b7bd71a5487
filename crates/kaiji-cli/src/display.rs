//! End-of-run summaries printed to stdout.

use kaiji_pipeline::{BatchReport, EnrichReport, HarvestOutcome, TriageOutcome, TriageSummary};

const RULE: &str = "============================================================";

pub fn harvest(date: &str, outcome: HarvestOutcome) -> String {
    match outcome {
        HarvestOutcome::Skipped => format!("{date}: listing already exists, skipped"),
        HarvestOutcome::Empty => format!("{date}: no disclosures (empty listing written)"),
        HarvestOutcome::Saved(n) => format!("{date}: {n} disclosures saved"),
    }
}

pub fn batch(report: &BatchReport) -> String {
    format!(
        "{RULE}\nBatch complete:\n  succeeded: {} days\n  skipped:   {} days\n  failed:    {} days\n  total:     {} days\n{RULE}",
        report.succeeded, report.skipped, report.failed, report.total
    )
}

pub fn triage_date(date: &str, outcome: TriageOutcome) -> String {
    match outcome {
        TriageOutcome::AlreadyTriaged => format!("{date}: already triaged, skipped"),
        TriageOutcome::NoMatch => format!("{date}: no matching disclosures"),
        TriageOutcome::Matched(n) => format!("{date}: {n} alerts added"),
    }
}

pub fn triage_all(summary: &TriageSummary) -> String {
    let mut out = format!(
        "Triaged {} dates, {} new alerts",
        summary.dates, summary.new_alerts
    );
    if summary.failed > 0 {
        out.push_str(&format!(
            " ({} dates failed classification and will be retried)",
            summary.failed
        ));
    }
    out
}

pub fn enrich(report: &EnrichReport) -> String {
    let mut lines = vec![format!(
        "Summarized {}/{} records",
        report.summarized + report.sentinel,
        report.selected
    )];
    // Rows only for non-zero counts.
    for (label, n) in [
        ("no extractable text", report.sentinel),
        ("document missing", report.missing),
        ("summarizer failed", report.failed),
    ] {
        if n > 0 {
            lines.push(format!("  {label}: {n}"));
        }
    }
    lines.join("\n")
}
