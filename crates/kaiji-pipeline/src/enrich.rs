//! Enricher: summarize downloaded documents of matched alerts, one record at a
//! time, saving the whole store after every record that changes.

use kaiji_ai::Summarizer;
use kaiji_core::EXTRACTION_FAILED_SUMMARY;
use kaiji_store::{AlertRepo, DocumentRepo, pending_summaries};
use tracing::{info, warn};

use crate::{PipelineError, TextExtractor};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichReport {
    /// Records picked for this run (after the limit).
    pub selected: usize,
    pub summarized: usize,
    /// Records marked with the extraction-failed sentinel.
    pub sentinel: usize,
    /// Records whose document was not found; retried next run.
    pub missing: usize,
    /// Summarizer failures; retried next run.
    pub failed: usize,
}

pub struct Enricher<'a> {
    pub alerts: &'a dyn AlertRepo,
    pub documents: &'a dyn DocumentRepo,
    pub extractor: &'a dyn TextExtractor,
    pub summarizer: &'a dyn Summarizer,
}

impl Enricher<'_> {
    /// Process up to `limit` pending records in store order (`None` = all).
    pub async fn enrich(&self, limit: Option<usize>) -> Result<EnrichReport, PipelineError> {
        let mut alerts = self.alerts.load()?;
        let pending = pending_summaries(&alerts);
        let targets = match limit {
            Some(n) => &pending[..n.min(pending.len())],
            None => &pending[..],
        };
        info!(
            unsummarized = pending.len(),
            processing = targets.len(),
            "enrichment targets"
        );

        let mut report = EnrichReport {
            selected: targets.len(),
            ..Default::default()
        };

        for (i, &idx) in targets.iter().enumerate() {
            let alert = &alerts[idx];
            info!(
                progress = %format!("{}/{}", i + 1, targets.len()),
                code = %alert.code,
                company = %alert.company,
                "summarizing"
            );

            let Some(bytes) = self.documents.read(&alert.pdf_path)? else {
                warn!(path = %alert.pdf_path, "document not found; will retry next run");
                report.missing += 1;
                continue;
            };

            let text = self.extractor.extract(&bytes);
            if text.trim().is_empty() {
                warn!(path = %alert.pdf_path, "no extractable text");
                alerts[idx].fill_summary(EXTRACTION_FAILED_SUMMARY);
                self.alerts.save(&alerts)?;
                report.sentinel += 1;
                continue;
            }

            let result = self
                .summarizer
                .summarize(&alert.company, &alert.title, &text)
                .await;
            match result {
                Ok(summary) if !summary.trim().is_empty() => {
                    alerts[idx].fill_summary(summary.trim());
                    self.alerts.save(&alerts)?;
                    report.summarized += 1;
                }
                Ok(_) => {
                    warn!(code = %alert.code, "summarizer returned empty text");
                    report.failed += 1;
                }
                Err(e) => {
                    warn!(code = %alert.code, error = %e, "summarization failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            done = report.summarized + report.sentinel,
            targets = report.selected,
            missing = report.missing,
            failed = report.failed,
            "enrichment complete"
        );
        Ok(report)
    }
}
