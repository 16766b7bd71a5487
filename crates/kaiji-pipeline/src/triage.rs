//! Triage engine: classify one date's titles, collect evidence for matches,
//! and append the result (alerts or a tombstone) to the cumulative store.
//!
//! A date is triaged once it has at least one entry in the store, tombstones
//! included. Each date therefore ends with either N >= 1 alerts or exactly one
//! tombstone, and the store is saved once per completed date.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use kaiji_ai::{TitleClassifier, TitleMatch, parse_classification};
use kaiji_core::{AlertRecord, DisclosureRecord, ListingDate};
use kaiji_harvest::DocumentSource;
use kaiji_store::{AlertRepo, DocumentRepo, ListingRepo, document_name, triaged_dates};
use tracing::{debug, info, warn};

use crate::{PipelineError, Throttle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriageOutcome {
    /// The store already has entries for the date; nothing was done.
    AlreadyTriaged,
    /// This many alerts were appended.
    Matched(usize),
    /// Nothing matched; one tombstone was appended.
    NoMatch,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriageSummary {
    /// Dates that were completed in this run.
    pub dates: usize,
    pub new_alerts: usize,
    /// Dates left un-triaged because classification failed.
    pub failed: usize,
}

pub struct TriageEngine<'a> {
    pub listings: &'a dyn ListingRepo,
    pub alerts: &'a dyn AlertRepo,
    pub documents: &'a dyn DocumentRepo,
    pub downloader: &'a dyn DocumentSource,
    pub classifier: &'a dyn TitleClassifier,
    pub throttle: Throttle,
    /// Recorded on every new entry as the detection date.
    pub detected_on: NaiveDate,
}

impl TriageEngine<'_> {
    /// Triage a single date and save the store if anything was appended.
    pub async fn triage_date(&self, date: ListingDate) -> Result<TriageOutcome, PipelineError> {
        let mut alerts = self.alerts.load()?;
        let done = triaged_dates(&alerts);
        let outcome = self.triage_into(&mut alerts, &done, date).await?;
        if outcome != TriageOutcome::AlreadyTriaged {
            self.alerts.save(&alerts)?;
        }
        Ok(outcome)
    }

    /// Triage every listing date not yet in the store, oldest first, saving
    /// after each date.
    ///
    /// A classifier failure leaves that date un-triaged for the next run;
    /// store errors abort.
    pub async fn triage_all(&self) -> Result<TriageSummary, PipelineError> {
        let mut alerts = self.alerts.load()?;
        let done = triaged_dates(&alerts);
        let pending: Vec<ListingDate> = self
            .listings
            .dates()?
            .into_iter()
            .filter(|d| !done.contains(d))
            .collect();
        info!(
            pending = pending.len(),
            triaged = done.len(),
            "dates awaiting triage"
        );

        let mut summary = TriageSummary::default();
        for date in pending {
            match self.triage_into(&mut alerts, &done, date).await {
                Ok(outcome) => {
                    self.alerts.save(&alerts)?;
                    summary.dates += 1;
                    if let TriageOutcome::Matched(n) = outcome {
                        summary.new_alerts += n;
                    }
                }
                Err(PipelineError::Classifier(e)) => {
                    warn!(date = %date, error = %e, "classification failed; date left for a later run");
                    summary.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }
        info!(
            dates = summary.dates,
            new_alerts = summary.new_alerts,
            failed = summary.failed,
            "triage complete"
        );
        Ok(summary)
    }

    async fn triage_into(
        &self,
        alerts: &mut Vec<AlertRecord>,
        done: &BTreeSet<ListingDate>,
        date: ListingDate,
    ) -> Result<TriageOutcome, PipelineError> {
        if done.contains(&date) {
            info!(date = %date, "already triaged");
            return Ok(TriageOutcome::AlreadyTriaged);
        }
        if !self.listings.exists(date) {
            return Err(PipelineError::MissingListing(date));
        }

        let records = self.listings.load(date)?;
        if records.is_empty() {
            info!(date = %date, "empty listing");
            alerts.push(AlertRecord::tombstone(date, self.detected_on));
            return Ok(TriageOutcome::NoMatch);
        }

        let titles: Vec<String> = records.iter().map(|r| r.title.clone()).collect();
        info!(date = %date, titles = titles.len(), "classifying");
        let reply = self.classifier.classify(&titles).await?;
        let matches = valid_matches(parse_classification(&reply).into_matches(), records.len());

        if matches.is_empty() {
            info!(date = %date, "no matches");
            alerts.push(AlertRecord::tombstone(date, self.detected_on));
            return Ok(TriageOutcome::NoMatch);
        }

        info!(date = %date, matches = matches.len(), "matches found; fetching documents");
        let mut per_code: HashMap<&str, u32> = HashMap::new();
        for m in &matches {
            let record = &records[m.number - 1];
            let seq = per_code.entry(record.code.as_str()).or_insert(0);
            *seq += 1;

            let mut alert = AlertRecord::matched(record, &m.rationale, self.detected_on);
            alert.pdf_path = self.fetch_document(date, record, *seq).await?;
            alerts.push(alert);
        }
        Ok(TriageOutcome::Matched(matches.len()))
    }

    /// Download the record's document unless already stored. Returns the
    /// stored path, or an empty string when there is nothing to point at.
    ///
    /// A failed download is not fatal; failing to write the bytes locally is.
    async fn fetch_document(
        &self,
        date: ListingDate,
        record: &DisclosureRecord,
        seq: u32,
    ) -> Result<String, PipelineError> {
        if record.pdf_url.is_empty() {
            return Ok(String::new());
        }
        let name = document_name(date, &record.code, seq);
        if self.documents.exists(&name) {
            debug!(name, "document already stored");
            return Ok(self.documents.stored_path(&name));
        }

        let bytes = match self.downloader.download(&record.pdf_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(url = %record.pdf_url, error = %e, "document download failed");
                return Ok(String::new());
            }
        };
        self.documents.save(&name, &bytes)?;
        info!(name, bytes = bytes.len(), "document stored");
        self.throttle.pause().await;
        Ok(self.documents.stored_path(&name))
    }
}

/// Keep matches whose 1-based number is within `1..=len`, first occurrence only.
fn valid_matches(matches: Vec<TitleMatch>, len: usize) -> Vec<TitleMatch> {
    let mut seen = BTreeSet::new();
    matches
        .into_iter()
        .filter(|m| {
            if !(1..=len).contains(&m.number) {
                warn!(number = m.number, len, "classifier referenced an out-of-range item");
                return false;
            }
            seen.insert(m.number)
        })
        .collect()
}
