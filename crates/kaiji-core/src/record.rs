//! Disclosure and alert records shared by every pipeline stage.
//!
//! Field names on the wire are the Japanese column/key names used by the
//! listing CSVs and the cumulative alert store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date::ListingDate;

/// Listing CSV header, in column order.
pub const LISTING_COLUMNS: [&str; 8] = [
    "日時",
    "コード",
    "会社名",
    "表題",
    "PDF_URL",
    "XBRL_URL",
    "上場取引所",
    "更新履歴",
];

/// Rationale carried by a tombstone. Reserved: never produced by triage for a
/// real match.
pub const TOMBSTONE_RATIONALE: &str = "_処理済み（該当なし）";

/// Leading marker of [`TOMBSTONE_RATIONALE`]; genuine rationales never start with it.
pub const RESERVED_RATIONALE_PREFIX: char = '_';

/// Summary written when a document yields no extractable text.
pub const EXTRACTION_FAILED_SUMMARY: &str = "（テキスト抽出不可）";

/// One filed item on the portal's daily listing.
///
/// Every field is a string; absent values are empty strings, never null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureRecord {
    /// `YYYY/MM/DD HH:MM`, portal-local time.
    #[serde(rename = "日時")]
    pub timestamp: String,
    #[serde(rename = "コード")]
    pub code: String,
    #[serde(rename = "会社名")]
    pub company: String,
    #[serde(rename = "表題")]
    pub title: String,
    #[serde(rename = "PDF_URL")]
    pub pdf_url: String,
    #[serde(rename = "XBRL_URL")]
    pub xbrl_url: String,
    #[serde(rename = "上場取引所")]
    pub exchange: String,
    #[serde(rename = "更新履歴")]
    pub history: String,
}

/// One entry in the cumulative alert store: a matched disclosure, or a tombstone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    #[serde(rename = "日時", default)]
    pub timestamp: String,
    #[serde(rename = "コード", default)]
    pub code: String,
    #[serde(rename = "会社名", default)]
    pub company: String,
    #[serde(rename = "表題", default)]
    pub title: String,
    #[serde(rename = "PDF_URL", default)]
    pub pdf_url: String,
    /// Relative path of the downloaded document; empty until a download succeeds.
    #[serde(default)]
    pub pdf_path: String,
    #[serde(rename = "判定理由", default)]
    pub rationale: String,
    #[serde(rename = "要約", default)]
    pub summary: String,
    #[serde(rename = "検出日")]
    pub detected_on: NaiveDate,
}

impl AlertRecord {
    /// Build an alert for a matched disclosure.
    ///
    /// The detection date is clamped to the disclosure date so that an alert
    /// is never detected before it was filed. A rationale starting with the
    /// reserved tombstone prefix has that prefix stripped.
    pub fn matched(
        disclosure: &DisclosureRecord,
        rationale: &str,
        detected_on: NaiveDate,
    ) -> Self {
        let detected_on = match ListingDate::from_timestamp(&disclosure.timestamp) {
            Some(filed) => detected_on.max(filed.naive()),
            None => detected_on,
        };
        Self {
            timestamp: disclosure.timestamp.clone(),
            code: disclosure.code.clone(),
            company: disclosure.company.clone(),
            title: disclosure.title.clone(),
            pdf_url: disclosure.pdf_url.clone(),
            pdf_path: String::new(),
            rationale: rationale
                .trim_start_matches(RESERVED_RATIONALE_PREFIX)
                .to_string(),
            summary: String::new(),
            detected_on,
        }
    }

    /// Marker recording that `date` was triaged and nothing matched.
    pub fn tombstone(date: ListingDate, detected_on: NaiveDate) -> Self {
        Self {
            timestamp: date.slashed(),
            code: String::new(),
            company: String::new(),
            title: String::new(),
            pdf_url: String::new(),
            pdf_path: String::new(),
            rationale: TOMBSTONE_RATIONALE.to_string(),
            summary: String::new(),
            detected_on: detected_on.max(date.naive()),
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.code.is_empty() && self.rationale.starts_with(RESERVED_RATIONALE_PREFIX)
    }

    /// Disclosure date this entry belongs to, tombstones included.
    pub fn disclosure_date(&self) -> Option<ListingDate> {
        ListingDate::from_timestamp(&self.timestamp)
    }

    /// Downloaded, real, and not yet summarized.
    pub fn awaits_summary(&self) -> bool {
        !self.is_tombstone()
            && !self.code.is_empty()
            && !self.pdf_path.is_empty()
            && self.summary.is_empty()
    }

    /// Fill the summary. The summary is written at most once; returns `false`
    /// and leaves the record untouched if one is already present.
    pub fn fill_summary(&mut self, summary: impl Into<String>) -> bool {
        if !self.summary.is_empty() {
            return false;
        }
        self.summary = summary.into();
        true
    }
}
