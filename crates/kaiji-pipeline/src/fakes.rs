//! Scripted collaborators for stage tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use kaiji_ai::{AiError, Summarizer, TitleClassifier};
use kaiji_core::{DisclosureRecord, ListingDate};
use kaiji_harvest::{DocumentSource, FetchError, ListingSource};

use crate::TextExtractor;

pub const LINK_BASE: &str = "https://portal.test/inbs/";

pub fn date(s: &str) -> ListingDate {
    ListingDate::parse(s).unwrap()
}

pub fn disclosure(date: ListingDate, code: &str, title: &str) -> DisclosureRecord {
    DisclosureRecord {
        timestamp: format!("{} 15:00", date.slashed()),
        code: code.into(),
        company: format!("会社{code}"),
        title: title.into(),
        pdf_url: format!("{LINK_BASE}{code}.pdf"),
        ..Default::default()
    }
}

/// Listing page HTML with `n` rows starting at row number `first`.
pub fn listing_page_html(total: usize, first: usize, n: usize) -> String {
    let mut rows = String::new();
    for i in first..first + n {
        rows.push_str(&format!(
            r#"<tr><td class="kjTime">09:{:02}</td><td class="kjCode">{:05}</td><td class="kjName">会社{i}</td><td class="kjTitle"><a href="doc{i}.pdf">表題{i}</a></td><td class="kjXbrl"></td><td class="kjPlace">東</td><td class="kjHistroy"></td></tr>"#,
            i % 60,
            i
        ));
    }
    format!(
        r#"<html><body><table><tr><td class="pagerTd">全{total}件</td></tr></table><table id="main-list-table">{rows}</table></body></html>"#
    )
}

pub fn no_data_page_html() -> String {
    "<html><body><div>に開示された情報はありません</div></body></html>".into()
}

/// Listing source answering from a fixed page table; unknown pages fail.
#[derive(Default)]
pub struct ScriptedPortal {
    pages: HashMap<(ListingDate, usize), String>,
    requests: AtomicUsize,
}

impl ScriptedPortal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, date: ListingDate, page: usize, html: String) -> Self {
        self.pages.insert((date, page), html);
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

fn exhausted(url: String) -> FetchError {
    FetchError::Exhausted {
        url: url.clone(),
        attempts: 3,
        last: Box::new(FetchError::Status { url, status: 503 }),
    }
}

#[async_trait]
impl ListingSource for ScriptedPortal {
    async fn listing_page(&self, date: ListingDate, page: usize) -> Result<String, FetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(&(date, page))
            .cloned()
            .ok_or_else(|| exhausted(format!("{LINK_BASE}I_list_{page:03}_{date}.html")))
    }

    fn link_base(&self) -> &str {
        LINK_BASE
    }
}

/// Document source serving bytes for known URLs; others fail as exhausted.
#[derive(Default)]
pub struct ScriptedDownloads {
    docs: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedDownloads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(mut self, url: impl Into<String>, bytes: &[u8]) -> Self {
        self.docs.insert(url.into(), bytes.to_vec());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentSource for ScriptedDownloads {
    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.docs
            .get(url)
            .cloned()
            .ok_or_else(|| exhausted(url.to_string()))
    }
}

/// Classifier returning a fixed reply (or failing).
pub struct ScriptedClassifier {
    reply: Result<String, u16>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedClassifier {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TitleClassifier for ScriptedClassifier {
    async fn classify(&self, titles: &[String]) -> Result<String, AiError> {
        self.calls.lock().unwrap().push(titles.to_vec());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(AiError::Api {
                status: *status,
                body: "scripted failure".into(),
            }),
        }
    }
}

/// Summarizer echoing the title; titles listed in `failing` return an error.
#[derive(Default)]
pub struct EchoSummarizer {
    failing: Vec<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl EchoSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, title: &str) -> Self {
        self.failing.push(title.into());
        self
    }

    /// `(title, text)` of every request.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for EchoSummarizer {
    async fn summarize(&self, _company: &str, title: &str, text: &str) -> Result<String, AiError> {
        self.calls
            .lock()
            .unwrap()
            .push((title.to_string(), text.to_string()));
        if self.failing.iter().any(|t| t == title) {
            return Err(AiError::Api {
                status: 529,
                body: "overloaded".into(),
            });
        }
        Ok(format!("要約: {title}"))
    }
}

/// Treats document bytes as UTF-8 text.
pub struct Utf8Extractor;

impl TextExtractor for Utf8Extractor {
    fn extract(&self, bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }
}
