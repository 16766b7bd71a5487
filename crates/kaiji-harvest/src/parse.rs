//! Listing page parsing.
//!
//! Only the handful of markers the pipeline depends on are read: the "no
//! disclosures" notice, the `全N件` total in the pager cell, and the per-row
//! `kj*` cells of the main list table.

use std::sync::LazyLock;

use kaiji_core::{DisclosureRecord, ListingDate};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Fixed number of rows per listing page.
pub const PAGE_SIZE: usize = 100;

const NO_DATA_MARKER: &str = "に開示された情報はありません";

static TOTAL_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"全(\d+)件").expect("static regex"));

struct Selectors {
    pager: Selector,
    rows: Selector,
    link: Selector,
    time: Selector,
    code: Selector,
    name: Selector,
    title: Selector,
    xbrl: Selector,
    place: Selector,
    history: Selector,
}

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    pager: sel("td.pagerTd"),
    // html5ever inserts an implicit <tbody>; accept both shapes.
    rows: sel("table#main-list-table > tbody > tr, table#main-list-table > tr"),
    link: sel("a[href]"),
    time: sel("td.kjTime"),
    code: sel("td.kjCode"),
    name: sel("td.kjName"),
    title: sel("td.kjTitle"),
    xbrl: sel("td.kjXbrl"),
    place: sel("td.kjPlace"),
    // Class name as spelled by the portal.
    history: sel("td.kjHistroy"),
});

/// What one listing page says about its date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingPage {
    /// The portal reports no disclosures for the date.
    NoDisclosures,
    Listing {
        /// Total across all pages; 0 when the pager is missing.
        total_count: usize,
        rows: Vec<DisclosureRecord>,
    },
}

/// Pages needed to hold `total_count` rows.
pub fn total_pages(total_count: usize) -> usize {
    total_count.div_ceil(PAGE_SIZE)
}

/// Parse a listing page. `link_base` is prefixed to relative document links.
pub fn parse_listing_page(html: &str, date: ListingDate, link_base: &str) -> ListingPage {
    let doc = Html::parse_document(html);
    let text: String = doc.root_element().text().collect();
    if text.contains(NO_DATA_MARKER) {
        return ListingPage::NoDisclosures;
    }
    ListingPage::Listing {
        total_count: total_count(&doc),
        rows: rows(&doc, date, link_base),
    }
}

fn total_count(doc: &Html) -> usize {
    let Some(pager) = doc.select(&SELECTORS.pager).next() else {
        return 0;
    };
    let text = stripped_text(pager);
    TOTAL_COUNT
        .captures(&text)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0)
}

fn rows(doc: &Html, date: ListingDate, link_base: &str) -> Vec<DisclosureRecord> {
    let s = &*SELECTORS;
    let day = date.slashed();

    doc.select(&s.rows)
        .filter_map(|row| {
            let time = cell_text(row, &s.time);
            // Header and footer rows carry no time cell.
            if time.is_empty() {
                return None;
            }
            Some(DisclosureRecord {
                timestamp: format!("{day} {time}"),
                code: cell_text(row, &s.code),
                company: cell_text(row, &s.name),
                title: cell_text(row, &s.title),
                pdf_url: cell_link(row, &s.title, link_base),
                xbrl_url: cell_link(row, &s.xbrl, link_base),
                exchange: cell_text(row, &s.place),
                history: cell_text(row, &s.history),
            })
        })
        .collect()
}

/// Text of the element with every fragment trimmed and joined.
fn stripped_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect()
}

fn cell_text(row: ElementRef<'_>, cell: &Selector) -> String {
    row.select(cell).next().map(stripped_text).unwrap_or_default()
}

fn cell_link(row: ElementRef<'_>, cell: &Selector, link_base: &str) -> String {
    row.select(cell)
        .next()
        .and_then(|c| c.select(&SELECTORS.link).next())
        .and_then(|a| a.value().attr("href"))
        .map(|href| resolve(href, link_base))
        .unwrap_or_default()
}

fn resolve(href: &str, link_base: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{link_base}{href}")
    }
}
