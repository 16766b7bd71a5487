//! Harvester: one date's listing pages into one listing file.

use kaiji_core::ListingDate;
use kaiji_harvest::{ListingPage, ListingSource, parse_listing_page, total_pages};
use kaiji_store::ListingRepo;
use tracing::{info, warn};

use crate::{PipelineError, Throttle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestOutcome {
    /// Listing file already present; nothing was requested.
    Skipped,
    /// Portal reported no disclosures; a header-only file was written.
    Empty,
    /// Listing written with this many rows.
    Saved(usize),
}

pub struct Harvester<'a> {
    source: &'a dyn ListingSource,
    listings: &'a dyn ListingRepo,
    throttle: Throttle,
}

impl<'a> Harvester<'a> {
    pub fn new(
        source: &'a dyn ListingSource,
        listings: &'a dyn ListingRepo,
        throttle: Throttle,
    ) -> Self {
        Self {
            source,
            listings,
            throttle,
        }
    }

    pub fn listings(&self) -> &dyn ListingRepo {
        self.listings
    }

    /// Produce the listing file for `date`.
    ///
    /// Any page fetch that exhausts its retries, or a later page that comes
    /// back without disclosures, fails the whole date and nothing is written,
    /// so a listing file on disk is always complete.
    pub async fn harvest(&self, date: ListingDate) -> Result<HarvestOutcome, PipelineError> {
        if self.listings.exists(date) {
            info!(date = %date, "listing already harvested");
            return Ok(HarvestOutcome::Skipped);
        }

        let link_base = self.source.link_base();
        let first = self.source.listing_page(date, 1).await?;
        let (total_count, mut rows) = match parse_listing_page(&first, date, link_base) {
            ListingPage::NoDisclosures => {
                self.listings.save(date, &[])?;
                info!(date = %date, "no disclosures; wrote empty listing");
                return Ok(HarvestOutcome::Empty);
            }
            ListingPage::Listing { total_count, rows } => (total_count, rows),
        };

        let pages = total_pages(total_count);
        info!(date = %date, total_count, pages, "listing found");

        for page in 2..=pages {
            self.throttle.pause().await;
            let html = self.source.listing_page(date, page).await?;
            match parse_listing_page(&html, date, link_base) {
                ListingPage::Listing { rows: more, .. } => {
                    info!(date = %date, page, rows = more.len(), "parsed page");
                    rows.extend(more);
                }
                ListingPage::NoDisclosures => {
                    return Err(PipelineError::IncompleteListing { date, page });
                }
            }
        }

        if total_count > 0 && rows.len() != total_count {
            warn!(date = %date, total_count, parsed = rows.len(), "row count differs from pager total");
        }
        self.listings.save(date, &rows)?;
        info!(date = %date, rows = rows.len(), "listing saved");
        Ok(HarvestOutcome::Saved(rows.len()))
    }
}
