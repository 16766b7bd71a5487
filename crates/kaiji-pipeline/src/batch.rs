//! Batch driver: harvest every date in an inclusive range.

use kaiji_core::ListingDate;
use tracing::{error, info};

use crate::{HarvestOutcome, Harvester};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
}

/// Harvest `dates` in order. A failed date is counted and the loop moves on;
/// it never aborts the batch.
pub async fn run_batch(harvester: &Harvester<'_>, dates: &[ListingDate]) -> BatchReport {
    let mut report = BatchReport {
        total: dates.len(),
        ..Default::default()
    };

    for (i, &date) in dates.iter().enumerate() {
        if harvester.listings().exists(date) {
            info!(date = %date, "listing exists, skipping");
            report.skipped += 1;
            continue;
        }

        info!(date = %date, progress = %format!("{}/{}", i + 1, report.total), "harvesting");
        match harvester.harvest(date).await {
            Ok(HarvestOutcome::Skipped) => report.skipped += 1,
            Ok(_) => report.succeeded += 1,
            Err(e) => {
                error!(date = %date, error = %e, "harvest failed");
                report.failed += 1;
            }
        }
    }

    info!(
        succeeded = report.succeeded,
        skipped = report.skipped,
        failed = report.failed,
        total = report.total,
        "batch complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Throttle;
    use crate::fakes::*;
    use kaiji_store::{ListingRepo, MemoryListingRepo};

    #[tokio::test]
    async fn failures_do_not_stop_the_batch() {
        let d1 = date("20260105");
        let d2 = date("20260106");
        let d3 = date("20260107");
        let d4 = date("20260108");
        // d2 already harvested, d3 has no scripted page and fails.
        let portal = ScriptedPortal::new()
            .page(d1, 1, listing_page_html(2, 0, 2))
            .page(d4, 1, no_data_page_html());
        let repo = MemoryListingRepo::new().with(d2, vec![]);
        let harvester = Harvester::new(&portal, &repo, Throttle::none());

        let dates = ListingDate::range(d1, d4).unwrap();
        let report = run_batch(&harvester, &dates).await;

        assert_eq!(
            report,
            BatchReport {
                succeeded: 2,
                skipped: 1,
                failed: 1,
                total: 4
            }
        );
        assert!(repo.exists(d1));
        assert!(!repo.exists(d3));
        assert!(repo.exists(d4));
    }

    #[tokio::test]
    async fn rerun_skips_completed_dates() {
        let d1 = date("20260105");
        let d2 = date("20260106");
        let portal = ScriptedPortal::new()
            .page(d1, 1, listing_page_html(1, 0, 1))
            .page(d2, 1, listing_page_html(1, 0, 1));
        let repo = MemoryListingRepo::new();
        let harvester = Harvester::new(&portal, &repo, Throttle::none());
        let dates = [d1, d2];

        run_batch(&harvester, &dates).await;
        let requests = portal.requests();
        let again = run_batch(&harvester, &dates).await;

        assert_eq!(again.skipped, 2);
        assert_eq!(again.succeeded, 0);
        assert_eq!(portal.requests(), requests);
    }
}
