use kaiji_ai::AiError;
use kaiji_core::ListingDate;
use kaiji_harvest::FetchError;
use kaiji_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("classification failed: {0}")]
    Classifier(#[from] AiError),

    #[error("no listing file for {0}; harvest it first")]
    MissingListing(ListingDate),

    #[error("page {page} of {date} reported no disclosures; listing would be incomplete")]
    IncompleteListing { date: ListingDate, page: usize },
}
