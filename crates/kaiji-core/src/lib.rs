pub mod date;
pub mod record;

pub use date::{DateError, ListingDate};
pub use record::{
    AlertRecord, DisclosureRecord, EXTRACTION_FAILED_SUMMARY, LISTING_COLUMNS,
    RESERVED_RATIONALE_PREFIX, TOMBSTONE_RATIONALE,
};
