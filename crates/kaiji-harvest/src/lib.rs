//! Disclosure portal access: listing pages, row parsing, and document download.

mod error;
pub mod parse;
pub mod portal;
pub mod retry;

pub use error::FetchError;
pub use parse::{ListingPage, PAGE_SIZE, parse_listing_page, total_pages};
pub use portal::{DocumentSource, ListingSource, PORTAL_BASE_URL, PortalClient};
pub use retry::RetryPolicy;
