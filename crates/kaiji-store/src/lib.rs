//! Storage layer: daily listing CSVs, the cumulative alert store (JSON), and
//! downloaded documents. The filesystem is the pipeline's only coordination
//! medium; each artifact's presence is what makes a stage resumable.

mod atomic;
mod error;
pub use error::StoreError;

pub mod alerts;
pub mod documents;
pub mod listing;
pub mod memory;

pub use alerts::{AlertRepo, FsAlertRepo, pending_summaries, triaged_dates};
pub use documents::{DocumentRepo, FsDocumentRepo, document_name};
pub use listing::{FsListingRepo, ListingRepo};
pub use memory::{MemoryAlertRepo, MemoryDocumentRepo, MemoryListingRepo};
