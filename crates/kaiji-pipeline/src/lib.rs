//! Pipeline stages. Each stage reads and writes only through the store
//! traits, so every stage can be re-run and picks up from whatever is on disk.

mod error;
pub use error::PipelineError;

pub mod batch;
pub mod enrich;
pub mod extract;
pub mod harvest;
pub mod throttle;
pub mod triage;

#[cfg(test)]
mod fakes;

pub use batch::{BatchReport, run_batch};
pub use enrich::{EnrichReport, Enricher};
pub use extract::{PdfTextExtractor, TextExtractor};
pub use harvest::{HarvestOutcome, Harvester};
pub use throttle::Throttle;
pub use triage::{TriageEngine, TriageOutcome, TriageSummary};
