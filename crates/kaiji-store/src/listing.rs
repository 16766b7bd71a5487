//! Daily listing files: one CSV per date, whose existence marks the date as harvested.

use std::path::{Path, PathBuf};

use kaiji_core::{DisclosureRecord, LISTING_COLUMNS, ListingDate};
use tracing::{debug, info};

use crate::StoreError;
use crate::atomic::write_atomic;

const UTF8_BOM: &str = "\u{feff}";
const FILE_PREFIX: &str = "tdnet_";
const FILE_SUFFIX: &str = ".csv";

/// Storage for daily listings, keyed by date.
pub trait ListingRepo: Send + Sync {
    /// Whether the listing for `date` has been persisted (possibly empty).
    fn exists(&self, date: ListingDate) -> bool;

    fn load(&self, date: ListingDate) -> Result<Vec<DisclosureRecord>, StoreError>;

    /// Persist the complete listing for `date`. Zero records still produce a
    /// header-only file.
    fn save(&self, date: ListingDate, records: &[DisclosureRecord]) -> Result<(), StoreError>;

    /// All dates with a persisted listing, ascending.
    fn dates(&self) -> Result<Vec<ListingDate>, StoreError>;
}

/// CSV files named `tdnet_YYYYMMDD.csv` in one directory.
pub struct FsListingRepo {
    dir: PathBuf,
}

impl FsListingRepo {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, date: ListingDate) -> PathBuf {
        self.dir
            .join(format!("{FILE_PREFIX}{}{FILE_SUFFIX}", date.compact()))
    }
}

impl ListingRepo for FsListingRepo {
    fn exists(&self, date: ListingDate) -> bool {
        self.path_for(date).is_file()
    }

    fn load(&self, date: ListingDate) -> Result<Vec<DisclosureRecord>, StoreError> {
        let path = self.path_for(date);
        if !path.is_file() {
            return Err(StoreError::ListingNotFound(path));
        }
        let text = std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        let records = decode_listing(&text, &path)?;
        debug!(date = %date, count = records.len(), "loaded listing");
        Ok(records)
    }

    fn save(&self, date: ListingDate, records: &[DisclosureRecord]) -> Result<(), StoreError> {
        let path = self.path_for(date);
        let bytes = encode_listing(records)?;
        write_atomic(&path, &bytes)?;
        info!(date = %date, count = records.len(), path = %path.display(), "saved listing");
        Ok(())
    }

    fn dates(&self) -> Result<Vec<ListingDate>, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.dir, e)),
        };

        let mut dates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(date) = date_from_file_name(name) {
                dates.push(date);
            }
        }
        dates.sort();
        Ok(dates)
    }
}

fn date_from_file_name(name: &str) -> Option<ListingDate> {
    let stem = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    if stem.len() != 8 {
        return None;
    }
    ListingDate::parse(stem).ok()
}

/// Serialize a listing as BOM-prefixed UTF-8 CSV with the fixed header.
pub fn encode_listing(records: &[DisclosureRecord]) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(UTF8_BOM.as_bytes().to_vec());
    writer.write_record(LISTING_COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| StoreError::Other(format!("flushing csv writer: {e}")))
}

/// Parse a listing CSV, with or without a leading BOM.
pub fn decode_listing(text: &str, path: &Path) -> Result<Vec<DisclosureRecord>, StoreError> {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new().from_reader(text.as_bytes());

    let headers = reader.headers()?;
    if !headers.iter().eq(LISTING_COLUMNS.iter().copied()) {
        return Err(StoreError::ListingHeader {
            path: path.to_path_buf(),
            found: headers.iter().map(str::to_string).collect(),
        });
    }

    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}
