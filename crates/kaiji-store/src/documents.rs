//! Downloaded source documents, named deterministically per alert.

use std::path::{Path, PathBuf};

use kaiji_core::ListingDate;
use tracing::debug;

use crate::StoreError;
use crate::atomic::write_atomic;

/// `YYYYMMDD_<code>_<seq:03>.pdf`; `seq` counts same-day documents of one issuer from 1.
pub fn document_name(date: ListingDate, code: &str, seq: u32) -> String {
    format!("{}_{code}_{seq:03}.pdf", date.compact())
}

/// Storage for downloaded documents.
///
/// Documents are addressed by file name when written and by their stored path
/// (the value kept in an alert's `pdf_path`) when read back.
pub trait DocumentRepo: Send + Sync {
    fn exists(&self, name: &str) -> bool;

    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Path recorded in the alert store for `name`.
    fn stored_path(&self, name: &str) -> String;

    /// Read a document by stored path. `Ok(None)` when it is not on disk.
    fn read(&self, stored_path: &str) -> Result<Option<Vec<u8>>, StoreError>;
}

/// Documents in `<root>/<subdir>`, with stored paths relative to `root`.
pub struct FsDocumentRepo {
    root: PathBuf,
    subdir: PathBuf,
}

impl FsDocumentRepo {
    pub fn new(root: impl Into<PathBuf>, subdir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            subdir: subdir.into(),
        }
    }

    pub fn dir(&self) -> PathBuf {
        self.root.join(&self.subdir)
    }

    fn resolve(&self, stored_path: &str) -> PathBuf {
        let p = Path::new(stored_path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }
}

impl DocumentRepo for FsDocumentRepo {
    fn exists(&self, name: &str) -> bool {
        self.dir().join(name).is_file()
    }

    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.dir().join(name);
        write_atomic(&path, bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "saved document");
        Ok(())
    }

    fn stored_path(&self, name: &str) -> String {
        // Forward slashes keep the store portable between platforms.
        let rel = self.subdir.join(name);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn read(&self, stored_path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.resolve(stored_path);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}
