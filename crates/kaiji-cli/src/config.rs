//! Data-directory layout and model settings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use kaiji_ai::{ClaudeClassifier, ClaudeSummarizer, MessagesClient};
use kaiji_store::{FsAlertRepo, FsDocumentRepo, FsListingRepo};
use tracing::info;

pub const LISTING_SUBDIR: &str = "output";
pub const ALERTS_FILE: &str = "alerts/scandal_alerts.json";
pub const DOCUMENT_SUBDIR: &str = "alerts/pdf";

/// Where every artifact lives under the data directory.
#[derive(Debug, Clone)]
pub struct Layout {
    pub data_dir: PathBuf,
    pub listing_dir: PathBuf,
}

impl Layout {
    /// `listing_dir` overrides `<data_dir>/output`.
    pub fn new(data_dir: &Path, listing_dir: Option<&Path>) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            listing_dir: listing_dir
                .map(Path::to_path_buf)
                .unwrap_or_else(|| data_dir.join(LISTING_SUBDIR)),
        }
    }

    pub fn listings(&self) -> FsListingRepo {
        FsListingRepo::new(self.listing_dir.clone())
    }

    pub fn alerts(&self) -> FsAlertRepo {
        FsAlertRepo::new(self.data_dir.join(ALERTS_FILE))
    }

    pub fn documents(&self) -> FsDocumentRepo {
        FsDocumentRepo::new(self.data_dir.clone(), DOCUMENT_SUBDIR)
    }
}

/// Settings for the language-model stages.
pub struct ModelConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Option<String>,
}

impl ModelConfig {
    /// Fails with an operator-facing message when no key is configured.
    pub fn client(&self) -> Result<MessagesClient> {
        let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            bail!("ANTHROPIC_API_KEY is not set; add it to .env or the environment");
        };
        info!(api_key = %preview(key), model = %self.model, "model configured");
        let mut client =
            MessagesClient::new(key, &self.model).context("building the Messages API client")?;
        if let Some(url) = &self.base_url {
            client = client.with_base_url(url);
        }
        Ok(client)
    }

    pub fn classifier(&self) -> Result<ClaudeClassifier> {
        Ok(ClaudeClassifier::new(self.client()?))
    }

    pub fn summarizer(&self) -> Result<ClaudeSummarizer> {
        Ok(ClaudeSummarizer::new(self.client()?))
    }
}

/// First five characters, then an ellipsis.
fn preview(val: &str) -> String {
    let head: String = val.chars().take(5).collect();
    format!("{head}...")
}
