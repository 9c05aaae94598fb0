//! Fetching wheels over HTTP.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::error::GenerateError;

/// Network timeout for a single wheel download.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Fetches a URL into a local file.
pub trait Downloader: Sync {
    /// Download `url` to `dest`, replacing any existing file.
    fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Downloader using a blocking `reqwest` client.
pub struct HttpDownloader {
    client: reqwest::blocking::Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .user_agent(concat!("wheelgen/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(HttpDownloader { client })
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        tracing::info!("Downloading {}", url);

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| GenerateError::Download {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(GenerateError::Download {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            }
            .into());
        }

        let mut file = File::create(dest)
            .with_context(|| format!("failed to create {}", dest.display()))?;
        response
            .copy_to(&mut file)
            .map_err(|e| GenerateError::Download {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        file.sync_all()
            .with_context(|| format!("failed to flush {}", dest.display()))?;

        Ok(())
    }
}
