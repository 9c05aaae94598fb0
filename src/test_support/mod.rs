//! Test utilities and fakes for wheelgen unit tests.
//!
//! The resolver, inspector and downloader normally shell out to Python or
//! talk to an index. The fakes here stand in for them, record how they were
//! called, and can be told to fail.
//!
//! # Example
//!
//! ```rust,ignore
//! use wheelgen::test_support::{FakeDownloader, FakeInspector, index_url, OSX_WHEEL};
//!
//! let inspector = FakeInspector::new().with(OSX_WHEEL, &["six"], &[]);
//! let downloader = FakeDownloader::new().with(index_url(OSX_WHEEL), b"bytes");
//! ```

pub mod fixtures;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::Result;

use crate::core::wheel::WheelMetadata;
use crate::error::GenerateError;
use crate::sources::{Downloader, LinkIndex, MetadataInspector, Resolver};

// Re-export fixtures for convenience
pub use fixtures::*;

/// Inspector returning canned metadata per wheel file name.
///
/// Wheels without canned metadata have no requirements.
#[derive(Debug, Default)]
pub struct FakeInspector {
    metadata: HashMap<String, WheelMetadata>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl FakeInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canned metadata for `filename`.
    pub fn with(mut self, filename: &str, requires: &[&str], extras: &[(&str, &[&str])]) -> Self {
        let metadata = WheelMetadata {
            requires: requires.iter().map(|r| r.to_string()).collect(),
            extras: extras
                .iter()
                .map(|(name, deps)| (name.to_string(), deps.iter().map(|d| d.to_string()).collect()))
                .collect::<BTreeMap<_, _>>(),
        };
        self.metadata.insert(filename.to_string(), metadata);
        self
    }

    /// Make inspecting `filename` fail like a broken wheel tool would.
    pub fn failing(mut self, filename: &str) -> Self {
        self.failing.insert(filename.to_string());
        self
    }

    /// Number of inspections performed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MetadataInspector for FakeInspector {
    fn inspect(&self, wheel: &Path) -> Result<WheelMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let filename = wheel
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();

        if self.failing.contains(&filename) {
            return Err(GenerateError::MetadataParse {
                path: wheel.to_path_buf(),
                reason: "not a wheel".to_string(),
            }
            .into());
        }
        Ok(self.metadata.get(&filename).cloned().unwrap_or_default())
    }
}

/// Downloader serving bytes from memory.
///
/// Unknown URLs fail with a download error, like a 404 would.
#[derive(Debug, Default)]
pub struct FakeDownloader {
    responses: HashMap<String, Vec<u8>>,
    calls: Mutex<Vec<String>>,
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, body: &[u8]) -> Self {
        self.responses.insert(url.into(), body.to_vec());
        self
    }

    /// URLs requested so far, in request order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Downloader for FakeDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(url.to_string());
        let Some(body) = self.responses.get(url) else {
            return Err(GenerateError::Download {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            }
            .into());
        };
        std::fs::write(dest, body)?;
        Ok(())
    }
}

/// Resolver that "downloads" a fixed set of wheels and reports fixed links.
#[derive(Debug, Default)]
pub struct FakeResolver {
    wheels: Vec<String>,
    links: Vec<String>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A wheel pip leaves in the wheel directory.
    pub fn with_wheel(mut self, filename: &str) -> Self {
        self.wheels.push(filename.to_string());
        self
    }

    /// A link pip reports in its log.
    pub fn with_link(mut self, url: impl Into<String>) -> Self {
        self.links.push(url.into());
        self
    }

    /// A wheel downloaded from the index: both the file and its link.
    pub fn with_indexed_wheel(self, filename: &str) -> Self {
        self.with_wheel(filename).with_link(index_url(filename))
    }

    /// Make resolution fail like a pip error would.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Resolver for FakeResolver {
    fn resolve(&self, _requirements: &Path, wheel_dir: &Path) -> Result<LinkIndex> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GenerateError::Subprocess {
                command: "python -m pip wheel".to_string(),
                code: Some(1),
                stderr: "No matching distribution found".to_string(),
            }
            .into());
        }

        for filename in &self.wheels {
            write_wheel(wheel_dir, filename);
        }
        Ok(self.links.iter().cloned().collect())
    }
}
