//! Reading a wheel's declared requirements.
//!
//! The actual parsing of wheel metadata is done by a small Python helper
//! (`wheeltool.py`) which prints `{"requires": [...], "extras": {...}}`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::Result;

use crate::core::wheel::WheelMetadata;
use crate::error::GenerateError;
use crate::util::process::ProcessBuilder;

/// Extracts requirement metadata from a wheel file.
pub trait MetadataInspector: Sync {
    fn inspect(&self, wheel: &Path) -> Result<WheelMetadata>;
}

impl<T: MetadataInspector + ?Sized> MetadataInspector for &T {
    fn inspect(&self, wheel: &Path) -> Result<WheelMetadata> {
        (**self).inspect(wheel)
    }
}

/// Inspector running `python <wheel_tool> <wheel>`.
#[derive(Debug, Clone)]
pub struct WheelToolInspector {
    python: PathBuf,
    wheel_tool: PathBuf,
}

impl WheelToolInspector {
    pub fn new(python: impl Into<PathBuf>, wheel_tool: impl Into<PathBuf>) -> Self {
        WheelToolInspector {
            python: python.into(),
            wheel_tool: wheel_tool.into(),
        }
    }
}

/// Parse the wheel tool's JSON output.
pub fn parse_metadata(wheel: &Path, output: &[u8]) -> Result<WheelMetadata, GenerateError> {
    serde_json::from_slice(output).map_err(|e| GenerateError::MetadataParse {
        path: wheel.to_path_buf(),
        reason: format!("{} in output {:?}", e, String::from_utf8_lossy(output)),
    })
}

impl MetadataInspector for WheelToolInspector {
    fn inspect(&self, wheel: &Path) -> Result<WheelMetadata> {
        let start = Instant::now();
        let output = ProcessBuilder::new(&self.python)
            .arg(&self.wheel_tool)
            .arg(wheel)
            .exec_and_check()?;

        tracing::debug!(
            "wheeltool {} took {:.2?}",
            wheel.file_name().unwrap_or_default().to_string_lossy(),
            start.elapsed()
        );

        Ok(parse_metadata(wheel, &output.stdout)?)
    }
}

/// Memoizes another inspector by wheel file name.
///
/// Wheel file names identify a build uniquely, so the same wheel reached
/// twice in a run (for example as the sibling of two discovered wheels) is
/// only inspected once. Concurrent lookups of one wheel wait for the first.
pub struct CachingInspector<I> {
    inner: I,
    cache: Mutex<HashMap<String, Arc<Mutex<Option<WheelMetadata>>>>>,
}

impl<I: MetadataInspector> CachingInspector<I> {
    pub fn new(inner: I) -> Self {
        CachingInspector {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &I {
        &self.inner
    }
}

impl<I: MetadataInspector> MetadataInspector for CachingInspector<I> {
    fn inspect(&self, wheel: &Path) -> Result<WheelMetadata> {
        let key = wheel
            .file_name()
            .unwrap_or(wheel.as_os_str())
            .to_string_lossy()
            .into_owned();

        let slot = Arc::clone(
            self.cache
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .entry(key)
                .or_default(),
        );

        let mut entry = slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(hit) = entry.as_ref() {
            return Ok(hit.clone());
        }

        // Failures are not cached; the run aborts on the first one anyway.
        let metadata = self.inner.inspect(wheel)?;
        *entry = Some(metadata.clone());
        Ok(metadata)
    }
}
