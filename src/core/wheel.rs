//! Wheel artifacts and their metadata.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;

use crate::core::name::normalize;
use crate::core::platform::{PlatformClassifier, PlatformTag};
use crate::error::GenerateError;
use crate::sources::MetadataInspector;
use crate::util::hash::sha256_file;

/// The `name-version-` components of a wheel file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelFilename<'a> {
    pub name: &'a str,
    pub version: &'a str,
}

impl<'a> WheelFilename<'a> {
    /// Split a wheel file name (`name-version-tags.whl`).
    pub fn parse(filename: &'a str) -> Result<Self, GenerateError> {
        let mut parts = filename.splitn(3, '-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(version), Some(_)) if !name.is_empty() && !version.is_empty() => {
                Ok(WheelFilename { name, version })
            }
            _ => Err(GenerateError::InvalidWheelFilename(filename.to_string())),
        }
    }

    /// Prefix shared by every build of this release.
    pub fn release_prefix(&self) -> String {
        format!("{}-{}-", self.name, self.version)
    }
}

/// Last path segment of a URL or path.
pub fn file_name_of(locator: &str) -> &str {
    locator.rsplit('/').next().unwrap_or(locator)
}

/// Requirements declared by a wheel, as reported by the inspector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WheelMetadata {
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub extras: BTreeMap<String, Vec<String>>,
}

impl WheelMetadata {
    /// Sort every list so the metadata no longer depends on inspector order.
    pub fn sorted(mut self) -> Self {
        self.requires.sort();
        for deps in self.extras.values_mut() {
            deps.sort();
        }
        self
    }
}

/// Where the build gets a wheel from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// Downloaded by Bazel from the locator URL.
    Remote,
    /// Checked into the wheel directory at `path`.
    Vendored { path: PathBuf },
}

/// One concrete wheel file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelArtifact {
    locator: String,
    filename: String,
    platform: PlatformTag,
    sha256: String,
    metadata: WheelMetadata,
    storage: Storage,
}

impl WheelArtifact {
    /// Build the record for the wheel file at `path`.
    ///
    /// `path` must be the file's final resting place: the digest is taken
    /// from its bytes now. The inspector is invoked exactly once.
    pub fn build(
        path: &Path,
        locator: impl Into<String>,
        storage: Storage,
        classifier: &PlatformClassifier,
        inspector: &dyn MetadataInspector,
    ) -> Result<Self> {
        let locator = locator.into();
        let filename = file_name_of(&locator).to_string();
        WheelFilename::parse(&filename)?;

        let sha256 = sha256_file(path)?;
        let metadata = inspector.inspect(path)?.sorted();

        Ok(WheelArtifact {
            platform: classifier.classify(&filename),
            locator,
            filename,
            sha256,
            metadata,
            storage,
        })
    }

    /// Assemble a record from already known parts.
    pub fn from_parts(
        locator: impl Into<String>,
        platform: PlatformTag,
        sha256: impl Into<String>,
        metadata: WheelMetadata,
        storage: Storage,
    ) -> Self {
        let locator = locator.into();
        WheelArtifact {
            filename: file_name_of(&locator).to_string(),
            locator,
            platform,
            sha256: sha256.into(),
            metadata: metadata.sorted(),
            storage,
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn platform(&self) -> PlatformTag {
        self.platform
    }

    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    pub fn requires(&self) -> &[String] {
        &self.metadata.requires
    }

    pub fn extras(&self) -> &BTreeMap<String, Vec<String>> {
        &self.metadata.extras
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn is_vendored(&self) -> bool {
        matches!(self.storage, Storage::Vendored { .. })
    }

    /// Distribution name from the file name (`Foo_Bar` in `Foo_Bar-1.0-...`).
    pub fn package_name(&self) -> &str {
        self.filename.split('-').next().unwrap_or(&self.filename)
    }

    /// Name of the rule that makes this wheel available to Bazel.
    pub fn rule_name(&self, workspace_prefix: &str) -> String {
        let mut name = format!("{}{}", workspace_prefix, normalize(self.package_name()));
        if let Some(label) = self.platform.label() {
            name.push_str("__");
            name.push_str(label);
        }
        name
    }

    /// Label referring to the wheel file from a library target.
    pub fn target_ref(&self, workspace_prefix: &str) -> String {
        match self.storage {
            Storage::Vendored { .. } => format!(":{}", self.rule_name(workspace_prefix)),
            Storage::Remote => format!("@{}//file", self.rule_name(workspace_prefix)),
        }
    }
}
