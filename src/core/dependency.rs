//! Per-package dependency records.
//!
//! Reconciliation produces one group of artifacts per wheel pip left in the
//! scratch directory. Aggregation merges those groups into exactly one
//! record per package, in an order that does not depend on the order the
//! groups were produced in.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::name::{base_name, normalize};
use crate::core::platform::PlatformTag;
use crate::core::wheel::WheelArtifact;
use crate::reconcile::Warning;

/// All wheels of one package, one per platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDependency {
    name: String,
    artifacts: Vec<WheelArtifact>,
}

impl PackageDependency {
    /// Create a record; artifacts are sorted by (platform, file name).
    pub fn new(name: impl Into<String>, mut artifacts: Vec<WheelArtifact>) -> Self {
        artifacts.sort_by(|a, b| (a.platform(), a.filename()).cmp(&(b.platform(), b.filename())));
        PackageDependency {
            name: name.into(),
            artifacts,
        }
    }

    /// Package name as spelled in the wheel file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the library target.
    pub fn library_name(&self) -> String {
        normalize(&self.name)
    }

    pub fn artifacts(&self) -> &[WheelArtifact] {
        &self.artifacts
    }

    /// The artifact whose requirements and extras describe the package.
    ///
    /// Platform builds of the same release normally declare identical
    /// requirements, so the first one in platform order stands in for all.
    pub fn canonical(&self) -> Option<&WheelArtifact> {
        self.artifacts.first()
    }

    pub fn is_platform_conditional(&self) -> bool {
        self.artifacts.len() > 1
    }
}

/// Base names of every package present in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledPackageSet {
    names: BTreeSet<String>,
}

impl InstalledPackageSet {
    pub fn new() -> Self {
        InstalledPackageSet::default()
    }

    /// Record a package. Any spelling of the name is accepted.
    pub fn insert(&mut self, name: &str) -> bool {
        self.names.insert(base_name(name))
    }

    /// Whether the package named by a requirement string is present.
    pub fn contains(&self, requirement: &str) -> bool {
        self.names.contains(&base_name(requirement))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for InstalledPackageSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = InstalledPackageSet::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

/// Result of [`aggregate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    /// One record per package, sorted by library name.
    pub dependencies: Vec<PackageDependency>,
    pub installed: InstalledPackageSet,
    /// Artifacts dropped because another artifact of the same package
    /// covered their platform.
    pub warnings: Vec<Warning>,
}

#[derive(Default)]
struct Group {
    name: Option<String>,
    by_platform: BTreeMap<PlatformTag, Vec<WheelArtifact>>,
}

/// Merge reconciled `(package, artifacts)` groups into dependency records.
///
/// Groups whose package names share a base name are merged. Should two
/// artifacts of a package land on the same platform, the one with the
/// larger locator is kept, matching the sibling tie-break, and each dropped
/// one yields a [`Warning::DuplicateCandidate`] keyed by locator.
pub fn aggregate<I>(groups: I) -> Aggregation
where
    I: IntoIterator<Item = (String, Vec<WheelArtifact>)>,
{
    let mut merged: BTreeMap<String, Group> = BTreeMap::new();

    for (package, artifacts) in groups {
        let group = merged.entry(base_name(&package)).or_default();
        // Spelling differences between groups must not leak into the output.
        if group.name.as_deref().map_or(true, |name| package.as_str() < name) {
            group.name = Some(package);
        }

        for artifact in artifacts {
            group
                .by_platform
                .entry(artifact.platform())
                .or_default()
                .push(artifact);
        }
    }

    let mut installed = InstalledPackageSet::new();
    let mut warnings = Vec::new();
    let mut dependencies = Vec::new();
    for group in merged.into_values() {
        let Some(name) = group.name else { continue };
        let mut chosen = Vec::new();
        for (platform, candidates) in group.by_platform {
            if let Some(kept) = keep_largest(platform, candidates, &mut warnings) {
                chosen.push(kept);
            }
        }
        installed.insert(&name);
        dependencies.push(PackageDependency::new(name, chosen));
    }
    dependencies.sort_by(|a, b| {
        a.library_name()
            .cmp(&b.library_name())
            .then_with(|| a.name().cmp(b.name()))
    });

    Aggregation {
        dependencies,
        installed,
        warnings,
    }
}

/// The candidate with the largest locator; every other distinct locator is
/// reported as a duplicate.
fn keep_largest(
    platform: PlatformTag,
    mut candidates: Vec<WheelArtifact>,
    warnings: &mut Vec<Warning>,
) -> Option<WheelArtifact> {
    candidates.sort_by(|a, b| a.locator().cmp(b.locator()));
    candidates.dedup_by(|a, b| a.locator() == b.locator());
    let kept = candidates.pop()?;
    for discarded in candidates.into_iter().rev() {
        let warning = Warning::DuplicateCandidate {
            platform,
            kept: kept.locator().to_string(),
            discarded: discarded.locator().to_string(),
        };
        tracing::warn!("{}", warning);
        warnings.push(warning);
    }
    Some(kept)
}
