//! Platform reconciliation.
//!
//! pip only downloads the wheel for the machine it runs on. For packages
//! with compiled extensions the generated rules need a wheel for every
//! supported platform, so the reconciler finds the sibling builds of the
//! same release in pip's link log, fetches them, and applies the vendoring
//! policy to each.

pub mod select;
pub mod vendor;

use std::path::Path;

use anyhow::{Context, Result};

use crate::core::platform::PlatformClassifier;
use crate::core::wheel::{WheelArtifact, WheelFilename};
use crate::sources::{Downloader, LinkIndex, MetadataInspector};

pub use select::{prefer, select_siblings, Candidate, Selection, Warning};
pub use vendor::{Placement, VendorPolicy};

/// Directory inside the scratch directory receiving sibling downloads.
const SIBLINGS_DIR: &str = ".siblings";

/// All wheels found for one discovered wheel.
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// Distribution name as spelled in the wheel file name.
    pub package: String,
    /// One artifact per covered platform, sorted by (platform, file name).
    pub artifacts: Vec<WheelArtifact>,
    pub warnings: Vec<Warning>,
}

/// Reconciles discovered wheels against the link index.
pub struct Reconciler<'a> {
    classifier: PlatformClassifier,
    links: &'a LinkIndex,
    policy: &'a VendorPolicy,
    downloader: &'a dyn Downloader,
    inspector: &'a dyn MetadataInspector,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        classifier: PlatformClassifier,
        links: &'a LinkIndex,
        policy: &'a VendorPolicy,
        downloader: &'a dyn Downloader,
        inspector: &'a dyn MetadataInspector,
    ) -> Self {
        Reconciler {
            classifier,
            links,
            policy,
            downloader,
            inspector,
        }
    }

    /// Reconcile the wheel pip left at `wheel` in the `scratch` directory.
    pub fn reconcile(&self, wheel: &Path, scratch: &Path) -> Result<Reconciled> {
        let filename = wheel
            .file_name()
            .with_context(|| format!("not a file: {}", wheel.display()))?
            .to_string_lossy()
            .into_owned();
        let package = WheelFilename::parse(&filename)?.name.to_string();

        let link = self.links.get(&filename);
        let placement = self.policy.place(wheel, link.is_some())?;
        let discovered = WheelArtifact::build(
            &placement.path,
            link.unwrap_or(&filename),
            placement.storage,
            &self.classifier,
            self.inspector,
        )?;

        let selection = select_siblings(&self.classifier, self.links, &filename)?;
        for warning in &selection.warnings {
            tracing::warn!("{}", warning);
        }

        let mut artifacts = vec![discovered];
        if !selection.siblings.is_empty() {
            // One directory per discovered wheel keeps parallel downloads apart.
            let fetch_dir = scratch.join(SIBLINGS_DIR).join(&filename);
            std::fs::create_dir_all(&fetch_dir)
                .with_context(|| format!("failed to create {}", fetch_dir.display()))?;

            for candidate in selection.siblings.values() {
                artifacts.push(self.materialize(candidate, &fetch_dir)?);
            }
        }

        artifacts.sort_by(|a, b| {
            (a.platform(), a.filename()).cmp(&(b.platform(), b.filename()))
        });

        Ok(Reconciled {
            package,
            artifacts,
            warnings: selection.warnings,
        })
    }

    /// Fetch a sibling (unless vendored already) and build its record.
    fn materialize(&self, candidate: &Candidate, fetch_dir: &Path) -> Result<WheelArtifact> {
        let placement = match self.policy.reusable(&candidate.filename, true) {
            Some(existing) => {
                tracing::debug!("reusing vendored {}", existing.display());
                Placement {
                    path: existing.clone(),
                    storage: crate::core::wheel::Storage::Vendored { path: existing },
                }
            }
            None => {
                let dest = fetch_dir.join(&candidate.filename);
                self.downloader.download(&candidate.locator, &dest)?;
                self.policy.place(&dest, true)?
            }
        };

        WheelArtifact::build(
            &placement.path,
            candidate.locator.as_str(),
            placement.storage,
            &self.classifier,
            self.inspector,
        )
    }
}
