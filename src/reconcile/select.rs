//! Choosing sibling wheels for the other platforms.
//!
//! Everything here is a pure function of the link index: no I/O happens
//! until the chosen candidates are materialized by the reconciler.

use std::collections::BTreeMap;
use std::fmt;

use crate::core::platform::{PlatformClassifier, PlatformTag};
use crate::core::wheel::WheelFilename;
use crate::error::GenerateError;
use crate::sources::LinkIndex;

/// A wheel pip reported a link for but did not necessarily download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub filename: String,
    pub locator: String,
}

/// Non-fatal findings made while reconciling platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Two wheels matched the same platform; one was dropped.
    DuplicateCandidate {
        platform: PlatformTag,
        kept: String,
        discarded: String,
    },
    /// Not every platform has a wheel; the package probably needs compiling.
    IncompleteCoverage {
        filename: String,
        found: usize,
        expected: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DuplicateCandidate {
                platform,
                kept,
                discarded,
            } => write!(
                f,
                "two acceptable {} wheels found: picking {} instead of {}",
                platform, kept, discarded
            ),
            Warning::IncompleteCoverage {
                filename,
                found,
                expected,
            } => write!(
                f,
                "could not find wheels for all platforms for {} ({} of {}); needs compilation?",
                filename, found, expected
            ),
        }
    }
}

/// Order two candidates for the same platform: `(kept, discarded)`.
///
/// The lexicographically larger locator is kept, whichever order the two
/// arrive in.
pub fn prefer<'a>(a: &'a Candidate, b: &'a Candidate) -> (&'a Candidate, &'a Candidate) {
    if b.locator > a.locator {
        (b, a)
    } else {
        (a, b)
    }
}

/// Siblings chosen for one discovered wheel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// One candidate per platform other than the discovered wheel's own.
    pub siblings: BTreeMap<PlatformTag, Candidate>,
    pub warnings: Vec<Warning>,
}

/// Find the other-platform builds of the release `filename` belongs to.
///
/// Universal wheels need no siblings and produce an empty selection.
pub fn select_siblings(
    classifier: &PlatformClassifier,
    links: &LinkIndex,
    filename: &str,
) -> Result<Selection, GenerateError> {
    let held = classifier.classify(filename);
    if held.is_universal() {
        return Ok(Selection::default());
    }

    let prefix = WheelFilename::parse(filename)?.release_prefix();
    let mut selection = Selection::default();

    for (name, url) in links.iter().filter(|(name, _)| name.starts_with(&prefix)) {
        for platform in classifier.platforms().filter(|p| *p != held) {
            if !classifier.matches(platform, name) {
                continue;
            }

            let candidate = Candidate {
                filename: name.to_string(),
                locator: url.to_string(),
            };
            let chosen = match selection.siblings.remove(&platform) {
                Some(existing) => {
                    let (kept, discarded) = prefer(&existing, &candidate);
                    selection.warnings.push(Warning::DuplicateCandidate {
                        platform,
                        kept: kept.filename.clone(),
                        discarded: discarded.filename.clone(),
                    });
                    kept.clone()
                }
                None => candidate,
            };
            selection.siblings.insert(platform, chosen);
        }
    }

    let found = selection.siblings.len() + 1;
    if found != classifier.len() {
        selection.warnings.push(Warning::IncompleteCoverage {
            filename: filename.to_string(),
            found,
            expected: classifier.len(),
        });
    }

    Ok(selection)
}
