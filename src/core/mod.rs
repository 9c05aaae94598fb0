//! Core data structures for wheelgen.
//!
//! This module contains the domain types everything else is built from:
//! - Package name normalization
//! - Platform classification of wheel file names
//! - Wheel artifacts and their metadata
//! - Aggregated per-package dependency records

pub mod dependency;
pub mod name;
pub mod platform;
pub mod wheel;

pub use dependency::{aggregate, Aggregation, InstalledPackageSet, PackageDependency};
pub use name::{base_name, normalize};
pub use platform::{PlatformClassifier, PlatformDef, PlatformTag, DEFAULT_PLATFORMS};
pub use wheel::{Storage, WheelArtifact, WheelFilename, WheelMetadata};
