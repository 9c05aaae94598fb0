//! wheelgen - Bazel rules for Python wheels
//!
//! This crate turns a pip requirements file into a `.bzl` file declaring one
//! library target per package, backed by the exact wheel files for every
//! supported platform, either downloaded by Bazel or vendored next to the
//! generated rules.

pub mod core;
pub mod emit;
pub mod error;
pub mod ops;
pub mod reconcile;
pub mod sources;
pub mod util;

/// Test utilities and fakes for wheelgen unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides fake resolvers, inspectors and downloaders
/// plus on-disk wheel fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{PackageDependency, PlatformTag, WheelArtifact};
pub use error::GenerateError;
pub use ops::{generate, GenerateOptions, GenerateReport};
