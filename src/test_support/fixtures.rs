//! Test fixtures for common test scenarios.
//!
//! Wheel file names used across the tests, and helpers creating the files
//! a generation run expects to find on disk.

use std::fs;
use std::path::{Path, PathBuf};

/// Pure Python wheel, usable on every platform.
pub const UNIVERSAL_WHEEL: &str = "six-1.11.0-py2.py3-none-any.whl";

/// The macOS build of `baz`.
pub const OSX_WHEEL: &str = "baz-1.0-cp27-cp27m-macosx_10_6_intel.whl";

/// The Linux build of `baz`.
pub const LINUX_WHEEL: &str = "baz-1.0-cp27-cp27mu-manylinux1_x86_64.whl";

/// Index URL a fixture wheel is served from.
pub fn index_url(filename: &str) -> String {
    format!("https://files.example/packages/{}", filename)
}

/// Contents of a fixture wheel; distinct per file name so digests differ.
pub fn wheel_bytes(filename: &str) -> Vec<u8> {
    format!("wheel:{}", filename).into_bytes()
}

/// Write a fixture wheel into `dir` and return its path.
pub fn write_wheel(dir: &Path, filename: &str) -> PathBuf {
    let path = dir.join(filename);
    fs::write(&path, wheel_bytes(filename)).expect("failed to write fixture wheel");
    path
}

/// A project layout: requirements file, output directory and wheel
/// directory, all inside one temporary directory.
pub struct ProjectFixture {
    pub root: tempfile::TempDir,
    pub requirements: PathBuf,
    pub output_dir: PathBuf,
    pub wheel_dir: PathBuf,
}

impl ProjectFixture {
    pub fn new() -> Self {
        let root = tempfile::TempDir::new().expect("failed to create temp dir");
        let requirements = root.path().join("requirements.txt");
        let output_dir = root.path().join("third_party/pypi");
        let wheel_dir = output_dir.join("wheels");

        fs::write(&requirements, "six\nbaz\n").expect("failed to write requirements");
        fs::create_dir_all(&wheel_dir).expect("failed to create wheel dir");

        ProjectFixture {
            root,
            requirements,
            output_dir,
            wheel_dir,
        }
    }

    /// Path of the generated rules file under the default name.
    pub fn output_file(&self) -> PathBuf {
        self.output_dir.join("pypi_rules.bzl")
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}
