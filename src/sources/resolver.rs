//! Running pip to resolve requirements into wheels.
//!
//! `pip wheel` leaves the resolved wheels in a directory but forgets where it
//! downloaded them from. With `--verbose` it logs every candidate link it
//! considers, so the original URLs are recovered by scanning its stdout.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Instant;

use anyhow::{Context, Result};
use regex::Regex;
use url::Url;

use crate::core::wheel::file_name_of;
use crate::error::GenerateError;
use crate::util::process::ProcessBuilder;

/// pip progress lines naming a wheel URL.
static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(Found|Skipping) link\s*(http[^ #]+\.whl)").expect("valid link pattern")
});

/// Wheel file name → URLs it was found at, ordered by file name.
///
/// The same file can be offered by several indexes or mirrors; every URL is
/// kept so the choice between them stays deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkIndex {
    links: BTreeMap<String, BTreeSet<String>>,
}

impl LinkIndex {
    pub fn new() -> Self {
        LinkIndex::default()
    }

    /// Record a URL under its file name.
    pub fn insert(&mut self, url: impl Into<String>) {
        let url = url.into();
        let filename = file_name_of(&url).to_string();
        self.links.entry(filename).or_default().insert(url);
    }

    /// Feed one line of pip output; non-matching lines are ignored.
    pub fn scan_line(&mut self, line: &str) -> bool {
        let Some(link) = LINK_PATTERN.captures(line).and_then(|c| c.get(2)) else {
            return false;
        };
        let has_file = Url::parse(link.as_str())
            .ok()
            .and_then(|url| url.path_segments()?.last().map(|s| s.ends_with(".whl")))
            .unwrap_or(false);
        if !has_file {
            tracing::debug!("ignoring malformed link: {}", link.as_str());
            return false;
        }
        self.insert(link.as_str());
        true
    }

    /// URL for a wheel file name, if pip reported one.
    ///
    /// With several URLs for one file the lexicographically largest is used,
    /// the same rule that breaks ties between sibling candidates.
    pub fn get(&self, filename: &str) -> Option<&str> {
        self.links
            .get(filename)
            .and_then(|urls| urls.last())
            .map(String::as_str)
    }

    /// All (file name, URL) pairs, ordered by file name then URL.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.links.iter().flat_map(|(filename, urls)| {
            urls.iter()
                .map(move |url| (filename.as_str(), url.as_str()))
        })
    }

    /// Number of distinct wheel file names.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for LinkIndex {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut index = LinkIndex::new();
        for url in iter {
            index.insert(url);
        }
        index
    }
}

/// Resolves a requirements file into wheels.
pub trait Resolver: Sync {
    /// Place the resolved wheels in `wheel_dir` and return the URLs seen.
    fn resolve(&self, requirements: &Path, wheel_dir: &Path) -> Result<LinkIndex>;
}

/// Resolver backed by `python -m pip wheel`.
#[derive(Debug, Clone)]
pub struct PipResolver {
    python: PathBuf,
    verbose: bool,
}

impl PipResolver {
    pub fn new(python: impl Into<PathBuf>, verbose: bool) -> Self {
        PipResolver {
            python: python.into(),
            verbose,
        }
    }

    fn command(&self, requirements: &Path, wheel_dir: &Path) -> ProcessBuilder {
        // Link lines are read as UTF-8 whatever the locale.
        ProcessBuilder::new(&self.python)
            .env("PYTHONIOENCODING", "utf-8")
            .args(["-m", "pip", "wheel", "--verbose", "--disable-pip-version-check"])
            .arg("--requirement")
            .arg(requirements)
            .arg("--wheel-dir")
            .arg(wheel_dir)
    }
}

impl Resolver for PipResolver {
    fn resolve(&self, requirements: &Path, wheel_dir: &Path) -> Result<LinkIndex> {
        let pip = self.command(requirements, wheel_dir);
        tracing::info!("Running pip to resolve dependencies...");
        tracing::debug!("command: {}", pip.display_command());

        let start = Instant::now();
        let mut child = pip.spawn_piped()?;
        let stdout = child
            .stdout
            .take()
            .context("pip stdout was not captured")?;

        // Drain everything before waiting so pip never blocks on a full pipe.
        let mut links = LinkIndex::new();
        for line in BufReader::new(stdout).lines() {
            let line = line.context("failed to read pip output")?;
            if self.verbose {
                tracing::debug!("pip: {}", line);
            }
            links.scan_line(&line);
        }

        let status = child.wait().context("failed to wait for pip")?;
        if !status.success() {
            return Err(GenerateError::Subprocess {
                command: pip.display_command(),
                code: status.code(),
                stderr: "see pip output above".to_string(),
            }
            .into());
        }

        tracing::info!(
            "pip executed in {:.2?}, found {} wheel links",
            start.elapsed(),
            links.len()
        );
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_found_and_skipping() {
        let mut links = LinkIndex::new();
        assert!(links.scan_line(
            "  Found link https://files.example/packages/ab/six-1.11.0-py2.py3-none-any.whl#sha256=832d (from https://pypi.org/simple/six/), version: 1.11.0"
        ));
        assert!(links.scan_line(
            "Skipping link https://files.example/packages/cd/baz-1.0-cp27-cp27m-macosx_10_6_intel.whl; it is not compatible with this Python"
        ));

        assert_eq!(
            links.get("six-1.11.0-py2.py3-none-any.whl"),
            Some("https://files.example/packages/ab/six-1.11.0-py2.py3-none-any.whl")
        );
        assert_eq!(
            links.get("baz-1.0-cp27-cp27m-macosx_10_6_intel.whl"),
            Some("https://files.example/packages/cd/baz-1.0-cp27-cp27m-macosx_10_6_intel.whl")
        );
    }

    #[test]
    fn test_scan_ignores_other_lines() {
        let mut links = LinkIndex::new();
        for line in [
            "Collecting six",
            "  Found link https://files.example/six-1.11.0.tar.gz (from ...)",
            "Saved ./six-1.11.0-py2.py3-none-any.whl",
            "  Found link http:/six-1.11.0-py2.py3-none-any.whl",
            "",
        ] {
            assert!(!links.scan_line(line));
        }
        assert!(links.is_empty());
    }

    #[test]
    fn test_iter_is_sorted() {
        let links: LinkIndex = [
            "https://x/zeta-1.0-py2-none-any.whl",
            "https://x/alpha-1.0-py2-none-any.whl",
        ]
        .into_iter()
        .collect();
        let names: Vec<_> = links.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["alpha-1.0-py2-none-any.whl", "zeta-1.0-py2-none-any.whl"]);
    }

    #[test]
    fn test_mirrors_keep_every_url() {
        let links: LinkIndex = [
            "https://b.example/six-1.0-py2-none-any.whl",
            "https://a.example/six-1.0-py2-none-any.whl",
        ]
        .into_iter()
        .collect();

        assert_eq!(links.len(), 1);
        assert_eq!(links.iter().count(), 2);
        assert_eq!(
            links.get("six-1.0-py2-none-any.whl"),
            Some("https://b.example/six-1.0-py2-none-any.whl")
        );
    }

    #[test]
    fn test_pip_command_line() {
        let resolver = PipResolver::new("python3", false);
        let pip = resolver.command(Path::new("requirements.txt"), Path::new("/tmp/scratch"));
        assert_eq!(
            pip.get_args(),
            [
                "-m",
                "pip",
                "wheel",
                "--verbose",
                "--disable-pip-version-check",
                "--requirement",
                "requirements.txt",
                "--wheel-dir",
                "/tmp/scratch",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_pip_failure_is_fatal() {
        // `false` ignores its arguments and exits 1.
        let resolver = PipResolver::new("false", false);
        let tmp = tempfile::TempDir::new().unwrap();
        let err = resolver
            .resolve(&tmp.path().join("requirements.txt"), tmp.path())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GenerateError>(),
            Some(GenerateError::Subprocess { code: Some(1), .. })
        ));
    }
}
