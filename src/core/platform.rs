//! Platform classification of wheel file names.
//!
//! A wheel is either built for one of the platforms in a fixed table, or it
//! is universal (pure Python, or a platform we don't generate rules for).
//! Classification is a substring match of each platform's PEP 425 tag
//! fragment against the file name, in table order.

use std::fmt;

/// One entry of the platform table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformDef {
    /// Bazel config setting name (`osx`, `linux`).
    pub label: &'static str,
    /// Fragment of the wheel file name identifying the platform.
    pub token: &'static str,
}

/// Platforms for which per-platform wheels are collected.
///
/// The tokens only match CPython 2.7 wheels built against the matching ABI.
pub const DEFAULT_PLATFORMS: &[PlatformDef] = &[
    PlatformDef {
        label: "osx",
        token: "-cp27-cp27m-macosx_10_",
    },
    PlatformDef {
        label: "linux",
        token: "-cp27-cp27mu-manylinux1_x86_64.",
    },
];

/// Logical target platform of a wheel.
///
/// Specific platforms order by their position in the table; `Universal`
/// sorts after all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlatformTag {
    Specific { index: usize, label: &'static str },
    Universal,
}

impl PlatformTag {
    /// Bazel label fragment, `None` for universal wheels.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            PlatformTag::Specific { label, .. } => Some(label),
            PlatformTag::Universal => None,
        }
    }

    pub fn is_universal(&self) -> bool {
        matches!(self, PlatformTag::Universal)
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformTag::Specific { label, .. } => write!(f, "{}", label),
            PlatformTag::Universal => write!(f, "universal"),
        }
    }
}

/// Maps wheel file names to platform tags using a fixed table.
#[derive(Debug, Clone, Copy)]
pub struct PlatformClassifier {
    defs: &'static [PlatformDef],
}

impl PlatformClassifier {
    pub fn new(defs: &'static [PlatformDef]) -> Self {
        PlatformClassifier { defs }
    }

    /// Classify a wheel file name. Never fails.
    pub fn classify(&self, filename: &str) -> PlatformTag {
        self.defs
            .iter()
            .enumerate()
            .find(|(_, def)| filename.contains(def.token))
            .map(|(index, def)| PlatformTag::Specific {
                index,
                label: def.label,
            })
            .unwrap_or(PlatformTag::Universal)
    }

    /// Whether `filename` carries the token of the given platform.
    pub fn matches(&self, tag: PlatformTag, filename: &str) -> bool {
        match tag {
            PlatformTag::Specific { index, .. } => self
                .defs
                .get(index)
                .is_some_and(|def| filename.contains(def.token)),
            PlatformTag::Universal => false,
        }
    }

    /// All specific platforms, in table order.
    pub fn platforms(&self) -> impl Iterator<Item = PlatformTag> + '_ {
        self.defs
            .iter()
            .enumerate()
            .map(|(index, def)| PlatformTag::Specific {
                index,
                label: def.label,
            })
    }

    /// Number of specific platforms.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl Default for PlatformClassifier {
    fn default() -> Self {
        PlatformClassifier::new(DEFAULT_PLATFORMS)
    }
}
