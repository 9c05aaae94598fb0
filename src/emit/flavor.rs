//! Library rule flavors.

use std::fmt;
use std::str::FromStr;

use crate::error::GenerateError;

/// Which Bazel Python rule set the generated libraries target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RuleFlavor {
    /// `pyz_library` from rules_python_zip.
    #[default]
    Pyz,
    /// `pex_library` from bazel_rules_pex.
    Pex,
}

impl RuleFlavor {
    pub fn library_rule(&self) -> &'static str {
        match self {
            RuleFlavor::Pyz => "pyz_library",
            RuleFlavor::Pex => "pex_library",
        }
    }

    /// Attribute of the library rule listing the wheel files.
    pub fn wheel_attribute(&self) -> &'static str {
        match self {
            RuleFlavor::Pyz => "wheels",
            RuleFlavor::Pex => "eggs",
        }
    }

    /// Path of the .bzl file defining the library rule, within the rules workspace.
    pub fn bzl_path(&self) -> &'static str {
        match self {
            RuleFlavor::Pyz => "//rules_python_zip:rules_python_zip.bzl",
            RuleFlavor::Pex => "//bazel_rules_pex/pex:pex_rules.bzl",
        }
    }
}

impl FromStr for RuleFlavor {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pyz" => Ok(RuleFlavor::Pyz),
            "pex" => Ok(RuleFlavor::Pex),
            other => Err(GenerateError::config(format!(
                "rule flavor must be pyz or pex, got `{}`",
                other
            ))),
        }
    }
}

impl fmt::Display for RuleFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleFlavor::Pyz => write!(f, "pyz"),
            RuleFlavor::Pex => write!(f, "pex"),
        }
    }
}
