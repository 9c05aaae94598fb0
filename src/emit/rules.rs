//! Logical model of the generated Starlark and its rendering.

use std::fmt;

use crate::emit::flavor::RuleFlavor;

/// Condition label used when no platform condition matches.
pub const DEFAULT_CONDITION: &str = "//conditions:default";

const INDENT: &str = "    ";

/// How a library target refers to its wheel files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WheelSelection {
    /// A single wheel, used on every platform.
    Direct(String),
    /// `(condition, wheels)` branches, rendered as a `select()`.
    Select(Vec<(String, Vec<String>)>),
}

/// A `pyz_library` or `pex_library` target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryTarget {
    pub flavor: RuleFlavor,
    pub name: String,
    /// `None` for extras targets, which only aggregate other libraries.
    pub wheels: Option<WheelSelection>,
    pub zip_safe: bool,
    /// Target names, without the leading `:`.
    pub deps: Vec<String>,
}

impl fmt::Display for LibraryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attr = self.flavor.wheel_attribute();

        writeln!(f, "{INDENT}{}(", self.flavor.library_rule())?;
        writeln!(f, "{INDENT}{INDENT}name=\"{}\",", self.name)?;
        match &self.wheels {
            Some(WheelSelection::Direct(wheel)) => {
                writeln!(f, "{INDENT}{INDENT}{}=[\"{}\"],", attr, wheel)?;
            }
            Some(WheelSelection::Select(branches)) => {
                writeln!(f, "{INDENT}{INDENT}{}=select({{", attr)?;
                for (condition, wheels) in branches {
                    writeln!(
                        f,
                        "{INDENT}{INDENT}{INDENT}{INDENT}\"{}\": {},",
                        condition,
                        string_list(wheels)
                    )?;
                }
                writeln!(f, "{INDENT}{INDENT}}}),")?;
            }
            None => {}
        }
        if !self.zip_safe {
            writeln!(f, "{INDENT}{INDENT}zip_safe=False,")?;
        }
        writeln!(f, "{INDENT}{INDENT}deps=[")?;
        for dep in &self.deps {
            writeln!(f, "{INDENT}{INDENT}{INDENT}\":{}\",", dep)?;
        }
        writeln!(f, "{INDENT}{INDENT}],")?;
        writeln!(f, "{INDENT}{INDENT}licenses=[\"notice\"],")?;
        writeln!(f, "{INDENT}{INDENT}visibility=[\"//visibility:public\"],")?;
        writeln!(f, "{INDENT})")
    }
}

/// A rule making one wheel file available to the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileRule {
    /// Vendored wheel; `src` is relative to the generated file's package.
    Filegroup { name: String, src: String },
    /// Remote wheel fetched by Bazel.
    HttpFile {
        name: String,
        url: String,
        sha256: String,
    },
}

impl FileRule {
    pub fn name(&self) -> &str {
        match self {
            FileRule::Filegroup { name, .. } | FileRule::HttpFile { name, .. } => name,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, FileRule::HttpFile { .. })
    }
}

impl fmt::Display for FileRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileRule::Filegroup { name, src } => {
                writeln!(f, "{INDENT}native.filegroup(")?;
                writeln!(f, "{INDENT}{INDENT}name=\"{}\",", name)?;
                writeln!(f, "{INDENT}{INDENT}srcs=[\"{}\"],", src)?;
                writeln!(f, "{INDENT}{INDENT}licenses=[\"notice\"],")?;
                writeln!(f, "{INDENT})")
            }
            FileRule::HttpFile { name, url, sha256 } => {
                // Lets a WORKSPACE override any wheel by declaring it first.
                writeln!(f, "{INDENT}if not \"{}\" in native.existing_rules():", name)?;
                writeln!(f, "{INDENT}{INDENT}native.http_file(")?;
                writeln!(f, "{INDENT}{INDENT}{INDENT}name=\"{}\",", name)?;
                writeln!(f, "{INDENT}{INDENT}{INDENT}url=\"{}\",", url)?;
                writeln!(f, "{INDENT}{INDENT}{INDENT}sha256=\"{}\",", sha256)?;
                writeln!(f, "{INDENT}{INDENT})")
            }
        }
    }
}

fn string_list(items: &[String]) -> String {
    let quoted: Vec<_> = items.iter().map(|item| format!("\"{}\"", item)).collect();
    format!("[{}]", quoted.join(", "))
}
