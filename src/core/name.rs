//! Package name normalization.
//!
//! PyPI names are matched case-insensitively and treat `-`, `_` and `.` as
//! equivalent. Bazel target names cannot carry any of those distinctions, so
//! every name that reaches a generated rule goes through [`normalize`].
//!
//! Requirement strings reported by wheel metadata may carry extras and version
//! qualifiers (`Requests[security]>=2.0; python_version < "3"`). Both functions
//! here accept such strings and only look at the name and extras part.

/// Characters that may appear in a distribution name.
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

/// Split a requirement string into its name and the raw extras list.
fn split_requirement(requirement: &str) -> (&str, Option<&str>) {
    let trimmed = requirement.trim();
    let name_end = trimmed
        .find(|c: char| !is_name_char(c))
        .unwrap_or(trimmed.len());
    let name = &trimmed[..name_end];

    let rest = trimmed[name_end..].trim_start();
    let extras = rest
        .strip_prefix('[')
        .and_then(|inner| inner.find(']').map(|end| &inner[..end]));

    (name, extras)
}

fn canonical(name: &str) -> String {
    name.to_lowercase().replace(['-', '.'], "_")
}

/// Canonical target name for a package, keeping extras as a `__` suffix.
///
/// `Foo-Bar` becomes `foo_bar`, `pkg[extra]` becomes `pkg__extra`.
pub fn normalize(name: &str) -> String {
    let (base, extras) = split_requirement(name);
    let mut normalized = canonical(base);

    if let Some(extras) = extras {
        for extra in extras.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            normalized.push_str("__");
            normalized.push_str(&canonical(extra));
        }
    }

    normalized
}

/// Canonical package name with extras and qualifiers removed.
///
/// Used for membership tests against the installed package set.
pub fn base_name(name: &str) -> String {
    let (base, _) = split_requirement(name);
    canonical(base)
}
