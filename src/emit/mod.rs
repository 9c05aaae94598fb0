//! Rendering dependency records as a Bazel `.bzl` file.
//!
//! Output layout:
//!
//! ```text
//! <header and load()>
//!
//! def pypi_libraries():
//!     <one library target per package, then its extras>
//!     <filegroups for vendored wheels>
//!
//! def pypi_repositories():
//!     <http_file rules for remote wheels>
//! ```
//!
//! Everything is derived from already sorted inputs, so the same
//! dependencies always render to the same bytes.

pub mod flavor;
pub mod rules;

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::core::dependency::{InstalledPackageSet, PackageDependency};
use crate::core::name::{base_name, normalize};
use crate::core::platform::PlatformTag;
use crate::core::wheel::{Storage, WheelArtifact};
use crate::util::fs::{relative_path, to_label_path};

pub use flavor::RuleFlavor;
pub use rules::{FileRule, LibraryTarget, WheelSelection, DEFAULT_CONDITION};

/// Packages that cannot be imported from inside a zip.
pub const UNZIP_PACKAGES: &[&str] = &[
    // returns paths to the bundled .pem files
    "certifi",
];

/// Settings that shape the generated file.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub flavor: RuleFlavor,
    /// Prefix of wheel rule names (`pypi_`).
    pub workspace_prefix: String,
    /// Workspace providing the library rule and platform conditions.
    pub rules_workspace: String,
    /// Directory the .bzl file is written to; filegroup paths are relative to it.
    pub output_dir: PathBuf,
    /// Arguments recorded in the header.
    pub command_line: String,
    pub unzip_packages: &'static [&'static str],
}

impl EmitOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        EmitOptions {
            flavor: RuleFlavor::default(),
            workspace_prefix: "pypi_".to_string(),
            rules_workspace: "@rules_pyz".to_string(),
            output_dir: output_dir.into(),
            command_line: String::new(),
            unzip_packages: UNZIP_PACKAGES,
        }
    }

    fn condition(&self, platform: PlatformTag) -> String {
        match platform.label() {
            Some(label) => format!("{}//rules_python_zip:{}", self.rules_workspace, label),
            None => DEFAULT_CONDITION.to_string(),
        }
    }
}

/// Library targets for one package: the library itself, then one target
/// per extra whose requirements are all installed.
pub fn library_targets(
    dependency: &PackageDependency,
    installed: &InstalledPackageSet,
    options: &EmitOptions,
) -> Vec<LibraryTarget> {
    let Some(canonical) = dependency.canonical() else {
        return Vec::new();
    };
    let library = dependency.library_name();
    let zip_safe = !options
        .unzip_packages
        .contains(&base_name(dependency.name()).as_str());

    let mut targets = vec![LibraryTarget {
        flavor: options.flavor,
        name: library.clone(),
        wheels: Some(wheel_selection(dependency, options)),
        zip_safe,
        deps: normalized_deps(canonical.requires().iter().map(String::as_str)),
    }];

    for (extra, extra_deps) in canonical.extras() {
        if let Some(missing) = extra_deps.iter().find(|dep| !installed.contains(dep)) {
            tracing::debug!(
                "skipping extra {}[{}]: {} is not installed",
                dependency.name(),
                extra,
                missing
            );
            continue;
        }

        let deps = extra_deps
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(library.as_str()));
        targets.push(LibraryTarget {
            flavor: options.flavor,
            name: normalize(&format!("{}[{}]", library, extra)),
            wheels: None,
            zip_safe: true,
            deps: normalized_deps(deps),
        });
    }

    targets
}

fn wheel_selection(dependency: &PackageDependency, options: &EmitOptions) -> WheelSelection {
    let prefix = &options.workspace_prefix;
    let artifacts = dependency.artifacts();
    if !dependency.is_platform_conditional() {
        if let Some(only) = artifacts.first() {
            return WheelSelection::Direct(only.target_ref(prefix));
        }
    }

    // Artifacts are in platform order, so the universal one (if any) is last.
    let mut branches: Vec<_> = artifacts
        .iter()
        .map(|a| (options.condition(a.platform()), vec![a.target_ref(prefix)]))
        .collect();
    if !artifacts.iter().any(|a| a.platform().is_universal()) {
        branches.push((DEFAULT_CONDITION.to_string(), Vec::new()));
    }
    WheelSelection::Select(branches)
}

fn normalized_deps<'a>(deps: impl Iterator<Item = &'a str>) -> Vec<String> {
    deps.map(normalize)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// The rule acquiring one artifact.
pub fn file_rule(artifact: &WheelArtifact, options: &EmitOptions) -> FileRule {
    let name = artifact.rule_name(&options.workspace_prefix);
    match artifact.storage() {
        Storage::Vendored { path } => FileRule::Filegroup {
            name,
            src: to_label_path(&relative_path(&options.output_dir, path)),
        },
        Storage::Remote => FileRule::HttpFile {
            name,
            url: artifact.locator().to_string(),
            sha256: artifact.sha256().to_string(),
        },
    }
}

/// Acquisition rules for every artifact, one per rule name, in package and
/// platform order.
pub fn file_rules(dependencies: &[PackageDependency], options: &EmitOptions) -> Vec<FileRule> {
    let mut seen = BTreeSet::new();
    dependencies
        .iter()
        .flat_map(PackageDependency::artifacts)
        .map(|artifact| file_rule(artifact, options))
        .filter(|rule| seen.insert(rule.name().to_string()))
        .collect()
}

fn header(options: &EmitOptions) -> String {
    format!(
        "# AUTO GENERATED. DO NOT EDIT DIRECTLY.\n\
         #\n\
         # Command line:\n\
         #   wheelgen \\\n\
         #     {}\n\
         \n\
         load(\"{}{}\", \"{}\")\n",
        options.command_line,
        options.rules_workspace,
        options.flavor.bzl_path(),
        options.flavor.library_rule()
    )
}

/// Render the complete `.bzl` file.
pub fn emit(
    dependencies: &[PackageDependency],
    installed: &InstalledPackageSet,
    options: &EmitOptions,
) -> String {
    let mut out = header(options);

    let libraries: Vec<_> = dependencies
        .iter()
        .flat_map(|dep| library_targets(dep, installed, options))
        .collect();
    let (remote, local): (Vec<_>, Vec<_>) = file_rules(dependencies, options)
        .into_iter()
        .partition(FileRule::is_remote);

    out.push_str("\ndef pypi_libraries():\n");
    for target in &libraries {
        out.push_str(&target.to_string());
    }
    for rule in &local {
        out.push_str(&rule.to_string());
    }
    if libraries.is_empty() && local.is_empty() {
        out.push_str("    pass\n");
    }

    out.push_str("\ndef pypi_repositories():\n");
    for rule in &remote {
        out.push_str(&rule.to_string());
    }
    if remote.is_empty() {
        out.push_str("    pass\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dependency::aggregate;
    use crate::core::platform::PlatformClassifier;
    use crate::core::wheel::WheelMetadata;
    use std::collections::BTreeMap;
    use std::path::Path;

    fn artifact(locator: &str, requires: &[&str], extras: &[(&str, &[&str])]) -> WheelArtifact {
        let filename = crate::core::wheel::file_name_of(locator);
        let metadata = WheelMetadata {
            requires: requires.iter().map(|s| s.to_string()).collect(),
            extras: extras
                .iter()
                .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
                .collect::<BTreeMap<_, _>>(),
        };
        WheelArtifact::from_parts(
            locator,
            PlatformClassifier::default().classify(filename),
            "abc123",
            metadata,
            Storage::Remote,
        )
    }

    fn options() -> EmitOptions {
        let mut options = EmitOptions::new("/repo/third_party/pypi");
        options.command_line = "--requirements requirements.txt".to_string();
        options
    }

    #[test]
    fn test_foo_bar_and_baz() {
        let aggregation = aggregate(vec![
            (
                "baz".to_string(),
                vec![
                    artifact("https://x/baz-1.0-cp27-cp27mu-manylinux1_x86_64.whl", &["Foo-Bar"], &[]),
                    artifact("https://x/baz-1.0-cp27-cp27m-macosx_10_6_intel.whl", &["Foo-Bar"], &[]),
                ],
            ),
            (
                "Foo_Bar".to_string(),
                vec![artifact("https://x/Foo_Bar-2.0-py2.py3-none-any.whl", &[], &[])],
            ),
        ]);

        let targets: Vec<_> = aggregation
            .dependencies
            .iter()
            .flat_map(|d| library_targets(d, &aggregation.installed, &options()))
            .collect();
        assert_eq!(targets.len(), 2);

        assert_eq!(targets[0].name, "baz");
        assert_eq!(targets[0].deps, ["foo_bar"]);
        assert_eq!(
            targets[0].wheels,
            Some(WheelSelection::Select(vec![
                (
                    "@rules_pyz//rules_python_zip:osx".to_string(),
                    vec!["@pypi_baz__osx//file".to_string()]
                ),
                (
                    "@rules_pyz//rules_python_zip:linux".to_string(),
                    vec!["@pypi_baz__linux//file".to_string()]
                ),
                (DEFAULT_CONDITION.to_string(), vec![]),
            ]))
        );

        assert_eq!(targets[1].name, "foo_bar");
        assert_eq!(
            targets[1].wheels,
            Some(WheelSelection::Direct("@pypi_foo_bar//file".to_string()))
        );
    }

    #[test]
    fn test_select_default_uses_universal_wheel() {
        let dep = PackageDependency::new(
            "baz",
            vec![
                artifact("https://x/baz-1.0-py2-none-any.whl", &[], &[]),
                artifact("https://x/baz-1.0-cp27-cp27m-macosx_10_6_intel.whl", &[], &[]),
            ],
        );
        let targets = library_targets(&dep, &InstalledPackageSet::new(), &options());
        let Some(WheelSelection::Select(branches)) = &targets[0].wheels else {
            panic!("expected select");
        };
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[1], (DEFAULT_CONDITION.to_string(), vec!["@pypi_baz//file".to_string()]));
    }

    #[test]
    fn test_extras_gated_on_installed_packages() {
        let dep = PackageDependency::new(
            "requests",
            vec![artifact(
                "https://x/requests-2.18.0-py2.py3-none-any.whl",
                &["idna>=2.5", "certifi", "idna"],
                &[
                    ("security", &["pyOpenSSL>=0.14", "cryptography"]),
                    ("socks", &["PySocks[x]"]),
                    ("empty", &[]),
                ],
            )],
        );
        let installed: InstalledPackageSet =
            ["requests", "pyopenssl", "Cryptography", "idna", "certifi"].into_iter().collect();

        let targets = library_targets(&dep, &installed, &options());
        let names: Vec<_> = targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["requests", "requests__empty", "requests__security"]);

        assert_eq!(targets[0].deps, ["certifi", "idna"]);
        assert_eq!(targets[1].deps, ["requests"]);
        assert_eq!(targets[2].deps, ["cryptography", "pyopenssl", "requests"]);
        assert!(targets[2].wheels.is_none());
    }

    #[test]
    fn test_certifi_is_not_zip_safe() {
        let dep = PackageDependency::new(
            "certifi",
            vec![artifact("https://x/certifi-2017.7.27.1-py2.py3-none-any.whl", &[], &[])],
        );
        let targets = library_targets(&dep, &InstalledPackageSet::new(), &options());
        assert!(!targets[0].zip_safe);
    }

    #[test]
    fn test_file_rules_vendored_relative_path() {
        let vendored = WheelArtifact::from_parts(
            "six-1.11.0-py2.py3-none-any.whl",
            PlatformTag::Universal,
            "ff",
            WheelMetadata::default(),
            Storage::Vendored {
                path: Path::new("/repo/third_party/pypi/wheels/six-1.11.0-py2.py3-none-any.whl")
                    .to_path_buf(),
            },
        );
        assert_eq!(
            file_rule(&vendored, &options()),
            FileRule::Filegroup {
                name: "pypi_six".to_string(),
                src: "wheels/six-1.11.0-py2.py3-none-any.whl".to_string(),
            }
        );
    }

    #[test]
    fn test_file_rules_deduplicate_by_name() {
        let deps = vec![
            PackageDependency::new("six", vec![artifact("https://a/six-1.0-py2-none-any.whl", &[], &[])]),
            PackageDependency::new("Six", vec![artifact("https://b/six-1.0-py2-none-any.whl", &[], &[])]),
        ];
        let rules = file_rules(&deps, &options());
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name(), "pypi_six");
    }

    #[test]
    fn test_emit_empty() {
        let out = emit(&[], &InstalledPackageSet::new(), &options());
        assert_eq!(
            out,
            r#"# AUTO GENERATED. DO NOT EDIT DIRECTLY.
#
# Command line:
#   wheelgen \
#     --requirements requirements.txt

load("@rules_pyz//rules_python_zip:rules_python_zip.bzl", "pyz_library")

def pypi_libraries():
    pass

def pypi_repositories():
    pass
"#
        );
    }

    #[test]
    fn test_emit_full_file() {
        let aggregation = aggregate(vec![(
            "six".to_string(),
            vec![artifact("https://x/six-1.11.0-py2.py3-none-any.whl", &[], &[])],
        )]);
        let mut options = options();
        options.flavor = RuleFlavor::Pex;

        let out = emit(&aggregation.dependencies, &aggregation.installed, &options);
        assert_eq!(
            out,
            r#"# AUTO GENERATED. DO NOT EDIT DIRECTLY.
#
# Command line:
#   wheelgen \
#     --requirements requirements.txt

load("@rules_pyz//bazel_rules_pex/pex:pex_rules.bzl", "pex_library")

def pypi_libraries():
    pex_library(
        name="six",
        eggs=["@pypi_six//file"],
        deps=[
        ],
        licenses=["notice"],
        visibility=["//visibility:public"],
    )

def pypi_repositories():
    if not "pypi_six" in native.existing_rules():
        native.http_file(
            name="pypi_six",
            url="https://x/six-1.11.0-py2.py3-none-any.whl",
            sha256="abc123",
        )
"#
        );
    }

    #[test]
    fn test_emit_is_stable_under_input_order() {
        let build = |reverse: bool| {
            let mut groups = vec![
                (
                    "baz".to_string(),
                    vec![
                        artifact("https://x/baz-1.0-cp27-cp27mu-manylinux1_x86_64.whl", &["six"], &[]),
                        artifact("https://x/baz-1.0-cp27-cp27m-macosx_10_6_intel.whl", &["six"], &[]),
                    ],
                ),
                (
                    "six".to_string(),
                    vec![artifact("https://x/six-1.11.0-py2.py3-none-any.whl", &[], &[])],
                ),
            ];
            if reverse {
                groups.reverse();
                groups[1].1.reverse();
            }
            let aggregation = aggregate(groups);
            emit(&aggregation.dependencies, &aggregation.installed, &options())
        };
        assert_eq!(build(false), build(true));
    }
}
