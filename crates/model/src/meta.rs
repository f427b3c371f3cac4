use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Directories that are never indexed, whatever the distribution says.
const EXCLUDED_DIRECTORIES: &[&str] = &["t", "xt", "inc", "local", "perl5", "fatlib", "example", "examples", "eg", "blib"];

/// The parts of a distribution's META file that decide what gets indexed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseMetadata {
    pub name: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub version: Option<String>,
    #[serde(rename = "abstract")]
    pub r#abstract: Option<String>,
    pub no_index: NoIndex,
    pub provides: BTreeMap<String, Provided>,
}

/// `no_index` section. Every list is optional in the wild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoIndex {
    pub file: Vec<String>,
    pub directory: Vec<String>,
    pub package: Vec<String>,
    pub namespace: Vec<String>,
}

/// One entry of the `provides` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provided {
    pub file: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub version: Option<String>,
}

impl ReleaseMetadata {
    /// Parse META JSON (`META.json` or a mirror's `.meta` sidecar).
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).or_raise(|| ErrorKind::InvalidMetadata)
    }

    pub fn should_index_file(&self, path: &str) -> bool {
        let path = path.trim_start_matches("./");
        if self.no_index.file.iter().any(|file| file.trim_start_matches("./") == path) {
            return false;
        }
        let mut directories = path.split('/').collect::<Vec<_>>();
        directories.pop();
        if directories.first().is_some_and(|first| EXCLUDED_DIRECTORIES.contains(first)) {
            return false;
        }
        !self.no_index.directory.iter().any(|directory| {
            let directory = directory.trim_start_matches("./").trim_end_matches('/');
            path.strip_prefix(directory).is_some_and(|rest| rest.starts_with('/'))
        })
    }

    pub fn should_index_package(&self, name: &str) -> bool {
        if self.no_index.package.iter().any(|package| package == name) {
            return false;
        }
        !self.no_index.namespace.iter().any(|namespace| {
            let namespace = namespace.trim_end_matches("::");
            name.strip_prefix(namespace).is_some_and(|rest| rest.starts_with("::"))
        })
    }

    /// The `provides` entry for `module`, if it points at `path`.
    pub fn provided_in(&self, module: &str, path: &str) -> Option<&Provided> {
        self.provides
            .get(module)
            .filter(|provided| provided.file.trim_start_matches("./") == path.trim_start_matches("./"))
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Version {
        String(String),
        Number(serde_json::Number),
    }
    Ok(Option::<Version>::deserialize(deserializer)?.map(|version| match version {
        Version::String(s) => s,
        Version::Number(n) => n.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn meta() -> ReleaseMetadata {
        ReleaseMetadata::from_json(
            br#"{
                "name": "Foo",
                "version": 1.5,
                "abstract": "Does foo",
                "no_index": {
                    "file": ["lib/Foo/Secret.pm"],
                    "directory": ["share", "lib/Foo/Private/"],
                    "package": ["Foo::Hidden"],
                    "namespace": ["Foo::Internal"]
                },
                "provides": {
                    "Foo": { "file": "lib/Foo.pm", "version": "1.5" }
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_numeric_version() {
        assert_eq!(meta().version.as_deref(), Some("1.5"));
        assert_eq!(meta().provides["Foo"].version.as_deref(), Some("1.5"));
    }

    #[rstest]
    #[case("lib/Foo.pm", true)]
    #[case("./lib/Foo.pm", true)]
    #[case("Foo.pm", true)]
    #[case("lib/Foo/Secret.pm", false)]
    #[case("share/thing.pm", false)]
    #[case("lib/Foo/Private/Bits.pm", false)]
    #[case("lib/Foo/PrivateBits.pm", true)]
    #[case("t/lib/Helper.pm", false)]
    #[case("xt/author.t", false)]
    #[case("inc/Module/Install.pm", false)]
    #[case("examples/demo.pl", false)]
    #[case("blib/lib/Foo.pm", false)]
    #[case("lib/t/Foo.pm", true)]
    fn test_should_index_file(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(meta().should_index_file(path), expected);
    }

    #[rstest]
    #[case("Foo", true)]
    #[case("Foo::Hidden", false)]
    #[case("Foo::Internal", true)]
    #[case("Foo::Internal::Bits", false)]
    #[case("Foo::InternalBits", true)]
    fn test_should_index_package(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(meta().should_index_package(name), expected);
    }

    #[test]
    fn test_provided_in() {
        let meta = meta();
        assert!(meta.provided_in("Foo", "lib/Foo.pm").is_some());
        assert!(meta.provided_in("Foo", "lib/Bar.pm").is_none());
        assert!(meta.provided_in("Bar", "lib/Foo.pm").is_none());
    }

    #[test]
    fn test_invalid_json() {
        let err = ReleaseMetadata::from_json(b"{ not json").unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidMetadata);
    }

    #[test]
    fn test_empty_object() {
        let meta = ReleaseMetadata::from_json(b"{}").unwrap();
        assert_eq!(meta, ReleaseMetadata::default());
    }
}
