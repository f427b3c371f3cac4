use crate::meta::ReleaseMetadata;
use crate::perms::Permissions;
use crate::release::{ReleaseDocument, Status};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Documentation name → paths of every indexed file documenting it, in
/// release order.
pub type AssociatedPod = BTreeMap<String, Vec<String>>;

/// The `perl` distribution ships modules owned by everybody and nobody.
const UNRESTRICTED_DISTRIBUTION: &str = "perl";

/// A package declared inside a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub name: String,
    pub version: Option<String>,
    pub indexed: bool,
    pub authorized: bool,
    /// `{author}/{release}/{path}` of the file documenting this module.
    pub associated_pod: Option<String>,
}

impl ModuleRecord {
    pub fn new(name: impl Into<String>, version: Option<String>) -> Self {
        Self { name: name.into(), version, indexed: false, authorized: true, associated_pod: None }
    }

    /// Pick the file documenting this module: a `.pod` file first, then the
    /// file declaring the module, then whichever came first.
    pub fn associate_pod(&mut self, author: &str, release: &str, owner_path: &str, map: &AssociatedPod) {
        let Some(paths) = map.get(&self.name) else {
            return;
        };
        let chosen = paths
            .iter()
            .find(|path| path.ends_with(".pod"))
            .or_else(|| paths.iter().find(|path| *path == owner_path))
            .or_else(|| paths.first());
        if let Some(path) = chosen {
            self.associated_pod = Some(format!("{author}/{release}/{path}"));
        }
    }
}

/// A single file inside a release archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub release: String,
    pub author: String,
    pub distribution: String,
    pub status: Status,
    pub path: String,
    pub name: String,
    pub indexed: bool,
    pub authorized: bool,
    /// `NAME` section of the file's pod, if any.
    pub pod_name: Option<String>,
    #[serde(rename = "abstract")]
    pub r#abstract: Option<String>,
    documentation: Option<String>,
    modules: Vec<ModuleRecord>,
    #[serde(skip)]
    documentation_cached: bool,
    #[serde(skip)]
    modules_cleared: bool,
}

impl FileRecord {
    pub fn new(release: &ReleaseDocument, path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self {
            release: release.name.clone(),
            author: release.author.clone(),
            distribution: release.distribution.clone(),
            status: release.status,
            path,
            name,
            indexed: true,
            authorized: true,
            pod_name: None,
            r#abstract: None,
            documentation: None,
            modules: Vec::new(),
            documentation_cached: false,
            modules_cleared: false,
        }
    }

    pub fn is_pod_file(&self) -> bool {
        self.path.ends_with(".pod")
    }

    pub fn modules(&self) -> &[ModuleRecord] {
        &self.modules
    }

    /// Add a module. Once the module list has been cleared it stays empty;
    /// returns `false` when the module was dropped for that reason.
    pub fn push_module(&mut self, module: ModuleRecord) -> bool {
        if self.modules_cleared {
            return false;
        }
        self.modules.push(module);
        self.documentation_cached = false;
        true
    }

    pub fn clear_modules(&mut self) {
        self.modules.clear();
        self.modules_cleared = true;
        self.documentation_cached = false;
    }

    /// Decide which modules (and whether the file itself) get indexed.
    pub fn set_indexed(&mut self, meta: &ReleaseMetadata) {
        let mut provided = false;
        for module in &mut self.modules {
            if meta.provided_in(&module.name, &self.path).is_some() {
                module.indexed = true;
                provided = true;
                continue;
            }
            module.indexed = module.name.starts_with(|c: char| c.is_ascii_alphabetic())
                && meta.should_index_package(&module.name);
        }
        self.indexed = provided || meta.should_index_file(&self.path);
        self.documentation_cached = false;
    }

    /// The name this file documents, computed once and cached until
    /// [`clear_documentation`](Self::clear_documentation).
    pub fn documentation(&mut self) -> Option<&str> {
        if !self.documentation_cached {
            self.documentation = self.compute_documentation();
            self.documentation_cached = true;
        }
        self.documentation.as_deref()
    }

    /// Reset the cache, returning whatever was cached.
    pub fn clear_documentation(&mut self) -> Option<String> {
        self.documentation_cached = false;
        self.documentation.take()
    }

    fn compute_documentation(&self) -> Option<String> {
        // A NAME section of several words is prose, not a package name.
        let pod_name = self
            .pod_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty() && !name.contains(char::is_whitespace));
        if let Some(pod_name) = pod_name
            && (self.is_pod_file() || self.modules.is_empty() || self.modules.iter().any(|m| m.name == pod_name))
        {
            return Some(pod_name.to_string());
        }
        self.modules
            .iter()
            .find(|module| module.indexed)
            .map(|module| module.name.clone())
            .or_else(|| pod_name.map(str::to_string))
    }

    pub fn associate_pods(&mut self, map: &AssociatedPod) {
        for module in &mut self.modules {
            module.associate_pod(&self.author, &self.release, &self.path, map);
        }
    }

    /// Mark modules (and the file) the author holds no permissions for.
    /// Returns the modules that are indexed but unauthorized.
    pub fn set_authorized(&mut self, permissions: &Permissions) -> Vec<ModuleRecord> {
        if self.distribution == UNRESTRICTED_DISTRIBUTION {
            return Vec::new();
        }
        let author = self.author.clone();
        for module in &mut self.modules {
            if !permissions.is_authorized(&module.name, &author) {
                module.authorized = false;
            }
        }
        if self.documentation().is_some_and(|name| !permissions.is_authorized(name, &author)) {
            self.authorized = false;
        }
        self.modules.iter().filter(|m| m.indexed && !m.authorized).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ArchiveIdentity;
    use rstest::rstest;
    use time::OffsetDateTime;

    fn release(pathname: &str) -> ReleaseDocument {
        let identity = ArchiveIdentity::parse(pathname).unwrap();
        ReleaseDocument::new(&identity, Status::Cpan, OffsetDateTime::UNIX_EPOCH)
    }

    fn file(path: &str, pod_name: Option<&str>, modules: &[&str]) -> FileRecord {
        let mut file = FileRecord::new(&release("A/AB/ABC/Foo-1.0.tar.gz"), path);
        file.pod_name = pod_name.map(str::to_string);
        for module in modules {
            file.push_module(ModuleRecord::new(*module, None));
        }
        file
    }

    #[rstest]
    #[case::pod_file("lib/Foo.pod", Some("Foo"), &["Bar"], Some("Foo"))]
    #[case::no_modules("bin/foo", Some("foo"), &[], Some("foo"))]
    #[case::matches_module("lib/Foo.pm", Some("Foo"), &["Bar", "Foo"], Some("Foo"))]
    #[case::first_indexed_module("lib/Foo.pm", Some("Other"), &["Foo", "Bar"], Some("Foo"))]
    #[case::prose_name("lib/Foo.pm", Some("Foo - does things"), &[], None)]
    #[case::nothing("lib/Foo.pm", None, &[], None)]
    fn test_documentation(
        #[case] path: &str,
        #[case] pod_name: Option<&str>,
        #[case] modules: &[&str],
        #[case] expected: Option<&str>,
    ) {
        let mut file = file(path, pod_name, modules);
        for module in &mut file.modules {
            module.indexed = true;
        }
        assert_eq!(file.documentation(), expected);
    }

    #[test]
    fn test_documentation_falls_back_to_pod_name() {
        let mut file = file("lib/Foo.pm", Some("Other"), &["_private"]);
        assert_eq!(file.documentation(), Some("Other"));
    }

    #[test]
    fn test_documentation_is_cached_until_cleared() {
        let mut file = file("lib/Foo.pm", Some("Foo"), &[]);
        assert_eq!(file.documentation(), Some("Foo"));
        file.pod_name = Some("Changed".to_string());
        assert_eq!(file.documentation(), Some("Foo"));
        assert_eq!(file.clear_documentation().as_deref(), Some("Foo"));
        assert_eq!(file.documentation(), Some("Changed"));
    }

    #[test]
    fn test_cleared_modules_are_never_repopulated() {
        let mut file = file("lib/Foo.pod", Some("Foo"), &["Foo"]);
        file.clear_modules();
        assert!(!file.push_module(ModuleRecord::new("Bar", None)));
        assert!(file.modules().is_empty());
    }

    #[test]
    fn test_set_indexed() {
        let meta = ReleaseMetadata::from_json(
            br#"{
                "no_index": { "package": ["Foo::Hidden"], "directory": ["t"] },
                "provides": { "Foo::Test": { "file": "t/lib/Foo/Test.pm" } }
            }"#,
        )
        .unwrap();

        let mut lib = file("lib/Foo.pm", None, &["Foo", "Foo::Hidden", "_Foo"]);
        lib.set_indexed(&meta);
        assert!(lib.indexed);
        let indexed = lib.modules().iter().map(|m| m.indexed).collect::<Vec<_>>();
        assert_eq!(indexed, [true, false, false]);

        let mut provided = file("t/lib/Foo/Test.pm", None, &["Foo::Test"]);
        provided.set_indexed(&meta);
        assert!(provided.indexed);
        assert!(provided.modules()[0].indexed);

        let mut test = file("t/basic.t", None, &[]);
        test.set_indexed(&meta);
        assert!(!test.indexed);
    }

    #[rstest]
    #[case::prefers_pod(&["lib/Foo.pm", "lib/Foo.pod"], "lib/Foo.pm", "ABC/Foo-1.0/lib/Foo.pod")]
    #[case::prefers_owner(&["lib/Other.pm", "lib/Foo.pm"], "lib/Foo.pm", "ABC/Foo-1.0/lib/Foo.pm")]
    #[case::falls_back_to_first(&["lib/A.pm", "lib/B.pm"], "lib/Foo.pm", "ABC/Foo-1.0/lib/A.pm")]
    fn test_associate_pod(#[case] paths: &[&str], #[case] owner: &str, #[case] expected: &str) {
        let map = AssociatedPod::from([("Foo".to_string(), paths.iter().map(|p| p.to_string()).collect())]);
        let mut module = ModuleRecord::new("Foo", None);
        module.associate_pod("ABC", "Foo-1.0", owner, &map);
        assert_eq!(module.associated_pod.as_deref(), Some(expected));
    }

    #[test]
    fn test_associate_pod_without_entry() {
        let mut module = ModuleRecord::new("Foo", None);
        module.associate_pod("ABC", "Foo-1.0", "lib/Foo.pm", &AssociatedPod::new());
        assert_eq!(module.associated_pod, None);
    }

    #[test]
    fn test_set_authorized() {
        let permissions = Permissions::from_iter([("Foo", "ABC"), ("Baz", "XYZ"), ("Hidden", "XYZ")]);
        let mut file = file("lib/Foo.pm", Some("Foo"), &["Foo", "Bar", "Baz", "Hidden"]);
        for module in &mut file.modules {
            module.indexed = module.name != "Hidden";
        }
        let unauthorized = file.set_authorized(&permissions);
        let names = unauthorized.iter().map(|m| m.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["Baz"]);
        assert!(file.authorized);
        assert!(!file.modules()[3].authorized);
    }

    #[test]
    fn test_set_authorized_file_documentation() {
        let permissions = Permissions::from_iter([("Foo", "XYZ")]);
        let mut file = file("lib/Foo.pod", Some("Foo"), &[]);
        assert!(file.set_authorized(&permissions).is_empty());
        assert!(!file.authorized);
    }

    #[test]
    fn test_perl_distribution_is_exempt() {
        let permissions = Permissions::from_iter([("strict", "XYZ")]);
        let mut file = FileRecord::new(&release("A/AB/ABC/perl-5.40.0.tar.gz"), "lib/strict.pm");
        let mut module = ModuleRecord::new("strict", None);
        module.indexed = true;
        file.push_module(module);
        assert!(file.set_authorized(&permissions).is_empty());
        assert!(file.modules()[0].authorized);
    }
}
