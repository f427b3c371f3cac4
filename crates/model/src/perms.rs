use std::collections::{BTreeSet, HashMap};

/// Module name → authors allowed to release it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions {
    modules: HashMap<String, BTreeSet<String>>,
}

impl Permissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: impl Into<String>, author: impl Into<String>) {
        self.modules.entry(module.into()).or_default().insert(author.into());
    }

    /// Authors holding permissions for `module`, or `None` if nobody has
    /// claimed it.
    pub fn authors(&self, module: &str) -> Option<&BTreeSet<String>> {
        self.modules.get(module)
    }

    /// An unclaimed name is authorized for everybody.
    pub fn is_authorized(&self, module: &str, author: &str) -> bool {
        self.authors(module).is_none_or(|authors| authors.contains(author))
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }
}

impl<M: Into<String>, A: Into<String>> FromIterator<(M, A)> for Permissions {
    fn from_iter<I: IntoIterator<Item = (M, A)>>(iter: I) -> Self {
        let mut permissions = Self::new();
        for (module, author) in iter {
            permissions.insert(module, author);
        }
        permissions
    }
}
