//! Well-known sensitive or bulky names kept out of bulk selection

use std::path::{Component, Path, PathBuf};

use super::state::AllowOverrides;

/// Names skipped by bulk selection unless the user consents per path
pub const BLACKLIST_NAMES: &[&str] = &[
    ".env",
    ".env.local",
    ".env.development",
    ".env.production",
    ".env.test",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".ipynb_checkpoints",
    "node_modules",
    ".venv",
    "venv",
    ".tox",
    ".cache",
    "build",
    "dist",
];

/// Blacklist check scoped to a root
///
/// Only the part of a path below the root is inspected, so a root that
/// itself lives under e.g. `build/` does not blacklist everything.
#[derive(Debug, Clone)]
pub struct Blacklist {
    root: PathBuf,
}

impl Blacklist {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn split<'a>(&'a self, path: &'a Path) -> (PathBuf, &'a Path) {
        match path.strip_prefix(&self.root) {
            Ok(rel) => (self.root.clone(), rel),
            Err(_) => (PathBuf::new(), path),
        }
    }

    /// Whether any segment below the root is a blacklisted name
    pub fn is_blacklisted(&self, path: &Path) -> bool {
        let (_, rel) = self.split(path);
        rel.components().any(|c| is_blacklisted_component(&c))
    }

    /// Whether bulk selection may include `path`
    ///
    /// An override on a path covers every blacklisted segment at or above
    /// it. Allowing `node_modules` therefore permits everything below it,
    /// except further blacklisted segments deeper down.
    pub fn permits(&self, path: &Path, allow: &AllowOverrides) -> bool {
        let (mut prefix, rel) = self.split(path);
        let mut deepest_blacklisted = None;
        let mut deepest_allowed = None;
        for (depth, component) in rel.components().enumerate() {
            prefix.push(component.as_os_str());
            if is_blacklisted_component(&component) {
                deepest_blacklisted = Some(depth);
            }
            if allow.is_allowed(&prefix) {
                deepest_allowed = Some(depth);
            }
        }
        match (deepest_blacklisted, deepest_allowed) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(blacklisted), Some(allowed)) => allowed >= blacklisted,
        }
    }
}

fn is_blacklisted_component(component: &Component<'_>) -> bool {
    match component {
        Component::Normal(name) => name
            .to_str()
            .map(|name| BLACKLIST_NAMES.contains(&name))
            .unwrap_or(false),
        _ => false,
    }
}
