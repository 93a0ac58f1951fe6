/*!
 * Ignore rules deciding which entries are hidden from traversal
 *
 * Rules are shell globs. A rule ending in `/` only matches directories. A
 * rule without an interior `/` is also tried against the entry's own name,
 * so `.git/` hides every `.git` directory, not only the top-level one. There
 * is no negation: the rule set is a plain union and the first match wins.
 */

use std::fs;
use std::path::{Path, PathBuf};

use glob_match::glob_match;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use once_cell::sync::Lazy;

use crate::error::Result;

/// Name of the per-project ignore file looked up in the root
pub const IGNORE_FILE_NAME: &str = ".promptreeignore";

/// Built-in rules: VCS metadata, caches, virtualenvs, build output, OS files
pub static DEFAULT_IGNORE: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        // Version Control
        ".git/",
        ".hg/",
        ".svn/",
        // Python
        "__pycache__/",
        ".mypy_cache/",
        ".pytest_cache/",
        ".tox/",
        "venv/",
        ".venv/",
        "env/",
        ".ipynb_checkpoints/",
        "*.pyc",
        // Dependencies
        "node_modules/",
        // Build & Dist
        "build/",
        "dist/",
        // OS Files
        ".DS_Store",
    ]
});

/// A single ignore rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRule {
    glob: String,
    dir_only: bool,
    anchored: bool,
}

impl IgnoreRule {
    /// Parse one line of an ignore file; comments and blank lines yield `None`
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let dir_only = line.ends_with('/');
        let body = line.trim_end_matches('/');
        let (body, rooted) = match body.strip_prefix('/') {
            Some(rest) => (rest, true),
            None => (body, false),
        };
        if body.is_empty() {
            return None;
        }

        Some(Self {
            glob: body.to_string(),
            dir_only,
            anchored: rooted || body.contains('/'),
        })
    }

    /// Whether this rule only applies to directories
    pub fn is_dir_only(&self) -> bool {
        self.dir_only
    }

    /// Check a POSIX path relative to the root
    pub fn matches(&self, relative: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        if glob_match(&self.glob, relative) {
            return true;
        }
        if self.anchored {
            return false;
        }
        let name = relative.rsplit('/').next().unwrap_or(relative);
        name != relative && glob_match(&self.glob, name)
    }
}

/// The loaded rule set plus an optional `.gitignore` layer
#[derive(Debug, Clone, Default)]
pub struct IgnoreMatcher {
    rules: Vec<IgnoreRule>,
    root: PathBuf,
    gitignore: Option<Gitignore>,
}

impl IgnoreMatcher {
    /// Build a matcher from explicit patterns only (no defaults, no files)
    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            rules: patterns
                .into_iter()
                .filter_map(|p| IgnoreRule::parse(p.as_ref()))
                .collect(),
            root: PathBuf::new(),
            gitignore: None,
        }
    }

    /// Load defaults, the ignore file and extra patterns for a canonical root
    ///
    /// When `ignore_file` is `None`, `<root>/.promptreeignore` is used if it
    /// exists. A missing default file is not an error.
    pub fn load(
        root: &Path,
        ignore_file: Option<&Path>,
        extra_patterns: &[String],
        respect_gitignore: bool,
    ) -> Result<Self> {
        let mut patterns: Vec<String> = DEFAULT_IGNORE.iter().map(|p| p.to_string()).collect();

        let file = ignore_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.join(IGNORE_FILE_NAME));
        if file.is_file() {
            let bytes = fs::read(&file)?;
            let text = String::from_utf8_lossy(&bytes);
            let before = patterns.len();
            patterns.extend(text.lines().map(str::to_string));
            log::debug!(
                "Loaded {} lines from ignore file {}",
                patterns.len() - before,
                file.display()
            );
        }

        patterns.extend(extra_patterns.iter().cloned());

        let mut matcher = Self::from_patterns(patterns);
        matcher.root = root.to_path_buf();

        if respect_gitignore {
            let mut builder = GitignoreBuilder::new(root);
            let gitignore_path = root.join(".gitignore");
            if gitignore_path.is_file() {
                if let Some(err) = builder.add(&gitignore_path) {
                    log::warn!("Partially invalid {}: {}", gitignore_path.display(), err);
                }
            }
            matcher.gitignore = Some(builder.build()?);
        }

        log::debug!("Ignore matcher ready with {} rules", matcher.rules.len());
        Ok(matcher)
    }

    /// Whether a root-relative POSIX path is excluded from traversal
    pub fn is_ignored(&self, relative: &str, is_dir: bool) -> bool {
        if self.rules.iter().any(|rule| rule.matches(relative, is_dir)) {
            return true;
        }

        match &self.gitignore {
            Some(gitignore) if !relative.is_empty() => gitignore
                .matched_path_or_any_parents(self.root.join(relative), is_dir)
                .is_ignore(),
            _ => false,
        }
    }
}
