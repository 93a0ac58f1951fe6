/*!
 * Lazy, paginated directory listing
 *
 * Only immediate children are read. Every call is independent: the sorted
 * and filtered child list is rebuilt per request and sliced to one page.
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use walkdir::{DirEntry, WalkDir};

use crate::bail;
use crate::config::Config;
use crate::error::Result;
use crate::matcher::IgnoreMatcher;
use crate::types::{ChildPage, Node, ParentInfo};
use crate::utils::{relative_posix, resolve_within};

/// A filtered child that survived the root and ignore checks
struct Candidate {
    name: String,
    relative: String,
    absolute: PathBuf,
    is_dir: bool,
    entry: DirEntry,
}

/// Directory lister bounded to a root
#[derive(Debug, Clone)]
pub struct Scanner {
    /// Canonical root
    root: PathBuf,
    /// Shared ignore rules
    matcher: Arc<IgnoreMatcher>,
}

impl Scanner {
    /// Create a scanner for a canonical root
    pub fn new(root: PathBuf, matcher: Arc<IgnoreMatcher>) -> Self {
        Self { root, matcher }
    }

    /// Create a scanner from a validated configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let matcher = IgnoreMatcher::load(
            &config.root,
            config.ignore_file.as_deref(),
            &config.ignore_patterns,
            config.respect_gitignore,
        )?;
        Ok(Self::new(config.root.clone(), Arc::new(matcher)))
    }

    /// The canonical root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a directory argument (relative to the root, or absolute)
    ///
    /// Fails with `InvalidPath` when it does not exist, is not a directory,
    /// or resolves outside the root.
    pub fn resolve_directory(&self, raw: &Path) -> Result<PathBuf> {
        match resolve_within(&self.root, raw) {
            Some(dir) if dir.is_dir() => Ok(dir),
            _ => bail!(InvalidPath, "{}", raw.display()),
        }
    }

    /// Describe a resolved directory for listing responses
    pub fn parent_info(&self, dir: &Path) -> ParentInfo {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.root.display().to_string());
        ParentInfo {
            name,
            path: relative_posix(&self.root, dir).unwrap_or_default(),
            full_path: dir.to_path_buf(),
        }
    }

    /// List one page of a directory's immediate children
    ///
    /// Children are sorted directories first, then by lowercase name, and
    /// the page is the slice `[offset, offset + limit)` of that list. A
    /// directory that cannot be read yields an empty page.
    pub fn list_children(&self, directory: &Path, offset: usize, limit: usize) -> Result<ChildPage> {
        let dir = self.resolve_directory(directory)?;
        if let Err(e) = fs::read_dir(&dir) {
            log::warn!("Cannot read {}: {}", dir.display(), e);
            return Ok(ChildPage::empty(offset, limit));
        }

        let mut candidates = self.candidates(&dir);
        candidates.sort_by_cached_key(|c| (!c.is_dir, c.name.to_lowercase()));

        let total = candidates.len();
        let start = offset.min(total);
        let end = offset.saturating_add(limit).min(total);

        let children: Vec<Node> = candidates[start..end]
            .par_iter()
            .map(|c| self.to_node(c))
            .collect();

        log::debug!(
            "Listed {} ({}..{} of {})",
            dir.display(),
            start,
            end,
            total
        );

        Ok(ChildPage {
            children,
            offset,
            limit,
            total,
            has_more: offset.saturating_add(limit) < total,
        })
    }

    /// Every non-ignored, in-root child of `dir`; unreadable entries are dropped
    fn candidates(&self, dir: &Path) -> Vec<Candidate> {
        WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    None
                }
            })
            .filter_map(|entry| self.classify(entry))
            .collect()
    }

    /// Apply the root boundary and ignore rules to one entry
    fn classify(&self, entry: DirEntry) -> Option<Candidate> {
        let is_dir = entry.file_type().is_dir();
        let (absolute, relative) = self.admit(entry.path(), is_dir, entry.path_is_symlink())?;

        Some(Candidate {
            name: entry.file_name().to_string_lossy().to_string(),
            relative,
            absolute,
            is_dir,
            entry,
        })
    }

    /// Canonical and relative path of an entry that would be listed
    fn admit(&self, path: &Path, is_dir: bool, is_symlink: bool) -> Option<(PathBuf, String)> {
        let absolute = match resolve_within(&self.root, path) {
            Some(absolute) => absolute,
            None => {
                log::trace!("Skipping {} (outside root or dangling)", path.display());
                return None;
            }
        };

        // A symlink to a directory would alias another subtree
        if is_symlink && absolute.is_dir() {
            log::trace!("Skipping directory symlink {}", path.display());
            return None;
        }

        let relative = relative_posix(&self.root, &absolute)?;
        if self.matcher.is_ignored(&relative, is_dir) {
            return None;
        }
        Some((absolute, relative))
    }

    fn to_node(&self, candidate: &Candidate) -> Node {
        if candidate.is_dir {
            Node::directory(
                &candidate.name,
                &candidate.relative,
                candidate.absolute.clone(),
                self.has_visible_child(&candidate.absolute),
            )
        } else {
            let size = candidate.entry.metadata().map(|m| m.len()).unwrap_or(0);
            Node::file(
                &candidate.name,
                &candidate.relative,
                candidate.absolute.clone(),
                size,
            )
        }
    }

    /// Stop at the first child that would be listed
    fn has_visible_child(&self, dir: &Path) -> bool {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return false,
        };

        entries.flatten().any(|entry| match entry.file_type() {
            Ok(ft) => self
                .admit(&entry.path(), ft.is_dir(), ft.is_symlink())
                .is_some(),
            Err(_) => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::DEFAULT_IGNORE;
    use std::io;
    use tempfile::{tempdir, TempDir};

    fn scanner_for(dir: &TempDir) -> io::Result<Scanner> {
        let root = fs::canonicalize(dir.path())?;
        let matcher = IgnoreMatcher::from_patterns(DEFAULT_IGNORE.iter());
        Ok(Scanner::new(root, Arc::new(matcher)))
    }

    fn names(page: &ChildPage) -> Vec<&str> {
        page.children.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn test_sorts_directories_first_case_insensitive() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("b.txt"), "b")?;
        fs::write(dir.path().join("A.txt"), "a")?;
        fs::create_dir(dir.path().join("zeta"))?;
        fs::create_dir(dir.path().join("Alpha"))?;

        let scanner = scanner_for(&dir)?;
        let page = scanner.list_children(Path::new(""), 0, 10)?;
        assert_eq!(names(&page), vec!["Alpha", "zeta", "A.txt", "b.txt"]);
        assert_eq!(page.total, 4);
        assert!(!page.has_more);
        Ok(())
    }

    #[test]
    fn test_annotations() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir(dir.path().join("empty"))?;
        fs::create_dir(dir.path().join("only_ignored"))?;
        fs::create_dir(dir.path().join("only_ignored").join(".git"))?;
        fs::create_dir(dir.path().join("full"))?;
        fs::write(dir.path().join("full").join("x.rs"), "fn x() {}")?;
        fs::write(dir.path().join("ten.txt"), "0123456789")?;

        let scanner = scanner_for(&dir)?;
        let page = scanner.list_children(Path::new(""), 0, 10)?;
        let by_name = |name: &str| page.children.iter().find(|n| n.name == name).unwrap();

        assert_eq!(by_name("empty").has_children, Some(false));
        assert_eq!(by_name("only_ignored").has_children, Some(false));
        assert_eq!(by_name("full").has_children, Some(true));
        assert_eq!(by_name("full").size, None);
        assert_eq!(by_name("ten.txt").size, Some(10));
        assert_eq!(by_name("ten.txt").has_children, None);
        Ok(())
    }

    #[test]
    fn test_pagination_reassembles_full_listing() -> Result<()> {
        let dir = tempdir()?;
        for i in 0..7 {
            fs::create_dir(dir.path().join(format!("d{}", i)))?;
            fs::write(dir.path().join(format!("f{}.txt", i)), "x")?;
        }

        let scanner = scanner_for(&dir)?;
        let full = scanner.list_children(Path::new(""), 0, 100)?;

        let mut collected = Vec::new();
        let mut offset = 0;
        loop {
            let page = scanner.list_children(Path::new(""), offset, 3)?;
            offset += page.children.len();
            collected.extend(page.children.clone());
            if !page.has_more {
                break;
            }
        }

        assert_eq!(collected, full.children);
        assert_eq!(collected.len(), 14);
        Ok(())
    }

    #[test]
    fn test_offset_past_end_is_empty() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.txt"), "a")?;

        let scanner = scanner_for(&dir)?;
        let page = scanner.list_children(Path::new(""), 5, 10)?;
        assert!(page.children.is_empty());
        assert_eq!(page.total, 1);
        assert!(!page.has_more);
        Ok(())
    }

    #[test]
    fn test_invalid_directory_arguments() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("file.txt"), "x")?;

        let scanner = scanner_for(&dir)?;
        for bad in ["missing", "file.txt", ".."] {
            let err = scanner.list_children(Path::new(bad), 0, 10).unwrap_err();
            assert!(err.is_path_violation(), "{} should be rejected", bad);
        }
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_is_skipped() -> Result<()> {
        let outer = tempdir()?;
        let root = outer.path().join("root");
        fs::create_dir(&root)?;
        fs::write(outer.path().join("secret.txt"), "s")?;
        fs::write(root.join("ok.txt"), "o")?;
        std::os::unix::fs::symlink(outer.path().join("secret.txt"), root.join("escape.txt"))?;
        std::os::unix::fs::symlink(&root, root.join("loop"))?;

        let scanner = Scanner::new(
            fs::canonicalize(&root)?,
            Arc::new(IgnoreMatcher::default()),
        );
        let page = scanner.list_children(Path::new(""), 0, 10)?;
        assert_eq!(names(&page), vec!["ok.txt"]);
        Ok(())
    }
}
