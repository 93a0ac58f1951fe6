//! Client-side cache of loaded listing pages

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::walk::TreeSource;
use crate::error::Result;
use crate::types::{ChildPage, Node};

/// Children loaded so far for one directory
///
/// `children` keeps the order the pages arrived in; the server is the only
/// authority on ordering, so nothing here ever re-sorts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedPage {
    pub children: Vec<Node>,
    pub total: usize,
    pub offset_loaded: usize,
}

impl CachedPage {
    pub fn has_more(&self) -> bool {
        self.offset_loaded < self.total
    }
}

/// Directory path → loaded children
#[derive(Debug, Clone, Default)]
pub struct PageCache {
    pages: HashMap<PathBuf, CachedPage>,
}

impl PageCache {
    pub fn get(&self, dir: &Path) -> Option<&CachedPage> {
        self.pages.get(dir)
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.pages.contains_key(dir)
    }

    /// Replace whatever was cached for `dir` with its first page
    pub fn store_first(&mut self, dir: impl Into<PathBuf>, page: ChildPage) {
        let offset_loaded = page.children.len().min(page.total);
        self.pages.insert(
            dir.into(),
            CachedPage {
                children: page.children,
                total: page.total,
                offset_loaded,
            },
        );
    }

    /// Append a following page after the already loaded children
    pub fn append(&mut self, dir: impl Into<PathBuf>, page: ChildPage) {
        let dir = dir.into();
        match self.pages.get_mut(&dir) {
            Some(cached) => {
                cached.offset_loaded = (cached.offset_loaded + page.children.len()).min(page.total);
                cached.total = page.total;
                cached.children.extend(page.children);
            }
            None => self.store_first(dir, page),
        }
    }

    /// Offset of the next page to request for `dir`
    pub fn next_offset(&self, dir: &Path) -> usize {
        self.pages.get(dir).map(|p| p.offset_loaded).unwrap_or(0)
    }

    /// Fetch the next page of `dir` and append it
    pub fn load_more<S: TreeSource + ?Sized>(
        &mut self,
        source: &S,
        dir: &Path,
        limit: usize,
    ) -> Result<&CachedPage> {
        let page = source.list_children(dir, self.next_offset(dir), limit)?;
        self.append(dir, page);
        Ok(&self.pages[dir])
    }

    /// Cached directories and their pages, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &CachedPage)> + '_ {
        self.pages.iter().map(|(dir, page)| (dir.as_path(), page))
    }

    /// Every cached node, in no particular directory order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.pages.values().flat_map(|p| p.children.iter())
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
