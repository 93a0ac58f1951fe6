//! Breadth-first traversal over paginated listings
//!
//! Every bulk operation (select a subtree, select everything, collect the
//! files under a directory, expand everything) goes through
//! [`walk_breadth_first`], parameterized by a descend predicate and a visitor.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::scanner::Scanner;
use crate::types::{ChildPage, Node};

/// Anything that can list one page of a directory
pub trait TreeSource {
    /// Same contract as [`Scanner::list_children`]
    fn list_children(&self, dir: &Path, offset: usize, limit: usize) -> Result<ChildPage>;
}

impl TreeSource for Scanner {
    fn list_children(&self, dir: &Path, offset: usize, limit: usize) -> Result<ChildPage> {
        Scanner::list_children(self, dir, offset, limit)
    }
}

/// Every child of `dir`, fetching pages until the listing is exhausted
pub fn list_all<S: TreeSource + ?Sized>(source: &S, dir: &Path, page_size: usize) -> Result<Vec<Node>> {
    let page_size = page_size.max(1);
    let mut children = Vec::new();
    loop {
        let page = source.list_children(dir, children.len(), page_size)?;
        let fetched = page.children.len();
        children.extend(page.children);
        if fetched == 0 || children.len() >= page.total {
            return Ok(children);
        }
    }
}

/// Visit every descendant of `start` level by level
///
/// Pages of one directory are fetched sequentially. `visit` sees every
/// listed child together with the directory it was listed in, which differs
/// from the child's own parent for file symlinks. Directories are queued only
/// when `descend` accepts them.
/// Failing to list `start` is an error; a descendant that vanished or became
/// unreadable mid-walk is skipped. Returns the number of visited nodes.
pub fn walk_breadth_first<S, D, V>(
    source: &S,
    start: &Path,
    page_size: usize,
    mut descend: D,
    mut visit: V,
) -> Result<usize>
where
    S: TreeSource + ?Sized,
    D: FnMut(&Node) -> bool,
    V: FnMut(&Path, &Node),
{
    let page_size = page_size.max(1);
    let mut queue: VecDeque<PathBuf> = VecDeque::from([start.to_path_buf()]);
    let mut queued: HashSet<PathBuf> = HashSet::from([start.to_path_buf()]);
    let mut visited = 0;

    while let Some(dir) = queue.pop_front() {
        let mut offset = 0;
        loop {
            let page = match source.list_children(&dir, offset, page_size) {
                Ok(page) => page,
                Err(e) if dir == start => return Err(e),
                Err(e) => {
                    log::warn!("Skipping {} during walk: {}", dir.display(), e);
                    break;
                }
            };

            offset += page.children.len();
            for child in &page.children {
                visit(&dir, child);
                visited += 1;
                if child.is_dir
                    && descend(child)
                    && queued.insert(child.absolute_path.clone())
                {
                    queue.push_back(child.absolute_path.clone());
                }
            }

            if page.children.is_empty() || offset >= page.total {
                break;
            }
        }
    }

    Ok(visited)
}
