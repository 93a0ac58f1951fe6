//! Checkbox state derived from the selection overlay and the rendered tree
//!
//! Nothing here is stored. A node's state is recomputed on demand from the
//! marks and from whichever children are currently loaded in the cache.

use std::path::{Path, PathBuf};

use strum::Display;

use super::cache::PageCache;
use super::state::{Mark, SelectionState};
use crate::types::Node;

/// Visible checkbox state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum TriState {
    Checked,
    Unchecked,
    Indeterminate,
}

impl TriState {
    /// Fold the states of a directory's rendered children
    ///
    /// All checked gives checked, all unchecked gives unchecked, anything
    /// else (including an indeterminate child) is indeterminate. An empty
    /// iterator yields `None`.
    pub fn combine<I: IntoIterator<Item = TriState>>(states: I) -> Option<TriState> {
        let mut checked = 0usize;
        let mut unchecked = 0usize;
        let mut total = 0usize;
        for state in states {
            total += 1;
            match state {
                TriState::Checked => checked += 1,
                TriState::Unchecked => unchecked += 1,
                TriState::Indeterminate => {}
            }
        }
        match total {
            0 => None,
            _ if checked == total => Some(TriState::Checked),
            _ if unchecked == total => Some(TriState::Unchecked),
            _ => Some(TriState::Indeterminate),
        }
    }

    /// Marker used by the textual tree view
    pub fn marker(&self) -> &'static str {
        match self {
            TriState::Checked => "[x]",
            TriState::Unchecked => "[ ]",
            TriState::Indeterminate => "[-]",
        }
    }
}

/// Read-only view computing tri-state for rendered nodes
pub struct TriStateView<'a> {
    root: &'a Path,
    state: &'a SelectionState,
    cache: &'a PageCache,
}

impl<'a> TriStateView<'a> {
    pub fn new(root: &'a Path, state: &'a SelectionState, cache: &'a PageCache) -> Self {
        Self { root, state, cache }
    }

    /// State of any listed node
    pub fn node_state(&self, node: &Node) -> TriState {
        if node.is_dir {
            self.dir_state(&node.absolute_path)
        } else if self.state.get(&node.absolute_path) == Some(Mark::File) {
            TriState::Checked
        } else {
            TriState::Unchecked
        }
    }

    /// State of a directory from its rendered children, or its own mark
    pub fn dir_state(&self, dir: &Path) -> TriState {
        let from_children = self
            .cache
            .get(dir)
            .and_then(|page| TriState::combine(page.children.iter().map(|c| self.node_state(c))));

        match from_children {
            Some(state) => state,
            None if self.state.get(dir) == Some(Mark::Dir) => TriState::Checked,
            None => TriState::Unchecked,
        }
    }

    /// Recompute every ancestor of `path`, nearest first, up to the root
    pub fn refresh_upward(&self, path: &Path) -> Vec<(PathBuf, TriState)> {
        path.ancestors()
            .skip(1)
            .take_while(|dir| dir.starts_with(self.root))
            .map(|dir| (dir.to_path_buf(), self.dir_state(dir)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChildPage;

    fn page(children: Vec<Node>) -> ChildPage {
        let total = children.len();
        ChildPage {
            children,
            offset: 0,
            limit: 100,
            total,
            has_more: false,
        }
    }

    fn fixture() -> (SelectionState, PageCache) {
        let mut cache = PageCache::default();
        cache.store_first(
            "/r",
            page(vec![
                Node::directory("a", "a", PathBuf::from("/r/a"), true),
                Node::file("top.txt", "top.txt", PathBuf::from("/r/top.txt"), 1),
            ]),
        );
        cache.store_first(
            "/r/a",
            page(vec![
                Node::file("x.txt", "a/x.txt", PathBuf::from("/r/a/x.txt"), 1),
                Node::file("y.txt", "a/y.txt", PathBuf::from("/r/a/y.txt"), 1),
            ]),
        );
        (SelectionState::default(), cache)
    }

    #[test]
    fn test_combine() {
        use TriState::*;
        assert_eq!(TriState::combine([Checked, Checked]), Some(Checked));
        assert_eq!(TriState::combine([Unchecked, Unchecked]), Some(Unchecked));
        assert_eq!(TriState::combine([Checked, Unchecked]), Some(Indeterminate));
        assert_eq!(TriState::combine([Indeterminate, Indeterminate]), Some(Indeterminate));
        assert_eq!(TriState::combine(Vec::new()), None);
    }

    #[test]
    fn test_upward_propagation() {
        let (mut state, cache) = fixture();
        state.set("/r/a/x.txt", Mark::File);

        let view = TriStateView::new(Path::new("/r"), &state, &cache);
        let states = view.refresh_upward(Path::new("/r/a/x.txt"));
        assert_eq!(
            states,
            vec![
                (PathBuf::from("/r/a"), TriState::Indeterminate),
                (PathBuf::from("/r"), TriState::Indeterminate),
            ]
        );
    }

    #[test]
    fn test_all_children_checked() {
        let (mut state, cache) = fixture();
        state.set("/r/a/x.txt", Mark::File);
        state.set("/r/a/y.txt", Mark::File);
        state.set("/r/top.txt", Mark::File);

        let view = TriStateView::new(Path::new("/r"), &state, &cache);
        assert_eq!(view.dir_state(Path::new("/r/a")), TriState::Checked);
        assert_eq!(view.dir_state(Path::new("/r")), TriState::Checked);
    }

    #[test]
    fn test_exclusion_under_selected_dir_is_indeterminate() {
        let (mut state, cache) = fixture();
        state.set("/r/a", Mark::Dir);
        state.set("/r/a/x.txt", Mark::File);
        state.set("/r/a/y.txt", Mark::Excluded);

        let view = TriStateView::new(Path::new("/r"), &state, &cache);
        assert_eq!(view.dir_state(Path::new("/r/a")), TriState::Indeterminate);
    }

    #[test]
    fn test_unrendered_dir_uses_its_mark() {
        let (mut state, cache) = fixture();
        state.set("/r/other", Mark::Dir);
        let view = TriStateView::new(Path::new("/r"), &state, &cache);
        assert_eq!(view.dir_state(Path::new("/r/other")), TriState::Checked);
        assert_eq!(view.dir_state(Path::new("/r/unknown")), TriState::Unchecked);
    }
}
