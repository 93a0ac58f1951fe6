//! Sparse, path-keyed selection overlays
//!
//! None of these maps know about tree shape. They are keyed by canonical
//! absolute paths so lazily loaded pages never fall out of sync with what
//! the user asked for.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Explicit selection state of one path
///
/// Serialized the way the store has always recorded it: `true` for a
/// selected file, `"dir"` for a whole-subtree directory selection and
/// `false` for an explicit exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMark", into = "RawMark")]
pub enum Mark {
    /// File selected
    File,
    /// Directory selected with all descendants not explicitly excluded
    Dir,
    /// Explicitly excluded; wins over any inherited selection
    Excluded,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawMark {
    Flag(bool),
    Tag(String),
}

impl From<Mark> for RawMark {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::File => RawMark::Flag(true),
            Mark::Excluded => RawMark::Flag(false),
            Mark::Dir => RawMark::Tag("dir".to_string()),
        }
    }
}

impl TryFrom<RawMark> for Mark {
    type Error = String;

    fn try_from(raw: RawMark) -> Result<Self, Self::Error> {
        match raw {
            RawMark::Flag(true) => Ok(Mark::File),
            RawMark::Flag(false) => Ok(Mark::Excluded),
            RawMark::Tag(tag) if tag == "dir" => Ok(Mark::Dir),
            RawMark::Tag(tag) => Err(format!("unknown selection mark {:?}", tag)),
        }
    }
}

impl Mark {
    /// Mark applied by a select/deselect of an entry of the given kind
    pub fn for_toggle(is_dir: bool, checked: bool) -> Self {
        match (is_dir, checked) {
            (_, false) => Mark::Excluded,
            (true, true) => Mark::Dir,
            (false, true) => Mark::File,
        }
    }
}

/// Path → mark; absent paths have no explicit state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionState {
    marks: BTreeMap<PathBuf, Mark>,
}

impl SelectionState {
    pub fn get(&self, path: &Path) -> Option<Mark> {
        self.marks.get(path).copied()
    }

    pub fn set(&mut self, path: impl Into<PathBuf>, mark: Mark) {
        self.marks.insert(path.into(), mark);
    }

    pub fn remove(&mut self, path: &Path) -> Option<Mark> {
        self.marks.remove(path)
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.get(path) == Some(Mark::Excluded)
    }

    /// Paths carrying a given mark, in path order
    pub fn with_mark(&self, mark: Mark) -> impl Iterator<Item = &Path> + '_ {
        self.marks
            .iter()
            .filter(move |(_, m)| **m == mark)
            .map(|(p, _)| p.as_path())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, Mark)> + '_ {
        self.marks.iter().map(|(p, m)| (p.as_path(), *m))
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

/// Per-path consent to include an otherwise blacklisted entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowOverrides {
    allowed: BTreeMap<PathBuf, bool>,
}

impl AllowOverrides {
    pub fn grant(&mut self, path: impl Into<PathBuf>) {
        self.allowed.insert(path.into(), true);
    }

    pub fn is_allowed(&self, path: &Path) -> bool {
        self.allowed.get(path).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.allowed.values().filter(|v| **v).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Which directories are expanded (their first page is visible)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpandState {
    expanded: BTreeMap<PathBuf, bool>,
}

impl ExpandState {
    pub fn set(&mut self, path: impl Into<PathBuf>, expanded: bool) {
        self.expanded.insert(path.into(), expanded);
    }

    pub fn is_expanded(&self, path: &Path) -> bool {
        self.expanded.get(path).copied().unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.expanded.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_json_encoding() {
        let mut state = SelectionState::default();
        state.set("/r/a.txt", Mark::File);
        state.set("/r/dir", Mark::Dir);
        state.set("/r/skip.txt", Mark::Excluded);

        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(
            json,
            r#"{"/r/a.txt":true,"/r/dir":"dir","/r/skip.txt":false}"#
        );

        let back: SelectionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_unknown_mark_is_rejected() {
        let parsed: Result<SelectionState, _> = serde_json::from_str(r#"{"/r/x":"file"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_for_toggle() {
        assert_eq!(Mark::for_toggle(true, true), Mark::Dir);
        assert_eq!(Mark::for_toggle(false, true), Mark::File);
        assert_eq!(Mark::for_toggle(true, false), Mark::Excluded);
        assert_eq!(Mark::for_toggle(false, false), Mark::Excluded);
    }

    #[test]
    fn test_with_mark_filters() {
        let mut state = SelectionState::default();
        state.set("/r/a", Mark::Dir);
        state.set("/r/b", Mark::Excluded);
        state.set("/r/c", Mark::Dir);
        let dirs: Vec<_> = state.with_mark(Mark::Dir).collect();
        assert_eq!(dirs, vec![Path::new("/r/a"), Path::new("/r/c")]);
        assert!(state.is_excluded(Path::new("/r/b")));
    }

    #[test]
    fn test_overrides_and_expansion_default_to_false() {
        let mut allow = AllowOverrides::default();
        assert!(!allow.is_allowed(Path::new("/r/.env")));
        allow.grant("/r/.env");
        assert!(allow.is_allowed(Path::new("/r/.env")));

        let mut expanded = ExpandState::default();
        expanded.set("/r/src", true);
        assert!(expanded.is_expanded(Path::new("/r/src")));
        expanded.clear();
        assert!(!expanded.is_expanded(Path::new("/r/src")));
    }
}
