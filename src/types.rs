/*!
 * Core types and data structures for promptree
 */

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One immediate child of a listed directory
///
/// Identity is `absolute_path`, which is canonical and always inside the root.
/// Directories carry `has_children` and never `size`; files the other way round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Entry name
    pub name: String,
    /// POSIX path relative to the root
    #[serde(rename = "path")]
    pub relative_path: String,
    /// Canonical absolute path
    #[serde(rename = "fullPath")]
    pub absolute_path: PathBuf,
    /// Whether this entry is a directory
    #[serde(rename = "isDirectory")]
    pub is_dir: bool,
    /// Size in bytes (files only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Whether at least one non-ignored entry exists below (directories only)
    #[serde(
        default,
        rename = "hasChildren",
        skip_serializing_if = "Option::is_none"
    )]
    pub has_children: Option<bool>,
}

impl Node {
    /// Create a directory node
    pub fn directory(
        name: impl Into<String>,
        relative_path: impl Into<String>,
        absolute_path: PathBuf,
        has_children: bool,
    ) -> Self {
        Self {
            name: name.into(),
            relative_path: relative_path.into(),
            absolute_path,
            is_dir: true,
            size: None,
            has_children: Some(has_children),
        }
    }

    /// Create a file node
    pub fn file(
        name: impl Into<String>,
        relative_path: impl Into<String>,
        absolute_path: PathBuf,
        size: u64,
    ) -> Self {
        Self {
            name: name.into(),
            relative_path: relative_path.into(),
            absolute_path,
            is_dir: false,
            size: Some(size),
            has_children: None,
        }
    }
}

/// One page of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildPage {
    /// Nodes in server order: directories first, then case-insensitive name
    pub children: Vec<Node>,
    /// Offset this page starts at
    pub offset: usize,
    /// Requested page size
    pub limit: usize,
    /// Number of non-ignored children in the whole directory
    pub total: usize,
    /// Whether entries remain after this page
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

impl ChildPage {
    /// An empty page for a directory that could not be scanned
    pub fn empty(offset: usize, limit: usize) -> Self {
        Self {
            children: Vec::new(),
            offset,
            limit,
            total: 0,
            has_more: false,
        }
    }
}

/// Description of the directory a page was listed from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentInfo {
    /// Directory name (the root's full path when the name is empty)
    pub name: String,
    /// POSIX path relative to the root, empty for the root itself
    pub path: String,
    /// Canonical absolute path
    #[serde(rename = "fullPath")]
    pub full_path: PathBuf,
}

/// Why rendered text is not the file's own content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    /// The file looks binary and was replaced by a placeholder
    Binary,
    /// The file could not be stat'ed, opened or read
    Error,
}

/// Safe textual representation of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedText {
    /// Text to place inside the fence
    pub text: String,
    /// Whether the content was cut at the size cap
    pub truncated: bool,
    /// Set when `text` is a placeholder or an error message
    pub note: Option<NoteKind>,
}

impl RenderedText {
    /// Plain file content
    pub fn content(text: String, truncated: bool) -> Self {
        Self {
            text,
            truncated,
            note: None,
        }
    }

    /// Error note in place of the content
    pub fn error(message: String) -> Self {
        Self {
            text: message,
            truncated: false,
            note: Some(NoteKind::Error),
        }
    }

    /// Fixed binary placeholder
    pub fn binary(placeholder: &str) -> Self {
        Self {
            text: placeholder.to_string(),
            truncated: false,
            note: Some(NoteKind::Binary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_node_json_shape() {
        let node = Node::directory("src", "src", PathBuf::from("/r/src"), true);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["name"], "src");
        assert_eq!(json["fullPath"], "/r/src");
        assert_eq!(json["isDirectory"], true);
        assert_eq!(json["hasChildren"], true);
        assert!(json.get("size").is_none());
    }

    #[test]
    fn test_file_node_json_shape() {
        let node = Node::file("a.rs", "src/a.rs", PathBuf::from("/r/src/a.rs"), 12);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["path"], "src/a.rs");
        assert_eq!(json["size"], 12);
        assert!(json.get("hasChildren").is_none());
    }

    #[test]
    fn test_note_kind_display() {
        assert_eq!(NoteKind::Binary.to_string(), "binary");
        assert_eq!("error".parse::<NoteKind>().unwrap(), NoteKind::Error);
    }
}
