/*!
 * Markdown snapshot assembly for promptree
 */

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::render::{fenced, ContentRenderer};
use crate::types::RenderedText;
use crate::utils::{detect_language, relative_posix, resolve_within};

/// One rendered file of a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotBlock {
    /// POSIX path relative to the root, used as the heading
    pub relative_path: String,
    /// Canonical absolute path
    pub absolute_path: PathBuf,
    /// Fence language tag (empty when unknown or for notes)
    pub language: &'static str,
    /// Rendered content
    pub rendered: RenderedText,
}

impl SnapshotBlock {
    /// Bold heading followed by the fenced content
    pub fn to_markdown(&self) -> String {
        let lang = if self.rendered.note.is_some() {
            ""
        } else {
            self.language
        };
        format!(
            "**{}**\n{}\n",
            self.relative_path,
            fenced(&self.rendered.text, lang)
        )
    }
}

/// Markdown writer for a list of selected files
#[derive(Debug, Clone)]
pub struct MarkdownWriter {
    /// Canonical root
    root: PathBuf,
    /// Per-file renderer
    renderer: ContentRenderer,
}

impl MarkdownWriter {
    /// Create a new writer
    pub fn new(root: PathBuf, renderer: ContentRenderer) -> Self {
        Self { root, renderer }
    }

    /// Create a writer from a validated configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.root.clone(), ContentRenderer::from_config(config))
    }

    /// Render every valid path in caller order
    ///
    /// Paths may be absolute or relative to the root. Anything that does not
    /// resolve to an existing regular file inside the root is dropped.
    pub fn blocks<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<SnapshotBlock> {
        paths
            .iter()
            .filter_map(|raw| {
                let raw = raw.as_ref();
                let resolved = resolve_within(&self.root, raw).filter(|p| p.is_file());
                if resolved.is_none() {
                    log::debug!("Dropping {} from snapshot", raw.display());
                }
                resolved
            })
            .map(|absolute| {
                let relative_path = relative_posix(&self.root, &absolute).unwrap_or_default();
                SnapshotBlock {
                    language: detect_language(&absolute),
                    rendered: self.renderer.render(&absolute),
                    relative_path,
                    absolute_path: absolute,
                }
            })
            .collect()
    }

    /// Assemble the snapshot document
    pub fn assemble<P: AsRef<Path>>(&self, paths: &[P]) -> String {
        self.blocks(paths)
            .iter()
            .map(SnapshotBlock::to_markdown)
            .collect()
    }

    /// Write an assembled snapshot to a file
    pub fn write_to_file(&self, snapshot: &str, output: &Path) -> io::Result<()> {
        let file = File::create(output)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(snapshot.as_bytes())?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn writer_for(dir: &TempDir) -> io::Result<MarkdownWriter> {
        Ok(MarkdownWriter::new(
            fs::canonicalize(dir.path())?,
            ContentRenderer::default(),
        ))
    }

    #[test]
    fn test_block_format_with_language() -> io::Result<()> {
        let dir = tempdir()?;
        fs::create_dir(dir.path().join("src"))?;
        fs::write(dir.path().join("src").join("lib.rs"), "pub fn f() {}")?;

        let out = writer_for(&dir)?.assemble(&["src/lib.rs"]);
        assert_eq!(out, "**src/lib.rs**\n```rust\npub fn f() {}\n```\n\n");
        Ok(())
    }

    #[test]
    fn test_caller_order_and_silent_drops() -> io::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("b.txt"), "B")?;
        fs::write(dir.path().join("a.txt"), "A")?;
        fs::create_dir(dir.path().join("folder"))?;

        let writer = writer_for(&dir)?;
        let abs_a = dir.path().join("a.txt");
        let paths = vec![
            PathBuf::from("b.txt"),
            PathBuf::from("missing.txt"),
            PathBuf::from("folder"),
            PathBuf::from("../outside.txt"),
            abs_a,
        ];

        let blocks = writer.blocks(&paths);
        let headings: Vec<_> = blocks.iter().map(|b| b.relative_path.as_str()).collect();
        assert_eq!(headings, vec!["b.txt", "a.txt"]);
        Ok(())
    }

    #[test]
    fn test_notes_keep_heading_and_fence() -> io::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("blob.py"), [0u8, 1, 2])?;

        let out = writer_for(&dir)?.assemble(&["blob.py"]);
        assert_eq!(out, "**blob.py**\n```\n<Binary file omitted>\n```\n\n");
        Ok(())
    }

    #[test]
    fn test_content_with_fences_gets_longer_fence() -> io::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("README.md"), "```sh\nls\n```")?;

        let out = writer_for(&dir)?.assemble(&["README.md"]);
        assert!(out.starts_with("**README.md**\n````markdown\n"));
        assert!(out.ends_with("\n````\n\n"));
        Ok(())
    }

    #[test]
    fn test_empty_selection_is_empty_string() -> io::Result<()> {
        let dir = tempdir()?;
        let paths: Vec<PathBuf> = Vec::new();
        assert_eq!(writer_for(&dir)?.assemble(&paths), "");
        Ok(())
    }
}
