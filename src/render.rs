/*!
 * Safe textual rendering of file contents
 */

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{Config, BINARY_SNIFF_BYTES, DEFAULT_MAX_FILE_BYTES};
use crate::types::RenderedText;

/// Body used in place of binary content
pub const BINARY_PLACEHOLDER: &str = "<Binary file omitted>";

static BACKTICK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new("`+").expect("valid regex"));

/// Renders one file as bounded, fence-safe text
#[derive(Debug, Clone, Copy)]
pub struct ContentRenderer {
    /// Cap on bytes read from the file
    max_file_bytes: u64,
    /// Prefix length inspected for NUL bytes
    sniff_bytes: usize,
}

impl Default for ContentRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_BYTES, BINARY_SNIFF_BYTES)
    }
}

impl ContentRenderer {
    /// Create a renderer with explicit limits
    pub fn new(max_file_bytes: u64, sniff_bytes: usize) -> Self {
        Self {
            max_file_bytes,
            sniff_bytes,
        }
    }

    /// Create a renderer from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_file_bytes, config.binary_sniff_bytes)
    }

    /// The configured byte cap
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_bytes
    }

    /// Render a file; failures become error notes rather than errors
    pub fn render(&self, path: &Path) -> RenderedText {
        let size = match fs::metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(e) => return RenderedText::error(format!("Error: stat failed: {}", e)),
        };

        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) => return RenderedText::error(format!("Error: open failed: {}", e)),
        };

        let mut data = Vec::new();
        if let Err(e) = (&mut file).take(self.sniff_bytes as u64).read_to_end(&mut data) {
            return RenderedText::error(format!("Error: read failed: {}", e));
        }
        if data.contains(&0) {
            log::debug!("{} classified as binary", path.display());
            return RenderedText::binary(BINARY_PLACEHOLDER);
        }

        let to_read = size.min(self.max_file_bytes);
        if (data.len() as u64) < to_read {
            let remaining = to_read - data.len() as u64;
            if let Err(e) = file.take(remaining).read_to_end(&mut data) {
                return RenderedText::error(format!("Error: read failed: {}", e));
            }
        }
        data.truncate(to_read as usize);

        let truncated = size > self.max_file_bytes;
        let mut text = String::from_utf8_lossy(&data).into_owned();
        if truncated {
            log::debug!(
                "{} truncated to {} of {} bytes",
                path.display(),
                self.max_file_bytes,
                size
            );
            text = format!(
                "<Truncated: {} bytes > {} byte preview>\n{}",
                size, self.max_file_bytes, text
            );
        }

        RenderedText::content(text, truncated)
    }
}

/// Backtick fence longer than any backtick run inside `text`, at least 3
pub fn fence_for(text: &str) -> String {
    let longest = BACKTICK_RUN
        .find_iter(text)
        .map(|m| m.as_str().len())
        .max()
        .unwrap_or(0);
    "`".repeat((longest + 1).max(3))
}

/// Wrap `text` in a fenced code block tagged with `lang`
pub fn fenced(text: &str, lang: &str) -> String {
    let fence = fence_for(text);
    format!("{fence}{lang}\n{text}\n{fence}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NoteKind;
    use std::io;
    use tempfile::tempdir;

    #[test]
    fn test_fence_length() {
        assert_eq!(fence_for("plain"), "```");
        assert_eq!(fence_for("inline `code` here"), "```");
        assert_eq!(fence_for("```rust\nfn x() {}\n```"), "````");
        assert_eq!(fence_for("a ````` b"), "``````");
    }

    #[test]
    fn test_fence_always_exceeds_content_runs() {
        for k in 0..12 {
            let text = format!("before {} after", "`".repeat(k));
            let fence = fence_for(&text);
            assert!(fence.len() > k);
            assert!(fence.len() >= 3);
        }
    }

    #[test]
    fn test_fenced_block_layout() {
        assert_eq!(fenced("x = 1", "python"), "```python\nx = 1\n```\n");
    }

    #[test]
    fn test_render_plain_text() -> io::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("a.txt");
        fs::write(&path, "hello\nworld")?;

        let out = ContentRenderer::default().render(&path);
        assert_eq!(out, RenderedText::content("hello\nworld".to_string(), false));
        Ok(())
    }

    #[test]
    fn test_render_binary_by_nul_in_prefix() -> io::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("image.txt");
        let mut bytes = b"looks like text".to_vec();
        bytes.push(0);
        bytes.extend(std::iter::repeat(b'a').take(10_000));
        fs::write(&path, bytes)?;

        let out = ContentRenderer::default().render(&path);
        assert_eq!(out.text, BINARY_PLACEHOLDER);
        assert_eq!(out.note, Some(NoteKind::Binary));
        assert!(!out.truncated);
        Ok(())
    }

    #[test]
    fn test_nul_after_sniff_window_is_text() -> io::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("late.txt");
        let mut bytes = vec![b'a'; 64];
        bytes.push(0);
        fs::write(&path, bytes)?;

        let out = ContentRenderer::new(1024, 16).render(&path);
        assert_eq!(out.note, None);
        Ok(())
    }

    #[test]
    fn test_render_truncates_at_cap() -> io::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("big.txt");
        let cap = 100u64;
        fs::write(&path, "x".repeat(cap as usize + 1))?;

        let out = ContentRenderer::new(cap, 16).render(&path);
        assert!(out.truncated);
        let (notice, body) = out.text.split_once('\n').unwrap();
        assert_eq!(notice, "<Truncated: 101 bytes > 100 byte preview>");
        assert_eq!(body.len(), cap as usize);
        Ok(())
    }

    #[test]
    fn test_render_exactly_at_cap_is_not_truncated() -> io::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("edge.txt");
        fs::write(&path, "y".repeat(50))?;

        let out = ContentRenderer::new(50, 8).render(&path);
        assert!(!out.truncated);
        assert_eq!(out.text.len(), 50);
        Ok(())
    }

    #[test]
    fn test_invalid_utf8_is_replaced() -> io::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("latin1.txt");
        fs::write(&path, [b'c', b'a', b'f', 0xE9])?;

        let out = ContentRenderer::default().render(&path);
        assert_eq!(out.note, None);
        assert_eq!(out.text, "caf\u{FFFD}");
        Ok(())
    }

    #[test]
    fn test_missing_file_yields_error_note() {
        let out = ContentRenderer::default().render(Path::new("/definitely/not/here.txt"));
        assert_eq!(out.note, Some(NoteKind::Error));
        assert!(out.text.starts_with("Error: stat failed:"));
    }

    #[test]
    fn test_render_is_idempotent() -> io::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("same.md");
        fs::write(&path, "# title\n```\ncode\n```\n")?;

        let renderer = ContentRenderer::new(10, 4);
        assert_eq!(renderer.render(&path), renderer.render(&path));
        Ok(())
    }
}
