/*!
 * Utility functions for promptree
 */

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;

/// Canonicalize `path` and return it only if it stays inside `root`
///
/// `root` must already be canonical. Relative paths are taken relative to
/// `root`; absolute paths are used as given. Symlinks are followed, so an
/// entry pointing outside the root yields `None`.
pub fn resolve_within(root: &Path, path: &Path) -> Option<PathBuf> {
    let candidate = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    let resolved = fs::canonicalize(candidate).ok()?;
    resolved.starts_with(root).then_some(resolved)
}

/// POSIX-style path of `path` relative to `root`, or `None` if outside
pub fn relative_posix(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

/// Format a human-readable file size
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

/// Fence language tags keyed by lowercase extension
static LANGUAGES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("py", "python"),
        ("js", "javascript"),
        ("ts", "typescript"),
        ("jsx", "jsx"),
        ("tsx", "tsx"),
        ("json", "json"),
        ("java", "java"),
        ("c", "c"),
        ("h", "c"),
        ("cpp", "cpp"),
        ("cc", "cpp"),
        ("hpp", "cpp"),
        ("cs", "csharp"),
        ("go", "go"),
        ("rb", "ruby"),
        ("php", "php"),
        ("html", "html"),
        ("css", "css"),
        ("scss", "scss"),
        ("sh", "bash"),
        ("zsh", "bash"),
        ("yml", "yaml"),
        ("yaml", "yaml"),
        ("toml", "toml"),
        ("md", "markdown"),
        ("sql", "sql"),
        ("kt", "kotlin"),
        ("rs", "rust"),
        ("swift", "swift"),
    ])
});

/// Language tag for a file, empty when the extension is unknown
pub fn detect_language(path: &Path) -> &'static str {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .and_then(|ext| LANGUAGES.get(ext.as_str()).copied())
        .unwrap_or("")
}
