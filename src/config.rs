/*!
 * Configuration handling for promptree
 */

use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use clap_complete::Shell;
use sha2::{Digest, Sha256};

use crate::ensure;
use crate::error::Result;

/// Default cap on bytes read from one file
pub const DEFAULT_MAX_FILE_BYTES: u64 = 1_048_576;

/// Prefix length inspected for NUL bytes
pub const BINARY_SNIFF_BYTES: usize = 4096;

/// Default number of children per listing page
pub const DEFAULT_PAGE_SIZE: usize = 500;

/// Command-line arguments for promptree
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "promptree",
    version = env!("CARGO_PKG_VERSION"),
    about = "Browse a directory tree, select files, and copy a Markdown snapshot for LLM context",
    long_about = "Lists directories lazily (ignore-aware, paginated), keeps a persistent tri-state selection, and assembles the selected files into one bounded Markdown document suitable for pasting into an LLM prompt."
)]
pub struct Args {
    /// Root directory; nothing outside it is ever listed or read
    #[clap(long, env = "PROMPTREE_ROOT", default_value = ".", global = true)]
    pub root: PathBuf,

    /// Maximum number of bytes rendered per file
    #[clap(long, env = "PROMPTREE_MAX_FILE_BYTES", default_value_t = DEFAULT_MAX_FILE_BYTES, global = true)]
    pub max_file_bytes: u64,

    /// Number of leading bytes inspected to detect binary files
    #[clap(long, default_value_t = BINARY_SNIFF_BYTES, global = true)]
    pub sniff_bytes: usize,

    /// Ignore file to read (defaults to <root>/.promptreeignore)
    #[clap(long, global = true)]
    pub ignore_file: Option<PathBuf>,

    /// Comma-separated list of extra patterns to ignore
    #[clap(long, value_delimiter = ',', global = true)]
    pub ignore: Vec<String>,

    /// Also hide entries matched by the root .gitignore
    #[clap(long, global = true)]
    pub respect_gitignore: bool,

    /// Where the selection is persisted (defaults to the local data directory)
    #[clap(long, env = "PROMPTREE_STATE_FILE", global = true)]
    pub state_file: Option<PathBuf>,

    /// Children fetched per listing page
    #[clap(long, default_value_t = DEFAULT_PAGE_SIZE, global = true)]
    pub page_size: usize,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Silence all logging
    #[clap(short, long, global = true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub command: Command,
}

/// Where an assembled snapshot goes
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Copy the snapshot to the system clipboard
    #[clap(long)]
    pub clip: bool,

    /// Write the snapshot to a file instead of stdout
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Print a statistics report to stderr
    #[clap(long)]
    pub report: bool,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List one page of a directory's immediate children
    Tree {
        /// Directory relative to the root (or absolute inside it)
        path: Option<String>,

        /// First child to return
        #[clap(long, default_value_t = 0)]
        offset: usize,

        /// Page size (defaults to --page-size)
        #[clap(long)]
        limit: Option<usize>,

        /// Print the JSON response instead of a listing
        #[clap(long)]
        json: bool,
    },

    /// Assemble a snapshot of the given files
    Copy {
        /// Files relative to the root (or absolute inside it)
        files: Vec<String>,

        #[clap(flatten)]
        output: OutputArgs,
    },

    /// Select a file, or a directory with everything below it
    Select {
        /// Path relative to the root (or absolute inside it)
        path: PathBuf,

        /// Include blacklisted paths without asking
        #[clap(long)]
        yes: bool,
    },

    /// Exclude a file, or a directory with everything below it
    Unselect {
        /// Path relative to the root (or absolute inside it)
        path: PathBuf,
    },

    /// Select every permitted entry under the root
    SelectAll,

    /// Clear every visible entry and rebuild the selection from them
    UnselectAll,

    /// Toggle whether a directory is expanded
    Expand {
        /// Directory relative to the root (or absolute inside it)
        path: PathBuf,
    },

    /// Expand every permitted directory, loading all pages
    ExpandAll {
        /// Overall deadline in seconds
        #[clap(long, default_value_t = 20)]
        timeout: u64,
    },

    /// Collapse every directory
    CollapseAll,

    /// Show the visible tree with selection markers
    Status,

    /// Assemble a snapshot of the current selection
    Snapshot {
        #[clap(flatten)]
        output: OutputArgs,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[clap(value_enum)]
        shell: Shell,
    },
}

/// Application configuration, immutable once validated
#[derive(Clone, Debug)]
pub struct Config {
    /// Root boundary (canonical after validation)
    pub root: PathBuf,

    /// Maximum number of bytes rendered per file
    pub max_file_bytes: u64,

    /// Prefix length inspected for NUL bytes
    pub binary_sniff_bytes: usize,

    /// Explicit ignore file
    pub ignore_file: Option<PathBuf>,

    /// Extra ignore patterns
    pub ignore_patterns: Vec<String>,

    /// Whether the root .gitignore is honoured
    pub respect_gitignore: bool,

    /// Explicit selection store location
    pub state_file: Option<PathBuf>,

    /// Children fetched per listing page
    pub page_size: usize,
}

impl Config {
    /// Configuration with defaults for the given root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            binary_sniff_bytes: BINARY_SNIFF_BYTES,
            ignore_file: None,
            ignore_patterns: Vec::new(),
            respect_gitignore: false,
            state_file: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Create configuration from command-line arguments
    pub fn from_args(args: &Args) -> Self {
        Self {
            root: args.root.clone(),
            max_file_bytes: args.max_file_bytes,
            binary_sniff_bytes: args.sniff_bytes,
            ignore_file: args.ignore_file.clone(),
            ignore_patterns: args.ignore.clone(),
            respect_gitignore: args.respect_gitignore,
            state_file: args.state_file.clone(),
            page_size: args.page_size,
        }
    }

    /// Validate the configuration and canonicalize the root
    pub fn validate(mut self) -> Result<Self> {
        ensure!(
            self.root.is_dir(),
            Config,
            "Root directory not found: {}",
            self.root.display()
        );
        self.root = fs::canonicalize(&self.root)?;

        ensure!(self.max_file_bytes > 0, Config, "--max-file-bytes must be positive");
        ensure!(self.binary_sniff_bytes > 0, Config, "--sniff-bytes must be positive");
        ensure!(self.page_size > 0, Config, "--page-size must be positive");

        if let Some(path) = &self.ignore_file {
            ensure!(
                path.is_file(),
                Config,
                "Ignore file not found: {}",
                path.display()
            );
        }

        Ok(self)
    }

    /// Location of the persisted selection for this root
    pub fn state_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.state_file {
            return Some(path.clone());
        }
        dirs::data_local_dir().map(|dir| {
            dir.join("promptree")
                .join(format!("{}.json", root_fingerprint(&self.root)))
        })
    }
}

/// Stable per-root key so different projects keep separate selections
///
/// First 16 hex digits of the SHA-256 of the root path.
fn root_fingerprint(root: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(root.to_string_lossy().as_bytes());
    let mut digest = format!("{:x}", hasher.finalize());
    digest.truncate(16);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_validate_canonicalizes_root() -> Result<()> {
        let dir = tempdir()?;
        let nested = dir.path().join("a");
        fs::create_dir(&nested)?;

        let config = Config::new(nested.join("..").join("a")).validate()?;
        assert_eq!(config.root, fs::canonicalize(&nested)?);
        Ok(())
    }

    #[test]
    fn test_validate_rejects_missing_root_and_zero_limits() -> Result<()> {
        let dir = tempdir()?;
        assert!(Config::new(dir.path().join("missing")).validate().is_err());

        let mut config = Config::new(dir.path());
        config.page_size = 0;
        assert!(config.validate().is_err());
        Ok(())
    }

    #[test]
    fn test_state_path_prefers_explicit_file() {
        let mut config = Config::new("/tmp/project");
        config.state_file = Some(PathBuf::from("/tmp/sel.json"));
        assert_eq!(config.state_path(), Some(PathBuf::from("/tmp/sel.json")));
    }

    #[test]
    fn test_state_path_differs_per_root() {
        let a = Config::new("/tmp/one").state_path();
        let b = Config::new("/tmp/two").state_path();
        if a.is_some() {
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_root_fingerprint_is_pinned() {
        assert_eq!(root_fingerprint(Path::new("/tmp/project")), "f630ad93b344dd6b");
        if let Some(path) = Config::new("/tmp/project").state_path() {
            assert!(path.ends_with("promptree/f630ad93b344dd6b.json"));
        }
        assert_ne!(
            root_fingerprint(Path::new("/tmp/project")),
            root_fingerprint(Path::new("/tmp/project2"))
        );
    }

    #[test]
    fn test_args_parse_subcommand_and_globals() {
        let args = Args::parse_from([
            "promptree",
            "--root",
            "/tmp",
            "tree",
            "src",
            "--limit",
            "10",
            "--ignore",
            "*.log,tmp/",
        ]);
        assert_eq!(args.root, PathBuf::from("/tmp"));
        assert_eq!(args.ignore, vec!["*.log".to_string(), "tmp/".to_string()]);
        match args.command {
            Command::Tree { path, limit, offset, .. } => {
                assert_eq!(path.as_deref(), Some("src"));
                assert_eq!(limit, Some(10));
                assert_eq!(offset, 0);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
