/*!
 * Clipboard copy for snapshots
 *
 * Pipes text into whichever clipboard command the system offers. A custom
 * command can be forced with `PROMPTREE_CLIPBOARD`, e.g.
 * `PROMPTREE_CLIPBOARD="xclip -selection primary"`.
 */

use std::env;
use std::io::{self, Write};
use std::process::{Command, Stdio};

use once_cell::sync::Lazy;
use thiserror::Error;

/// Environment variable holding an explicit clipboard command line
pub const CLIPBOARD_ENV: &str = "PROMPTREE_CLIPBOARD";

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("No suitable clipboard mechanism found")]
    NoClipboardFound,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ClipboardError>;

/// Where copied text goes
pub trait Clipboard {
    fn copy_to_clipboard(&self, text: &str) -> Result<()>;
}

/// Known clipboard commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardProvider {
    Tmux,
    Wayland,
    Xsel,
    Xclip,
    MacOS,
    Windows,
    Termux,
    /// Command line taken from [`CLIPBOARD_ENV`]
    Custom(Vec<String>),
}

impl ClipboardProvider {
    /// Program and arguments that read the text from stdin
    pub fn command_line(&self) -> (String, Vec<String>) {
        fn fixed(cmd: &str, args: &[&str]) -> (String, Vec<String>) {
            (cmd.to_string(), args.iter().map(|a| a.to_string()).collect())
        }

        match self {
            Self::Tmux => fixed("tmux", &["load-buffer", "-w", "-"]),
            Self::Wayland => fixed("wl-copy", &[]),
            Self::Xsel => fixed("xsel", &["-b", "-i"]),
            Self::Xclip => fixed("xclip", &["-selection", "clipboard", "-in"]),
            Self::MacOS => fixed("pbcopy", &[]),
            Self::Windows => fixed("clip.exe", &[]),
            Self::Termux => fixed("termux-clipboard-set", &[]),
            Self::Custom(parts) => {
                let mut parts = parts.iter().cloned();
                let cmd = parts.next().unwrap_or_default();
                (cmd, parts.collect())
            }
        }
    }

    /// Parse a whitespace-separated command line
    pub fn custom(line: &str) -> Option<Self> {
        let parts: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if parts.is_empty() {
            None
        } else {
            Some(Self::Custom(parts))
        }
    }
}

impl Clipboard for ClipboardProvider {
    fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        let (cmd, args) = self.command_line();
        pipe_to_command(&cmd, &args, text)
    }
}

/// Copy text with the first provider that works
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let providers = detect_providers();
    if providers.is_empty() {
        return Err(ClipboardError::NoClipboardFound);
    }

    let mut last_error = ClipboardError::NoClipboardFound;
    for provider in providers {
        match provider.copy_to_clipboard(text) {
            Ok(()) => {
                log::debug!("Copied {} bytes with {:?}", text.len(), provider);
                return Ok(());
            }
            Err(e) => {
                log::debug!("Clipboard provider {:?} failed: {}", provider, e);
                last_error = e;
            }
        }
    }
    Err(last_error)
}

/// Whether `command` can be found on the PATH
pub fn command_exists(command: &str) -> bool {
    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| dir.join(command).is_file()))
        .unwrap_or(false)
}

fn pipe_to_command(cmd: &str, args: &[String], text: &str) -> Result<()> {
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ClipboardError::CommandFailed(format!("Failed to spawn {}: {}", cmd, e)))?;

    let written = match child.stdin.take() {
        // Dropping stdin closes the pipe so the command sees EOF
        Some(mut stdin) => stdin.write_all(text.as_bytes()).map_err(ClipboardError::from),
        None => Err(ClipboardError::CommandFailed(format!(
            "Failed to open stdin for {}",
            cmd
        ))),
    };
    if let Err(e) = written {
        // Reap the child before reporting
        if let Err(kill_err) = child.kill() {
            log::debug!("Could not kill {}: {}", cmd, kill_err);
        }
        child.wait()?;
        return Err(e);
    }

    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(ClipboardError::CommandFailed(format!(
            "{} exited with status: {}",
            cmd, status
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Platform {
    MacOS,
    Windows,
    Wsl,
    Linux,
    Android,
    Unknown,
}

static PLATFORM: Lazy<Platform> = Lazy::new(|| {
    if cfg!(target_os = "macos") {
        Platform::MacOS
    } else if cfg!(target_os = "windows") {
        Platform::Windows
    } else if cfg!(target_os = "android") {
        Platform::Android
    } else if cfg!(target_os = "linux") {
        if env::var_os("WSL_DISTRO_NAME").is_some() {
            Platform::Wsl
        } else {
            Platform::Linux
        }
    } else {
        Platform::Unknown
    }
});

/// Providers to try, most preferred first
pub fn detect_providers() -> Vec<ClipboardProvider> {
    if let Some(custom) = env::var(CLIPBOARD_ENV)
        .ok()
        .and_then(|line| ClipboardProvider::custom(&line))
    {
        return vec![custom];
    }

    let mut providers = Vec::new();
    if env::var_os("TMUX").is_some() && command_exists("tmux") {
        providers.push(ClipboardProvider::Tmux);
    }

    let candidates = match *PLATFORM {
        Platform::MacOS => vec![(ClipboardProvider::MacOS, "pbcopy")],
        Platform::Windows | Platform::Wsl => vec![(ClipboardProvider::Windows, "clip.exe")],
        Platform::Linux => vec![
            (ClipboardProvider::Wayland, "wl-copy"),
            (ClipboardProvider::Xsel, "xsel"),
            (ClipboardProvider::Xclip, "xclip"),
        ],
        Platform::Android => vec![(ClipboardProvider::Termux, "termux-clipboard-set")],
        Platform::Unknown => Vec::new(),
    };
    for (provider, command) in candidates {
        if command_exists(command) {
            providers.push(provider);
        }
    }
    providers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_exists() {
        assert!(!command_exists("nonexistentcommandxyz"));
    }

    #[test]
    fn test_custom_command_line() {
        let provider = ClipboardProvider::custom("xclip -selection primary").unwrap();
        assert_eq!(
            provider.command_line(),
            (
                "xclip".to_string(),
                vec!["-selection".to_string(), "primary".to_string()]
            )
        );
        assert!(ClipboardProvider::custom("   ").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_custom_provider_receives_text() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("clip.txt");
        let provider = ClipboardProvider::Custom(vec![
            "sh".to_string(),
            "-c".to_string(),
            format!("cat > '{}'", out.display()),
        ]);
        provider.copy_to_clipboard("copied text")?;
        assert_eq!(std::fs::read_to_string(out)?, "copied text");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_early_exit_is_reaped_and_reported() {
        // Exits without reading; the write may fail with a broken pipe
        let text = "x".repeat(1 << 20);
        let result = pipe_to_command("sh", &["-c".to_string(), "exit 3".to_string()], &text);
        match result {
            Err(ClipboardError::Io(_)) | Err(ClipboardError::CommandFailed(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_failing_command_reports_error() {
        let provider = ClipboardProvider::Custom(vec!["nonexistentcommandxyz".to_string()]);
        assert!(matches!(
            provider.copy_to_clipboard("x"),
            Err(ClipboardError::CommandFailed(_))
        ));
    }
}
