/*!
 * Integration test for clipboard functionality
 */

use std::fs::{self, File};
use std::io::Write;
use std::process::Command;

use tempfile::tempdir;

#[cfg(unix)]
#[test]
#[ignore] // Builds and runs the binary; run with: cargo test --test clipboard_integration -- --ignored
fn test_clip_flag() {
    let temp_dir = tempdir().unwrap();
    let test_file = temp_dir.path().join("test.txt");
    let output_file = temp_dir.path().join("output.md");
    let clip_file = temp_dir.path().join("clipboard.txt");

    let mut file = File::create(&test_file).unwrap();
    writeln!(file, "Test content for clipboard integration").unwrap();

    // Route the clipboard into a file so the test runs without a display
    let clipboard_command = format!("tee {}", clip_file.display());
    let status = Command::new("cargo")
        .args([
            "run",
            "--quiet",
            "--",
            "--root",
            &temp_dir.path().to_string_lossy(),
            "copy",
            "test.txt",
            "--clip",
            "--output",
            &output_file.to_string_lossy(),
        ])
        .env("PROMPTREE_CLIPBOARD", clipboard_command)
        .env("PROMPTREE_STATE_FILE", temp_dir.path().join("state.json"))
        .status()
        .unwrap();
    assert!(status.success());

    let snapshot = fs::read_to_string(&output_file).unwrap();
    assert_eq!(
        snapshot,
        "**test.txt**\n```\nTest content for clipboard integration\n\n```\n\n"
    );
    assert_eq!(fs::read_to_string(&clip_file).unwrap(), snapshot);
}
