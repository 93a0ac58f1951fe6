/*!
 * Integration tests for the listing and snapshot handlers
 */

use std::fs;
use std::path::Path;
use std::sync::Arc;

use promptree::selection::{Decision, Outcome};
use promptree::{Api, Config, MarkdownWriter, Scanner, SelectionModel, TreeQuery};
use serde_json::Value;
use tempfile::tempdir;

fn project() -> std::io::Result<tempfile::TempDir> {
    let dir = tempdir()?;
    fs::create_dir_all(dir.path().join("src").join("bin"))?;
    fs::create_dir_all(dir.path().join("node_modules").join("pkg"))?;
    fs::create_dir_all(dir.path().join("target"))?;
    fs::write(dir.path().join("src").join("lib.rs"), "pub mod bin;\n")?;
    fs::write(dir.path().join("src").join("bin").join("cli.rs"), "fn main() {}\n")?;
    fs::write(
        dir.path().join("node_modules").join("pkg").join("index.js"),
        "module.exports = 1;\n",
    )?;
    fs::write(dir.path().join("target").join("out.o"), [0u8, 159, 146, 150])?;
    fs::write(dir.path().join(".promptreeignore"), "# build output\ntarget/\n")?;
    fs::write(dir.path().join("README.md"), "# Demo\n")?;
    Ok(dir)
}

fn open(root: &Path) -> promptree::Result<(Config, Arc<Scanner>, Arc<MarkdownWriter>)> {
    let config = Config::new(root).validate()?;
    let scanner = Arc::new(Scanner::from_config(&config)?);
    let writer = Arc::new(MarkdownWriter::from_config(&config));
    Ok((config, scanner, writer))
}

#[test]
fn test_tree_honours_ignore_file() -> promptree::Result<()> {
    let dir = project()?;
    let (_, scanner, writer) = open(dir.path())?;
    let api = Api::new(scanner, writer);

    let response = api.tree(&TreeQuery::default());
    assert_eq!(response.status, 200);
    let body: Value = serde_json::from_str(&response.body)?;
    let names: Vec<&str> = body["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["src", ".promptreeignore", "README.md"]);

    let src = &body["children"][0];
    assert_eq!(src["isDirectory"], true);
    assert_eq!(src["hasChildren"], true);
    assert!(src.get("isDir").is_none());
    assert!(src.get("size").is_none());
    assert_eq!(body["children"][2]["isDirectory"], false);
    Ok(())
}

#[test]
fn test_tree_paging_and_bad_paths() -> promptree::Result<()> {
    let dir = project()?;
    let (_, scanner, writer) = open(dir.path())?;
    let api = Api::new(scanner, writer);

    let page = api.tree_page(&TreeQuery {
        path: Some("src".to_string()),
        offset: Some(1),
        limit: Some(1),
    })?;
    assert_eq!(page.parent.path, "src");
    assert_eq!(page.page.total, 2);
    assert!(!page.page.has_more);
    assert_eq!(page.page.children[0].relative_path, "src/lib.rs");

    for bad in ["../", "README.md", "nope"] {
        let response = api.tree(&TreeQuery {
            path: Some(bad.to_string()),
            ..TreeQuery::default()
        });
        assert_eq!(response.status, 400, "{}", bad);
        assert_eq!(response.body, r#"{"error":"Invalid path"}"#);
    }
    Ok(())
}

#[test]
fn test_copy_request_bodies() -> promptree::Result<()> {
    let dir = project()?;
    let (_, scanner, writer) = open(dir.path())?;
    let api = Api::new(scanner, writer);

    let response = api.copy(r#"{"files": ["README.md", 7, "src", "src/lib.rs"]}"#);
    assert_eq!(response.status, 200);
    assert_eq!(
        response.body,
        "**README.md**\n```markdown\n# Demo\n\n```\n\n**src/lib.rs**\n```rust\npub mod bin;\n\n```\n\n"
    );

    assert_eq!(api.copy("not json").body, "");
    assert_eq!(api.copy("{}").body, "");
    assert_eq!(api.copy(r#"{"files": "README.md"}"#).status, 400);
    Ok(())
}

#[test]
fn test_selection_to_snapshot() -> promptree::Result<()> {
    let dir = project()?;
    let (config, scanner, writer) = open(dir.path())?;
    let mut model = SelectionModel::new(config.root.clone());

    model.select_all(scanner.as_ref())?;
    let files = model.effective_files(scanner.as_ref());
    let snapshot = writer.assemble(&files);
    assert!(snapshot.contains("**src/bin/cli.rs**"));
    assert!(!snapshot.contains("node_modules"));
    assert!(!snapshot.contains("target/"));

    let index = config.root.join("node_modules/pkg/index.js");
    let outcome = model.toggle(scanner.as_ref(), &index, false, true, &mut |_: &Path| {
        Decision::Grant
    })?;
    assert_eq!(outcome, Outcome::Applied { marked: 1 });

    let snapshot = writer.assemble(&model.effective_files(scanner.as_ref()));
    assert!(snapshot.starts_with("**node_modules/pkg/index.js**\n```javascript\n"));
    Ok(())
}
