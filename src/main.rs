/*!
 * Command-line interface for promptree
 */

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};

use promptree::api::{Api, TreeQuery};
use promptree::clipboard;
use promptree::config::{Args, Command, Config, OutputArgs};
use promptree::error::{PromptreeError, Result};
use promptree::report::{ReportFormat, Reporter, SnapshotReport};
use promptree::scanner::Scanner;
use promptree::selection::{Decision, Outcome, SelectionModel, SelectionStore};
use promptree::utils::format_file_size;
use promptree::writer::{MarkdownWriter, SnapshotBlock};

fn main() -> io::Result<()> {
    let args = Args::parse();
    init_logging(args.quiet, args.verbose);
    log::debug!("CLI args parsed: {:?}", args);

    if let Command::Completions { shell } = &args.command {
        let mut command = Args::command();
        clap_complete::generate(*shell, &mut command, "promptree", &mut io::stdout());
        return Ok(());
    }

    let config = Config::from_args(&args).validate()?;
    let app = App::new(config, args.quiet)?;
    app.run(args.command)?;
    Ok(())
}

fn init_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

struct App {
    config: Config,
    scanner: Arc<Scanner>,
    writer: Arc<MarkdownWriter>,
    quiet: bool,
}

impl App {
    fn new(config: Config, quiet: bool) -> Result<Self> {
        let scanner = Arc::new(Scanner::from_config(&config)?);
        let writer = Arc::new(MarkdownWriter::from_config(&config));
        Ok(Self {
            config,
            scanner,
            writer,
            quiet,
        })
    }

    fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Tree {
                path,
                offset,
                limit,
                json,
            } => self.tree(path, offset, limit, json),
            Command::Copy { files, output } => {
                let blocks = self.writer.blocks(&files);
                self.emit(&output, &blocks)
            }
            Command::Select { path, yes } => self.toggle(&path, true, yes),
            Command::Unselect { path } => self.toggle(&path, false, false),
            Command::SelectAll => self.with_model(|app, model| {
                let progress = app.spinner("Selecting");
                model.set_progress(Arc::clone(&progress));
                let marked = model.select_all(app.scanner.as_ref());
                progress.finish_and_clear();
                app.say(format!("Selected {} entries", marked?));
                Ok(())
            }),
            Command::UnselectAll => self.with_model(|app, model| {
                model.render_visible(app.scanner.as_ref())?;
                let excluded = model.unselect_all();
                app.say(format!("Cleared {} visible entries", excluded));
                Ok(())
            }),
            Command::Expand { path } => self.with_model(|app, model| {
                let (dir, is_dir) = model.locate(&path)?;
                if !is_dir {
                    return Err(PromptreeError::InvalidPath(format!(
                        "{} is not a directory",
                        path.display()
                    )));
                }
                let expanded = model.toggle_expanded(app.scanner.as_ref(), &dir)?;
                app.say(format!(
                    "{} {}",
                    if expanded { "Expanded" } else { "Collapsed" },
                    dir.display()
                ));
                Ok(())
            }),
            Command::ExpandAll { timeout } => self.with_model(|app, model| {
                let progress = app.spinner("Expanding");
                model.set_progress(Arc::clone(&progress));
                let deadline = Instant::now() + Duration::from_secs(timeout);
                let opened = model.expand_all(app.scanner.as_ref(), deadline);
                progress.finish_and_clear();
                let opened = opened?;
                app.say(format!("Expanded {} directories", opened));
                Ok(())
            }),
            Command::CollapseAll => self.with_model(|app, model| {
                model.collapse_all();
                app.say("Collapsed every directory");
                Ok(())
            }),
            Command::Status => self.status(),
            Command::Snapshot { output } => {
                let progress = self.spinner("Collecting");
                let model = self.load_model().with_progress(Arc::clone(&progress));
                let files = model.effective_files(self.scanner.as_ref());
                progress.finish_and_clear();
                let blocks = self.writer.blocks(&files);
                self.emit(&output, &blocks)
            }
            Command::Completions { .. } => Ok(()),
        }
    }

    fn store(&self) -> Option<SelectionStore> {
        let store = self.config.state_path().map(SelectionStore::new);
        if store.is_none() {
            log::warn!("No data directory available; selection will not be saved");
        }
        store
    }

    fn load_model(&self) -> SelectionModel {
        let persisted = self.store().map(|s| s.load()).unwrap_or_default();
        SelectionModel::from_persisted(self.config.root.clone(), persisted)
            .with_page_size(self.config.page_size)
    }

    /// Load the selection, apply `f`, and save whatever it left behind
    ///
    /// The model is saved even when `f` fails part way, since bulk
    /// operations keep what they finished.
    fn with_model<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&Self, &mut SelectionModel) -> Result<()>,
    {
        let mut model = self.load_model();
        let result = f(self, &mut model);
        if let Some(store) = self.store() {
            store.save(&model.to_persisted())?;
        }
        result
    }

    fn toggle(&self, path: &Path, checked: bool, yes: bool) -> Result<()> {
        self.with_model(|app, model| {
            let (target, is_dir) = model.locate(path)?;
            let progress = app.spinner(if checked { "Selecting" } else { "Excluding" });
            model.set_progress(Arc::clone(&progress));

            let mut consent = |p: &Path| {
                if yes {
                    Decision::Grant
                } else {
                    progress.suspend(|| prompt_consent(p))
                }
            };
            let outcome = model.toggle(app.scanner.as_ref(), &target, is_dir, checked, &mut consent);
            progress.finish_and_clear();

            match outcome? {
                Outcome::Applied { marked } => app.say(format!(
                    "{} {} ({} entries)",
                    if checked { "Selected" } else { "Excluded" },
                    target.display(),
                    marked
                )),
                Outcome::Declined => app.say(format!("Left {} unselected", target.display())),
            }
            Ok(())
        })
    }

    fn tree(&self, path: Option<String>, offset: usize, limit: Option<usize>, json: bool) -> Result<()> {
        let api = Api::new(Arc::clone(&self.scanner), Arc::clone(&self.writer));
        let query = TreeQuery {
            path,
            offset: Some(offset),
            limit: Some(limit.unwrap_or(self.config.page_size)),
        };

        if json {
            let response = api.tree(&query);
            println!("{}", response.body);
            if !response.is_success() {
                return Err(PromptreeError::InvalidArgument(format!(
                    "tree request failed with status {}",
                    response.status
                )));
            }
            return Ok(());
        }

        let listing = api.tree_page(&query)?;
        println!("{}/", listing.parent.full_path.display());
        for node in &listing.page.children {
            if node.is_dir {
                let empty = if node.has_children == Some(false) {
                    "  (empty)"
                } else {
                    ""
                };
                println!("  📁 {}/{}", node.name, empty);
            } else {
                println!(
                    "  📄 {}  ({})",
                    node.name,
                    format_file_size(node.size.unwrap_or(0))
                );
            }
        }
        if listing.page.has_more {
            let shown = listing.page.offset + listing.page.children.len();
            println!(
                "  … {} more (use --offset {})",
                listing.page.total.saturating_sub(shown),
                shown
            );
        }
        Ok(())
    }

    fn status(&self) -> Result<()> {
        let mut model = self.load_model();
        model.render_visible(self.scanner.as_ref())?;

        println!("{}/", model.root().display());
        print_visible(&model, model.root(), 1);

        let files = model.effective_files(self.scanner.as_ref());
        let plural = if files.len() == 1 { "" } else { "s" };
        println!("\n{} file{} selected", files.len(), plural);
        Ok(())
    }

    fn emit(&self, output: &OutputArgs, blocks: &[SnapshotBlock]) -> Result<()> {
        let snapshot: String = blocks.iter().map(SnapshotBlock::to_markdown).collect();

        if let Some(path) = &output.output {
            self.writer.write_to_file(&snapshot, path)?;
            self.say(format!("Wrote snapshot to {}", path.display()));
        } else if !output.clip {
            let mut stdout = io::stdout().lock();
            stdout.write_all(snapshot.as_bytes())?;
            stdout.flush()?;
        }

        if output.clip {
            clipboard::copy_to_clipboard(&snapshot)?;
            self.say("📋 Snapshot copied to clipboard");
        }

        let report = SnapshotReport::new(&snapshot, blocks);
        if output.report {
            Reporter::new(ReportFormat::ConsoleTable).print_report(&report);
        } else {
            self.say(report.summary_line());
        }
        Ok(())
    }

    fn spinner(&self, prefix: &'static str) -> Arc<ProgressBar> {
        if self.quiet {
            return Arc::new(ProgressBar::hidden());
        }
        let progress = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos} entries ⏱️  {elapsed_precise}")
        {
            progress.set_style(style);
        }
        progress.set_prefix(prefix);
        progress.enable_steady_tick(Duration::from_millis(100));
        Arc::new(progress)
    }

    /// Status line on stderr, so stdout stays clean for snapshots
    fn say(&self, message: impl AsRef<str>) {
        if !self.quiet {
            eprintln!("{}", message.as_ref());
        }
    }
}

fn prompt_consent(path: &Path) -> Decision {
    eprint!(
        "{} is blacklisted by default (e.g. .env, node_modules). Include it anyway? [y/N] ",
        path.display()
    );
    let _ = io::stderr().flush();

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes").into(),
        Err(e) => {
            log::warn!("Could not read answer: {}", e);
            Decision::Deny
        }
    }
}

fn print_visible(model: &SelectionModel, dir: &Path, depth: usize) {
    let Some(page) = model.cache().get(dir) else {
        return;
    };
    let indent = "  ".repeat(depth);

    for node in &page.children {
        let marker = model.state_of(&node.absolute_path, node.is_dir).marker();
        let locked = if model.is_permitted(&node.absolute_path) {
            ""
        } else {
            "  🔒"
        };

        if node.is_dir {
            let expanded = model.expanded().is_expanded(&node.absolute_path);
            let arrow = if expanded { "▼" } else { "►" };
            let empty = if node.has_children == Some(false) {
                "  (empty)"
            } else {
                ""
            };
            println!("{}{} {} {}/{}{}", indent, marker, arrow, node.name, empty, locked);
            if expanded {
                print_visible(model, &node.absolute_path, depth + 1);
            }
        } else {
            println!(
                "{}{} {}  ({}){}",
                indent,
                marker,
                node.name,
                format_file_size(node.size.unwrap_or(0)),
                locked
            );
        }
    }

    if page.has_more() {
        println!(
            "{}… {} more (promptree expand-all to load everything)",
            indent,
            page.total.saturating_sub(page.offset_loaded)
        );
    }
}
