/*!
 * Snapshot statistics for promptree
 *
 * Produces the one-line selection summary and an optional table report of
 * an assembled snapshot, rendered with the tabled library.
 */

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::types::NoteKind;
use crate::writer::SnapshotBlock;

/// Number of files listed before the table switches to the largest ones
const FILE_TABLE_LIMIT: usize = 15;

/// Per-file figures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReportInfo {
    /// Path relative to the root
    pub path: String,
    /// Number of lines in the rendered block
    pub lines: usize,
    /// Number of characters in the rendered block
    pub chars: usize,
    /// Whether the content was cut at the size cap
    pub truncated: bool,
    /// Binary or error placeholder, if any
    pub note: Option<NoteKind>,
}

/// Statistics of one assembled snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotReport {
    /// Number of files in the snapshot
    pub files: usize,
    /// Lines of the whole document
    pub lines: usize,
    /// Whitespace-separated words of the whole document
    pub words: usize,
    /// Characters of the whole document
    pub chars: usize,
    /// Details for each file, in snapshot order
    pub file_details: Vec<FileReportInfo>,
}

impl SnapshotReport {
    /// Measure a snapshot and the blocks it was assembled from
    ///
    /// Trailing whitespace of the document is not counted, matching what a
    /// reader sees when the text is pasted.
    pub fn new(snapshot: &str, blocks: &[SnapshotBlock]) -> Self {
        let text = snapshot.trim_end();
        let file_details = blocks
            .iter()
            .map(|block| {
                let markdown = block.to_markdown();
                FileReportInfo {
                    path: block.relative_path.clone(),
                    lines: markdown.trim_end().lines().count(),
                    chars: markdown.chars().count(),
                    truncated: block.rendered.truncated,
                    note: block.rendered.note,
                }
            })
            .collect();

        Self {
            files: blocks.len(),
            lines: if text.is_empty() { 0 } else { text.split('\n').count() },
            words: text.split_whitespace().count(),
            chars: text.chars().count(),
            file_details,
        }
    }

    /// Rough token estimate at four characters per token
    pub fn estimated_tokens(&self) -> usize {
        self.chars / 4
    }

    /// `N files | L lines | W words | C characters selected`
    pub fn summary_line(&self) -> String {
        format!(
            "{} | {} | {} | {} selected",
            plural(self.files, "file"),
            plural(self.lines, "line"),
            plural(self.words, "word"),
            plural(self.chars, "character")
        )
    }
}

fn plural(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{} {}{}", group_thousands(count), noun, suffix)
}

/// `1234567` → `1,234,567`
fn group_thousands(num: usize) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format of the report output
pub enum ReportFormat {
    /// Console table output
    ConsoleTable,
}

/// Report generator for snapshots
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Format a number with human-readable units
    fn format_number(&self, num: usize) -> String {
        if num >= 1_000_000 {
            format!("{:.1}M", num as f64 / 1_000_000.0)
        } else if num >= 1_000 {
            format!("{:.1}K", num as f64 / 1_000.0)
        } else {
            num.to_string()
        }
    }

    pub fn generate_report(&self, report: &SnapshotReport) -> String {
        match self.format {
            ReportFormat::ConsoleTable => self.generate_console_report(report),
        }
    }

    /// Print the report to stderr, keeping stdout for the snapshot itself
    pub fn print_report(&self, report: &SnapshotReport) {
        eprintln!("\n{}", self.generate_report(report));
    }

    /// Keep the tail of long paths
    fn format_path(&self, path: &str, max_len: usize) -> String {
        if path.chars().count() <= max_len {
            return path.to_string();
        }

        let mut segments = Vec::new();
        let mut current_len = 3;
        for part in path.split('/').rev() {
            let part_len = part.chars().count() + 1;
            if current_len + part_len > max_len {
                break;
            }
            segments.push(part);
            current_len += part_len;
        }

        if segments.is_empty() {
            let tail: String = path
                .chars()
                .rev()
                .take(max_len.saturating_sub(3))
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            return format!("...{}", tail);
        }

        let mut result = String::from("...");
        for part in segments.iter().rev() {
            result.push('/');
            result.push_str(part);
        }
        result
    }

    fn create_summary_table(&self, report: &SnapshotReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let truncated = report.file_details.iter().filter(|f| f.truncated).count();
        let placeholders = report.file_details.iter().filter(|f| f.note.is_some()).count();

        let rows = vec![
            SummaryRow {
                key: "📄 Files".to_string(),
                value: self.format_number(report.files),
            },
            SummaryRow {
                key: "📝 Lines".to_string(),
                value: self.format_number(report.lines),
            },
            SummaryRow {
                key: "🔤 Words".to_string(),
                value: self.format_number(report.words),
            },
            SummaryRow {
                key: "✂️ Truncated".to_string(),
                value: self.format_number(truncated),
            },
            SummaryRow {
                key: "🚫 Omitted".to_string(),
                value: self.format_number(placeholders),
            },
            SummaryRow {
                key: "📦 LLM Tokens".to_string(),
                value: format!(
                    "{} tokens (estimated)",
                    self.format_number(report.estimated_tokens())
                ),
            },
        ];

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn create_files_table(&self, report: &SnapshotReport) -> String {
        #[derive(Tabled)]
        struct FileRow {
            #[tabled(rename = "File Path")]
            path: String,

            #[tabled(rename = "Lines")]
            lines: String,

            #[tabled(rename = "Est. Tokens")]
            tokens: String,

            #[tabled(rename = "Note")]
            note: String,
        }

        let mut files: Vec<&FileReportInfo> = report.file_details.iter().collect();
        if files.len() > FILE_TABLE_LIMIT {
            files.sort_by(|a, b| b.chars.cmp(&a.chars));
            files.truncate(10);
        }

        let rows: Vec<FileRow> = files
            .iter()
            .map(|info| FileRow {
                path: self.format_path(&info.path, 60),
                lines: self.format_number(info.lines),
                tokens: self.format_number(info.chars / 4),
                note: match (info.note, info.truncated) {
                    (Some(note), _) => note.to_string(),
                    (None, true) => "truncated".to_string(),
                    (None, false) => String::new(),
                },
            })
            .collect();

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn generate_console_report(&self, report: &SnapshotReport) -> String {
        let files_title = if report.file_details.len() > FILE_TABLE_LIMIT {
            "📋  TOP 10 LARGEST FILES BY CHARACTER COUNT  📋"
        } else {
            "📋  SELECTED FILES"
        };

        format!(
            "{}\n{}\n\n{}\n{}\n{}",
            files_title,
            self.create_files_table(report),
            "✅  SNAPSHOT READY",
            self.create_summary_table(report),
            report.summary_line()
        )
    }
}
