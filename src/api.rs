/*!
 * Request handlers for the tree listing and snapshot endpoints
 *
 * Both handlers are framework-free: they take already extracted request
 * data and return a status, content type and body that any HTTP layer (or
 * the CLI) can forward unchanged.
 */

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::Result;
use crate::scanner::Scanner;
use crate::types::{ChildPage, ParentInfo};
use crate::writer::MarkdownWriter;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// Query of `GET /tree`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TreeQuery {
    /// Directory relative to the root (or absolute inside it); empty is the root
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Body of a successful `GET /tree`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeResponse {
    pub parent: ParentInfo,
    #[serde(flatten)]
    pub page: ChildPage,
}

/// Body of `POST /copy`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyRequest {
    #[serde(default)]
    pub files: Vec<String>,
}

/// Transport-neutral response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl ApiResponse {
    fn json(status: u16, value: &impl Serialize) -> Self {
        let body = serde_json::to_string(value).unwrap_or_else(|e| {
            log::error!("Failed to serialize response: {}", e);
            String::from("{}")
        });
        Self {
            status,
            content_type: CONTENT_TYPE_JSON,
            body,
        }
    }

    fn text(body: String) -> Self {
        Self {
            status: 200,
            content_type: CONTENT_TYPE_TEXT,
            body,
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self::json(status, &json!({ "error": message }))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Handlers sharing one scanner and writer
#[derive(Debug, Clone)]
pub struct Api {
    scanner: Arc<Scanner>,
    writer: Arc<MarkdownWriter>,
}

impl Api {
    pub fn new(scanner: Arc<Scanner>, writer: Arc<MarkdownWriter>) -> Self {
        Self { scanner, writer }
    }

    /// List one page of a directory
    pub fn tree_page(&self, query: &TreeQuery) -> Result<TreeResponse> {
        let dir = match query.path.as_deref() {
            None | Some("") => self.scanner.root().to_path_buf(),
            Some(raw) => self.scanner.resolve_directory(Path::new(raw))?,
        };
        let page = self.scanner.list_children(
            &dir,
            query.offset.unwrap_or(0),
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        )?;
        Ok(TreeResponse {
            parent: self.scanner.parent_info(&dir),
            page,
        })
    }

    /// `GET /tree`
    pub fn tree(&self, query: &TreeQuery) -> ApiResponse {
        match self.tree_page(query) {
            Ok(response) => ApiResponse::json(200, &response),
            Err(e) if e.is_path_violation() => {
                log::debug!("Rejected tree request {:?}: {}", query, e);
                ApiResponse::error(400, "Invalid path")
            }
            Err(e) => {
                log::error!("Tree request {:?} failed: {}", query, e);
                ApiResponse::error(500, "Internal error")
            }
        }
    }

    /// Render the snapshot for a list of paths
    pub fn snapshot(&self, request: &CopyRequest) -> String {
        self.writer.assemble(request.files.as_slice())
    }

    /// `POST /copy` with the raw request body
    ///
    /// An unparsable body is treated as an empty request. Entries that are
    /// not strings are skipped like any other invalid path.
    pub fn copy(&self, body: &str) -> ApiResponse {
        let value: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("Unparsable copy request: {}", e);
                Value::Null
            }
        };

        let files = match value.get("files") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_owned))
                .collect(),
            Some(_) => return ApiResponse::error(400, "files must be a list"),
        };

        ApiResponse::text(self.snapshot(&CopyRequest { files }))
    }
}
