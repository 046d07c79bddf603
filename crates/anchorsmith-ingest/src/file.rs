//! Text extraction from uploaded content files.

use std::path::Path;

use anchorsmith_core::{Error, Result};

use crate::fetch::extract_page_text;

/// Supported content file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    PlainText,
    Markdown,
    Html,
    Json,
    Unknown,
}

impl FileType {
    /// Detect file type from extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "txt" | "text" => Self::PlainText,
            "md" | "mdx" | "markdown" => Self::Markdown,
            "html" | "htm" | "xhtml" => Self::Html,
            "json" => Self::Json,
            _ => Self::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }
}

/// Extract text content from a file on disk.
pub fn extract_text(path: &Path) -> Result<Option<String>> {
    let bytes = std::fs::read(path).map_err(Error::Io)?;
    extract_bytes(FileType::from_path(path), &bytes)
}

/// Extract text from uploaded bytes of a known type.
///
/// Returns `Ok(None)` for content that looks binary.
pub fn extract_bytes(file_type: FileType, bytes: &[u8]) -> Result<Option<String>> {
    let content = match std::str::from_utf8(bytes) {
        Ok(s) => s,
        Err(_) if file_type == FileType::Unknown => return Ok(None),
        Err(e) => return Err(Error::Input(format!("content is not UTF-8: {}", e))),
    };

    match file_type {
        FileType::PlainText | FileType::Markdown => Ok(Some(content.to_string())),
        FileType::Html => Ok(Some(extract_page_text(content).1)),
        FileType::Json => extract_json(content).map(Some),
        FileType::Unknown => {
            let control = content
                .chars()
                .filter(|c| c.is_control() && *c != '\n' && *c != '\r' && *c != '\t')
                .count();
            if control > content.len() / 10 {
                Ok(None) // Likely binary
            } else if looks_like_html(content) {
                Ok(Some(extract_page_text(content).1))
            } else {
                Ok(Some(content.to_string()))
            }
        }
    }
}

fn looks_like_html(content: &str) -> bool {
    let head = content.trim_start().get(..256).unwrap_or(content.trim_start());
    let head = head.to_lowercase();
    head.starts_with("<!doctype html") || head.contains("<html") || head.contains("<body")
}

/// Collect every string leaf of a JSON document, in document order.
fn extract_json(content: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let mut texts = Vec::new();
    collect_strings(&value, &mut texts);
    Ok(texts.join("\n"))
}

fn collect_strings(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => out.push(s.clone()),
        serde_json::Value::Array(items) => {
            for item in items {
                collect_strings(item, out);
            }
        }
        serde_json::Value::Object(map) => {
            for v in map.values() {
                collect_strings(v, out);
            }
        }
        _ => {}
    }
}
