//! Export of generated text to CSV or Markdown files.

use std::path::Path;

use tracing::info;

use crate::error::Result;

/// Heading used when a document export is not given one.
pub const DEFAULT_HEADING: &str = "AI Architect Report";

/// Generated text, shaped for saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Export {
    /// A pipe-delimited table found in the text. The first row is the header.
    Table { rows: Vec<Vec<String>> },
    /// Free text, saved as a Markdown document.
    Document { heading: String, body: String },
}

impl Export {
    /// Pick the export shape for a generation result.
    ///
    /// The first pipe table (header row, `---` separator row, data rows)
    /// becomes a [`Export::Table`]; anything else is a document.
    pub fn from_text(text: &str) -> Self {
        match parse_pipe_table(text) {
            Some(rows) => Export::Table { rows },
            None => Export::Document {
                heading: DEFAULT_HEADING.to_string(),
                body: text.trim().to_string(),
            },
        }
    }

    /// Replace the heading of a document export. Tables are unchanged.
    pub fn with_heading(self, heading: impl Into<String>) -> Self {
        match self {
            Export::Document { body, .. } => Export::Document {
                heading: heading.into(),
                body,
            },
            table => table,
        }
    }

    /// File extension matching [`Export::render`].
    pub fn extension(&self) -> &'static str {
        match self {
            Export::Table { .. } => "csv",
            Export::Document { .. } => "md",
        }
    }

    /// Render as CSV (RFC 4180) or Markdown.
    pub fn render(&self) -> String {
        match self {
            Export::Table { rows } => {
                let mut out = String::new();
                for row in rows {
                    let line: Vec<String> = row.iter().map(|c| escape_csv_field(c)).collect();
                    out.push_str(&line.join(","));
                    out.push_str("\r\n");
                }
                out
            }
            Export::Document { heading, body } => format!("# {heading}\n\n{body}\n"),
        }
    }

    /// Write the rendered export to `path`, replacing any existing file.
    pub async fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        tokio::fs::write(path, self.render()).await?;
        info!(path = %path.display(), format = self.extension(), "exported result");
        Ok(())
    }
}

fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn is_pipe_row(line: &str) -> bool {
    line.contains('|')
}

fn is_separator_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.contains('-')
        && trimmed.contains('|')
        && trimmed
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':') || c.is_whitespace())
}

fn split_row(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}

fn parse_pipe_table(text: &str) -> Option<Vec<Vec<String>>> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines
        .windows(2)
        .position(|pair| {
            is_pipe_row(pair[0]) && !is_separator_row(pair[0]) && is_separator_row(pair[1])
        })?;

    let mut rows = vec![split_row(lines[start])];
    rows.extend(
        lines[start + 2..]
            .iter()
            .take_while(|line| is_pipe_row(line) && !is_separator_row(line))
            .map(|line| split_row(line)),
    );

    // A header alone is not a table worth exporting.
    (rows.len() > 1).then_some(rows)
}
