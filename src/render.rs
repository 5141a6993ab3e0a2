// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Rendering of the result list as text, HTML or JSON

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::prediction::ResultEntry;
use crate::widget::preview::PreviewRef;

const ERROR_COLOR: &str = "#c62828";

/// `Display` adapter over the `html_escaper::Escape` trait
struct Escape<T>(T);

impl<T: std::fmt::Display> std::fmt::Display for Escape<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        html_escaper::Escape::escape(&self.0, f, false)
    }
}

/// One line of plain text, e.g. `Cat 97%` or `Error: Unsupported format`
pub fn entry_text(entry: &ResultEntry) -> String {
    match entry {
        ResultEntry::Analyzing { message } => message.clone(),
        ResultEntry::Prediction { label, confidence } => format!("{} {}", label, confidence),
        ResultEntry::Error { message } => format!("Error: {}", message),
    }
}

/// One `<li>` element. Server text is escaped, never interpreted as markup.
pub fn entry_html(entry: &ResultEntry) -> String {
    match entry {
        ResultEntry::Analyzing { message } => {
            format!("<li><strong>{}</strong></li>", Escape(message))
        }
        ResultEntry::Prediction { label, confidence } => format!(
            r#"<li><strong>{}</strong> <span class="confidence">{}</span></li>"#,
            Escape(label),
            Escape(confidence)
        ),
        ResultEntry::Error { message } => format!(
            r#"<li style="color: {};"><strong>Error:</strong> {}</li>"#,
            ERROR_COLOR,
            Escape(message)
        ),
    }
}

pub fn list_text(entries: &[ResultEntry]) -> String {
    entries.iter().map(entry_text).collect::<Vec<_>>().join("\n")
}

pub fn list_html(entries: &[ResultEntry]) -> String {
    let items: String = entries.iter().map(entry_html).collect();
    format!(r#"<ul id="prediction-list">{}</ul>"#, items)
}

#[derive(Serialize)]
struct ListReport<'a> {
    file: Option<&'a str>,
    preview: Option<&'a PreviewRef>,
    entries: &'a [ResultEntry],
    rendered_at: DateTime<Utc>,
}

/// JSON report of the list together with the preview it belongs to
pub fn list_json(preview: Option<&PreviewRef>, entries: &[ResultEntry]) -> crate::Result<String> {
    let report = ListReport {
        file: preview.map(|p| p.file_name.as_str()),
        preview,
        entries,
        rendered_at: Utc::now(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
