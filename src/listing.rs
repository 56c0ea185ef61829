use std::{fmt::Write, io::Result, path::Path};

use crate::path::encode_segment;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// read the entries of `dir`, sorted by name.
///
/// Names which aren't valid UTF-8 are skipped, they can't be linked.
pub async fn read_entries(dir: &Path) -> Result<Vec<DirEntry>> {
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => continue,
        };
        // follow symlinks so linked directories get their trailing slash
        let is_dir = match tokio::fs::metadata(entry.path()).await {
            Ok(meta) => meta.is_dir(),
            Err(_) => false,
        };
        entries.push(DirEntry { name, is_dir });
    }
    entries.sort();
    Ok(entries)
}

/// render the listing page for the directory at `url_path`.
pub fn render(url_path: &str, entries: &[DirEntry]) -> String {
    let mut html = String::with_capacity(256 + entries.len() * 64);
    let title = escape_html(url_path);
    html.push_str("<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n");
    let _ = writeln!(html, "<title>Index of {title}</title>");
    let _ = writeln!(html, "<h1>Index of {title}</h1>");
    html.push_str("<pre>\n");
    for entry in entries {
        let slash = if entry.is_dir { "/" } else { "" };
        // a colon would make the name read as a url scheme
        let dot = if entry.name.contains(':') { "./" } else { "" };
        let _ = writeln!(
            html,
            "<a href=\"{dot}{}{slash}\">{}{slash}</a>",
            encode_segment(&entry.name),
            escape_html(&entry.name),
        );
    }
    html.push_str("</pre>\n");
    html
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
