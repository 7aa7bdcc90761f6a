//! Diary entries rendered from Markdown files.
//!
//! Every `*.md` file in the diary directory is one entry. Entries are listed
//! newest first by sorting filenames in descending order, so date-prefixed
//! names such as `2024-02-01.md` come out in reverse chronological order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd, html};
use thiserror::Error;

/// File extension of diary entries.
const DIARY_EXTENSION: &str = ".md";

/// Errors that abort a diary listing.
#[derive(Debug, Error)]
pub enum DiaryError {
    /// The diary directory could not be enumerated.
    #[error("failed to list {dir}: {source}")]
    List {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A diary file could not be read as UTF-8 text.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A rendered diary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryEntry {
    /// Filename without the `.md` extension.
    pub title: String,

    /// Rendered HTML body.
    pub html: String,
}

/// Lists and renders every diary in `dir`, newest first.
///
/// Any failure aborts the whole listing; no partial results are returned.
pub fn list_diaries(dir: &Path) -> Result<Vec<DiaryEntry>, DiaryError> {
    let list_error = |source: io::Error| DiaryError::List {
        dir: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_error)? {
        let entry = entry.map_err(list_error)?;
        // Non-UTF-8 names cannot be titles; skip them like other non-diary files.
        if let Ok(name) = entry.file_name().into_string() {
            if name.ends_with(DIARY_EXTENSION) {
                names.push(name);
            }
        }
    }
    names.sort_unstable_by(|a, b| b.cmp(a));

    names
        .into_iter()
        .map(|name| {
            let path = dir.join(&name);
            let markdown =
                fs::read_to_string(&path).map_err(|source| DiaryError::Read { path, source })?;
            let title = name.strip_suffix(DIARY_EXTENSION).unwrap_or(&name);
            Ok(DiaryEntry {
                title: title.to_string(),
                html: render_markdown(&markdown),
            })
        })
        .collect()
}

/// Renders Markdown to an HTML fragment.
///
/// Fenced code blocks are wrapped in `<div class="codehilite">` with a
/// `language-*` class on the `<code>` element so stylesheets and client-side
/// highlighters can pick them up.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Start(Tag::CodeBlock(kind)) => Event::Html(code_block_open(&kind).into()),
        Event::End(TagEnd::CodeBlock) => Event::Html("</code></pre></div>\n".into()),
        other => other,
    });

    let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html_output, events);
    html_output
}

fn code_block_open(kind: &CodeBlockKind<'_>) -> String {
    let language = match kind {
        CodeBlockKind::Fenced(info) => info.split_whitespace().next().unwrap_or_default(),
        CodeBlockKind::Indented => "",
    };
    let language: String = language
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(*c, '-' | '_' | '+' | '#'))
        .collect();

    if language.is_empty() {
        "<div class=\"codehilite\"><pre><code>".to_string()
    } else {
        format!("<div class=\"codehilite\"><pre><code class=\"language-{language}\">")
    }
}
