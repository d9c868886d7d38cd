//! Comment records and ingestion.
//!
//! Comments arrive either as structured records or bare strings
//! ([`CommentInput`]), accumulate in a session-scoped [`CommentStore`], or are
//! read from a CSV file whose column names vary between sources.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SentimentError};

/// Author recorded when a comment has none.
pub const ANONYMOUS: &str = "Anonymous";

const TEXT_ALIASES: &[&str] = &["text", "comment", "comments", "feedback", "review", "message"];
const AUTHOR_ALIASES: &[&str] = &["author", "user", "username", "name"];
const DATE_ALIASES: &[&str] = &["date", "created_at", "timestamp", "time"];

/// A consultation comment with optional metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// The comment body. May be empty.
    pub text: String,
    /// Who wrote it, if known.
    #[serde(default)]
    pub author: Option<String>,
    /// When it was written, if known.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl Comment {
    /// A comment with no author or date.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: None,
            date: None,
        }
    }

    /// Sets the author. Blank names count as no author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = non_blank(author.into());
        self
    }

    /// Sets the date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// The author, or [`ANONYMOUS`].
    pub fn author_or_default(&self) -> &str {
        self.author.as_deref().unwrap_or(ANONYMOUS)
    }
}

fn non_blank(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Input accepted by the batch analyzer: a full record or just the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentInput {
    /// A structured comment.
    Record(Comment),
    /// Bare text; author and date take their defaults.
    Text(String),
}

impl CommentInput {
    /// The comment text.
    pub fn text(&self) -> &str {
        match self {
            CommentInput::Record(c) => &c.text,
            CommentInput::Text(t) => t,
        }
    }

    /// Converts into a [`Comment`].
    pub fn into_comment(self) -> Comment {
        match self {
            CommentInput::Record(c) => c,
            CommentInput::Text(t) => Comment::new(t),
        }
    }
}

impl From<Comment> for CommentInput {
    fn from(value: Comment) -> Self {
        CommentInput::Record(value)
    }
}

impl From<String> for CommentInput {
    fn from(value: String) -> Self {
        CommentInput::Text(value)
    }
}

impl From<&str> for CommentInput {
    fn from(value: &str) -> Self {
        CommentInput::Text(value.to_string())
    }
}

/// Append-only list of comments collected during a session.
#[derive(Debug, Clone, Default)]
pub struct CommentStore {
    comments: Vec<Comment>,
}

impl CommentStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one comment.
    pub fn add(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    /// Appends one comment per non-blank line of `text`, all sharing `author` and `date`.
    /// Returns how many were added.
    pub fn add_lines(&mut self, text: &str, author: Option<&str>, date: Option<NaiveDate>) -> usize {
        let before = self.comments.len();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.comments.push(Comment {
                text: line.to_string(),
                author: author.map(str::to_string).and_then(non_blank),
                date,
            });
        }
        self.comments.len() - before
    }

    /// Appends many comments.
    pub fn extend(&mut self, comments: impl IntoIterator<Item = Comment>) {
        self.comments.extend(comments);
    }

    /// Removes every comment.
    pub fn clear(&mut self) {
        self.comments.clear();
    }

    /// Number of comments.
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// The comments in insertion order.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Copies the comments out as analyzer input.
    pub fn to_inputs(&self) -> Vec<CommentInput> {
        self.comments.iter().cloned().map(CommentInput::Record).collect()
    }
}

/// Reads comments from a CSV file. See [`read_comments_csv`].
pub fn load_comments_csv(path: impl AsRef<Path>) -> Result<Vec<Comment>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let comments = read_comments_csv(file)?;
    tracing::info!(path = %path.display(), count = comments.len(), "loaded comments");
    Ok(comments)
}

/// Reads comments from CSV.
///
/// Header names are trimmed and lowercased. The first column named like a text
/// column (`text`, `comment`, `comments`, `feedback`, `review`, `message`) is
/// required; author (`author`, `user`, `username`, `name`) and date (`date`,
/// `created_at`, `timestamp`, `time`) columns are optional. Unparseable dates
/// are dropped rather than rejected.
///
/// # Errors
///
/// [`SentimentError::MissingColumn`] if no text column exists,
/// [`SentimentError::Csv`] for malformed input.
pub fn read_comments_csv<R: Read>(reader: R) -> Result<Vec<Comment>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let find = |aliases: &[&str]| headers.iter().position(|h| aliases.contains(&h.as_str()));

    let text_col = find(TEXT_ALIASES)
        .ok_or_else(|| SentimentError::MissingColumn(TEXT_ALIASES.join(", ")))?;
    let author_col = find(AUTHOR_ALIASES);
    let date_col = find(DATE_ALIASES);

    let mut comments = Vec::new();
    for record in reader.records() {
        let record = record?;
        let text = record.get(text_col).unwrap_or_default().to_string();
        let author = author_col
            .and_then(|i| record.get(i))
            .map(str::to_string)
            .and_then(non_blank);
        let date = date_col.and_then(|i| record.get(i)).and_then(parse_date);

        comments.push(Comment { text, author, date });
    }

    Ok(comments)
}

/// Lenient date parsing: ISO dates, common day/month layouts, and timestamps.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
    const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()))
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
                .map(|d| d.date())
        })
}
