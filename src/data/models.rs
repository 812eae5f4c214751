//! Data models
//!
//! Rust structs representing the persisted quote collection.
//! Ids are SQLite row ids, timestamps are epoch milliseconds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Author recorded when none is given
pub const UNKNOWN_AUTHOR: &str = "Unknown";

// =============================================================================
// Theme
// =============================================================================

/// Animation variant used when a quote is rendered
///
/// Purely cosmetic. The set is closed: anything else is rejected
/// at the import boundary and by the table's CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Drift,
    FadeUp,
    Shimmer,
    Typewriter,
}

impl Theme {
    pub const ALL: [Theme; 4] = [
        Theme::Drift,
        Theme::FadeUp,
        Theme::Shimmer,
        Theme::Typewriter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drift => "drift",
            Self::FadeUp => "fade_up",
            Self::Shimmer => "shimmer",
            Self::Typewriter => "typewriter",
        }
    }

    /// Human-readable name for theme pickers
    pub fn label(&self) -> &'static str {
        match self {
            Self::Drift => "Drift",
            Self::FadeUp => "Fade Up",
            Self::Shimmer => "Shimmer",
            Self::Typewriter => "Typewriter",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known theme
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme: {0}")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str() == s)
            .ok_or_else(|| UnknownTheme(s.to_string()))
    }
}

// =============================================================================
// Quote
// =============================================================================

/// A stored quote
///
/// Never edited in place. `id` and `created_at` are assigned
/// by the store when the quote is created.
///
/// Serialized field order matches the export document:
/// `id`, `text`, `author`, `createdAt`, `theme`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: i64,
    pub text: String,
    pub author: String,
    /// Epoch milliseconds
    pub created_at: i64,
    pub theme: Theme,
}

/// Raw `quotes` row, theme still as stored text
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct QuoteRow {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub theme: String,
    pub created_at: i64,
}

impl TryFrom<QuoteRow> for Quote {
    type Error = AppError;

    fn try_from(row: QuoteRow) -> Result<Self, Self::Error> {
        let theme = row.theme.parse::<Theme>().map_err(|e| {
            AppError::Persistence(sqlx::Error::Decode(Box::new(e)))
        })?;

        Ok(Self {
            id: row.id,
            text: row.text,
            author: row.author,
            created_at: row.created_at,
            theme,
        })
    }
}

// =============================================================================
// New Quote
// =============================================================================

/// Creation payload
///
/// `created_at` is only honoured by bulk creation, where an imported
/// record keeps its original timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuote {
    pub text: String,
    pub author: String,
    pub theme: Theme,
    pub created_at: Option<i64>,
}

impl NewQuote {
    pub fn new(text: impl Into<String>, author: impl Into<String>, theme: Theme) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
            theme,
            created_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: i64) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Trim text and author, default a blank author to "Unknown"
    ///
    /// # Errors
    /// `AppError::Validation` if the text is blank
    pub fn normalize(self) -> Result<Self, AppError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("quote text must not be empty".to_string()));
        }

        let author = match self.author.trim() {
            "" => UNKNOWN_AUTHOR,
            author => author,
        };

        Ok(Self {
            text: text.to_string(),
            author: author.to_string(),
            theme: self.theme,
            created_at: self.created_at,
        })
    }
}
