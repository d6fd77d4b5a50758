use itertools::Itertools;
use thiserror::Error;

/// A form field that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Field {
    #[strum(serialize = "name")]
    Name,
    #[strum(serialize = "question count")]
    Count,
}

impl Field {
    pub fn message(&self) -> &'static str {
        match self {
            Field::Name => "Name must be 2 to 20 characters long",
            Field::Count => "Number of questions must be a whole number from 5 to 20",
        }
    }
}

/// Rejected game settings. Every failing field is listed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {}", .fields.iter().join(", "))]
pub struct ValidationError {
    pub fields: Vec<Field>,
}

impl ValidationError {
    pub fn has(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }
}

/// Failure to obtain questions from the trivia provider
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not reach the trivia provider: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("trivia provider answered with HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("could not read the trivia provider response: {0}")]
    Decode(String),
    #[error("trivia provider reported {0}")]
    Provider(ResponseCode),
    #[error("trivia provider sent a malformed question: {0}")]
    Malformed(String),
}

/// The status an Open Trivia DB payload embeds next to its results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseCode(pub u8);

impl ResponseCode {
    pub const SUCCESS: ResponseCode = ResponseCode(0);

    pub fn is_success(&self) -> bool {
        *self == Self::SUCCESS
    }

    pub fn describe(&self) -> &'static str {
        match self.0 {
            0 => "success",
            1 => "not enough questions for this query",
            2 => "invalid parameter",
            3 => "session token not found",
            4 => "session token exhausted",
            5 => "too many requests, try again in a few seconds",
            _ => "unknown error",
        }
    }
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "code {}: {}", self.0, self.describe())
    }
}

/// Failure to translate one string. Always recovered by falling back to the source text.
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("translation request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("translation provider answered with HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("could not read the translation response: {0}")]
    Decode(String),
    #[error("translation response had no translated text")]
    MissingText,
}
