//! Error types for guide parsing and querying.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuideError {
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Missing attribute `{attribute}` on <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Invalid XMLTV timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// A programme whose stop time precedes its start time.
    #[error("Programme '{title}' ends ({stop}) before it starts ({start})")]
    InvalidInterval {
        title: String,
        start: String,
        stop: String,
    },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid date scope '{0}' (expected today, tomorrow or any)")]
    InvalidDateScope(String),
}

impl From<quick_xml::encoding::EncodingError> for GuideError {
    fn from(err: quick_xml::encoding::EncodingError) -> Self {
        GuideError::Xml(err.into())
    }
}

impl From<quick_xml::events::attributes::AttrError> for GuideError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        GuideError::Xml(err.into())
    }
}

pub type Result<T> = std::result::Result<T, GuideError>;
