use thiserror::Error;

/// Errors raised while shaping records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// A required field is missing or a value cannot be interpreted
    #[error("Validation error: {0}")]
    Validation(String),
}

impl RecordError {
    pub(crate) fn missing(field: &str, purpose: &str) -> Self {
        Self::Validation(format!("{field} is required to {purpose}"))
    }
}

pub type RecordResult<T> = Result<T, RecordError>;

/// Returns the value when it is present and non-empty.
pub(crate) fn require<'a>(
    value: Option<&'a str>,
    field: &str,
    purpose: &str,
) -> RecordResult<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RecordError::missing(field, purpose)),
    }
}
