// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

/// Failures surfaced by data-access calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("invalid {entity} record: {detail}")]
    InvalidRecord { entity: &'static str, detail: String },
    #[error("{context}: {message}")]
    Store { context: String, message: String },
}

impl DataError {
    pub fn invalid_record(entity: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidRecord {
            entity,
            detail: detail.into(),
        }
    }

    pub fn store(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Short title for the modal that reports this error.
    pub const fn title(&self) -> &'static str {
        match self {
            Self::InvalidRecord { .. } => "invalid record",
            Self::Store { .. } => "database error",
        }
    }
}

pub type DataResult<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::DataError;

    #[test]
    fn store_error_keeps_diagnostic_text() {
        let error = DataError::store("rename place 4", "database is locked");
        assert_eq!(error.to_string(), "rename place 4: database is locked");
        assert_eq!(error.title(), "database error");
    }

    #[test]
    fn invalid_record_names_the_entity() {
        let error = DataError::invalid_record("place", "id 0 is not positive");
        assert_eq!(
            error.to_string(),
            "invalid place record: id 0 is not positive"
        );
    }
}
