//! Error types for daokit

use std::time::Duration;
use thiserror::Error;

/// Result type alias for daokit operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for model registration, statement compilation and execution.
///
/// Registration and compilation errors (`NoFields` through `Validation`) signal a
/// programming error in the caller and are never defaulted away.
#[derive(Debug, Error)]
pub enum OrmError {
    /// The model maps no fields at all
    #[error("No fields mapped for model '{0}'")]
    NoFields(String),

    /// The model declares no primary key field
    #[error("No primary key declared for model '{0}'")]
    NoPrimaryKey(String),

    /// Two fields share a logical name or a column
    #[error("Duplicate field or column '{name}' in model '{model}'")]
    DuplicateField { model: String, name: String },

    /// A table or column name that cannot be backtick-quoted
    #[error("Invalid identifier: {0}")]
    InvalidIdent(String),

    /// A field reference that resolves to neither a logical name nor a column
    #[error("Unknown field '{field}' on table '{table}'")]
    UnknownField { table: String, field: String },

    /// `in` / `not in` with an empty value set
    #[error("Empty value set for `{op}` on field '{field}'")]
    EmptyInList { field: String, op: &'static str },

    /// An update entry with neither a value nor an expression
    #[error("Invalid update entry for field '{0}': no value or expression")]
    InvalidUpdateEntry(String),

    /// UPDATE / DELETE through the conditional path without any WHERE condition
    #[error("Unconditional {0} is not allowed; use the explicit whole-table method")]
    UnconditionalMutation(&'static str),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error reported by the execution collaborator
    #[error("Driver error: {0}")]
    Driver(String),

    /// Row / cell decode error
    #[error("Decode error on field '{field}': {message}")]
    Decode { field: String, message: String },

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(Duration),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific field
    pub fn decode(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an unknown-field error
    pub fn unknown_field(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            table: table.into(),
            field: field.into(),
        }
    }

    /// Create a driver error from any displayable source
    pub fn driver(err: impl std::fmt::Display) -> Self {
        Self::Driver(err.to_string())
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Whether the error was raised while registering a model or compiling a statement,
    /// i.e. before anything reached the database.
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            Self::NoFields(_)
                | Self::NoPrimaryKey(_)
                | Self::DuplicateField { .. }
                | Self::InvalidIdent(_)
                | Self::UnknownField { .. }
                | Self::EmptyInList { .. }
                | Self::InvalidUpdateEntry(_)
                | Self::UnconditionalMutation(_)
                | Self::Validation(_)
        )
    }
}

#[cfg(feature = "mysql")]
impl From<mysql_async::Error> for OrmError {
    fn from(err: mysql_async::Error) -> Self {
        Self::Driver(err.to_string())
    }
}
