//! Error types for bigtable-sql.
//!
//! This module defines domain-specific error types organized by functional area.

use std::fmt;
use thiserror::Error;

/// Top-level error type encompassing all possible errors.
#[derive(Error, Debug)]
pub enum BigtableError {
    /// Credential resolution errors
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Connection-related errors
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Statement and cursor errors
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Cell coercion errors
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Errors reported by the remote query engine
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Errors raised while obtaining authorization material.
///
/// Cloneable so that a cached resolution failure can be handed to every caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Credential file missing or unreadable
    #[error("Failed to read credential file '{path}': {message}")]
    FileUnreadable { path: String, message: String },

    /// Credential JSON could not be parsed
    #[error("Malformed credential JSON: {0}")]
    Malformed(String),

    /// No ambient credentials could be discovered
    #[error("Failed to get application default credentials: {0}")]
    AmbientUnavailable(String),
}

/// Errors related to client connections.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Invalid connection parameters
    #[error("Invalid connection parameter '{parameter}': {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Connection string parsing error
    #[error("Failed to parse connection string: {0}")]
    ParseError(String),

    /// Credential resolution failed while connecting
    #[error("Authentication failed: {0}")]
    Credential(#[from] CredentialError),

    /// The engine connector refused to build a client
    #[error("Failed to create data client for {project}/{instance}: {message}")]
    ClientCreationFailed {
        project: String,
        instance: String,
        message: String,
    },

    /// Connection is closed
    #[error("Connection is closed")]
    ConnectionClosed,
}

/// Errors related to statements and result cursors.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Prepared statement has been closed
    #[error("Prepared statement has been closed")]
    StatementClosed,

    /// Result cursor has been closed
    #[error("Result set has been closed")]
    ResultSetClosed,

    /// Feature intentionally not implemented by this driver
    #[error("Operation not supported: {0}")]
    UnsupportedOperation(String),

    /// Parameter type that cannot be represented in a bound statement
    #[error("Unsupported type for parameter {index}: {type_name}")]
    UnsupportedType { index: usize, type_name: String },

    /// Parameter binding error
    #[error("Parameter binding error for parameter {index}: {message}")]
    ParameterBindingError { index: usize, message: String },

    /// Statement has no query text
    #[error("No SQL query text was provided")]
    MissingSql,

    /// Query execution failed on the remote side
    #[error("Query execution failed: {0}")]
    ExecutionFailed(String),

    /// Typed accessor called while no row is positioned
    #[error("Result cursor is not positioned on a row")]
    CursorNotPositioned,

    /// Column name absent from the result metadata
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Column index outside `1..=column_count`
    #[error("Column index {index} out of range (result has {count} columns)")]
    InvalidColumnIndex { index: usize, count: usize },

    /// Cell could not be coerced to the requested type
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Errors related to cell coercion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// Cell type cannot be read as the requested type
    #[error("Cannot read {actual} cell in column {column} as {requested}")]
    IncompatibleType {
        column: usize,
        actual: String,
        requested: &'static str,
    },

    /// Fixed-width byte decoding saw an unexpected width
    #[error("Column {column}: expected {expected} bytes for {requested}, found {actual}")]
    InvalidWidth {
        column: usize,
        requested: &'static str,
        expected: &'static str,
        actual: usize,
    },

    /// Text could not be parsed as the requested type
    #[error("Column {column}: cannot parse '{value}' as {requested}")]
    InvalidFormat {
        column: usize,
        value: String,
        requested: &'static str,
    },

    /// Overflow during narrowing
    #[error("Numeric overflow in column {column} reading {requested}")]
    NumericOverflow {
        column: usize,
        requested: &'static str,
    },

    /// Integer not exactly representable in the requested float type
    #[error("Column {column}: {value} cannot be read as {requested} without rounding")]
    PrecisionLoss {
        column: usize,
        value: i64,
        requested: &'static str,
    },

    /// Invalid UTF-8 string
    #[error("Invalid UTF-8 bytes in column {column}")]
    InvalidUtf8 { column: usize },
}

/// Errors reported across the remote query engine boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Query text or bound parameters rejected by the service
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Table, view or instance not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller lacks permission
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Service unreachable
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Result stream broke mid-read
    #[error("Stream error: {0}")]
    Stream(String),

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Classification of errors onto the driver's error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credential material problem
    Credential,
    /// Malformed endpoint or failed connect
    Connection,
    /// Operation on a closed statement or cursor
    StatementClosed,
    /// Feature intentionally not implemented
    UnsupportedOperation,
    /// Unrepresentable parameter type
    UnsupportedType,
    /// Typed accessor without a positioned row
    CursorNotPositioned,
    /// Column name not in the metadata
    UnknownColumn,
    /// Bad index or missing query text
    InvalidArgument,
    /// Remote execution failure
    Execution,
    /// Cell coercion failure
    Conversion,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Credential => write!(f, "CREDENTIAL"),
            ErrorKind::Connection => write!(f, "CONNECTION"),
            ErrorKind::StatementClosed => write!(f, "STATEMENT_CLOSED"),
            ErrorKind::UnsupportedOperation => write!(f, "UNSUPPORTED_OPERATION"),
            ErrorKind::UnsupportedType => write!(f, "UNSUPPORTED_TYPE"),
            ErrorKind::CursorNotPositioned => write!(f, "CURSOR_NOT_POSITIONED"),
            ErrorKind::UnknownColumn => write!(f, "UNKNOWN_COLUMN"),
            ErrorKind::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
            ErrorKind::Execution => write!(f, "EXECUTION"),
            ErrorKind::Conversion => write!(f, "CONVERSION"),
        }
    }
}

impl BigtableError {
    /// Map to the error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BigtableError::Credential(_) => ErrorKind::Credential,
            BigtableError::Connection(e) => e.kind(),
            BigtableError::Query(e) => e.kind(),
            BigtableError::Conversion(_) => ErrorKind::Conversion,
            BigtableError::Engine(_) => ErrorKind::Execution,
        }
    }
}

impl ConnectionError {
    /// Map to the error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConnectionError::Credential(_) => ErrorKind::Credential,
            _ => ErrorKind::Connection,
        }
    }
}

impl QueryError {
    /// Map to the error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::StatementClosed | QueryError::ResultSetClosed => {
                ErrorKind::StatementClosed
            }
            QueryError::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            QueryError::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            QueryError::ParameterBindingError { .. }
            | QueryError::MissingSql
            | QueryError::InvalidColumnIndex { .. } => ErrorKind::InvalidArgument,
            QueryError::ExecutionFailed(_) => ErrorKind::Execution,
            QueryError::CursorNotPositioned => ErrorKind::CursorNotPositioned,
            QueryError::UnknownColumn(_) => ErrorKind::UnknownColumn,
            QueryError::Conversion(_) => ErrorKind::Conversion,
        }
    }
}

impl From<EngineError> for QueryError {
    fn from(err: EngineError) -> Self {
        QueryError::ExecutionFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_error_display() {
        let err = CredentialError::FileUnreadable {
            path: "/no/such/file.json".to_string(),
            message: "No such file or directory".to_string(),
        };
        assert!(err.to_string().contains("/no/such/file.json"));
    }

    #[test]
    fn test_connection_error_wraps_credential() {
        let err: ConnectionError = CredentialError::Malformed("expected value".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Credential);
        assert!(err.to_string().contains("Authentication failed"));
    }

    #[test]
    fn test_query_error_kinds() {
        assert_eq!(QueryError::StatementClosed.kind(), ErrorKind::StatementClosed);
        assert_eq!(QueryError::ResultSetClosed.kind(), ErrorKind::StatementClosed);
        assert_eq!(
            QueryError::UnsupportedOperation("executeUpdate".to_string()).kind(),
            ErrorKind::UnsupportedOperation
        );
        assert_eq!(
            QueryError::UnsupportedType {
                index: 1,
                type_name: "DECIMAL".to_string()
            }
            .kind(),
            ErrorKind::UnsupportedType
        );
        assert_eq!(
            QueryError::CursorNotPositioned.kind(),
            ErrorKind::CursorNotPositioned
        );
        assert_eq!(
            QueryError::UnknownColumn("nope".to_string()).kind(),
            ErrorKind::UnknownColumn
        );
    }

    #[test]
    fn test_engine_error_becomes_execution_failure() {
        let err: QueryError = EngineError::InvalidArgument("missing parameter".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert!(err.to_string().contains("missing parameter"));
    }

    #[test]
    fn test_conversion_error_display() {
        let err = ConversionError::InvalidWidth {
            column: 3,
            requested: "BOOL",
            expected: "1 or 8",
            actual: 2,
        };
        assert!(err.to_string().contains("Column 3"));
        assert!(err.to_string().contains("found 2"));
    }

    #[test]
    fn test_top_level_kind() {
        let err = BigtableError::from(QueryError::StatementClosed);
        assert_eq!(err.kind(), ErrorKind::StatementClosed);
        assert_eq!(err.kind().to_string(), "STATEMENT_CLOSED");

        let err = BigtableError::from(EngineError::Unavailable("down".to_string()));
        assert_eq!(err.kind(), ErrorKind::Execution);
    }
}
