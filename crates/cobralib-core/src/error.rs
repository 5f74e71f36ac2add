use thiserror::Error;

/// Library-wide error type.
///
/// Keeps the failure classes distinct so callers can react accordingly:
/// configuration problems are caller bugs, connection problems are
/// environmental, statement problems come back from the engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad engine tag or missing credentials for the chosen engine.
    #[error("configuration error: {0}")]
    Config(String),

    /// The engine is unreachable, authentication failed, or the handle
    /// was already closed.
    #[error("connection error: {0}")]
    Connection(String),

    /// The engine rejected a statement (malformed SQL, constraint
    /// violation, placeholder/parameter mismatch).
    #[error("statement error: {0}")]
    Statement(String),

    /// The operation is not supported by the target engine.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A bulk-load source file could not be read or coerced.
    #[error("ingest error: {0}")]
    Ingest(String),

    /// IO error (file operations).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for results returned by cobralib crates.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_class_and_message() {
        let err = Error::Config("unknown engine tag 'oracle'".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: unknown engine tag 'oracle'"
        );

        let err = Error::Unsupported("SQLite has no database listing".to_string());
        assert!(err.to_string().starts_with("unsupported:"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
