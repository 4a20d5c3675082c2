use super::Error;

/// Error when the store rejects a rendered statement.
///
/// Carries the SQL that failed next to the driver's own error so the caller
/// can see exactly what was sent.
#[derive(Debug)]
pub(super) struct StatementFailed {
    sql: Box<str>,
    cause: Error,
}

impl std::error::Error for StatementFailed {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

impl core::fmt::Display for StatementFailed {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "statement failed: {}; sql={}", self.cause, self.sql)
    }
}

impl Error {
    /// Creates a statement failure for `sql`.
    pub fn statement_failed(
        sql: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Error {
        Error::statement_failed_with(sql, Error::driver_operation_failed(cause))
    }

    /// Creates a statement failure for `sql` from an existing error.
    pub fn statement_failed_with(sql: impl Into<String>, cause: Error) -> Error {
        Error::from(super::ErrorKind::StatementFailed(StatementFailed {
            sql: sql.into().into(),
            cause,
        }))
    }

    /// Returns `true` if this error is a statement failure.
    pub fn is_statement_failed(&self) -> bool {
        self.find(|kind| matches!(kind, super::ErrorKind::StatementFailed(_)))
    }

    /// The SQL of the failed statement, if this is a statement failure.
    pub fn sql(&self) -> Option<&str> {
        self.chain().find_map(|err| match err.kind() {
            super::ErrorKind::StatementFailed(err) => Some(&*err.sql),
            _ => None,
        })
    }
}
