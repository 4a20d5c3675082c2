use super::Error;

/// Error when a mapping descriptor is invalid.
///
/// This occurs when:
/// - A relation targets a model that was never registered
/// - A relation or key names a field that has no column
/// - Two models are registered under the same name
///
/// These indicate a defect in the declared mapping, not a data condition.
#[derive(Debug)]
pub(super) struct InvalidSchema {
    message: Box<str>,
}

impl std::error::Error for InvalidSchema {}

impl core::fmt::Display for InvalidSchema {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid schema: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidSchema(InvalidSchema {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid schema error.
    pub fn is_invalid_schema(&self) -> bool {
        self.find(|kind| matches!(kind, super::ErrorKind::InvalidSchema(_)))
    }
}
