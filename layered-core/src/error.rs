//! Error types for layered matrix construction

/// Errors that can occur while building or reading a layered matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayeredError {
    /// A value is negative
    NegativeValue,
    /// A value exceeds the 32-bit unsigned range
    ValueOutOfRange,
    /// A floating-point value is NaN
    NonFiniteValue,
    /// Requested chunk size is zero
    NonPositiveChunkSize,
    /// Requested thread count is zero
    NonPositiveThreadCount,
    /// Configuration could not be parsed
    MalformedConfig,
    /// A triplet source reports a non-numeric field
    UnsupportedField,
    /// A row or column index lies outside the matrix
    IndexOutOfBounds,
    /// Input text or structure could not be interpreted
    MalformedInput(&'static str),
    /// The second traversal of a source disagreed with the first
    InconsistentSource,
    /// The worker pool could not be created
    ThreadPool,
    /// An I/O operation failed
    Io(&'static str),
}

/// Broad classes of [`LayeredError`], for callers that only need to know
/// what kind of failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidValue,
    InvalidConfiguration,
    UnsupportedField,
    Input,
    Runtime,
}

impl LayeredError {
    /// Get the category of this error
    pub const fn category(&self) -> ErrorCategory {
        match self {
            LayeredError::NegativeValue
            | LayeredError::ValueOutOfRange
            | LayeredError::NonFiniteValue => ErrorCategory::InvalidValue,
            LayeredError::NonPositiveChunkSize
            | LayeredError::NonPositiveThreadCount
            | LayeredError::MalformedConfig => ErrorCategory::InvalidConfiguration,
            LayeredError::UnsupportedField => ErrorCategory::UnsupportedField,
            LayeredError::IndexOutOfBounds
            | LayeredError::MalformedInput(_)
            | LayeredError::InconsistentSource => ErrorCategory::Input,
            LayeredError::ThreadPool | LayeredError::Io(_) => ErrorCategory::Runtime,
        }
    }
}

impl core::fmt::Display for LayeredError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LayeredError::NegativeValue => write!(f, "values should not be negative"),
            LayeredError::ValueOutOfRange => {
                write!(f, "value is outside of the range of a 32-bit unsigned integer")
            }
            LayeredError::NonFiniteValue => write!(f, "value is not a number"),
            LayeredError::NonPositiveChunkSize => write!(f, "chunk size should be positive"),
            LayeredError::NonPositiveThreadCount => write!(f, "thread count should be positive"),
            LayeredError::MalformedConfig => write!(f, "configuration could not be parsed"),
            LayeredError::UnsupportedField => {
                write!(f, "expected a numeric field in the triplet source")
            }
            LayeredError::IndexOutOfBounds => write!(f, "index out of bounds"),
            LayeredError::MalformedInput(msg) => write!(f, "malformed input: {msg}"),
            LayeredError::InconsistentSource => {
                write!(f, "source yielded different entries on its second traversal")
            }
            LayeredError::ThreadPool => write!(f, "failed to build worker thread pool"),
            LayeredError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl core::error::Error for LayeredError {}

/// Result type for layered matrix operations
pub type Result<T> = core::result::Result<T, LayeredError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            LayeredError::NegativeValue.category(),
            ErrorCategory::InvalidValue
        );
        assert_eq!(
            LayeredError::ValueOutOfRange.category(),
            ErrorCategory::InvalidValue
        );
        assert_eq!(
            LayeredError::NonPositiveChunkSize.category(),
            ErrorCategory::InvalidConfiguration
        );
        assert_eq!(
            LayeredError::UnsupportedField.category(),
            ErrorCategory::UnsupportedField
        );
        assert_eq!(
            LayeredError::MalformedInput("bad line").category(),
            ErrorCategory::Input
        );
    }
}
