//! Result type alias for ingestion operations

use crate::error::OruError;

/// Standard Result type for ingestion operations
pub type Result<T> = std::result::Result<T, OruError>;

/// Extension trait for Result to provide additional convenience methods
pub trait ResultExt<T> {
    /// Convert an error to `None` if it is recoverable, propagate it otherwise
    fn recoverable(self) -> Result<Option<T>>;

    /// Log the error and continue with None
    fn log_and_continue(self) -> Option<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn recoverable(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_recoverable() => {
                tracing::warn!("Recoverable error: {}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn log_and_continue(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                if err.is_recoverable() {
                    tracing::warn!("Continuing after error: {}", err);
                } else {
                    tracing::error!("Fatal error: {}", err);
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_swallows_store_errors() {
        let result: Result<u32> = Err(OruError::store_error("down"));
        assert!(matches!(result.recoverable(), Ok(None)));
    }

    #[test]
    fn test_recoverable_propagates_config_errors() {
        let result: Result<u32> = Err(OruError::config_error("missing topic"));
        assert!(result.recoverable().is_err());
    }

    #[test]
    fn test_log_and_continue() {
        let ok: Result<u32> = Ok(7);
        assert_eq!(ok.log_and_continue(), Some(7));

        let err: Result<u32> = Err(OruError::source_error("gone"));
        assert_eq!(err.log_and_continue(), None);
    }
}
