//! Result type alias
//!
//! Convenience alias that uses [`FerpaError`] as the error type.

use super::errors::FerpaError;

/// Result type alias for pipeline operations
///
/// # Examples
///
/// ```
/// use ferpa_feedback::domain::result::Result;
/// use ferpa_feedback::domain::errors::FerpaError;
///
/// fn authorize(clean: bool) -> Result<()> {
///     if clean {
///         Ok(())
///     } else {
///         Err(FerpaError::GateViolation { record_id: "rec-1".to_string() })
///     }
/// }
///
/// assert!(authorize(true).is_ok());
/// assert!(authorize(false).is_err());
/// ```
pub type Result<T> = std::result::Result<T, FerpaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<usize> {
            Ok(3)
        }

        let value = inner()?;
        assert_eq!(value, 3);
        Ok(())
    }

    #[test]
    fn test_result_err() {
        let result: Result<()> = Err(FerpaError::Cancelled);
        assert!(result.is_err());
    }
}
