//! Result type alias for phimask

use super::errors::PhimaskError;

/// Result type alias for phimask operations
///
/// # Examples
///
/// ```
/// use phimask::domain::result::Result;
/// use phimask::domain::errors::PhimaskError;
///
/// fn failing_function() -> Result<()> {
///     Err(PhimaskError::Input("not a file or directory".to_string()))
/// }
/// assert!(failing_function().is_err());
/// ```
pub type Result<T> = std::result::Result<T, PhimaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
