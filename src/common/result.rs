use crate::common::error::RepoMirrorError;

/// Result alias used across the crate
///
/// # Examples
///
/// ```
/// use repomirror::common::result::RepoMirrorResult;
/// use repomirror::common::error::RepoMirrorError;
///
/// fn example_function() -> RepoMirrorResult<String> {
///     Ok("success".to_string())
/// }
///
/// fn example_with_error() -> RepoMirrorResult<()> {
///     Err(RepoMirrorError::internal_error("Something went wrong"))
/// }
/// ```
pub type RepoMirrorResult<T> = Result<T, RepoMirrorError>;

/// Conversion helpers from `Option` into [`RepoMirrorResult`]
pub trait OptionExt<T> {
    /// Turn `None` into an internal error carrying `message`
    ///
    /// ```
    /// use repomirror::common::result::{RepoMirrorResult, OptionExt};
    ///
    /// let none_value: Option<String> = None;
    /// let result: RepoMirrorResult<String> = none_value.ok_or_internal_error("Value not found");
    /// assert!(result.is_err());
    /// ```
    fn ok_or_internal_error(self, message: impl Into<String>) -> RepoMirrorResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_internal_error(self, message: impl Into<String>) -> RepoMirrorResult<T> {
        self.ok_or_else(|| RepoMirrorError::internal_error(message))
    }
}

/// Conversion helpers from foreign `Result`s into [`RepoMirrorResult`]
pub trait ResultExt<T, E> {
    /// Map an I/O flavoured error into a filesystem error tied to `path`
    ///
    /// ```
    /// use repomirror::common::result::{RepoMirrorResult, ResultExt};
    ///
    /// let result: Result<String, std::io::Error> = Err(std::io::Error::new(
    ///     std::io::ErrorKind::NotFound, "file not found"
    /// ));
    /// let mapped: RepoMirrorResult<String> = result.with_filesystem_error("read failed", None);
    /// assert!(mapped.is_err());
    /// ```
    fn with_filesystem_error(
        self,
        message: impl Into<String>,
        path: Option<std::path::PathBuf>,
    ) -> RepoMirrorResult<T>
    where
        E: Into<std::io::Error>;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn with_filesystem_error(
        self,
        message: impl Into<String>,
        path: Option<std::path::PathBuf>,
    ) -> RepoMirrorResult<T>
    where
        E: Into<std::io::Error>,
    {
        self.map_err(|e| {
            let io_error = e.into();
            RepoMirrorError::filesystem_error_with_source(message, path, io_error)
        })
    }
}
