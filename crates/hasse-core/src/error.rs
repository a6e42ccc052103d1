/// Error type for text-format parsing failures.
///
/// Undeclared elements inside rule lines are not errors: the format drops
/// them silently, and a rule whose conclusion ends up empty is skipped.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Filesystem failure while reading.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The file name carries no extension to select a format with.
    #[error("file name has no extension: {0}")]
    MissingExtension(String),
    /// No reader is registered for the extension.
    #[error("unrecognised extension: {0}")]
    UnknownExtension(String),
    /// The input ended before the ground-set line.
    #[error("missing ground-set line")]
    MissingGroundSet,
    /// A rule line without the arrow separator, or with a second one.
    #[error("malformed rule on line {line}: {message}")]
    MalformedRule { line: usize, message: String },
    /// A ground-set token that does not parse as an element.
    #[error("invalid element token {token:?} on line {line}")]
    BadToken { token: String, line: usize },
}

/// Error type for save failures.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// Filesystem failure while writing.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The file name carries no extension to select a format with.
    #[error("file name has no extension: {0}")]
    MissingExtension(String),
    /// No writer is registered for the extension.
    #[error("unrecognised extension: {0}")]
    UnknownExtension(String),
}
