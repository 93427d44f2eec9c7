use std::path::PathBuf;

/// Errors that can occur while locating, loading, or reviewing source files.
///
/// Library crates use this type directly; the binary converts to
/// `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use critique_core::CritiqueError;
///
/// let err = CritiqueError::Config("missing API key".into());
/// assert!(err.to_string().contains("missing API key"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum CritiqueError {
    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(critique::config))]
    Config(String),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(critique::config::toml))]
    Toml(#[from] toml::de::Error),

    /// The given path does not exist.
    #[error("not found: {}", .0.display())]
    #[diagnostic(code(critique::path::not_found))]
    NotFound(PathBuf),

    /// The given path exists but is not a regular file.
    #[error("not a file: {}", .0.display())]
    #[diagnostic(code(critique::path::not_a_file))]
    NotAFile(PathBuf),

    /// The given path exists but is not a directory.
    #[error("not a directory: {}", .0.display())]
    #[diagnostic(code(critique::path::not_a_directory))]
    NotADirectory(PathBuf),

    /// The file's extension is not in the accepted set.
    #[error("unsupported file extension: {}", .0.display())]
    #[diagnostic(
        code(critique::path::unsupported_extension),
        help("add the extension to `review.file_extensions` in .critique.toml")
    )]
    UnsupportedExtension(PathBuf),

    /// The file could not be read as text.
    #[error("cannot read {}: {source}", .path.display())]
    #[diagnostic(code(critique::io))]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A directory review found nothing to review.
    #[error("no matching files found in directory: {}", .0.display())]
    #[diagnostic(code(critique::no_files))]
    NoFilesFound(PathBuf),

    /// The request never produced an HTTP response.
    #[error("network error: {0} (check your network connectivity)")]
    #[diagnostic(code(critique::api::network))]
    Network(String),

    /// HTTP 401 from the API.
    #[error("API authentication failed, check your {}", crate::API_KEY_ENV)]
    #[diagnostic(code(critique::api::auth))]
    Authentication,

    /// HTTP 429 from the API.
    #[error("rate limit exceeded, try again in a moment")]
    #[diagnostic(code(critique::api::rate_limited))]
    RateLimited,

    /// HTTP 529 from the API.
    #[error("the API is temporarily overloaded, wait a minute and try again")]
    #[diagnostic(code(critique::api::overloaded))]
    ServiceOverloaded,

    /// Any other non-success HTTP status.
    #[error("API call failed with status {status}")]
    #[diagnostic(code(critique::api::status))]
    Api { status: u16, body: String },

    /// A success status with nothing in the body.
    #[error("API returned an empty response")]
    #[diagnostic(code(critique::api::empty))]
    EmptyResponse,

    /// The API answered, but not in the expected shape.
    #[error("malformed API response: {0}")]
    #[diagnostic(code(critique::api::malformed))]
    MalformedResponse(String),

    /// JSON serialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(critique::serialization))]
    Serialization(#[from] serde_json::Error),
}

impl CritiqueError {
    /// Whether a later attempt of the same request might succeed.
    ///
    /// # Examples
    ///
    /// ```
    /// use critique_core::CritiqueError;
    ///
    /// assert!(CritiqueError::RateLimited.is_transient());
    /// assert!(!CritiqueError::Authentication.is_transient());
    /// ```
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::RateLimited | Self::ServiceOverloaded
        )
    }
}
