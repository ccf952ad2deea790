use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid HWPX container: {0}")]
    InvalidContainer(String),

    #[error("unsupported HWPX version: {0}")]
    UnsupportedVersion(String),

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("failed to parse {part}: {message}")]
    SectionParseError { part: String, message: String },

    #[error("{part}: table nesting exceeds {limit} levels")]
    NestingTooDeep { part: String, limit: usize },

    #[error("method '{method}' cannot convert '.{extension}' files")]
    UnsupportedMethodForFormat { method: String, extension: String },

    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("{tool} timed out after {seconds}s")]
    ExternalToolTimeout { tool: String, seconds: u64 },

    #[error("{tool} failed: {message}")]
    ExternalToolFailure { tool: String, message: String },

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl Error {
    /// Stable machine-readable name of the error variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::InvalidContainer(_) => "invalid_container",
            Error::UnsupportedVersion(_) => "unsupported_version",
            Error::MalformedHeader(_) => "malformed_header",
            Error::SectionParseError { .. } => "section_parse_error",
            Error::NestingTooDeep { .. } => "nesting_too_deep",
            Error::UnsupportedMethodForFormat { .. } => "unsupported_method_for_format",
            Error::UnsupportedFormat(_) => "unsupported_format",
            Error::ExternalToolTimeout { .. } => "external_tool_timeout",
            Error::ExternalToolFailure { .. } => "external_tool_failure",
            Error::Zip(_) => "zip",
        }
    }
}
