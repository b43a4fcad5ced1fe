use std::fmt;

/// Construction-time failure recorded by a [`crate::Descriptor`] builder step.
///
/// These are accumulated, never raised; the engine checks them before the
/// first physical attempt.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    /// The raw URL could not be parsed as an absolute URI.
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    /// `content_type` was called with an empty value.
    #[error("content type is empty")]
    EmptyContentType,
    /// `authorization` or `authorization_bearer` was called with an empty value.
    #[error("token is empty")]
    EmptyToken,
    /// `parameter` was called with an empty payload.
    #[error("params are empty")]
    EmptyParams,
    /// The payload shape cannot be expressed as query or form values.
    #[error("unsupported parameter {key}: {reason}")]
    UnsupportedParameter { key: String, reason: String },
    /// The payload as a whole is not a key/value mapping.
    #[error("unsupported parameter payload: {reason}")]
    UnsupportedPayload { reason: String },
}

/// Every construction error a descriptor accumulated, joined.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidDescriptor {
    pub errors: Vec<DescriptorError>,
}

impl fmt::Display for InvalidDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for InvalidDescriptor {}

/// Execution-time failure of one physical attempt.
///
/// Every variant triggers a retry; non-200 statuses are not errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The attempt exceeded the engine timeout.
    #[error("request timed out: {0}")]
    Timeout(reqwest::Error),
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(reqwest::Error),
    /// The method is not a valid HTTP token.
    #[error("malformed request: {0}")]
    InvalidRequest(String),
    /// `reqwest` rejected the request while building it (bad header name or value).
    #[error("malformed request: {0}")]
    Builder(reqwest::Error),
    /// Any other network or protocol error from `reqwest`.
    #[error("transport error: {0}")]
    Request(reqwest::Error),
    /// The response arrived but its body could not be read.
    #[error("failed to read response body: {0}")]
    Body(reqwest::Error),
    /// Failure reported by a custom [`crate::Transport`].
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Classifies a `reqwest` send error.
    pub(crate) fn from_send(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else if err.is_connect() {
            Self::Connect(err)
        } else if err.is_builder() {
            Self::Builder(err)
        } else {
            Self::Request(err)
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Invalid engine configuration read from the environment.
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("{name} is not a valid millisecond value: '{value}'")]
    InvalidMillis { name: &'static str, value: String },
}
