#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Credential decode error: {0}")]
    CredentialDecode(String),
    #[error("Registration rejected (status {status}): {detail}")]
    RegistrationRejected { status: u16, detail: String },
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Session storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Maps a transport error, folding timeouts into [`Error::Timeout`].
    pub(crate) fn from_transport(err: reqwest::Error, operation: &'static str) -> Self {
        if err.is_timeout() {
            Self::Timeout { operation }
        } else {
            Self::Http(err)
        }
    }
}
