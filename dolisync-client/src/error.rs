//! Error types for dolisync-client.

use thiserror::Error;

use dolisync_core::RemoteError;

/// All errors that can arise from a Dolibarr API call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got an HTTP response.
    #[error("transport error calling {url}: {message}")]
    Transport { url: String, message: String },

    /// Non-2xx answer.
    #[error("HTTP {code} from {url}: {body}")]
    Status { url: String, code: u16, body: String },

    /// The response body could not be read.
    #[error("failed to read response from {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// The body was read but did not have the expected shape.
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { code: 404, .. })
    }
}

impl From<ClientError> for RemoteError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transport { .. } => RemoteError::Transport(err.to_string()),
            ClientError::Status { code, body, .. } => RemoteError::Status { code, body },
            ClientError::Io { .. } | ClientError::Decode { .. } => {
                RemoteError::Decode(err.to_string())
            }
        }
    }
}
