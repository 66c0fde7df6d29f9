//! Error types for dolisync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a call against the remote contact store or mailing service.
///
/// A "not found" answer is never a `RemoteError`; lookups model it as
/// `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The request never produced an HTTP response (DNS, connect, timeout, …).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-2xx status.
    #[error("remote returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    /// The service answered 2xx but the body was not what we expected.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// All errors that can arise while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure while reading the config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error, with the offending file.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// A required setting is empty after file and environment were applied.
    #[error("missing required setting `{setting}` (set it in the config file or via {env})")]
    Missing {
        setting: &'static str,
        env: &'static str,
    },

    /// An environment override could not be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    /// Request timeout must be at least one second.
    #[error("api.timeout_secs must be greater than zero")]
    InvalidTimeout,
}
