// Client errors

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("timeout: Labelary did not respond in time")]
    Timeout,

    #[error("Labelary returned HTTP {status}: {body}")]
    Server { status: u16, body: String },

    #[error("no Labelary API key configured (set labelary.api_key or pass one explicitly)")]
    MissingApiKey,

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Map a transport error, pulling timeouts out into their own variant
    pub(crate) fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Network(error)
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("environment variable {0} is not valid unicode")]
    NotUnicode(String),

    #[error("configuration key {0} is not a scalar value")]
    NotAScalar(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
