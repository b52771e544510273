use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Timeout")]
    Timeout,

    #[error("Invalid JSON from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{url} returned an empty membership list")]
    EmptyList { url: String },
}

impl ClientError {
    /// Whether the request never produced a usable HTTP response
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Http(_) | ClientError::Timeout | ClientError::Status { .. }
        )
    }

    /// Whether the node answered but the body could not be used
    pub fn is_parse(&self) -> bool {
        matches!(self, ClientError::Parse { .. } | ClientError::EmptyList { .. })
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
