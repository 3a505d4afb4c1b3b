/// Errors raised while talking to the tokenomics backend
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("Failed to decode backend response: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// Builds a status error, surfacing the backend's `detail` message
    /// verbatim when the body carries one.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| match value.get("detail") {
                Some(serde_json::Value::String(detail)) => Some(detail.clone()),
                Some(other) => Some(other.to_string()),
                None => None,
            })
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    "no response body".to_string()
                } else {
                    body.trim().to_string()
                }
            });

        ClientError::Status { status, detail }
    }

    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Status { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}
