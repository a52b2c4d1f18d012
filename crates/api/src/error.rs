use thiserror::Error;

/// Failures that are not anticipated remote states.
///
/// Not-found and conflict answers are returned as values by the toolset; this
/// type covers transport failures, unexpected status codes and malformed bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to Airflow failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Airflow returned HTTP {status} for {url}: {body}")]
    Status { status: u16, url: String, body: String },

    #[error("unexpected Airflow response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("invalid Airflow API URL '{value}': {reason}")]
    InvalidUrl { value: String, reason: String },
}

impl ApiError {
    /// HTTP status attached to the error, when the service answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(error) => error.status().map(|status| status.as_u16()),
            ApiError::Decode { .. } | ApiError::InvalidUrl { .. } => None,
        }
    }

    /// Whether repeating the same call could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(error) => error.is_timeout() || error.is_connect(),
            ApiError::Status { status, .. } => *status >= 500 || *status == 429,
            ApiError::Decode { .. } | ApiError::InvalidUrl { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable_client_errors_are_not() {
        let server = ApiError::Status {
            status: 503,
            url: "http://localhost:8080/api/v1/dags".to_string(),
            body: String::new(),
        };
        let client = ApiError::Status {
            status: 403,
            url: "http://localhost:8080/api/v1/dags".to_string(),
            body: String::new(),
        };
        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert_eq!(client.status_code(), Some(403));
    }

    #[test]
    fn status_error_message_embeds_body() {
        let error = ApiError::Status {
            status: 500,
            url: "http://localhost:8080/api/v1/dags".to_string(),
            body: "boom".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Airflow returned HTTP 500 for http://localhost:8080/api/v1/dags: boom"
        );
    }
}
