//! Error taxonomy shared by the client, the scheduler and the stream.
//!
//! Per-fetch failures (`Transport`, `Http`, `Decode`) are handed to the
//! consumer as stream items and never stop polling.  `Configuration` and
//! `InvalidUrl` are returned synchronously from the call that was
//! misconfigured.

/// Everything that can go wrong between the stream and the remote API.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// A required credential or client parameter is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The response body did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_displays_status_and_body() {
        let err = StreamError::Http {
            status: 400,
            body: "bad token".into(),
        };
        assert_eq!(err.to_string(), "HTTP 400: bad token");
    }

    #[test]
    fn configuration_error_names_the_missing_parameter() {
        let err = StreamError::Configuration("client_id not set".into());
        assert!(err.to_string().contains("client_id"));
    }

    #[test]
    fn decode_error_converts_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StreamError = serde_err.into();
        assert!(matches!(err, StreamError::Decode(_)));
    }
}
