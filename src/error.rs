//! Error types shared across the client, cache and transport layers

use thiserror::Error;

/// Errors that can occur while fetching roasts
#[derive(Debug, Error)]
pub enum RaasError {
    /// The request failed, the server answered with a non-success status,
    /// or the body was not the document we expected
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// Encoding a cache entry failed
    #[error("Failed to encode JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The requested language is not listed in the manifest
    #[error("Language not supported: '{0}'")]
    UnsupportedLanguage(String),

    /// The selected shard (or the language's shard list) has nothing to pick from
    #[error("No roasts available for {language} shard {shard}")]
    EmptyShard { language: String, shard: u32 },

    /// Cache store I/O failed
    #[error("Cache error: {0}")]
    Cache(#[from] std::io::Error),
}

pub type RaasResult<T> = Result<T, RaasError>;

impl RaasError {
    pub(crate) fn network(url: &str, message: impl Into<String>) -> Self {
        RaasError::Network {
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// Maps a body that failed to deserialize to a network error for `url`
    pub(crate) fn malformed(url: &str, err: serde_json::Error) -> Self {
        Self::network(url, format!("malformed response: {}", err))
    }

    /// True for transport-level failures, including malformed responses
    pub fn is_network(&self) -> bool {
        matches!(self, RaasError::Network { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_language_message_names_code() {
        let err = RaasError::UnsupportedLanguage("xx".to_string());
        assert!(err.to_string().contains("'xx'"));
        assert!(!err.is_network());
    }

    #[test]
    fn test_network_constructor() {
        let err = RaasError::network("http://host/manifest.json", "HTTP 404");
        assert!(err.is_network());
        assert!(err.to_string().contains("manifest.json"));
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[test]
    fn test_malformed_body_is_network_error() {
        let serde_err = serde_json::from_str::<u32>("<html>").unwrap_err();
        let err = RaasError::malformed("http://host/manifest.json", serde_err);
        assert!(err.is_network());
        assert!(err.to_string().contains("manifest.json"));
        assert!(err.to_string().contains("malformed response"));
    }

    #[test]
    fn test_client_build_message() {
        let err = RaasError::ClientBuild("no TLS backend".to_string());
        assert_eq!(err.to_string(), "Failed to build HTTP client: no TLS backend");
        assert!(!err.is_network());
    }

    #[test]
    fn test_parse_error_converts_from_serde() {
        let serde_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: RaasError = serde_err.into();
        assert!(matches!(err, RaasError::Parse(_)));
    }
}
