use foodcmp_orchestrator::ProviderError;
use thiserror::Error;

/// Errors returned by the storefront HTTP adapter.
#[derive(Debug, Error)]
pub enum HttpProviderError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// HTTP 429. `retry_after_secs` holds the `Retry-After` header when it
    /// carried a number of seconds.
    #[error("rate limited by {provider}")]
    RateLimited {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl From<HttpProviderError> for ProviderError {
    fn from(err: HttpProviderError) -> Self {
        match &err {
            HttpProviderError::UnexpectedStatus { status, .. } if (400..500).contains(status) => {
                ProviderError::Rejected(err.to_string())
            }
            HttpProviderError::InvalidBaseUrl { .. } => ProviderError::Unavailable(err.to_string()),
            _ => ProviderError::Transport(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_rejected() {
        let err = HttpProviderError::UnexpectedStatus {
            status: 422,
            url: "http://shop.test/cart/items".to_owned(),
        };
        assert!(matches!(ProviderError::from(err), ProviderError::Rejected(_)));
    }

    #[test]
    fn server_errors_map_to_transport() {
        let err = HttpProviderError::UnexpectedStatus {
            status: 503,
            url: "http://shop.test/search".to_owned(),
        };
        let mapped = ProviderError::from(err);
        assert!(matches!(mapped, ProviderError::Transport(_)));
        assert!(mapped.to_string().contains("503"));
    }

    #[test]
    fn rate_limit_maps_to_transport() {
        let err = HttpProviderError::RateLimited {
            provider: "zomato".to_owned(),
            retry_after_secs: Some(30),
        };
        assert!(matches!(ProviderError::from(err), ProviderError::Transport(_)));
    }
}
