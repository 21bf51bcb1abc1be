use std::time::Duration;

use http::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::RelayError;

const POOL_MAX_IDLE_PER_HOST: usize = 16;
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(15);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn build_reqwest_client() -> Result<reqwest::Client, RelayError> {
    // No overall timeout: a streamed completion may legitimately run long.
    reqwest::Client::builder()
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .tcp_nodelay(true)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|err| RelayError::Transport(format!("Failed to build HTTP client: {err}")))
}

/// HTTP client for the upstream chat-completions endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    #[must_use]
    pub fn new() -> Self {
        let client = match build_reqwest_client() {
            Ok(client) => client,
            Err(err) => {
                tracing::error!(error = %err, "failed to build configured reqwest client, falling back to default client");
                reqwest::Client::new()
            }
        };
        Self { client }
    }

    /// Build the header set for one upstream call.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] when the API key cannot be encoded as a
    /// header value.
    pub fn build_headers(api_key: Option<&str>) -> Result<HeaderMap, RelayError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| RelayError::Config("API key is not a valid header value".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// POST a JSON body and return the raw response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Transport`] when the request cannot be sent or
    /// no response headers arrive.
    pub async fn post_json(
        &self,
        url: &str,
        api_key: Option<&str>,
        body: bytes::Bytes,
    ) -> Result<reqwest::Response, RelayError> {
        let headers = Self::build_headers(api_key)?;
        self.client
            .post(url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|err| {
                tracing::warn!(url, error = %err, "upstream request failed");
                RelayError::Transport(format!("Upstream request failed: {err}"))
            })
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_without_key_have_no_authorization() {
        let headers = HttpTransport::build_headers(None).unwrap();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_headers_with_key_use_bearer() {
        let headers = HttpTransport::build_headers(Some("sk-test")).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer sk-test");
        assert!(headers.get(AUTHORIZATION).unwrap().is_sensitive());
    }

    #[test]
    fn test_headers_reject_control_characters() {
        assert!(HttpTransport::build_headers(Some("bad\nkey")).is_err());
    }
}
