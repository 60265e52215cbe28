use std::sync::Arc;

use amply_api_types::{ApiErrorBody, ApiResponse};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::api::{ApiError, TokenStore};
use crate::config::CoreConfig;

/// JSON over HTTP with the stored bearer token attached.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(config: &CoreConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Self::with_client(client, &config.api_base_url, tokens)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, ApiError> {
        // Without the trailing slash `join` would replace the last segment.
        let base = if base_url.ends_with('/') {
            base_url.to_owned()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&base).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            tokens,
        })
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path, query)?;
        self.execute(self.client.get(url)).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path, &[])?;
        self.execute(self.client.post(url).json(body)).await
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path, &[])?;
        self.execute(self.client.patch(url).json(body)).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let request = match self.tokens.load() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), %status, "api response");

        let body = response.text().await?;
        if status == StatusCode::UNAUTHORIZED {
            warn!("access token rejected");
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body, status),
            });
        }

        decode_envelope(&body)
    }
}

pub(crate) fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str::<ApiResponse<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| ApiError::Decode(e.to_string()))
}

fn error_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_owned()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryTokenStore;

    fn client(base: &str) -> ApiClient {
        ApiClient::with_client(
            reqwest::Client::new(),
            base,
            Arc::new(MemoryTokenStore::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_url_joins_under_base_path() {
        let api = client("http://localhost:8080/api");
        assert_eq!(
            api.url("/station/public", &[]).unwrap().as_str(),
            "http://localhost:8080/api/station/public"
        );
        assert_eq!(
            api.url("user/me", &[]).unwrap().as_str(),
            "http://localhost:8080/api/user/me"
        );
    }

    #[test]
    fn test_url_query_pairs() {
        let api = client("http://localhost:8080/api/");
        let url = api
            .url(
                "station/public",
                &[("page", "2".to_owned()), ("search", "ben thanh".to_owned())],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/station/public?page=2&search=ben+thanh"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result =
            ApiClient::with_client(reqwest::Client::new(), "not a url", Arc::new(MemoryTokenStore::new()));
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_decode_envelope() {
        let value: Vec<String> = decode_envelope(r#"{"data":["a","b"],"message":"ok"}"#).unwrap();
        assert_eq!(value, vec!["a", "b"]);

        assert!(matches!(
            decode_envelope::<Vec<String>>(r#"["a"]"#),
            Err(ApiError::Decode(_))
        ));
    }

    #[test]
    fn test_error_message_prefers_backend_text() {
        assert_eq!(
            error_message(r#"{"message":"Station not found","statusCode":404}"#, StatusCode::NOT_FOUND),
            "Station not found"
        );
        assert_eq!(error_message("<html>", StatusCode::BAD_GATEWAY), "Bad Gateway");
    }
}
