//! HTTP client for the FarmTwin backend

use crate::auth::{AuthBackend, LoginRequest, LoginResponse, SessionManager, User};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Fallback shown when a login rejection carries no message
pub const DEFAULT_LOGIN_ERROR: &str = "Invalid credentials";

/// Unauthenticated access to the backend
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client from API configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        debug!("POST {}", self.url("/auth/login"));
        let response = self
            .request(Method::POST, "/auth/login")
            .json(request)
            .send()
            .await
            .map_err(Error::from_transport)?;

        if !response.status().is_success() {
            let message = error_detail(response)
                .await
                .unwrap_or_else(|| DEFAULT_LOGIN_ERROR.to_string());
            return Err(Error::InvalidCredentials(message));
        }

        response.json().await.map_err(Error::from_transport)
    }
}

/// Requests that carry the session's bearer token
///
/// A 401 from any endpoint ends the session it was sent under before the
/// error is handed back to the caller.
#[derive(Clone)]
pub struct AuthorizedClient {
    api: ApiClient,
    session: SessionManager,
}

impl AuthorizedClient {
    pub fn new(api: ApiClient, session: SessionManager) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// GET a JSON resource
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        response.json().await.map_err(Error::from_transport)
    }

    /// POST a JSON body (or none) and decode the JSON reply
    pub async fn post_json<B, T>(&self, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, path, body).await?;
        response.json().await.map_err(Error::from_transport)
    }

    /// Profile of the logged-in user
    pub async fn profile(&self) -> Result<User> {
        self.get_json("/user/profile").await
    }

    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Response>
    where
        B: Serialize + ?Sized + Sync,
    {
        let tag = self.session.request_tag();
        let mut request = self.api.request(method.clone(), path);
        if let Some(token) = &tag.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!("{} {}", method, self.api.url(path));
        let response = request.send().await.map_err(Error::from_transport)?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            // Only ends the session this request was sent under
            self.session
                .on_authentication_rejected_for(tag.generation)
                .await;
            let message = error_detail(response)
                .await
                .unwrap_or_else(|| "Not authenticated".to_string());
            return Err(Error::AuthorizationExpired(message));
        }

        if !status.is_success() {
            let message = error_detail(response).await.unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

/// Pull the `detail` message out of an error body, if it has one
async fn error_detail(response: Response) -> Option<String> {
    let body = response.text().await.ok()?;
    detail_from_body(&body)
}

fn detail_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) if !detail.is_empty() => Some(detail.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_from_body() {
        assert_eq!(
            detail_from_body(r#"{"detail":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(detail_from_body(r#"{"detail":[{"loc":["body"]}]}"#), None);
        assert_eq!(detail_from_body("<html>502</html>"), None);
        assert_eq!(detail_from_body(r#"{"detail":""}"#), None);
    }

    #[test]
    fn test_url_joining() {
        let config = ApiConfig {
            base_url: "http://localhost:8000/api/".to_string(),
            timeout_secs: 10,
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(client.url("/auth/login"), "http://localhost:8000/api/auth/login");
        assert_eq!(client.url("farms"), "http://localhost:8000/api/farms");
    }
}
