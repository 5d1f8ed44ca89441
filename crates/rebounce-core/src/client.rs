//! Authenticated dashboard client.
//!
//! Wraps the managed service's HTTP control plane: bearer-token login, the
//! uniform `{status, message, data}` response envelope, and a transparent
//! single re-login when a cached token is rejected.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{CoreError, Result};
use rebounce_models::DashboardSettings;

/// Refresh the token well before the server-side expiry.
const TOKEN_REFRESH_AFTER_SECS: i64 = 23 * 60 * 60;
/// Hard cap on any single control-plane request.
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Bearer credential returned by the login endpoint.
///
/// Replaced wholesale on every login, never mutated in place.
#[derive(Debug, Clone)]
pub struct Credential {
    token: String,
    issued_at: DateTime<Utc>,
}

impl Credential {
    fn new(token: String) -> Self {
        Self {
            token,
            issued_at: Utc::now(),
        }
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        (now - self.issued_at).num_seconds() < TOKEN_REFRESH_AFTER_SECS
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Single-flight cache for the bearer credential.
///
/// The mutex is held across the login await: concurrent callers queue on it
/// and re-check freshness once inside, so an empty or expired slot produces
/// exactly one login no matter how many callers race for it.
#[derive(Default)]
pub struct TokenCache {
    slot: Mutex<Option<Credential>>,
}

impl TokenCache {
    pub async fn get_or_login<F, Fut>(&self, login: F) -> Result<Credential>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Credential>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(credential) = slot.as_ref()
            && credential.is_fresh(Utc::now())
        {
            return Ok(credential.clone());
        }

        // A failed login leaves the slot empty so the next caller retries.
        let fresh = login().await?;
        *slot = Some(fresh.clone());
        Ok(fresh)
    }

    /// Force the next `get_or_login` to log in regardless of token age.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}

/// Uniform wrapper every control-plane response uses, regardless of the
/// transport status code.
#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

impl Envelope {
    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn message(&self) -> String {
        self.message.clone().unwrap_or_default()
    }
}

pub struct DashboardClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    tokens: TokenCache,
}

impl DashboardClient {
    pub fn new(settings: &DashboardSettings) -> Result<Self> {
        Self::with_base_url(settings.base_url(), &settings.username, &settings.password)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CoreError::Transport {
                status: None,
                message: format!("failed to build http client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            username: username.to_string(),
            password: password.to_string(),
            tokens: TokenCache::default(),
        })
    }

    /// Base URL the client dials, host/port rules already applied.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange the configured credentials for a fresh bearer token.
    pub async fn login(&self) -> Result<Credential> {
        let url = format!("{}/api/auth/login", self.base_url);
        let payload = serde_json::json!({
            "username": self.username,
            "password": self.password,
        });

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CoreError::Authentication(format!("login endpoint unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::Authentication(format!(
                "login failed [{status}]: {body}"
            )));
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| CoreError::Authentication(format!("malformed login response: {e}")))?;
        if !envelope.is_ok() {
            return Err(CoreError::Authentication(envelope.message()));
        }

        let token = envelope
            .data
            .as_ref()
            .and_then(|data| data.get("token"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                CoreError::Authentication("login response carried no token".to_string())
            })?;

        info!("dashboard login succeeded");
        Ok(Credential::new(token.to_string()))
    }

    async fn bearer(&self) -> Result<Credential> {
        self.tokens.get_or_login(|| self.login()).await
    }

    /// Issue an authorized request and unwrap the response envelope.
    ///
    /// An unauthorized response invalidates the cached token and the call is
    /// retried once with a fresh login; a second rejection is surfaced as an
    /// authentication error rather than retried again.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let credential = self.bearer().await?;
        let mut response = self
            .send(method.clone(), path, body, credential.token())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            info!(path, "dashboard rejected the token, logging in again");
            self.tokens.invalidate().await;
            let fresh = self.bearer().await?;
            response = self.send(method, path, body, fresh.token()).await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(CoreError::Authentication(
                    "token rejected twice in a row".to_string(),
                ));
            }
        }

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CoreError::Transport {
                status: Some(status.as_u16()),
                message: format!("[{status}] {text}"),
            });
        }

        let envelope: Envelope = response.json().await.map_err(|e| CoreError::Transport {
            status: Some(status.as_u16()),
            message: format!("malformed envelope: {e}"),
        })?;
        if !envelope.is_ok() {
            return Err(CoreError::Business(envelope.message()));
        }

        debug!(path, "dashboard request ok");
        Ok(envelope.data.unwrap_or(Value::Null))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: &str,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(|e| CoreError::Transport {
            status: None,
            message: e.to_string(),
        })
    }

    /// Ask the dashboard to restart the managed core.
    pub async fn restart(&self) -> Result<()> {
        self.request(Method::POST, "/api/stat/restart-core", None)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ok_envelope(data: Value) -> Value {
        serde_json::json!({"status": "ok", "message": "", "data": data})
    }

    async fn mount_login(server: &MockServer, token: &str, expected_hits: u64) {
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(serde_json::json!({
                "username": "admin",
                "password": "secret",
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ok_envelope(serde_json::json!({"token": token}))),
            )
            .expect(expected_hits)
            .mount(server)
            .await;
    }

    fn test_client(server: &MockServer) -> DashboardClient {
        DashboardClient::with_base_url(server.uri(), "admin", "secret").unwrap()
    }

    #[test]
    fn test_credential_freshness_window() {
        let mut credential = Credential::new("tok".to_string());
        assert!(credential.is_fresh(Utc::now()));

        credential.issued_at = Utc::now() - ChronoDuration::hours(22);
        assert!(credential.is_fresh(Utc::now()));

        credential.issued_at = Utc::now() - ChronoDuration::hours(24);
        assert!(!credential.is_fresh(Utc::now()));
    }

    #[tokio::test]
    async fn test_token_cache_single_flight() {
        let cache = TokenCache::default();
        let logins = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.get_or_login(|| {
                let logins = logins.clone();
                async move {
                    logins.fetch_add(1, Ordering::SeqCst);
                    Ok(Credential::new("tok".to_string()))
                }
            }),
            cache.get_or_login(|| {
                let logins = logins.clone();
                async move {
                    logins.fetch_add(1, Ordering::SeqCst);
                    Ok(Credential::new("tok".to_string()))
                }
            }),
        );

        assert_eq!(a.unwrap().token(), "tok");
        assert_eq!(b.unwrap().token(), "tok");
        assert_eq!(logins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_token_cache_invalidate_forces_relogin() {
        let cache = TokenCache::default();
        let logins = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let logins = logins.clone();
            cache
                .get_or_login(|| async move {
                    logins.fetch_add(1, Ordering::SeqCst);
                    Ok(Credential::new("tok".to_string()))
                })
                .await
                .unwrap();
        }
        assert_eq!(logins.load(Ordering::SeqCst), 1);

        cache.invalidate().await;
        let counted = logins.clone();
        cache
            .get_or_login(|| async move {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok(Credential::new("tok2".to_string()))
            })
            .await
            .unwrap();
        assert_eq!(logins.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_token_cache_failed_login_stays_empty() {
        let cache = TokenCache::default();

        let failed = cache
            .get_or_login(|| async { Err(CoreError::Authentication("nope".to_string())) })
            .await;
        assert!(failed.is_err());

        // The next caller retries instead of observing a poisoned slot.
        let ok = cache
            .get_or_login(|| async { Ok(Credential::new("tok".to_string())) })
            .await;
        assert_eq!(ok.unwrap().token(), "tok");
    }

    #[tokio::test]
    async fn test_login_extracts_token() {
        let server = MockServer::start().await;
        mount_login(&server, "tok-1", 1).await;

        let client = test_client(&server);
        let credential = client.login().await.unwrap();
        assert_eq!(credential.token(), "tok-1");
    }

    #[tokio::test]
    async fn test_login_rejection_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "error",
                "message": "bad credentials",
                "data": null,
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.login().await.unwrap_err();
        match err {
            CoreError::Authentication(message) => assert_eq!(message, "bad credentials"),
            other => panic!("expected authentication error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_transport_failure_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.login().await.unwrap_err();
        assert!(matches!(err, CoreError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_requests_share_one_login() {
        let server = MockServer::start().await;
        mount_login(&server, "tok-1", 1).await;
        Mock::given(method("POST"))
            .and(path("/api/stat/restart-core"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(ok_envelope(serde_json::json!({}))),
            )
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let (a, b) = tokio::join!(client.restart(), client.restart());
        a.unwrap();
        b.unwrap();
    }

    #[tokio::test]
    async fn test_unauthorized_retried_once_with_fresh_token() {
        let server = MockServer::start().await;
        mount_login(&server, "tok-1", 2).await;

        // First attempt is rejected, the retry with the fresh login passes.
        Mock::given(method("POST"))
            .and(path("/api/stat/restart-core"))
            .respond_with(ResponseTemplate::new(401))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/stat/restart-core"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(ok_envelope(serde_json::json!({}))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        client.restart().await.unwrap();
    }

    #[tokio::test]
    async fn test_persistent_unauthorized_is_bounded() {
        let server = MockServer::start().await;
        mount_login(&server, "tok-1", 2).await;

        // Exactly two attempts reach the endpoint, never a third.
        Mock::given(method("POST"))
            .and(path("/api/stat/restart-core"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.restart().await.unwrap_err();
        assert!(matches!(err, CoreError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_business_error_carries_server_message() {
        let server = MockServer::start().await;
        mount_login(&server, "tok-1", 1).await;
        Mock::given(method("POST"))
            .and(path("/api/stat/restart-core"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "error",
                "message": "core is mid-upgrade",
                "data": null,
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.restart().await.unwrap_err();
        match err {
            CoreError::Business(message) => assert_eq!(message, "core is mid-upgrade"),
            other => panic!("expected business error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let server = MockServer::start().await;
        mount_login(&server, "tok-1", 1).await;
        Mock::given(method("POST"))
            .and(path("/api/stat/restart-core"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.restart().await.unwrap_err();
        match err {
            CoreError::Transport { status, message } => {
                assert_eq!(status, Some(500));
                assert!(message.contains("boom"));
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }
}
