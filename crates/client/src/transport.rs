use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use cerbero_auth::AccessDecision;

use crate::config::GuardConfig;
use crate::error::TransportError;

/// Remote call to the server-side route guard.
#[async_trait]
pub trait GuardTransport: Send + Sync {
    async fn check(&self, path: &str) -> Result<AccessDecision, TransportError>;
}

#[async_trait]
impl<T> GuardTransport for Arc<T>
where
    T: GuardTransport + ?Sized,
{
    async fn check(&self, path: &str) -> Result<AccessDecision, TransportError> {
        (**self).check(path).await
    }
}

/// `POST {base_url}/api/access/check` with an optional bearer token.
#[derive(Clone)]
pub struct HttpGuardTransport {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl core::fmt::Debug for HttpGuardTransport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HttpGuardTransport")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl HttpGuardTransport {
    pub fn new(config: &GuardConfig, token: Option<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/access/check", config.base_url.trim_end_matches('/')),
            token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GuardTransport for HttpGuardTransport {
    async fn check(&self, path: &str) -> Result<AccessDecision, TransportError> {
        let mut req = self.client.post(&self.endpoint).json(&json!({ "path": path }));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Api(status.as_u16(), body));
        }

        resp.json::<AccessDecision>()
            .await
            .map_err(|e| TransportError::Parse(e.to_string()))
    }
}
