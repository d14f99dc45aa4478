//! Credential and token lifecycle
//!
//! Each virtual actor owns one [`SessionAuth`]: the mutable token set, the
//! current `authorization` header value, and an optional auto-refresh task
//! firing at half the token lifetime. Exchanges against the identity
//! provider go through the [`IdentityProvider`] trait so tests can script
//! them.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use stampede_config::domains::auth::{AcquireConfig, AuthConfig, RefreshConfig};

use crate::errors::{AuthError, ProviderError};
use crate::state::RunState;

/// Bearer credential set for one identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
    pub token_type: String,
}

/// Renewed id/access pair produced by a refresh exchange; the refresh token
/// itself is not rotated
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    pub id_token: String,
    pub access_token: String,
}

/// Identity provider exchanges (network calls with their own transient
/// failure profile, retried by the token lifecycle policies rather than the
/// resilient client)
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn exchange_credentials(
        &self,
        username: &str,
        secret: &str,
    ) -> Result<TokenSet, ProviderError>;

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken, ProviderError>;
}

/// Cognito-style identity provider speaking amz-json over HTTP
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    config: AuthConfig,
}

#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    #[serde(rename = "AuthenticationResult")]
    result: AuthenticationResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    id_token: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    token_type: Option<String>,
}

impl HttpIdentityProvider {
    pub fn new(config: AuthConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, config })
    }

    async fn initiate_auth(&self, body: serde_json::Value) -> Result<AuthenticationResult, ProviderError> {
        let response = self
            .http
            .post(&self.config.provider_url)
            .header("accept", "*/*")
            .header("content-type", "application/x-amz-json-1.1")
            .header("x-amz-target", "AWSCognitoIdentityProviderService.InitiateAuth")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
            });
        }

        let payload: ExchangeResponse = response.json().await?;
        Ok(payload.result)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn exchange_credentials(
        &self,
        username: &str,
        secret: &str,
    ) -> Result<TokenSet, ProviderError> {
        let result = self
            .initiate_auth(json!({
                "AuthParameters": {
                    "USERNAME": username,
                    "PASSWORD": secret,
                },
                "AuthFlow": "USER_PASSWORD_AUTH",
                "ClientId": self.config.client_id,
            }))
            .await?;

        let missing = |field: &str| ProviderError::Payload(format!("missing {}", field));
        Ok(TokenSet {
            id_token: result.id_token.ok_or_else(|| missing("IdToken"))?,
            access_token: result.access_token.ok_or_else(|| missing("AccessToken"))?,
            refresh_token: result.refresh_token.ok_or_else(|| missing("RefreshToken"))?,
            expires_in: result.expires_in.ok_or_else(|| missing("ExpiresIn"))?,
            token_type: result.token_type.unwrap_or_else(|| "Bearer".to_string()),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken, ProviderError> {
        let result = self
            .initiate_auth(json!({
                "AuthParameters": {
                    "REFRESH_TOKEN": refresh_token,
                },
                "AuthFlow": "REFRESH_TOKEN_AUTH",
                "ClientId": self.config.client_id,
            }))
            .await?;

        let missing = |field: &str| ProviderError::Payload(format!("missing {}", field));
        Ok(RefreshedToken {
            id_token: result.id_token.ok_or_else(|| missing("IdToken"))?,
            access_token: result.access_token.ok_or_else(|| missing("AccessToken"))?,
        })
    }
}

/// Exchange credentials for a token set, retrying on a fixed short delay
pub async fn acquire(
    provider: &dyn IdentityProvider,
    policy: &AcquireConfig,
    username: &str,
    secret: &str,
) -> Result<TokenSet, AuthError> {
    for attempt in 1..=policy.max_attempts {
        match provider.exchange_credentials(username, secret).await {
            Ok(token) => {
                debug!(username, attempt, "credential exchange succeeded");
                return Ok(token);
            }
            Err(e) => {
                warn!(username, attempt, error = %e, "credential exchange failed");
                if attempt < policy.max_attempts {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    Err(AuthError::Acquire {
        username: username.to_string(),
        attempts: policy.max_attempts,
    })
}

/// Per-actor authentication state: token, current authorization header
/// value, and the auto-refresh schedule
pub struct SessionAuth {
    username: String,
    provider: Arc<dyn IdentityProvider>,
    refresh_policy: RefreshConfig,
    state: Arc<RunState>,
    token: RwLock<TokenSet>,
    authorization: RwLock<String>,
    // Coalesces concurrent 401-driven refreshes; refreshing twice is safe
    // but wasteful
    refresh_gate: tokio::sync::Mutex<()>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionAuth {
    /// Establish authentication for one identity, reusing a cached token
    /// when the identity has authenticated before in this run
    pub async fn establish(
        provider: Arc<dyn IdentityProvider>,
        config: &AuthConfig,
        state: Arc<RunState>,
        username: impl Into<String>,
        secret: &str,
    ) -> Result<Arc<Self>, AuthError> {
        let username = username.into();
        let token = match state.tokens.get(&username) {
            Some(token) => token,
            None => {
                let token = acquire(provider.as_ref(), &config.acquire, &username, secret).await?;
                state.tokens.set(username.clone(), token.clone());
                token
            }
        };

        let authorization = token.id_token.clone();
        Ok(Arc::new(Self {
            username,
            provider,
            refresh_policy: config.refresh.clone(),
            state,
            token: RwLock::new(token),
            authorization: RwLock::new(authorization),
            refresh_gate: tokio::sync::Mutex::new(()),
            refresh_task: Mutex::new(None),
        }))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Current `authorization` header value
    pub fn authorization(&self) -> String {
        self.authorization.read().clone()
    }

    /// Snapshot of the current token set
    pub fn token(&self) -> TokenSet {
        self.token.read().clone()
    }

    /// Exchange the refresh token for a new id/access pair, retrying with
    /// linearly growing backoff. On success the token fields and the
    /// authorization value are swapped atomically; exhaustion is fatal.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let _gate = self.refresh_gate.lock().await;

        let refresh_token = self.token.read().refresh_token.clone();
        for attempt in 1..=self.refresh_policy.max_attempts {
            match self.provider.refresh(&refresh_token).await {
                Ok(renewed) => {
                    self.install(renewed);
                    debug!(username = %self.username, attempt, "token refreshed");
                    return Ok(());
                }
                Err(e) => {
                    warn!(username = %self.username, attempt, error = %e, "token refresh failed");
                    if attempt < self.refresh_policy.max_attempts {
                        tokio::time::sleep(self.refresh_policy.interval * attempt).await;
                    }
                }
            }
        }

        Err(AuthError::Refresh {
            username: self.username.clone(),
            attempts: self.refresh_policy.max_attempts,
        })
    }

    fn install(&self, renewed: RefreshedToken) {
        let updated = {
            let mut token = self.token.write();
            token.id_token = renewed.id_token;
            token.access_token = renewed.access_token;
            token.clone()
        };
        *self.authorization.write() = updated.id_token.clone();
        self.state.tokens.set(self.username.clone(), updated);
    }

    /// Schedule a recurring refresh firing at half the token lifetime. The
    /// schedule reschedules itself after each success and stops for good on
    /// a fatal refresh failure.
    pub fn spawn_auto_refresh(self: &Arc<Self>) {
        let mut guard = self.refresh_task.lock();
        if guard.is_some() {
            return;
        }

        let auth = Arc::clone(self);
        let period =
            (Duration::from_secs(auth.token.read().expires_in) / 2).max(Duration::from_secs(1));
        *guard = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                if let Err(e) = auth.refresh().await {
                    error!(username = %auth.username, error = %e, "stopping auto-refresh schedule");
                    break;
                }
            }
        }));
    }

    /// Cancel the auto-refresh schedule; callable at session teardown and
    /// idempotent
    pub fn cancel_auto_refresh(&self) {
        if let Some(handle) = self.refresh_task.lock().take() {
            handle.abort();
        }
    }

    /// Whether an auto-refresh schedule is still running
    pub fn auto_refresh_active(&self) -> bool {
        self.refresh_task
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for SessionAuth {
    fn drop(&mut self) {
        if let Some(handle) = self.refresh_task.get_mut().take() {
            handle.abort();
        }
    }
}
