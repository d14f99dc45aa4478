//! Resilient request execution
//!
//! [`ResilientClient::execute`] runs a request thunk through failure
//! classification, linear backoff, 401-driven token refresh and the
//! exhaustive-retry fallback for transport failures. All retry decisions
//! are local to this layer; only exhaustion or an unclassified error
//! crosses into the scenario engines.

use rand::Rng;
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde_json::Value as JsonValue;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, warn};

use stampede_config::domains::http::{HttpConfig, RetryConfig};

use crate::auth::SessionAuth;
use crate::errors::{classify_request_error, classify_response, ClientError, ClientResult, Failure};
use crate::response::ApiErrorBody;
use crate::state::RunState;

/// Auth-aware HTTP execution shared by every operation of one virtual actor
pub struct ResilientClient {
    http: reqwest::Client,
    auth: Arc<SessionAuth>,
    retry: RetryConfig,
    state: Arc<RunState>,
}

impl ResilientClient {
    pub fn new(
        config: &HttpConfig,
        auth: Arc<SessionAuth>,
        state: Arc<RunState>,
    ) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(ClientError::Transport)?;

        Ok(Self {
            http,
            auth,
            retry: config.retry.clone(),
            state,
        })
    }

    pub fn auth(&self) -> &Arc<SessionAuth> {
        &self.auth
    }

    pub fn state(&self) -> &Arc<RunState> {
        &self.state
    }

    /// Request builder carrying the actor's current authorization value.
    /// Built per attempt, so a refresh between attempts is picked up.
    pub fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header(AUTHORIZATION, self.auth.authorization())
    }

    /// Execute one logical request. Returns the response envelope, or
    /// `None` when an allow-listed business conflict was absorbed.
    pub async fn execute<F, Fut>(&self, thunk: F) -> ClientResult<Option<JsonValue>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = reqwest::Result<reqwest::Response>>,
    {
        let mut retry_count: u32 = 0;

        loop {
            let failure = match self.attempt(&thunk).await {
                Ok(envelope) => {
                    self.state.heartbeat.clear();
                    return Ok(envelope);
                }
                Err(failure) => failure,
            };

            match failure {
                Failure::KnownApplication { code } => {
                    debug!(code, "absorbed known application error");
                    self.state.heartbeat.clear();
                    return Ok(None);
                }
                Failure::UnknownApplication { code, body } => {
                    error!(code, body, "unknown application error");
                    return Err(ClientError::UnknownApplication { code, body });
                }
                Failure::Unclassified(e) => return Err(ClientError::Unclassified(e)),
                retryable => {
                    if retry_count >= self.retry.max_attempts {
                        match retryable {
                            Failure::Transport(e) => {
                                // Wait out an extended outage instead of
                                // failing the actor: randomized pause, then
                                // start the ladder over.
                                warn!(error = %e, "retry budget spent; entering exhaustive retry");
                                let pause = self
                                    .retry
                                    .exhaustive_sleep_cap
                                    .mul_f64(rand::thread_rng().gen::<f64>());
                                tokio::time::sleep(pause).await;
                                retry_count = 0;
                                continue;
                            }
                            Failure::Server { status } => {
                                return Err(ClientError::Server {
                                    status,
                                    attempts: retry_count,
                                })
                            }
                            Failure::Unauthorized => {
                                return Err(ClientError::Server {
                                    status: 401,
                                    attempts: retry_count,
                                })
                            }
                            Failure::Forbidden => {
                                return Err(ClientError::Server {
                                    status: 403,
                                    attempts: retry_count,
                                })
                            }
                            _ => unreachable!("non-retryable failures handled above"),
                        }
                    }

                    retry_count += 1;
                    warn!(
                        username = %self.auth.username(),
                        retry_count,
                        failure = ?retryable,
                        "request failed, backing off"
                    );
                    self.state.heartbeat.start(self.retry.heartbeat_interval);
                    tokio::time::sleep(self.retry.interval * retry_count).await;

                    if matches!(retryable, Failure::Unauthorized) {
                        self.auth.refresh().await?;
                    }
                }
            }
        }
    }

    /// One attempt: send, classify
    async fn attempt<F, Fut>(&self, thunk: &F) -> Result<Option<JsonValue>, Failure>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = reqwest::Result<reqwest::Response>>,
    {
        let response = match thunk().await {
            Ok(response) => response,
            Err(e) => {
                if e.is_timeout() {
                    self.state.counters.record_request_timeout();
                } else if e.is_connect() {
                    self.state.counters.record_server_down();
                }
                return Err(classify_request_error(e));
            }
        };

        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            let envelope = response
                .json::<JsonValue>()
                .await
                .map_err(Failure::Unclassified)?;
            return Ok(Some(envelope));
        }

        if status >= 500 {
            self.state.counters.record_server_down();
        }
        if status == 401 {
            return Err(Failure::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed = ApiErrorBody::parse(&body);
        Err(classify_response(status, parsed.code.as_deref(), &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{IdentityProvider, RefreshedToken, TokenSet};
    use crate::errors::ProviderError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct RenewingProvider {
        refresh_calls: AtomicU32,
    }

    #[async_trait]
    impl IdentityProvider for RenewingProvider {
        async fn exchange_credentials(
            &self,
            _username: &str,
            _secret: &str,
        ) -> Result<TokenSet, ProviderError> {
            Ok(TokenSet {
                id_token: "fresh".to_string(),
                access_token: "fresh-access".to_string(),
                refresh_token: "refresh".to_string(),
                expires_in: 3600,
                token_type: "Bearer".to_string(),
            })
        }

        async fn refresh(&self, _refresh_token: &str) -> Result<RefreshedToken, ProviderError> {
            let call = self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            Ok(RefreshedToken {
                id_token: format!("renewed-{}", call),
                access_token: "renewed-access".to_string(),
            })
        }
    }

    async fn test_client(
        max_attempts: u32,
        timeout: Duration,
    ) -> (ResilientClient, Arc<RunState>, Arc<RenewingProvider>) {
        let provider = Arc::new(RenewingProvider {
            refresh_calls: AtomicU32::new(0),
        });
        let state = Arc::new(RunState::new());

        let mut auth_config = stampede_config::AuthConfig::default();
        auth_config.acquire.delay = Duration::from_millis(1);
        auth_config.refresh.interval = Duration::from_millis(1);

        let auth = SessionAuth::establish(
            provider.clone(),
            &auth_config,
            state.clone(),
            "tester",
            "secret",
        )
        .await
        .unwrap();

        let mut http_config = stampede_config::HttpConfig::default();
        http_config.timeout = timeout;
        http_config.retry.interval = Duration::from_millis(1);
        http_config.retry.max_attempts = max_attempts;
        http_config.retry.exhaustive_sleep_cap = Duration::from_millis(5);

        let client = ResilientClient::new(&http_config, auth, state.clone()).unwrap();
        (client, state, provider)
    }

    fn ok_body() -> serde_json::Value {
        json!({"code": "api.ok", "data": {"value": 42}})
    }

    #[tokio::test]
    async fn test_success_passthrough() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .mount(&server)
            .await;

        let (client, state, _) = test_client(10, Duration::from_secs(5)).await;
        let url = format!("{}/ping", server.uri());
        let envelope = client
            .execute(|| {
                let rb = client.request(Method::GET, &url);
                async move { rb.send().await }
            })
            .await
            .unwrap();

        assert_eq!(envelope.unwrap()["data"]["value"], 42);
        assert!(!state.heartbeat.is_active());
    }

    #[tokio::test]
    async fn test_server_errors_retried_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(3)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .mount(&server)
            .await;

        let (client, state, _) = test_client(10, Duration::from_secs(5)).await;
        let url = format!("{}/flaky", server.uri());
        let envelope = client
            .execute(|| {
                let rb = client.request(Method::GET, &url);
                async move { rb.send().await }
            })
            .await
            .unwrap();

        assert!(envelope.is_some());
        assert_eq!(server.received_requests().await.unwrap().len(), 4);
        assert_eq!(state.counters.server_down(), 3);
        assert!(!state.heartbeat.is_active());
    }

    #[tokio::test]
    async fn test_server_error_exhaustion_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (client, _, _) = test_client(2, Duration::from_secs(5)).await;
        let url = format!("{}/down", server.uri());
        let err = client
            .execute(|| {
                let rb = client.request(Method::GET, &url);
                async move { rb.send().await }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Server { status: 500, attempts: 2 }));
        // Initial attempt plus two retries
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unauthorized_triggers_single_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/secure"))
            .and(header("authorization", "fresh"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/secure"))
            .and(header("authorization", "renewed-0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .mount(&server)
            .await;

        let (client, _, provider) = test_client(10, Duration::from_secs(5)).await;
        let url = format!("{}/secure", server.uri());
        let envelope = client
            .execute(|| {
                let rb = client.request(Method::GET, &url);
                async move { rb.send().await }
            })
            .await
            .unwrap();

        assert!(envelope.is_some());
        assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_known_application_code_absorbed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/join"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"code": "group.already_member", "message": "conflict"})),
            )
            .mount(&server)
            .await;

        let (client, _, _) = test_client(10, Duration::from_secs(5)).await;
        let url = format!("{}/join", server.uri());
        let envelope = client
            .execute(|| {
                let rb = client.request(Method::POST, &url);
                async move { rb.send().await }
            })
            .await
            .unwrap();

        assert!(envelope.is_none());
        // No retries for an absorbed conflict
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_application_code_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/odd"))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({"code": "content.gone"})),
            )
            .mount(&server)
            .await;

        let (client, _, _) = test_client(10, Duration::from_secs(5)).await;
        let url = format!("{}/odd", server.uri());
        let err = client
            .execute(|| {
                let rb = client.request(Method::GET, &url);
                async move { rb.send().await }
            })
            .await
            .unwrap_err();

        match err {
            ClientError::UnknownApplication { code, .. } => assert_eq!(code, "content.gone"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_classified_as_transport_and_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .mount(&server)
            .await;

        let (client, state, _) = test_client(10, Duration::from_millis(50)).await;
        let url = format!("{}/slow", server.uri());
        let envelope = client
            .execute(|| {
                let rb = client.request(Method::GET, &url);
                async move { rb.send().await }
            })
            .await
            .unwrap();

        assert!(envelope.is_some());
        assert_eq!(state.counters.request_timeout(), 1);
    }
}
