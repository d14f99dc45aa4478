//! Shared harness for the end-to-end scenario tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use stampede_actor::VirtualActor;
use stampede_config::domains::scenario::{CountRange, SecondsRange};
use stampede_config::domains::target::ServiceEndpoint;
use stampede_config::{AuthConfig, HttpConfig, TargetConfig};
use stampede_http::{
    IdentityProvider, ProviderError, RefreshedToken, ResilientClient, RunState, SessionAuth,
    TokenSet,
};
use wiremock::MockServer;

/// Initialize test logging once; repeated calls are no-ops
pub fn init_tracing() {
    let logging = stampede_config::LoggingConfig {
        level: stampede_config::domains::logging::LogLevel::Debug,
        ..Default::default()
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(format!("stampede={}", logging.level.as_filter_str()))
        .with_test_writer()
        .try_init();
}

/// Identity provider stub that always hands out the same token set
pub struct StaticProvider;

#[async_trait]
impl IdentityProvider for StaticProvider {
    async fn exchange_credentials(
        &self,
        _username: &str,
        _secret: &str,
    ) -> Result<TokenSet, ProviderError> {
        Ok(TokenSet {
            id_token: "id-token".to_string(),
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_in: 3600,
            token_type: "Bearer".to_string(),
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<RefreshedToken, ProviderError> {
        Ok(RefreshedToken {
            id_token: "renewed".to_string(),
            access_token: "renewed-access".to_string(),
        })
    }
}

/// Retry policy compressed to milliseconds so failures resolve quickly
pub fn fast_http_config() -> HttpConfig {
    let mut config = HttpConfig::default();
    config.timeout = Duration::from_secs(5);
    config.retry.interval = Duration::from_millis(1);
    config.retry.exhaustive_sleep_cap = Duration::from_millis(5);
    config
}

pub fn target_for(server: &MockServer) -> TargetConfig {
    let endpoint = |version: &str| ServiceEndpoint {
        host: server.uri(),
        latest_version: version.to_string(),
    };
    TargetConfig {
        version_header: "x-version-id".to_string(),
        content: endpoint("1.16.0"),
        group: endpoint("2.0.0"),
        user: endpoint("2.2.0"),
    }
}

/// Actor wired to the mock platform through the scripted identity provider
pub async fn actor_against(server: &MockServer, username: &str) -> (VirtualActor, Arc<RunState>) {
    let state = Arc::new(RunState::new());
    let auth = SessionAuth::establish(
        Arc::new(StaticProvider),
        &AuthConfig::default(),
        state.clone(),
        username,
        "secret",
    )
    .await
    .expect("credential exchange against the stub provider cannot fail");

    let client = Arc::new(
        ResilientClient::new(&fast_http_config(), auth, state.clone())
            .expect("client construction"),
    );
    (VirtualActor::new(client, target_for(server)), state)
}

/// Newsfeed settings with all think time stripped
pub fn instant_newsfeed_config() -> stampede_config::domains::scenario::NewsfeedConfig {
    stampede_config::domains::scenario::NewsfeedConfig {
        scroll_delay: SecondsRange::ZERO,
        important_read_delay: Duration::ZERO,
        reaction_pick_delay: SecondsRange::ZERO,
        reading_delay: SecondsRange::ZERO,
        comment_scroll_delay: SecondsRange::ZERO,
        typing_delay: SecondsRange::ZERO,
        comment_pages: CountRange::new(1, 1),
        comment_length: CountRange::new(10, 10),
        ..Default::default()
    }
}

/// Quiz settings with all think time stripped and a single attempt
pub fn instant_quiz_config() -> stampede_config::domains::scenario::QuizConfig {
    stampede_config::domains::scenario::QuizConfig {
        attempts: CountRange::new(1, 1),
        answer_delay: SecondsRange::ZERO,
        rest_delay: Duration::ZERO,
        safety_margin: Duration::from_secs(5),
    }
}

/// Success envelope with a null payload
pub fn ok_body() -> serde_json::Value {
    serde_json::json!({"code": "api.ok", "data": null})
}
