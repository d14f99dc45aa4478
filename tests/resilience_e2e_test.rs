//! End-to-end auth and retry behavior over the real provider wire format

mod common;

use anyhow::Result;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stampede_actor::VirtualActor;
use stampede_config::AuthConfig;
use stampede_http::{HttpIdentityProvider, ResilientClient, RunState, SessionAuth};

fn fast_auth_config(provider_url: String) -> AuthConfig {
    let mut config = AuthConfig::default();
    config.provider_url = provider_url;
    config.acquire.delay = std::time::Duration::from_millis(1);
    config.refresh.interval = std::time::Duration::from_millis(1);
    config
}

async fn mount_password_exchange(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header(
            "x-amz-target",
            "AWSCognitoIdentityProviderService.InitiateAuth",
        ))
        .and(body_partial_json(serde_json::json!({
            "AuthFlow": "USER_PASSWORD_AUTH"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "AuthenticationResult": {
                "IdToken": "wire-id-token",
                "AccessToken": "wire-access",
                "RefreshToken": "wire-refresh",
                "ExpiresIn": 3600,
                "TokenType": "Bearer"
            }
        })))
        .mount(server)
        .await;
}

async fn actor_with_wire_auth(server: &MockServer, username: &str) -> (VirtualActor, Arc<RunState>) {
    let auth_config = fast_auth_config(server.uri());
    let provider = Arc::new(HttpIdentityProvider::new(auth_config.clone()).unwrap());
    let state = Arc::new(RunState::new());
    let auth = SessionAuth::establish(provider, &auth_config, state.clone(), username, "secret")
        .await
        .unwrap();
    let client = Arc::new(
        ResilientClient::new(&common::fast_http_config(), auth, state.clone()).unwrap(),
    );
    (
        VirtualActor::new(client, common::target_for(server)),
        state,
    )
}

#[tokio::test]
async fn test_credential_exchange_feeds_authorization_header() -> Result<()> {
    common::init_tracing();
    let server = MockServer::start().await;
    mount_password_exchange(&server).await;

    Mock::given(method("GET"))
        .and(path("/newsfeed"))
        .and(header("authorization", "wire-id-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let (actor, _state) = actor_with_wire_auth(&server, "wire-user").await;
    actor.get_newsfeed(None).await?;
    Ok(())
}

#[tokio::test]
async fn test_token_cache_skips_second_exchange() -> Result<()> {
    common::init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(serde_json::json!({
            "AuthFlow": "USER_PASSWORD_AUTH"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "AuthenticationResult": {
                "IdToken": "wire-id-token",
                "AccessToken": "wire-access",
                "RefreshToken": "wire-refresh",
                "ExpiresIn": 3600,
                "TokenType": "Bearer"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let auth_config = fast_auth_config(server.uri());
    let provider = Arc::new(HttpIdentityProvider::new(auth_config.clone()).unwrap());
    let state = Arc::new(RunState::new());

    let first = SessionAuth::establish(
        provider.clone(),
        &auth_config,
        state.clone(),
        "cached-user",
        "secret",
    )
    .await?;
    // Same identity again within the run: token comes from the cache
    let second =
        SessionAuth::establish(provider, &auth_config, state.clone(), "cached-user", "secret")
            .await?;

    assert_eq!(first.authorization(), second.authorization());
    assert_eq!(state.tokens.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_unauthorized_refreshes_over_the_wire() -> Result<()> {
    common::init_tracing();
    let server = MockServer::start().await;
    mount_password_exchange(&server).await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(serde_json::json!({
            "AuthFlow": "REFRESH_TOKEN_AUTH",
            "AuthParameters": {"REFRESH_TOKEN": "wire-refresh"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "AuthenticationResult": {
                "IdToken": "renewed-id-token",
                "AccessToken": "renewed-access"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Stale token is rejected once, then the renewed token is accepted
    Mock::given(method("GET"))
        .and(path("/newsfeed"))
        .and(header("authorization", "wire-id-token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/newsfeed"))
        .and(header("authorization", "renewed-id-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let (actor, state) = actor_with_wire_auth(&server, "refresh-user").await;
    actor.get_newsfeed(None).await?;

    // The renewed token also lands in the run-scoped cache
    assert_eq!(
        state.tokens.get("refresh-user").unwrap().id_token,
        "renewed-id-token"
    );
    Ok(())
}

#[tokio::test]
async fn test_server_errors_recover_within_retry_budget() -> Result<()> {
    common::init_tracing();
    let server = MockServer::start().await;
    mount_password_exchange(&server).await;

    Mock::given(method("GET"))
        .and(path("/newsfeed"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/newsfeed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::ok_body()))
        .mount(&server)
        .await;

    let (actor, state) = actor_with_wire_auth(&server, "retry-user").await;
    actor.get_newsfeed(None).await?;

    assert_eq!(state.counters.server_down(), 2);
    assert!(!state.heartbeat.is_active());
    Ok(())
}

#[tokio::test]
async fn test_business_conflict_is_absorbed_end_to_end() -> Result<()> {
    common::init_tracing();
    let server = MockServer::start().await;
    mount_password_exchange(&server).await;

    Mock::given(method("POST"))
        .and(path("/groups/g-1/join"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "code": "group.joining_request.already_sent",
            "message": "pending"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (actor, _state) = actor_with_wire_auth(&server, "join-user").await;
    actor.join_group("g-1").await?;
    Ok(())
}
