//! Domain operations of one authenticated identity
//!
//! Paths, query strings and version headers are an external contract with
//! the target platform and must match it byte-for-byte. Every operation is
//! one logical request through [`ResilientClient`]; unknown content kinds
//! yield `None` rather than an error.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use stampede_config::TargetConfig;
use stampede_http::{data_of, ClientError, ResilientClient};

use crate::types::{
    Comment, Content, ContentType, JoinedCommunity, MenuSettings, Page, QuizParticipation,
    UserAnswer,
};

/// Items requested per feed/comment page; also the stride used by the
/// newsfeed save cadence
pub const PAGE_LIMIT: u64 = 20;

/// Page size of the joined-communities listing (effectively unpaginated)
const COMMUNITY_LIMIT: u64 = 500;

pub type ActorResult<T> = Result<T, ActorError>;

#[derive(Debug, Error)]
pub enum ActorError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("malformed {operation} payload: {source}")]
    Payload {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

fn decode<T: DeserializeOwned>(operation: &'static str, data: JsonValue) -> ActorResult<T> {
    serde_json::from_value(data).map_err(|source| ActorError::Payload { operation, source })
}

/// One simulated identity bound to the platform's domain operations
pub struct VirtualActor {
    client: Arc<ResilientClient>,
    target: TargetConfig,
}

impl VirtualActor {
    pub fn new(client: Arc<ResilientClient>, target: TargetConfig) -> Self {
        Self { client, target }
    }

    pub fn username(&self) -> &str {
        self.client.auth().username()
    }

    pub fn client(&self) -> &Arc<ResilientClient> {
        &self.client
    }

    /// One request through the resilient client; returns the decoded `data`
    /// payload, or `None` when the envelope carries none (including
    /// absorbed business conflicts).
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        version: Option<&str>,
        body: Option<JsonValue>,
        operation: &'static str,
    ) -> ActorResult<Option<T>> {
        debug!(username = %self.username(), operation, "api call");
        let envelope = self
            .client
            .execute(|| {
                let mut builder = self.client.request(method.clone(), &url);
                if let Some(version) = version {
                    builder = builder.header(self.target.version_header.as_str(), version);
                }
                if let Some(body) = &body {
                    builder = builder.json(body);
                }
                async move { builder.send().await }
            })
            .await?;

        match envelope.and_then(data_of) {
            Some(data) => Ok(Some(decode(operation, data)?)),
            None => Ok(None),
        }
    }

    fn content_version(&self) -> Option<&str> {
        Some(self.target.content.latest_version.as_str())
    }

    fn group_version(&self) -> Option<&str> {
        Some(self.target.group.latest_version.as_str())
    }

    // --- feed and timeline ---

    pub async fn get_newsfeed(&self, after: Option<&str>) -> ActorResult<Option<Page<Content>>> {
        let mut url = format!("{}/newsfeed?limit={}", self.target.content.host, PAGE_LIMIT);
        if let Some(after) = after {
            url.push_str(&format!("&after={}", after));
        }
        self.call(Method::GET, url, self.content_version(), None, "newsfeed")
            .await
    }

    pub async fn get_timeline(
        &self,
        group_id: &str,
        after: Option<&str>,
    ) -> ActorResult<Option<Page<Content>>> {
        let mut url = format!(
            "{}/timeline/{}?limit={}",
            self.target.content.host, group_id, PAGE_LIMIT
        );
        if let Some(after) = after {
            url.push_str(&format!("&after={}", after));
        }
        self.call(Method::GET, url, self.content_version(), None, "timeline")
            .await
    }

    /// Content detail, routed by kind; unknown kinds are not an error
    pub async fn get_content_details(
        &self,
        content_id: &str,
        kind: ContentType,
    ) -> ActorResult<Option<Content>> {
        let segment = match kind.detail_segment() {
            Some(segment) => segment,
            None => return Ok(None),
        };
        let url = format!("{}/{}/{}", self.target.content.host, segment, content_id);
        self.call(Method::GET, url, self.content_version(), None, "content detail")
            .await
    }

    pub async fn get_menu_settings(&self, content_id: &str) -> ActorResult<Option<MenuSettings>> {
        let url = format!(
            "{}/contents/{}/menu-settings",
            self.target.content.host, content_id
        );
        self.call(Method::GET, url, self.content_version(), None, "menu settings")
            .await
    }

    // --- comments ---

    pub async fn get_comments(
        &self,
        content_id: &str,
        after: Option<&str>,
    ) -> ActorResult<Option<Page<Comment>>> {
        let mut url = format!(
            "{}/comments?post_id={}&limit={}",
            self.target.content.host, content_id, PAGE_LIMIT
        );
        if let Some(after) = after {
            url.push_str(&format!("&after={}", after));
        }
        self.call(Method::GET, url, self.content_version(), None, "comments")
            .await
    }

    pub async fn comment(&self, content_id: &str, text: &str) -> ActorResult<()> {
        let url = format!("{}/comments", self.target.content.host);
        let body = json!({ "content": text, "post_id": content_id });
        self.call::<JsonValue>(Method::POST, url, self.content_version(), Some(body), "comment")
            .await?;
        Ok(())
    }

    pub async fn reply_comment(
        &self,
        content_id: &str,
        comment_id: &str,
        text: &str,
    ) -> ActorResult<()> {
        let url = format!("{}/comments/{}/reply", self.target.content.host, comment_id);
        let body = json!({ "content": text, "post_id": content_id });
        self.call::<JsonValue>(Method::POST, url, self.content_version(), Some(body), "reply")
            .await?;
        Ok(())
    }

    // --- reactions and content actions ---

    pub async fn react(
        &self,
        target_id: &str,
        target_type: &str,
        reaction_name: &str,
    ) -> ActorResult<()> {
        let url = format!("{}/reactions", self.target.content.host);
        let body = json!({
            "target_id": target_id,
            "target": target_type,
            "reaction_name": reaction_name,
        });
        self.call::<JsonValue>(Method::POST, url, self.content_version(), Some(body), "reaction")
            .await?;
        Ok(())
    }

    pub async fn mark_as_read(&self, content_id: &str) -> ActorResult<()> {
        let url = format!(
            "{}/contents/{}/mark-as-read",
            self.target.content.host, content_id
        );
        self.call::<JsonValue>(Method::PUT, url, self.content_version(), None, "mark as read")
            .await?;
        Ok(())
    }

    pub async fn save_content(&self, content_id: &str) -> ActorResult<()> {
        let url = format!("{}/contents/{}/save", self.target.content.host, content_id);
        self.call::<JsonValue>(Method::POST, url, self.content_version(), None, "save content")
            .await?;
        Ok(())
    }

    // --- quiz lifecycle ---

    /// Start a participation; the payload is the server-assigned
    /// participant id
    pub async fn start_quiz(&self, quiz_id: &str) -> ActorResult<Option<String>> {
        let url = format!(
            "{}/quiz-participant/{}/start",
            self.target.content.host, quiz_id
        );
        self.call(Method::POST, url, self.content_version(), None, "start quiz")
            .await
    }

    pub async fn get_quiz_result(
        &self,
        participant_id: &str,
    ) -> ActorResult<Option<QuizParticipation>> {
        let url = format!(
            "{}/quiz-participant/{}",
            self.target.content.host, participant_id
        );
        self.call(Method::GET, url, self.content_version(), None, "quiz result")
            .await
    }

    /// Submit the full cumulative answer list (full-replace semantics)
    pub async fn answer_quiz(
        &self,
        participant_id: &str,
        answers: &[UserAnswer],
    ) -> ActorResult<()> {
        let url = format!(
            "{}/quiz-participant/{}/answers",
            self.target.content.host, participant_id
        );
        let body = json!({ "answers": answers });
        self.call::<JsonValue>(Method::PUT, url, self.content_version(), Some(body), "answer quiz")
            .await?;
        Ok(())
    }

    /// Submit the final answer list flagged as finished
    pub async fn finish_quiz(
        &self,
        participant_id: &str,
        answers: &[UserAnswer],
    ) -> ActorResult<()> {
        let url = format!(
            "{}/quiz-participant/{}/answers",
            self.target.content.host, participant_id
        );
        let body = json!({ "answers": answers, "isFinished": true });
        self.call::<JsonValue>(Method::PUT, url, self.content_version(), Some(body), "finish quiz")
            .await?;
        Ok(())
    }

    // --- group membership ---

    pub async fn join_group(&self, group_id: &str) -> ActorResult<()> {
        let url = format!("{}/groups/{}/join", self.target.group.host, group_id);
        self.call::<JsonValue>(Method::POST, url, self.group_version(), None, "join group")
            .await?;
        Ok(())
    }

    pub async fn get_joined_communities(&self) -> ActorResult<Option<Vec<JoinedCommunity>>> {
        let url = format!(
            "{}/me/communities?limit={}",
            self.target.group.host, COMMUNITY_LIMIT
        );
        self.call(Method::GET, url, None, None, "joined communities")
            .await
    }
}
