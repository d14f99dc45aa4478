//! Read-only views of platform API payloads
//!
//! The platform mixes snake_case and camelCase field names across its
//! responses; the renames here must match the wire byte-for-byte. All types
//! are consumed read-only to drive scenario decisions, never mutated and
//! never written back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content kind, routing detail fetches to distinct collection endpoints.
/// Kinds this client does not know map to [`ContentType::Unknown`] instead
/// of failing deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ContentType {
    #[serde(rename = "POST")]
    Post,
    #[serde(rename = "ARTICLE")]
    Article,
    #[serde(rename = "SERIES")]
    Series,
    #[serde(other)]
    Unknown,
}

impl ContentType {
    /// Wire value sent as the reaction target type
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Post => "POST",
            ContentType::Article => "ARTICLE",
            ContentType::Series => "SERIES",
            ContentType::Unknown => "UNKNOWN",
        }
    }

    /// Collection path segment for detail fetches; `None` for unknown kinds
    pub fn detail_segment(&self) -> Option<&'static str> {
        match self {
            ContentType::Post => Some("posts"),
            ContentType::Article => Some("articles"),
            ContentType::Series => Some("series"),
            ContentType::Unknown => None,
        }
    }
}

/// One reaction already placed by the acting identity
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerReaction {
    pub reaction_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentSetting {
    #[serde(default)]
    pub is_important: bool,
}

/// Quiz attached to a content item
#[derive(Debug, Clone, Deserialize)]
pub struct QuizSummary {
    pub id: String,
}

/// In-progress quiz participation attached to a content item
#[derive(Debug, Clone, Deserialize)]
pub struct QuizDoing {
    #[serde(rename = "quizParticipantId")]
    pub quiz_participant_id: String,
}

/// Feed or timeline content item
#[derive(Debug, Clone, Deserialize)]
pub struct Content {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: ContentType,

    #[serde(default)]
    pub owner_reactions: Vec<OwnerReaction>,

    #[serde(default)]
    pub setting: ContentSetting,

    #[serde(rename = "markedReadPost", default)]
    pub marked_read_post: bool,

    #[serde(default)]
    pub quiz: Option<QuizSummary>,

    #[serde(rename = "quizDoing", default)]
    pub quiz_doing: Option<QuizDoing>,
}

impl Content {
    pub fn owner_reaction_names(&self) -> Vec<&str> {
        self.owner_reactions
            .iter()
            .map(|reaction| reaction.reaction_name.as_str())
            .collect()
    }
}

/// Pagination metadata; the cursor is opaque and only ever fed back into
/// the next page request
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub has_next_page: bool,

    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// One page of a cursor-paginated list
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
    pub meta: PageMeta,
}

/// Comment item, carrying just enough to drive reaction/reply decisions
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: String,

    #[serde(default)]
    pub owner_reactions: Vec<OwnerReaction>,
}

impl Comment {
    pub fn owner_reaction_names(&self) -> Vec<&str> {
        self.owner_reactions
            .iter()
            .map(|reaction| reaction.reaction_name.as_str())
            .collect()
    }
}

/// Per-content menu state; only the saved flag matters here
#[derive(Debug, Clone, Deserialize)]
pub struct MenuSettings {
    #[serde(default)]
    pub is_save: bool,
}

/// Community membership entry from the group service
#[derive(Debug, Clone, Deserialize)]
pub struct JoinedCommunity {
    pub id: String,
    pub group_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Answer {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    pub id: String,

    #[serde(default)]
    pub answers: Vec<Answer>,
}

/// Server-side state of one quiz participation
#[derive(Debug, Clone, Deserialize)]
pub struct QuizParticipation {
    #[serde(default)]
    pub questions: Vec<Question>,

    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,

    /// Time budget in seconds
    #[serde(rename = "timeLimit")]
    pub time_limit: u64,
}

/// One submitted answer; submissions always carry the full cumulative list
#[derive(Debug, Clone, Serialize)]
pub struct UserAnswer {
    #[serde(rename = "questionId")]
    pub question_id: String,

    #[serde(rename = "answerId")]
    pub answer_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_mixed_casing() {
        let content: Content = serde_json::from_value(json!({
            "id": "c-1",
            "type": "ARTICLE",
            "owner_reactions": [{"reaction_name": "react_fire"}],
            "setting": {"is_important": true},
            "markedReadPost": true,
            "quiz": {"id": "q-1"},
            "quizDoing": {"quizParticipantId": "p-1"}
        }))
        .unwrap();

        assert_eq!(content.kind, ContentType::Article);
        assert_eq!(content.owner_reaction_names(), vec!["react_fire"]);
        assert!(content.setting.is_important);
        assert!(content.marked_read_post);
        assert_eq!(content.quiz.unwrap().id, "q-1");
        assert_eq!(content.quiz_doing.unwrap().quiz_participant_id, "p-1");
    }

    #[test]
    fn test_content_minimal_payload() {
        let content: Content = serde_json::from_value(json!({
            "id": "c-2",
            "type": "POST"
        }))
        .unwrap();

        assert_eq!(content.kind, ContentType::Post);
        assert!(content.owner_reactions.is_empty());
        assert!(!content.setting.is_important);
        assert!(!content.marked_read_post);
        assert!(content.quiz.is_none());
    }

    #[test]
    fn test_unknown_content_type_tolerated() {
        let content: Content = serde_json::from_value(json!({
            "id": "c-3",
            "type": "LIVESTREAM"
        }))
        .unwrap();
        assert_eq!(content.kind, ContentType::Unknown);
        assert!(content.kind.detail_segment().is_none());
    }

    #[test]
    fn test_quiz_participation_casing() {
        let quiz: QuizParticipation = serde_json::from_value(json!({
            "questions": [
                {"id": "q-1", "answers": [{"id": "a-1"}, {"id": "a-2"}]}
            ],
            "startedAt": "2024-06-01T10:00:00Z",
            "timeLimit": 300
        }))
        .unwrap();

        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].answers.len(), 2);
        assert_eq!(quiz.time_limit, 300);
    }

    #[test]
    fn test_user_answer_serializes_camel_case() {
        let answer = UserAnswer {
            question_id: "q-1".to_string(),
            answer_id: "a-1".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&answer).unwrap(),
            json!({"questionId": "q-1", "answerId": "a-1"})
        );
    }

    #[test]
    fn test_page_meta_defaults() {
        let page: Page<Content> = serde_json::from_value(json!({
            "list": [],
            "meta": {}
        }))
        .unwrap();
        assert!(!page.meta.has_next_page);
        assert!(page.meta.end_cursor.is_none());
    }
}
