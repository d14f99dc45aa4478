//! Virtual actor facade
//!
//! [`VirtualActor`] binds one authenticated identity to the platform's
//! domain operations: feed and timeline pages, content detail, comments,
//! reactions, mark-as-read, save, menu settings, the quiz lifecycle and
//! group membership. Every operation is a single call through the resilient
//! client; no retry policy lives at this layer.

pub mod actor;
pub mod types;

pub use actor::{ActorError, ActorResult, VirtualActor, PAGE_LIMIT};
pub use types::{
    Answer, Comment, Content, ContentSetting, ContentType, JoinedCommunity, MenuSettings,
    OwnerReaction, Page, PageMeta, Question, QuizDoing, QuizParticipation, QuizSummary, UserAnswer,
};
