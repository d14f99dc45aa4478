//! Scenario sampling ratios, ranges and timing windows
//!
//! Defaults reproduce the load profile the statistics were calibrated
//! against; tests override the timing windows to compress wall-clock time.

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_range, validate_ratio, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Inclusive range of whole seconds used for think-time sampling
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SecondsRange {
    pub min: u64,
    pub max: u64,
}

impl SecondsRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// A zero-width range; used by tests to strip think time
    pub const ZERO: Self = Self { min: 0, max: 0 };

    pub fn as_durations(&self) -> (Duration, Duration) {
        (Duration::from_secs(self.min), Duration::from_secs(self.max))
    }
}

/// Inclusive range of counts
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u64,
    pub max: u64,
}

impl CountRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }
}

/// Scenario configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub newsfeed: NewsfeedConfig,

    #[serde(default)]
    pub quiz: QuizConfig,
}

/// Newsfeed session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsfeedConfig {
    /// Page iterations per session
    #[serde(default = "default_page_iterations")]
    pub page_iterations: CountRange,

    /// Items requested per page; also the stride of the global item index
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// Cumulative reaction ratio ceiling
    #[serde(default = "default_reaction_ratio")]
    pub reaction_ratio: f64,

    /// Cumulative mark-as-read ratio ceiling
    #[serde(default = "default_mark_as_read_ratio")]
    pub mark_as_read_ratio: f64,

    /// Cumulative read-in-detail ratio ceiling
    #[serde(default = "default_read_ratio")]
    pub read_ratio: f64,

    /// Every n-th item (by global index) gets a save check
    #[serde(default = "default_save_cadence")]
    pub save_cadence: u64,

    /// Passive scrolling window per non-acting iteration
    #[serde(default = "default_scroll_delay")]
    pub scroll_delay: SecondsRange,

    /// Fixed pause on important content before a possible mark-as-read
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_important_read_delay"
    )]
    pub important_read_delay: Duration,

    /// Emoji picking pause between reaction submissions
    #[serde(default = "default_reaction_pick_delay")]
    pub reaction_pick_delay: SecondsRange,

    /// Reading window after opening content detail
    #[serde(default = "default_reading_delay")]
    pub reading_delay: SecondsRange,

    /// Comment pages browsed while reading content detail
    #[serde(default = "default_comment_pages")]
    pub comment_pages: CountRange,

    /// Scrolling window per non-acting comment page
    #[serde(default = "default_comment_scroll_delay")]
    pub comment_scroll_delay: SecondsRange,

    /// Comment reactions allowed per session
    #[serde(default = "default_comment_reaction_cap")]
    pub comment_reaction_cap: u64,

    /// Typing window before posting a comment or reply
    #[serde(default = "default_typing_delay")]
    pub typing_delay: SecondsRange,

    /// Length of the generated top-level comment text
    #[serde(default = "default_comment_length")]
    pub comment_length: CountRange,
}

/// Quiz session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    /// Quiz attempts per session
    #[serde(default = "default_quiz_attempts")]
    pub attempts: CountRange,

    /// Reading window before each answer or finish submission
    #[serde(default = "default_answer_delay")]
    pub answer_delay: SecondsRange,

    /// Fixed rest between attempts
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_rest_delay"
    )]
    pub rest_delay: Duration,

    /// Safety margin subtracted from the server-side time limit; no answer
    /// or finish call is issued once the remaining budget is inside it
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_safety_margin"
    )]
    pub safety_margin: Duration,
}

impl Default for NewsfeedConfig {
    fn default() -> Self {
        Self {
            page_iterations: default_page_iterations(),
            page_size: default_page_size(),
            reaction_ratio: default_reaction_ratio(),
            mark_as_read_ratio: default_mark_as_read_ratio(),
            read_ratio: default_read_ratio(),
            save_cadence: default_save_cadence(),
            scroll_delay: default_scroll_delay(),
            important_read_delay: default_important_read_delay(),
            reaction_pick_delay: default_reaction_pick_delay(),
            reading_delay: default_reading_delay(),
            comment_pages: default_comment_pages(),
            comment_scroll_delay: default_comment_scroll_delay(),
            comment_reaction_cap: default_comment_reaction_cap(),
            typing_delay: default_typing_delay(),
            comment_length: default_comment_length(),
        }
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            attempts: default_quiz_attempts(),
            answer_delay: default_answer_delay(),
            rest_delay: default_rest_delay(),
            safety_margin: default_safety_margin(),
        }
    }
}

impl Validatable for ScenarioConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.newsfeed.validate()?;
        self.quiz.validate()?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "scenario"
    }
}

impl Validatable for NewsfeedConfig {
    fn validate(&self) -> ConfigResult<()> {
        let domain = self.domain_name();
        validate_range(
            self.page_iterations.min,
            self.page_iterations.max,
            "page_iterations",
            domain,
        )?;
        validate_positive(self.page_size, "page_size", domain)?;
        validate_ratio(self.reaction_ratio, "reaction_ratio", domain)?;
        validate_ratio(self.mark_as_read_ratio, "mark_as_read_ratio", domain)?;
        validate_ratio(self.read_ratio, "read_ratio", domain)?;
        validate_positive(self.save_cadence, "save_cadence", domain)?;
        validate_range(
            self.comment_length.min,
            self.comment_length.max,
            "comment_length",
            domain,
        )?;
        validate_range(
            self.comment_pages.min,
            self.comment_pages.max,
            "comment_pages",
            domain,
        )?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "scenario.newsfeed"
    }
}

impl Validatable for QuizConfig {
    fn validate(&self) -> ConfigResult<()> {
        let domain = self.domain_name();
        validate_range(self.attempts.min, self.attempts.max, "attempts", domain)?;
        validate_positive(
            self.safety_margin.as_secs(),
            "safety_margin",
            domain,
        )?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "scenario.quiz"
    }
}

// Default value functions
fn default_page_iterations() -> CountRange {
    CountRange::new(5, 25)
}

fn default_page_size() -> u64 {
    20
}

fn default_reaction_ratio() -> f64 {
    0.08
}

fn default_mark_as_read_ratio() -> f64 {
    0.05
}

fn default_read_ratio() -> f64 {
    0.05
}

fn default_save_cadence() -> u64 {
    50
}

fn default_scroll_delay() -> SecondsRange {
    SecondsRange::new(2, 30)
}

fn default_important_read_delay() -> Duration {
    Duration::from_secs(3)
}

fn default_reaction_pick_delay() -> SecondsRange {
    SecondsRange::new(1, 4)
}

fn default_reading_delay() -> SecondsRange {
    SecondsRange::new(15, 180)
}

fn default_comment_pages() -> CountRange {
    CountRange::new(1, 5)
}

fn default_comment_scroll_delay() -> SecondsRange {
    SecondsRange::new(2, 20)
}

fn default_comment_reaction_cap() -> u64 {
    5
}

fn default_typing_delay() -> SecondsRange {
    SecondsRange::new(3, 10)
}

fn default_comment_length() -> CountRange {
    CountRange::new(10, 2000)
}

fn default_quiz_attempts() -> CountRange {
    CountRange::new(1, 5)
}

fn default_answer_delay() -> SecondsRange {
    SecondsRange::new(3, 10)
}

fn default_rest_delay() -> Duration {
    Duration::from_secs(3)
}

fn default_safety_margin() -> Duration {
    Duration::from_secs(5)
}
