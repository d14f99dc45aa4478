//! Timed quiz session
//!
//! Finds quiz-bearing content on a group timeline, then runs a random
//! number of participation attempts. Every answer and finish submission is
//! gated by a fresh time-budget check against the server-assigned start
//! time; submissions always carry the full cumulative answer list
//! (full-replace semantics).

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use stampede_actor::{ActorResult, Content, QuizParticipation, UserAnswer, VirtualActor};
use stampede_config::domains::scenario::QuizConfig;
use stampede_http::RunState;

use crate::sampling::{pause, random_index, random_number, think};

/// Whether the time budget (minus the safety margin) is spent
fn is_time_up(
    started_at: DateTime<Utc>,
    time_limit_secs: u64,
    margin: Duration,
    now: DateTime<Utc>,
) -> bool {
    let margin = chrono::Duration::from_std(margin).unwrap_or_else(|_| chrono::Duration::zero());
    let budget = chrono::Duration::seconds(time_limit_secs as i64) - margin;
    now - started_at >= budget
}

/// Time left until the server-side deadline, without the safety margin
fn remaining_time(
    started_at: DateTime<Utc>,
    time_limit_secs: u64,
    now: DateTime<Utc>,
) -> Option<Duration> {
    let deadline = started_at + chrono::Duration::seconds(time_limit_secs as i64);
    (deadline - now).to_std().ok()
}

/// One quiz-taking session for one virtual actor
pub struct QuizSession<'a> {
    actor: &'a VirtualActor,
    config: QuizConfig,
    state: Arc<RunState>,
    group_id: String,
}

impl<'a> QuizSession<'a> {
    pub fn new(
        actor: &'a VirtualActor,
        config: QuizConfig,
        state: Arc<RunState>,
        group_id: impl Into<String>,
    ) -> Self {
        Self {
            actor,
            config,
            state,
            group_id: group_id.into(),
        }
    }

    pub async fn run(&self) -> ActorResult<()> {
        let candidates = self.find_quiz_content().await?;
        if candidates.is_empty() {
            self.state.counters.record_no_quiz_found();
            debug!(username = %self.actor.username(), group = %self.group_id, "no quiz found");
            return Ok(());
        }

        let picked = &candidates[random_index(candidates.len())];
        let content = self
            .actor
            .get_content_details(&picked.id, picked.kind)
            .await?
            .unwrap_or_else(|| picked.clone());

        let attempts = random_number(self.config.attempts.min, self.config.attempts.max);
        debug!(username = %self.actor.username(), content = %content.id, attempts, "quiz session started");

        for _ in 0..attempts {
            let participant_id = match &content.quiz_doing {
                Some(doing) => Some(doing.quiz_participant_id.clone()),
                None => match &content.quiz {
                    Some(quiz) => self.actor.start_quiz(&quiz.id).await?,
                    None => None,
                },
            };

            if let Some(participant_id) = participant_id {
                if let Some(quiz) = self.actor.get_quiz_result(&participant_id).await? {
                    let answers = self.answer_questions(&participant_id, &quiz).await?;
                    self.finish(&participant_id, &quiz, &answers).await?;
                    self.actor.get_quiz_result(&participant_id).await?;
                }
            }

            pause(self.config.rest_delay).await;
        }

        info!(username = %self.actor.username(), content = %content.id, "quiz session finished");
        Ok(())
    }

    /// Page the timeline until quiz-bearing content turns up or the feed is
    /// exhausted
    async fn find_quiz_content(&self) -> ActorResult<Vec<Content>> {
        let mut candidates = Vec::new();
        let mut end_cursor: Option<String> = None;

        loop {
            match self
                .actor
                .get_timeline(&self.group_id, end_cursor.as_deref())
                .await?
            {
                Some(page) => {
                    let has_next_page = page.meta.has_next_page;
                    end_cursor = page.meta.end_cursor.clone();
                    candidates.extend(page.list.into_iter().filter(|c| c.quiz.is_some()));

                    if !candidates.is_empty() || !has_next_page {
                        return Ok(candidates);
                    }
                }
                None => return Ok(candidates),
            }
        }
    }

    /// Answer a random number of questions, each gated by a fresh
    /// time-budget check after the reading delay
    async fn answer_questions(
        &self,
        participant_id: &str,
        quiz: &QuizParticipation,
    ) -> ActorResult<Vec<UserAnswer>> {
        let mut answers = Vec::new();
        if quiz.questions.is_empty() {
            return Ok(answers);
        }

        let count = random_number(1, quiz.questions.len() as u64) as usize;
        for question in quiz.questions.iter().take(count) {
            think(self.config.answer_delay).await;

            if is_time_up(
                quiz.started_at,
                quiz.time_limit,
                self.config.safety_margin,
                Utc::now(),
            ) {
                continue;
            }

            if question.answers.is_empty() {
                continue;
            }
            let choice = &question.answers[random_index(question.answers.len())];
            answers.push(UserAnswer {
                question_id: question.id.clone(),
                answer_id: choice.id.clone(),
            });
            self.actor.answer_quiz(participant_id, &answers).await?;
        }

        Ok(answers)
    }

    /// Submit the finish call with probability 3/4; otherwise sleep out the
    /// remaining budget and let the quiz expire server-side
    async fn finish(
        &self,
        participant_id: &str,
        quiz: &QuizParticipation,
        answers: &[UserAnswer],
    ) -> ActorResult<()> {
        if random_number(0, 3) != 0 {
            think(self.config.answer_delay).await;
            if !is_time_up(
                quiz.started_at,
                quiz.time_limit,
                self.config.safety_margin,
                Utc::now(),
            ) {
                self.actor.finish_quiz(participant_id, answers).await?;
            }
        } else if let Some(remaining) = remaining_time(quiz.started_at, quiz.time_limit, Utc::now())
        {
            pause(remaining).await;
        }
        Ok(())
    }
}
