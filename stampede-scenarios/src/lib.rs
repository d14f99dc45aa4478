//! Scenario engines for Stampede
//!
//! One state machine per scenario type sequences virtual-actor operations
//! under probabilistic policies and time/pagination budgets. The transition
//! probabilities, sampling ratios and timing windows reproduce the
//! calibrated load profile; changing them changes what the load test
//! measures. Engines do not catch errors: a fatal failure from the HTTP
//! layer simply ends that one session.

pub mod newsfeed;
pub mod quiz;
pub mod sampling;

pub use newsfeed::{NewsfeedSession, SessionStats};
pub use quiz::QuizSession;
