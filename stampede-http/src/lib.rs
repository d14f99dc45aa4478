//! Resilient, auth-aware HTTP execution layer for Stampede
//!
//! Every virtual actor funnels its API calls through [`ResilientClient`],
//! which classifies failures, retries with linear backoff, refreshes the
//! bearer token on 401 and absorbs allow-listed business conflicts. Token
//! acquisition and scheduled refresh live in [`auth`]; run-scoped shared
//! state (counters, token cache, retry heartbeat) in [`state`].

pub mod auth;
pub mod client;
pub mod errors;
pub mod response;
pub mod state;

// Re-export main types for convenience
pub use auth::{HttpIdentityProvider, IdentityProvider, RefreshedToken, SessionAuth, TokenSet};
pub use client::ResilientClient;
pub use errors::{AuthError, ClientError, ClientResult, ProviderError};
pub use response::{data_of, ApiErrorBody};
pub use state::{RunCounters, RunState, TokenCache};
