//! Storage seams of the matching pipeline
//!
//! The pipeline only talks to these traits, so it runs the same against
//! Postgres and against the in-memory stores used in tests.
use crate::{
    error::AppResult,
    models::{CallerIdentity, MatchRecord, UserId, UserProfile},
};

/// Read access to user profiles
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, id: &UserId) -> AppResult<Option<UserProfile>>;

    /// Creates an empty-traits profile for a caller seen for the first time
    ///
    /// Returns the stored profile, which may be one created concurrently.
    async fn create_default(&self, caller: &CallerIdentity) -> AppResult<UserProfile>;

    /// All profiles that may be matched with `requester`
    ///
    /// Excludes the requester, suspended profiles and blocks in either direction.
    async fn list_eligible(&self, requester: &UserId) -> AppResult<Vec<UserProfile>>;
}

/// Persistence of match results
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MatchStore: Send + Sync {
    /// Replaces the requester's entire record set as one unit
    async fn replace_all(&self, requester: &UserId, records: Vec<MatchRecord>) -> AppResult<()>;

    /// Records for `requester`, highest final score first
    async fn list(&self, requester: &UserId) -> AppResult<Vec<MatchRecord>>;
}
