use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use crate::{
    db::{MatchStore, ProfileStore},
    error::AppResult,
    models::{CallerIdentity, MatchRecord, UserId, UserProfile},
};

/// Profile store backed by process memory
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<UserId, UserProfile>>,
    /// (blocker, blocked)
    blocks: RwLock<HashSet<(UserId, UserId)>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, profile: UserProfile) {
        self.profiles
            .write()
            .await
            .insert(profile.id.clone(), profile);
    }

    pub async fn block(&self, blocker: &UserId, blocked: &UserId) {
        self.blocks
            .write()
            .await
            .insert((blocker.clone(), blocked.clone()));
    }
}

#[async_trait::async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get(&self, id: &UserId) -> AppResult<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(id).cloned())
    }

    async fn create_default(&self, caller: &CallerIdentity) -> AppResult<UserProfile> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .entry(caller.id.clone())
            .or_insert_with(|| UserProfile::for_caller(caller));
        Ok(profile.clone())
    }

    async fn list_eligible(&self, requester: &UserId) -> AppResult<Vec<UserProfile>> {
        let profiles = self.profiles.read().await;
        let blocks = self.blocks.read().await;

        let mut eligible: Vec<UserProfile> = profiles
            .values()
            .filter(|p| &p.id != requester && !p.suspended)
            .filter(|p| {
                !blocks.contains(&(requester.clone(), p.id.clone()))
                    && !blocks.contains(&(p.id.clone(), requester.clone()))
            })
            .cloned()
            .collect();

        // HashMap iteration order is random; keep listings reproducible
        eligible.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(eligible)
    }
}

/// Match store backed by process memory
///
/// `replace_all` swaps the whole set under one write lock, so readers never
/// observe a half-replaced set.
#[derive(Default)]
pub struct InMemoryMatchStore {
    records: RwLock<HashMap<UserId, Vec<MatchRecord>>>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl MatchStore for InMemoryMatchStore {
    async fn replace_all(&self, requester: &UserId, records: Vec<MatchRecord>) -> AppResult<()> {
        self.records.write().await.insert(requester.clone(), records);
        Ok(())
    }

    async fn list(&self, requester: &UserId) -> AppResult<Vec<MatchRecord>> {
        let mut records = self
            .records
            .read()
            .await
            .get(requester)
            .cloned()
            .unwrap_or_default();
        records.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
        Ok(records)
    }
}
