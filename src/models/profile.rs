use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt::Display};

/// Opaque identity token of a user, issued by the auth layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller identity as resolved by the upstream auth layer
///
/// Only `id` is required. The optional fields seed the requester profile when
/// it has to be created on the fly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub id: UserId,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl CallerIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            display_name: None,
            avatar_url: None,
        }
    }
}

/// A user's profile as read from the profile store
///
/// The matching core never mutates profiles; it only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    /// Trait tags in first-seen order, without duplicates
    pub traits: Vec<String>,
    pub bio: String,
    pub avatar_url: Option<String>,
    pub suspended: bool,
}

impl UserProfile {
    /// Creates a profile with no traits and an empty bio
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            traits: Vec::new(),
            bio: String::new(),
            avatar_url: None,
            suspended: false,
        }
    }

    /// Default profile for a caller seen for the first time
    pub fn for_caller(caller: &CallerIdentity) -> Self {
        let display_name = caller
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("User");

        let mut profile = Self::new(caller.id.clone(), display_name);
        profile.avatar_url = caller.avatar_url.clone();
        profile
    }

    pub fn with_traits<I, S>(mut self, traits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.traits = dedup_traits(traits.into_iter().map(Into::into));
        self
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = bio.into();
        self
    }

    pub fn suspended(mut self) -> Self {
        self.suspended = true;
        self
    }
}

/// Removes duplicate tags while keeping first-seen order
pub fn dedup_traits(traits: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    traits
        .into_iter()
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Denormalized copy of a profile stored inside a match record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    pub id: UserId,
    pub display_name: String,
    pub traits: Vec<String>,
    pub bio: String,
    pub avatar_url: Option<String>,
}

impl From<&UserProfile> for ProfileSnapshot {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id.clone(),
            display_name: profile.display_name.clone(),
            traits: profile.traits.clone(),
            bio: profile.bio.clone(),
            avatar_url: profile.avatar_url.clone(),
        }
    }
}
