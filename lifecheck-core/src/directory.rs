//! User directory abstraction.
//!
//! The orchestrator only needs to look a user up and write the record back
//! after a successful check. Writes are last-writer-wins; implementations
//! must let a caller read its own write immediately.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Stored user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    /// PHC-formatted password hash, never the plaintext
    pub password_hash: String,
    /// Reference photo, relative to the upload directory
    pub profile_picture_path: Option<String>,
    pub last_verification_date: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            profile_picture_path: None,
            last_verification_date: None,
        }
    }

    /// Recorded reference photo, ignoring blank values.
    pub fn profile_picture(&self) -> Option<&str> {
        self.profile_picture_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    pub fn has_profile_picture(&self) -> bool {
        self.profile_picture().is_some()
    }
}

/// Lookup and persistence of user records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find a user by exact username.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Insert or overwrite a record.
    async fn save(&self, record: UserRecord) -> Result<()>;

    /// Insert a record only if the username is free. Returns `false` if taken.
    async fn create(&self, record: UserRecord) -> Result<bool>;

    /// Backend name for health output.
    fn name(&self) -> &'static str;

    /// Whether the backing store answers. Always true for in-process stores.
    async fn check_health(&self) -> Result<()> {
        Ok(())
    }
}

/// Process-local directory backed by a concurrent map.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: DashMap<String, UserRecord>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl std::fmt::Debug for InMemoryUserDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryUserDirectory")
            .field("users", &self.users.len())
            .finish()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self.users.get(username).map(|entry| entry.value().clone()))
    }

    async fn save(&self, record: UserRecord) -> Result<()> {
        self.users.insert(record.username.clone(), record);
        Ok(())
    }

    async fn create(&self, record: UserRecord) -> Result<bool> {
        match self.users.entry(record.username.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
