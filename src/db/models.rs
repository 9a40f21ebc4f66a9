use chrono::{DateTime, Utc};

/// Authenticated user identity row.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub email: String,
    pub nickname: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Per-account document holding the profile image URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRecord {
    pub email: String,
    pub url: String,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl ProfileRecord {
    pub fn new(email: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            url: url.into(),
            version: 1,
            updated_at: Utc::now(),
        }
    }
}

/// Result of an upsert against the profile store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated { previous_url: String },
}
