//! Collaborator seams used by [`ProfileWorkflow`](super::profile::ProfileWorkflow).

use crate::db::models::{Account, ProfileRecord, SaveOutcome};
use crate::error::ProfileError;
use std::future::Future;

/// Resolves sessions to accounts and persists account mutations.
pub trait CredentialVerifier: Send + Sync {
    /// Unknown or expired tokens fail with `InvalidSession`.
    fn token_to_email(&self, token: &str)
    -> impl Future<Output = Result<String, ProfileError>> + Send;

    fn get_account(&self, email: &str)
    -> impl Future<Output = Result<Account, ProfileError>> + Send;

    /// Writes only the nickname column. Fails with `NicknameTaken` when
    /// another account already holds the nickname.
    fn save_nickname(
        &self,
        email: &str,
        nickname: &str,
    ) -> impl Future<Output = Result<(), ProfileError>> + Send;

    /// Writes only the password hash column.
    fn save_password_hash(
        &self,
        email: &str,
        password_hash: &str,
    ) -> impl Future<Output = Result<(), ProfileError>> + Send;
}

/// Format and uniqueness rules for account fields.
pub trait AccountPolicy: Send + Sync {
    fn is_valid_nickname(&self, nickname: &str) -> bool;

    fn is_valid_password(&self, password: &str) -> bool;

    fn is_nickname_taken(&self, nickname: &str)
    -> impl Future<Output = Result<bool, ProfileError>> + Send;
}

pub trait ProfileStore: Send + Sync {
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<ProfileRecord>, ProfileError>> + Send;

    /// Insert-or-overwrite keyed by email. An overwrite reports the URL it replaced.
    fn save(&self, record: &ProfileRecord)
    -> impl Future<Output = Result<SaveOutcome, ProfileError>> + Send;
}
