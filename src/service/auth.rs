use crate::db::models::{Account, Session};
use crate::db::sqlite::AccountsStorage;
use crate::error::ProfileError;
use crate::service::password::{hash_password, verify_password};
use crate::service::policy::{
    NICKNAME_RULE_MESSAGE, NICKNAME_TAKEN_MESSAGE, PASSWORD_RULE_MESSAGE, is_valid_email,
    is_valid_nickname, is_valid_password,
};
use crate::service::ports::CredentialVerifier;
use crate::types::ProfileReply;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use uuid::Uuid;

const EMAIL_RULE_MESSAGE: &str = "올바른 이메일 형식이 아닙니다.";
const EMAIL_TAKEN_MESSAGE: &str = "이미 가입된 이메일입니다.";
const SIGNED_UP_MESSAGE: &str = "회원가입이 완료되었습니다.";
/// Verified against when the email is unknown, so both login failures cost one bcrypt check.
const DUMMY_PASSWORD: &str = "unknown-account-placeholder";

/// Owns accounts and the session lifecycle behind the session cookie.
#[derive(Clone)]
pub struct AuthService {
    accounts: AccountsStorage,
    session_ttl: Duration,
    bcrypt_cost: u32,
    dummy_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    pub fn new(accounts: AccountsStorage, session_ttl: Duration, bcrypt_cost: u32) -> Self {
        Self {
            accounts,
            session_ttl,
            bcrypt_cost,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub async fn sign_up(
        &self,
        email: &str,
        nickname: &str,
        password: &str,
    ) -> Result<ProfileReply, ProfileError> {
        if !is_valid_email(email) {
            return Ok(ProfileReply::bad_request(EMAIL_RULE_MESSAGE));
        }
        if !is_valid_nickname(nickname) {
            return Ok(ProfileReply::bad_request(NICKNAME_RULE_MESSAGE));
        }
        if !is_valid_password(password) {
            return Ok(ProfileReply::bad_request(PASSWORD_RULE_MESSAGE));
        }

        let account = Account {
            email: email.to_string(),
            nickname: nickname.to_string(),
            password_hash: hash_password(password.to_string(), self.bcrypt_cost).await?,
            created_at: Utc::now(),
        };

        match self.accounts.insert(&account).await {
            Ok(()) => {}
            Err(ProfileError::EmailTaken) => {
                return Ok(ProfileReply::bad_request(EMAIL_TAKEN_MESSAGE));
            }
            Err(ProfileError::NicknameTaken) => {
                return Ok(ProfileReply::bad_request(NICKNAME_TAKEN_MESSAGE));
            }
            Err(e) => return Err(e),
        }

        info!(email = %account.email, nickname = %account.nickname, "account registered");
        Ok(ProfileReply::new(StatusCode::CREATED, SIGNED_UP_MESSAGE))
    }

    /// Verify credentials and open a new session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ProfileError> {
        let Some(account) = self.accounts.get_by_email(email).await? else {
            let dummy = self
                .dummy_hash
                .get_or_try_init(|| hash_password(DUMMY_PASSWORD.to_string(), self.bcrypt_cost))
                .await?;
            verify_password(password.to_string(), dummy.clone()).await?;
            debug!(email, "login for unknown account");
            return Err(ProfileError::InvalidCredentials);
        };
        if !verify_password(password.to_string(), account.password_hash).await? {
            debug!(email, "login with wrong password");
            return Err(ProfileError::InvalidCredentials);
        }

        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.session_ttl).ok_or_else(|| {
            ProfileError::InvalidConfig(format!("session ttl {} overflows", self.session_ttl))
        })?;
        let session = Session {
            token: Uuid::new_v4().to_string(),
            email: account.email,
            created_at: now,
            expires_at,
        };
        self.accounts.insert_session(&session).await?;
        info!(email = %session.email, expires_at = %session.expires_at, "session opened");
        Ok(session)
    }

    pub async fn logout(&self, token: &str) -> Result<(), ProfileError> {
        self.accounts.delete_session(token).await
    }
}

impl CredentialVerifier for AuthService {
    async fn token_to_email(&self, token: &str) -> Result<String, ProfileError> {
        let session = self
            .accounts
            .get_session(token)
            .await?
            .ok_or(ProfileError::InvalidSession)?;
        if session.is_expired(Utc::now()) {
            debug!(email = %session.email, "dropping expired session");
            self.accounts.delete_session(token).await?;
            return Err(ProfileError::InvalidSession);
        }
        Ok(session.email)
    }

    async fn get_account(&self, email: &str) -> Result<Account, ProfileError> {
        self.accounts
            .get_by_email(email)
            .await?
            .ok_or_else(|| ProfileError::AccountNotFound(email.to_string()))
    }

    async fn save_nickname(&self, email: &str, nickname: &str) -> Result<(), ProfileError> {
        self.accounts.update_nickname(email, nickname).await
    }

    async fn save_password_hash(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<(), ProfileError> {
        self.accounts.update_password_hash(email, password_hash).await
    }
}
