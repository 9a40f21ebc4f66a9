//! Profile workflow: resolve the caller from their session, apply one
//! validation step, perform one mutation, answer with a [`ProfileReply`].

use crate::db::models::{Account, ProfileRecord, SaveOutcome};
use crate::error::ProfileError;
use crate::service::password::{hash_password, verify_password};
use crate::service::policy::{
    NICKNAME_RULE_MESSAGE, NICKNAME_TAKEN_MESSAGE, PASSWORD_RULE_MESSAGE,
};
use crate::service::ports::{AccountPolicy, CredentialVerifier, ProfileStore};
use crate::service::uploads::UploadDir;
use crate::types::{ProfileReply, ProfileView};
use axum::body::Bytes;
use axum::http::StatusCode;
use futures::Stream;
use tracing::{debug, info};

pub const NICKNAME_UPDATED_MESSAGE: &str = "닉네임이 수정되었습니다.";
pub const WRONG_PASSWORD_MESSAGE: &str = "기존 비밀번호가 틀렸습니다.";
pub const PASSWORD_UPDATED_MESSAGE: &str = "패스워드가 수정되었습니다.";
pub const NOT_AN_IMAGE_MESSAGE: &str = "파일이 이미지가 아닙니다.";
pub const IMAGE_UPLOADED_MESSAGE: &str = "프로필 이미지가 업로드되었습니다.";
pub const IMAGE_MODIFIED_MESSAGE: &str = "프로필 이미지가 수정되었습니다.";

/// The only declared media type accepted for profile images.
pub const ACCEPTED_IMAGE_TYPE: &str = "image/jpeg";
const STORED_IMAGE_EXTENSION: &str = "jpg";

/// Declared metadata of an uploaded multipart part.
#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

pub struct ProfileWorkflow<V, P, S> {
    verifier: V,
    policy: P,
    store: S,
    uploads: UploadDir,
    bcrypt_cost: u32,
}

impl<V, P, S> ProfileWorkflow<V, P, S>
where
    V: CredentialVerifier,
    P: AccountPolicy,
    S: ProfileStore,
{
    pub fn new(verifier: V, policy: P, store: S, uploads: UploadDir, bcrypt_cost: u32) -> Self {
        Self {
            verifier,
            policy,
            store,
            uploads,
            bcrypt_cost,
        }
    }

    pub fn uploads(&self) -> &UploadDir {
        &self.uploads
    }

    pub async fn resolve_caller(&self, token: &str) -> Result<Account, ProfileError> {
        let email = self.verifier.token_to_email(token).await?;
        self.verifier.get_account(&email).await
    }

    /// Fails with `ProfileNotFound` until the caller has uploaded an image.
    pub async fn fetch_profile(&self, token: &str) -> Result<ProfileView, ProfileError> {
        let account = self.resolve_caller(token).await?;
        let profile = self
            .store
            .find_by_email(&account.email)
            .await?
            .ok_or_else(|| ProfileError::ProfileNotFound(account.email.clone()))?;
        Ok(ProfileView {
            email: account.email,
            nickname: account.nickname,
            image_url: profile.url,
        })
    }

    pub async fn rename_nickname(
        &self,
        token: &str,
        nickname: &str,
    ) -> Result<ProfileReply, ProfileError> {
        let account = self.resolve_caller(token).await?;

        if !self.policy.is_valid_nickname(nickname) {
            return Ok(ProfileReply::bad_request(NICKNAME_RULE_MESSAGE));
        }
        if self.policy.is_nickname_taken(nickname).await? {
            return Ok(ProfileReply::bad_request(NICKNAME_TAKEN_MESSAGE));
        }

        match self.verifier.save_nickname(&account.email, nickname).await {
            Ok(()) => {}
            // Another rename claimed the nickname between the check and the write.
            Err(ProfileError::NicknameTaken) => {
                debug!(email = %account.email, nickname, "nickname claimed concurrently");
                return Ok(ProfileReply::bad_request(NICKNAME_TAKEN_MESSAGE));
            }
            Err(e) => return Err(e),
        }

        info!(email = %account.email, from = %account.nickname, to = nickname, "nickname updated");
        Ok(ProfileReply::ok(NICKNAME_UPDATED_MESSAGE))
    }

    pub async fn change_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<ProfileReply, ProfileError> {
        let account = self.resolve_caller(token).await?;

        let matches =
            verify_password(current_password.to_string(), account.password_hash.clone()).await?;
        if !matches {
            return Ok(ProfileReply::bad_request(WRONG_PASSWORD_MESSAGE));
        }
        if !self.policy.is_valid_password(new_password) {
            return Ok(ProfileReply::bad_request(PASSWORD_RULE_MESSAGE));
        }

        let password_hash = hash_password(new_password.to_string(), self.bcrypt_cost).await?;
        self.verifier
            .save_password_hash(&account.email, &password_hash)
            .await?;

        info!(email = %account.email, "password updated");
        Ok(ProfileReply::ok(PASSWORD_UPDATED_MESSAGE))
    }

    /// Only the declared media type is checked; content is not sniffed.
    /// The reply is produced after the file is synced and the record saved.
    /// A replaced image file is removed once the new record is committed.
    pub async fn upload_image<B, E>(
        &self,
        token: &str,
        upload: ImageUpload,
        body: B,
    ) -> Result<ProfileReply, ProfileError>
    where
        B: Stream<Item = Result<Bytes, E>>,
        ProfileError: From<E>,
    {
        let account = self.resolve_caller(token).await?;

        if upload.content_type.as_deref() != Some(ACCEPTED_IMAGE_TYPE) {
            debug!(
                email = %account.email,
                content_type = upload.content_type.as_deref().unwrap_or("<none>"),
                "rejecting non-jpeg upload"
            );
            return Ok(ProfileReply::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                NOT_AN_IMAGE_MESSAGE,
            ));
        }

        let stored = self.uploads.store(STORED_IMAGE_EXTENSION, body).await?;
        let outcome = self
            .store
            .save(&ProfileRecord::new(account.email.clone(), stored.url))
            .await?;

        info!(
            email = %account.email,
            client_name = upload.file_name.as_deref().unwrap_or("<none>"),
            stored = %stored.name,
            bytes = stored.bytes,
            ?outcome,
            "profile image stored"
        );
        let message = match outcome {
            SaveOutcome::Created => IMAGE_UPLOADED_MESSAGE,
            SaveOutcome::Updated { previous_url } => {
                self.uploads.remove_url(&previous_url).await;
                IMAGE_MODIFIED_MESSAGE
            }
        };
        Ok(ProfileReply::ok(message))
    }
}
