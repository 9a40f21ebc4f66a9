use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
};
use crate::config::{Config, SessionConfig};
use crate::db::{AccountsStorage, ProfilesStorage, SqlitePool};
use crate::error::ProfileError;
use crate::handlers::{auth, profile};
use crate::service::{AccountRules, AuthService, ProfileWorkflow, UploadDir};

pub type SqliteProfileWorkflow = ProfileWorkflow<AuthService, AccountRules, ProfilesStorage>;

#[derive(Clone)]
pub struct ProfileState {
    pub workflow: Arc<SqliteProfileWorkflow>,
    pub auth: AuthService,
    pub session: Arc<SessionConfig>,
    pub body_limit: usize,
}

impl ProfileState {
    /// Wire storage, services and the upload directory from configuration.
    /// Fails with `InvalidConfig` when the session ttl is out of range.
    pub async fn new(pool: SqlitePool, cfg: &Config) -> Result<Self, ProfileError> {
        let accounts = AccountsStorage::new(pool.clone());
        let auth = AuthService::new(
            accounts.clone(),
            cfg.session.ttl()?,
            cfg.security.bcrypt_cost,
        );

        let uploads = UploadDir::new(cfg.upload.dir.clone(), cfg.upload.url_prefix.clone());
        uploads.ensure_exists().await?;

        let workflow = ProfileWorkflow::new(
            auth.clone(),
            AccountRules::new(accounts),
            ProfilesStorage::new(pool),
            uploads,
            cfg.security.bcrypt_cost,
        );

        Ok(Self {
            workflow: Arc::new(workflow),
            auth,
            session: Arc::new(cfg.session.clone()),
            body_limit: cfg.upload.max_bytes,
        })
    }
}

pub fn profile_router(state: ProfileState) -> Router {
    let body_limit = state.body_limit;
    Router::new()
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/profile", get(profile::get_profile))
        .route("/profile/nickname", patch(profile::edit_nickname))
        .route("/profile/password", patch(profile::edit_password))
        .route("/profile/image", post(profile::upload_image))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
