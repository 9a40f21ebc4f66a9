use axum::{
    Json,
    extract::{Multipart, State},
};

use crate::middleware::auth::SessionToken;
use crate::service::ImageUpload;
use crate::types::{EditNicknameRequest, EditPasswordRequest, ProfileReply, ProfileView};
use crate::{ProfileError, router::ProfileState};

/// GET /profile
pub async fn get_profile(
    State(state): State<ProfileState>,
    SessionToken(token): SessionToken,
) -> Result<Json<ProfileView>, ProfileError> {
    let view = state.workflow.fetch_profile(&token).await?;
    Ok(Json(view))
}

/// PATCH /profile/nickname
pub async fn edit_nickname(
    State(state): State<ProfileState>,
    SessionToken(token): SessionToken,
    Json(req): Json<EditNicknameRequest>,
) -> Result<ProfileReply, ProfileError> {
    state.workflow.rename_nickname(&token, &req.nickname).await
}

/// PATCH /profile/password
pub async fn edit_password(
    State(state): State<ProfileState>,
    SessionToken(token): SessionToken,
    Json(req): Json<EditPasswordRequest>,
) -> Result<ProfileReply, ProfileError> {
    state
        .workflow
        .change_password(&token, &req.password, &req.new_password)
        .await
}

/// POST /profile/image: the first multipart field is taken as the image.
pub async fn upload_image(
    State(state): State<ProfileState>,
    SessionToken(token): SessionToken,
    mut multipart: Multipart,
) -> Result<ProfileReply, ProfileError> {
    let field = multipart
        .next_field()
        .await?
        .ok_or(ProfileError::MissingFile)?;
    let upload = ImageUpload {
        file_name: field.file_name().map(str::to_owned),
        content_type: field.content_type().map(str::to_owned),
    };
    state.workflow.upload_image(&token, upload, field).await
}
