use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{ChangePasswordRequest, RegisterUser, User, UserResponse},
    state::AppState,
    types::UserId,
};

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUser>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    payload.validate()?;
    let created = state.users.register(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, AppError> {
    Ok(Json(state.users.list().await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(state.users.get(id).await?))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<UserId>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    payload.validate()?;
    let updated = state
        .sessions
        .change_password(&user, id, &payload.old_password, &payload.new_password)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(UserResponse::from(updated))))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<UserId>,
) -> Result<StatusCode, AppError> {
    state.users.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
