use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::user::{LoginRequest, RefreshRequest, TokenPair, User, UserResponse},
    state::AppState,
};

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let pair = state
        .sessions
        .login(&payload.email, &payload.password)
        .await?;
    Ok(Json(pair))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let pair = state.sessions.refresh(&payload.refresh_token).await?;
    Ok(Json(pair))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    state.sessions.logout(&user).await?;
    Ok(Json(json!({ "detail": "Successfully logged out" })))
}

pub async fn me(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}
