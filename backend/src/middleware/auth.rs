use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, state::AppState};

/// Requires a valid bearer access token and exposes the resolved
/// [`User`](crate::models::user::User) as a request extension.
pub async fn auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer(request.headers())
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?
        .to_string();

    let user = state.sessions.authenticate(&token).await?;
    tracing::Span::current().record("user_id", tracing::field::display(user.id));
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer_token)
}

fn parse_bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    (!token.is_empty()).then_some(token)
}
