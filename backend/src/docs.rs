#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::models::user::{
    ChangePasswordRequest, LoginRequest, RefreshRequest, RegisterUser, TokenPair, UserResponse,
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        login_doc,
        refresh_doc,
        logout_doc,
        me_doc,
        create_user_doc,
        list_users_doc,
        get_user_doc,
        change_password_doc,
        delete_user_doc,
        health_doc
    ),
    components(
        schemas(
            // auth
            LoginRequest,
            RefreshRequest,
            TokenPair,
            // users
            RegisterUser,
            ChangePasswordRequest,
            UserResponse
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Auth", description = "Login, token refresh and logout"),
        (name = "Users", description = "Account registration and management"),
        (name = "System", description = "Service health")
    ),
    security(("BearerAuth" = []))
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();

        let mut bearer = Http::new(HttpAuthScheme::Bearer);
        bearer.bearer_format = Some("JWT".to_string());

        components.add_security_scheme("BearerAuth", SecurityScheme::Http(bearer));
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair for a new session", body = TokenPair),
        (status = 401, description = "Incorrect email or password")
    ),
    tag = "Auth",
    security(())
)]
fn login_doc() {}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Rotated token pair", body = TokenPair),
        (status = 401, description = "Invalid or expired refresh token")
    ),
    tag = "Auth",
    security(())
)]
fn refresh_doc() {}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "All sessions ended", body = serde_json::Value),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Auth"
)]
fn logout_doc() {}

#[utoipa::path(
    get,
    path = "/auth/me",
    responses((status = 200, description = "Authenticated user", body = UserResponse)),
    tag = "Auth"
)]
fn me_doc() {}

#[utoipa::path(
    post,
    path = "/users",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "User already exists")
    ),
    tag = "Users",
    security(())
)]
fn create_user_doc() {}

#[utoipa::path(
    get,
    path = "/users",
    responses((status = 200, body = [UserResponse])),
    tag = "Users",
    security(())
)]
fn list_users_doc() {}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, body = UserResponse),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(())
)]
fn get_user_doc() {}

#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 202, description = "Password changed; every session revoked", body = UserResponse),
        (status = 401, description = "Not authenticated or incorrect old password"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
fn change_password_doc() {}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
fn delete_user_doc() {}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, body = serde_json::Value)),
    tag = "System",
    security(())
)]
fn health_doc() {}
