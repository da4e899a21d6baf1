use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

use crate::{
    config::Config,
    db::connection::{create_pool, run_migrations},
    docs::ApiDoc,
    handlers,
    middleware as app_middleware,
    repositories::{AuthStore, MemoryStore, PgStore},
    state::AppState,
    utils::time::Clock,
};

/// Opens the store selected by `DATABASE_URL`.
///
/// `memory://` gives a fresh in-process store; anything else is a Postgres
/// URL, migrated first when `RUN_MIGRATIONS` is set.
pub async fn connect_store(
    config: &Config,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<Arc<dyn AuthStore>> {
    if config.uses_memory_store() {
        tracing::warn!("Using the in-process memory store; data is lost on exit");
        return Ok(Arc::new(MemoryStore::new(clock)));
    }

    let pool = create_pool(config).await?;
    if config.run_migrations {
        run_migrations(&pool).await?;
        tracing::info!("Database migrations applied");
    }
    Ok(Arc::new(PgStore::new(pool)))
}

/// Assembles every route with the shared middleware stack.
pub fn build_router(state: AppState) -> Router {
    let require_auth =
        || axum_middleware::from_fn_with_state(state.clone(), app_middleware::auth);

    // Public routes (no auth)
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/users",
            post(handlers::create_user).get(handlers::list_users),
        )
        .route("/auth/login", post(handlers::login))
        .route("/auth/refresh", post(handlers::refresh));

    // GET stays public; PUT and DELETE require the owner's token.
    let user_routes = Router::new().route(
        "/users/{id}",
        get(handlers::get_user).merge(
            put(handlers::change_password)
                .delete(handlers::delete_user)
                .route_layer(require_auth()),
        ),
    );

    // Routes that act on the authenticated caller
    let session_routes = Router::new()
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/me", get(handlers::me))
        .route_layer(require_auth());

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(session_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PUT,
                            Method::DELETE,
                            Method::OPTIONS,
                        ])
                        .allow_headers(Any)
                        .max_age(std::time::Duration::from_secs(24 * 60 * 60)),
                )
                .layer(axum_middleware::from_fn(app_middleware::request_id))
                .layer(axum_middleware::from_fn(app_middleware::log_error_responses)),
        )
        .with_state(state)
}
