//! Router assembly and the protected application routes.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use orggate_access::AuthorizedIdentity;
use orggate_core::SessionId;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState, RequireSession};

const HOME_PATH: &str = "/";
const ME_PATH: &str = "/api/me";
const ADMIN_PATH: &str = "/admin";
const LOGOUT_PATH: &str = "/auth/logout";

/// Paths routed by the application itself; the configured login and
/// callback paths must not collide with them.
pub const RESERVED_PATHS: [&str; 4] = [HOME_PATH, ME_PATH, ADMIN_PATH, LOGOUT_PATH];

/// Builds the application router.
///
/// The login route sits outside the authentication middleware; everything
/// else, including the callback and the fallback, sits behind it.
pub fn router(state: AppState) -> Router {
    let endpoints = state.auth.endpoints.clone();

    let protected = Router::new()
        .route(HOME_PATH, get(home))
        .route(ME_PATH, get(me))
        .route(ADMIN_PATH, get(admin))
        .route(endpoints.callback_path(), get(auth::callback))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        .route(endpoints.login_path(), get(auth::login))
        .route(LOGOUT_PATH, get(auth::logout))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn home(RequireSession(session): RequireSession) -> String {
    let identity = session.identity().identity();
    let name = identity.display_name().unwrap_or(identity.username());
    match session.roles() {
        Some(roles) => format!("Hello, {name}. Roles: {}", roles.as_slice().join(", ")),
        None => format!("Hello, {name}."),
    }
}

#[derive(Debug, Serialize)]
struct MeResponse<'a> {
    session: SessionId,
    #[serde(flatten)]
    identity: &'a AuthorizedIdentity,
    expires_at: DateTime<Utc>,
}

async fn me(RequireSession(session): RequireSession) -> Response {
    Json(MeResponse {
        session: session.id(),
        identity: session.identity(),
        expires_at: session.expires_at(),
    })
    .into_response()
}

async fn admin(RequireSession(session): RequireSession) -> Response {
    if !session.has_role("admin") {
        return (StatusCode::FORBIDDEN, "Admin role required").into_response();
    }
    format!("Welcome, {}.", session.identity().identity().username()).into_response()
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}
