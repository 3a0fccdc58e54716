use crate::auth::{AuthGate, User, SESSION_COOKIE};
use crate::crm::CustomerStore;
use crate::error::{AppError, AppResult};
use crate::gate::{cookie_value, locale_gate};
use crate::i18n::{DictionaryCache, LocaleResolver};
use crate::{api, pages};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, Uri},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Everything a handler can reach. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CustomerStore>,
    pub auth: Arc<AuthGate>,
    pub dictionaries: Arc<DictionaryCache>,
    pub resolver: Arc<LocaleResolver>,
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/dictionaries/:lang", get(api::get_dictionary))
        .route("/locale", post(api::switch_locale))
        .route("/auth/login", post(api::login))
        .route("/auth/logout", post(api::logout))
        .route("/auth/me", get(api::me))
        .route(
            "/customers",
            get(api::list_customers).post(api::create_customer),
        )
        .route(
            "/customers/:id",
            get(api::get_customer).patch(api::update_customer),
        )
        .route(
            "/customers/:id/activities",
            get(api::list_activities).post(api::create_activity),
        )
        .route("/seed", post(api::seed));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .route("/:lang", get(pages::customer_list))
        .route("/:lang/login", get(pages::login))
        .route("/:lang/customers", get(pages::customer_list))
        .route("/:lang/customers/new", get(pages::new_customer))
        .route("/:lang/customers/:id", get(pages::customer_detail))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.resolver.clone(),
            locale_gate,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

/// Session token sent with the request, if any.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, SESSION_COOKIE).filter(|token| !token.is_empty())
}

/// The user whose session cookie came with this request. Rejects with 401
/// when the cookie is missing or names no live session.
#[derive(Debug, Clone)]
pub struct SignedIn(pub User);

#[async_trait]
impl FromRequestParts<AppState> for SignedIn {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> AppResult<Self> {
        let token = session_token(&parts.headers);
        Ok(SignedIn(state.auth.require_user(token.as_deref()).await?))
    }
}
