//! JSON API under `/api`. The locale gate never rewrites these paths.

use crate::app::{session_token, AppState, SignedIn};
use crate::auth::{cleared_session_cookie, session_cookie, User};
use crate::crm::{
    filter_customers, seed_customers, Activity, ActivityInput, ActivityType, Customer,
    CustomerInput, CustomerPatch, DEFAULT_ACTIVITY_LIMIT,
};
use crate::error::{AppError, AppResult};
use crate::gate::{preference_cookie, switch_locale_path};
use crate::i18n::Locale;
use crate::pages::ListParams;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

// ==================== Dictionaries & Locale ====================

/// `GET /api/dictionaries/:lang`
pub async fn get_dictionary(
    State(state): State<AppState>,
    Path(lang): Path<String>,
) -> AppResult<Response> {
    let locale = Locale::from_code(&lang)?;
    let dictionary = state.dictionaries.get(locale).await?;
    Ok(Json(&*dictionary).into_response())
}

#[derive(Debug, Deserialize)]
pub struct LocaleSwitch {
    pub locale: String,
    pub path: String,
}

/// `POST /api/locale`: persist the preference and say where to navigate.
pub async fn switch_locale(Json(body): Json<LocaleSwitch>) -> AppResult<Response> {
    let locale = Locale::from_code(&body.locale)?;
    let path = switch_locale_path(&body.path, locale);

    Ok((
        [(header::SET_COOKIE, preference_cookie(locale))],
        Json(json!({ "path": path })),
    )
        .into_response())
}

// ==================== Auth ====================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub credential: String,
}

/// `POST /api/auth/login`: opens a session and sets its cookie.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Response> {
    let session = state.auth.sign_in(body.credential).await?;

    Ok((
        [(header::SET_COOKIE, session_cookie(&session.token))],
        Json(session.user),
    )
        .into_response())
}

/// `POST /api/auth/logout`: ends the caller's session only.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.auth.sign_out(&token).await;
    }

    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, cleared_session_cookie())],
    )
        .into_response()
}

/// `GET /api/auth/me`
pub async fn me(SignedIn(user): SignedIn) -> Json<User> {
    Json(user)
}

// ==================== Customers ====================

/// `GET /api/customers?search=&grade=&status=`
pub async fn list_customers(
    State(state): State<AppState>,
    SignedIn(_user): SignedIn,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<Customer>>> {
    let customers = state.store.list_customers(params.query()?).await?;
    Ok(Json(filter_customers(customers, params.search())))
}

/// `POST /api/customers`
pub async fn create_customer(
    State(state): State<AppState>,
    SignedIn(user): SignedIn,
    Json(mut input): Json<CustomerInput>,
) -> AppResult<Response> {
    input.normalize();
    input.validate()?;

    let customer_id = state.store.create_customer(input, user.uid.clone()).await?;
    info!("Customer {} created by {}", customer_id, user.uid);

    Ok((StatusCode::CREATED, Json(json!({ "customerId": customer_id }))).into_response())
}

/// `GET /api/customers/:id`
pub async fn get_customer(
    State(state): State<AppState>,
    SignedIn(_user): SignedIn,
    Path(customer_id): Path<String>,
) -> AppResult<Json<Customer>> {
    state
        .store
        .get_customer(customer_id.clone())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Customer '{}'", customer_id)))
}

/// `PATCH /api/customers/:id`
pub async fn update_customer(
    State(state): State<AppState>,
    SignedIn(user): SignedIn,
    Path(customer_id): Path<String>,
    Json(patch): Json<CustomerPatch>,
) -> AppResult<Json<Customer>> {
    patch.validate()?;
    let customer = state.store.update_customer(customer_id, patch, user.uid).await?;
    Ok(Json(customer))
}

// ==================== Activities ====================

#[derive(Debug, Deserialize)]
pub struct ActivityParams {
    pub limit: Option<usize>,
}

/// `GET /api/customers/:id/activities?limit=`
pub async fn list_activities(
    State(state): State<AppState>,
    SignedIn(_user): SignedIn,
    Path(customer_id): Path<String>,
    Query(params): Query<ActivityParams>,
) -> AppResult<Json<Vec<Activity>>> {
    let limit = params.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    Ok(Json(state.store.list_activities(customer_id, limit).await?))
}

/// Activity as posted from the memo dialog. Duration is entered in minutes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub phone: Option<String>,
    pub contact_name: Option<String>,
    pub duration_minutes: Option<u32>,
    pub memo: String,
}

impl NewActivity {
    pub fn into_input(self, customer_id: String) -> ActivityInput {
        ActivityInput {
            customer_id,
            activity_type: self.activity_type,
            phone: self.phone,
            contact_name: self.contact_name,
            duration: self.duration_minutes.map(|m| m.saturating_mul(60)),
            memo: self.memo,
        }
    }
}

/// `POST /api/customers/:id/activities`
pub async fn create_activity(
    State(state): State<AppState>,
    SignedIn(user): SignedIn,
    Path(customer_id): Path<String>,
    Json(body): Json<NewActivity>,
) -> AppResult<Response> {
    if state.store.get_customer(customer_id.clone()).await?.is_none() {
        return Err(AppError::NotFound(format!("Customer '{}'", customer_id)));
    }

    let input = body.into_input(customer_id);
    input.validate()?;

    let id = state.store.create_activity(input, user.uid).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
}

// ==================== Seed ====================

/// `POST /api/seed`
pub async fn seed(State(state): State<AppState>, SignedIn(user): SignedIn) -> AppResult<Response> {
    let count = seed_customers(state.store.as_ref(), &user.uid).await?;

    Ok(Json(json!({ "seeded": count })).into_response())
}
