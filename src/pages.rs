//! Locale-prefixed page routes.
//!
//! Each handler returns a JSON page model: the locale's dictionary plus the
//! data that screen renders. The gate has already guaranteed the path starts
//! with a supported locale, which [`PageLocale`] picks up.

use crate::app::{AppState, SignedIn};
use crate::auth::User;
use crate::crm::{
    contact_rows, filter_customers, last_call_label, ActivityRow, ContactRow, Customer,
    CustomerCard, CustomerGrade, CustomerInput, CustomerQuery, CustomerStatus,
    DEFAULT_ACTIVITY_LIMIT,
};
use crate::error::{AppError, AppResult};
use crate::gate::PageLocale;
use crate::i18n::{Dictionary, Locale, LocaleRegistry};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Entry in the language switcher.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleOption {
    pub code: &'static str,
    pub native_name: &'static str,
    pub active: bool,
}

fn locale_options(current: Locale) -> Vec<LocaleOption> {
    LocaleRegistry::get()
        .list()
        .iter()
        .map(|config| LocaleOption {
            code: config.code,
            native_name: config.native_name,
            active: config.locale == current,
        })
        .collect()
}

/// `search`, `grade` and `status` as sent by the list screen's filter bar.
/// Empty values mean "all".
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub grade: Option<String>,
    pub status: Option<String>,
}

impl ListParams {
    pub fn query(&self) -> AppResult<CustomerQuery> {
        Ok(CustomerQuery {
            grade: non_empty(&self.grade).map(str::parse::<CustomerGrade>).transpose()?,
            status: non_empty(&self.status).map(str::parse::<CustomerStatus>).transpose()?,
        })
    }

    pub fn search(&self) -> &str {
        self.search.as_deref().unwrap_or("")
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListPage<'a> {
    locale: Locale,
    locales: Vec<LocaleOption>,
    dictionary: &'a Dictionary,
    user: User,
    search: &'a str,
    filters: CustomerQuery,
    customers: Vec<CustomerCard>,
}

/// `GET /:lang`
pub async fn customer_list(
    State(state): State<AppState>,
    PageLocale(locale): PageLocale,
    SignedIn(user): SignedIn,
    Query(params): Query<ListParams>,
) -> AppResult<Response> {
    let dictionary = state.dictionaries.get(locale).await?;
    let filters = params.query()?;

    let customers = state.store.list_customers(filters).await?;
    let cards: Vec<CustomerCard> = filter_customers(customers, params.search())
        .iter()
        .map(|customer| CustomerCard::new(customer, &dictionary, locale))
        .collect();

    Ok(Json(ListPage {
        locale,
        locales: locale_options(locale),
        dictionary: &dictionary,
        user,
        search: params.search(),
        filters,
        customers: cards,
    })
    .into_response())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetailPage<'a> {
    locale: Locale,
    locales: Vec<LocaleOption>,
    dictionary: &'a Dictionary,
    display_name: &'a str,
    customer: &'a Customer,
    contacts: Vec<ContactRow>,
    last_call: Option<String>,
    activities: Vec<ActivityRow>,
}

/// `GET /:lang/customers/:id`
pub async fn customer_detail(
    State(state): State<AppState>,
    PageLocale(locale): PageLocale,
    SignedIn(_user): SignedIn,
    Path((_lang, customer_id)): Path<(String, String)>,
) -> AppResult<Response> {
    let dictionary = state.dictionaries.get(locale).await?;

    let customer = state
        .store
        .get_customer(customer_id.clone())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Customer '{}'", customer_id)))?;

    let activities = state
        .store
        .list_activities(customer_id, DEFAULT_ACTIVITY_LIMIT)
        .await?;
    let last_call = last_call_label(&activities, Utc::now(), &dictionary);
    let activities = activities
        .into_iter()
        .map(|activity| ActivityRow::new(activity, &dictionary))
        .collect();

    Ok(Json(DetailPage {
        locale,
        locales: locale_options(locale),
        dictionary: &dictionary,
        display_name: customer.display_name(locale),
        customer: &customer,
        contacts: contact_rows(&customer.details.contacts, &dictionary),
        last_call,
        activities,
    })
    .into_response())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FormPage<'a> {
    locale: Locale,
    dictionary: &'a Dictionary,
    input: CustomerInput,
}

/// `GET /:lang/customers/new`
pub async fn new_customer(
    State(state): State<AppState>,
    PageLocale(locale): PageLocale,
    SignedIn(_user): SignedIn,
) -> AppResult<Response> {
    let dictionary = state.dictionaries.get(locale).await?;

    Ok(Json(FormPage {
        locale,
        dictionary: &dictionary,
        input: CustomerInput::blank(),
    })
    .into_response())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginPage<'a> {
    locale: Locale,
    locales: Vec<LocaleOption>,
    dictionary: &'a Dictionary,
    allowed_domain: &'a str,
    user: Option<User>,
}

/// `GET /:lang/login`. Reachable without signing in; `user` is set when the
/// request carries a live session.
pub async fn login(
    State(state): State<AppState>,
    PageLocale(locale): PageLocale,
    signed_in: Option<SignedIn>,
) -> AppResult<Response> {
    let dictionary = state.dictionaries.get(locale).await?;

    Ok(Json(LoginPage {
        locale,
        locales: locale_options(locale),
        dictionary: &dictionary,
        allowed_domain: state.auth.allowed_domain(),
        user: signed_in.map(|SignedIn(user)| user),
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::ValidationError;

    fn params(grade: Option<&str>, status: Option<&str>) -> ListParams {
        ListParams {
            search: None,
            grade: grade.map(String::from),
            status: status.map(String::from),
        }
    }

    #[test]
    fn test_empty_filters_mean_all() {
        let query = params(Some(""), Some("  ")).query().unwrap();
        assert_eq!(query, CustomerQuery::default());
    }

    #[test]
    fn test_filters_parse() {
        let query = params(Some("A"), Some("pending")).query().unwrap();
        assert_eq!(query.grade, Some(CustomerGrade::A));
        assert_eq!(query.status, Some(CustomerStatus::Pending));
    }

    #[test]
    fn test_unknown_filter_is_rejected() {
        let err = params(Some("Z"), None).query().unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::UnknownVariant { kind: "grade", .. })
        ));
    }

    #[test]
    fn test_locale_options_mark_current() {
        let options = locale_options(Locale::Thai);
        assert_eq!(options.len(), 3);
        let active: Vec<_> = options.iter().filter(|o| o.active).map(|o| o.code).collect();
        assert_eq!(active, vec!["th"]);
    }
}
