//! Request gate: the axum adapter around [`LocaleResolver`].
//!
//! Every inbound request passes through [`locale_gate`] before reaching a
//! route handler. The gate reads the path, query, preference cookie and
//! `Accept-Language` header, asks the resolver for a decision, and either
//! forwards the request or answers with a temporary redirect.

use crate::error::AppError;
use crate::i18n::{locale_in_path, redirect_target, Decision, Locale, LocaleRequest, LocaleResolver};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::debug;

/// Name of the cookie that remembers the user's chosen locale.
pub const LOCALE_COOKIE: &str = "NEXT_LOCALE";

/// One year, in seconds.
pub const LOCALE_COOKIE_MAX_AGE: u64 = 31_536_000;

/// Locale routing middleware.
///
/// Install with `axum::middleware::from_fn_with_state(resolver, locale_gate)`.
/// On pass-through with a path locale, the [`Locale`] is inserted into the
/// request extensions for [`PageLocale`] to pick up.
pub async fn locale_gate(
    State(resolver): State<Arc<LocaleResolver>>,
    mut request: Request,
    next: Next,
) -> Response {
    let decision = {
        let headers = request.headers();
        let preference = preference_from_cookies(headers);
        let accept_language = headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok());

        resolver.resolve(&LocaleRequest {
            path: request.uri().path(),
            query: request.uri().query(),
            preference: preference.as_deref(),
            accept_language,
        })
    };

    match decision {
        Decision::Redirect { location, locale } => {
            debug!("Redirecting {} to {} ({})", request.uri(), location, locale);
            Redirect::temporary(&location).into_response()
        }
        Decision::PassThrough { locale } => {
            if let Some(locale) = locale {
                request.extensions_mut().insert(locale);
            }
            next.run(request).await
        }
    }
}

/// Read the locale preference from the `Cookie` header(s).
///
/// The raw value is returned even if it is not a supported locale; the
/// resolver decides whether to honour it.
pub fn preference_from_cookies(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, LOCALE_COOKIE)
}

/// First value of the cookie called `name` across all `Cookie` headers.
/// Non-UTF-8 headers are ignored.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
}

/// `Set-Cookie` value that persists `locale` as the preference.
pub fn preference_cookie(locale: Locale) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Lax",
        LOCALE_COOKIE,
        locale.code(),
        LOCALE_COOKIE_MAX_AGE
    )
}

/// Path to navigate to after switching to `target`.
///
/// The first `/<current>` occurrence is replaced with `/<target>`. A path
/// without a locale segment is prefixed instead.
pub fn switch_locale_path(path: &str, target: Locale) -> String {
    match locale_in_path(path) {
        Some(current) => path.replacen(
            &format!("/{}", current.code()),
            &format!("/{}", target.code()),
            1,
        ),
        None => redirect_target(target, path, None),
    }
}

/// Extractor for the locale the gate attached to a page request.
///
/// Rejects with 404 when the path's first segment is not a supported locale
/// (for example `/favicon.ico` reaching a `/:lang` route).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLocale(pub Locale);

#[async_trait]
impl<S> FromRequestParts<S> for PageLocale
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Locale>()
            .copied()
            .map(PageLocale)
            .ok_or_else(|| AppError::NotFound(format!("No page at {}", parts.uri.path())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookies(values: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(header::COOKIE, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    // ==================== Cookie Parsing Tests ====================

    #[test]
    fn test_preference_found_among_other_cookies() {
        let headers = headers_with_cookies(&["session=abc; NEXT_LOCALE=th; theme=dark"]);
        assert_eq!(preference_from_cookies(&headers), Some("th".to_string()));
    }

    #[test]
    fn test_preference_across_multiple_cookie_headers() {
        let headers = headers_with_cookies(&["a=1", "NEXT_LOCALE=en"]);
        assert_eq!(preference_from_cookies(&headers), Some("en".to_string()));
    }

    #[test]
    fn test_invalid_preference_value_is_returned_raw() {
        let headers = headers_with_cookies(&["NEXT_LOCALE=klingon"]);
        assert_eq!(preference_from_cookies(&headers), Some("klingon".to_string()));
    }

    #[test]
    fn test_no_preference_cookie() {
        assert_eq!(preference_from_cookies(&HeaderMap::new()), None);
        let headers = headers_with_cookies(&["NEXT_LOCALE_OLD=th; garbage"]);
        assert_eq!(preference_from_cookies(&headers), None);
    }

    #[test]
    fn test_non_utf8_cookie_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.append(
            header::COOKIE,
            HeaderValue::from_bytes(b"NEXT_LOCALE=\xff").unwrap(),
        );
        assert_eq!(preference_from_cookies(&headers), None);
    }

    #[test]
    fn test_cookie_value_by_name() {
        let headers = headers_with_cookies(&["NEXT_LOCALE=en; meet365_session=0a1b2c"]);
        assert_eq!(
            cookie_value(&headers, "meet365_session"),
            Some("0a1b2c".to_string())
        );
        assert_eq!(cookie_value(&headers, "meet365"), None);
    }

    // ==================== Cookie Writing Tests ====================

    #[test]
    fn test_preference_cookie_attributes() {
        let cookie = preference_cookie(Locale::Thai);
        assert!(cookie.starts_with("NEXT_LOCALE=th;"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=31536000"));
    }

    // ==================== Locale Switch Tests ====================

    #[test]
    fn test_switch_replaces_current_segment() {
        assert_eq!(
            switch_locale_path("/ko/customers/CUST-001", Locale::Thai),
            "/th/customers/CUST-001"
        );
        assert_eq!(switch_locale_path("/en", Locale::Korean), "/ko");
    }

    #[test]
    fn test_switch_only_replaces_first_occurrence() {
        assert_eq!(
            switch_locale_path("/en/customers/en", Locale::Thai),
            "/th/customers/en"
        );
    }

    #[test]
    fn test_switch_on_unprefixed_path_prefixes() {
        assert_eq!(switch_locale_path("/customers", Locale::English), "/en/customers");
        assert_eq!(switch_locale_path("/", Locale::English), "/en");
    }
}
