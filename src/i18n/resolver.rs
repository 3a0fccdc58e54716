//! Locale resolution: decides, for one request, which locale applies and
//! whether the client must be redirected to a locale-prefixed path.
//!
//! Everything here is pure and framework-free. The axum adapter lives in
//! [`crate::gate`].

use crate::i18n::{Locale, LocaleRegistry};

/// Path prefixes that are never locale-rewritten unless configured otherwise.
pub const DEFAULT_EXCLUDED_PREFIXES: &[&str] = &["/static", "/api", "/health"];

/// The parts of an inbound request that locale resolution looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocaleRequest<'a> {
    /// Request path, always starting with `/`
    pub path: &'a str,

    /// Raw query string without the leading `?`
    pub query: Option<&'a str>,

    /// Value of the locale preference cookie, possibly invalid
    pub preference: Option<&'a str>,

    /// Raw `Accept-Language` header value, possibly malformed
    pub accept_language: Option<&'a str>,
}

/// Outcome of resolving one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Forward the request unchanged.
    ///
    /// `locale` is set when the path already carries a locale segment and is
    /// `None` for excluded paths.
    PassThrough { locale: Option<Locale> },

    /// Temporarily redirect to `location`: the original path and query
    /// prefixed with `/<locale>`, or a locale-prefixed path with its trailing
    /// slash removed.
    Redirect { locale: Locale, location: String },
}

impl Decision {
    pub fn is_redirect(&self) -> bool {
        matches!(self, Decision::Redirect { .. })
    }

    /// The locale the decision settled on, if any.
    pub fn locale(&self) -> Option<Locale> {
        match self {
            Decision::PassThrough { locale } => *locale,
            Decision::Redirect { locale, .. } => Some(*locale),
        }
    }
}

/// Paths that bypass locale routing.
///
/// A path is excluded when it starts with one of the prefixes (plain string
/// prefix, so `/api` also covers `/apidocs`) or contains a `.` anywhere,
/// which marks it as a static file request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedPaths {
    prefixes: Vec<String>,
}

impl ExcludedPaths {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        path.contains('.')
            || self
                .prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

impl Default for ExcludedPaths {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_PREFIXES.iter().copied())
    }
}

/// Resolves requests against the locale registry and a set of excluded paths.
#[derive(Debug, Clone, Default)]
pub struct LocaleResolver {
    excluded: ExcludedPaths,
}

impl LocaleResolver {
    pub fn new(excluded: ExcludedPaths) -> Self {
        Self { excluded }
    }

    /// Compute the decision for one request.
    ///
    /// Priority (first match wins):
    /// 1. path already locale-prefixed → pass through with that locale, or
    ///    redirect to the same path without its trailing slash
    /// 2. excluded path → pass through, unresolved
    /// 3. otherwise redirect to the effective locale
    ///    (preference, then Accept-Language, then default)
    pub fn resolve(&self, request: &LocaleRequest<'_>) -> Decision {
        if let Some(locale) = locale_in_path(request.path) {
            if request.path.ends_with('/') {
                let mut location = request.path.trim_end_matches('/').to_string();
                push_query(&mut location, request.query);
                return Decision::Redirect { locale, location };
            }

            return Decision::PassThrough {
                locale: Some(locale),
            };
        }

        if self.excluded.is_excluded(request.path) {
            return Decision::PassThrough { locale: None };
        }

        let locale = effective_locale(request.preference, request.accept_language);
        Decision::Redirect {
            locale,
            location: redirect_target(locale, request.path, request.query),
        }
    }
}

/// The locale carried by the first path segment, if the path is exactly
/// `/<code>` or starts with `/<code>/`.
pub fn locale_in_path(path: &str) -> Option<Locale> {
    let rest = path.strip_prefix('/')?;
    let segment = rest.split('/').next().unwrap_or(rest);
    Locale::from_code(segment).ok()
}

/// Pick the first supported locale from an `Accept-Language` value.
///
/// Each comma-separated entry is cut at `;`, trimmed and truncated to two
/// characters. Quality values are not consulted: the first listed entry that
/// matches wins. Unparseable entries are skipped.
pub fn preferred_from_accept_language(header: &str) -> Option<Locale> {
    let registry = LocaleRegistry::get();

    header
        .split(',')
        .map(|entry| first_two_chars(entry.split(';').next().unwrap_or(entry).trim()))
        .find_map(|candidate| {
            registry
                .get_by_code(candidate)
                .map(|config| config.locale)
        })
}

/// Choose the locale for a request that has none in its path.
pub fn effective_locale(preference: Option<&str>, accept_language: Option<&str>) -> Locale {
    preference
        .and_then(|code| Locale::from_code(code).ok())
        .or_else(|| accept_language.and_then(preferred_from_accept_language))
        .unwrap_or_else(Locale::default_locale)
}

/// Build `/<locale><path>[?query]`. Trailing slashes are dropped, so the bare
/// root maps to `/<locale>` and `/customers/` to `/<locale>/customers`.
pub fn redirect_target(locale: Locale, path: &str, query: Option<&str>) -> String {
    let mut location = format!("/{}", locale.code());

    let path = path.trim_end_matches('/');
    if !path.is_empty() {
        if !path.starts_with('/') {
            location.push('/');
        }
        location.push_str(path);
    }

    push_query(&mut location, query);
    location
}

fn push_query(location: &mut String, query: Option<&str>) {
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        location.push('?');
        location.push_str(query);
    }
}

fn first_two_chars(s: &str) -> &str {
    match s.char_indices().nth(2) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn request<'a>(
        path: &'a str,
        preference: Option<&'a str>,
        accept_language: Option<&'a str>,
    ) -> LocaleRequest<'a> {
        LocaleRequest {
            path,
            query: None,
            preference,
            accept_language,
        }
    }

    fn resolve(request: LocaleRequest<'_>) -> Decision {
        LocaleResolver::default().resolve(&request)
    }

    // ==================== Scenario Tests ====================

    #[test]
    fn test_unprefixed_path_redirects_using_header() {
        let decision = resolve(request("/customers/42", None, Some("en")));
        assert_eq!(
            decision,
            Decision::Redirect {
                locale: Locale::English,
                location: "/en/customers/42".to_string(),
            }
        );
    }

    #[test]
    fn test_prefixed_path_passes_through() {
        let decision = resolve(request("/en/customers/42", Some("th"), Some("ko")));
        assert_eq!(
            decision,
            Decision::PassThrough {
                locale: Some(Locale::English)
            }
        );
    }

    #[test]
    fn test_bare_locale_path_passes_through() {
        let decision = resolve(request("/th", None, None));
        assert_eq!(decision.locale(), Some(Locale::Thai));
        assert!(!decision.is_redirect());
    }

    #[test]
    fn test_locale_lookalike_segment_is_not_a_prefix() {
        // "/english" starts with "/en" but not "/en/"
        let decision = resolve(request("/english", None, Some("th")));
        assert_eq!(
            decision,
            Decision::Redirect {
                locale: Locale::Thai,
                location: "/th/english".to_string(),
            }
        );
    }

    #[test]
    fn test_prefixed_trailing_slash_redirects_to_trimmed_path() {
        let decision = resolve(request("/ko/", Some("th"), None));
        assert_eq!(
            decision,
            Decision::Redirect {
                locale: Locale::Korean,
                location: "/ko".to_string(),
            }
        );

        let decision = LocaleResolver::default().resolve(&LocaleRequest {
            path: "/ko/customers/",
            query: Some("grade=A"),
            preference: None,
            accept_language: None,
        });
        assert_eq!(
            decision,
            Decision::Redirect {
                locale: Locale::Korean,
                location: "/ko/customers?grade=A".to_string(),
            }
        );
    }

    #[test]
    fn test_unprefixed_trailing_slash_redirects_in_one_hop() {
        let decision = resolve(request("/customers/", None, Some("en")));
        assert_eq!(
            decision,
            Decision::Redirect {
                locale: Locale::English,
                location: "/en/customers".to_string(),
            }
        );
    }

    #[test]
    fn test_favicon_passes_through() {
        let decision = resolve(request("/favicon.ico", None, Some("en")));
        assert_eq!(decision, Decision::PassThrough { locale: None });
    }

    #[test]
    fn test_root_redirects_without_trailing_slash() {
        let decision = resolve(request("/", None, None));
        assert_eq!(
            decision,
            Decision::Redirect {
                locale: Locale::Korean,
                location: "/ko".to_string(),
            }
        );
    }

    #[test]
    fn test_query_string_is_preserved() {
        let decision = LocaleResolver::default().resolve(&LocaleRequest {
            path: "/customers",
            query: Some("grade=A&status=active"),
            preference: Some("th"),
            accept_language: None,
        });
        assert_eq!(
            decision,
            Decision::Redirect {
                locale: Locale::Thai,
                location: "/th/customers?grade=A&status=active".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_query_adds_no_question_mark() {
        assert_eq!(redirect_target(Locale::English, "/a", Some("")), "/en/a");
    }

    // ==================== Priority Tests ====================

    #[test]
    fn test_preference_beats_accept_language() {
        let decision = resolve(request("/customers", Some("th"), Some("en,ko")));
        assert_eq!(decision.locale(), Some(Locale::Thai));
    }

    #[test]
    fn test_invalid_preference_falls_through_to_header() {
        let decision = resolve(request("/customers", Some("TH"), Some("en")));
        assert_eq!(decision.locale(), Some(Locale::English));
    }

    #[test]
    fn test_first_listed_wins_over_quality_weight() {
        let decision = resolve(request("/", None, Some("th;q=0.5,en;q=0.9")));
        assert_eq!(decision.locale(), Some(Locale::Thai));
    }

    #[test]
    fn test_unparseable_header_falls_back_to_default() {
        let decision = resolve(request("/", None, Some(";;;, ,=q,*")));
        assert_eq!(decision.locale(), Some(Locale::Korean));
    }

    #[test]
    fn test_no_inputs_falls_back_to_default() {
        let decision = resolve(request("/customers", None, None));
        assert_eq!(decision.locale(), Some(Locale::default_locale()));
    }

    // ==================== Accept-Language Parsing Tests ====================

    #[test]
    fn test_region_subtag_is_truncated() {
        assert_eq!(
            preferred_from_accept_language("en-US,en;q=0.9"),
            Some(Locale::English)
        );
        assert_eq!(
            preferred_from_accept_language("th-TH"),
            Some(Locale::Thai)
        );
    }

    #[test]
    fn test_unsupported_entries_are_skipped() {
        assert_eq!(
            preferred_from_accept_language("fr-FR, de;q=0.8, ko;q=0.1"),
            Some(Locale::Korean)
        );
    }

    #[test]
    fn test_uppercase_subtag_is_not_normalized() {
        assert_eq!(preferred_from_accept_language("EN-us"), None);
    }

    #[test]
    fn test_multibyte_header_does_not_panic() {
        assert_eq!(preferred_from_accept_language("한국어,ไทย,é"), None);
    }

    #[test]
    fn test_empty_header() {
        assert_eq!(preferred_from_accept_language(""), None);
    }

    // ==================== Exclusion Tests ====================

    #[test]
    fn test_default_exclusions() {
        let excluded = ExcludedPaths::default();
        assert!(excluded.is_excluded("/api/customers"));
        assert!(excluded.is_excluded("/static/app.css"));
        assert!(excluded.is_excluded("/health"));
        assert!(excluded.is_excluded("/robots.txt"));
        assert!(excluded.is_excluded("/customers/v1.2"));
        assert!(!excluded.is_excluded("/customers/42"));
        assert!(!excluded.is_excluded("/"));
    }

    #[test]
    fn test_custom_exclusions() {
        let resolver = LocaleResolver::new(ExcludedPaths::new(["/_next"]));
        let decision = resolver.resolve(&request("/_next/chunk", None, None));
        assert_eq!(decision, Decision::PassThrough { locale: None });

        let decision = resolver.resolve(&request("/api/customers", None, None));
        assert!(decision.is_redirect());
    }

    // ==================== Property Tests ====================

    fn any_locale() -> impl Strategy<Value = Locale> {
        prop::sample::select(Locale::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_prefixed_paths_always_pass_through(
            locale in any_locale(),
            tail in "(/[a-z0-9_-]{1,8}){0,4}",
            preference in proptest::option::of("[a-zA-Z]{0,3}"),
            header in proptest::option::of(".{0,20}"),
        ) {
            let path = format!("/{}{}", locale.code(), tail);
            let decision = resolve(request(&path, preference.as_deref(), header.as_deref()));
            prop_assert_eq!(decision, Decision::PassThrough { locale: Some(locale) });
        }

        #[test]
        fn prop_redirect_target_is_stable(
            path in "(/[a-z0-9_-]{1,8}){0,4}/?",
            header in proptest::option::of(".{0,20}"),
        ) {
            let path = if path.is_empty() { "/".to_string() } else { path };
            let first = resolve(request(&path, None, header.as_deref()));
            if let Decision::Redirect { locale, location } = first {
                let second = resolve(request(&location, None, header.as_deref()));
                prop_assert_eq!(second, Decision::PassThrough { locale: Some(locale) });
            }
        }

        #[test]
        fn prop_excluded_paths_ignore_headers_and_cookies(
            prefix in prop::sample::select(DEFAULT_EXCLUDED_PREFIXES.to_vec()),
            tail in "[a-z/]{0,12}",
            preference in proptest::option::of("(ko|th|en)"),
            header in proptest::option::of("(ko|th|en)"),
        ) {
            let path = format!("{prefix}{tail}");
            let decision = resolve(request(&path, preference.as_deref(), header.as_deref()));
            prop_assert_eq!(decision, Decision::PassThrough { locale: None });
        }

        #[test]
        fn prop_accept_language_never_panics(header in ".{0,64}") {
            let _ = preferred_from_accept_language(&header);
        }
    }
}
