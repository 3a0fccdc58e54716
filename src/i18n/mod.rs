//! Internationalization (i18n) module for the localized UI.
//!
//! All locale-related logic lives here: which locales exist, how a request's
//! locale is decided, and how a locale's translated strings are loaded.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for all supported locales
//! - `locale`: Type-safe `Locale` enum
//! - `resolver`: Pure request → [`Decision`] resolution
//! - `dictionary`: Translation tables and their loader/cache
//! - `validator`: Startup consistency checks across dictionaries
//!
//! # Example
//!
//! ```rust,ignore
//! use meet365_crm::i18n::{LocaleRequest, LocaleResolver, Decision};
//!
//! let decision = LocaleResolver::default().resolve(&LocaleRequest {
//!     path: "/customers/42",
//!     accept_language: Some("en"),
//!     ..Default::default()
//! });
//! assert!(decision.is_redirect());
//! ```

mod dictionary;
mod locale;
mod registry;
mod resolver;
mod validator;

pub use dictionary::{
    ActivityStrings, ActivityTypeStrings, AuthStrings, BusinessTypeStrings, CommonStrings,
    ContactStrings, CustomerStrings, Dictionary, DictionaryCache, DictionaryError,
    DictionaryLoader, DictionarySource, GradeStrings, StatusStrings,
};
pub use locale::{Locale, UnsupportedLocale};
pub use registry::{default_locale, is_supported, LocaleConfig, LocaleRegistry};
pub use resolver::{
    effective_locale, locale_in_path, preferred_from_accept_language, redirect_target, Decision,
    ExcludedPaths, LocaleRequest, LocaleResolver, DEFAULT_EXCLUDED_PREFIXES,
};
pub use validator::{DictionaryValidator, ValidationReport};
