//! Locale type: closed set of UI locales, validated against the registry.

use crate::i18n::{LocaleConfig, LocaleRegistry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A supported UI locale.
///
/// Serializes as its short code (`"ko"`, `"th"`, `"en"`), which is also the
/// form used in URL paths and in the preference cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "th")]
    Thai,
    #[serde(rename = "en")]
    English,
}

/// Returned when a string is not one of the registered locale codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported locale code: '{0}'")]
pub struct UnsupportedLocale(pub String);

impl Locale {
    /// Every locale, in registry order.
    pub const ALL: [Locale; 3] = [Locale::Korean, Locale::Thai, Locale::English];

    /// Create a Locale from its exact short code.
    ///
    /// Matching is case-sensitive and does not strip region subtags:
    /// `"en-US"` and `"EN"` are both rejected.
    pub fn from_code(code: &str) -> Result<Locale, UnsupportedLocale> {
        LocaleRegistry::get()
            .get_by_code(code)
            .map(|config| config.locale)
            .ok_or_else(|| UnsupportedLocale(code.to_string()))
    }

    /// The registry's default locale.
    pub fn default_locale() -> Locale {
        LocaleRegistry::get().default_locale()
    }

    /// The short code (e.g., "ko").
    pub fn code(&self) -> &'static str {
        match self {
            Locale::Korean => "ko",
            Locale::Thai => "th",
            Locale::English => "en",
        }
    }

    /// The full registry entry for this locale.
    pub fn config(&self) -> &'static LocaleConfig {
        // Registry rows are in variant declaration order.
        &LocaleRegistry::get().list()[*self as usize]
    }

    /// Label shown in the locale switcher.
    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    /// Whether this is the default locale.
    pub fn is_default(&self) -> bool {
        self.config().is_default
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::default_locale()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::from_code(s)
    }
}
