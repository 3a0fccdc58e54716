//! Locale registry: single source of truth for all supported UI locales.
//!
//! The registry is an immutable static table. It is never mutated after
//! compilation, so every lookup is a pure function over a fixed set.

use crate::i18n::Locale;

/// Configuration for a supported locale.
///
/// Contains the metadata the presentation layer needs to render a locale
/// switcher, plus whether the locale is the designated default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleConfig {
    /// The locale this entry describes
    pub locale: Locale,

    /// Short code used in URL paths and the preference cookie (e.g., "ko")
    pub code: &'static str,

    /// English name of the locale (e.g., "Korean", "Thai")
    pub name: &'static str,

    /// Label shown in the locale switcher (e.g., "한국어", "ไทย", "EN")
    pub native_name: &'static str,

    /// Whether this is the default locale (exactly one entry is)
    pub is_default: bool,
}

/// The locale registry.
///
/// Obtain it through [`LocaleRegistry::get`]; the backing table is a
/// `static`, so the returned reference lives for the whole process.
#[derive(Debug)]
pub struct LocaleRegistry {
    locales: &'static [LocaleConfig],
}

static REGISTRY: LocaleRegistry = LocaleRegistry { locales: &LOCALES };

/// Supported locales, in switcher display order.
static LOCALES: [LocaleConfig; 3] = [
    LocaleConfig {
        locale: Locale::Korean,
        code: "ko",
        name: "Korean",
        native_name: "한국어",
        is_default: true,
    },
    LocaleConfig {
        locale: Locale::Thai,
        code: "th",
        name: "Thai",
        native_name: "ไทย",
        is_default: false,
    },
    LocaleConfig {
        locale: Locale::English,
        code: "en",
        name: "English",
        native_name: "EN",
        is_default: false,
    },
];

impl LocaleRegistry {
    /// Get the locale registry.
    pub fn get() -> &'static LocaleRegistry {
        &REGISTRY
    }

    /// Get a locale configuration by its code.
    ///
    /// Matching is exact and case-sensitive: `"KO"` and `"k"` are not found.
    pub fn get_by_code(&self, code: &str) -> Option<&'static LocaleConfig> {
        self.locales.iter().find(|config| config.code == code)
    }

    /// Check whether `code` is exactly one of the registered locale codes.
    pub fn is_supported(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }

    /// All registered locales, in display order.
    pub fn list(&self) -> &'static [LocaleConfig] {
        self.locales
    }

    /// The designated default locale.
    ///
    /// # Panics
    /// Panics if the static table does not mark exactly one default. The
    /// table is a compile-time constant and the unit tests pin it, so this
    /// cannot happen in a released build.
    pub fn default_locale(&self) -> Locale {
        let mut defaults = self.locales.iter().filter(|config| config.is_default);

        match (defaults.next(), defaults.next()) {
            (Some(config), None) => config.locale,
            (None, _) => panic!("No default locale found in registry"),
            (Some(_), Some(_)) => panic!("Multiple default locales found in registry"),
        }
    }
}

/// Shorthand for `LocaleRegistry::get().is_supported(code)`.
pub fn is_supported(code: &str) -> bool {
    LocaleRegistry::get().is_supported(code)
}

/// Shorthand for `LocaleRegistry::get().default_locale()`.
pub fn default_locale() -> Locale {
    LocaleRegistry::get().default_locale()
}
