//! Dictionary validation.
//!
//! Run at startup to catch a registry/dictionary mismatch before the first
//! request does. A locale whose dictionary cannot be loaded, or that has empty
//! strings or mismatched placeholders, is reported as an error. Strings that are
//! identical to the default locale's are reported as warnings, since they may
//! be untranslated.

use crate::i18n::{Dictionary, DictionaryLoader, Locale, LocaleRegistry};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Validation report containing errors and warnings about the dictionary set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    /// Problems that make a dictionary unusable
    pub errors: Vec<String>,

    /// Possible quality issues
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

/// Validator for the registered locales' dictionaries.
pub struct DictionaryValidator;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

impl DictionaryValidator {
    /// Load every registered locale and check it against the default locale.
    pub async fn validate_all(loader: &DictionaryLoader) -> ValidationReport {
        let mut report = ValidationReport::new();
        let registry = LocaleRegistry::get();
        let default = registry.default_locale();

        let reference = match loader.load(default).await {
            Ok(dictionary) => dictionary,
            Err(e) => {
                report.errors.push(e.to_string());
                return report;
            }
        };
        Self::check_values(default, &reference, &mut report);

        for config in registry.list().iter().filter(|c| c.locale != default) {
            match loader.load(config.locale).await {
                Ok(dictionary) => {
                    Self::check_values(config.locale, &dictionary, &mut report);
                    Self::compare(config.locale, &reference, &dictionary, &mut report);
                }
                Err(e) => report.errors.push(e.to_string()),
            }
        }

        report
    }

    /// Check one dictionary for empty strings.
    pub fn check_values(locale: Locale, dictionary: &Dictionary, report: &mut ValidationReport) {
        for (path, text) in dictionary.entries() {
            if text.trim().is_empty() {
                report
                    .errors
                    .push(format!("[{}] '{}' is empty", locale, path));
            }
        }
    }

    /// Compare a translated dictionary with the reference (default) one.
    pub fn compare(
        locale: Locale,
        reference: &Dictionary,
        translated: &Dictionary,
        report: &mut ValidationReport,
    ) {
        if reference.key_paths() != translated.key_paths() {
            report
                .errors
                .push(format!("[{}] key set differs from the default locale", locale));
            return;
        }

        for ((path, original), (_, text)) in reference.entries().iter().zip(translated.entries()) {
            let expected = Self::extract_placeholders(original);
            let found = Self::extract_placeholders(&text);
            if expected != found {
                report.errors.push(format!(
                    "[{}] '{}' placeholder mismatch: expected {:?}, found {:?}",
                    locale, path, expected, found
                ));
            }

            if *original == text {
                report
                    .warnings
                    .push(format!("[{}] '{}' matches the default locale", locale, path));
            }
        }
    }

    /// Extract `{name}` placeholders from a template string.
    pub fn extract_placeholders(text: &str) -> BTreeSet<String> {
        let regex = PLACEHOLDER_REGEX
            .get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"));
        regex
            .captures_iter(text)
            .map(|cap| cap[1].to_string())
            .collect()
    }
}
