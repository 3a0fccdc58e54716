//! Dictionary loading: maps a resolved locale to its full translation table.
//!
//! Dictionaries are JSON documents with a fixed shape. Deserialization is
//! strict (no missing and no unknown keys), so a load either yields a complete
//! [`Dictionary`] or fails.

use crate::i18n::Locale;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::debug;

/// Errors raised while loading a dictionary.
#[derive(Debug, Error)]
pub enum DictionaryError {
    /// The locale has no backing resource. The registry and the dictionary
    /// set are out of sync; this is a configuration error.
    #[error("No dictionary for locale '{locale}' at {}", path.display())]
    Missing { locale: Locale, path: PathBuf },

    #[error("Failed to read dictionary for locale '{locale}': {source}")]
    Load {
        locale: Locale,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dictionary for locale '{locale}': {source}")]
    Parse {
        locale: Locale,
        #[source]
        source: serde_json::Error,
    },
}

impl DictionaryError {
    /// Whether this error means the deployment itself is misconfigured.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, DictionaryError::Missing { .. })
    }
}

/// The full set of translated UI strings for one locale.
///
/// Templated strings use `{count}` placeholders (`daysAgo`, `weeksAgo`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Dictionary {
    pub common: CommonStrings,
    pub auth: AuthStrings,
    pub customer: CustomerStrings,
    pub contact: ContactStrings,
    pub activity: ActivityStrings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommonStrings {
    pub app_name: String,
    pub loading: String,
    pub error: String,
    pub save: String,
    pub cancel: String,
    pub edit: String,
    pub delete: String,
    pub back: String,
    pub search: String,
    pub filter: String,
    pub all: String,
    pub no_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AuthStrings {
    pub login: String,
    pub logout: String,
    pub login_with_google: String,
    pub login_description: String,
    /// Shown when a sign-in is rejected by the email-domain allow-list
    pub domain_error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CustomerStrings {
    pub title: String,
    pub detail: String,
    pub info: String,
    pub code: String,
    #[serde(rename = "type")]
    pub business_type: String,
    pub grade: String,
    pub status: String,
    pub contacts: String,
    pub last_call: String,
    /// Placeholders: {count}
    pub days_ago: String,
    /// Placeholders: {count}
    pub weeks_ago: String,
    pub business_types: BusinessTypeStrings,
    pub statuses: StatusStrings,
    pub grades: GradeStrings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusinessTypeStrings {
    pub restaurant: String,
    pub hotel: String,
    pub catering: String,
    pub retail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusStrings {
    pub active: String,
    pub inactive: String,
    pub pending: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GradeStrings {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactStrings {
    pub primary: String,
    pub ordering: String,
    pub accounting: String,
    pub call: String,
    pub line: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ActivityStrings {
    pub title: String,
    pub add_memo: String,
    pub call_memo: String,
    pub duration: String,
    pub memo: String,
    pub types: ActivityTypeStrings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivityTypeStrings {
    pub call: String,
    pub visit: String,
    pub email: String,
    pub note: String,
}

impl Dictionary {
    /// Every leaf key as a dotted path (e.g., `customer.grades.A`), sorted.
    pub fn key_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        if let Ok(value) = serde_json::to_value(self) {
            collect_leaves(&value, String::new(), &mut |path, _| paths.push(path));
        }
        paths.sort();
        paths
    }

    /// Every leaf as `(dotted path, text)`, sorted by path.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries = Vec::new();
        if let Ok(value) = serde_json::to_value(self) {
            collect_leaves(&value, String::new(), &mut |path, text| {
                entries.push((path, text.to_string()))
            });
        }
        entries.sort();
        entries
    }
}

fn collect_leaves(value: &serde_json::Value, prefix: String, visit: &mut dyn FnMut(String, &str)) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                collect_leaves(child, path, visit);
            }
        }
        serde_json::Value::String(text) => visit(prefix, text),
        _ => {}
    }
}

/// Where dictionary documents come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictionarySource {
    /// JSON compiled into the binary from `dictionaries/`
    Embedded,

    /// `<dir>/<code>.json`, read on each load
    Directory(PathBuf),
}

/// Loads the dictionary for a locale from its source.
///
/// Loads are deterministic and side-effect free. Repeated calls for the same
/// locale return content-identical dictionaries.
#[derive(Debug, Clone)]
pub struct DictionaryLoader {
    source: DictionarySource,
}

impl DictionaryLoader {
    pub fn new(source: DictionarySource) -> Self {
        Self { source }
    }

    pub fn embedded() -> Self {
        Self::new(DictionarySource::Embedded)
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(DictionarySource::Directory(dir.into()))
    }

    pub async fn load(&self, locale: Locale) -> Result<Dictionary, DictionaryError> {
        let raw = match &self.source {
            DictionarySource::Embedded => embedded_json(locale).to_string(),
            DictionarySource::Directory(dir) => read_from_dir(dir, locale).await?,
        };

        debug!("Loaded dictionary for locale {}", locale);

        serde_json::from_str(&raw).map_err(|source| DictionaryError::Parse { locale, source })
    }
}

impl Default for DictionaryLoader {
    fn default() -> Self {
        Self::embedded()
    }
}

fn embedded_json(locale: Locale) -> &'static str {
    match locale {
        Locale::Korean => include_str!("../../dictionaries/ko.json"),
        Locale::Thai => include_str!("../../dictionaries/th.json"),
        Locale::English => include_str!("../../dictionaries/en.json"),
    }
}

async fn read_from_dir(dir: &Path, locale: Locale) -> Result<String, DictionaryError> {
    let path = dir.join(format!("{}.json", locale.code()));

    match tokio::fs::read_to_string(&path).await {
        Ok(raw) => Ok(raw),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DictionaryError::Missing { locale, path })
        }
        Err(source) => Err(DictionaryError::Load { locale, source }),
    }
}

/// Per-process dictionary cache: at most one successful load per locale.
///
/// Concurrent first requests for the same locale wait on a single fetch. A
/// failed load is not cached, so the next request retries.
#[derive(Debug)]
pub struct DictionaryCache {
    loader: DictionaryLoader,
    cells: [OnceCell<Arc<Dictionary>>; 3],
}

impl DictionaryCache {
    pub fn new(loader: DictionaryLoader) -> Self {
        Self {
            loader,
            cells: [OnceCell::new(), OnceCell::new(), OnceCell::new()],
        }
    }

    pub async fn get(&self, locale: Locale) -> Result<Arc<Dictionary>, DictionaryError> {
        self.cells[locale as usize]
            .get_or_try_init(|| async { self.loader.load(locale).await.map(Arc::new) })
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ==================== Embedded Source Tests ====================

    #[tokio::test]
    async fn test_embedded_loads_every_locale() {
        let loader = DictionaryLoader::embedded();
        for locale in Locale::ALL {
            let dictionary = loader.load(locale).await.expect("embedded dictionary");
            assert!(!dictionary.common.app_name.is_empty());
        }
    }

    #[tokio::test]
    async fn test_repeated_loads_have_identical_key_sets() {
        let loader = DictionaryLoader::embedded();
        for locale in Locale::ALL {
            let first = loader.load(locale).await.unwrap();
            let second = loader.load(locale).await.unwrap();
            assert_eq!(first.key_paths(), second.key_paths());
            assert_eq!(first, second);
        }
    }

    #[tokio::test]
    async fn test_locales_differ_in_content() {
        let loader = DictionaryLoader::embedded();
        let ko = loader.load(Locale::Korean).await.unwrap();
        let en = loader.load(Locale::English).await.unwrap();
        assert_ne!(ko.common.save, en.common.save);
        assert_eq!(en.customer.grades.a, "Grade A");
    }

    #[tokio::test]
    async fn test_key_paths_use_wire_names() {
        let dictionary = DictionaryLoader::embedded().load(Locale::Thai).await.unwrap();
        let paths = dictionary.key_paths();
        assert!(paths.contains(&"customer.grades.A".to_string()));
        assert!(paths.contains(&"customer.type".to_string()));
        assert!(paths.contains(&"common.noData".to_string()));
        assert!(paths.contains(&"activity.types.visit".to_string()));
    }

    // ==================== Directory Source Tests ====================

    fn write_dictionary(dir: &TempDir, code: &str, body: &str) {
        std::fs::write(dir.path().join(format!("{code}.json")), body).expect("write dictionary");
    }

    #[tokio::test]
    async fn test_directory_source_reads_file() {
        let dir = TempDir::new().unwrap();
        write_dictionary(&dir, "en", embedded_json(Locale::English));

        let dictionary = DictionaryLoader::from_dir(dir.path())
            .load(Locale::English)
            .await
            .expect("directory dictionary");
        assert_eq!(dictionary.common.save, "Save");
    }

    #[tokio::test]
    async fn test_directory_missing_file_is_configuration_error() {
        let dir = TempDir::new().unwrap();

        let err = DictionaryLoader::from_dir(dir.path())
            .load(Locale::Thai)
            .await
            .unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("th"));
    }

    #[tokio::test]
    async fn test_partial_dictionary_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_dictionary(&dir, "ko", r#"{"common": {"appName": "CRM"}}"#);

        let err = DictionaryLoader::from_dir(dir.path())
            .load(Locale::Korean)
            .await
            .unwrap_err();
        assert!(matches!(err, DictionaryError::Parse { .. }));
        assert!(!err.is_configuration_error());
    }

    #[tokio::test]
    async fn test_unknown_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut value: serde_json::Value =
            serde_json::from_str(embedded_json(Locale::English)).unwrap();
        value["common"]["extra"] = serde_json::Value::String("x".into());
        write_dictionary(&dir, "en", &value.to_string());

        let result = DictionaryLoader::from_dir(dir.path()).load(Locale::English).await;
        assert!(matches!(result, Err(DictionaryError::Parse { .. })));
    }

    // ==================== Cache Tests ====================

    #[tokio::test]
    async fn test_cache_returns_shared_instance() {
        let cache = DictionaryCache::new(DictionaryLoader::embedded());
        let first = cache.get(Locale::Korean).await.unwrap();
        let second = cache.get(Locale::Korean).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_cache_does_not_remember_failures() {
        let dir = TempDir::new().unwrap();
        let cache = DictionaryCache::new(DictionaryLoader::from_dir(dir.path()));

        assert!(cache.get(Locale::English).await.is_err());

        write_dictionary(&dir, "en", embedded_json(Locale::English));
        let dictionary = cache.get(Locale::English).await.expect("retry succeeds");
        assert_eq!(dictionary.common.cancel, "Cancel");
    }
}
