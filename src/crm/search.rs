//! Caller-side search and presentation helpers for customer lists.
//!
//! The store only filters by equality; free-text search runs here over the
//! already-fetched result set.

use crate::crm::{
    Activity, ActivityType, Contact, Contacts, Customer, CustomerGrade, CustomerStatus,
};
use crate::i18n::{Dictionary, Locale};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Keep customers whose names (any locale), short code or Peak code contain
/// `search`, case-insensitively. A blank search keeps everything.
pub fn filter_customers(customers: Vec<Customer>, search: &str) -> Vec<Customer> {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return customers;
    }

    customers
        .into_iter()
        .filter(|customer| matches_search(customer, &needle))
        .collect()
}

fn matches_search(customer: &Customer, needle: &str) -> bool {
    let details = &customer.details;
    [
        &details.name.ko,
        &details.name.th,
        &details.name.en,
        &details.short_code,
        &details.peak_code,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

/// One row of the customer list, already localized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCard {
    pub customer_id: String,
    pub href: String,
    pub display_name: String,
    pub short_code: String,
    pub grade: CustomerGrade,
    pub grade_emoji: &'static str,
    pub business_type_label: String,
    pub status: CustomerStatus,
    pub status_label: String,
    pub primary_phone: Option<String>,
}

impl CustomerCard {
    pub fn new(customer: &Customer, dict: &Dictionary, locale: Locale) -> Self {
        let details = &customer.details;
        let phone = &details.contacts.primary.phone;

        Self {
            customer_id: customer.customer_id.clone(),
            href: format!("/{}/customers/{}", locale.code(), customer.customer_id),
            display_name: customer.display_name(locale).to_string(),
            short_code: details.short_code.clone(),
            grade: details.grade,
            grade_emoji: details.grade.emoji(),
            business_type_label: details.business_type.label(dict).to_string(),
            status: details.status,
            status_label: details.status.label(dict).to_string(),
            primary_phone: (!phone.is_empty()).then(|| phone.clone()),
        }
    }
}

/// "Last call" label: `{count}` days ago under a week, weeks after that.
pub fn relative_age(at: DateTime<Utc>, now: DateTime<Utc>, dict: &Dictionary) -> String {
    let days = (now - at).num_days().max(0);
    if days < 7 {
        dict.customer.days_ago.replace("{count}", &days.to_string())
    } else {
        dict.customer
            .weeks_ago
            .replace("{count}", &(days / 7).to_string())
    }
}

/// Label for the most recent call among `activities` (newest first).
/// Visits, emails and notes do not count.
pub fn last_call_label(activities: &[Activity], now: DateTime<Utc>, dict: &Dictionary) -> Option<String> {
    activities
        .iter()
        .find(|activity| activity.details.activity_type == ActivityType::Call)
        .map(|call| {
            format!(
                "{}: {}",
                dict.customer.last_call,
                relative_age(call.created_at, now, dict)
            )
        })
}

/// One contact on the detail screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRow {
    pub label: String,
    pub name: String,
    pub role: String,
    pub phone: String,
    pub tel_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_id: Option<String>,
}

impl ContactRow {
    fn new(label: &str, contact: &Contact) -> Self {
        Self {
            label: label.to_string(),
            name: contact.name.clone(),
            role: contact.role.clone(),
            phone: contact.phone.clone(),
            tel_uri: contact.tel_uri(),
            line_id: contact.line_id.clone(),
        }
    }
}

/// Primary, ordering and accounting contacts, in that order, skipping the
/// ones that are not set.
pub fn contact_rows(contacts: &Contacts, dict: &Dictionary) -> Vec<ContactRow> {
    let labels = &dict.contact;
    [
        (&labels.primary, Some(&contacts.primary)),
        (&labels.ordering, contacts.ordering.as_ref()),
        (&labels.accounting, contacts.accounting.as_ref()),
    ]
    .into_iter()
    .filter_map(|(label, contact)| contact.map(|contact| ContactRow::new(label, contact)))
    .collect()
}

/// One entry of the activity log, with its type label and duration in
/// minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRow {
    #[serde(flatten)]
    pub activity: Activity,
    pub type_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

impl ActivityRow {
    pub fn new(activity: Activity, dict: &Dictionary) -> Self {
        Self {
            type_label: activity.details.activity_type.label(dict).to_string(),
            duration_minutes: activity.duration_minutes(),
            activity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::fixtures::{sample_activity, sample_input};
    use crate::i18n::DictionaryLoader;
    use chrono::Duration;

    fn customer(id: &str, ko: &str, en: &str, short_code: &str, peak_code: &str) -> Customer {
        let mut input = sample_input();
        input.name.ko = ko.into();
        input.name.en = en.into();
        input.name.th = String::new();
        input.short_code = short_code.into();
        input.peak_code = peak_code.into();
        Customer::new(id.into(), input, "u", Utc::now())
    }

    fn fixtures() -> Vec<Customer> {
        vec![
            customer("1", "서울갈비", "Seoul Galbi", "SR3", "MT-0001"),
            customer("2", "한국관", "Hankookgwan", "HK2", "MT-0002"),
            customer("3", "방콕호텔", "Bangkok Hotel", "BH1", "MT-0003"),
        ]
    }

    fn ids(customers: &[Customer]) -> Vec<&str> {
        customers.iter().map(|c| c.customer_id.as_str()).collect()
    }

    // ==================== Search Tests ====================

    #[test]
    fn test_blank_search_keeps_all() {
        assert_eq!(filter_customers(fixtures(), "  ").len(), 3);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        assert_eq!(ids(&filter_customers(fixtures(), "seoul")), vec!["1"]);
        assert_eq!(ids(&filter_customers(fixtures(), "HOTEL")), vec!["3"]);
    }

    #[test]
    fn test_search_matches_codes() {
        assert_eq!(ids(&filter_customers(fixtures(), "hk2")), vec!["2"]);
        assert_eq!(ids(&filter_customers(fixtures(), "MT-000")).len(), 3);
    }

    #[test]
    fn test_search_matches_korean_name() {
        assert_eq!(ids(&filter_customers(fixtures(), "갈비")), vec!["1"]);
    }

    #[test]
    fn test_search_no_match() {
        assert!(filter_customers(fixtures(), "pizza").is_empty());
    }

    // ==================== Card Tests ====================

    #[tokio::test]
    async fn test_card_is_localized() {
        let dict = DictionaryLoader::embedded().load(Locale::English).await.unwrap();
        let card = CustomerCard::new(&fixtures()[0], &dict, Locale::English);

        assert_eq!(card.display_name, "Seoul Galbi");
        assert_eq!(card.href, "/en/customers/1");
        assert_eq!(card.business_type_label, "Restaurant");
        assert_eq!(card.grade_emoji, "🥇");
        assert_eq!(card.primary_phone.as_deref(), Some("081-234-5678"));
    }

    #[tokio::test]
    async fn test_card_thai_falls_back_to_korean_name() {
        let dict = DictionaryLoader::embedded().load(Locale::Thai).await.unwrap();
        let card = CustomerCard::new(&fixtures()[1], &dict, Locale::Thai);
        assert_eq!(card.display_name, "한국관");
        assert_eq!(card.status_label, "ใช้งาน");
    }

    // ==================== Relative Time Tests ====================

    #[tokio::test]
    async fn test_relative_age_days_and_weeks() {
        let dict = DictionaryLoader::embedded().load(Locale::English).await.unwrap();
        let now = Utc::now();

        assert_eq!(relative_age(now - Duration::days(3), now, &dict), "3 days ago");
        assert_eq!(relative_age(now - Duration::days(15), now, &dict), "2 weeks ago");
        assert_eq!(relative_age(now + Duration::hours(1), now, &dict), "0 days ago");
    }

    fn activity(id: &str, activity_type: ActivityType, created_at: DateTime<Utc>) -> Activity {
        let mut details = sample_activity("1", "memo");
        details.activity_type = activity_type;
        Activity {
            id: id.into(),
            details,
            created_by: "u".into(),
            created_at,
        }
    }

    #[tokio::test]
    async fn test_last_call_label() {
        let dict = DictionaryLoader::embedded().load(Locale::Korean).await.unwrap();
        let now = Utc::now();
        let activities = vec![activity("A-1", ActivityType::Call, now - Duration::days(1))];

        assert_eq!(
            last_call_label(&activities, now, &dict).as_deref(),
            Some("마지막 통화: 1일 전")
        );
        assert_eq!(last_call_label(&[], now, &dict), None);
    }

    #[tokio::test]
    async fn test_last_call_skips_newer_non_call_activities() {
        let dict = DictionaryLoader::embedded().load(Locale::English).await.unwrap();
        let now = Utc::now();
        let activities = vec![
            activity("A-3", ActivityType::Note, now),
            activity("A-2", ActivityType::Visit, now - Duration::days(2)),
            activity("A-1", ActivityType::Call, now - Duration::days(5)),
        ];

        assert_eq!(
            last_call_label(&activities, now, &dict).as_deref(),
            Some("Last call: 5 days ago")
        );
        assert_eq!(last_call_label(&activities[..2], now, &dict), None);
    }

    // ==================== Detail Row Tests ====================

    #[tokio::test]
    async fn test_contact_rows_skip_missing_contacts() {
        let dict = DictionaryLoader::embedded().load(Locale::English).await.unwrap();
        let mut contacts = sample_input().contacts;
        contacts.accounting = Some(Contact {
            name: "Somchai".into(),
            phone: "02-555-0100".into(),
            line_id: None,
            role: "Accounting".into(),
        });

        let rows = contact_rows(&contacts, &dict);
        let labels: Vec<&str> = rows.iter().map(|row| row.label.as_str()).collect();
        assert_eq!(labels, vec!["Primary", "Accounting"]);
        assert_eq!(rows[0].tel_uri, "tel:081-234-5678");
        assert_eq!(rows[0].line_id.as_deref(), Some("seoulkalbi"));
        assert_eq!(rows[1].tel_uri, "tel:02-555-0100");
    }

    #[tokio::test]
    async fn test_activity_row_labels_and_minutes() {
        let dict = DictionaryLoader::embedded().load(Locale::Thai).await.unwrap();
        let row = ActivityRow::new(activity("A-1", ActivityType::Call, Utc::now()), &dict);
        assert_eq!(row.type_label, "โทร");
        assert_eq!(row.duration_minutes, Some(3));

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["id"], "A-1");
        assert_eq!(json["duration"], 180);
        assert_eq!(json["durationMinutes"], 3);
    }
}
