//! Customer and activity records.
//!
//! Field names serialize in camelCase, matching the stored documents.

use crate::i18n::{Dictionary, Locale};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Rejected customer or activity input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{0}' is required")]
    Required(&'static str),

    #[error("'{field}' must be HH:MM, got '{value}'")]
    InvalidTime { field: &'static str, value: String },

    #[error("Unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(ValidationError::UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// Kind of business a customer runs.
    BusinessType, "business type" {
        Restaurant => "restaurant",
        Hotel => "hotel",
        Catering => "catering",
        Retail => "retail",
    }
}

string_enum! {
    CustomerStatus, "status" {
        Active => "active",
        Inactive => "inactive",
        Pending => "pending",
    }
}

string_enum! {
    /// Account tier. `A` is the most valuable.
    CustomerGrade, "grade" {
        A => "A",
        B => "B",
        C => "C",
    }
}

string_enum! {
    ActivityType, "activity type" {
        Call => "call",
        Visit => "visit",
        Email => "email",
        Note => "note",
    }
}

impl BusinessType {
    pub fn label<'a>(&self, dict: &'a Dictionary) -> &'a str {
        let labels = &dict.customer.business_types;
        match self {
            BusinessType::Restaurant => &labels.restaurant,
            BusinessType::Hotel => &labels.hotel,
            BusinessType::Catering => &labels.catering,
            BusinessType::Retail => &labels.retail,
        }
    }
}

impl CustomerStatus {
    pub fn label<'a>(&self, dict: &'a Dictionary) -> &'a str {
        let labels = &dict.customer.statuses;
        match self {
            CustomerStatus::Active => &labels.active,
            CustomerStatus::Inactive => &labels.inactive,
            CustomerStatus::Pending => &labels.pending,
        }
    }
}

impl CustomerGrade {
    pub fn label<'a>(&self, dict: &'a Dictionary) -> &'a str {
        let labels = &dict.customer.grades;
        match self {
            CustomerGrade::A => &labels.a,
            CustomerGrade::B => &labels.b,
            CustomerGrade::C => &labels.c,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            CustomerGrade::A => "🥇",
            CustomerGrade::B => "🥈",
            CustomerGrade::C => "🥉",
        }
    }
}

impl ActivityType {
    pub fn label<'a>(&self, dict: &'a Dictionary) -> &'a str {
        let labels = &dict.activity.types;
        match self {
            ActivityType::Call => &labels.call,
            ActivityType::Visit => &labels.visit,
            ActivityType::Email => &labels.email,
            ActivityType::Note => &labels.note,
        }
    }
}

/// A customer name in each UI locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedName {
    pub ko: String,
    #[serde(default)]
    pub th: String,
    #[serde(default)]
    pub en: String,
}

impl LocalizedName {
    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::Korean => &self.ko,
            Locale::Thai => &self.th,
            Locale::English => &self.en,
        }
    }

    /// The name in `locale`, falling back to Korean, then English.
    pub fn display(&self, locale: Locale) -> &str {
        [self.get(locale), self.ko.as_str(), self.en.as_str()]
            .into_iter()
            .find(|name| !name.is_empty())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_id: Option<String>,
    #[serde(default)]
    pub role: String,
}

impl Contact {
    /// `tel:` link for the dialer.
    pub fn tel_uri(&self) -> String {
        format!("tel:{}", self.phone)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contacts {
    pub primary: Contact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordering: Option<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounting: Option<Contact>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_maps_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

/// Opening hours as `HH:MM` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingHours {
    pub open: String,
    pub close: String,
}

/// Everything about a customer that staff can edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub peak_code: String,
    pub short_code: String,
    pub name: LocalizedName,
    pub business_type: BusinessType,
    pub contacts: Contacts,
    pub status: CustomerStatus,
    pub grade: CustomerGrade,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<DeliveryAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_group_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_hours: Option<OperatingHours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_delivery_time: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub menu_photos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<String>,
}

impl CustomerInput {
    /// A blank form: restaurant, active, grade B.
    pub fn blank() -> Self {
        Self {
            peak_code: String::new(),
            short_code: String::new(),
            name: LocalizedName::default(),
            business_type: BusinessType::Restaurant,
            contacts: Contacts::default(),
            status: CustomerStatus::Active,
            grade: CustomerGrade::B,
            tags: Vec::new(),
            note: String::new(),
            delivery_address: None,
            line_group_url: None,
            operating_hours: None,
            preferred_delivery_time: None,
            menu_photos: Vec::new(),
            issues: None,
        }
    }

    /// Check required fields and formats.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("peakCode", &self.peak_code)?;
        require("shortCode", &self.short_code)?;
        require("name.ko", &self.name.ko)?;
        validate_primary_contact(&self.contacts.primary)?;
        if let Some(hours) = &self.operating_hours {
            validate_hours(hours)?;
        }
        Ok(())
    }

    /// Trim and de-duplicate tags, dropping empty ones. Order is kept.
    pub fn normalize(&mut self) {
        self.tags = normalize_tags(std::mem::take(&mut self.tags));
    }
}

/// A stored customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub customer_id: String,
    #[serde(flatten)]
    pub details: CustomerInput,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: String,
}

impl Customer {
    pub fn new(customer_id: String, details: CustomerInput, user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            customer_id,
            details,
            created_at: now,
            updated_at: now,
            created_by: user_id.to_string(),
            updated_by: user_id.to_string(),
        }
    }

    pub fn display_name(&self, locale: Locale) -> &str {
        self.details.name.display(locale)
    }
}

/// Partial update. Absent fields are left unchanged.
///
/// `contacts` replaces the whole contact set, which is how an optional
/// contact is removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPatch {
    pub peak_code: Option<String>,
    pub short_code: Option<String>,
    pub name: Option<LocalizedName>,
    pub business_type: Option<BusinessType>,
    pub contacts: Option<Contacts>,
    pub status: Option<CustomerStatus>,
    pub grade: Option<CustomerGrade>,
    pub tags: Option<Vec<String>>,
    pub note: Option<String>,
    pub delivery_address: Option<DeliveryAddress>,
    pub line_group_url: Option<String>,
    pub operating_hours: Option<OperatingHours>,
    pub preferred_delivery_time: Option<String>,
    pub menu_photos: Option<Vec<String>>,
    pub issues: Option<String>,
}

impl CustomerPatch {
    /// Validate the fields this patch sets.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(code) = &self.peak_code {
            require("peakCode", code)?;
        }
        if let Some(code) = &self.short_code {
            require("shortCode", code)?;
        }
        if let Some(name) = &self.name {
            require("name.ko", &name.ko)?;
        }
        if let Some(contacts) = &self.contacts {
            validate_primary_contact(&contacts.primary)?;
        }
        if let Some(hours) = &self.operating_hours {
            validate_hours(hours)?;
        }
        Ok(())
    }

    pub fn apply(self, target: &mut CustomerInput) {
        let CustomerPatch {
            peak_code,
            short_code,
            name,
            business_type,
            contacts,
            status,
            grade,
            tags,
            note,
            delivery_address,
            line_group_url,
            operating_hours,
            preferred_delivery_time,
            menu_photos,
            issues,
        } = self;

        replace(&mut target.peak_code, peak_code);
        replace(&mut target.short_code, short_code);
        replace(&mut target.name, name);
        replace(&mut target.business_type, business_type);
        replace(&mut target.contacts, contacts);
        replace(&mut target.status, status);
        replace(&mut target.grade, grade);
        replace(&mut target.note, note);
        replace(&mut target.menu_photos, menu_photos);
        replace(&mut target.tags, tags.map(normalize_tags));

        replace(&mut target.delivery_address, delivery_address.map(Some));
        replace(&mut target.line_group_url, line_group_url.map(Some));
        replace(&mut target.operating_hours, operating_hours.map(Some));
        replace(&mut target.preferred_delivery_time, preferred_delivery_time.map(Some));
        replace(&mut target.issues, issues.map(Some));
    }
}

fn replace<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// A new activity as submitted by staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityInput {
    pub customer_id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    /// Call length in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    pub memo: String,
}

impl ActivityInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("customerId", &self.customer_id)?;
        require("memo", &self.memo)
    }

    /// A call memo logged against `contact`. `minutes` is what the dialog
    /// collects; it is stored in seconds.
    pub fn call_memo(customer_id: &str, contact: &Contact, minutes: Option<u32>, memo: &str) -> Self {
        Self {
            customer_id: customer_id.to_string(),
            activity_type: ActivityType::Call,
            phone: Some(contact.phone.clone()),
            contact_name: Some(contact.name.clone()),
            duration: minutes.map(|m| m.saturating_mul(60)),
            memo: memo.to_string(),
        }
    }
}

/// A stored activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    #[serde(flatten)]
    pub details: ActivityInput,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    /// Duration in whole minutes, for display.
    pub fn duration_minutes(&self) -> Option<u32> {
        self.details.duration.map(|seconds| seconds / 60)
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

fn validate_primary_contact(contact: &Contact) -> Result<(), ValidationError> {
    require("contacts.primary.name", &contact.name)?;
    require("contacts.primary.phone", &contact.phone)
}

static TIME_REGEX: OnceLock<Regex> = OnceLock::new();

fn validate_hours(hours: &OperatingHours) -> Result<(), ValidationError> {
    let regex = TIME_REGEX.get_or_init(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid regex"));

    for (field, value) in [("operatingHours.open", &hours.open), ("operatingHours.close", &hours.close)] {
        if !regex.is_match(value) {
            return Err(ValidationError::InvalidTime {
                field,
                value: value.clone(),
            });
        }
    }
    Ok(())
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !normalized.iter().any(|t| t == tag) {
            normalized.push(tag.to_string());
        }
    }
    normalized
}
