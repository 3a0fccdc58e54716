//! Customer relationship data: records, persistence, search and seed data.
//!
//! # Architecture
//!
//! - `model`: Customer and activity records plus input validation
//! - `store`: The [`CustomerStore`] seam and its in-memory implementation
//! - `postgres`: [`PgStore`], the PostgreSQL-backed implementation
//! - `search`: Free-text filtering and localized list and detail rows
//! - `seed`: Demo customers for a fresh store

mod model;
mod postgres;
pub mod search;
mod seed;
mod store;

pub use model::{
    Activity, ActivityInput, ActivityType, BusinessType, Contact, Contacts, Customer,
    CustomerGrade, CustomerInput, CustomerPatch, CustomerStatus, DeliveryAddress, LocalizedName,
    OperatingHours, ValidationError,
};
pub use postgres::PgStore;
pub use search::{
    contact_rows, filter_customers, last_call_label, relative_age, ActivityRow, ContactRow,
    CustomerCard,
};
pub use seed::{seed_customers, seed_data, SeedError};
pub use store::{
    CustomerQuery, CustomerStore, MemoryStore, StoreError, StoreResult, DEFAULT_ACTIVITY_LIMIT,
};
