//! Demo customers for an empty store.
//!
//! Seeded customers keep fixed ids (`CUST-001`..), so seeding twice
//! overwrites rather than duplicates.

use crate::crm::{Customer, CustomerInput, CustomerStore, StoreError};
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

const SEED_JSON: &str = include_str!("../../seed/customers.json");

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Seed data is malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedCustomer {
    customer_id: String,
    #[serde(flatten)]
    details: CustomerInput,
}

/// The bundled demo customers, stamped as created by `user_id` now.
pub fn seed_data(user_id: &str) -> Result<Vec<Customer>, SeedError> {
    let records: Vec<SeedCustomer> = serde_json::from_str(SEED_JSON)?;
    let now = Utc::now();

    Ok(records
        .into_iter()
        .map(|record| Customer::new(record.customer_id, record.details, user_id, now))
        .collect())
}

/// Write the demo customers into `store`. Returns how many were written.
pub async fn seed_customers(store: &dyn CustomerStore, user_id: &str) -> Result<usize, SeedError> {
    let customers = seed_data(user_id)?;
    let count = customers.len();

    for customer in customers {
        store.put_customer(customer).await?;
    }

    info!("Seeded {} customers", count);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::{BusinessType, CustomerQuery, CustomerStatus, MemoryStore};

    #[test]
    fn test_seed_data_parses_and_validates() {
        let customers = seed_data("admin").unwrap();
        assert_eq!(customers.len(), 5);

        for customer in &customers {
            assert!(
                customer.details.validate().is_ok(),
                "{} should be valid",
                customer.customer_id
            );
            assert_eq!(customer.created_by, "admin");
        }
    }

    #[test]
    fn test_seed_ids_are_fixed() {
        let ids: Vec<_> = seed_data("u")
            .unwrap()
            .into_iter()
            .map(|c| c.customer_id)
            .collect();
        assert_eq!(ids, vec!["CUST-001", "CUST-002", "CUST-003", "CUST-004", "CUST-005"]);
    }

    #[test]
    fn test_seed_covers_variants() {
        let customers = seed_data("u").unwrap();
        let hotel = customers.iter().find(|c| c.customer_id == "CUST-003").unwrap();
        assert_eq!(hotel.details.business_type, BusinessType::Hotel);
        assert!(hotel.details.contacts.accounting.is_some());
        assert_eq!(hotel.details.menu_photos.len(), 3);

        let kmart = customers.iter().find(|c| c.customer_id == "CUST-005").unwrap();
        assert_eq!(kmart.details.status, CustomerStatus::Inactive);
    }

    #[tokio::test]
    async fn test_seeding_twice_does_not_duplicate() {
        let store = MemoryStore::new();
        assert_eq!(seed_customers(&store, "u").await.unwrap(), 5);
        assert_eq!(seed_customers(&store, "u").await.unwrap(), 5);

        let all = store.list_customers(CustomerQuery::default()).await.unwrap();
        assert_eq!(all.len(), 5);
    }
}
