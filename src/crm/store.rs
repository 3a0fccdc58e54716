//! Customer persistence seam.
//!
//! [`CustomerStore`] is the document-store collaborator: CRUD over customers
//! and activities keyed by opaque string ids, equality filters on grade and
//! status, and newest-first ordering. Full-text search is not a store
//! concern; see [`crate::crm::search`].

use crate::crm::{
    Activity, ActivityInput, Customer, CustomerGrade, CustomerInput, CustomerPatch, CustomerStatus,
};
use chrono::Utc;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;

/// Activities returned per customer when no limit is given.
pub const DEFAULT_ACTIVITY_LIMIT: usize = 20;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Customer '{0}' not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Malformed stored document: {0}")]
    Document(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Server-side equality filters for listing customers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerQuery {
    pub grade: Option<CustomerGrade>,
    pub status: Option<CustomerStatus>,
}

impl CustomerQuery {
    pub fn matches(&self, customer: &Customer) -> bool {
        self.grade.map_or(true, |grade| customer.details.grade == grade)
            && self.status.map_or(true, |status| customer.details.status == status)
    }
}

/// Document store for customers and their activities.
///
/// Methods return boxed futures so the store can live behind `Arc<dyn _>`.
pub trait CustomerStore: Send + Sync {
    /// Customers matching `query`, most recently updated first.
    fn list_customers(&self, query: CustomerQuery) -> BoxFuture<'_, StoreResult<Vec<Customer>>>;

    fn get_customer(&self, customer_id: String) -> BoxFuture<'_, StoreResult<Option<Customer>>>;

    /// Insert a new customer and return its generated id.
    fn create_customer(&self, input: CustomerInput, user_id: String) -> BoxFuture<'_, StoreResult<String>>;

    /// Insert or overwrite a customer under its own id.
    fn put_customer(&self, customer: Customer) -> BoxFuture<'_, StoreResult<()>>;

    /// Apply `patch`, stamping `updatedAt`/`updatedBy`.
    fn update_customer(
        &self,
        customer_id: String,
        patch: CustomerPatch,
        user_id: String,
    ) -> BoxFuture<'_, StoreResult<Customer>>;

    /// A customer's activities, newest first, at most `limit`.
    fn list_activities(&self, customer_id: String, limit: usize) -> BoxFuture<'_, StoreResult<Vec<Activity>>>;

    fn create_activity(&self, input: ActivityInput, user_id: String) -> BoxFuture<'_, StoreResult<String>>;

    /// The most recent activity for a customer.
    fn last_activity(&self, customer_id: String) -> BoxFuture<'_, StoreResult<Option<Activity>>> {
        Box::pin(async move {
            let mut activities = self.list_activities(customer_id, 1).await?;
            Ok(activities.pop())
        })
    }
}

/// In-process store. Used when no database is configured, and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
    next_id: AtomicU64,
}

#[derive(Debug, Default)]
struct MemoryInner {
    customers: HashMap<String, Customer>,
    activities: Vec<Activity>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn generate_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{:06}", prefix, n)
    }
}

impl CustomerStore for MemoryStore {
    fn list_customers(&self, query: CustomerQuery) -> BoxFuture<'_, StoreResult<Vec<Customer>>> {
        Box::pin(async move {
            let inner = self.inner.read().await;
            let mut customers: Vec<Customer> = inner
                .customers
                .values()
                .filter(|customer| query.matches(customer))
                .cloned()
                .collect();
            customers.sort_by(|a, b| {
                b.updated_at
                    .cmp(&a.updated_at)
                    .then_with(|| a.customer_id.cmp(&b.customer_id))
            });
            Ok(customers)
        })
    }

    fn get_customer(&self, customer_id: String) -> BoxFuture<'_, StoreResult<Option<Customer>>> {
        Box::pin(async move { Ok(self.inner.read().await.customers.get(&customer_id).cloned()) })
    }

    fn create_customer(&self, input: CustomerInput, user_id: String) -> BoxFuture<'_, StoreResult<String>> {
        Box::pin(async move {
            let id = self.generate_id("C");
            let customer = Customer::new(id.clone(), input, &user_id, Utc::now());
            self.inner.write().await.customers.insert(id.clone(), customer);
            Ok(id)
        })
    }

    fn put_customer(&self, customer: Customer) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.inner
                .write()
                .await
                .customers
                .insert(customer.customer_id.clone(), customer);
            Ok(())
        })
    }

    fn update_customer(
        &self,
        customer_id: String,
        patch: CustomerPatch,
        user_id: String,
    ) -> BoxFuture<'_, StoreResult<Customer>> {
        Box::pin(async move {
            let mut inner = self.inner.write().await;
            let customer = inner
                .customers
                .get_mut(&customer_id)
                .ok_or_else(|| StoreError::NotFound(customer_id.clone()))?;

            patch.apply(&mut customer.details);
            customer.updated_at = Utc::now();
            customer.updated_by = user_id;
            Ok(customer.clone())
        })
    }

    fn list_activities(&self, customer_id: String, limit: usize) -> BoxFuture<'_, StoreResult<Vec<Activity>>> {
        Box::pin(async move {
            let inner = self.inner.read().await;
            // Insertion order is creation order, so walking backwards is newest first
            Ok(inner
                .activities
                .iter()
                .rev()
                .filter(|activity| activity.details.customer_id == customer_id)
                .take(limit)
                .cloned()
                .collect())
        })
    }

    fn create_activity(&self, input: ActivityInput, user_id: String) -> BoxFuture<'_, StoreResult<String>> {
        Box::pin(async move {
            let id = self.generate_id("A");
            self.inner.write().await.activities.push(Activity {
                id: id.clone(),
                details: input,
                created_by: user_id,
                created_at: Utc::now(),
            });
            Ok(id)
        })
    }
}
