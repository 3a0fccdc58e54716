//! PostgreSQL-backed [`CustomerStore`].
//!
//! Each record is kept whole as a JSONB document. The fields the store filters
//! and orders on are copied into plain columns next to it.

use crate::crm::{
    Activity, ActivityInput, Customer, CustomerInput, CustomerPatch, CustomerQuery, CustomerStore,
    StoreError, StoreResult,
};
use anyhow::{Context, Result};
use chrono::Utc;
use futures::future::BoxFuture;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use tracing::info;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and make sure the tables exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS crm_customers (
                id TEXT PRIMARY KEY,
                grade TEXT NOT NULL,
                status TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                doc JSONB NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create crm_customers table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS crm_activities (
                id TEXT PRIMARY KEY,
                customer_id TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                doc JSONB NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create crm_activities table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS crm_activities_customer_created
             ON crm_activities (customer_id, created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create crm_activities index")?;

        info!("CRM tables ready");
        Ok(())
    }

    async fn upsert(&self, customer: &Customer) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO crm_customers (id, grade, status, updated_at, doc)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE
             SET grade = EXCLUDED.grade, status = EXCLUDED.status,
                 updated_at = EXCLUDED.updated_at, doc = EXCLUDED.doc",
        )
        .bind(&customer.customer_id)
        .bind(customer.details.grade.as_str())
        .bind(customer.details.status.as_str())
        .bind(customer.updated_at)
        .bind(Json(customer))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn new_id(&self) -> StoreResult<String> {
        let (id,): (String,) = sqlx::query_as("SELECT gen_random_uuid()::text")
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }
}

impl CustomerStore for PgStore {
    fn list_customers(&self, query: CustomerQuery) -> BoxFuture<'_, StoreResult<Vec<Customer>>> {
        Box::pin(async move {
            let rows: Vec<(Json<Customer>,)> = sqlx::query_as(
                "SELECT doc FROM crm_customers
                 WHERE ($1::text IS NULL OR grade = $1)
                   AND ($2::text IS NULL OR status = $2)
                 ORDER BY updated_at DESC, id",
            )
            .bind(query.grade.map(|g| g.as_str()))
            .bind(query.status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

            Ok(rows.into_iter().map(|(Json(customer),)| customer).collect())
        })
    }

    fn get_customer(&self, customer_id: String) -> BoxFuture<'_, StoreResult<Option<Customer>>> {
        Box::pin(async move {
            let row: Option<(Json<Customer>,)> =
                sqlx::query_as("SELECT doc FROM crm_customers WHERE id = $1")
                    .bind(&customer_id)
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(row.map(|(Json(customer),)| customer))
        })
    }

    fn create_customer(&self, input: CustomerInput, user_id: String) -> BoxFuture<'_, StoreResult<String>> {
        Box::pin(async move {
            let id = self.new_id().await?;
            let customer = Customer::new(id.clone(), input, &user_id, Utc::now());
            self.upsert(&customer).await?;
            Ok(id)
        })
    }

    fn put_customer(&self, customer: Customer) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move { self.upsert(&customer).await })
    }

    fn update_customer(
        &self,
        customer_id: String,
        patch: CustomerPatch,
        user_id: String,
    ) -> BoxFuture<'_, StoreResult<Customer>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;

            let row: Option<(Json<Customer>,)> =
                sqlx::query_as("SELECT doc FROM crm_customers WHERE id = $1 FOR UPDATE")
                    .bind(&customer_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            let Some((Json(mut customer),)) = row else {
                return Err(StoreError::NotFound(customer_id));
            };

            patch.apply(&mut customer.details);
            customer.updated_at = Utc::now();
            customer.updated_by = user_id;

            sqlx::query(
                "UPDATE crm_customers SET grade = $2, status = $3, updated_at = $4, doc = $5
                 WHERE id = $1",
            )
            .bind(&customer.customer_id)
            .bind(customer.details.grade.as_str())
            .bind(customer.details.status.as_str())
            .bind(customer.updated_at)
            .bind(Json(&customer))
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok(customer)
        })
    }

    fn list_activities(&self, customer_id: String, limit: usize) -> BoxFuture<'_, StoreResult<Vec<Activity>>> {
        Box::pin(async move {
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            let rows: Vec<(Json<Activity>,)> = sqlx::query_as(
                "SELECT doc FROM crm_activities WHERE customer_id = $1
                 ORDER BY created_at DESC, id DESC LIMIT $2",
            )
            .bind(&customer_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

            Ok(rows.into_iter().map(|(Json(activity),)| activity).collect())
        })
    }

    fn create_activity(&self, input: ActivityInput, user_id: String) -> BoxFuture<'_, StoreResult<String>> {
        Box::pin(async move {
            let id = self.new_id().await?;
            let activity = Activity {
                id: id.clone(),
                details: input,
                created_by: user_id,
                created_at: Utc::now(),
            };

            sqlx::query(
                "INSERT INTO crm_activities (id, customer_id, created_at, doc)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(&activity.id)
            .bind(&activity.details.customer_id)
            .bind(activity.created_at)
            .bind(Json(&activity))
            .execute(&self.pool)
            .await?;

            Ok(id)
        })
    }
}
