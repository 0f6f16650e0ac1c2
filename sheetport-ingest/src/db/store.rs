//! Entity storage collaborator
//!
//! `create` succeeds or fails atomically per call; the commit orchestrator
//! relies on nothing else.

use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::models::{Entity, NewCustomer, NewProduct};
use crate::templates::EntityKind;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique key already present
    #[error("{kind} '{key}' already exists")]
    Duplicate { kind: EntityKind, key: String },

    /// Referenced row (e.g. category) does not exist
    #[error("{kind} '{key}' references a missing record")]
    MissingReference { kind: EntityKind, key: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Per-entity create / exists
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn create(&self, entity: Entity) -> Result<Entity, StoreError>;

    /// Whether an entity with this business key exists
    async fn exists(&self, kind: EntityKind, key: &str) -> Result<bool, StoreError>;
}

/// SQLite-backed store
#[derive(Clone)]
pub struct SqliteEntityStore {
    pool: SqlitePool,
}

impl SqliteEntityStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn insert_customer(&self, customer: &NewCustomer) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO customers (username, full_name, address, phone, email, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&customer.username)
        .bind(&customer.full_name)
        .bind(&customer.address)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO products (code, name, description, price, stock, category_code)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.category_code)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl EntityStore for SqliteEntityStore {
    async fn create(&self, entity: Entity) -> Result<Entity, StoreError> {
        let outcome = match &entity {
            Entity::Customer(customer) => self.insert_customer(customer).await,
            Entity::Product(product) => self.insert_product(product).await,
        };

        match outcome {
            Ok(()) => Ok(entity),
            Err(e) => Err(classify(e, &entity)),
        }
    }

    async fn exists(&self, kind: EntityKind, key: &str) -> Result<bool, StoreError> {
        let sql = match kind {
            EntityKind::Customer => "SELECT COUNT(*) FROM customers WHERE username = ?",
            EntityKind::Product => "SELECT COUNT(*) FROM products WHERE code = ?",
        };
        let count: i64 = sqlx::query_scalar(sql)
            .bind(key)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}

/// Map constraint violations onto domain errors
fn classify(err: sqlx::Error, entity: &Entity) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate {
                kind: entity.kind(),
                key: entity.key().to_string(),
            };
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::MissingReference {
                kind: entity.kind(),
                key: entity.key().to_string(),
            };
        }
    }
    StoreError::Database(err)
}
