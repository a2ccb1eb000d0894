//! Persistence for the `products` table.
//!
//! # Responsibilities
//! - Bootstrap the table at startup (idempotent)
//! - One parameterized statement per operation
//! - Map rows to [`Product`]
//!
//! # Design Decisions
//! - Handlers depend on the [`ProductStore`] trait, never on a pool directly
//! - No caching: every call goes to the database
//! - Errors carry the driver's message unchanged; callers decide how to surface it

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::products::model::{NewProduct, Product};

/// Errors raised by a product store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Query or connection failure reported by the driver.
    #[error("{0}")]
    Database(#[from] sqlx::Error),

    /// Store configuration could not be turned into connect options.
    #[error("invalid database configuration: {0}")]
    Config(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Capability over the `products` table.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Create the table if it does not exist.
    async fn bootstrap(&self) -> StoreResult<()>;

    /// All products, newest first.
    async fn list(&self) -> StoreResult<Vec<Product>>;

    async fn get(&self, id: i32) -> StoreResult<Option<Product>>;

    /// Insert and return the stored row, including generated columns.
    async fn create(&self, product: &NewProduct) -> StoreResult<Product>;

    /// Overwrite the business fields of `id`. `None` if no row matched.
    async fn update(&self, id: i32, product: &NewProduct) -> StoreResult<Option<Product>>;

    /// Delete `id` and return the removed row. `None` if no row matched.
    async fn delete(&self, id: i32) -> StoreResult<Option<Product>>;
}

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id SERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    image VARCHAR(255) NOT NULL,
    price DECIMAL(10, 2) NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)"#;

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a lazily connecting pool. No connection is attempted until the
    /// first query, so an unreachable database does not prevent startup.
    pub fn connect_lazy(config: &DatabaseConfig) -> StoreResult<Self> {
        let ssl_mode = PgSslMode::from_str(&config.ssl_mode)
            .map_err(|e| StoreError::Config(e.to_string()))?;

        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.name)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(ssl_mode);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy_with(options);

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            max_connections = config.max_connections,
            "Database pool configured"
        );

        Ok(Self::new(pool))
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn bootstrap(&self) -> StoreResult<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, image, price, created_at FROM products ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn get(&self, id: i32) -> StoreResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, image, price, created_at FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn create(&self, product: &NewProduct) -> StoreResult<Product> {
        let created = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, price, image)
            VALUES ($1, $2, $3)
            RETURNING id, name, image, price, created_at
            "#,
        )
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.image)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update(&self, id: i32, product: &NewProduct) -> StoreResult<Option<Product>> {
        let updated = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $1, price = $2, image = $3
            WHERE id = $4
            RETURNING id, name, image, price, created_at
            "#,
        )
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.image)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete(&self, id: i32) -> StoreResult<Option<Product>> {
        let deleted = sqlx::query_as::<_, Product>(
            "DELETE FROM products WHERE id = $1 RETURNING id, name, image, price, created_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(deleted)
    }
}
