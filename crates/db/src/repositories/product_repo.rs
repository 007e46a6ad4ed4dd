//! Repository for the `products` table.

use sqlx::PgPool;

use crate::models::product::{NewProduct, Product};

/// Column list for `products` queries.
const COLUMNS: &str = "product_id, batch_id, manufacturer_id, product_metadata, dkg_ual, \
     registration_timestamp, trust_score, status, created_at, updated_at";

/// Provides read/write operations for products.
pub struct ProductRepo;

impl ProductRepo {
    /// Insert a new product, returning the stored row.
    pub async fn insert(pool: &PgPool, input: &NewProduct) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products \
                (product_id, batch_id, manufacturer_id, product_metadata, \
                 registration_timestamp, trust_score, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(&input.product_id)
            .bind(&input.batch_id)
            .bind(&input.manufacturer_id)
            .bind(&input.product_metadata)
            .bind(input.registration_timestamp)
            .bind(input.trust_score)
            .bind(&input.status)
            .fetch_one(pool)
            .await
    }

    /// Register a new product and enqueue its ledger publish in one
    /// transaction, returning the stored row.
    pub async fn register(pool: &PgPool, input: &NewProduct) -> Result<Product, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO products \
                (product_id, batch_id, manufacturer_id, product_metadata, \
                 registration_timestamp, trust_score, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        let product = sqlx::query_as::<_, Product>(&query)
            .bind(&input.product_id)
            .bind(&input.batch_id)
            .bind(&input.manufacturer_id)
            .bind(&input.product_metadata)
            .bind(input.registration_timestamp)
            .bind(input.trust_score)
            .bind(&input.status)
            .fetch_one(&mut *tx)
            .await?;

        let payload = serde_json::json!({
            "product_id": product.product_id,
            "batch_id": product.batch_id,
            "manufacturer_id": product.manufacturer_id,
            "metadata": product.product_metadata,
            "registration_timestamp": product.registration_timestamp,
        });
        sqlx::query(
            "INSERT INTO ledger_queue (product_id, operation, payload) \
             VALUES ($1, 'publish', $2)",
        )
        .bind(&product.product_id)
        .bind(&payload)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(product)
    }

    /// Find a product by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        product_id: &str,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE product_id = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(product_id)
            .fetch_optional(pool)
            .await
    }

    /// Update the cached trust score and derived status.
    pub async fn update_trust(
        pool: &PgPool,
        product_id: &str,
        trust_score: f64,
        status: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE products \
             SET trust_score = $2, status = $3, updated_at = now() \
             WHERE product_id = $1",
        )
        .bind(product_id)
        .bind(trust_score)
        .bind(status)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record the ledger asset locator once the publish completes.
    pub async fn set_dkg_ual(
        pool: &PgPool,
        product_id: &str,
        ual: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE products SET dkg_ual = $2, updated_at = now() WHERE product_id = $1",
        )
        .bind(product_id)
        .bind(ual)
        .execute(pool)
        .await?;
        Ok(())
    }
}
