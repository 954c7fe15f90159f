//! Postgres-backed entity store.
//!
//! ## Error Mapping
//!
//! | SQLx error | PostgreSQL code | StoreError |
//! |------------|-----------------|------------|
//! | Database (unique violation on `manufacturers_name_key`) | `23505` | `DuplicateName` |
//! | Database (unique violation on `manufacturers_contact_email_key`) | `23505` | `DuplicateContactEmail` |
//! | Database (FK violation on product write) | `23503` | `MissingManufacturer` |
//! | Database (FK violation on manufacturer delete) | `23503` | `ManufacturerInUse` |
//! | PoolTimedOut / PoolClosed / Io / other | N/A | `Unavailable` |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use stockroom_catalog::{
    Address, Contact, InventorySnapshot, Manufacturer, ManufacturerDraft, Product, ProductDraft,
};
use stockroom_core::{Entity, ManufacturerId, Money, ProductId};

use super::{EntityStore, StoreError, StoreResult};

const BOOTSTRAP_SQL: &str = include_str!("../../sql/bootstrap.sql");

const MANUFACTURER_COLUMNS: &str = r#"
    id, name, country, website, description,
    address_street, address_city, address_zip_code, address_country,
    contact_name, contact_email, contact_phone,
    created_at, updated_at
"#;

const PRODUCT_COLUMNS: &str = r#"
    id, name, sku, description, price_cents, category, amount_in_stock,
    manufacturer_id, created_at, updated_at
"#;

/// Postgres-backed entity store.
///
/// Uniqueness of manufacturer names and contact emails and the product →
/// manufacturer reference are enforced by the schema, so concurrent writers
/// in other processes are covered as well.
#[derive(Debug, Clone)]
pub struct PostgresEntityStore {
    pool: Arc<PgPool>,
}

impl PostgresEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Open a pool and run the schema bootstrap.
    #[instrument(skip(database_url), err)]
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let store = Self::new(pool);
        store.bootstrap().await?;
        Ok(store)
    }

    /// Create tables and indexes if they do not exist.
    pub async fn bootstrap(&self) -> StoreResult<()> {
        sqlx::raw_sql(BOOTSTRAP_SQL)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("bootstrap", e))?;
        Ok(())
    }
}

#[async_trait]
impl EntityStore for PostgresEntityStore {
    #[instrument(skip(self, product), fields(product_id = %product.id()), err)]
    async fn insert_product(&self, product: Product) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, sku, description, price_cents, category, amount_in_stock,
                manufacturer_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(product.id().as_uuid())
        .bind(product.name())
        .bind(product.sku())
        .bind(product.description())
        .bind(to_db_int(product.price().cents(), "price")?)
        .bind(product.category())
        .bind(to_db_int(product.amount_in_stock(), "amountInStock")?)
        .bind(product.manufacturer().map(|id| *id.as_uuid()))
        .bind(product.created_at())
        .bind(product.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_product_write_error("insert_product", &product, e))?;
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?
            .ok_or(StoreError::NotFound("product"))?;
        product_from_row(&row)
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, id");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;
        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id()), err)]
    async fn update_product(&self, product: Product) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = $2,
                sku = $3,
                description = $4,
                price_cents = $5,
                category = $6,
                amount_in_stock = $7,
                manufacturer_id = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(product.id().as_uuid())
        .bind(product.name())
        .bind(product.sku())
        .bind(product.description())
        .bind(to_db_int(product.price().cents(), "price")?)
        .bind(product.category())
        .bind(to_db_int(product.amount_in_stock(), "amountInStock")?)
        .bind(product.manufacturer().map(|id| *id.as_uuid()))
        .bind(product.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_product_write_error("update_product", &product, e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("product"));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete_product(&self, id: ProductId) -> StoreResult<Product> {
        let sql = format!("DELETE FROM products WHERE id = $1 RETURNING {PRODUCT_COLUMNS}");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?
            .ok_or(StoreError::NotFound("product"))?;
        product_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn delete_all_products(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM products")
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_all_products", e))?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self, manufacturer), fields(manufacturer_id = %manufacturer.id()), err)]
    async fn insert_manufacturer(&self, manufacturer: Manufacturer) -> StoreResult<()> {
        let address = manufacturer.address().cloned().unwrap_or_default();
        let contact = manufacturer.contact();

        sqlx::query(
            r#"
            INSERT INTO manufacturers (
                id, name, country, website, description,
                address_street, address_city, address_zip_code, address_country,
                contact_name, contact_email, contact_phone,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(manufacturer.id().as_uuid())
        .bind(manufacturer.name())
        .bind(manufacturer.country())
        .bind(manufacturer.website())
        .bind(manufacturer.description())
        .bind(address.street)
        .bind(address.city)
        .bind(address.zip_code)
        .bind(address.country)
        .bind(contact.map(Contact::name))
        .bind(contact.map(Contact::email))
        .bind(contact.and_then(Contact::phone))
        .bind(manufacturer.created_at())
        .bind(manufacturer.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_manufacturer_write_error("insert_manufacturer", &manufacturer, e))?;
        Ok(())
    }

    async fn get_manufacturer(&self, id: ManufacturerId) -> StoreResult<Manufacturer> {
        let sql = format!("SELECT {MANUFACTURER_COLUMNS} FROM manufacturers WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_manufacturer", e))?
            .ok_or(StoreError::NotFound("manufacturer"))?;
        manufacturer_from_row(&row)
    }

    async fn find_manufacturer_by_name(&self, name: &str) -> StoreResult<Option<Manufacturer>> {
        let sql = format!("SELECT {MANUFACTURER_COLUMNS} FROM manufacturers WHERE name = $1");
        let row = sqlx::query(&sql)
            .bind(name.trim())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_manufacturer_by_name", e))?;
        row.as_ref().map(manufacturer_from_row).transpose()
    }

    async fn list_manufacturers(&self) -> StoreResult<Vec<Manufacturer>> {
        let sql = format!("SELECT {MANUFACTURER_COLUMNS} FROM manufacturers ORDER BY name, id");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_manufacturers", e))?;
        rows.iter().map(manufacturer_from_row).collect()
    }

    #[instrument(skip(self, manufacturer), fields(manufacturer_id = %manufacturer.id()), err)]
    async fn update_manufacturer(&self, manufacturer: Manufacturer) -> StoreResult<()> {
        let address = manufacturer.address().cloned().unwrap_or_default();
        let contact = manufacturer.contact();

        let result = sqlx::query(
            r#"
            UPDATE manufacturers SET
                name = $2,
                country = $3,
                website = $4,
                description = $5,
                address_street = $6,
                address_city = $7,
                address_zip_code = $8,
                address_country = $9,
                contact_name = $10,
                contact_email = $11,
                contact_phone = $12,
                updated_at = $13
            WHERE id = $1
            "#,
        )
        .bind(manufacturer.id().as_uuid())
        .bind(manufacturer.name())
        .bind(manufacturer.country())
        .bind(manufacturer.website())
        .bind(manufacturer.description())
        .bind(address.street)
        .bind(address.city)
        .bind(address.zip_code)
        .bind(address.country)
        .bind(contact.map(Contact::name))
        .bind(contact.map(Contact::email))
        .bind(contact.and_then(Contact::phone))
        .bind(manufacturer.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_manufacturer_write_error("update_manufacturer", &manufacturer, e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("manufacturer"));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(manufacturer_id = %id), err)]
    async fn delete_manufacturer(&self, id: ManufacturerId) -> StoreResult<Manufacturer> {
        let sql = format!("DELETE FROM manufacturers WHERE id = $1 RETURNING {MANUFACTURER_COLUMNS}");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| {
                if violation_code(&e) == Some(FOREIGN_KEY_VIOLATION) {
                    StoreError::ManufacturerInUse(id)
                } else {
                    map_sqlx_error("delete_manufacturer", e)
                }
            })?
            .ok_or(StoreError::NotFound("manufacturer"))?;
        manufacturer_from_row(&row)
    }

    async fn count_products_for_manufacturer(&self, id: ManufacturerId) -> StoreResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM products WHERE manufacturer_id = $1")
            .bind(id.as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_products_for_manufacturer", e))?;
        let total: i64 = row.try_get("total").map_err(|e| decode_error("total", e))?;
        from_db_int(total, "total")
    }

    #[instrument(skip(self), err)]
    async fn snapshot(&self) -> StoreResult<InventorySnapshot> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("snapshot", e))?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("snapshot", e))?;

        let manufacturer_sql = format!("SELECT {MANUFACTURER_COLUMNS} FROM manufacturers");
        let manufacturers = sqlx::query(&manufacturer_sql)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("snapshot", e))?
            .iter()
            .map(manufacturer_from_row)
            .collect::<StoreResult<Vec<_>>>()?;

        let product_sql = format!("SELECT {PRODUCT_COLUMNS} FROM products");
        let products = sqlx::query(&product_sql)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("snapshot", e))?
            .iter()
            .map(product_from_row)
            .collect::<StoreResult<Vec<_>>>()?;

        tx.commit().await.map_err(|e| map_sqlx_error("snapshot", e))?;
        Ok(InventorySnapshot::new(products, manufacturers))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ping", e))?;
        Ok(())
    }
}

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    let id: Uuid = get(row, "id")?;
    let manufacturer: Option<Uuid> = get(row, "manufacturer_id")?;
    let price_cents: i64 = get(row, "price_cents")?;
    let amount_in_stock: i64 = get(row, "amount_in_stock")?;
    let created_at: DateTime<Utc> = get(row, "created_at")?;
    let updated_at: DateTime<Utc> = get(row, "updated_at")?;

    let draft = ProductDraft {
        name: get(row, "name")?,
        sku: get(row, "sku")?,
        description: get(row, "description")?,
        price: Money::from_cents(from_db_int(price_cents, "price_cents")?),
        category: get(row, "category")?,
        amount_in_stock: from_db_int(amount_in_stock, "amount_in_stock")?,
    };

    Ok(Product::restore(
        ProductId::from_uuid(id),
        draft,
        manufacturer.map(ManufacturerId::from_uuid),
        created_at,
        updated_at,
    ))
}

fn manufacturer_from_row(row: &PgRow) -> StoreResult<Manufacturer> {
    let id: Uuid = get(row, "id")?;
    let created_at: DateTime<Utc> = get(row, "created_at")?;
    let updated_at: DateTime<Utc> = get(row, "updated_at")?;

    let address = Address {
        street: get(row, "address_street")?,
        city: get(row, "address_city")?,
        zip_code: get(row, "address_zip_code")?,
        country: get(row, "address_country")?,
    };

    let contact_name: Option<String> = get(row, "contact_name")?;
    let contact_email: Option<String> = get(row, "contact_email")?;
    let contact_phone: Option<String> = get(row, "contact_phone")?;
    let contact = match (contact_name, contact_email) {
        (Some(name), Some(email)) => Some(
            Contact::new(name, email, contact_phone)
                .map_err(|e| StoreError::Unavailable(format!("stored contact is invalid: {e}")))?,
        ),
        _ => None,
    };

    let draft = ManufacturerDraft {
        name: get(row, "name")?,
        country: get(row, "country")?,
        website: get(row, "website")?,
        description: get(row, "description")?,
        address: Some(address),
        contact,
    };

    Ok(Manufacturer::restore(
        ManufacturerId::from_uuid(id),
        draft,
        created_at,
        updated_at,
    ))
}

fn get<'r, T>(row: &'r PgRow, column: &'static str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column).map_err(|e| decode_error(column, e))
}

fn decode_error(column: &str, err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(format!("failed to decode column {column}: {err}"))
}

fn to_db_int<T: TryInto<i64>>(value: T, field: &str) -> StoreResult<i64> {
    value
        .try_into()
        .map_err(|_| StoreError::Unrepresentable(format!("{field} is too large")))
}

fn from_db_int(value: i64, column: &str) -> StoreResult<u64> {
    u64::try_from(value).map_err(|_| StoreError::Unavailable(format!("negative value in column {column}")))
}

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn violation_code(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|code| match code.as_ref() {
            UNIQUE_VIOLATION => UNIQUE_VIOLATION,
            FOREIGN_KEY_VIOLATION => FOREIGN_KEY_VIOLATION,
            _ => "",
        }),
        _ => None,
    }
}

fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint(),
        _ => None,
    }
}

fn map_product_write_error(operation: &str, product: &Product, err: sqlx::Error) -> StoreError {
    match (violation_code(&err), product.manufacturer()) {
        (Some(FOREIGN_KEY_VIOLATION), Some(id)) => StoreError::MissingManufacturer(id),
        _ => map_sqlx_error(operation, err),
    }
}

fn map_manufacturer_write_error(operation: &str, manufacturer: &Manufacturer, err: sqlx::Error) -> StoreError {
    if violation_code(&err) == Some(UNIQUE_VIOLATION) {
        match violated_constraint(&err) {
            Some("manufacturers_name_key") => {
                return StoreError::DuplicateName(manufacturer.name().to_string());
            }
            Some("manufacturers_contact_email_key") => {
                let email = manufacturer.contact().map(|c| c.email().to_string()).unwrap_or_default();
                return StoreError::DuplicateContactEmail(email);
            }
            _ => {}
        }
    }
    map_sqlx_error(operation, err)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Unavailable(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("timed out acquiring a connection in {}", operation))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {}: {}", operation, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_integers_reject_out_of_range_values() {
        assert_eq!(to_db_int(42, "price").unwrap(), 42);
        assert!(matches!(to_db_int(u64::MAX, "price"), Err(StoreError::Unrepresentable(_))));
        assert!(matches!(
            to_db_int(Money::from_cents(u64::MAX).times(2).unwrap().cents(), "price"),
            Err(StoreError::Unrepresentable(_))
        ));
        assert!(matches!(from_db_int(-1, "price_cents"), Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn pool_errors_are_unavailable() {
        assert!(matches!(
            map_sqlx_error("ping", sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert_eq!(violation_code(&sqlx::Error::PoolClosed), None);
    }

    #[test]
    fn bootstrap_sql_declares_uniqueness_constraints() {
        assert!(BOOTSTRAP_SQL.contains("manufacturers_name_key"));
        assert!(BOOTSTRAP_SQL.contains("manufacturers_contact_email_key"));
        assert!(BOOTSTRAP_SQL.contains("REFERENCES manufacturers (id)"));
    }
}
