//! `PostgreSQL` store.
//!
//! Categories, products, users and messages are plain rows. Carts are a
//! `carts` row plus one `cart_items` row per product, so quantity merges are a
//! single upsert. Orders keep their lines and customer details as JSONB
//! documents because they are never queried field by field.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::types::Json;
use uuid::Uuid;

use super::{
    CartStore, CatalogStore, MessageStore, OrderStore, ProductQuery, StoreError, StoreResult,
    UserStore,
};
use crate::domain::aggregates::{
    Cart, CartLine, Category, CustomerInfo, Message, Order, OrderLine, OrderStatus, Product, User,
};
use crate::domain::value_objects::{Price, Quantity};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects with a bounded pool and runs pending migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {e}")))?;
        Ok(Self { pool })
    }
}

fn unique_as(field: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::Duplicate(field),
        other => StoreError::Database(other),
    }
}

fn to_count(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

fn quantity_from_db(raw: i32) -> StoreResult<Quantity> {
    u32::try_from(raw)
        .ok()
        .and_then(|v| Quantity::new(v).ok())
        .ok_or_else(|| StoreError::Corrupt(format!("invalid quantity {raw}")))
}

fn quantity_to_db(qty: Quantity) -> StoreResult<i32> {
    i32::try_from(qty.value()).map_err(|_| StoreError::QuantityLimit)
}

// =============================================================================
// Rows
// =============================================================================

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: String,
    price: Decimal,
    image: String,
    category_id: Uuid,
    in_stock: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;
    fn try_from(r: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(r.price).map_err(|e| StoreError::Corrupt(format!("product {}: {e}", r.id)))?;
        Ok(Product {
            id: r.id, name: r.name, description: r.description, price, image: r.image,
            category_id: r.category_id, in_stock: r.in_stock, created_at: r.created_at,
        })
    }
}

/// Order line as stored in JSONB. Prices are strings so no precision is lost.
#[derive(Serialize, Deserialize)]
struct StoredLine {
    product_id: Uuid,
    quantity: u32,
    #[serde(with = "rust_decimal::serde::str")]
    price: Decimal,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    items: Json<Vec<StoredLine>>,
    total_amount: Decimal,
    customer_info: Json<CustomerInfo>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;
    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = r.status.parse().map_err(|e| StoreError::Corrupt(format!("order {}: {e}", r.id)))?;
        let items = r
            .items
            .0
            .into_iter()
            .map(|l| {
                let quantity = Quantity::new(l.quantity).map_err(|e| StoreError::Corrupt(format!("order {}: {e}", r.id)))?;
                Ok(OrderLine { product_id: l.product_id, quantity, price: l.price })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Order::restore(r.id, r.user_id, items, r.total_amount, r.customer_info.0, status, r.created_at))
    }
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    product_id: Uuid,
    quantity: i32,
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, image, category_id, in_stock, created_at";
const ORDER_COLUMNS: &str = "id, user_id, items, total_amount, customer_info, status, created_at";

async fn load_cart(conn: &mut PgConnection, user_id: Uuid) -> StoreResult<Option<Cart>> {
    let updated_at: Option<(DateTime<Utc>,)> = sqlx::query_as("SELECT updated_at FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some((updated_at,)) = updated_at else { return Ok(None) };

    let rows = sqlx::query_as::<_, CartItemRow>(
        "SELECT product_id, quantity FROM cart_items WHERE user_id = $1 ORDER BY added_at, product_id",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    let items = rows
        .into_iter()
        .map(|r| Ok(CartLine { product_id: r.product_id, quantity: quantity_from_db(r.quantity)? }))
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(Some(Cart::restore(user_id, items, updated_at)))
}

// =============================================================================
// Catalog
// =============================================================================

#[async_trait]
impl CatalogStore for PgStore {
    async fn categories(&self, active_only: bool) -> StoreResult<Vec<Category>> {
        Ok(sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE ($1 = FALSE OR is_active) ORDER BY name",
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn categories_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Category>> {
        Ok(sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_category(&self, c: &Category) -> StoreResult<()> {
        sqlx::query("INSERT INTO categories (id, name, description, image, is_active, created_at) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(c.id).bind(&c.name).bind(&c.description).bind(&c.image).bind(c.is_active).bind(c.created_at)
            .execute(&self.pool)
            .await
            .map_err(unique_as("category name"))?;
        Ok(())
    }

    async fn update_category(&self, c: &Category) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE categories SET name = $2, description = $3, image = $4, is_active = $5 WHERE id = $1")
            .bind(c.id).bind(&c.name).bind(&c.description).bind(&c.image).bind(c.is_active)
            .execute(&self.pool)
            .await
            .map_err(unique_as("category name"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => StoreError::Referenced,
                other => StoreError::Database(other),
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_categories(&self) -> StoreResult<u64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories").fetch_one(&self.pool).await?;
        Ok(to_count(n))
    }

    async fn count_products_in_category(&self, id: Uuid) -> StoreResult<u64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(to_count(n))
    }

    async fn products(&self, query: &ProductQuery) -> StoreResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE ($1 = FALSE OR in_stock) \
               AND ($2::uuid IS NULL OR category_id = $2) \
               AND ($3::text IS NULL OR strpos(lower(name), lower($3)) > 0 OR strpos(lower(description), lower($3)) > 0) \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(query.in_stock_only)
            .bind(query.category_id)
            .bind(query.search.as_deref())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Product::try_from)
            .transpose()
    }

    async fn products_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)");
        let rows = sqlx::query_as::<_, ProductRow>(&sql).bind(ids).fetch_all(&self.pool).await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    async fn insert_product(&self, p: &Product) -> StoreResult<()> {
        sqlx::query("INSERT INTO products (id, name, description, price, image, category_id, in_stock, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)")
            .bind(p.id).bind(&p.name).bind(&p.description).bind(p.price.amount()).bind(&p.image)
            .bind(p.category_id).bind(p.in_stock).bind(p.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_product(&self, p: &Product) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE products SET name = $2, description = $3, price = $4, image = $5, category_id = $6, in_stock = $7 WHERE id = $1")
            .bind(p.id).bind(&p.name).bind(&p.description).bind(p.price.amount()).bind(&p.image)
            .bind(p.category_id).bind(p.in_stock)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_products(&self) -> StoreResult<u64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products").fetch_one(&self.pool).await?;
        Ok(to_count(n))
    }
}

// =============================================================================
// Carts
// =============================================================================

#[async_trait]
impl CartStore for PgStore {
    async fn cart(&self, user_id: Uuid) -> StoreResult<Option<Cart>> {
        let mut conn = self.pool.acquire().await?;
        load_cart(&mut conn, user_id).await
    }

    async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: Quantity) -> StoreResult<Cart> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO carts (user_id, updated_at) VALUES ($1, NOW()) ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        // The WHERE leaves the row alone rather than overflowing INTEGER.
        let merged = sqlx::query(
            "INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity \
             WHERE cart_items.quantity::bigint + EXCLUDED.quantity <= $4",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity_to_db(quantity)?)
        .bind(i64::from(Quantity::MAX))
        .execute(&mut *tx)
        .await?;
        if merged.rows_affected() == 0 {
            return Err(StoreError::QuantityLimit);
        }
        let cart = load_cart(&mut tx, user_id)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("cart for {user_id} vanished inside its transaction")))?;
        tx.commit().await?;
        Ok(cart)
    }

    async fn remove_from_cart(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<Cart>> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        if removed.rows_affected() > 0 {
            sqlx::query("UPDATE carts SET updated_at = NOW() WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        let cart = load_cart(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(cart)
    }

    async fn delete_cart(&self, user_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM carts WHERE user_id = $1").bind(user_id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Orders
// =============================================================================

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, o: &Order) -> StoreResult<()> {
        let lines: Vec<StoredLine> = o
            .items()
            .iter()
            .map(|l| StoredLine { product_id: l.product_id, quantity: l.quantity.value(), price: l.price })
            .collect();
        sqlx::query("INSERT INTO orders (id, user_id, items, total_amount, customer_info, status, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)")
            .bind(o.id()).bind(o.user_id()).bind(Json(lines)).bind(o.total_amount())
            .bind(Json(o.customer_info())).bind(o.status().as_str()).bind(o.created_at())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, OrderRow>(&sql).bind(user_id).fetch_all(&self.pool).await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn all_orders(&self) -> StoreResult<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, OrderRow>(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn set_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<Option<Order>> {
        let sql = format!("UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}");
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(Order::try_from)
            .transpose()
    }

    async fn count_orders(&self) -> StoreResult<u64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders").fetch_one(&self.pool).await?;
        Ok(to_count(n))
    }

    async fn total_revenue(&self) -> StoreResult<Decimal> {
        let (sum,): (Option<Decimal>,) = sqlx::query_as("SELECT SUM(total_amount) FROM orders").fetch_one(&self.pool).await?;
        Ok(sum.unwrap_or(Decimal::ZERO))
    }
}

// =============================================================================
// Users
// =============================================================================

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, u: &User) -> StoreResult<()> {
        sqlx::query("INSERT INTO users (id, name, email, password_hash, is_admin, created_at) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(u.id).bind(&u.name).bind(&u.email).bind(&u.password_hash).bind(u.is_admin).bind(u.created_at)
            .execute(&self.pool)
            .await
            .map_err(unique_as("email"))?;
        Ok(())
    }

    async fn user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(&self.pool).await?)
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1").bind(email).fetch_optional(&self.pool).await?)
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)").bind(ids).fetch_all(&self.pool).await?)
    }

    async fn customers(&self) -> StoreResult<Vec<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE NOT is_admin ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count_customers(&self) -> StoreResult<u64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE NOT is_admin").fetch_one(&self.pool).await?;
        Ok(to_count(n))
    }
}

// =============================================================================
// Messages
// =============================================================================

#[async_trait]
impl MessageStore for PgStore {
    async fn insert_message(&self, m: &Message) -> StoreResult<()> {
        sqlx::query("INSERT INTO messages (id, name, email, message, is_read, created_at) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(m.id).bind(&m.name).bind(&m.email).bind(&m.message).bind(m.is_read).bind(m.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn messages(&self) -> StoreResult<Vec<Message>> {
        Ok(sqlx::query_as::<_, Message>("SELECT * FROM messages ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count_unread_messages(&self) -> StoreResult<u64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE NOT is_read").fetch_one(&self.pool).await?;
        Ok(to_count(n))
    }

    async fn mark_message_read(&self, id: Uuid) -> StoreResult<Option<Message>> {
        Ok(sqlx::query_as::<_, Message>("UPDATE messages SET is_read = TRUE WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_message(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
