//! Persistence for every collection the storefront owns.
//!
//! Each collection has its own trait so services only name what they touch.
//! Two backends implement all of them:
//!
//! - [`postgres::PgStore`] - `PostgreSQL` via sqlx, used in production
//! - [`memory::MemoryStore`] - process-local maps, used for development and tests
//!
//! Lookups that may legitimately miss return `Option`; only backend failures
//! and uniqueness violations are errors.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{Cart, Category, Message, Order, OrderStatus, Product, User};
use crate::domain::value_objects::Quantity;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated; carries the offending field.
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    /// Merging into a cart line would push its quantity past `Quantity::MAX`.
    #[error("cart line quantity limit exceeded")]
    QuantityLimit,

    /// A row still references the record being deleted.
    #[error("record is still referenced")]
    Referenced,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Filter for product listings. Results are newest first.
#[derive(Clone, Debug, Default)]
pub struct ProductQuery {
    pub category_id: Option<Uuid>,
    /// Case-insensitive substring over name and description.
    pub search: Option<String>,
    pub in_stock_only: bool,
}

impl ProductQuery {
    /// The public catalog: in-stock products only.
    pub fn storefront() -> Self { Self { in_stock_only: true, ..Self::default() } }

    pub fn matches(&self, product: &Product) -> bool {
        if self.in_stock_only && !product.in_stock { return false; }
        if self.category_id.is_some_and(|c| c != product.category_id) { return false; }
        match &self.search {
            Some(needle) => product.matches_search(&needle.to_lowercase()),
            None => true,
        }
    }
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Categories sorted by name.
    async fn categories(&self, active_only: bool) -> StoreResult<Vec<Category>>;
    async fn category(&self, id: Uuid) -> StoreResult<Option<Category>>;
    async fn categories_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Category>>;
    async fn insert_category(&self, category: &Category) -> StoreResult<()>;
    async fn update_category(&self, category: &Category) -> StoreResult<bool>;
    async fn delete_category(&self, id: Uuid) -> StoreResult<bool>;
    async fn count_categories(&self) -> StoreResult<u64>;
    async fn count_products_in_category(&self, id: Uuid) -> StoreResult<u64>;

    async fn products(&self, query: &ProductQuery) -> StoreResult<Vec<Product>>;
    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>>;
    async fn products_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>>;
    async fn insert_product(&self, product: &Product) -> StoreResult<()>;
    async fn update_product(&self, product: &Product) -> StoreResult<bool>;
    async fn delete_product(&self, id: Uuid) -> StoreResult<bool>;
    async fn count_products(&self) -> StoreResult<u64>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn cart(&self, user_id: Uuid) -> StoreResult<Option<Cart>>;
    /// Atomically creates the cart if needed and accumulates `quantity` onto the product's line.
    async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: Quantity) -> StoreResult<Cart>;
    /// Removes the product's line; `None` when the user has no cart.
    async fn remove_from_cart(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<Cart>>;
    /// Deletes the cart document. Returns whether one existed.
    async fn delete_cart(&self, user_id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: &Order) -> StoreResult<()>;
    /// Orders of one user, newest first.
    async fn orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>>;
    /// Every order, newest first.
    async fn all_orders(&self) -> StoreResult<Vec<Order>>;
    async fn set_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<Option<Order>>;
    async fn count_orders(&self) -> StoreResult<u64>;
    async fn total_revenue(&self) -> StoreResult<Decimal>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;
    /// Non-admin users, newest first.
    async fn customers(&self) -> StoreResult<Vec<User>>;
    async fn count_customers(&self) -> StoreResult<u64>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert_message(&self, message: &Message) -> StoreResult<()>;
    /// Messages newest first.
    async fn messages(&self) -> StoreResult<Vec<Message>>;
    async fn count_unread_messages(&self) -> StoreResult<u64>;
    async fn mark_message_read(&self, id: Uuid) -> StoreResult<Option<Message>>;
    async fn delete_message(&self, id: Uuid) -> StoreResult<bool>;
}

/// Everything the application needs from a backend.
pub trait Store: CatalogStore + CartStore + OrderStore + UserStore + MessageStore {}

impl<T> Store for T where T: CatalogStore + CartStore + OrderStore + UserStore + MessageStore {}
