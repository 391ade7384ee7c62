//! In-process store backed by hash maps behind a single lock.
//!
//! Every operation takes the lock once, so cart mutations are serialized the
//! same way the `PostgreSQL` backend serializes them with row upserts.

use std::cmp::Reverse;
use std::collections::HashMap;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CartStore, CatalogStore, MessageStore, OrderStore, ProductQuery, StoreError, StoreResult,
    UserStore,
};
use crate::domain::aggregates::{Cart, Category, Message, Order, OrderStatus, Product, User};
use crate::domain::value_objects::Quantity;

#[derive(Default)]
struct Collections {
    categories: HashMap<Uuid, Category>,
    products: HashMap<Uuid, Product>,
    carts: HashMap<Uuid, Cart>,
    orders: HashMap<Uuid, Order>,
    users: HashMap<Uuid, User>,
    messages: HashMap<Uuid, Message>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
    #[cfg(test)]
    fail_cart_deletes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Makes every subsequent `delete_cart` fail.
    #[cfg(test)]
    pub(crate) fn fail_cart_deletes(&self) { self.fail_cart_deletes.store(true, Ordering::SeqCst); }
}

fn newest_first<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(|item| Reverse(key(item)));
    items
}

fn count<T>(items: impl Iterator<Item = T>) -> u64 {
    u64::try_from(items.count()).unwrap_or(u64::MAX)
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn categories(&self, active_only: bool) -> StoreResult<Vec<Category>> {
        let db = self.inner.read().await;
        let mut categories: Vec<Category> = db
            .categories
            .values()
            .filter(|c| !active_only || c.is_active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(self.inner.read().await.categories.get(&id).cloned())
    }

    async fn categories_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Category>> {
        let db = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| db.categories.get(id).cloned()).collect())
    }

    async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if db.categories.values().any(|c| c.name == category.name) {
            return Err(StoreError::Duplicate("category name"));
        }
        db.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn update_category(&self, category: &Category) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        if db.categories.values().any(|c| c.name == category.name && c.id != category.id) {
            return Err(StoreError::Duplicate("category name"));
        }
        match db.categories.get_mut(&category.id) {
            Some(existing) => {
                *existing = category.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        if db.products.values().any(|p| p.category_id == id) {
            return Err(StoreError::Referenced);
        }
        Ok(db.categories.remove(&id).is_some())
    }

    async fn count_categories(&self) -> StoreResult<u64> {
        Ok(count(self.inner.read().await.categories.values()))
    }

    async fn count_products_in_category(&self, id: Uuid) -> StoreResult<u64> {
        let db = self.inner.read().await;
        Ok(count(db.products.values().filter(|p| p.category_id == id)))
    }

    async fn products(&self, query: &ProductQuery) -> StoreResult<Vec<Product>> {
        let db = self.inner.read().await;
        let products = db.products.values().filter(|p| query.matches(p)).cloned().collect();
        Ok(newest_first(products, |p| (p.created_at, p.id)))
    }

    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.inner.read().await.products.get(&id).cloned())
    }

    async fn products_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        let db = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| db.products.get(id).cloned()).collect())
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        self.inner.write().await.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        match db.products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.inner.write().await.products.remove(&id).is_some())
    }

    async fn count_products(&self) -> StoreResult<u64> {
        Ok(count(self.inner.read().await.products.values()))
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn cart(&self, user_id: Uuid) -> StoreResult<Option<Cart>> {
        Ok(self.inner.read().await.carts.get(&user_id).cloned())
    }

    async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: Quantity) -> StoreResult<Cart> {
        let mut db = self.inner.write().await;
        let cart = db.carts.entry(user_id).or_insert_with(|| Cart::new(user_id));
        cart.add_item(product_id, quantity).map_err(|_| StoreError::QuantityLimit)?;
        Ok(cart.clone())
    }

    async fn remove_from_cart(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<Cart>> {
        let mut db = self.inner.write().await;
        Ok(db.carts.get_mut(&user_id).map(|cart| {
            cart.remove_item(product_id);
            cart.clone()
        }))
    }

    async fn delete_cart(&self, user_id: Uuid) -> StoreResult<bool> {
        #[cfg(test)]
        if self.fail_cart_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("cart deletes disabled".into()));
        }
        Ok(self.inner.write().await.carts.remove(&user_id).is_some())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        self.inner.write().await.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let db = self.inner.read().await;
        let orders = db.orders.values().filter(|o| o.user_id() == user_id).cloned().collect();
        Ok(newest_first(orders, |o| (o.created_at(), o.id())))
    }

    async fn all_orders(&self) -> StoreResult<Vec<Order>> {
        let db = self.inner.read().await;
        Ok(newest_first(db.orders.values().cloned().collect(), |o| (o.created_at(), o.id())))
    }

    async fn set_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<Option<Order>> {
        let mut db = self.inner.write().await;
        Ok(db.orders.get_mut(&id).map(|order| {
            order.set_status(status);
            order.clone()
        }))
    }

    async fn count_orders(&self) -> StoreResult<u64> {
        Ok(count(self.inner.read().await.orders.values()))
    }

    async fn total_revenue(&self) -> StoreResult<Decimal> {
        Ok(self.inner.read().await.orders.values().map(Order::total_amount).sum())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if db.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email"));
        }
        db.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.values().find(|u| u.email == email).cloned())
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let db = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| db.users.get(id).cloned()).collect())
    }

    async fn customers(&self) -> StoreResult<Vec<User>> {
        let db = self.inner.read().await;
        let users = db.users.values().filter(|u| !u.is_admin).cloned().collect();
        Ok(newest_first(users, |u| (u.created_at, u.id)))
    }

    async fn count_customers(&self) -> StoreResult<u64> {
        Ok(count(self.inner.read().await.users.values().filter(|u| !u.is_admin)))
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert_message(&self, message: &Message) -> StoreResult<()> {
        self.inner.write().await.messages.insert(message.id, message.clone());
        Ok(())
    }

    async fn messages(&self) -> StoreResult<Vec<Message>> {
        let db = self.inner.read().await;
        Ok(newest_first(db.messages.values().cloned().collect(), |m| (m.created_at, m.id)))
    }

    async fn count_unread_messages(&self) -> StoreResult<u64> {
        Ok(count(self.inner.read().await.messages.values().filter(|m| !m.is_read)))
    }

    async fn mark_message_read(&self, id: Uuid) -> StoreResult<Option<Message>> {
        let mut db = self.inner.write().await;
        Ok(db.messages.get_mut(&id).map(|m| {
            m.is_read = true;
            m.clone()
        }))
    }

    async fn delete_message(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.inner.write().await.messages.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::sample;

    #[tokio::test]
    async fn test_storefront_query_filters() {
        let store = MemoryStore::new();
        let cat_a = Uuid::now_v7();
        let cat_b = Uuid::now_v7();
        let mut hidden = sample("Peacock Art", 2200, cat_a);
        hidden.in_stock = false;
        store.insert_product(&sample("Fish Painting", 1800, cat_a)).await.unwrap();
        store.insert_product(&sample("Silver Bangle", 450, cat_b)).await.unwrap();
        store.insert_product(&hidden).await.unwrap();

        assert_eq!(store.products(&ProductQuery::storefront()).await.unwrap().len(), 2);
        assert_eq!(store.products(&ProductQuery::default()).await.unwrap().len(), 3);

        let by_cat = ProductQuery { category_id: Some(cat_a), ..ProductQuery::storefront() };
        let found = store.products(&by_cat).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Fish Painting");

        let search = ProductQuery { search: Some("BANGLE".into()), ..ProductQuery::storefront() };
        assert_eq!(store.products(&search).await.unwrap()[0].name, "Silver Bangle");
    }

    #[tokio::test]
    async fn test_duplicate_category_name() {
        let store = MemoryStore::new();
        store.insert_category(&Category::create("Embroidery", None, None)).await.unwrap();
        let err = store.insert_category(&Category::create("Embroidery", None, None)).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_categories_sorted_and_filtered() {
        let store = MemoryStore::new();
        let mut inactive = Category::create("Archive", None, None);
        inactive.is_active = false;
        store.insert_category(&Category::create("Home Decor", None, None)).await.unwrap();
        store.insert_category(&Category::create("Embroidery", None, None)).await.unwrap();
        store.insert_category(&inactive).await.unwrap();

        let names = |cs: Vec<Category>| cs.into_iter().map(|c| c.name).collect::<Vec<_>>();
        assert_eq!(names(store.categories(false).await.unwrap()), ["Archive", "Embroidery", "Home Decor"]);
        assert_eq!(names(store.categories(true).await.unwrap()), ["Embroidery", "Home Decor"]);
    }

    #[tokio::test]
    async fn test_cart_lifecycle() {
        let store = MemoryStore::new();
        let user = Uuid::now_v7();
        let product = Uuid::now_v7();
        assert!(store.cart(user).await.unwrap().is_none());
        assert!(store.remove_from_cart(user, product).await.unwrap().is_none());

        store.add_to_cart(user, product, Quantity::ONE).await.unwrap();
        let cart = store.add_to_cart(user, product, Quantity::new(2).unwrap()).await.unwrap();
        assert_eq!(cart.items()[0].quantity.value(), 3);

        let cart = store.remove_from_cart(user, product).await.unwrap().unwrap();
        assert!(cart.is_empty());
        assert!(store.cart(user).await.unwrap().is_some());
        assert!(store.delete_cart(user).await.unwrap());
        assert!(!store.delete_cart(user).await.unwrap());
    }

    #[tokio::test]
    async fn test_cart_merge_past_max_is_rejected() {
        let store = MemoryStore::new();
        let user = Uuid::now_v7();
        let product = Uuid::now_v7();
        store.add_to_cart(user, product, Quantity::new(Quantity::MAX).unwrap()).await.unwrap();
        let err = store.add_to_cart(user, product, Quantity::new(5).unwrap()).await.unwrap_err();
        assert!(matches!(err, StoreError::QuantityLimit));
        let cart = store.cart(user).await.unwrap().unwrap();
        assert_eq!(cart.items()[0].quantity.value(), Quantity::MAX);
    }

    #[tokio::test]
    async fn test_deleting_product_keeps_cart_lines() {
        let store = MemoryStore::new();
        let user = Uuid::now_v7();
        let product = sample("Runner", 900, Uuid::now_v7());
        store.insert_product(&product).await.unwrap();
        store.add_to_cart(user, product.id, Quantity::ONE).await.unwrap();

        assert!(store.delete_product(product.id).await.unwrap());
        let cart = store.cart(user).await.unwrap().unwrap();
        assert_eq!(cart.items()[0].product_id, product.id);
    }
}
