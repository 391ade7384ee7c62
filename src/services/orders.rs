//! Checkout and order history.
//!
//! Placing an order prices every line from the product's current record,
//! never from anything the client sent, and stores those prices on the
//! order. The cart is deleted afterwards as a separate step: if that fails
//! the order stands and the caller is told the cart was not cleared.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::cart::cart_products;
use crate::domain::aggregates::{CustomerInfo, Order, OrderError, OrderLine, OrderStatus, Product, UserRef};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::Quantity;
use crate::error::{AppError, Result};
use crate::events::EventPublisher;
use crate::store::Store;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Checkout {
    pub customer_info: CustomerInfo,
}

/// Outcome of a checkout. The order exists whenever this is returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_id: Uuid,
    pub cart_cleared: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub image: String,
}

impl From<&Product> for ProductSummary {
    fn from(p: &Product) -> Self { Self { id: p.id, name: p.name.clone(), image: p.image.clone() } }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub product_id: Uuid,
    /// Live product, absent once the product is deleted.
    pub product: Option<ProductSummary>,
    pub quantity: Quantity,
    /// Unit price when the order was placed.
    pub price: Decimal,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,
    pub items: Vec<OrderItemView>,
    pub total_amount: Decimal,
    pub customer_info: CustomerInfo,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

pub struct OrderService<'a> {
    store: &'a dyn Store,
    events: &'a EventPublisher,
}

impl<'a> OrderService<'a> {
    pub fn new(store: &'a dyn Store, events: &'a EventPublisher) -> Self { Self { store, events } }

    #[instrument(skip(self, checkout))]
    pub async fn place_order(&self, user_id: Uuid, checkout: Checkout) -> Result<PlacedOrder> {
        let cart = self
            .store
            .cart(user_id)
            .await?
            .filter(|c| !c.is_empty())
            .ok_or(AppError::EmptyCart)?;

        let products = cart_products(self.store, &cart).await?;
        let lines = cart
            .items()
            .iter()
            .map(|line| {
                products
                    .get(&line.product_id)
                    .map(|product| OrderLine::snapshot(product, line.quantity))
                    .ok_or_else(|| AppError::Validation(format!("Product {} is no longer available", line.product_id)))
            })
            .collect::<Result<Vec<_>>>()?;

        let order = Order::place(user_id, lines, checkout.customer_info).map_err(|e| match e {
            OrderError::NoItems => AppError::EmptyCart,
            other => AppError::Validation(other.to_string()),
        })?;
        self.store.insert_order(&order).await?;
        info!(order_id = %order.id(), %user_id, total = %order.total_amount(), "Order placed");

        let cart_cleared = match self.store.delete_cart(user_id).await {
            Ok(_) => true,
            Err(e) => {
                warn!(order_id = %order.id(), %user_id, error = %e, "Order placed but cart was not cleared");
                false
            }
        };

        self.events
            .publish(DomainEvent::OrderPlaced { order_id: order.id(), user_id, total_amount: order.total_amount() })
            .await;
        Ok(PlacedOrder { order_id: order.id(), cart_cleared })
    }

    /// The user's orders, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, user_id: Uuid) -> Result<Vec<OrderView>> {
        let orders = self.store.orders_for_user(user_id).await?;
        self.views(orders, false).await
    }

    /// Every order with its customer resolved, newest first.
    #[instrument(skip(self))]
    pub async fn list_all_orders(&self) -> Result<Vec<OrderView>> {
        let orders = self.store.all_orders().await?;
        self.views(orders, true).await
    }

    /// Replaces the status unconditionally.
    #[instrument(skip(self))]
    pub async fn set_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Order> {
        let order = self
            .store
            .set_order_status(order_id, status)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".into()))?;
        info!(%order_id, %status, "Order status changed");
        self.events.publish(DomainEvent::OrderStatusChanged { order_id, status }).await;
        Ok(order)
    }

    async fn views(&self, orders: Vec<Order>, with_users: bool) -> Result<Vec<OrderView>> {
        let mut product_ids: Vec<Uuid> = orders.iter().flat_map(|o| o.items().iter().map(|l| l.product_id)).collect();
        product_ids.sort_unstable();
        product_ids.dedup();
        let products: HashMap<Uuid, ProductSummary> = self
            .store
            .products_by_ids(&product_ids)
            .await?
            .iter()
            .map(|p| (p.id, ProductSummary::from(p)))
            .collect();

        let users: HashMap<Uuid, UserRef> = if with_users {
            let mut user_ids: Vec<Uuid> = orders.iter().map(Order::user_id).collect();
            user_ids.sort_unstable();
            user_ids.dedup();
            self.store.users_by_ids(&user_ids).await?.iter().map(|u| (u.id, u.to_ref())).collect()
        } else {
            HashMap::new()
        };

        Ok(orders
            .into_iter()
            .map(|order| OrderView {
                id: order.id(),
                user_id: order.user_id(),
                user: users.get(&order.user_id()).cloned(),
                items: order
                    .items()
                    .iter()
                    .map(|l| OrderItemView {
                        product_id: l.product_id,
                        product: products.get(&l.product_id).cloned(),
                        quantity: l.quantity,
                        price: l.price,
                    })
                    .collect(),
                total_amount: order.total_amount(),
                customer_info: order.customer_info().clone(),
                status: order.status(),
                created_at: order.created_at(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::aggregates::product::sample;
    use crate::domain::value_objects::Price;
    use crate::services::cart::{AddItem, CartService};
    use crate::services::testing;
    use crate::store::MemoryStore;

    async fn fill_cart(state: &crate::state::AppState, user: Uuid, lines: &[(&Product, u32)]) {
        let carts = CartService::new(state.store.as_ref());
        for (product, quantity) in lines {
            carts.add_item(user, AddItem { product_id: product.id, quantity: *quantity }).await.unwrap();
        }
    }

    fn checkout() -> Checkout {
        Checkout {
            customer_info: CustomerInfo {
                name: "Asha".into(),
                email: "asha@example.com".into(),
                phone: "9876543210".into(),
                address: "12 Station Road, Darbhanga".into(),
            },
        }
    }

    #[tokio::test]
    async fn test_place_order_snapshots_prices_and_clears_cart() {
        let state = testing::state();
        let cat = Uuid::now_v7();
        let a = sample("A", 100, cat);
        let b = sample("B", 250, cat);
        state.store.insert_product(&a).await.unwrap();
        state.store.insert_product(&b).await.unwrap();
        let user = Uuid::now_v7();
        fill_cart(&state, user, &[(&a, 1), (&b, 1), (&a, 1)]).await;

        let orders = OrderService::new(state.store.as_ref(), &state.events);
        let placed = orders.place_order(user, checkout()).await.unwrap();
        assert!(placed.cart_cleared);

        // Price changes after checkout must not touch the order.
        let mut repriced = a.clone();
        repriced.price = Price::new(Decimal::new(999, 0)).unwrap();
        state.store.update_product(&repriced).await.unwrap();

        let history = orders.list_orders(user).await.unwrap();
        assert_eq!(history.len(), 1);
        let order = &history[0];
        assert_eq!(order.id, placed.order_id);
        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(order.total_amount, Decimal::new(450, 0));
        let items: Vec<_> = order.items.iter().map(|i| (i.product_id, i.quantity.value(), i.price)).collect();
        assert_eq!(items, vec![(a.id, 2, Decimal::new(100, 0)), (b.id, 1, Decimal::new(250, 0))]);
        assert_eq!(order.items[0].product.as_ref().unwrap().name, "A");
        assert_eq!(order.customer_info.address, "12 Station Road, Darbhanga");

        let cart = CartService::new(state.store.as_ref()).get_cart(user).await.unwrap();
        assert!(cart.items.is_empty());
        assert!(state.store.cart(user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_cart_creates_no_order() {
        let state = testing::state();
        let orders = OrderService::new(state.store.as_ref(), &state.events);
        let user = Uuid::now_v7();
        assert!(matches!(orders.place_order(user, checkout()).await, Err(AppError::EmptyCart)));

        let p = sample("Tote", 650, Uuid::now_v7());
        state.store.insert_product(&p).await.unwrap();
        fill_cart(&state, user, &[(&p, 1)]).await;
        CartService::new(state.store.as_ref()).remove_item(user, p.id).await.unwrap();
        assert!(matches!(orders.place_order(user, checkout()).await, Err(AppError::EmptyCart)));
        assert_eq!(state.store.count_orders().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_vanished_product_blocks_checkout() {
        let state = testing::state();
        let p = sample("Runner", 900, Uuid::now_v7());
        state.store.insert_product(&p).await.unwrap();
        let user = Uuid::now_v7();
        fill_cart(&state, user, &[(&p, 1)]).await;
        state.store.delete_product(p.id).await.unwrap();

        let orders = OrderService::new(state.store.as_ref(), &state.events);
        assert!(matches!(orders.place_order(user, checkout()).await, Err(AppError::Validation(_))));
        assert_eq!(state.store.count_orders().await.unwrap(), 0);
        assert!(state.store.cart(user).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_oversized_total_is_rejected_and_cart_kept() {
        let state = testing::state();
        let p = sample("Commission", 9_999_999_999, Uuid::now_v7());
        state.store.insert_product(&p).await.unwrap();
        let user = Uuid::now_v7();
        fill_cart(&state, user, &[(&p, 200)]).await;

        let orders = OrderService::new(state.store.as_ref(), &state.events);
        let err = orders.place_order(user, checkout()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(state.store.count_orders().await.unwrap(), 0);
        assert!(state.store.cart(user).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_cart_clear_keeps_order() {
        let store = Arc::new(MemoryStore::new());
        let state = testing::state_with(store.clone());
        let p = sample("Bangle", 300, Uuid::now_v7());
        state.store.insert_product(&p).await.unwrap();
        let user = Uuid::now_v7();
        fill_cart(&state, user, &[(&p, 3)]).await;
        store.fail_cart_deletes();

        let orders = OrderService::new(state.store.as_ref(), &state.events);
        let placed = orders.place_order(user, checkout()).await.unwrap();
        assert!(!placed.cart_cleared);
        let history = orders.list_orders(user).await.unwrap();
        assert_eq!(history[0].id, placed.order_id);
        assert_eq!(history[0].total_amount, Decimal::new(900, 0));
    }

    #[tokio::test]
    async fn test_set_status_is_unguarded() {
        let state = testing::state();
        let p = sample("Tote", 650, Uuid::now_v7());
        state.store.insert_product(&p).await.unwrap();
        let user = Uuid::now_v7();
        fill_cart(&state, user, &[(&p, 1)]).await;
        let orders = OrderService::new(state.store.as_ref(), &state.events);
        let placed = orders.place_order(user, checkout()).await.unwrap();

        let order = orders.set_status(placed.order_id, OrderStatus::Cancelled).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        let order = orders.set_status(placed.order_id, OrderStatus::Delivered).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Delivered);
        assert_eq!(order.total_amount(), Decimal::new(650, 0));

        let err = orders.set_status(Uuid::now_v7(), OrderStatus::Shipped).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_orders_newest_first_and_scoped_to_user() {
        let state = testing::state();
        let p = sample("Tote", 650, Uuid::now_v7());
        state.store.insert_product(&p).await.unwrap();
        let orders = OrderService::new(state.store.as_ref(), &state.events);
        let user = Uuid::now_v7();
        let other = Uuid::now_v7();

        fill_cart(&state, user, &[(&p, 1)]).await;
        let first = orders.place_order(user, checkout()).await.unwrap();
        fill_cart(&state, user, &[(&p, 2)]).await;
        let second = orders.place_order(user, checkout()).await.unwrap();
        fill_cart(&state, other, &[(&p, 1)]).await;
        orders.place_order(other, checkout()).await.unwrap();

        let ids: Vec<Uuid> = orders.list_orders(user).await.unwrap().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second.order_id, first.order_id]);
        assert_eq!(orders.list_all_orders().await.unwrap().len(), 3);
    }
}
