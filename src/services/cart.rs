//! Cart: one mutable selection per user, resolved against live products.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{Cart, Product};
use crate::domain::value_objects::Quantity;
use crate::error::{AppError, Result};
use crate::store::{Store, StoreError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddItem {
    pub product_id: Uuid,
    #[serde(default = "one")]
    #[validate(range(min = 1, max = 2147483647, message = "Quantity must be between 1 and 2147483647"))]
    pub quantity: u32,
}

fn one() -> u32 { 1 }

/// Cart with every line's product resolved. Live prices, display only.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub items: Vec<CartItemView>,
    pub subtotal: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CartItemView {
    pub product: Product,
    pub quantity: Quantity,
}

impl CartView {
    /// What a user without a cart sees.
    pub fn empty() -> Self { Self::default() }
}

pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    pub fn new(store: &'a dyn Store) -> Self { Self { store } }

    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: Uuid) -> Result<CartView> {
        match self.store.cart(user_id).await? {
            Some(cart) => resolve(self.store, &cart).await,
            None => Ok(CartView::empty()),
        }
    }

    /// Adds to the product's existing line or appends a new one.
    #[instrument(skip(self))]
    pub async fn add_item(&self, user_id: Uuid, item: AddItem) -> Result<CartView> {
        item.validate()?;
        let quantity = Quantity::new(item.quantity).map_err(|e| AppError::Validation(e.to_string()))?;
        if self.store.product(item.product_id).await?.is_none() {
            return Err(AppError::Validation(format!("Product {} does not exist", item.product_id)));
        }
        let cart = self
            .store
            .add_to_cart(user_id, item.product_id, quantity)
            .await
            .map_err(|e| match e {
                StoreError::QuantityLimit => {
                    AppError::Validation(format!("Quantity in cart cannot exceed {}", Quantity::MAX))
                }
                other => other.into(),
            })?;
        debug!(%user_id, product_id = %item.product_id, quantity = quantity.value(), "Added to cart");
        resolve(self.store, &cart).await
    }

    /// Removing a product that is not in the cart is a no-op.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> Result<CartView> {
        match self.store.remove_from_cart(user_id, product_id).await? {
            Some(cart) => resolve(self.store, &cart).await,
            None => Ok(CartView::empty()),
        }
    }
}

/// Loads the products a cart references, keyed by id.
pub(crate) async fn cart_products(store: &dyn Store, cart: &Cart) -> Result<HashMap<Uuid, Product>> {
    let ids: Vec<Uuid> = cart.items().iter().map(|l| l.product_id).collect();
    Ok(store.products_by_ids(&ids).await?.into_iter().map(|p| (p.id, p)).collect())
}

/// Lines whose product has since been deleted are left out.
async fn resolve(store: &dyn Store, cart: &Cart) -> Result<CartView> {
    let mut products = cart_products(store, cart).await?;
    let items: Vec<CartItemView> = cart
        .items()
        .iter()
        .filter_map(|line| {
            products
                .remove(&line.product_id)
                .map(|product| CartItemView { product, quantity: line.quantity })
        })
        .collect();
    let subtotal = items
        .iter()
        .try_fold(Decimal::ZERO, |acc, i| acc.checked_add(i.product.price.multiply(i.quantity)?))
        .ok_or_else(|| AppError::Validation("Cart subtotal is too large".into()))?;
    Ok(CartView { user_id: Some(cart.user_id()), items, subtotal, updated_at: Some(cart.updated_at()) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::sample;
    use crate::services::testing;

    fn add(product_id: Uuid, quantity: u32) -> AddItem { AddItem { product_id, quantity } }

    #[tokio::test]
    async fn test_get_cart_without_cart_is_empty() {
        let state = testing::state();
        let view = CartService::new(state.store.as_ref()).get_cart(Uuid::now_v7()).await.unwrap();
        assert!(view.items.is_empty());
        assert_eq!(view.subtotal, Decimal::ZERO);
        assert_eq!(serde_json::to_value(&view).unwrap(), serde_json::json!({ "items": [], "subtotal": 0.0 }));
    }

    #[tokio::test]
    async fn test_add_item_accumulates_on_one_line() {
        let state = testing::state();
        let p = sample("Fish Painting", 1800, Uuid::now_v7());
        state.store.insert_product(&p).await.unwrap();
        let carts = CartService::new(state.store.as_ref());
        let user = Uuid::now_v7();

        carts.add_item(user, add(p.id, 1)).await.unwrap();
        let view = carts.add_item(user, add(p.id, 1)).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity.value(), 2);
        assert_eq!(view.subtotal, Decimal::new(3600, 0));
    }

    #[tokio::test]
    async fn test_add_item_validation() {
        let state = testing::state();
        let p = sample("Bangle", 300, Uuid::now_v7());
        state.store.insert_product(&p).await.unwrap();
        let carts = CartService::new(state.store.as_ref());
        let user = Uuid::now_v7();

        let err = carts.add_item(user, add(p.id, 0)).await.unwrap_err();
        assert_eq!(err.to_string(), "Quantity must be between 1 and 2147483647");
        let err = carts.add_item(user, add(p.id, Quantity::MAX + 1)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = carts.add_item(user, add(Uuid::now_v7(), 1)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(state.store.cart(user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_item_is_a_no_op_when_absent() {
        let state = testing::state();
        let p = sample("Bangle", 300, Uuid::now_v7());
        state.store.insert_product(&p).await.unwrap();
        let carts = CartService::new(state.store.as_ref());
        let user = Uuid::now_v7();

        assert!(carts.remove_item(user, p.id).await.unwrap().items.is_empty());
        carts.add_item(user, add(p.id, 2)).await.unwrap();
        let view = carts.remove_item(user, Uuid::now_v7()).await.unwrap();
        assert_eq!(view.items.len(), 1);

        let view = carts.remove_item(user, p.id).await.unwrap();
        assert!(view.items.is_empty());
        assert_eq!(view.user_id, Some(user));
        assert!(state.store.cart(user).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_deleted_products_drop_out_of_view() {
        let state = testing::state();
        let keep = sample("Tote", 650, Uuid::now_v7());
        let gone = sample("Runner", 900, Uuid::now_v7());
        state.store.insert_product(&keep).await.unwrap();
        state.store.insert_product(&gone).await.unwrap();
        let carts = CartService::new(state.store.as_ref());
        let user = Uuid::now_v7();
        carts.add_item(user, add(keep.id, 1)).await.unwrap();
        carts.add_item(user, add(gone.id, 1)).await.unwrap();

        state.store.delete_product(gone.id).await.unwrap();
        let view = carts.get_cart(user).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].product.id, keep.id);
    }

    #[tokio::test]
    async fn test_quantity_accumulation_stops_at_max() {
        let state = testing::state();
        let p = sample("Bangle", 300, Uuid::now_v7());
        state.store.insert_product(&p).await.unwrap();
        let carts = CartService::new(state.store.as_ref());
        let user = Uuid::now_v7();

        carts.add_item(user, add(p.id, Quantity::MAX)).await.unwrap();
        let err = carts.add_item(user, add(p.id, 5)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let view = carts.get_cart(user).await.unwrap();
        assert_eq!(view.items[0].quantity.value(), Quantity::MAX);
        assert_eq!(view.subtotal, Decimal::from(Quantity::MAX) * Decimal::new(300, 0));
    }

    #[tokio::test]
    async fn test_most_expensive_line_does_not_overflow() {
        let state = testing::state();
        let p = sample("Commission", 9_999_999_999, Uuid::now_v7());
        state.store.insert_product(&p).await.unwrap();
        let carts = CartService::new(state.store.as_ref());
        let view = carts.add_item(Uuid::now_v7(), add(p.id, Quantity::MAX)).await.unwrap();
        assert_eq!(view.subtotal, Decimal::from(Quantity::MAX) * Decimal::new(9_999_999_999, 0));
    }
}
