//! Cart Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use crate::domain::value_objects::{Quantity, QuantityError};

/// One mutable cart per user. Lines are unique per product and keep insertion order.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    user_id: Uuid,
    items: Vec<CartLine>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: Quantity,
}

impl Cart {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id, items: vec![], updated_at: Utc::now() }
    }

    /// Rebuilds a cart from persisted lines.
    pub fn restore(user_id: Uuid, items: Vec<CartLine>, updated_at: DateTime<Utc>) -> Self {
        Self { user_id, items, updated_at }
    }

    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn items(&self) -> &[CartLine] { &self.items }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Adds `quantity` of a product, accumulating onto an existing line.
    /// The cart is left untouched when the merged quantity would exceed
    /// [`Quantity::MAX`].
    pub fn add_item(&mut self, product_id: Uuid, quantity: Quantity) -> Result<(), QuantityError> {
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            existing.quantity = existing.quantity.checked_add(quantity)?;
        } else {
            self.items.push(CartLine { product_id, quantity });
        }
        self.touch();
        Ok(())
    }

    /// Drops the line for a product. Returns whether a line was removed.
    pub fn remove_item(&mut self, product_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        let removed = self.items.len() != before;
        if removed { self.touch(); }
        removed
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_add_item_merges_by_product() {
        let mut cart = Cart::new(Uuid::now_v7());
        let p1 = Uuid::now_v7();
        let p2 = Uuid::now_v7();
        cart.add_item(p1, Quantity::ONE).unwrap();
        cart.add_item(p2, Quantity::new(2).unwrap()).unwrap();
        cart.add_item(p1, Quantity::ONE).unwrap();
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].product_id, p1);
        assert_eq!(cart.items()[0].quantity.value(), 2); // Merged
        assert_eq!(cart.items()[1].quantity.value(), 2);
    }
    #[test]
    fn test_remove_item_is_idempotent() {
        let mut cart = Cart::new(Uuid::now_v7());
        let p1 = Uuid::now_v7();
        cart.add_item(p1, Quantity::ONE).unwrap();
        assert!(!cart.remove_item(Uuid::now_v7()));
        assert_eq!(cart.items().len(), 1);
        assert!(cart.remove_item(p1));
        assert!(!cart.remove_item(p1));
        assert!(cart.is_empty());
    }
    #[test]
    fn test_add_item_refuses_to_pass_max() {
        let mut cart = Cart::new(Uuid::now_v7());
        let p1 = Uuid::now_v7();
        cart.add_item(p1, Quantity::new(Quantity::MAX).unwrap()).unwrap();
        assert_eq!(cart.add_item(p1, Quantity::new(5).unwrap()), Err(QuantityError::TooLarge));
        assert_eq!(cart.items()[0].quantity.value(), Quantity::MAX);
    }
}
