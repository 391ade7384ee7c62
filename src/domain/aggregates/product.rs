//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use crate::domain::value_objects::Price;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image: String,
    pub category_id: Uuid,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
}

/// Editable fields of a product, shared by create and update.
#[derive(Clone, Debug)]
pub struct ProductDetails {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image: String,
    pub category_id: Uuid,
    pub in_stock: bool,
}

impl Product {
    pub fn create(details: ProductDetails) -> Self {
        let ProductDetails { name, description, price, image, category_id, in_stock } = details;
        Self { id: Uuid::now_v7(), name, description, price, image, category_id, in_stock, created_at: Utc::now() }
    }

    /// Replaces every editable field; id and creation time are kept.
    pub fn apply(&mut self, details: ProductDetails) {
        self.name = details.name;
        self.description = details.description;
        self.price = details.price;
        self.image = details.image;
        self.category_id = details.category_id;
        self.in_stock = details.in_stock;
    }

    /// Case-insensitive substring match over name and description.
    /// `needle` must already be lowercase.
    pub fn matches_search(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

#[cfg(test)]
pub(crate) fn sample(name: &str, price: i64, category_id: Uuid) -> Product {
    use rust_decimal::Decimal;
    Product::create(ProductDetails {
        name: name.into(),
        description: format!("Handmade {name}"),
        price: Price::new(Decimal::new(price, 0)).unwrap(),
        image: String::new(),
        category_id,
        in_stock: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_matches_search() {
        let p = sample("Madhubani Fish Painting", 1800, Uuid::now_v7());
        assert!(p.matches_search("fish"));
        assert!(p.matches_search("handmade madhubani"));
        assert!(p.matches_search(""));
        assert!(!p.matches_search("peacock"));
    }
    #[test]
    fn test_apply_keeps_identity() {
        let mut p = sample("Bangle", 300, Uuid::now_v7());
        let id = p.id;
        let created = p.created_at;
        let mut details = ProductDetails { name: "Silver Bangle".into(), description: String::new(), price: p.price, image: String::new(), category_id: p.category_id, in_stock: false };
        details.price = Price::new(rust_decimal::Decimal::new(450, 0)).unwrap();
        p.apply(details);
        assert_eq!(p.id, id);
        assert_eq!(p.created_at, created);
        assert_eq!(p.name, "Silver Bangle");
        assert!(!p.in_stock);
    }
}
