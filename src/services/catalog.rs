//! Catalog: categories and products.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::not_blank;
use crate::domain::aggregates::{Category, CategoryRef, Product, ProductDetails};
use crate::domain::value_objects::Price;
use crate::error::{AppError, Result};
use crate::store::{ProductQuery, Store, StoreError};

/// Query string of the public product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub category: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct CategoryInput {
    #[validate(custom(function = "not_blank", message = "Category name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductInput {
    #[validate(custom(function = "not_blank", message = "Product name is required"))]
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: String,
    #[serde(alias = "category")]
    pub category_id: Option<Uuid>,
    pub in_stock: Option<bool>,
}

/// A product with its category resolved to id and display name.
#[derive(Clone, Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<CategoryRef>,
}

pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    pub fn new(store: &'a dyn Store) -> Self { Self { store } }

    /// In-stock products, optionally narrowed by category and search text.
    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: ProductFilter) -> Result<Vec<ProductView>> {
        let query = ProductQuery {
            category_id: filter.category,
            search: filter.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            ..ProductQuery::storefront()
        };
        let products = self.store.products(&query).await?;
        self.with_categories(products).await
    }

    /// Every product including out-of-stock ones, for the back office.
    #[instrument(skip(self))]
    pub async fn list_all_products(&self) -> Result<Vec<ProductView>> {
        let products = self.store.products(&ProductQuery::default()).await?;
        self.with_categories(products).await
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<ProductView> {
        let product = self.store.product(id).await?.ok_or_else(product_not_found)?;
        let mut views = self.with_categories(vec![product]).await?;
        views.pop().ok_or_else(product_not_found)
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self, active_only: bool) -> Result<Vec<Category>> {
        Ok(self.store.categories(active_only).await?)
    }

    #[instrument(skip(self))]
    pub async fn create_category(&self, input: CategoryInput) -> Result<Category> {
        input.validate()?;
        let mut category = Category::create(input.name.trim(), input.description, input.image);
        if let Some(active) = input.is_active {
            category.is_active = active;
        }
        self.store.insert_category(&category).await.map_err(category_conflict)?;
        info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    #[instrument(skip(self))]
    pub async fn update_category(&self, id: Uuid, input: CategoryInput) -> Result<Category> {
        input.validate()?;
        let mut category = self.store.category(id).await?.ok_or_else(category_not_found)?;
        category.name = input.name.trim().to_string();
        category.description = input.description;
        category.image = input.image;
        category.is_active = input.is_active.unwrap_or(category.is_active);
        if !self.store.update_category(&category).await.map_err(category_conflict)? {
            return Err(category_not_found());
        }
        Ok(category)
    }

    /// Refuses while any product still references the category.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> Result<()> {
        let blocking = self.store.count_products_in_category(id).await?;
        if blocking > 0 {
            return Err(category_in_use(blocking));
        }
        match self.store.delete_category(id).await {
            Ok(true) => {
                info!(category_id = %id, "Category deleted");
                Ok(())
            }
            Ok(false) => Err(category_not_found()),
            // A product was attached between the count and the delete.
            Err(StoreError::Referenced) => {
                let blocking = self.store.count_products_in_category(id).await?;
                Err(category_in_use(blocking))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    pub async fn create_product(&self, input: ProductInput) -> Result<Product> {
        let details = self.details(input).await?;
        let product = Product::create(details);
        self.store.insert_product(&product).await?;
        info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn update_product(&self, id: Uuid, input: ProductInput) -> Result<Product> {
        let mut product = self.store.product(id).await?.ok_or_else(product_not_found)?;
        product.apply(self.details(input).await?);
        if !self.store.update_product(&product).await? {
            return Err(product_not_found());
        }
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<()> {
        if !self.store.delete_product(id).await? {
            return Err(product_not_found());
        }
        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    async fn details(&self, input: ProductInput) -> Result<ProductDetails> {
        input.validate()?;
        let price = Price::new(input.price).map_err(|e| AppError::Validation(e.to_string()))?;
        let category_id = input
            .category_id
            .ok_or_else(|| AppError::Validation("Category is required".into()))?;
        if self.store.category(category_id).await?.is_none() {
            return Err(AppError::Validation(format!("Category {category_id} does not exist")));
        }
        Ok(ProductDetails {
            name: input.name.trim().to_string(),
            description: input.description,
            price,
            image: input.image,
            category_id,
            in_stock: input.in_stock.unwrap_or(true),
        })
    }

    async fn with_categories(&self, products: Vec<Product>) -> Result<Vec<ProductView>> {
        let mut ids: Vec<Uuid> = products.iter().map(|p| p.category_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let categories: HashMap<Uuid, CategoryRef> = self
            .store
            .categories_by_ids(&ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c.to_ref()))
            .collect();
        Ok(products
            .into_iter()
            .map(|product| {
                let category = categories.get(&product.category_id).cloned();
                ProductView { product, category }
            })
            .collect())
    }
}

fn product_not_found() -> AppError { AppError::NotFound("Product not found".into()) }

fn category_not_found() -> AppError { AppError::NotFound("Category not found".into()) }

fn category_in_use(count: u64) -> AppError {
    let noun = if count == 1 { "product is" } else { "products are" };
    AppError::Conflict(format!("Cannot delete. {count} {noun} using this category."))
}

fn category_conflict(err: StoreError) -> AppError {
    match err {
        StoreError::Duplicate(_) => AppError::Conflict("Category already exists".into()),
        other => other.into(),
    }
}
