//! Public catalog browsing.

use axum::{extract::State, routing::get, Json, Router};
use uuid::Uuid;

use super::extract::{PathParam, QueryParams};
use crate::domain::aggregates::Category;
use crate::error::Result;
use crate::services::catalog::{CatalogService, ProductFilter, ProductView};
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/categories", get(list_categories))
        .route("/:id", get(get_product))
}

async fn list_products(State(s): State<AppState>, QueryParams(filter): QueryParams<ProductFilter>) -> Result<Json<Vec<ProductView>>> {
    Ok(Json(CatalogService::new(s.store.as_ref()).list_products(filter).await?))
}

async fn list_categories(State(s): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(CatalogService::new(s.store.as_ref()).list_categories(true).await?))
}

async fn get_product(State(s): State<AppState>, PathParam(id): PathParam<Uuid>) -> Result<Json<ProductView>> {
    Ok(Json(CatalogService::new(s.store.as_ref()).get_product(id).await?))
}
