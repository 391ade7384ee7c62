//! Back office. Every handler takes [`AdminUser`], so a missing token is 401
//! and a customer token is 403 before any handler body runs.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::extract::{JsonBody, PathParam};
use super::{ack, Ack};
use crate::auth::AdminUser;
use crate::domain::aggregates::{Category, Message, Order, OrderError, OrderStatus, Product, User};
use crate::error::{AppError, Result};
use crate::services::admin::{AdminService, Stats};
use crate::services::catalog::{CatalogService, CategoryInput, ProductInput, ProductView};
use crate::services::inbox::{InboxService, UnreadCount};
use crate::services::orders::{OrderService, OrderView};
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:id", put(update_category).delete(delete_category))
        .route("/products", get(list_products).post(create_product))
        .route("/products/:id", put(update_product).delete(delete_product))
        .route("/orders", get(list_orders))
        .route("/orders/:id/status", put(set_order_status))
        .route("/users", get(list_users))
        .route("/messages", get(list_messages))
        .route("/messages/unread-count", get(unread_count))
        .route("/messages/:id/read", put(mark_read))
        .route("/messages/:id", delete(delete_message))
}

async fn stats(State(s): State<AppState>, _: AdminUser) -> Result<Json<Stats>> {
    Ok(Json(AdminService::new(s.store.as_ref()).stats().await?))
}

async fn list_users(State(s): State<AppState>, _: AdminUser) -> Result<Json<Vec<User>>> {
    Ok(Json(AdminService::new(s.store.as_ref()).list_users().await?))
}

// Catalog

async fn list_categories(State(s): State<AppState>, _: AdminUser) -> Result<Json<Vec<Category>>> {
    Ok(Json(CatalogService::new(s.store.as_ref()).list_categories(false).await?))
}

async fn create_category(State(s): State<AppState>, _: AdminUser, JsonBody(body): JsonBody<CategoryInput>) -> Result<(StatusCode, Json<Category>)> {
    let category = CatalogService::new(s.store.as_ref()).create_category(body).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(s): State<AppState>,
    _: AdminUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(body): JsonBody<CategoryInput>,
) -> Result<Json<Category>> {
    Ok(Json(CatalogService::new(s.store.as_ref()).update_category(id, body).await?))
}

async fn delete_category(State(s): State<AppState>, _: AdminUser, PathParam(id): PathParam<Uuid>) -> Result<Json<Ack>> {
    CatalogService::new(s.store.as_ref()).delete_category(id).await?;
    Ok(ack("Category deleted"))
}

async fn list_products(State(s): State<AppState>, _: AdminUser) -> Result<Json<Vec<ProductView>>> {
    Ok(Json(CatalogService::new(s.store.as_ref()).list_all_products().await?))
}

async fn create_product(State(s): State<AppState>, _: AdminUser, JsonBody(body): JsonBody<ProductInput>) -> Result<(StatusCode, Json<Product>)> {
    let product = CatalogService::new(s.store.as_ref()).create_product(body).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(s): State<AppState>,
    _: AdminUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(body): JsonBody<ProductInput>,
) -> Result<Json<Product>> {
    Ok(Json(CatalogService::new(s.store.as_ref()).update_product(id, body).await?))
}

async fn delete_product(State(s): State<AppState>, _: AdminUser, PathParam(id): PathParam<Uuid>) -> Result<Json<Ack>> {
    CatalogService::new(s.store.as_ref()).delete_product(id).await?;
    Ok(ack("Product deleted"))
}

// Orders

#[derive(Deserialize)]
struct StatusUpdate {
    status: String,
}

async fn list_orders(State(s): State<AppState>, _: AdminUser) -> Result<Json<Vec<OrderView>>> {
    Ok(Json(OrderService::new(s.store.as_ref(), &s.events).list_all_orders().await?))
}

async fn set_order_status(
    State(s): State<AppState>,
    _: AdminUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(body): JsonBody<StatusUpdate>,
) -> Result<Json<Order>> {
    let status: OrderStatus = body
        .status
        .trim()
        .parse()
        .map_err(|e: OrderError| AppError::Validation(e.to_string()))?;
    Ok(Json(OrderService::new(s.store.as_ref(), &s.events).set_status(id, status).await?))
}

// Messages

async fn list_messages(State(s): State<AppState>, _: AdminUser) -> Result<Json<Vec<Message>>> {
    Ok(Json(InboxService::new(s.store.as_ref(), &s.events).list().await?))
}

async fn unread_count(State(s): State<AppState>, _: AdminUser) -> Result<Json<UnreadCount>> {
    Ok(Json(InboxService::new(s.store.as_ref(), &s.events).unread_count().await?))
}

async fn mark_read(State(s): State<AppState>, _: AdminUser, PathParam(id): PathParam<Uuid>) -> Result<Json<Message>> {
    Ok(Json(InboxService::new(s.store.as_ref(), &s.events).mark_read(id).await?))
}

async fn delete_message(State(s): State<AppState>, _: AdminUser, PathParam(id): PathParam<Uuid>) -> Result<Json<Ack>> {
    InboxService::new(s.store.as_ref(), &s.events).delete(id).await?;
    Ok(ack("Message deleted"))
}
