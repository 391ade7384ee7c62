use axum::{extract::State, routing::{delete, get, post}, Json, Router};
use uuid::Uuid;

use super::extract::{JsonBody, PathParam};
use crate::auth::CurrentUser;
use crate::error::Result;
use crate::services::cart::{AddItem, CartService, CartView};
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/add", post(add_item))
        .route("/remove/:product_id", delete(remove_item))
}

async fn get_cart(State(s): State<AppState>, CurrentUser(claims): CurrentUser) -> Result<Json<CartView>> {
    Ok(Json(CartService::new(s.store.as_ref()).get_cart(claims.sub).await?))
}

async fn add_item(State(s): State<AppState>, CurrentUser(claims): CurrentUser, JsonBody(body): JsonBody<AddItem>) -> Result<Json<CartView>> {
    Ok(Json(CartService::new(s.store.as_ref()).add_item(claims.sub, body).await?))
}

async fn remove_item(State(s): State<AppState>, CurrentUser(claims): CurrentUser, PathParam(product_id): PathParam<Uuid>) -> Result<Json<CartView>> {
    Ok(Json(CartService::new(s.store.as_ref()).remove_item(claims.sub, product_id).await?))
}
