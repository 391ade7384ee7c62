use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use uuid::Uuid;

use super::extract::JsonBody;
use crate::auth::CurrentUser;
use crate::error::Result;
use crate::services::orders::{Checkout, OrderService, OrderView};
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_orders).post(place_order))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderPlaced {
    message: &'static str,
    order_id: Uuid,
    cart_cleared: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<&'static str>,
}

async fn place_order(
    State(s): State<AppState>,
    CurrentUser(claims): CurrentUser,
    JsonBody(body): JsonBody<Checkout>,
) -> Result<(StatusCode, Json<OrderPlaced>)> {
    let placed = OrderService::new(s.store.as_ref(), &s.events).place_order(claims.sub, body).await?;
    let response = OrderPlaced {
        message: "Order placed successfully",
        order_id: placed.order_id,
        cart_cleared: placed.cart_cleared,
        warning: (!placed.cart_cleared).then_some("Your cart could not be cleared; remove the ordered items manually"),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_orders(State(s): State<AppState>, CurrentUser(claims): CurrentUser) -> Result<Json<Vec<OrderView>>> {
    Ok(Json(OrderService::new(s.store.as_ref(), &s.events).list_orders(claims.sub).await?))
}
