//! HTTP surface. Handlers unpack the request, call one service method and
//! pick the status code; everything else lives in [`crate::services`].

mod admin;
mod auth;
mod cart;
mod catalog;
mod extract;
mod messages;
mod orders;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Body of responses that only confirm an action.
#[derive(Serialize)]
struct Ack {
    message: &'static str,
}

fn ack(message: &'static str) -> Json<Ack> { Json(Ack { message }) }

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", auth::routes())
        .nest("/products", catalog::routes())
        .nest("/cart", cart::routes())
        .nest("/orders", orders::routes())
        .nest("/messages", messages::routes())
        .nest("/admin", admin::routes());

    Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "healthy", "service": "artisan-storefront" })) }))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
