use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use super::extract::JsonBody;
use crate::domain::aggregates::Message;
use crate::error::Result;
use crate::services::inbox::{InboxService, NewMessage};
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/", post(submit))
}

async fn submit(State(s): State<AppState>, JsonBody(body): JsonBody<NewMessage>) -> Result<(StatusCode, Json<Message>)> {
    let message = InboxService::new(s.store.as_ref(), &s.events).submit(body).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
