use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};

use super::extract::JsonBody;
use crate::auth::CurrentUser;
use crate::domain::aggregates::User;
use crate::error::Result;
use crate::services::accounts::{AccountService, AuthSession, Credentials, Registration};
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

async fn register(State(s): State<AppState>, JsonBody(body): JsonBody<Registration>) -> Result<(StatusCode, Json<AuthSession>)> {
    let session = AccountService::new(s.store.as_ref(), &s.auth).register(body).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn login(State(s): State<AppState>, JsonBody(body): JsonBody<Credentials>) -> Result<Json<AuthSession>> {
    Ok(Json(AccountService::new(s.store.as_ref(), &s.auth).login(body).await?))
}

async fn me(State(s): State<AppState>, CurrentUser(claims): CurrentUser) -> Result<Json<User>> {
    Ok(Json(AccountService::new(s.store.as_ref(), &s.auth).me(claims.sub).await?))
}
