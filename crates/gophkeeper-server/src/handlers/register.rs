//! `POST /register`.

use axum::{extract::State, http::StatusCode, Json};
use gophkeeper_core::Credential;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(credential): Json<Credential>,
) -> ApiResult<StatusCode> {
    let credentials = state.credentials.clone();
    tokio::task::spawn_blocking(move || credentials.register(&credential))
        .await
        .map_err(|err| gophkeeper_core::GophkeeperError::internal(err))??;
    Ok(StatusCode::CREATED)
}
