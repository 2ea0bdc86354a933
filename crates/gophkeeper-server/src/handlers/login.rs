//! `POST /login`. On success the token travels back verbatim in the
//! `Authorization` response header, with no `Bearer ` prefix.

use axum::{extract::State, http::header, http::HeaderValue, response::Response, Json};
use gophkeeper_core::{Credential, GophkeeperError};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(credential): Json<Credential>,
) -> ApiResult<Response> {
    let credentials = state.credentials.clone();
    let username = credential.username.clone();
    tokio::task::spawn_blocking(move || {
        credentials.verify_password(&credential.username, &credential.password)
    })
    .await
    .map_err(GophkeeperError::internal)??;

    let token = state.tokens.mint(&username)?;

    let mut response = Response::new(axum::body::Body::empty());
    let header_value = HeaderValue::from_str(&token.to_string())
        .map_err(|err| GophkeeperError::internal(err))?;
    response.headers_mut().insert(header::AUTHORIZATION, header_value);
    Ok(response)
}
