//! Bearer-token authentication middleware.
//!
//! The token travels verbatim in the `Authorization` header (no `Bearer `
//! prefix). A valid, unexpired token whose subject still refers to a live
//! identity yields an [`IdentityFacade`] inserted into the request
//! extensions for handlers to pull out; anything else is `401` before the
//! handler runs.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::facade::IdentityFacade;
use crate::state::AppState;

pub async fn require_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(gophkeeper_core::GophkeeperError::BadCredential)?;

    let username = state.tokens.verify(token)?;

    let credentials = state.credentials.clone();
    let still_exists = {
        let username = username.clone();
        tokio::task::spawn_blocking(move || credentials.exists(&username))
            .await
            .map_err(|err| gophkeeper_core::GophkeeperError::internal(err))??
    };
    if !still_exists {
        return Err(gophkeeper_core::GophkeeperError::BadCredential.into());
    }

    let facade = IdentityFacade::new(username, state.registry.clone());
    req.extensions_mut().insert(facade);

    Ok(next.run(req).await)
}
