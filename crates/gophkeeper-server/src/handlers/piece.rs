//! `PUT /vault/piece`, `GET /vault/piece/{rid}`.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    Json,
};
use base64::Engine;
use gophkeeper_core::{GophkeeperError, ResourceId};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::facade::IdentityFacade;

const BASE64: base64::engine::general_purpose::GeneralPurpose =
    base64::engine::general_purpose::STANDARD_NO_PAD;

fn vault_password(headers: &HeaderMap) -> Result<&str, GophkeeperError> {
    headers
        .get("X-Password")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or(GophkeeperError::BadCredential)
}

#[derive(Deserialize)]
pub struct StorePieceRequest {
    meta: String,
    content: String,
}

#[derive(Serialize)]
pub struct StorePieceResponse {
    rid: ResourceId,
}

pub async fn store(
    Extension(facade): Extension<IdentityFacade>,
    headers: HeaderMap,
    Json(request): Json<StorePieceRequest>,
) -> ApiResult<(StatusCode, Json<StorePieceResponse>)> {
    let password = vault_password(&headers)?.to_string();
    let content = BASE64
        .decode(request.content.as_bytes())
        .map_err(|_| ApiError::BadRequest("content is not valid base64"))?;

    let rid = tokio::task::spawn_blocking(move || facade.store_piece(&request.meta, &content, &password))
        .await
        .map_err(GophkeeperError::internal)??;

    Ok((StatusCode::CREATED, Json(StorePieceResponse { rid })))
}

#[derive(Serialize)]
pub struct RestorePieceResponse {
    meta: String,
    content: String,
}

pub async fn restore(
    Extension(facade): Extension<IdentityFacade>,
    Path(rid): Path<ResourceId>,
    headers: HeaderMap,
) -> ApiResult<Json<RestorePieceResponse>> {
    let password = vault_password(&headers)?.to_string();

    let piece = tokio::task::spawn_blocking(move || facade.restore_piece(rid, &password))
        .await
        .map_err(GophkeeperError::internal)??;

    Ok(Json(RestorePieceResponse {
        meta: piece.meta,
        content: BASE64.encode(piece.content),
    }))
}
