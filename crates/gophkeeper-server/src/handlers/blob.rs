//! `PUT /vault/blob`, `GET /vault/blob/{rid}`. Bodies are raw octet streams;
//! uploads are buffered once (the underlying stream cipher is applied to an
//! in-memory cursor), downloads are streamed lazily off the blob reader in
//! fixed-size chunks on a blocking task. The reader owns the open file and
//! cipher stream until the last chunk is read.

use std::io::Read;

use axum::{
    body::Body,
    extract::{Extension, Path},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    Json,
};
use bytes::Bytes;
use gophkeeper_core::{GophkeeperError, ResourceId};
use serde::Serialize;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::ApiResult;
use crate::facade::IdentityFacade;

const CHUNK_SIZE: usize = 64 * 1024;

fn vault_password(headers: &HeaderMap) -> Result<&str, GophkeeperError> {
    headers
        .get("X-Password")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or(GophkeeperError::BadCredential)
}

fn meta_header(headers: &HeaderMap) -> String {
    headers
        .get("X-Meta")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[derive(Serialize)]
pub struct StoreBlobResponse {
    rid: ResourceId,
}

pub async fn store(
    Extension(facade): Extension<IdentityFacade>,
    headers: HeaderMap,
    body: Body,
) -> ApiResult<(StatusCode, Json<StoreBlobResponse>)> {
    let password = vault_password(&headers)?.to_string();
    let meta = meta_header(&headers);

    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(GophkeeperError::internal)?;

    let rid = tokio::task::spawn_blocking(move || {
        facade.store_blob(&meta, std::io::Cursor::new(bytes), &password)
    })
    .await
    .map_err(GophkeeperError::internal)??;

    Ok((StatusCode::CREATED, Json(StoreBlobResponse { rid })))
}

pub async fn restore(
    Extension(facade): Extension<IdentityFacade>,
    Path(rid): Path<ResourceId>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let password = vault_password(&headers)?.to_string();

    let (meta, reader) = tokio::task::spawn_blocking(move || facade.restore_blob(rid, &password))
        .await
        .map_err(GophkeeperError::internal)??;

    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Bytes, std::io::Error>>(4);
    tokio::task::spawn_blocking(move || {
        let mut reader = reader;
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.blocking_send(Ok(Bytes::copy_from_slice(&buf[..n]))).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx.blocking_send(Err(err));
                    break;
                }
            }
        }
    });

    let body = Body::from_stream(ReceiverStream::new(rx));

    let mut response = Response::new(body);
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, HeaderValue::from_static("attachment"));
    response.headers_mut().insert(
        "X-Meta",
        HeaderValue::from_str(&meta).map_err(GophkeeperError::internal)?,
    );
    Ok(response)
}
