//! `GET /vault`, `DELETE /vault/{rid}`.

use axum::{extract::Extension, extract::Path, http::StatusCode, Json};
use gophkeeper_core::{GophkeeperError, ResourceId};
use serde::Serialize;

use crate::error::ApiResult;
use crate::facade::IdentityFacade;

#[derive(Serialize)]
pub struct ResourceSummary {
    pub rid: ResourceId,
    pub meta: String,
    #[serde(rename = "type")]
    pub kind: i32,
}

pub async fn list(Extension(facade): Extension<IdentityFacade>) -> ApiResult<Json<Vec<ResourceSummary>>> {
    let resources = tokio::task::spawn_blocking(move || facade.list())
        .await
        .map_err(GophkeeperError::internal)??;

    Ok(Json(
        resources
            .into_iter()
            .map(|resource| ResourceSummary {
                rid: resource.id,
                meta: resource.meta,
                kind: resource.kind.as_i32(),
            })
            .collect(),
    ))
}

pub async fn delete(
    Extension(facade): Extension<IdentityFacade>,
    Path(rid): Path<ResourceId>,
) -> ApiResult<StatusCode> {
    tokio::task::spawn_blocking(move || facade.delete(rid))
        .await
        .map_err(GophkeeperError::internal)??;
    Ok(StatusCode::OK)
}
