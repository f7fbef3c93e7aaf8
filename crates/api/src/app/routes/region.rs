use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};

use regionhub_core::RegionId;
use regionhub_region::{Region, RegionCreateMessage};

use crate::app::dto::{self, BaseResponse, PagedResponse, RegionResponse};
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_region).put(update_region))
        .route("/get-by-id/:id", get(get_region_by_id))
        .route("/get-by-ddd/:code", get(get_region_by_code))
        .route("/get-all", get(list_regions))
        .route("/:id", delete(delete_region))
}

fn parse_id(raw: &str) -> Result<RegionId, Response> {
    raw.parse().map_err(errors::domain_error_to_response)
}

/// Queue a create request. `201` means queued, not created.
pub async fn create_region(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CreateRegionRequest>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return errors::rejection_to_response(rejection),
    };
    let message = match RegionCreateMessage::new(&body.code, &body.name) {
        Ok(m) => m,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let sent = match services
        .regions()
        .enqueue_create(services.dispatcher(), services.create_channel(), &message)
        .await
    {
        Ok(sent) => sent,
        Err(e) => return errors::service_error_to_response(e),
    };

    if !sent {
        return errors::json_failure(errors::DISPATCH_FAILED);
    }
    (StatusCode::CREATED, Json(BaseResponse::ok())).into_response()
}

pub async fn get_region_by_id(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services.regions().get_by_id_cached(id).await {
        Ok(region) => Json(BaseResponse::with_data(RegionResponse::from(&region))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_region_by_code(
    Extension(services): Extension<Arc<AppServices>>,
    Path(code): Path<String>,
) -> Response {
    match services.regions().get_by_code(code.trim()).await {
        Ok(region) => Json(BaseResponse::with_data(RegionResponse::from(&region))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_regions(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::PageQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(q)) => q,
        Err(rejection) => return errors::rejection_to_response(rejection),
    };

    let regions = match services.regions().list_paged(query.page_size, query.page).await {
        Ok(r) => r,
        Err(e) => return errors::service_error_to_response(e),
    };
    let total_items = match services.regions().count().await {
        Ok(n) => n,
        Err(e) => return errors::service_error_to_response(e),
    };

    let data = regions.iter().map(RegionResponse::from).collect();
    Json(PagedResponse::new(data, query, total_items)).into_response()
}

pub async fn update_region(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::UpdateRegionRequest>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return errors::rejection_to_response(rejection),
    };
    let id = match parse_id(&body.id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let region = match Region::with_id(id, &body.code, &body.name) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.regions().update(&region).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_region(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services.regions().delete_by_id(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
