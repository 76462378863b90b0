use std::sync::Arc;

use api_ingress::{request_id::XRequestId, ProblemResponse};
use axum::{
    extract::Query,
    http::{StatusCode, Uri},
    response::Json,
    Extension,
};
use tracing::info;

use crate::api::rest::dto::{CreateUserReq, CreateUserResp, ListUsersQuery, UserListDto};
use crate::api::rest::error::map_domain_error;
use crate::domain::service::Service;

/// List users whose name contains `username`, newest first
pub async fn list_users(
    Extension(svc): Extension<Arc<Service>>,
    Extension(XRequestId(request_id)): Extension<XRequestId>,
    uri: Uri,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UserListDto>, ProblemResponse> {
    let limit = svc.config().effective_limit(query.limit);
    info!(
        filter = %query.username,
        offset = query.offset,
        limit,
        "Listing users"
    );

    svc.list_users(&query.username, query.offset, limit)
        .await
        .map(|page| Json(UserListDto::from(page)))
        .map_err(|e| map_domain_error(&e.source, uri.path(), &request_id))
}

/// Create a new user
pub async fn create_user(
    Extension(svc): Extension<Arc<Service>>,
    Extension(XRequestId(request_id)): Extension<XRequestId>,
    uri: Uri,
    Json(req): Json<CreateUserReq>,
) -> Result<(StatusCode, Json<CreateUserResp>), ProblemResponse> {
    info!(username = %req.username, "Creating user");

    svc.create_user(req.into())
        .await
        .map(|user| (StatusCode::CREATED, Json(CreateUserResp::from(user))))
        .map_err(|e| map_domain_error(&e, uri.path(), &request_id))
}
