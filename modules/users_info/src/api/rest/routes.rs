use axum::{routing::get, Extension, Router};
use std::sync::Arc;

use crate::api::rest::handlers;
use crate::domain::service::Service;

pub const USERS_PATH: &str = "/v1/user";

pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    router
        .route(
            USERS_PATH,
            get(handlers::list_users).post(handlers::create_user),
        )
        .layer(Extension(service))
}
