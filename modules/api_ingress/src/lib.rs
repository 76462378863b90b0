//! HTTP host for the API server: owns the listener, the shared middleware
//! stack and the service-discovery health endpoint. Modules hand in their
//! routes as a plain `axum::Router`.

use anyhow::{Context, Result};
use axum::{middleware::from_fn, routing::get, Router};
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};
use tracing::info;

mod config;
pub mod problem;
pub mod request_id;
pub mod selfcheck;
pub mod shutdown;
mod web;

pub use config::ApiIngressConfig;
pub use problem::{Problem, ProblemResponse};

/// Path of the liveness endpoint used by the startup self-check.
pub const HEALTH_PATH: &str = "/sd/health";

#[derive(Debug, Clone, Default)]
pub struct ApiIngress {
    config: ApiIngressConfig,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Configured bind address, or `host:port` from the server section.
    pub fn bind_addr(&self, host: &str, port: u16) -> String {
        if self.config.bind_addr.trim().is_empty() {
            format!("{host}:{port}")
        } else {
            self.config.bind_addr.clone()
        }
    }

    /// Wrap module routes with the health endpoint and the middleware stack.
    pub fn build_router(&self, api: Router) -> Router {
        let mut router = Router::new()
            .route(HEALTH_PATH, get(web::health_check))
            .merge(api)
            .layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes));

        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        // Outermost last: set id -> propagate to response -> extensions/span -> trace -> timeout
        let x_request_id = request_id::header();
        router
            .layer(TimeoutLayer::new(self.config.request_timeout))
            .layer(request_id::create_trace_layer())
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId))
    }

    pub async fn bind(&self, addr: &str) -> Result<TcpListener> {
        TcpListener::bind(addr)
            .await
            .with_context(|| format!("cannot bind HTTP listener on {addr}"))
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr()?;
        info!("Start to listening the incoming requests on http address: {local}");
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed")?;
        info!("HTTP server stopped");
        Ok(())
    }
}
