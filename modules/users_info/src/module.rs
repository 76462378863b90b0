use std::sync::Arc;

use axum::Router;
use tracing::info;

use crate::api::rest::routes;
use crate::config::UsersInfoConfig;
use crate::contract::client::UsersInfoApi;
use crate::domain::ports::TokenGenerator;
use crate::domain::repo::UsersRepository;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::UsersInfoLocalClient;
use crate::infra::token::ShortIdGenerator;

/// Main module struct: owns the domain service and exposes it as REST
/// routes and as a typed client for other modules.
#[derive(Clone)]
pub struct UsersInfo {
    service: Arc<Service>,
}

impl UsersInfo {
    /// Wire the module over a repository, using the random short-id
    /// generator for greetings.
    pub fn new(cfg: &UsersInfoConfig, repo: Arc<dyn UsersRepository>) -> Self {
        let tokens = Arc::new(ShortIdGenerator::new(cfg.token_length));
        Self::with_token_generator(cfg, repo, tokens)
    }

    pub fn with_token_generator(
        cfg: &UsersInfoConfig,
        repo: Arc<dyn UsersRepository>,
        tokens: Arc<dyn TokenGenerator>,
    ) -> Self {
        let service_config = ServiceConfig {
            default_page_size: cfg.default_page_size,
            max_page_size: cfg.max_page_size,
            max_concurrency: cfg.max_concurrency,
            cancel_on_error: cfg.cancel_on_error,
        };
        info!(
            max_concurrency = cfg.max_concurrency,
            cancel_on_error = cfg.cancel_on_error,
            "users_info module initialized"
        );
        Self {
            service: Arc::new(Service::new(repo, tokens, service_config)),
        }
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    /// Typed client for other modules.
    pub fn client(&self) -> Arc<dyn UsersInfoApi> {
        Arc::new(UsersInfoLocalClient::new(self.service.clone()))
    }

    /// REST routes, ready to be handed to the HTTP host.
    pub fn router(&self) -> Router {
        routes::register_routes(Router::new(), self.service.clone())
    }
}
