//! Router assembly and the top-level `Server` type.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use gophkeeper_db::{CredentialStore, Database, ResourceRegistry};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::handlers;
use crate::state::AppState;

pub struct Server {
    config: ServerConfig,
    app: Router,
}

impl Server {
    /// Construct the store, then the registry atop it, then the router.
    /// By construction there is no half-initialized handle shared across
    /// workers.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        if config.rest_use_tls {
            warn!("REST_USE_TLS=true but ACME bootstrap is not implemented; serving plaintext HTTP");
        } else {
            warn!("REST_USE_TLS=false: serving plaintext HTTP");
        }

        std::fs::create_dir_all(&config.blobs_dir)?;

        let db = Arc::new(Database::open(&config.database_dsn)?);
        let credentials = Arc::new(CredentialStore::new(
            db.clone(),
            config.username_min_length,
            config.password_min_length,
        ));
        let registry = Arc::new(ResourceRegistry::new(
            db,
            credentials.clone(),
            config.blobs_dir.clone(),
        ));
        let tokens = Arc::new(gophkeeper_crypto::TokenService::new(
            config.token_secret.clone(),
            Duration::from_secs(config.token_lifespan_secs),
        ));

        let state = AppState {
            credentials,
            registry,
            tokens,
        };

        let app = Self::build_app(state);
        Ok(Self { config, app })
    }

    fn build_app(state: AppState) -> Router {
        let middleware_stack = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );

        let public_routes = Router::new()
            .route("/healthz", get(handlers::health::healthz))
            .route("/version", get(handlers::health::version))
            .route("/register", post(handlers::register::register))
            .route("/login", post(handlers::login::login));

        let vault_routes = Router::new()
            .route("/vault", get(handlers::vault::list))
            .route("/vault/:rid", delete(handlers::vault::delete))
            .route("/vault/piece", put(handlers::piece::store))
            .route("/vault/piece/:rid", get(handlers::piece::restore))
            .route("/vault/blob", put(handlers::blob::store))
            .route("/vault/blob/:rid", get(handlers::blob::restore))
            .route_layer(from_fn_with_state(state.clone(), crate::auth::require_token));

        Router::new()
            .merge(public_routes)
            .merge(vault_routes)
            .with_state(state)
            .layer(middleware_stack)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.config.rest_address;
        info!(%addr, "starting gophkeeper server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.app).await?;
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        self.config.rest_address
    }

    /// Exposes the router for in-process testing via `tower::ServiceExt::oneshot`.
    pub fn into_router(self) -> Router {
        self.app
    }
}
