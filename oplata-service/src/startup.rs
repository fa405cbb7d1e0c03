//! Application startup and lifecycle management.

use crate::config::Config;
use crate::handlers;
use crate::services::{InMemoryOrderStore, OplataClient, PaymentGateway};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::tracing::{make_request_span, request_id_middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: InMemoryOrderStore,
    pub gateway: PaymentGateway,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let client = OplataClient::new(config.oplata.clone()).map_err(|e| {
            tracing::error!("Failed to build OPLATA.MD HTTP client: {}", e);
            AppError::ConfigError(e)
        })?;

        if client.is_configured() {
            tracing::info!(
                project = %config.oplata.project_title,
                base_url = %config.oplata.base_url(),
                test_mode = config.oplata.test_mode,
                "OPLATA.MD client initialized"
            );
        } else {
            tracing::warn!("OPLATA.MD credentials not configured - invoices cannot be created");
        }

        if !config.oplata.ssl_verify {
            tracing::warn!("TLS certificate verification for OPLATA.MD is disabled");
        }

        let store = InMemoryOrderStore::new();
        let shared = Arc::new(store.clone());
        let gateway = PaymentGateway::new(
            client,
            config.checkout.clone(),
            shared.clone(),
            shared.clone(),
            shared,
        );

        if !gateway.is_available_for(&config.checkout.store_currency) {
            tracing::warn!(
                currency = %config.checkout.store_currency,
                "Gateway disabled: OPLATA.MD does not support the store currency"
            );
        }

        let state = AppState {
            config: config.clone(),
            store,
            gateway,
        };

        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid server address: {}", e)))?;
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("OPLATA.MD service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the application state.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = router(self.state);
        axum::serve(self.listener, router).await
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/payment-method", get(handlers::orders::payment_method))
        .route("/orders", post(handlers::orders::create_order))
        .route("/orders/:id", get(handlers::orders::get_order))
        .route(
            "/orders/:id/payment",
            post(handlers::checkout::process_payment),
        )
        .route("/orders/:id/receipt", get(handlers::checkout::receipt))
        .route(
            "/callback/oplata/:id",
            get(handlers::checkout::callback).post(handlers::checkout::callback),
        )
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
