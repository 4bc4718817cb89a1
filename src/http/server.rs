//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with API routes and the page handler
//! - Wire up middleware (proxy dispatch, timeout, request ID, tracing)
//! - Bind server to listener
//! - Serve until the shutdown signal

use std::sync::Arc;

use axum::{body::Body, middleware, routing::get, Router};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::backend::{BackendClient, BackendError};
use crate::config::{PresentationConfig, PresenterConfig};
use crate::http::api;
use crate::http::request::{MakeRequestUuid, X_REQUEST_ID};
use crate::presentation::{MiniJinjaRenderer, NoRelatedContent, Pipeline, TemplateLibrary};
use crate::proxy;
use crate::routing::ContentRouter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub presentation: Arc<PresentationConfig>,
    pub proxy_client: Client<HttpConnector, Body>,
}

/// HTTP server for the presenter.
pub struct HttpServer {
    router: Router,
    config: PresenterConfig,
}

impl HttpServer {
    /// Create a server with the default renderer and related-content resolver.
    ///
    /// A configured template directory backs layout includes and error pages.
    pub fn new(config: PresenterConfig, router: Arc<ContentRouter>) -> Result<Self, BackendError> {
        let backend = BackendClient::new(&config.services, &config.timeouts)?;
        let templates = config.templates.path.as_ref().map(|path| Arc::new(TemplateLibrary::new(path)));

        let renderer = match &templates {
            Some(templates) => MiniJinjaRenderer::with_templates(templates.clone()),
            None => MiniJinjaRenderer::new(),
        };
        let pipeline = Pipeline::new(router, backend, Arc::new(renderer), Arc::new(NoRelatedContent));
        let pipeline = match templates {
            Some(templates) => pipeline.with_templates(templates),
            None => pipeline,
        };
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Create a server around an already assembled pipeline.
    pub fn with_pipeline(config: PresenterConfig, pipeline: Pipeline) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(config.timeouts.connect()));
        let proxy_client = Client::builder(TokioExecutor::new()).build(connector);

        let state = AppState {
            pipeline: Arc::new(pipeline),
            presentation: Arc::new(config.presentation.clone()),
            proxy_client,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &PresenterConfig, state: AppState) -> Router {
        Router::new()
            .route("/version", get(api::version))
            .route("/_api/whereis/{*content_id}", get(api::whereis))
            .route("/_api/search", get(api::search))
            .route("/_api/assets", get(api::assets))
            .route("/_api/control", get(api::control))
            .route("/", get(api::present_page))
            .route("/{*path}", get(api::present_page))
            .with_state(state.clone())
            .layer(middleware::from_fn_with_state(state, proxy::dispatch))
            .layer(TimeoutLayer::new(config.timeouts.request()))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            staging = self.config.presentation.staging_mode,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &PresenterConfig {
        &self.config
    }
}
