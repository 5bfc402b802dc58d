//! The DocNow gateway.
//!
//! A stateless HTTP service that forwards user text, chat history, images and
//! audio to external AI providers: a multimodal chat model and Whisper
//! transcription (Groq), and a premium-then-free speech synthesis chain
//! (ElevenLabs, Google Translate TTS). There is no persistent state; every
//! request is validated, optionally spooled through a temp file, handed to a
//! provider client, and mapped back to an HTTP response.

pub mod api;
pub mod clients;
pub mod config;
pub mod errors;
mod media;
mod openapi;
pub mod telemetry;
mod uploads;

#[cfg(test)]
mod test;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, http::HeaderValue, routing::post};
use bon::Builder;
pub use config::Config;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::clients::{ElevenLabsClient, GroqClient, GttsClient, SpeechSynthesizer};
use crate::config::CorsOrigin;

/// Application state shared across all request handlers.
///
/// Holds the configuration and the provider clients. Everything is immutable
/// once built; no state crosses requests beyond these shared handles.
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub groq: Arc<GroqClient>,
    /// Synthesis engines in fallback order (premium first when configured)
    pub synthesizers: Arc<Vec<Box<dyn SpeechSynthesizer>>>,
}

/// Create CORS layer from configuration.
///
/// tower-http refuses to combine literal wildcards with credentials, so the
/// permissive development posture mirrors the request's origin, methods and
/// headers instead of sending `*`.
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.cors;

    let wildcard = cors_config
        .allowed_origins
        .iter()
        .any(|origin| matches!(origin, CorsOrigin::Wildcard));

    let mut cors = CorsLayer::new()
        .allow_credentials(cors_config.allow_credentials)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    if wildcard {
        cors = cors.allow_origin(AllowOrigin::mirror_request());
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Origin headers carry no trailing slash, Url::as_str does
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        cors = cors.allow_origin(origins);
    }

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router: the three gateway endpoints, the Scalar API
/// docs, and the CORS/trace/body-limit middleware stack.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors = create_cors_layer(&state.config)?;
    let max_body = state.config.limits.max_upload_bytes;

    let router = Router::new()
        .route("/analyze/", post(api::handlers::analyze::analyze))
        .route("/transcribe/", post(api::handlers::transcribe::transcribe))
        .route("/tts/", post(api::handlers::tts::tts))
        .with_state(state)
        .merge(Scalar::with_url("/docs", openapi::ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Main application struct that owns the router and configuration.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] builds the provider clients from
///    configuration (failing fast when the Groq credential is missing) and
///    assembles the router.
/// 2. **Serve**: [`Application::serve`] binds a TCP port and handles requests
///    until the shutdown future resolves.
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with all provider clients built.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let groq = Arc::new(GroqClient::new(&config.groq)?);

        let mut synthesizers: Vec<Box<dyn SpeechSynthesizer>> = Vec::new();
        match ElevenLabsClient::new(&config.elevenlabs) {
            Ok(client) => synthesizers.push(Box::new(client)),
            Err(_) => info!("No ElevenLabs credential configured, premium synthesis disabled"),
        }
        synthesizers.push(Box::new(GttsClient::new(&config.gtts)));

        let state = AppState::builder()
            .config(config.clone())
            .groq(groq)
            .synthesizers(Arc::new(synthesizers))
            .build();

        let router = build_router(state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "DocNow gateway listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
