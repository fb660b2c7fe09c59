//! HTTP surface of the identification function.
//!
//! One POST route plus permissive CORS, mirroring how the function is hosted:
//! any origin may call it and every response, errors included, carries the
//! CORS headers.

use crate::ai::GatewayHttpClient;
use crate::identify::Identifier;
use crate::models::{Config, ErrorBody, IdentificationRequest, SpeciesRecord};
use crate::{Error, Result};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{
        header::{self, HeaderName, HeaderValue},
        Method,
    },
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

pub const IDENTIFY_PATH: &str = "/functions/v1/identify-species";
pub const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// A 10 MiB image is roughly 13.4 MiB once base64-encoded into JSON.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    identifier: Identifier,
}

/// Error returned from handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        tracing::error!("Error in identify-species handler ({}): {}", status, self.0);

        let body = Json(ErrorBody {
            error: self.0.to_string(),
        });

        (status, body).into_response()
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

/// Build the router around an already configured [`Identifier`].
pub fn router(identifier: Identifier) -> Router {
    Router::new()
        .route(IDENTIFY_PATH, post(identify_species))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer(cors_layer())
        .with_state(AppState { identifier })
}

/// Wire the production gateway client from configuration.
pub fn identifier_from_config(config: &Config) -> Identifier {
    let gateway =
        GatewayHttpClient::new(config.gateway_url.clone()).with_timeout(config.gateway_timeout);
    Identifier::new(Arc::new(gateway), config.api_key.clone(), config.model.clone())
}

/// Bind `config.bind_addr` and serve until the process is stopped.
pub async fn serve(config: Config) -> Result<()> {
    if config.api_key.is_none() {
        warn!("LOVABLE_API_KEY is not set; every identification will fail until it is configured");
    }

    let identifier = identifier_from_config(&config);
    let model = identifier.model().to_string();
    let app = router(identifier);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(
        "Starting identify-species server on {} (model: {}, gateway: {})",
        listener.local_addr()?,
        model,
        config.gateway_url
    );
    axum::serve(listener, app).await?;

    Ok(())
}

async fn identify_species(
    State(state): State<AppState>,
    body: Bytes,
) -> std::result::Result<Json<SpeciesRecord>, ApiError> {
    let request: IdentificationRequest = serde_json::from_slice(&body)
        .map_err(|e| Error::InvalidInput(format!("Invalid request body: {}", e)))?;

    let record = state.identifier.identify(&request).await?;
    Ok(Json(record))
}
