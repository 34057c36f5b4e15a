// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP server for receipt normalization.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use invoicescan_core::{EnhancementRequest, ResponseFormat, ScanError, ServiceConfig};
use invoicescan_imaging::{InvoiceNormalizer, NormalizedInvoice};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::form::UploadForm;
use crate::response::{ApiError, render};

/// Application state shared across handlers.
struct AppState {
    normalizer: Arc<InvoiceNormalizer>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Build the router. Split out from [`run_server`] so it can be driven
/// without a socket.
pub fn router(config: &ServiceConfig) -> Router {
    let state = Arc::new(AppState {
        normalizer: Arc::new(InvoiceNormalizer::from_config(config)),
    });

    Router::new()
        .route("/health", get(health_handler))
        .route("/process-invoice", post(process_invoice_handler))
        .route("/process-with-params", post(process_with_params_handler))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn run_server(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(&config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    info!("Server listening on http://{}", addr);
    info!("  GET  /health               - Health check");
    info!("  POST /process-invoice      - Normalize with tuned defaults");
    info!("  POST /process-with-params  - Normalize with custom parameters");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Tuned path; accepts `image`, `skip_crop`, and `response_format`.
async fn process_invoice_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let image = form.take_image()?;
    let request = form.optimal_request();
    let output = run_pipeline(&state, image, request).await?;
    Ok(render(&output, form.format, false))
}

/// Parametric path; every parameter field overrides the tuned default.
async fn process_with_params_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let image = form.take_image()?;
    let request = form.custom_request()?;
    let output = run_pipeline(&state, image, request).await?;
    Ok(render(&output, form.format, form.format == ResponseFormat::Base64))
}

/// Run the CPU-bound pipeline off the async executor.
async fn run_pipeline(
    state: &AppState,
    image: Vec<u8>,
    request: EnhancementRequest,
) -> Result<NormalizedInvoice, ApiError> {
    let request_id = uuid::Uuid::new_v4().to_string();
    info!(request_id = %request_id, bytes = image.len(), ?request, "Processing invoice");
    let start = Instant::now();

    let normalizer = Arc::clone(&state.normalizer);
    let result = tokio::task::spawn_blocking(move || normalizer.normalize(&image, request))
        .await
        .map_err(|join_err| ScanError::Stage {
            stage: "pipeline",
            detail: join_err.to_string(),
        })?;

    match result {
        Ok(output) => {
            info!(
                request_id = %request_id,
                fingerprint = %output.fingerprint(),
                total_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Invoice processed"
            );
            Ok(output)
        }
        Err(err) => {
            error!(request_id = %request_id, error = %err, "Invoice processing failed");
            Err(err.into())
        }
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}
