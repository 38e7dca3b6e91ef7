//! # Program.A
//!
//! `program-a serve` runs the posters API; `program-a render` writes one
//! poster to disk and saves it to the configured storage.

use std::net::SocketAddr;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use clap::Parser;
use poster_renderer::PosterExporter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use poster_server::config::{Cli, Command, RenderArgs, ServeArgs};
use poster_server::export::{render_job, save_in_background};
use poster_server::{build_cors_layer, build_router, metrics, AppState};

/// How long `render` waits for its storage save before exiting.
const SAVE_TIMEOUT: Duration = Duration::from_secs(15);

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,poster_server=debug,tower_http=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output (recommended for production).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,poster_server=debug,tower_http=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    match Cli::parse().command {
        Command::Serve(args) => serve(args).await,
        Command::Render(args) => render(args).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let metrics_handle = metrics::init_metrics()
        .map_err(|e| anyhow::anyhow!("Failed to initialize Prometheus metrics: {}", e))?;
    tracing::info!("Prometheus metrics initialized");

    let storage = args.storage.open()?;
    let state = AppState::new(storage);

    let metrics_router = Router::new()
        .route("/metrics", get(metrics::metrics_handler))
        .with_state(metrics_handle);

    let app = build_router(state)
        .merge(metrics_router)
        .layer(build_cors_layer(args.port));

    let addr = SocketAddr::from((args.host, args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Program.A poster server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

async fn render(args: RenderArgs) -> anyhow::Result<()> {
    let job = args.to_request()?.into_job()?;
    let storage = args.storage.open()?;

    let (job, image) = render_job(job, PosterExporter::with_defaults()).await?;
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| image.filename.clone().into());
    tokio::fs::write(&out, &image.bytes).await?;
    tracing::info!(
        "Wrote {} ({}x{}, {} bytes)",
        out.display(),
        image.width,
        image.height,
        image.bytes.len()
    );

    if let Some(handle) = save_in_background(&storage, &job, &image) {
        match tokio::time::timeout(SAVE_TIMEOUT, handle).await {
            Ok(Ok(Some(id))) => tracing::info!(%id, "Saved to storage"),
            Ok(Ok(None)) => {}
            Ok(Err(err)) => tracing::warn!("Save task failed: {}", err),
            Err(_) => tracing::warn!("Save timed out after {:?}", SAVE_TIMEOUT),
        }
    }
    Ok(())
}
