mod api;
mod config;
mod error;
mod fetcher;
mod handlers;
mod logging;
mod metrics;
mod models;
mod pipeline;
mod rate_limit;
mod scheduler;
mod stats;

use anyhow::Context;
use axum::{Router, routing::get};
use clap::Parser; // for cli
use tracing::{error, info};

use crate::api::Endpoints;
use crate::config::Args;
use crate::fetcher::Fetcher;
use crate::handlers::{health_handler, metrics_handler};
use crate::pipeline::Pipeline;
use crate::scheduler::Scheduler;

// this is main async function with tokio
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // parse cli arguments
    let args = Args::parse();
    logging::init_logging();

    let fetcher = Fetcher::new(&args.sentry_token, args.max_concurrent_requests as usize)
        .context("failed to build Sentry client")?;
    let pipeline = Pipeline::new(fetcher, Endpoints::new(&args.sentry_url, &args.sentry_org));

    // metrics and health live on their own task, away from the scrape loop
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/", get(metrics_handler));

    let addr = format!("0.0.0.0:{}", args.metrics_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(%addr, "Serving /metrics and /health");
    info!(
        sentry_url = %args.sentry_url,
        org = %args.sentry_org,
        max_concurrent_requests = args.max_concurrent_requests,
        "Exporter configured"
    );

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "metrics server stopped");
        }
    });

    let mut scheduler = Scheduler::default();
    let fatal = scheduler.run(|| pipeline.run()).await;

    error!(error = %fatal, "Giving up");
    std::process::exit(1);
}
