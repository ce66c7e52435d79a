//! CLI binary for receiptgrid.
//!
//! Two modes: `serve` exposes the merge as an HTTP function (the serverless
//! shape: one POST endpoint, permissive CORS, JSON errors), `merge` runs the
//! same pipeline over local files.

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use clap::{Parser, Subcommand};
use receiptgrid::{
    merge, merge_files, parse_request, success_response, MergeConfig, MergeError, RequestError,
};
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "receiptgrid",
    version,
    about = "Merge receipt PDFs into grid-composited A4 sheets"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP merge function
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,

        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,
    },

    /// Merge local PDF files into one document
    Merge {
        /// Input PDF files, in placement order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long, default_value = "merged_receipts.pdf")]
        output: PathBuf,

        /// Grid rows per page
        #[arg(long, default_value_t = 3)]
        rows: usize,

        /// Grid columns per page
        #[arg(long, default_value_t = 2)]
        cols: usize,

        /// Rasterisation DPI (72–400)
        #[arg(long, default_value_t = 150)]
        dpi: u32,

        /// Skip rasterisation and concatenate pages verbatim
        #[arg(long)]
        fallback: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("receiptgrid=info,tower_http=info")),
        )
        .init();

    match Cli::parse().command {
        Command::Serve { bind, port } => serve(&bind, port).await,
        Command::Merge {
            inputs,
            output,
            rows,
            cols,
            dpi,
            fallback,
        } => run_merge(&inputs, &output, rows, cols, dpi, fallback).await,
    }
}

async fn serve(bind: &str, port: u16) -> Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(86_400));

    let app = Router::new()
        .route("/health", get(health))
        // The function contract inspects the method itself so non-POST
        // callers get the documented 405 JSON body, not a bare status.
        .route("/", any(merge_endpoint))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {bind}:{port}"))?;
    info!("receiptgrid listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "OK"
}

/// The single invocation endpoint.
///
/// OPTIONS preflights return an empty 200 (the CORS layer attaches the
/// permissive headers); everything other than POST gets the 405 body.
async fn merge_endpoint(method: Method, body: Bytes) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    if method != Method::POST {
        let err = RequestError::MethodNotAllowed {
            method: method.to_string(),
        };
        return reply(err.status(), err.to_json());
    }

    let sources = match parse_request(&body) {
        Ok(sources) => sources,
        Err(e) => {
            warn!("Rejected request: {e}");
            return reply(e.status(), e.to_json());
        }
    };

    info!("Processing {} files", sources.len());
    match merge(sources, &MergeConfig::default()).await {
        Ok(output) => (StatusCode::OK, Json(success_response(&output))).into_response(),
        Err(MergeError::Internal(detail)) => {
            // Unexpected: log the detail, return a generic body.
            error!("Internal merge failure: {detail}");
            reply(500, json!({ "error": "Internal server error" }))
        }
        Err(e) => {
            error!("Merge failed: {e}");
            reply(500, json!({ "error": format!("Failed to merge PDFs: {e}") }))
        }
    }
}

fn reply(status: u16, body: serde_json::Value) -> Response {
    let status =
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}

async fn run_merge(
    inputs: &[PathBuf],
    output: &PathBuf,
    rows: usize,
    cols: usize,
    dpi: u32,
    fallback: bool,
) -> Result<()> {
    let config = MergeConfig::builder()
        .grid(rows, cols)
        .dpi(dpi)
        .force_fallback(fallback)
        .build()?;

    let result = merge_files(inputs, &config).await?;
    std::fs::write(output, &result.pdf)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Merged {}/{} sources into {} ({} pages, {} bytes{})",
        result.stats.merged_sources,
        result.stats.total_sources,
        output.display(),
        result.stats.pages,
        result.pdf.len(),
        if result.stats.fallback_used {
            ", fallback merge"
        } else {
            ""
        }
    );
    for err in &result.skipped {
        eprintln!("skipped: {err}");
    }
    Ok(())
}
