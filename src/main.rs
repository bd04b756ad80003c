//! SolSec API Server
//!
//! REST API for Solana address risk analysis and MEV assessment
//!
//! Usage:
//!   cargo run --bin solsec_api
//!
//! Environment:
//!   HELIUS_API_KEY - Helius RPC key (falls back to public RPC)
//!   PORT / SOLSEC_PORT - Server port (default: 8080)
//!   SOLSEC_HOST - Server host (default: 0.0.0.0)
//!   RUST_LOG - Log level (default: info)

use solsec::api::{create_router, AppState};
use solsec::models::config::ServerConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    print_banner();

    // Create app state
    let state = Arc::new(AppState::new()?);
    let telemetry_for_shutdown = state.telemetry.clone();

    if !state.rpc.is_configured() {
        info!("⚠️ No HELIUS_API_KEY set - on-chain analysis uses the public RPC");
    }

    // Create router
    let app = create_router(state);

    let server = ServerConfig::default();
    let addr: SocketAddr = format!("{}:{}", server.host, server.port).parse()?;

    info!("🚀 SolSec API starting on http://{}", addr);
    info!("");
    info!("Endpoints:");
    info!("  POST /v1/analyze/address  - On-chain address analysis");
    info!("  POST /v1/analyze/full     - Combined three-layer analysis");
    info!("  POST /v1/mev/analyze      - Single-transaction MEV assessment");
    info!("  GET  /v1/dashboard        - Market feeds (TVL, volume, price)");
    info!("  GET  /v1/stats            - Service statistics");
    info!("  GET  /v1/health           - Health check");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");
    info!("");

    // Start server with graceful shutdown
    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    // Graceful shutdown sequence
    info!("");
    info!("🛑 Shutdown signal received, cleaning up...");

    let stats = telemetry_for_shutdown.get_stats();
    info!("   Total analyzed: {}", stats.total_analyzed);
    info!("   Total threats: {}", stats.total_threats);
    info!("   Avg latency: {:.1} ms", stats.avg_latency_ms);

    info!("👋 SolSec API shutdown complete");

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════╗
    ║                                              ║
    ║   S O L S E C                                ║
    ║   Solana Security Analysis API   v0.1.0      ║
    ║                                              ║
    ╚══════════════════════════════════════════════╝
    "#
    );
}
