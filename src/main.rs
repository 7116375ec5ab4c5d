use std::net::{Ipv4Addr, SocketAddr};

use storefront_accounts::config::Configuration;
use storefront_accounts::{app, initialize_state, telemetry};
use tokio::net::TcpListener;

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    let config = Configuration::default().from_env().read()?;

    let otlp_endpoint = config
        .telemetry
        .as_ref()
        .and_then(|t| t.otlp_endpoint.as_deref());
    let telemetry = telemetry::init(otlp_endpoint)?;

    let metrics = match telemetry::setup_metrics_recorder() {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::error!(%err, "prometheus recorder not installed");
            None
        },
    };

    let port = config.port;
    let state = initialize_state(config, metrics).await?;

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server started");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    telemetry.shutdown();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
