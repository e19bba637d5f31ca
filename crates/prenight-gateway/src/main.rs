use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};

use prenight_cache::Orchestrator;
use prenight_core::config::PrenightConfig;
use prenight_provider::SchedulerSnapshot;

mod app;
mod http;
mod ws;

#[derive(Parser)]
#[command(
    name = "prenight-gateway",
    version,
    about = "Serves the prenight briefing page and its live plot documents"
)]
struct Cli {
    /// Path to prenight.toml. Falls back to PRENIGHT_CONFIG, then
    /// ~/.prenight/prenight.toml.
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "prenight_gateway=info,prenight_cache=info,tower_http=debug".into()
            }),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.or_else(|| std::env::var("PRENIGHT_CONFIG").ok());
    let config = PrenightConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        PrenightConfig::default()
    });

    let snapshot_path = config.data.scheduler_path.clone();
    info!(path = %snapshot_path, night = %config.night.date, "loading scheduler snapshot");
    let snapshot = Arc::new(
        SchedulerSnapshot::load(&snapshot_path)
            .with_context(|| format!("cannot load scheduler snapshot {snapshot_path}"))?,
    );

    let registry = app::build_registry(&config, Arc::clone(&snapshot))?;
    let orchestrator = Orchestrator::new(registry, config.generation.worker_pool_size);
    let state = Arc::new(app::AppState::new(config, orchestrator));

    // figures and the events table are produced in the background; pages and
    // sessions served meanwhile show placeholders
    state.orchestrator.schedule_regeneration();
    tokio::spawn(app::load_events(Arc::clone(&state), snapshot));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    if let Some(secs) = state.config.generation.refresh_interval_secs.filter(|s| *s > 0) {
        let orchestrator = state.orchestrator.clone();
        let rx = shutdown_rx.clone();
        tokio::spawn(async move { orchestrator.run(Duration::from_secs(secs), rx).await });
    }

    let frontend_addr: SocketAddr =
        format!("{}:{}", state.config.frontend.bind, state.config.frontend.port).parse()?;
    let plot_addr: SocketAddr =
        format!("{}:{}", state.config.plot_server.bind, state.config.plot_server.port).parse()?;

    let frontend_listener = tokio::net::TcpListener::bind(frontend_addr).await?;
    let plot_listener = tokio::net::TcpListener::bind(plot_addr).await?;
    info!("Prenight front end listening on http://{}", frontend_addr);
    info!("Prenight plot server listening on http://{}", plot_addr);

    let frontend = axum::serve(frontend_listener, app::build_frontend_router(Arc::clone(&state)))
        .with_graceful_shutdown(shutdown_signal(shutdown_rx.clone()));
    let plot_server = axum::serve(plot_listener, app::build_plot_router(Arc::clone(&state)))
        .with_graceful_shutdown(shutdown_signal(shutdown_rx));

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown requested"),
            Err(e) => {
                error!("cannot listen for ctrl-c: {e}");
                std::future::pending::<()>().await;
            }
        }
        let _ = shutdown_tx.send(true);
    });

    tokio::try_join!(frontend.into_future(), plot_server.into_future())?;

    state.orchestrator.shutdown().await;
    info!("Prenight gateway stopped");
    Ok(())
}

/// Resolves once `rx` reads `true` or its sender is gone.
async fn shutdown_signal(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            break;
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
}
