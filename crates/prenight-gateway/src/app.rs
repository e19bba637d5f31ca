use axum::{routing::get, Router};
use dashmap::DashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::RwLock;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use prenight_cache::{Orchestrator, PlotRegistry};
use prenight_core::config::PrenightConfig;
use prenight_core::types::DocumentId;
use prenight_core::PlotName;
use prenight_plots::style::BandStyles;
use prenight_plots::{FootprintBuilder, NightContext, NightRewardBuilder, VisitBuilder};
use prenight_provider::events::{generate_astronomical_events, AstronomicalEvents};
use prenight_provider::SchedulerSnapshot;
use prenight_sessions::DocumentManager;

/// Process-wide state shared by the front end and the plot server.
pub struct AppState {
    pub config: PrenightConfig,
    pub orchestrator: Orchestrator,
    pub documents: DocumentManager,
    /// Filled once by [`load_events`]; `None` until then or if it failed.
    pub events: RwLock<Option<AstronomicalEvents>>,
    pub event_seq: AtomicU64,
    /// Live plot sessions: document -> plot it shows.
    pub connections: DashMap<DocumentId, PlotName>,
}

impl AppState {
    pub fn new(config: PrenightConfig, orchestrator: Orchestrator) -> Self {
        Self {
            config,
            orchestrator,
            documents: DocumentManager::new(),
            events: RwLock::new(None),
            event_seq: AtomicU64::new(0),
            connections: DashMap::new(),
        }
    }

    /// Monotonically increasing sequence for session events.
    pub fn next_seq(&self) -> u64 {
        self.event_seq.fetch_add(1, Ordering::Relaxed)
    }
}

/// The three dashboard plots with their production builders.
pub fn build_registry(
    config: &PrenightConfig,
    snapshot: Arc<SchedulerSnapshot>,
) -> anyhow::Result<PlotRegistry> {
    let context = NightContext::new(snapshot, config.night.date);
    let bands = BandStyles::from_hex(&config.bands.colours)?;

    let mut registry = PlotRegistry::new();
    registry.register(
        PlotName::night_reward(),
        Arc::new(NightRewardBuilder::new(
            context.clone(),
            config.generation.reward_cadence_minutes,
        )),
    )?;
    registry.register(
        PlotName::footprint(),
        Arc::new(FootprintBuilder::new(context.clone())),
    )?;
    registry.register(
        PlotName::visit(),
        Arc::new(VisitBuilder::new(
            context,
            config.data.visits_path.clone(),
            config.data.visit_lookback_days,
            bands,
        )),
    )?;
    Ok(registry)
}

/// Compute the front page's events table on the blocking pool.
pub async fn load_events(state: Arc<AppState>, snapshot: Arc<SchedulerSnapshot>) {
    let night = state.config.night.date;
    let timezone = state.config.night.timezone.clone();
    let result = tokio::task::spawn_blocking(move || {
        generate_astronomical_events(&snapshot, night, &timezone)
    })
    .await;

    match result {
        Ok(Ok(events)) => {
            info!(night = %night, events = events.events.len(), "astronomical events ready");
            *state.events.write().await = Some(events);
        }
        Ok(Err(e)) => warn!(night = %night, "astronomical events unavailable: {e}"),
        Err(e) => error!("astronomical events task failed: {e}"),
    }
}

/// Front end router: the HTML page.
pub fn build_frontend_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(crate::http::index::index_handler))
        .route("/health", get(crate::http::health::health_handler))
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Plot server router: one WebSocket document per connection.
pub fn build_plot_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/{plot}/ws", get(crate::ws::connection::ws_handler))
        .route("/autoload.js", get(crate::http::autoload::autoload_handler))
        .route("/health", get(crate::http::health::health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use prenight_plots::{Figure, Panel, PlotBuilder};

    /// Builds a single static panel.
    pub struct Static;

    impl PlotBuilder for Static {
        fn build(&self, name: &PlotName) -> prenight_plots::Result<Figure> {
            Ok(Figure::from_panels(
                name.clone(),
                vec![Panel {
                    title: format!("{name} panel"),
                    svg: "<svg></svg>".to_string(),
                }],
            ))
        }
    }

    /// State whose registry holds `plots`, all built by [`Static`].
    pub fn state_with(plots: &[PlotName]) -> Arc<AppState> {
        let mut registry = PlotRegistry::new();
        for plot in plots {
            registry
                .register(plot.clone(), Arc::new(Static))
                .expect("distinct plot names");
        }
        Arc::new(AppState::new(
            PrenightConfig::default(),
            Orchestrator::new(registry, 2),
        ))
    }
}
