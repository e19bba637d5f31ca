use axum::{extract::State, Json};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use prenight_cache::FigureState;

use crate::app::AppState;

/// GET /health: liveness check with the state of every registered plot.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let plots: Map<String, Value> = state
        .orchestrator
        .registry()
        .names()
        .map(|name| {
            let status = match state.orchestrator.state(name) {
                None => "unscheduled",
                Some(FigureState::Pending) => "pending",
                Some(FigureState::Ready(_)) => "ready",
                Some(FigureState::Failed(_)) => "failed",
            };
            (name.to_string(), Value::from(status))
        })
        .collect();

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": prenight_core::config::PROTOCOL_VERSION,
        "night": state.config.night.date.to_string(),
        "plots": plots,
        "documents": state.documents.len(),
        "sessions": state.connections.len(),
    }))
}
