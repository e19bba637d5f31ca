use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use prenight_cache::FigureState;
use prenight_core::config::{HEARTBEAT_INTERVAL_SECS, MAX_PAYLOAD_BYTES};
use prenight_core::error::PrenightError;
use prenight_core::types::DocumentId;
use prenight_core::PlotName;
use prenight_plots::Figure;
use prenight_protocol::{
    document::{RootPayload, RootRemoved, Tick},
    frames::SessionEvent,
};
use prenight_sessions::DocumentEvent;

use crate::app::AppState;
use crate::ws::{handshake, message, origin::check_origin, payload::figure_payload, send};

/// Plot session states, in the order a session moves through them.
pub enum ConnState {
    /// Document opened, hello not yet answered with a root.
    Connecting,
    /// Showing a placeholder; the figure was pending or failed.
    Rendering,
    Attached { figure: Arc<Figure> },
    /// The figure was taken over by another session.
    Detached,
}

impl ConnState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnState::Connecting => "connecting",
            ConnState::Rendering => "rendering",
            ConnState::Attached { .. } => "attached",
            ConnState::Detached => "detached",
        }
    }

    /// Give document `doc` its root from the cache. Never waits on
    /// generation.
    pub fn render(
        self,
        app: &AppState,
        doc: &DocumentId,
        plot: &PlotName,
    ) -> (ConnState, RootPayload) {
        debug!(document = %doc, from = self.label(), "rendering document");
        match app.orchestrator.state(plot) {
            Some(FigureState::Ready(figure)) => match app.documents.attach(doc, Arc::clone(&figure))
            {
                Ok(previous) => {
                    if let Some(previous) = previous {
                        info!(
                            document = %doc,
                            previous = %previous,
                            plot = %plot,
                            "figure moved between documents"
                        );
                    }
                    let payload = RootPayload::Figure(figure_payload(&figure));
                    (ConnState::Attached { figure }, payload)
                }
                Err(e) => {
                    warn!(document = %doc, "cannot attach figure: {e}");
                    (ConnState::Detached, RootPayload::Placeholder { text: e.to_string() })
                }
            },
            Some(FigureState::Failed(reason)) => {
                let text = format!("The {plot} figure could not be generated: {reason}");
                placeholder(app, doc, text)
            }
            Some(FigureState::Pending) | None => {
                let text = format!(
                    "The {plot} figure is being generated, please reload the page shortly..."
                );
                placeholder(app, doc, text)
            }
        }
    }
}

fn placeholder(app: &AppState, doc: &DocumentId, text: String) -> (ConnState, RootPayload) {
    if let Err(e) = app.documents.add_placeholder(doc, text.clone()) {
        warn!(document = %doc, "cannot add placeholder: {e}");
    }
    (ConnState::Rendering, RootPayload::Placeholder { text })
}

/// Upgrades HTTP to WebSocket at GET /{plot}/ws.
pub async fn ws_handler(
    Path(plot): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let plot = PlotName::from(plot);
    if !state.orchestrator.is_registered(&plot) {
        let err = PrenightError::UnknownPlot {
            name: plot.to_string(),
        };
        warn!(plot = %plot, "rejecting session: {err}");
        return (StatusCode::NOT_FOUND, err.to_string()).into_response();
    }

    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    if let Err(err) = check_origin(origin, &state.config.plot_server.allow_websocket_origin) {
        warn!(plot = %plot, "rejecting session: {err}");
        return (StatusCode::FORBIDDEN, err.to_string()).into_response();
    }

    match ws {
        Ok(ws) => ws
            .max_message_size(MAX_PAYLOAD_BYTES)
            .on_upgrade(move |socket| run_connection(socket, state, plot)),
        Err(rejection) => rejection.into_response(),
    }
}

/// Per-connection lifecycle: open a document, serve it, then close it and
/// release its figure whatever way the session ended.
async fn run_connection(socket: WebSocket, state: Arc<AppState>, plot: PlotName) {
    let (notify_tx, notify_rx) = mpsc::channel(8);
    let doc = state.documents.open(plot.clone(), Some(notify_tx));
    state.connections.insert(doc.clone(), plot.clone());
    info!(document = %doc, plot = %plot, "new plot session");

    if let Err(e) = serve(socket, &state, &doc, &plot, notify_rx).await {
        debug!(document = %doc, error = %e, "session send failed");
    }

    let released = state.documents.close(&doc);
    state.connections.remove(&doc);
    info!(document = %doc, released, "plot session closed");
}

async fn serve(
    socket: WebSocket,
    state: &Arc<AppState>,
    doc: &DocumentId,
    plot: &PlotName,
    mut notify_rx: mpsc::Receiver<DocumentEvent>,
) -> Result<(), axum::Error> {
    let (mut tx, mut rx) = socket.split();

    send::event(&mut tx, state, handshake::hello_event(doc, plot)).await?;

    let (mut conn, root) = ConnState::Connecting.render(state, doc, plot);
    send::event(&mut tx, state, SessionEvent::RootAdd(root)).await?;

    let mut tick = tokio::time::interval(std::time::Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    tick.tick().await;

    loop {
        tokio::select! {
            msg = rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if text.len() > MAX_PAYLOAD_BYTES {
                            warn!(document = %doc, size = text.len(), "payload too large");
                            break;
                        }
                        message::handle(doc, plot, &text, &conn, &mut tx).await?;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        tx.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(document = %doc, error = %e, "receive failed");
                        break;
                    }
                    _ => {}
                }
            }

            event = notify_rx.recv() => {
                let Some(DocumentEvent::RootRemoved { figure_id, reason }) = event else {
                    break;
                };
                info!(
                    document = %doc,
                    figure = %figure_id,
                    state = conn.label(),
                    "figure taken by another session"
                );
                conn = ConnState::Detached;
                let removed = RootRemoved {
                    plot: plot.to_string(),
                    figure_id: figure_id.to_string(),
                    reason,
                };
                send::event(&mut tx, state, SessionEvent::RootRemove(removed)).await?;
            }

            _ = tick.tick() => {
                let ts = chrono::Utc::now().timestamp_millis();
                send::event(&mut tx, state, SessionEvent::Tick(Tick { ts })).await?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::state_with;

    #[tokio::test]
    async fn pending_plot_gets_a_placeholder() {
        let state = state_with(&[PlotName::footprint()]);
        let doc = state.documents.open(PlotName::footprint(), None);

        let (conn, root) = ConnState::Connecting.render(&state, &doc, &PlotName::footprint());
        assert!(matches!(conn, ConnState::Rendering));
        match root {
            RootPayload::Placeholder { text } => assert_eq!(
                text,
                "The footprint figure is being generated, please reload the page shortly..."
            ),
            RootPayload::Figure(_) => panic!("figure served before generation"),
        }
    }

    #[tokio::test]
    async fn ready_figure_moves_to_the_newest_session() {
        let plot = PlotName::visit();
        let state = state_with(std::slice::from_ref(&plot));
        state.orchestrator.regenerate(&plot).await.unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        let first = state.documents.open(plot.clone(), Some(tx));
        let second = state.documents.open(plot.clone(), None);

        let (conn, root) = ConnState::Connecting.render(&state, &first, &plot);
        let ConnState::Attached { figure } = conn else {
            panic!("expected the first session to attach");
        };
        assert!(matches!(
            root,
            RootPayload::Figure(ref f) if f.figure_id == figure.id().to_string()
        ));

        let (conn, _) = ConnState::Connecting.render(&state, &second, &plot);
        assert!(matches!(conn, ConnState::Attached { .. }));
        assert!(!state.documents.has_figure_root(&first, figure.id()));
        assert!(state.documents.has_figure_root(&second, figure.id()));
        assert!(matches!(
            rx.try_recv(),
            Ok(DocumentEvent::RootRemoved { figure_id, .. }) if figure_id == figure.id()
        ));
    }

    #[tokio::test]
    async fn failed_plot_names_the_failure() {
        use prenight_plots::{PlotBuilder, PlotError};

        struct Broken;
        impl PlotBuilder for Broken {
            fn build(&self, _name: &PlotName) -> prenight_plots::Result<Figure> {
                Err(PlotError::Empty("no visits".to_string()))
            }
        }

        let mut registry = prenight_cache::PlotRegistry::new();
        registry.register(PlotName::visit(), Arc::new(Broken)).unwrap();
        let state = AppState::new(
            prenight_core::config::PrenightConfig::default(),
            prenight_cache::Orchestrator::new(registry, 1),
        );
        state.orchestrator.regenerate(&PlotName::visit()).await.unwrap();

        let doc = state.documents.open(PlotName::visit(), None);
        let (conn, root) = ConnState::Connecting.render(&state, &doc, &PlotName::visit());
        assert!(matches!(conn, ConnState::Rendering));
        let RootPayload::Placeholder { text } = root else {
            panic!("expected a placeholder");
        };
        assert!(text.contains("could not be generated"));
        assert!(text.contains("no visits"));
    }
}
