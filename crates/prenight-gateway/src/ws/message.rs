use std::sync::Arc;

use prenight_core::error::PrenightError;
use prenight_core::types::DocumentId;
use prenight_core::PlotName;
use prenight_protocol::{
    document::{PanelsUpdate, SliderSetParams},
    frames::{Call, CallError, ClientFrame, Reply, Request, ResFrame},
};
use tracing::{debug, warn};

use crate::ws::connection::ConnState;
use crate::ws::payload::panel_payloads;
use crate::ws::send::{self, WsSink};

/// Process one inbound WS text frame and answer requests.
///
/// Malformed frames are logged and ignored; only a failed send ends the
/// session.
pub async fn handle(
    document: &DocumentId,
    plot: &PlotName,
    text: &str,
    conn: &ConnState,
    tx: &mut WsSink,
) -> Result<(), axum::Error> {
    let req = match serde_json::from_str::<ClientFrame>(text) {
        Ok(ClientFrame::Req(req)) => req,
        Ok(ClientFrame::Other) => {
            debug!(document = %document, "ignoring non-request frame");
            return Ok(());
        }
        Err(e) => {
            warn!(document = %document, error = %e, "malformed frame");
            return Ok(());
        }
    };

    let res = dispatch(&req, plot, conn).await;
    send::json(tx, &res).await
}

/// Route one request to its handler.
pub async fn dispatch(req: &Request, plot: &PlotName, conn: &ConnState) -> ResFrame {
    match req.call() {
        Ok(Call::Ping) => ResFrame::ok(
            &req.id,
            Reply::Pong {
                ts: chrono::Utc::now().timestamp_millis(),
            },
        ),
        Ok(Call::SliderSet(params)) => slider_set(&req.id, params, plot, conn).await,
        Err(CallError::UnknownMethod(method)) => {
            error_res(&req.id, PrenightError::MethodNotFound { method })
        }
        Err(e @ CallError::BadParams { .. }) => {
            error_res(&req.id, PrenightError::Protocol(e.to_string()))
        }
    }
}

/// Redraw this session's panels at the requested time. The shared figure is
/// only read; the new SVGs go to this client alone.
async fn slider_set(
    id: &str,
    params: SliderSetParams,
    plot: &PlotName,
    conn: &ConnState,
) -> ResFrame {
    if !params.value.is_finite() {
        return error_res(
            id,
            PrenightError::Protocol("slider.set needs a finite numeric value".to_string()),
        );
    }
    let ConnState::Attached { figure } = conn else {
        return error_res(
            id,
            PrenightError::FigureNotReady {
                name: plot.to_string(),
            },
        );
    };

    let value = figure
        .slider()
        .map_or(params.value, |s| s.clamp(params.value));
    let figure = Arc::clone(figure);
    match tokio::task::spawn_blocking(move || figure.render_at(value)).await {
        Ok(Ok(panels)) => ResFrame::ok(
            id,
            Reply::Panels(PanelsUpdate {
                value,
                panels: panel_payloads(&panels),
            }),
        ),
        Ok(Err(e)) => error_res(id, PrenightError::Generation(e.to_string())),
        Err(e) => error_res(
            id,
            PrenightError::Internal(format!("slider render task failed: {e}")),
        ),
    }
}

fn error_res(id: &str, err: PrenightError) -> ResFrame {
    ResFrame::err(id, err.code(), &err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prenight_plots::{Figure, Panel};
    use prenight_protocol::methods::{PING, SLIDER_SET};
    use serde_json::json;

    fn req(method: &str, params: Option<serde_json::Value>) -> Request {
        Request {
            id: "7".to_string(),
            method: method.to_string(),
            params,
        }
    }

    fn attached() -> ConnState {
        ConnState::Attached {
            figure: Arc::new(Figure::from_panels(
                PlotName::visit(),
                vec![Panel {
                    title: "armillary".to_string(),
                    svg: "<svg/>".to_string(),
                }],
            )),
        }
    }

    #[tokio::test]
    async fn ping_is_answered() {
        let res = dispatch(&req(PING, None), &PlotName::visit(), &ConnState::Rendering).await;
        assert!(res.ok);
        assert_eq!(res.id, "7");
        assert!(matches!(res.payload, Some(Reply::Pong { .. })));
    }

    #[tokio::test]
    async fn unknown_method_is_reported() {
        let res = dispatch(&req("figure.delete", None), &PlotName::visit(), &attached()).await;
        assert!(!res.ok);
        assert_eq!(res.error.unwrap().code, "METHOD_NOT_FOUND");
    }

    #[tokio::test]
    async fn slider_before_figure_is_not_ready() {
        let res = dispatch(
            &req(SLIDER_SET, Some(json!({ "value": 60221.1 }))),
            &PlotName::visit(),
            &ConnState::Rendering,
        )
        .await;
        assert_eq!(res.error.unwrap().code, "FIGURE_NOT_READY");
    }

    #[tokio::test]
    async fn slider_needs_a_value() {
        let res = dispatch(
            &req(SLIDER_SET, Some(json!({ "value": "late" }))),
            &PlotName::visit(),
            &attached(),
        )
        .await;
        assert_eq!(res.error.unwrap().code, "PROTOCOL_ERROR");
    }

    #[tokio::test]
    async fn slider_redraws_for_this_session() {
        let res = dispatch(
            &req(SLIDER_SET, Some(json!({ "value": 60221.1 }))),
            &PlotName::visit(),
            &attached(),
        )
        .await;
        assert!(res.ok);
        let Some(Reply::Panels(update)) = res.payload else {
            panic!("expected redrawn panels");
        };
        assert_eq!(update.value, 60221.1);
        assert_eq!(update.panels.len(), 1);
        assert_eq!(update.panels[0].title, "armillary");
    }
}
