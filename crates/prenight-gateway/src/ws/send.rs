use axum::extract::ws::{Message, WebSocket};
use futures_util::{stream::SplitSink, SinkExt};
use serde::Serialize;

use prenight_protocol::frames::{EventFrame, SessionEvent};

use crate::app::AppState;

pub type WsSink = SplitSink<WebSocket, Message>;

/// Serialize any value to JSON and send it over the WS connection.
pub async fn json<T: Serialize>(tx: &mut WsSink, payload: &T) -> Result<(), axum::Error> {
    let json = serde_json::to_string(payload).map_err(axum::Error::new)?;
    tx.send(Message::Text(json.into())).await
}

/// Send a session event stamped with the next sequence number.
pub async fn event(
    tx: &mut WsSink,
    app: &AppState,
    event: SessionEvent,
) -> Result<(), axum::Error> {
    let frame = EventFrame::new(event, app.next_seq());
    json(tx, &frame).await
}
