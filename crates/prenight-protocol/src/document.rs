use serde::{Deserialize, Serialize};

/// Server → Client: first event of every session.
/// Sent as: `EVENT document.hello { protocol: 1, document_id: "...", plot: "visit" }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentHello {
    pub protocol: u32,
    pub document_id: String,
    pub plot: String,
    pub server: ServerInfo,
    pub max_message_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Server → Client: a root was added to the session's document.
/// Sent as: `EVENT root.add { kind: "figure", ... }` or `{ kind: "placeholder", text }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RootPayload {
    Figure(FigurePayload),
    Placeholder { text: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FigurePayload {
    pub name: String,
    pub figure_id: String,
    /// RFC3339 timestamp of generation.
    pub generated_at: String,
    pub panels: Vec<PanelPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slider: Option<SliderPayload>,
}

/// One rendered panel: an inline SVG document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelPayload {
    pub title: String,
    pub svg: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliderPayload {
    pub title: String,
    pub start: f64,
    pub end: f64,
    pub step: f64,
    pub value: f64,
}

/// Server → Client: the figure was taken over by another session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootRemoved {
    pub plot: String,
    pub figure_id: String,
    pub reason: String,
}

/// Client → Server: `REQ slider.set { value: 60221.1 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderSetParams {
    pub value: f64,
}

/// Payload of the `slider.set` response: panels re-rendered for this session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelsUpdate {
    pub value: f64,
    pub panels: Vec<PanelPayload>,
}

/// Server → Client heartbeat, milliseconds since the Unix epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tick {
    pub ts: i64,
}
