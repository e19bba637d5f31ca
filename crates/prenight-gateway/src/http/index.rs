use axum::{extract::State, response::Html};
use std::fmt::Write;
use std::sync::Arc;

use prenight_core::config::PrenightConfig;
use prenight_core::PlotName;
use prenight_provider::events::AstronomicalEvents;

use crate::app::AppState;

static INDEX_HTML: &str = include_str!("../../static/index.html");

/// Serve the briefing page at `GET /`.
pub async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    let events = state.events.read().await;
    Html(render_index(&state.config, events.as_ref()))
}

pub fn render_index(config: &PrenightConfig, events: Option<&AstronomicalEvents>) -> String {
    let plots = PlotName::dashboard()
        .iter()
        .map(|plot| {
            format!(
                "<section class=\"plot\">\n<h2>{}</h2>\n{}\n</section>",
                heading(plot),
                server_document(&config.frontend.plot_server_url, plot)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    INDEX_HTML
        .replace("{{night}}", &config.night.date.to_string())
        .replace("{{plots}}", &plots)
        .replace("{{events}}", &events_table(events))
}

/// Embed snippet for one plot-server document. The script connects to
/// `<plot server>/<plot>/ws` and renders into the element before it.
pub fn server_document(plot_server_url: &str, plot: &PlotName) -> String {
    let base = plot_server_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        format!("ws://{base}")
    };
    let target = format!("prenight-{}", escape(plot.as_str()));
    format!(
        "<div class=\"prenight-document\" id=\"{target}\"></div>\n\
         <script src=\"{src}/autoload.js\" data-target=\"{target}\" data-ws=\"{ws}/{plot}/ws\"></script>",
        src = escape(base),
        ws = escape(&ws_base),
        plot = escape(plot.as_str()),
    )
}

fn heading(plot: &PlotName) -> String {
    match plot.as_str() {
        PlotName::NIGHT_REWARD => "Night rewards".to_string(),
        PlotName::FOOTPRINT => "Survey footprint".to_string(),
        PlotName::VISIT => "Completed visits".to_string(),
        other => escape(other),
    }
}

fn events_table(events: Option<&AstronomicalEvents>) -> String {
    let Some(events) = events else {
        return "<p class=\"unavailable\">Astronomical events are not yet available.</p>"
            .to_string();
    };

    let mut html = String::from(
        "<table class=\"events\">\n<thead><tr><th>Event</th><th>MJD</th><th>LST (deg)</th>\
         <th>UTC</th><th>Local time</th></tr></thead>\n<tbody>\n",
    );
    for e in &events.events {
        // writing to a String cannot fail
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{:.4}</td><td>{:.2}</td><td>{}</td><td>{}</td></tr>",
            e.event,
            e.mjd,
            e.lst_deg,
            e.utc.format("%Y-%m-%d %H:%M:%S"),
            e.civil.format("%Y-%m-%d %H:%M:%S %Z"),
        );
    }
    html.push_str("</tbody>\n</table>");
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
