use prenight_plots::{Figure, Panel};
use prenight_protocol::document::{FigurePayload, PanelPayload, SliderPayload};

pub fn panel_payloads(panels: &[Panel]) -> Vec<PanelPayload> {
    panels
        .iter()
        .map(|p| PanelPayload {
            title: p.title.clone(),
            svg: p.svg.clone(),
        })
        .collect()
}

/// Wire form of a generated figure, as first shown to a session.
pub fn figure_payload(figure: &Figure) -> FigurePayload {
    FigurePayload {
        name: figure.name().to_string(),
        figure_id: figure.id().to_string(),
        generated_at: figure.generated_at().to_rfc3339(),
        panels: panel_payloads(figure.panels()),
        slider: figure.slider().map(|s| SliderPayload {
            title: s.title.clone(),
            start: s.start,
            end: s.end,
            step: s.step,
            value: s.value,
        }),
    }
}
