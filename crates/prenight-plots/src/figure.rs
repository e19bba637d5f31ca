use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use prenight_core::PlotName;

use crate::error::Result;
use crate::lines::LinePlot;
use crate::skymap::SkyMap;

/// Unique identity of one generated figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FigureId(pub Uuid);

impl FigureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FigureId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FigureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a panel draws, kept so sessions can redraw it at another time.
#[derive(Debug, Clone)]
pub enum PanelModel {
    Lines(LinePlot),
    Sky(SkyMap),
}

impl PanelModel {
    pub fn title(&self) -> &str {
        match self {
            PanelModel::Lines(plot) => &plot.title,
            PanelModel::Sky(map) => &map.title,
        }
    }

    fn render(&self, mjd: Option<f64>) -> Result<String> {
        match (self, mjd) {
            (PanelModel::Lines(plot), _) => plot.render(),
            (PanelModel::Sky(map), Some(mjd)) => map.render_at(mjd),
            (PanelModel::Sky(map), None) => map.render(),
        }
    }

    fn follows_slider(&self) -> bool {
        matches!(self, PanelModel::Sky(_))
    }
}

/// A rendered panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub svg: String,
}

/// Time slider shown under the panels, in MJD.
#[derive(Debug, Clone, PartialEq)]
pub struct Slider {
    pub title: String,
    pub start: f64,
    pub end: f64,
    pub step: f64,
    pub value: f64,
}

impl Slider {
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.start, self.end)
    }
}

/// An immutable generated figure. Shared as `Arc<Figure>` between the cache
/// and the session it is attached to.
#[derive(Debug, Clone)]
pub struct Figure {
    id: FigureId,
    name: PlotName,
    generated_at: DateTime<Utc>,
    models: Vec<PanelModel>,
    panels: Vec<Panel>,
    slider: Option<Slider>,
}

impl Figure {
    /// Render every model. Sky panels are drawn at the slider value when
    /// there is a slider.
    pub fn new(name: PlotName, models: Vec<PanelModel>, slider: Option<Slider>) -> Result<Self> {
        let at = slider.as_ref().map(|s| s.value);
        let panels = models
            .iter()
            .map(|m| {
                Ok(Panel {
                    title: m.title().to_string(),
                    svg: m.render(at)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            id: FigureId::new(),
            name,
            generated_at: Utc::now(),
            models,
            panels,
            slider,
        })
    }

    /// A figure from already-rendered panels; it cannot be redrawn.
    pub fn from_panels(name: PlotName, panels: Vec<Panel>) -> Self {
        Self {
            id: FigureId::new(),
            name,
            generated_at: Utc::now(),
            models: Vec::new(),
            panels,
            slider: None,
        }
    }

    pub fn id(&self) -> FigureId {
        self.id
    }

    pub fn name(&self) -> &PlotName {
        &self.name
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn models(&self) -> &[PanelModel] {
        &self.models
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn slider(&self) -> Option<&Slider> {
        self.slider.as_ref()
    }

    /// Panels as seen at `mjd`, clamped to the slider range. Panels that do
    /// not depend on time are returned as generated.
    pub fn render_at(&self, mjd: f64) -> Result<Vec<Panel>> {
        let mjd = self.slider.as_ref().map_or(mjd, |s| s.clamp(mjd));
        if self.models.is_empty() {
            return Ok(self.panels.clone());
        }
        self.models
            .iter()
            .zip(&self.panels)
            .map(|(model, panel)| {
                if model.follows_slider() {
                    Ok(Panel {
                        title: panel.title.clone(),
                        svg: model.render(Some(mjd))?,
                    })
                } else {
                    Ok(panel.clone())
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prerendered_figures_are_static() {
        let figure = Figure::from_panels(
            PlotName::footprint(),
            vec![Panel {
                title: "night start".to_string(),
                svg: "<svg/>".to_string(),
            }],
        );
        assert_eq!(figure.render_at(60_221.0).unwrap(), figure.panels());
        assert!(figure.slider().is_none());
        assert_ne!(figure.id(), Figure::from_panels(PlotName::footprint(), Vec::new()).id());
    }

    #[test]
    fn slider_clamps_to_its_range() {
        let slider = Slider {
            title: "MJD".to_string(),
            start: 1.0,
            end: 2.0,
            step: 0.1,
            value: 1.5,
        };
        assert_eq!(slider.clamp(0.0), 1.0);
        assert_eq!(slider.clamp(1.25), 1.25);
        assert_eq!(slider.clamp(3.0), 2.0);
    }
}
