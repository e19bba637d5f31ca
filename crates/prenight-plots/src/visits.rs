use std::sync::Arc;

use tracing::{debug, instrument};

use prenight_core::PlotName;
use prenight_provider::{Visit, VisitStore};

use crate::builder::{NightContext, PlotBuilder};
use crate::error::Result;
use crate::figure::{Figure, PanelModel, Slider};
use crate::footprint::select_footprint;
use crate::sky::Projection;
use crate::skymap::{Marker, SkyMap};
use crate::style::{self, BandStyles, ColourMap};

const MAP_SIZE: u32 = 500;
// one minute
const SLIDER_STEP: f64 = 1.0 / 1440.0;

/// Completed visits drawn over the footprint on an armillary sphere and a
/// planisphere, with a time slider across the night.
pub struct VisitBuilder {
    context: NightContext,
    visits_path: String,
    lookback_days: Option<f64>,
    bands: BandStyles,
}

impl VisitBuilder {
    pub fn new(
        context: NightContext,
        visits_path: impl Into<String>,
        lookback_days: Option<f64>,
        bands: BandStyles,
    ) -> Self {
        Self {
            context,
            visits_path: visits_path.into(),
            lookback_days,
            bands,
        }
    }

    /// One marker per visit started before `until`, skipping bands without a
    /// style.
    fn markers(&self, visits: &[Visit], until: f64) -> Vec<Marker> {
        let since = self.lookback_days.map_or(f64::NEG_INFINITY, |days| until - days);
        visits
            .iter()
            .filter(|v| v.observation_start_mjd <= until && v.observation_start_mjd >= since)
            .filter_map(|v| {
                let (colour, size) = self.bands.get(&v.filter)?;
                Some(Marker {
                    name: v.observation_id.to_string(),
                    ra: v.field_ra,
                    dec: v.field_dec,
                    min_mjd: v.observation_start_mjd,
                    colour,
                    size,
                })
            })
            .collect()
    }
}

impl PlotBuilder for VisitBuilder {
    #[instrument(skip(self), fields(night = %self.context.night, path = %self.visits_path))]
    fn build(&self, name: &PlotName) -> Result<Figure> {
        let state = self.context.fork()?;
        let visits = VisitStore::open(&self.visits_path)?.load_visits()?;
        let footprint = select_footprint(&state.scheduler)?;

        let start = &state.start;
        let middle = start.night_middle();
        let markers = self.markers(&visits, start.sun_n12_rising);
        debug!(total = visits.len(), drawn = markers.len(), "visits selected");

        let map = |title: &str, projection| SkyMap {
            title: title.to_string(),
            projection,
            site: start.site,
            mjd: middle,
            caption_time: true,
            size: MAP_SIZE,
            footprint: Some((footprint.clone(), ColourMap::Greys { high: 8.0 })),
            markers: markers.clone(),
            moon_colour: style::MOON_VISITS,
            ephemeris: Arc::clone(self.context.snapshot.observatory()),
        };
        let models = vec![
            PanelModel::Sky(map("Armillary sphere", Projection::Armillary)),
            PanelModel::Sky(map("Planisphere", Projection::Planisphere)),
        ];
        let slider = Slider {
            title: "MJD".to_string(),
            start: start.sun_n12_setting,
            end: start.sun_n12_rising,
            step: SLIDER_STEP,
            value: middle,
        };

        Figure::new(name.clone(), models, Some(slider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use prenight_provider::fixtures;

    use crate::error::PlotError;

    fn bands() -> BandStyles {
        let colours = BTreeMap::from([
            ("u".to_string(), "#56b4e9".to_string()),
            ("g".to_string(), "#008060".to_string()),
            ("r".to_string(), "#ff4000".to_string()),
            ("i".to_string(), "#850000".to_string()),
            ("z".to_string(), "#6600cc".to_string()),
            ("y".to_string(), "#000000".to_string()),
        ]);
        BandStyles::from_hex(&colours).unwrap()
    }

    fn builder(dir: &tempfile::TempDir, lookback: Option<f64>) -> VisitBuilder {
        let path = dir.path().join("baseline.db");
        fixtures::write_visit_db(&path, &fixtures::visits()).unwrap();
        VisitBuilder::new(
            NightContext::new(Arc::new(fixtures::snapshot()), fixtures::night()),
            path.to_string_lossy(),
            lookback,
            bands(),
        )
    }

    #[test]
    fn builds_two_linked_maps_with_slider() {
        let dir = tempfile::tempdir().unwrap();
        let figure = builder(&dir, None).build(&PlotName::visit()).unwrap();
        assert_eq!(figure.panels().len(), 2);
        assert_eq!(figure.panels()[0].title, "Armillary sphere");
        assert_eq!(figure.panels()[1].title, "Planisphere");

        let slider = figure.slider().unwrap();
        assert_eq!(slider.start, fixtures::SUN_N12_SETTING);
        assert_eq!(slider.end, fixtures::SUN_N12_RISING);
        assert!((slider.value - (slider.start + slider.end) / 2.0).abs() < 1e-12);

        // redrawing at another time leaves the figure untouched
        let before = figure.panels().to_vec();
        let moved = figure.render_at(slider.start).unwrap();
        assert_ne!(moved[1].svg, before[1].svg);
        assert_eq!(figure.panels(), before.as_slice());
    }

    #[test]
    fn markers_stop_at_night_end_and_honour_lookback() {
        let dir = tempfile::tempdir().unwrap();
        let visits = fixtures::visits();

        let all = builder(&dir, None).markers(&visits, fixtures::SUN_N12_RISING);
        let ids: Vec<_> = all.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "4"]);
        assert_eq!(all[0].size, 15);

        let dir = tempfile::tempdir().unwrap();
        let recent = builder(&dir, Some(5.0)).markers(&visits, fixtures::SUN_N12_RISING);
        let ids: Vec<_> = recent.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(ids, ["2", "3", "4"]);
    }

    #[test]
    fn missing_visit_database_fails_the_build() {
        let builder = VisitBuilder::new(
            NightContext::new(Arc::new(fixtures::snapshot()), fixtures::night()),
            "/nonexistent/baseline.db",
            None,
            bands(),
        );
        assert!(matches!(
            builder.build(&PlotName::visit()),
            Err(PlotError::Provider(_))
        ));
    }
}
