use std::sync::Arc;

use tracing::{debug, instrument};

use prenight_core::PlotName;
use prenight_provider::time::mjd_to_iso;
use prenight_provider::{Scheduler, SkyFootprint, SurveyKind};

use crate::builder::{NightContext, PlotBuilder};
use crate::error::{PlotError, Result};
use crate::figure::{Figure, PanelModel};
use crate::sky::Projection;
use crate::skymap::SkyMap;
use crate::style::{self, ColourMap};

const MAP_SIZE: u32 = 400;

/// Find the survey footprint to draw.
///
/// Candidates are `Footprint*` basis functions of blob and greedy surveys,
/// searched tier by tier. They must all sum to the same map.
pub fn select_footprint(scheduler: &Scheduler) -> Result<SkyFootprint> {
    let mut candidates = Vec::new();
    for (tier, surveys) in scheduler.survey_lists.iter().enumerate() {
        for survey in surveys {
            if !matches!(survey.kind, SurveyKind::Blob | SurveyKind::Greedy) {
                continue;
            }
            for bf in survey.basis_functions.iter().filter(|bf| bf.is_footprint()) {
                if let Some(footprint) = &bf.footprint {
                    let label = format!("tier {tier}/{}/{}", survey.survey_name, bf.name);
                    candidates.push((label, footprint.summed()?));
                }
            }
        }
    }

    let Some((_, first)) = candidates.first() else {
        return Err(PlotError::FootprintNotFound);
    };
    if candidates.iter().all(|(_, fp)| fp.same_as(first)) {
        debug!(candidates = candidates.len(), "footprint selected");
        let (_, footprint) = candidates.swap_remove(0);
        Ok(footprint)
    } else {
        Err(PlotError::AmbiguousFootprint {
            candidates: candidates.into_iter().map(|(label, _)| label).collect(),
        })
    }
}

/// Three planispheres of the footprint at night start, middle and end.
pub struct FootprintBuilder {
    context: NightContext,
}

impl FootprintBuilder {
    pub fn new(context: NightContext) -> Self {
        Self { context }
    }
}

impl PlotBuilder for FootprintBuilder {
    #[instrument(skip(self), fields(night = %self.context.night))]
    fn build(&self, name: &PlotName) -> Result<Figure> {
        let state = self.context.fork()?;
        let footprint = select_footprint(&state.scheduler)?;
        let start = &state.start;

        let times = [
            ("night start", start.sun_n12_setting),
            ("night middle", start.night_middle()),
            ("night end", start.sun_n12_rising),
        ];
        let models = times
            .into_iter()
            .map(|(label, mjd)| {
                PanelModel::Sky(SkyMap {
                    title: format!("{} ({label})", mjd_to_iso(mjd)),
                    projection: Projection::Planisphere,
                    site: start.site,
                    mjd,
                    caption_time: false,
                    size: MAP_SIZE,
                    footprint: Some((footprint.clone(), ColourMap::Reds { high: 5.0 })),
                    markers: Vec::new(),
                    moon_colour: style::MOON_FOOTPRINT,
                    ephemeris: Arc::clone(self.context.snapshot.observatory()),
                })
            })
            .collect();

        Figure::new(name.clone(), models, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prenight_provider::fixtures;
    use prenight_provider::scheduler::{BasisFunction, Survey};

    fn context() -> NightContext {
        NightContext::new(Arc::new(fixtures::snapshot()), fixtures::night())
    }

    fn footprint_bf(scale: f64) -> BasisFunction {
        let mut footprint = fixtures::footprint();
        for values in footprint.footprints.values_mut() {
            values.iter_mut().for_each(|v| *v *= scale);
        }
        BasisFunction {
            name: "Footprint_basis_function".to_string(),
            weight: 1.0,
            samples: Vec::new(),
            footprint: Some(footprint),
        }
    }

    fn survey(name: &str, kind: SurveyKind, bfs: Vec<BasisFunction>) -> Survey {
        Survey {
            survey_name: name.to_string(),
            kind,
            basis_functions: bfs,
        }
    }

    #[test]
    fn identical_candidates_resolve() {
        let scheduler = fixtures::scheduler();
        let fp = select_footprint(&scheduler).unwrap();
        assert!(fp.same_as(&fixtures::footprint().summed().unwrap()));
    }

    #[test]
    fn no_candidate_is_not_found() {
        // a footprint on a deep drilling survey does not count
        let scheduler = Scheduler::new(vec![vec![survey(
            "DD:COSMOS",
            SurveyKind::DeepDrilling,
            vec![footprint_bf(1.0)],
        )]]);
        assert!(matches!(
            select_footprint(&scheduler),
            Err(PlotError::FootprintNotFound)
        ));
    }

    #[test]
    fn differing_candidates_are_ambiguous() {
        let scheduler = Scheduler::new(vec![
            vec![survey("blob_gr", SurveyKind::Blob, vec![footprint_bf(1.0)])],
            vec![survey("greedy", SurveyKind::Greedy, vec![footprint_bf(2.0)])],
        ]);
        match select_footprint(&scheduler) {
            Err(PlotError::AmbiguousFootprint { candidates }) => {
                assert_eq!(
                    candidates,
                    [
                        "tier 0/blob_gr/Footprint_basis_function",
                        "tier 1/greedy/Footprint_basis_function"
                    ]
                );
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn only_footprint_basis_functions_are_candidates() {
        let mut bf = footprint_bf(1.0);
        bf.name = "M5_diff_basis_function".to_string();
        let scheduler = Scheduler::new(vec![vec![survey("blob_gr", SurveyKind::Blob, vec![bf])]]);
        assert!(matches!(
            select_footprint(&scheduler),
            Err(PlotError::FootprintNotFound)
        ));
    }

    #[test]
    fn builds_three_titled_planispheres() {
        let figure = FootprintBuilder::new(context())
            .build(&PlotName::footprint())
            .unwrap();
        let titles: Vec<_> = figure.panels().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles.len(), 3);
        assert!(titles[0].ends_with("(night start)"));
        assert!(titles[1].ends_with("(night middle)"));
        assert!(titles[2].ends_with("(night end)"));
        assert!(titles[0].starts_with("2023-10-0"));
        assert!(figure.slider().is_none());
        assert_eq!(figure.name(), &PlotName::footprint());
    }
}
