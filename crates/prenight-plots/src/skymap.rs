use std::sync::Arc;

use plotters::prelude::*;

use prenight_provider::snapshot::ObservatoryData;
use prenight_provider::time::{local_sidereal_time_deg, mjd_to_iso};
use prenight_provider::{ProviderError, Site, SkyFootprint};

use crate::error::{render_err, Result};
use crate::sky::{ecliptic, Projection, View};
use crate::style::{self, ColourMap, Rgb};

const SUN_MOON_SIZE: u32 = 15;
const HORIZON_ZD_LIMIT: f64 = 70.0;

/// A point drawn once the displayed time reaches `min_mjd`.
#[derive(Debug, Clone)]
pub struct Marker {
    pub name: String,
    pub ra: f64,
    pub dec: f64,
    pub min_mjd: f64,
    pub colour: Rgb,
    /// Diameter in pixels.
    pub size: u32,
}

/// Declarative sky map: everything needed to draw it at any time of the
/// night. Drawing never mutates the model.
#[derive(Debug, Clone)]
pub struct SkyMap {
    pub title: String,
    pub projection: Projection,
    pub site: Site,
    /// Time shown when no slider value is given.
    pub mjd: f64,
    /// Append the displayed time to the caption.
    pub caption_time: bool,
    pub size: u32,
    pub footprint: Option<(SkyFootprint, ColourMap)>,
    pub markers: Vec<Marker>,
    pub moon_colour: Rgb,
    pub ephemeris: Arc<ObservatoryData>,
}

impl SkyMap {
    pub fn view(&self, mjd: f64) -> View {
        View {
            projection: self.projection,
            lst_deg: local_sidereal_time_deg(mjd, self.site.longitude),
            site: self.site,
        }
    }

    /// Markers whose time has come at `mjd`.
    pub fn visible_markers(&self, mjd: f64) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(move |m| m.min_mjd <= mjd)
    }

    pub fn render(&self) -> Result<String> {
        self.render_at(self.mjd)
    }

    /// Draw the map as seen at `mjd`.
    pub fn render_at(&self, mjd: f64) -> Result<String> {
        let view = self.view(mjd);
        let bodies = self
            .ephemeris
            .sun_moon_at(mjd)
            .ok_or(ProviderError::NoEphemeris { mjd })?;
        let caption = if self.caption_time {
            format!("{} {}", self.title, mjd_to_iso(mjd))
        } else {
            self.title.clone()
        };

        let mut svg = String::new();
        {
            let root =
                SVGBackend::with_string(&mut svg, (self.size, self.size)).into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(&caption, ("sans-serif", 14))
                .margin(5)
                .build_cartesian_2d(-1.05f64..1.05f64, -1.05f64..1.05f64)
                .map_err(render_err)?;

            if let Some((footprint, cmap)) = &self.footprint {
                let radius = (self.size / 70).max(2);
                let cells = footprint
                    .ra
                    .iter()
                    .zip(&footprint.dec)
                    .zip(&footprint.values)
                    .filter(|(_, v)| v.is_finite())
                    .filter_map(|((&ra, &dec), &v)| Some((view.project(ra, dec)?, cmap.colour(v))))
                    .map(|(p, c)| Circle::new(p, radius, RGBColor::from(c).filled()));
                chart.draw_series(cells).map_err(render_err)?;
            }

            // decorations
            let graticule = RGBColor::from(style::GRATICULE).stroke_width(1);
            for dec in [-60.0, -30.0, 0.0, 30.0, 60.0] {
                let line = (0..=72).map(|i| view.project(f64::from(i) * 5.0, dec));
                chart
                    .draw_series(split(line).into_iter().map(|s| PathElement::new(s, graticule)))
                    .map_err(render_err)?;
            }
            let ecliptic_style = RGBColor::from(style::ECLIPTIC).stroke_width(1);
            let ecliptic_line = ecliptic().into_iter().map(|(ra, dec)| view.project(ra, dec));
            chart
                .draw_series(
                    split(ecliptic_line)
                        .into_iter()
                        .map(|s| PathElement::new(s, ecliptic_style)),
                )
                .map_err(render_err)?;

            chart
                .draw_series(std::iter::once(PathElement::new(
                    view.altitude_circle(0.0),
                    RGBColor::from(style::HORIZON).stroke_width(1),
                )))
                .map_err(render_err)?;
            chart
                .draw_series(std::iter::once(PathElement::new(
                    view.altitude_circle(90.0 - HORIZON_ZD_LIMIT),
                    RGBColor::from(style::ZENITH_LIMIT).stroke_width(2),
                )))
                .map_err(render_err)?;

            let visits = self.visible_markers(mjd).filter_map(|m| {
                let p = view.project(m.ra, m.dec)?;
                Some(Circle::new(p, (m.size / 2).max(1), RGBColor::from(m.colour).filled()))
            });
            chart.draw_series(visits).map_err(render_err)?;

            let bodies = [
                (bodies.sun_ra, bodies.sun_dec, style::SUN),
                (bodies.moon_ra, bodies.moon_dec, self.moon_colour),
            ];
            chart
                .draw_series(bodies.into_iter().filter_map(|(ra, dec, colour)| {
                    let p = view.project(ra, dec)?;
                    Some(Circle::new(p, SUN_MOON_SIZE / 2, RGBColor::from(colour).filled()))
                }))
                .map_err(render_err)?;

            root.present().map_err(render_err)?;
        }
        Ok(svg)
    }
}

/// Break a projected polyline wherever a point is not drawn.
fn split(points: impl Iterator<Item = Option<(f64, f64)>>) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for p in points {
        match p {
            Some(p) => current.push(p),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    runs.push(current);
    runs.retain(|r: &Vec<(f64, f64)>| r.len() > 1);
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use prenight_provider::fixtures;

    fn map(projection: Projection) -> SkyMap {
        let snapshot = fixtures::snapshot();
        let footprint = fixtures::footprint().summed().unwrap();
        SkyMap {
            title: "Planisphere".to_string(),
            projection,
            site: snapshot.site(),
            mjd: 60_221.2,
            caption_time: true,
            size: 400,
            footprint: Some((footprint, ColourMap::Greys { high: 8.0 })),
            markers: fixtures::visits()
                .into_iter()
                .map(|v| Marker {
                    name: v.observation_id.to_string(),
                    ra: v.field_ra,
                    dec: v.field_dec,
                    min_mjd: v.observation_start_mjd,
                    colour: Rgb(0, 0, 0),
                    size: 9,
                })
                .collect(),
            moon_colour: style::MOON_VISITS,
            ephemeris: Arc::clone(snapshot.observatory()),
        }
    }

    #[test]
    fn markers_appear_once_their_time_is_reached() {
        let map = map(Projection::Planisphere);
        let early: Vec<_> = map.visible_markers(60_221.0).map(|m| m.name.as_str()).collect();
        assert_eq!(early, ["1", "2"]);
        let later = map.visible_markers(60_221.25).count();
        assert_eq!(later, 4);
        // inclusive at the visit start
        assert!(map.visible_markers(60_221.05).any(|m| m.name == "3"));
    }

    #[test]
    fn split_breaks_on_hidden_points() {
        let runs = split(
            [
                Some((0.0, 0.0)),
                Some((1.0, 1.0)),
                None,
                Some((2.0, 2.0)),
                None,
                Some((3.0, 3.0)),
                Some((4.0, 4.0)),
            ]
            .into_iter(),
        );
        assert_eq!(runs, vec![vec![(0.0, 0.0), (1.0, 1.0)], vec![(3.0, 3.0), (4.0, 4.0)]]);
    }

    #[test]
    fn renders_both_projections() {
        for projection in [Projection::Armillary, Projection::Planisphere] {
            let map = map(projection);
            let svg = map.render().unwrap();
            assert!(svg.contains("<svg"));
            assert!(svg.contains("<circle"));
            // same model, other time: different picture
            assert_ne!(svg, map.render_at(60_221.3).unwrap());
        }
    }

    #[test]
    fn time_outside_ephemeris_is_an_error() {
        let map = map(Projection::Planisphere);
        assert!(map.render_at(50_000.0).is_err());
    }
}
