//! Spherical trigonometry for placing markers on sky maps.
//!
//! Only what the maps need: equatorial ↔ horizontal conversion and two
//! projections onto the unit disc. Accuracy is that of the simple formulae
//! (no refraction, precession or nutation).

use std::f64::consts::PI;

use nalgebra::{Rotation3, Vector3};
use prenight_provider::Site;

/// Mean obliquity of the ecliptic, degrees.
const OBLIQUITY_DEG: f64 = 23.439;

/// How a sky map flattens the celestial sphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Observer-centred: orthographic view of the visible hemisphere from
    /// the zenith, north up and east left.
    Armillary,
    /// Lambert equal-area around the south celestial pole; the whole sky
    /// with declination 90° on the outer rim.
    Planisphere,
}

/// Unit vector of a point at longitude `lon` and latitude `lat` (degrees).
fn unit(lon: f64, lat: f64) -> Vector3<f64> {
    let (lon, lat) = (lon.to_radians(), lat.to_radians());
    Vector3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
}

/// Longitude in [0, 360) and latitude of a unit vector, in degrees.
fn angles(v: &Vector3<f64>) -> (f64, f64) {
    let lon = v.y.atan2(v.x).to_degrees().rem_euclid(360.0);
    (lon, v.z.clamp(-1.0, 1.0).asin().to_degrees())
}

/// Equatorial frame to a frame with x to the meridian on the equator, y east
/// and z to the north celestial pole. Longitudes there are minus the hour
/// angle.
fn hour_angle_frame(lst_deg: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), -lst_deg.to_radians())
}

/// Equatorial frame to the horizon frame: x north, y west, z zenith.
fn horizon_frame(lst_deg: f64, latitude: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), PI)
        * Rotation3::from_axis_angle(&Vector3::y_axis(), (latitude - 90.0).to_radians())
        * hour_angle_frame(lst_deg)
}

/// Horizon-frame vector of `alt`/`az`; azimuth runs from north through east.
fn horizontal_unit(alt: f64, az: f64) -> Vector3<f64> {
    unit(-az, alt)
}

/// Altitude and azimuth (degrees, azimuth from north through east) of a
/// point at `ra`/`dec` for local sidereal time `lst_deg`.
pub fn equatorial_to_horizontal(ra: f64, dec: f64, lst_deg: f64, latitude: f64) -> (f64, f64) {
    let v = horizon_frame(lst_deg, latitude) * unit(ra, dec);
    let (west_lon, alt) = angles(&v);
    (alt, (360.0 - west_lon).rem_euclid(360.0))
}

/// Right ascension and declination (degrees) of the point at `alt`/`az`.
pub fn horizontal_to_equatorial(alt: f64, az: f64, lst_deg: f64, latitude: f64) -> (f64, f64) {
    let v = horizon_frame(lst_deg, latitude).inverse() * horizontal_unit(alt, az);
    angles(&v)
}

/// Everything a projection needs about the moment being drawn.
#[derive(Debug, Clone, Copy)]
pub struct View {
    pub projection: Projection,
    pub lst_deg: f64,
    pub site: Site,
}

impl View {
    /// Position on the unit disc, or `None` when the point is not drawn
    /// (below the horizon of an armillary map).
    pub fn project(&self, ra: f64, dec: f64) -> Option<(f64, f64)> {
        match self.projection {
            Projection::Armillary => {
                let v = horizon_frame(self.lst_deg, self.site.latitude) * unit(ra, dec);
                armillary(&v)
            }
            Projection::Planisphere => {
                let v = hour_angle_frame(self.lst_deg) * unit(ra, dec);
                Some(planisphere(&v))
            }
        }
    }

    /// Position of a point given in horizontal coordinates.
    pub fn project_horizontal(&self, alt: f64, az: f64) -> (f64, f64) {
        let v = horizontal_unit(alt, az);
        match self.projection {
            // drawn below the horizon too, for the horizon circle itself
            Projection::Armillary => (v.y, v.x),
            Projection::Planisphere => {
                let equatorial = horizon_frame(self.lst_deg, self.site.latitude).inverse() * v;
                planisphere(&(hour_angle_frame(self.lst_deg) * equatorial))
            }
        }
    }

    /// Closed circle of constant altitude, sampled every 2° of azimuth.
    pub fn altitude_circle(&self, alt: f64) -> Vec<(f64, f64)> {
        (0..=180)
            .map(|i| self.project_horizontal(alt, f64::from(i) * 2.0))
            .collect()
    }
}

/// Orthographic view from the zenith of a horizon-frame vector: north up,
/// east left, nothing below the horizon.
fn armillary(v: &Vector3<f64>) -> Option<(f64, f64)> {
    (v.z >= 0.0).then_some((v.y, v.x))
}

/// Lambert equal-area around the south pole of an hour-angle-frame vector,
/// scaled so the north pole lies on the unit circle.
fn planisphere(v: &Vector3<f64>) -> (f64, f64) {
    let r = ((1.0 + v.z.clamp(-1.0, 1.0)) / 2.0).sqrt();
    let phi = v.y.atan2(v.x);
    (-r * phi.sin(), r * phi.cos())
}

/// Ecliptic in equatorial coordinates, sampled every 5° of longitude.
pub fn ecliptic() -> Vec<(f64, f64)> {
    let tilt = Rotation3::from_axis_angle(&Vector3::x_axis(), OBLIQUITY_DEG.to_radians());
    (0..=72)
        .map(|i| angles(&(tilt * unit(f64::from(i) * 5.0, 0.0))))
        .collect()
}
