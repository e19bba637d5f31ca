use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};
use crate::snapshot::{ObservatoryData, Site};
use crate::time::local_sidereal_time_deg;

/// Observing conditions at one instant. Angles in degrees, times in MJD.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conditions {
    pub mjd: f64,
    pub site: Site,
    pub lst_deg: f64,
    pub sun_ra: f64,
    pub sun_dec: f64,
    pub moon_ra: f64,
    pub moon_dec: f64,
    pub sun_n12_setting: f64,
    pub sun_n18_setting: f64,
    pub sun_n18_rising: f64,
    pub sun_n12_rising: f64,
    pub moonrise: f64,
    pub moonset: f64,
}

impl Conditions {
    /// Midpoint between -12° twilights.
    pub fn night_middle(&self) -> f64 {
        (self.sun_n12_setting + self.sun_n12_rising) / 2.0
    }
}

/// Clocked observatory model: set `mjd`, then ask for conditions.
///
/// Cheap to construct; the tables are shared behind an `Arc`, the clock is
/// private to each instance.
#[derive(Debug, Clone)]
pub struct ModelObservatory {
    data: Arc<ObservatoryData>,
    mjd: f64,
}

impl ModelObservatory {
    pub fn new(data: Arc<ObservatoryData>, mjd_start: f64) -> Self {
        Self {
            data,
            mjd: mjd_start,
        }
    }

    pub fn mjd(&self) -> f64 {
        self.mjd
    }

    pub fn set_mjd(&mut self, mjd: f64) {
        self.mjd = mjd;
    }

    pub fn site(&self) -> Site {
        self.data.site
    }

    /// Conditions at the current clock time.
    pub fn return_conditions(&self) -> Result<Conditions> {
        let mjd = self.mjd;
        let night = self
            .data
            .night_containing(mjd)
            .ok_or(ProviderError::NoNight { mjd })?;
        let bodies = self
            .data
            .sun_moon_at(mjd)
            .ok_or(ProviderError::NoEphemeris { mjd })?;
        let site = self.data.site;

        Ok(Conditions {
            mjd,
            site,
            lst_deg: local_sidereal_time_deg(mjd, site.longitude),
            sun_ra: bodies.sun_ra,
            sun_dec: bodies.sun_dec,
            moon_ra: bodies.moon_ra,
            moon_dec: bodies.moon_dec,
            sun_n12_setting: night.sun_n12_setting,
            sun_n18_setting: night.sun_n18_setting,
            sun_n18_rising: night.sun_n18_rising,
            sun_n12_rising: night.sun_n12_rising,
            moonrise: night.moonrise,
            moonset: night.moonset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn conditions_follow_the_clock() {
        let snapshot = fixtures::snapshot();
        let mut observatory = ModelObservatory::new(Arc::clone(snapshot.observatory()), 60_221.0);
        let first = observatory.return_conditions().unwrap();
        assert_eq!(first.mjd, 60_221.0);
        assert_eq!(first.sun_n12_setting, fixtures::SUN_N12_SETTING);

        observatory.set_mjd(60_221.2);
        let later = observatory.return_conditions().unwrap();
        assert_eq!(later.sun_n12_rising, fixtures::SUN_N12_RISING);
        assert!(later.lst_deg != first.lst_deg);
    }

    #[test]
    fn outside_night_blocks_is_an_error() {
        let snapshot = fixtures::snapshot();
        let observatory = ModelObservatory::new(Arc::clone(snapshot.observatory()), 50_000.0);
        assert!(matches!(
            observatory.return_conditions(),
            Err(ProviderError::NoNight { .. })
        ));
    }
}
