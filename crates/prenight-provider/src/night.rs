use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::Result;
use crate::observatory::{Conditions, ModelObservatory};
use crate::scheduler::Scheduler;
use crate::snapshot::SchedulerSnapshot;
use crate::time::date_to_mjd;

/// A builder's private copy of the observatory clock and scheduler,
/// positioned at the start of the target night.
#[derive(Debug, Clone)]
pub struct NightState {
    pub observatory: ModelObservatory,
    pub scheduler: Scheduler,
    /// Conditions at `sun_n12_setting`, already applied to `scheduler`.
    pub start: Conditions,
}

impl SchedulerSnapshot {
    /// Fork a private [`NightState`] for `night`.
    ///
    /// The clock is first set to 00:00 UTC of `night` to find that night's
    /// -12° evening twilight, then moved there and the scheduler updated.
    pub fn fork_night(&self, night: NaiveDate) -> Result<NightState> {
        let night_mjd = date_to_mjd(night);
        let mut observatory =
            ModelObservatory::new(Arc::clone(self.observatory()), night_mjd - 1.0);

        observatory.set_mjd(night_mjd);
        let at_date = observatory.return_conditions()?;

        observatory.set_mjd(at_date.sun_n12_setting);
        let start = observatory.return_conditions()?;

        let mut scheduler = self.scheduler().clone();
        scheduler.update_conditions(start.clone());
        debug!(%night, start_mjd = start.mjd, "forked night state");

        Ok(NightState {
            observatory,
            scheduler,
            start,
        })
    }
}

impl NightState {
    /// Move the private clock and return the conditions there.
    pub fn conditions_at(&mut self, mjd: f64) -> Result<Conditions> {
        self.observatory.set_mjd(mjd);
        self.observatory.return_conditions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn forks_are_independent() {
        let snapshot = fixtures::snapshot();
        let mut a = snapshot.fork_night(fixtures::night()).unwrap();
        let b = snapshot.fork_night(fixtures::night()).unwrap();

        assert_eq!(a.start.mjd, fixtures::SUN_N12_SETTING);
        a.conditions_at(60_221.3).unwrap();
        assert_eq!(a.observatory.mjd(), 60_221.3);
        assert_eq!(b.observatory.mjd(), fixtures::SUN_N12_SETTING);

        // the shared snapshot keeps its own saved conditions
        let shared = snapshot.scheduler().conditions().unwrap();
        assert_ne!(shared.mjd, a.start.mjd);
    }

    #[test]
    fn night_outside_snapshot_fails() {
        let snapshot = fixtures::snapshot();
        let night = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert!(snapshot.fork_night(night).is_err());
    }
}
