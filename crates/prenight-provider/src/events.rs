use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::instrument;

use crate::error::{ProviderError, Result};
use crate::snapshot::SchedulerSnapshot;
use crate::time::{local_sidereal_time_deg, mjd_to_datetime};

/// Sun and moon events shown on the front page, in display order.
pub const EVENT_NAMES: [&str; 6] = [
    "sun_n12_setting",
    "sun_n18_setting",
    "sun_n18_rising",
    "sun_n12_rising",
    "moonrise",
    "moonset",
];

/// One event in every time format the page shows.
#[derive(Debug, Clone)]
pub struct EventTime {
    pub event: &'static str,
    pub mjd: f64,
    pub lst_deg: f64,
    pub utc: DateTime<Utc>,
    pub civil: DateTime<Tz>,
}

#[derive(Debug, Clone)]
pub struct AstronomicalEvents {
    pub night: NaiveDate,
    pub timezone: Tz,
    pub events: Vec<EventTime>,
}

/// Parse an IANA timezone name such as `Chile/Continental`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| ProviderError::Timezone(format!("{name}: {e}")))
}

/// Event times for `night`, from a private fork of the snapshot.
#[instrument(skip(snapshot))]
pub fn generate_astronomical_events(
    snapshot: &SchedulerSnapshot,
    night: NaiveDate,
    timezone: &str,
) -> Result<AstronomicalEvents> {
    let tz = parse_timezone(timezone)?;
    let state = snapshot.fork_night(night)?;
    let c = &state.start;
    let site = state.observatory.site();

    let mjds = [
        c.sun_n12_setting,
        c.sun_n18_setting,
        c.sun_n18_rising,
        c.sun_n12_rising,
        c.moonrise,
        c.moonset,
    ];

    let events = EVENT_NAMES
        .iter()
        .zip(mjds)
        .map(|(&event, mjd)| {
            let utc = mjd_to_datetime(mjd).ok_or(ProviderError::NoEphemeris { mjd })?;
            Ok(EventTime {
                event,
                mjd,
                lst_deg: local_sidereal_time_deg(mjd, site.longitude),
                utc,
                civil: utc.with_timezone(&tz),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AstronomicalEvents {
        night,
        timezone: tz,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn events_cover_every_name_in_order() {
        let snapshot = fixtures::snapshot();
        let events = generate_astronomical_events(&snapshot, fixtures::night(), "Chile/Continental")
            .unwrap();
        let names: Vec<_> = events.events.iter().map(|e| e.event).collect();
        assert_eq!(names, EVENT_NAMES);
        assert_eq!(events.events[0].mjd, fixtures::SUN_N12_SETTING);
        for e in &events.events {
            assert!((0.0..360.0).contains(&e.lst_deg));
            assert_eq!(e.civil.naive_utc(), e.utc.naive_utc());
        }
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let snapshot = fixtures::snapshot();
        let err = generate_astronomical_events(&snapshot, fixtures::night(), "Mars/Olympus")
            .unwrap_err();
        assert!(matches!(err, ProviderError::Timezone(_)));
    }
}
