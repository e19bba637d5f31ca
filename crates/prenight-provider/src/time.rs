use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// MJD of 1970-01-01T00:00:00Z.
pub const MJD_UNIX_EPOCH: f64 = 40_587.0;
pub const SECONDS_PER_DAY: f64 = 86_400.0;

// days from 0001-01-01 (CE day 1) to MJD 0
const MJD_CE_OFFSET: f64 = 678_576.0;

/// Convert an MJD (UTC scale) to a UTC timestamp, rounded to the nanosecond.
pub fn mjd_to_datetime(mjd: f64) -> Option<DateTime<Utc>> {
    let secs = (mjd - MJD_UNIX_EPOCH) * SECONDS_PER_DAY;
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
    DateTime::from_timestamp(whole as i64, nanos)
}

pub fn datetime_to_mjd(dt: DateTime<Utc>) -> f64 {
    dt.timestamp() as f64 / SECONDS_PER_DAY
        + f64::from(dt.timestamp_subsec_nanos()) / (SECONDS_PER_DAY * 1e9)
        + MJD_UNIX_EPOCH
}

/// MJD at 00:00 UTC of a calendar date.
pub fn date_to_mjd(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce()) - MJD_CE_OFFSET
}

/// ISO-like rendering used in figure titles: `2023-10-04 23:31:12.000`.
pub fn mjd_to_iso(mjd: f64) -> String {
    mjd_to_datetime(mjd)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| format!("MJD {mjd}"))
}

/// Local sidereal time in degrees, from the IAU 1982 GMST polynomial
/// truncated to the linear term.
pub fn local_sidereal_time_deg(mjd: f64, longitude_deg: f64) -> f64 {
    let gmst = 280.460_618_37 + 360.985_647_366_29 * (mjd - 51_544.5);
    (gmst + longitude_deg).rem_euclid(360.0)
}
