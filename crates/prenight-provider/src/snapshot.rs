use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{ProviderError, Result};
use crate::observatory::ModelObservatory;
use crate::scheduler::Scheduler;

/// Observatory location. Degrees and metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub longitude: f64,
    pub latitude: f64,
    pub height: f64,
}

/// Twilight and moon event times (MJD) for one noon-to-noon block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NightEvents {
    /// First MJD covered by this block.
    pub start: f64,
    /// End of the block (exclusive).
    pub end: f64,
    pub sun_n12_setting: f64,
    pub sun_n18_setting: f64,
    pub sun_n18_rising: f64,
    pub sun_n12_rising: f64,
    pub moonrise: f64,
    pub moonset: f64,
}

/// Sun and moon apparent positions in degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EphemerisSample {
    pub mjd: f64,
    pub sun_ra: f64,
    pub sun_dec: f64,
    pub moon_ra: f64,
    pub moon_dec: f64,
}

/// Tables the observatory model interpolates from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservatoryData {
    pub site: Site,
    pub nights: Vec<NightEvents>,
    pub ephemeris: Vec<EphemerisSample>,
}

impl ObservatoryData {
    /// The night block whose `[start, end)` interval contains `mjd`.
    pub fn night_containing(&self, mjd: f64) -> Option<&NightEvents> {
        self.nights.iter().find(|n| n.start <= mjd && mjd < n.end)
    }

    /// Linear interpolation of the ephemeris, unwrapping RA across 0/360.
    pub fn sun_moon_at(&self, mjd: f64) -> Option<EphemerisSample> {
        let idx = self.ephemeris.partition_point(|s| s.mjd <= mjd);
        if idx == 0 {
            return None;
        }
        let before = self.ephemeris[idx - 1];
        if before.mjd == mjd {
            return Some(before);
        }
        let after = *self.ephemeris.get(idx)?;
        let t = (mjd - before.mjd) / (after.mjd - before.mjd);
        Some(EphemerisSample {
            mjd,
            sun_ra: lerp_angle(before.sun_ra, after.sun_ra, t),
            sun_dec: lerp(before.sun_dec, after.sun_dec, t),
            moon_ra: lerp_angle(before.moon_ra, after.moon_ra, t),
            moon_dec: lerp(before.moon_dec, after.moon_dec, t),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.ephemeris.windows(2).any(|w| w[0].mjd >= w[1].mjd) {
            return Err(ProviderError::InvalidSnapshot(
                "ephemeris samples must be strictly increasing in MJD".to_string(),
            ));
        }
        if let Some(bad) = self.nights.iter().find(|n| n.start >= n.end) {
            return Err(ProviderError::InvalidSnapshot(format!(
                "night block starting at MJD {} is empty",
                bad.start
            )));
        }
        Ok(())
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_angle(a: f64, b: f64, t: f64) -> f64 {
    let mut delta = (b - a).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    (a + delta * t).rem_euclid(360.0)
}

/// On-disk layout of a scheduler snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub observatory: ObservatoryData,
    pub scheduler: Scheduler,
    /// Time of the conditions the scheduler was saved with, if any.
    #[serde(default)]
    pub conditions_mjd: Option<f64>,
}

/// Loaded, immutable scheduler/observatory state shared by all builders.
#[derive(Debug, Clone)]
pub struct SchedulerSnapshot {
    observatory: Arc<ObservatoryData>,
    scheduler: Scheduler,
}

impl SchedulerSnapshot {
    /// Load a snapshot; files ending in `.gz` are gunzipped first.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let compressed = path.extension().is_some_and(|ext| ext == "gz");
        let file: SnapshotFile = if compressed {
            decode(GzDecoder::new(reader))?
        } else {
            decode(reader)?
        };
        let snapshot = Self::from_file(file)?;
        info!(
            tiers = snapshot.scheduler.survey_lists.len(),
            nights = snapshot.observatory.nights.len(),
            compressed,
            "scheduler snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Validate decoded contents and apply the saved conditions.
    pub fn from_file(file: SnapshotFile) -> Result<Self> {
        file.observatory.validate()?;
        let observatory = Arc::new(file.observatory);
        let mut scheduler = file.scheduler;
        if let Some(mjd) = file.conditions_mjd {
            let conditions =
                ModelObservatory::new(Arc::clone(&observatory), mjd).return_conditions()?;
            scheduler.update_conditions(conditions);
        }
        Ok(Self {
            observatory,
            scheduler,
        })
    }

    pub fn observatory(&self) -> &Arc<ObservatoryData> {
        &self.observatory
    }

    pub fn site(&self) -> Site {
        self.observatory.site
    }

    /// The scheduler as loaded. Builders must clone before mutating.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

fn decode<R: Read>(reader: R) -> Result<SnapshotFile> {
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn loads_plain_and_gzipped_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let plain = fixtures::write_snapshot(dir.path(), false);
        let gz = fixtures::write_snapshot(dir.path(), true);
        assert!(gz.to_string_lossy().ends_with(".json.gz"));

        let a = SchedulerSnapshot::load(&plain).unwrap();
        let b = SchedulerSnapshot::load(&gz).unwrap();
        assert_eq!(a.scheduler().survey_lists.len(), 2);
        assert_eq!(
            a.scheduler().survey_lists.len(),
            b.scheduler().survey_lists.len()
        );
        // saved conditions are applied on load
        assert!(a.scheduler().conditions().is_some());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SchedulerSnapshot::load("/nonexistent/scheduler.json").unwrap_err();
        assert!(matches!(err, ProviderError::Io(_)));
    }

    #[test]
    fn rejects_unsorted_ephemeris() {
        let mut file = fixtures::snapshot_file();
        file.observatory.ephemeris.swap(0, 1);
        let err = SchedulerSnapshot::from_file(file).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidSnapshot(_)));
    }

    #[test]
    fn ephemeris_interpolates_across_ra_wrap() {
        let data = ObservatoryData {
            site: fixtures::site(),
            nights: Vec::new(),
            ephemeris: vec![
                EphemerisSample {
                    mjd: 0.0,
                    sun_ra: 350.0,
                    sun_dec: 0.0,
                    moon_ra: 10.0,
                    moon_dec: 0.0,
                },
                EphemerisSample {
                    mjd: 1.0,
                    sun_ra: 10.0,
                    sun_dec: 2.0,
                    moon_ra: 20.0,
                    moon_dec: 4.0,
                },
            ],
        };
        let mid = data.sun_moon_at(0.5).unwrap();
        assert!(mid.sun_ra.abs() < 1e-9 || (mid.sun_ra - 360.0).abs() < 1e-9);
        assert!((mid.sun_dec - 1.0).abs() < 1e-12);
        assert!((mid.moon_ra - 15.0).abs() < 1e-12);
        assert!(data.sun_moon_at(-0.1).is_none());
        assert!(data.sun_moon_at(1.5).is_none());
    }
}
