//! Synthetic snapshot and visit history covering the night of 2023-10-04.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use flate2::write::GzEncoder;
use flate2::Compression;
use rusqlite::Connection;

use crate::error::Result;
use crate::scheduler::{BasisFunction, Footprint, RewardSample, Scheduler, Survey, SurveyKind};
use crate::snapshot::{
    EphemerisSample, NightEvents, ObservatoryData, SchedulerSnapshot, Site, SnapshotFile,
};
use crate::visits::Visit;

pub const NIGHT_START_BLOCK: f64 = 60_220.5;
pub const SUN_N12_SETTING: f64 = 60_220.98;
pub const SUN_N18_SETTING: f64 = 60_221.0;
pub const SUN_N18_RISING: f64 = 60_221.36;
pub const SUN_N12_RISING: f64 = 60_221.38;
pub const SAVED_CONDITIONS_MJD: f64 = 60_220.9;

pub fn night() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 10, 4).expect("valid date")
}

pub fn site() -> Site {
    Site {
        longitude: -70.7494,
        latitude: -30.2444,
        height: 2650.0,
    }
}

/// Footprint over a coarse 30° x 30° grid, deeper toward the south pole.
pub fn footprint() -> Footprint {
    let mut ra = Vec::new();
    let mut dec = Vec::new();
    let mut g = Vec::new();
    let mut r = Vec::new();
    for d in [-75.0, -45.0, -15.0, 15.0] {
        for step in 0..12 {
            ra.push(f64::from(step) * 30.0);
            dec.push(d);
            g.push(if d < 0.0 { 1.0 } else { 0.0 });
            r.push(if d < -30.0 { 2.0 } else { 0.0 });
        }
    }
    Footprint {
        ra,
        dec,
        footprints: BTreeMap::from([("g".to_string(), g), ("r".to_string(), r)]),
    }
}

fn samples(points: &[(f64, f64, bool)]) -> Vec<RewardSample> {
    points
        .iter()
        .map(|&(mjd, value, feasible)| RewardSample { mjd, value, feasible })
        .collect()
}

/// Two tiers: a deep drilling field, then a blob and a greedy survey that
/// share the same footprint.
pub fn scheduler() -> Scheduler {
    let ddf = Survey {
        survey_name: "DD:ELAISS1".to_string(),
        kind: SurveyKind::DeepDrilling,
        basis_functions: vec![BasisFunction {
            name: "Time_in_twilight".to_string(),
            weight: 1.0,
            samples: samples(&[
                (60_220.9, 0.0, false),
                (60_221.1, 5.0, true),
                (60_221.3, 0.0, false),
            ]),
            footprint: None,
        }],
    };
    let blob = Survey {
        survey_name: "blob_gr".to_string(),
        kind: SurveyKind::Blob,
        basis_functions: vec![
            BasisFunction {
                name: "Footprint_basis_function".to_string(),
                weight: 0.3,
                samples: samples(&[(60_220.9, 1.0, true), (60_221.2, 0.5, true)]),
                footprint: Some(footprint()),
            },
            BasisFunction {
                name: "M5_diff_basis_function".to_string(),
                weight: 3.0,
                samples: samples(&[
                    (60_220.9, 0.2, true),
                    (60_221.1, 0.8, true),
                    (60_221.3, 0.4, true),
                ]),
                footprint: None,
            },
        ],
    };
    let greedy = Survey {
        survey_name: "greedy".to_string(),
        kind: SurveyKind::Greedy,
        basis_functions: vec![
            BasisFunction {
                name: "Footprint_basis_function".to_string(),
                weight: 0.3,
                samples: samples(&[(60_220.9, 0.8, true)]),
                footprint: Some(footprint()),
            },
            BasisFunction {
                name: "Slewtime_basis_function".to_string(),
                weight: 3.0,
                samples: Vec::new(),
                footprint: None,
            },
        ],
    };
    Scheduler::new(vec![vec![ddf], vec![blob, greedy]])
}

pub fn observatory() -> ObservatoryData {
    let ephemeris = (0..=26)
        .map(|i| {
            let dt = f64::from(i) * 0.05;
            EphemerisSample {
                mjd: 60_220.4 + dt,
                sun_ra: 190.0 + dt,
                sun_dec: -4.0,
                moon_ra: 100.0 + 13.0 * dt,
                moon_dec: 20.0,
            }
        })
        .collect();
    ObservatoryData {
        site: site(),
        nights: vec![NightEvents {
            start: NIGHT_START_BLOCK,
            end: NIGHT_START_BLOCK + 1.0,
            sun_n12_setting: SUN_N12_SETTING,
            sun_n18_setting: SUN_N18_SETTING,
            sun_n18_rising: SUN_N18_RISING,
            sun_n12_rising: SUN_N12_RISING,
            moonrise: 60_221.1,
            moonset: 60_221.45,
        }],
        ephemeris,
    }
}

pub fn snapshot_file() -> SnapshotFile {
    SnapshotFile {
        observatory: observatory(),
        scheduler: scheduler(),
        conditions_mjd: Some(SAVED_CONDITIONS_MJD),
    }
}

pub fn snapshot() -> SchedulerSnapshot {
    SchedulerSnapshot::from_file(snapshot_file()).expect("fixture snapshot is valid")
}

/// Write the fixture snapshot into `dir` as `scheduler.json[.gz]`.
pub fn write_snapshot(dir: &Path, gz: bool) -> PathBuf {
    let json = serde_json::to_vec(&snapshot_file()).expect("fixture serializes");
    if gz {
        let path = dir.join("scheduler.json.gz");
        let file = File::create(&path).expect("create");
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(&json).expect("write");
        encoder.finish().expect("finish gzip");
        path
    } else {
        let path = dir.join("scheduler.json");
        std::fs::write(&path, json).expect("write");
        path
    }
}

/// One visit per band: two before the night, two inside, two after it ends.
pub fn visits() -> Vec<Visit> {
    let rows = [
        (1, 10.0, -40.0, 60_200.2, "u"),
        (2, 40.0, -35.0, 60_220.2, "g"),
        (3, 300.0, -20.0, 60_221.05, "r"),
        (4, 330.0, -60.0, 60_221.25, "i"),
        (5, 350.0, -10.0, 60_221.45, "z"),
        (6, 20.0, -70.0, 60_222.1, "y"),
    ];
    rows.iter()
        .map(|&(id, ra, dec, mjd, band)| Visit {
            observation_id: id,
            field_ra: ra,
            field_dec: dec,
            observation_start_mjd: mjd,
            filter: band.to_string(),
        })
        .collect()
}

/// Create an `observations` table shaped like the survey simulator output.
pub fn write_visit_db(path: &Path, visits: &[Visit]) -> Result<()> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "CREATE TABLE observations (
            observationId       INTEGER PRIMARY KEY,
            fieldRA             REAL NOT NULL,
            fieldDec            REAL NOT NULL,
            observationStartMJD REAL NOT NULL,
            filter              TEXT NOT NULL,
            rotSkyPos           REAL NOT NULL DEFAULT 0
        );",
    )?;
    for v in visits {
        conn.execute(
            "INSERT INTO observations (observationId, fieldRA, fieldDec, observationStartMJD, filter)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                v.observation_id,
                v.field_ra,
                v.field_dec,
                v.observation_start_mjd,
                v.filter
            ],
        )?;
    }
    Ok(())
}
