//! `prenight-provider`: read-only Data Providers for the dashboard.
//!
//! # Overview
//!
//! The scientific stack exports a scheduler/conditions snapshot (JSON,
//! optionally gzip-compressed). [`snapshot::SchedulerSnapshot`] loads it once
//! and is shared immutably; every plot builder forks its own
//! [`night::NightState`] before advancing clocks or updating conditions, so
//! concurrent builders never race on scheduler state.
//!
//! | Module        | Provides                                             |
//! |---------------|------------------------------------------------------|
//! | `snapshot`    | Snapshot file format and loading                     |
//! | `observatory` | Clocked observatory model returning [`Conditions`]   |
//! | `scheduler`   | Survey lists, reward decomposition, footprints       |
//! | `night`       | Per-builder private state set to the night start     |
//! | `visits`      | SQLite visit history (`observations` table)          |
//! | `events`      | Twilight and moon event times for the front page     |

pub mod error;
pub mod events;
pub mod night;
pub mod observatory;
pub mod scheduler;
pub mod snapshot;
pub mod time;
pub mod visits;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use error::{ProviderError, Result};
pub use night::NightState;
pub use observatory::{Conditions, ModelObservatory};
pub use scheduler::{BasisFunctionReward, Scheduler, SkyFootprint, Survey, SurveyKind};
pub use snapshot::{SchedulerSnapshot, Site};
pub use visits::{Visit, VisitStore};
