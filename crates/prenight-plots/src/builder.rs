use std::sync::Arc;

use chrono::NaiveDate;

use prenight_core::PlotName;
use prenight_provider::{NightState, SchedulerSnapshot};

use crate::error::Result;
use crate::figure::Figure;

/// Which worker pool a builder's task waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// Bounded pool shared by I/O-bound builders.
    Shared,
    /// Single-permit pool for heavy computation.
    Exclusive,
}

/// Produces one named figure. Runs on a blocking thread; implementations
/// must not touch shared mutable state.
pub trait PlotBuilder: Send + Sync {
    fn pool(&self) -> PoolKind {
        PoolKind::Shared
    }

    fn build(&self, name: &PlotName) -> Result<Figure>;
}

/// Inputs every production builder shares: the loaded snapshot and the
/// night to show.
#[derive(Debug, Clone)]
pub struct NightContext {
    pub snapshot: Arc<SchedulerSnapshot>,
    pub night: NaiveDate,
}

impl NightContext {
    pub fn new(snapshot: Arc<SchedulerSnapshot>, night: NaiveDate) -> Self {
        Self { snapshot, night }
    }

    /// A private observatory/scheduler pair at the start of the night.
    pub fn fork(&self) -> Result<NightState> {
        Ok(self.snapshot.fork_night(self.night)?)
    }
}
