use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use prenight_core::PlotName;
use prenight_plots::Figure;

/// Generation state of one plot.
#[derive(Debug, Clone)]
pub enum FigureState {
    Pending,
    Ready(Arc<Figure>),
    /// The builder failed or panicked; the reason is shown to sessions.
    Failed(String),
}

impl FigureState {
    pub fn figure(&self) -> Option<&Arc<Figure>> {
        match self {
            FigureState::Ready(figure) => Some(figure),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, FigureState::Pending)
    }
}

#[derive(Debug)]
struct Slot {
    generation: u64,
    state: FigureState,
    /// The current generation has not completed yet.
    running: bool,
}

impl Slot {
    fn idle() -> Self {
        Self {
            generation: 0,
            state: FigureState::Pending,
            running: false,
        }
    }
}

/// Plot name → latest generation and its state.
///
/// Generations are process-wide and strictly increasing. A completion is
/// kept only while its generation is still the slot's current one, so the
/// latest submission always wins whatever order builders finish in.
#[derive(Debug, Default)]
pub struct FigureCache {
    slots: DashMap<PlotName, Slot>,
    next_generation: AtomicU64,
}

impl FigureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation for `name` and mark it pending. Any figure
    /// from an earlier generation stops being served.
    pub fn begin(&self, name: &PlotName) -> u64 {
        let mut slot = self.slots.entry(name.clone()).or_insert_with(Slot::idle);
        slot.state = FigureState::Pending;
        self.restart(&mut slot)
    }

    /// Start a refresh of `name`, or `None` while its current generation is
    /// still running. A ready figure keeps being served until the refresh
    /// completes.
    pub fn begin_refresh(&self, name: &PlotName) -> Option<u64> {
        let mut slot = self.slots.entry(name.clone()).or_insert_with(Slot::idle);
        if slot.running {
            return None;
        }
        if !matches!(slot.state, FigureState::Ready(_)) {
            slot.state = FigureState::Pending;
        }
        Some(self.restart(&mut slot))
    }

    fn restart(&self, slot: &mut Slot) -> u64 {
        slot.generation = self.next_generation();
        slot.running = true;
        slot.generation
    }

    fn next_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Store the outcome of `generation`. Returns `false` when a newer
    /// generation was started meanwhile (or the cache was cleared) and the
    /// outcome was dropped.
    pub fn complete(&self, name: &PlotName, generation: u64, state: FigureState) -> bool {
        match self.slots.get_mut(name) {
            Some(mut slot) if slot.generation == generation => {
                slot.state = state;
                slot.running = false;
                true
            }
            _ => false,
        }
    }

    /// The ready figure for `name`, if any. Never blocks on generation.
    pub fn lookup(&self, name: &PlotName) -> Option<Arc<Figure>> {
        self.slots
            .get(name)
            .and_then(|slot| slot.state.figure().cloned())
    }

    /// `None` when `name` was never scheduled.
    pub fn state(&self, name: &PlotName) -> Option<FigureState> {
        self.slots.get(name).map(|slot| slot.state.clone())
    }

    /// Whether the current generation of `name` is still being built.
    pub fn is_running(&self, name: &PlotName) -> bool {
        self.slots.get(name).is_some_and(|slot| slot.running)
    }

    pub fn generation(&self, name: &PlotName) -> Option<u64> {
        self.slots.get(name).map(|slot| slot.generation)
    }

    pub fn clear(&self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
