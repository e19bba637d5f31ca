use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use prenight_core::PlotName;
use prenight_plots::{Figure, PlotBuilder, PoolKind};

use crate::{
    cache::{FigureCache, FigureState},
    error::{CacheError, Result},
    registry::PlotRegistry,
};

struct Inner {
    registry: PlotRegistry,
    cache: FigureCache,
    shared_pool: Semaphore,
    exclusive_pool: Semaphore,
    tracker: TaskTracker,
}

/// Drives figure generation into the [`FigureCache`].
///
/// Cheap to clone; all clones share one cache, one pair of worker pools and
/// one task tracker.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

/// Tasks submitted by one [`Orchestrator::schedule_regeneration`] call.
pub struct RegenerationBatch {
    tasks: Vec<(PlotName, JoinHandle<FigureState>)>,
}

impl RegenerationBatch {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every task of the batch and return what each produced.
    pub async fn wait(self) -> Vec<(PlotName, FigureState)> {
        let mut results = Vec::with_capacity(self.tasks.len());
        for (name, handle) in self.tasks {
            match handle.await {
                Ok(state) => results.push((name, state)),
                Err(e) => {
                    error!(plot = %name, "generation task aborted: {e}");
                    results.push((name, FigureState::Failed(e.to_string())));
                }
            }
        }
        results
    }
}

impl Orchestrator {
    /// `worker_pool_size` permits for shared builders; exclusive builders
    /// run one at a time.
    pub fn new(registry: PlotRegistry, worker_pool_size: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                cache: FigureCache::new(),
                shared_pool: Semaphore::new(worker_pool_size.max(1)),
                exclusive_pool: Semaphore::new(1),
                tracker: TaskTracker::new(),
            }),
        }
    }

    pub fn cache(&self) -> &FigureCache {
        &self.inner.cache
    }

    pub fn registry(&self) -> &PlotRegistry {
        &self.inner.registry
    }

    pub fn is_registered(&self, name: &PlotName) -> bool {
        self.inner.registry.contains(name)
    }

    pub fn lookup(&self, name: &PlotName) -> Option<Arc<Figure>> {
        self.inner.cache.lookup(name)
    }

    pub fn state(&self, name: &PlotName) -> Option<FigureState> {
        self.inner.cache.state(name)
    }

    /// Mark every registered plot pending and submit its builder. Returns
    /// immediately; await the batch to observe completion.
    pub fn schedule_regeneration(&self) -> RegenerationBatch {
        let mut tasks = Vec::with_capacity(self.inner.registry.len());
        for name in self.inner.registry.names() {
            match self.submit(name) {
                Ok(handle) => tasks.push((name.clone(), handle)),
                Err(e) => warn!(plot = %name, "regeneration not scheduled: {e}"),
            }
        }
        info!(plots = tasks.len(), "regeneration scheduled");
        RegenerationBatch { tasks }
    }

    /// Start a new generation of `name` on its worker pool, superseding any
    /// generation still running.
    pub fn submit(&self, name: &PlotName) -> Result<JoinHandle<FigureState>> {
        if self.inner.tracker.is_closed() {
            return Err(CacheError::ShuttingDown);
        }
        let builder = self.builder(name)?;
        let generation = self.inner.cache.begin(name);
        Ok(self.spawn(name.clone(), generation, builder))
    }

    /// Resubmit every registered plot whose last generation has completed.
    /// Plots still being built are left alone and keep serving their
    /// previous figure.
    pub fn refresh(&self) -> RegenerationBatch {
        let mut tasks = Vec::new();
        if self.inner.tracker.is_closed() {
            return RegenerationBatch { tasks };
        }
        for (name, builder) in self.inner.registry.iter() {
            match self.inner.cache.begin_refresh(name) {
                Some(generation) => {
                    let handle = self.spawn(name.clone(), generation, Arc::clone(builder));
                    tasks.push((name.clone(), handle));
                }
                None => debug!(plot = %name, "still generating, refresh skipped"),
            }
        }
        info!(plots = tasks.len(), "figure refresh scheduled");
        RegenerationBatch { tasks }
    }

    /// Generation tasks submitted and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.inner.tracker.len()
    }

    fn spawn(
        &self,
        name: PlotName,
        generation: u64,
        builder: Arc<dyn PlotBuilder>,
    ) -> JoinHandle<FigureState> {
        let inner = Arc::clone(&self.inner);
        self.inner.tracker.spawn(async move {
            let pool = match builder.pool() {
                PoolKind::Shared => &inner.shared_pool,
                PoolKind::Exclusive => &inner.exclusive_pool,
            };
            // pools are never closed
            let _permit = pool.acquire().await.ok();
            produce(&inner.cache, name, generation, builder).await
        })
    }

    /// Regenerate `name` now, outside the worker pools, and wait for it.
    pub async fn regenerate(&self, name: &PlotName) -> Result<FigureState> {
        if self.inner.tracker.is_closed() {
            return Err(CacheError::ShuttingDown);
        }
        let builder = self.builder(name)?;
        let generation = self.inner.cache.begin(name);
        Ok(produce(&self.inner.cache, name.clone(), generation, builder).await)
    }

    /// Refresh every `every` until `shutdown` flips to `true`. The first
    /// round is left to the caller.
    pub async fn run(&self, every: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = every.as_secs_f64(), "figure refresh loop started");
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if self.inner.tracker.is_closed() {
                        break;
                    }
                    self.refresh();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("figure refresh loop stopped");
    }

    /// Refuse new work, wait for in-flight builders, then empty the cache.
    pub async fn shutdown(&self) {
        self.inner.tracker.close();
        info!(in_flight = self.inner.tracker.len(), "waiting for figure builders");
        self.inner.tracker.wait().await;
        self.inner.cache.clear();
        info!("figure cache cleared");
    }

    fn builder(&self, name: &PlotName) -> Result<Arc<dyn PlotBuilder>> {
        self.inner
            .registry
            .get(name)
            .cloned()
            .ok_or_else(|| CacheError::UnknownPlot { name: name.clone() })
    }
}

/// Run one builder on the blocking pool and record the outcome. Errors and
/// panics become `Failed`; nothing propagates to the caller.
async fn produce(
    cache: &FigureCache,
    name: PlotName,
    generation: u64,
    builder: Arc<dyn PlotBuilder>,
) -> FigureState {
    let started = Instant::now();
    let plot = name.clone();
    let outcome = tokio::task::spawn_blocking(move || builder.build(&plot)).await;

    let state = match outcome {
        Ok(Ok(figure)) => {
            info!(
                plot = %name,
                generation,
                figure_id = %figure.id(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "figure generated"
            );
            FigureState::Ready(Arc::new(figure))
        }
        Ok(Err(e)) => {
            error!(plot = %name, generation, "figure generation failed: {e}");
            FigureState::Failed(e.to_string())
        }
        Err(e) => {
            error!(plot = %name, generation, "figure builder panicked: {e}");
            FigureState::Failed(format!("builder panicked: {e}"))
        }
    };

    if !cache.complete(&name, generation, state.clone()) {
        warn!(plot = %name, generation, "stale figure discarded");
    }
    state
}
