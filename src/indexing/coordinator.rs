//! Refresh coordination
//!
//! A refresh runs on its own coordination thread:
//!
//! ```text
//! SCAN → DISPATCH → WORKERS (N) → PRUNE → COMPOSE
//!  │        │           │            │        │
//!  ▼        ▼           ▼            ▼        ▼
//! [paths] [queue]  index.insert  index.retain  packs
//! ```
//!
//! Requests made while a refresh is in flight coalesce onto the running one:
//! every caller receives a clone of the same [`RefreshHandle`], and the roots
//! are scanned once. Waiting on a handle is optional; the refresh makes
//! progress whether or not anybody observes it.

use std::collections::{BTreeSet, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, unbounded};
use parking_lot::{Condvar, Mutex};
use tokio::sync::Notify;

use crate::error::RefreshError;
use crate::indexing::context::LoaderContext;
use crate::indexing::loader::MetadataLoader;
use crate::indexing::progress::RefreshPhase;
use crate::indexing::walker::PathCollector;
use crate::level::{CandidatePath, LoadedEntry};
use crate::notifications::LoaderEvent;

/// What a settled refresh did.
#[derive(Debug, Clone)]
pub struct RefreshSummary {
    pub generation: u64,
    pub full: bool,
    /// Candidates found across all roots
    pub discovered: usize,
    /// Candidates handed to the workers
    pub dispatched: usize,
    /// Candidates loaded into the index
    pub loaded: usize,
    /// Candidates that failed to load, in path order
    pub failed: Vec<PathBuf>,
    /// Entries pruned from the index
    pub removed: usize,
    pub duration: Duration,
    /// Every level in the index once the refresh settled
    pub levels: Arc<[Arc<LoadedEntry>]>,
}

pub type RefreshResult = Result<Arc<RefreshSummary>, RefreshError>;

#[derive(Debug)]
struct Completion {
    generation: u64,
    full: bool,
    outcome: Mutex<Option<RefreshResult>>,
    settled: Condvar,
    notify: Notify,
}

/// Shared handle to one logical refresh.
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    inner: Arc<Completion>,
}

impl RefreshHandle {
    fn new(generation: u64, full: bool) -> Self {
        Self {
            inner: Arc::new(Completion {
                generation,
                full,
                outcome: Mutex::new(None),
                settled: Condvar::new(),
                notify: Notify::new(),
            }),
        }
    }

    fn complete(&self, result: RefreshResult) {
        *self.inner.outcome.lock() = Some(result);
        self.inner.settled.notify_all();
        self.inner.notify.notify_waiters();
    }

    /// Monotonic refresh number, starting at 1.
    pub fn generation(&self) -> u64 {
        self.inner.generation
    }

    /// Whether the refresh reloads every candidate.
    pub fn is_full(&self) -> bool {
        self.inner.full
    }

    pub fn is_finished(&self) -> bool {
        self.inner.outcome.lock().is_some()
    }

    /// Whether both handles observe the same refresh.
    pub fn same_refresh(&self, other: &RefreshHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Block until the refresh settles.
    pub fn wait(&self) -> RefreshResult {
        let mut outcome = self.inner.outcome.lock();
        loop {
            if let Some(result) = outcome.as_ref() {
                return result.clone();
            }
            self.inner.settled.wait(&mut outcome);
        }
    }

    /// Block for at most `timeout`. `None` if the refresh is still running.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<RefreshResult> {
        let deadline = Instant::now() + timeout;
        let mut outcome = self.inner.outcome.lock();
        loop {
            if let Some(result) = outcome.as_ref() {
                return Some(result.clone());
            }
            if self
                .inner
                .settled
                .wait_until(&mut outcome, deadline)
                .timed_out()
            {
                return outcome.clone();
            }
        }
    }

    /// Wait asynchronously until the refresh settles.
    pub async fn finished(&self) -> RefreshResult {
        loop {
            // Register before checking so a completion in between is not missed
            let notified = self.inner.notify.notified();
            if let Some(result) = self.inner.outcome.lock().clone() {
                return result;
            }
            notified.await;
        }
    }
}

/// Starts refreshes and coalesces concurrent requests.
#[derive(Debug)]
pub struct RefreshCoordinator {
    ctx: Arc<LoaderContext>,
    in_flight: Arc<Mutex<Option<RefreshHandle>>>,
    generation: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(ctx: Arc<LoaderContext>) -> Self {
        Self {
            ctx,
            in_flight: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    /// Start a refresh, or join the one already in flight.
    ///
    /// A full refresh reloads every discovered level; an incremental one only
    /// loads levels whose directory is not indexed yet. Both prune entries
    /// whose directory disappeared.
    pub fn refresh(&self, full: bool) -> RefreshHandle {
        let mut slot = self.in_flight.lock();
        if let Some(handle) = slot.as_ref() {
            crate::debug_event!(
                "refresh",
                "coalesced",
                "joining refresh #{} (requested full={full})",
                handle.generation()
            );
            return handle.clone();
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let handle = RefreshHandle::new(generation, full);
        *slot = Some(handle.clone());
        self.ctx.progress.set_phase(RefreshPhase::Scanning);

        let ctx = Arc::clone(&self.ctx);
        let in_flight = Arc::clone(&self.in_flight);
        let thread_handle = handle.clone();
        let spawned = thread::Builder::new()
            .name(format!("songdex-refresh-{generation}"))
            .spawn(move || run_refresh(&ctx, &in_flight, &thread_handle));

        if let Err(e) = spawned {
            tracing::error!("[refresh] failed to spawn coordination thread: {e}");
            *slot = None;
            self.ctx.progress.set_phase(RefreshPhase::Idle);
            handle.complete(Err(RefreshError::CoordinatorSpawn {
                reason: e.to_string(),
            }));
        }

        handle
    }

    /// Handle of the refresh in flight, if any.
    pub fn current(&self) -> Option<RefreshHandle> {
        self.in_flight.lock().clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    pub fn context(&self) -> &Arc<LoaderContext> {
        &self.ctx
    }
}

fn run_refresh(
    ctx: &LoaderContext,
    in_flight: &Mutex<Option<RefreshHandle>>,
    handle: &RefreshHandle,
) {
    let result = {
        let _guard = ctx.lock_control();
        execute(ctx, handle.generation(), handle.is_full())
    };

    match &result {
        Ok(summary) => {
            ctx.progress.mark_loaded();
            crate::log_event!(
                "refresh",
                "complete",
                "#{} {} loaded, {} failed, {} removed, {} total in {:.2?}",
                summary.generation,
                summary.loaded,
                summary.failed.len(),
                summary.removed,
                summary.levels.len(),
                summary.duration
            );
        }
        Err(e) => tracing::error!("[refresh] #{} failed: {e}", handle.generation()),
    }

    {
        // Under the slot lock so a new refresh cannot set its phase in between
        let mut slot = in_flight.lock();
        ctx.progress.set_phase(RefreshPhase::Idle);
        *slot = None;
    }
    handle.complete(result.clone());

    if let Ok(summary) = result {
        ctx.events.send(LoaderEvent::SongsLoaded {
            levels: Arc::clone(&summary.levels),
        });
    }
}

fn execute(ctx: &LoaderContext, generation: u64, full: bool) -> Result<Arc<RefreshSummary>, RefreshError> {
    let started = Instant::now();
    ctx.events.send(LoaderEvent::SongsWillRefresh);
    ctx.progress.set_phase(RefreshPhase::Scanning);
    ctx.progress.begin_batch(0);

    // SCAN: stable roots first so their tag wins for shared paths
    let (stable_roots, wip_roots) = ctx.settings.roots();
    let indexing = ctx.settings.indexing();
    let collector = PathCollector::new(&indexing);

    let mut candidates = BTreeSet::new();
    let mut report = collector.collect_into(&stable_roots, false, &mut candidates);
    report.merge(collector.collect_into(&wip_roots, true, &mut candidates));

    let configured = stable_roots.len() + wip_roots.len();
    if configured > 0 && report.scanned_roots == 0 {
        return Err(RefreshError::NoAccessibleRoots {
            roots: report.unreadable_roots,
        });
    }
    crate::debug_event!(
        "refresh",
        "scanned",
        "{} roots, {} candidates, {} duplicates",
        report.scanned_roots,
        candidates.len(),
        report.duplicates
    );

    // DISPATCH
    ctx.progress.set_phase(RefreshPhase::Dispatching);
    let pending: Vec<CandidatePath> = candidates
        .iter()
        .filter(|candidate| full || !ctx.index.contains_path(&candidate.path))
        .cloned()
        .collect();
    let dispatched = pending.len();

    let loader = MetadataLoader::new(Arc::clone(&ctx.lookups), &indexing);
    let batch = run_workers(ctx, &loader, pending, indexing.parallel_threads);

    // PRUNE: failed or vanished levels must not stay visible
    ctx.progress.set_phase(RefreshPhase::Composing);
    let discovered: HashSet<&Path> = candidates.iter().map(|c| c.path.as_path()).collect();
    let failed: HashSet<&Path> = batch.failed.iter().map(PathBuf::as_path).collect();
    let removed = ctx.index.retain(|entry| {
        let path = entry.path.as_path();
        discovered.contains(path) && !failed.contains(path)
    });
    for entry in &removed {
        crate::debug_event!("refresh", "pruned", "{}", entry.path.display());
    }

    // COMPOSE
    ctx.rebuild_packs_locked();

    Ok(Arc::new(RefreshSummary {
        generation,
        full,
        discovered: candidates.len(),
        dispatched,
        loaded: batch.loaded,
        failed: batch.failed,
        removed: removed.len(),
        duration: started.elapsed(),
        levels: ctx.index.snapshot().into(),
    }))
}

#[derive(Debug, Default)]
struct BatchOutcome {
    loaded: usize,
    failed: Vec<PathBuf>,
}

fn run_workers(
    ctx: &LoaderContext,
    loader: &MetadataLoader,
    pending: Vec<CandidatePath>,
    threads: usize,
) -> BatchOutcome {
    ctx.progress.begin_batch(pending.len());
    ctx.progress.set_phase(RefreshPhase::WorkersRunning);
    if pending.is_empty() {
        return BatchOutcome::default();
    }

    let workers = threads.min(pending.len()).max(1);
    let (work_tx, work_rx) = unbounded();
    for candidate in pending {
        // Receiver is alive, so an unbounded send cannot fail
        let _ = work_tx.send(candidate);
    }
    drop(work_tx);

    let loaded = AtomicUsize::new(0);
    let failed = Mutex::new(Vec::new());

    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .filter_map(|worker_id| {
                let rx = work_rx.clone();
                let (loaded, failed) = (&loaded, &failed);
                thread::Builder::new()
                    .name(format!("songdex-loader-{worker_id}"))
                    .spawn_scoped(scope, move || worker_loop(ctx, loader, rx, loaded, failed))
                    .map_err(|e| tracing::warn!("[refresh] failed to spawn loader {worker_id}: {e}"))
                    .ok()
            })
            .collect();

        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("[refresh] loader thread panicked, continuing batch");
            }
        }
    });

    // Anything left when no worker could be spawned is loaded inline
    worker_loop(ctx, loader, work_rx, &loaded, &failed);

    let mut failed = failed.into_inner();
    failed.sort();
    BatchOutcome {
        loaded: loaded.into_inner(),
        failed,
    }
}

fn worker_loop(
    ctx: &LoaderContext,
    loader: &MetadataLoader,
    rx: Receiver<CandidatePath>,
    loaded: &AtomicUsize,
    failed: &Mutex<Vec<PathBuf>>,
) {
    while let Ok(candidate) = rx.try_recv() {
        match panic::catch_unwind(AssertUnwindSafe(|| loader.load(&candidate))) {
            Ok(Ok(entry)) => {
                let stored = ctx.index.insert(entry);
                crate::debug_event!("refresh", "loaded", "{} -> {}", stored.path.display(), stored.id);
                loaded.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                tracing::warn!("[refresh] skipping level: {e}");
                failed.lock().push(candidate.path);
            }
            Err(_) => {
                tracing::error!(
                    "[refresh] loading {} panicked, skipping",
                    candidate.path.display()
                );
                failed.lock().push(candidate.path);
            }
        }
        ctx.progress.record_done();
    }
}
