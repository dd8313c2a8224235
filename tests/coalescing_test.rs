mod common;

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use common::{Fixture, write_level};
use songdex::registry::{Characteristic, EnvironmentInfo};
use songdex::{LevelLookups, LoaderEvent, RefreshPhase, Registries, SongLoader};

/// Lookups that hold every loader worker until the gate opens.
struct GatedLookups {
    inner: Registries,
    open: Mutex<bool>,
    opened: Condvar,
}

impl GatedLookups {
    fn new() -> Self {
        Self {
            inner: Registries::new(),
            open: Mutex::new(false),
            opened: Condvar::new(),
        }
    }

    fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }
}

impl LevelLookups for GatedLookups {
    fn environment(&self, serialized_name: &str) -> Option<EnvironmentInfo> {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.opened.wait(open).unwrap();
        }
        self.inner.environment(serialized_name)
    }

    fn default_environment(&self, all_directions: bool) -> EnvironmentInfo {
        self.inner.default_environment(all_directions)
    }

    fn characteristic(&self, serialized_name: &str) -> Option<Characteristic> {
        self.inner.characteristic(serialized_name)
    }
}

fn wait_for_phase(loader: &SongLoader, phase: RefreshPhase) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while loader.refresh_phase() != phase {
        assert!(Instant::now() < deadline, "refresh never reached {phase}");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_concurrent_requests_share_one_refresh() {
    let fixture = Fixture::new();
    write_level(&fixture.stable, "A", "A");
    write_level(&fixture.wip, "B", "B");

    let lookups = Arc::new(GatedLookups::new());
    let loader = SongLoader::with_lookups(fixture.store(2), lookups.clone());
    let mut events = loader.subscribe();

    let first = loader.refresh_songs(false);
    wait_for_phase(&loader, RefreshPhase::WorkersRunning);
    assert!(loader.are_songs_refreshing());
    assert!(!loader.are_songs_loaded());

    // Requests while in flight join the running refresh, full or not
    let second = loader.refresh_songs(true);
    let third = std::thread::scope(|scope| {
        scope
            .spawn(|| loader.refresh_songs(false))
            .join()
            .unwrap()
    });
    assert!(first.same_refresh(&second));
    assert!(first.same_refresh(&third));
    assert!(!second.is_full());
    assert!(first.wait_timeout(Duration::from_millis(20)).is_none());
    assert!(loader.current_refresh().unwrap().same_refresh(&first));

    lookups.open();
    let a = first.wait().unwrap();
    let b = second.wait().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.loaded, 2);

    let mut scans = 0;
    loop {
        match events.blocking_recv().unwrap() {
            LoaderEvent::SongsWillRefresh => scans += 1,
            LoaderEvent::SongsLoaded { .. } => break,
            _ => {}
        }
    }
    assert_eq!(scans, 1);
    assert!(events.try_recv().is_err());
    assert!(loader.current_refresh().is_none());

    // After settling, a new request starts a new refresh
    let next = loader.refresh_songs(false);
    assert!(!next.same_refresh(&first));
    assert_eq!(next.generation(), first.generation() + 1);
    next.wait().unwrap();
}

#[test]
fn test_progress_reported_while_loading() {
    let fixture = Fixture::new();
    let dir = write_level(&fixture.stable, "A", "A");

    let lookups = Arc::new(GatedLookups::new());
    let loader = SongLoader::with_lookups(fixture.store(1), lookups.clone());

    let handle = loader.refresh_songs(false);
    wait_for_phase(&loader, RefreshPhase::WorkersRunning);
    assert!(loader.get_level_by_path(&dir).is_none());
    assert!(loader.load_progress() < 1.0);

    lookups.open();
    handle.wait().unwrap();
    assert!(loader.get_level_by_path(&dir).is_some());
    assert_eq!(loader.load_progress(), 1.0);
}
