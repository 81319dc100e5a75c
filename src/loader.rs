//! Module loader: resolves, fetches and activates modules into the slot.
//!
//! ```text
//! activate(id)
//!   │ catalog lookup ──────────────── unknown ──▶ Err(NotFound)   (nothing touched)
//!   │ generation += 1
//!   │ slot.teardown()
//!   │ show loading indicator
//!   ▼
//! fetch task (tokio) ── fetch ── wait out MIN_TRANSITION ──▶ completion channel
//!                                                               │
//! complete(completion) ◀── drained on the event loop ───────────┘
//!   │ stale generation ──▶ discard
//!   │ fetch error      ──▶ inline error, stay in viewport
//!   │ no entry point   ──▶ back to catalog
//!   ▼
//! init ─▶ slot.install ─▶ hide indicator ─▶ navigation.reflect
//! ```
//!
//! The fetch task owns nothing but the fetcher and a channel sender. Every
//! state change happens in [`ModuleLoader::activate`],
//! [`ModuleLoader::complete`] or [`ModuleLoader::return_home`], all called
//! from the event loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::catalog::ModuleCatalog;
use crate::error::{FetchError, LoadError};
use crate::module::{ModuleBundle, ModuleFetcher, MountPoint};
use crate::navigation::{HistoryBackend, NavigationSynchronizer};
use crate::slot::{ActiveModuleSlot, ModuleHandle};

/// Minimum time the loading indicator stays visible.
pub const MIN_TRANSITION: Duration = Duration::from_millis(1200);

/// Where an activation request came from.
///
/// Doubles as the history-write capability for the activation: history-driven
/// activations must not write history when they complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationSource {
    /// Catalog selection or another explicit user action.
    User,
    /// URL given at startup.
    DeepLink,
    /// Back/forward traversal.
    History,
}

/// How a completed activation is written to history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryWrite {
    Push,
    /// Deep links already own the current entry, so it is normalized in place.
    Replace,
}

impl ActivationSource {
    pub fn history_write(self) -> Option<HistoryWrite> {
        match self {
            ActivationSource::User => Some(HistoryWrite::Push),
            ActivationSource::DeepLink => Some(HistoryWrite::Replace),
            ActivationSource::History => None,
        }
    }
}

/// The loading indicator, keyed to the target's display metadata.
#[derive(Debug, Clone)]
pub struct LoadingIndicator {
    pub module_id: String,
    pub name: String,
    pub icon: String,
    pub shown_at: Instant,
}

/// What the viewport is showing.
#[derive(Debug, Clone)]
pub enum Viewport {
    Catalog,
    Loading(LoadingIndicator),
    Module { id: String },
    /// Inline failure message; the user stays in the module viewport.
    Error { id: String, message: String },
}

/// Result of a fetch, delivered back to the event loop.
#[derive(Debug)]
pub struct LoadCompletion {
    generation: u64,
    id: String,
    result: Result<ModuleBundle, FetchError>,
}

impl LoadCompletion {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// What [`ModuleLoader::complete`] did with a completion.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The module is live.
    Installed {
        handle: ModuleHandle,
        indicator_visible: Duration,
    },
    /// A newer activation or a return home superseded this load.
    Stale { id: String, generation: u64 },
    /// The bundle had no entry point; the catalog is showing.
    ContractViolation {
        id: String,
        indicator_visible: Duration,
    },
    /// Fetch or init failed; an inline error is showing.
    Failed {
        error: LoadError,
        indicator_visible: Duration,
    },
}

#[derive(Debug)]
struct PendingLoad {
    generation: u64,
    id: String,
    source: ActivationSource,
}

/// Orchestrates activation of modules into the [`ActiveModuleSlot`].
#[derive(Debug)]
pub struct ModuleLoader {
    catalog: Arc<ModuleCatalog>,
    fetcher: Arc<dyn ModuleFetcher>,
    runtime: Handle,
    slot: ActiveModuleSlot,
    generation: u64,
    min_transition: Duration,
    pending: Option<PendingLoad>,
    viewport: Viewport,
    completion_tx: mpsc::UnboundedSender<LoadCompletion>,
    completion_rx: mpsc::UnboundedReceiver<LoadCompletion>,
}

impl ModuleLoader {
    /// Create a loader that spawns fetches on `runtime`.
    pub fn new(catalog: Arc<ModuleCatalog>, fetcher: Arc<dyn ModuleFetcher>, runtime: Handle) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            catalog,
            fetcher,
            runtime,
            slot: ActiveModuleSlot::new(),
            generation: 0,
            min_transition: MIN_TRANSITION,
            pending: None,
            viewport: Viewport::Catalog,
            completion_tx,
            completion_rx,
        }
    }

    /// Override the minimum loading-indicator duration.
    pub fn with_min_transition(mut self, min_transition: Duration) -> Self {
        self.min_transition = min_transition;
        self
    }

    /// Start activating `id`. Returns the generation of this attempt.
    ///
    /// Unknown ids fail immediately, before any teardown. Otherwise the
    /// current module is torn down synchronously, the loading indicator is
    /// shown and the fetch is spawned; the result arrives later through
    /// [`Self::poll_completions`] or [`Self::next_completion`].
    pub fn activate(&mut self, id: &str, source: ActivationSource) -> Result<u64, LoadError> {
        let descriptor = self
            .catalog
            .by_id(id)
            .ok_or_else(|| LoadError::NotFound(id.to_string()))?;
        let indicator = LoadingIndicator {
            module_id: descriptor.id.clone(),
            name: descriptor.display_name.clone(),
            icon: descriptor.icon.clone(),
            shown_at: Instant::now(),
        };

        self.generation += 1;
        let generation = self.generation;
        self.slot.teardown();

        info!(module = %id, generation, ?source, "activating module");
        let started = indicator.shown_at;
        self.viewport = Viewport::Loading(indicator);
        self.pending = Some(PendingLoad {
            generation,
            id: id.to_string(),
            source,
        });

        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.completion_tx.clone();
        let deadline = started + self.min_transition;
        let id = id.to_string();
        self.runtime.spawn(async move {
            let result = fetcher.fetch(&id).await;
            // Same budget for success and failure so errors do not flash
            tokio::time::sleep_until(deadline).await;
            // Send only fails once the loader is gone
            let _ = tx.send(LoadCompletion {
                generation,
                id,
                result,
            });
        });

        Ok(generation)
    }

    /// Leave whatever is showing and return to the catalog.
    ///
    /// Supersedes any in-flight load. Does not touch history; user-initiated
    /// callers follow up with [`NavigationSynchronizer::reflect_home`].
    pub fn return_home(&mut self) {
        self.generation += 1;
        if let Some(pending) = self.pending.take() {
            debug!(module = %pending.id, generation = pending.generation, "abandoning in-flight load");
        }
        if self.slot.teardown() {
            info!("returned to catalog");
        }
        self.viewport = Viewport::Catalog;
    }

    /// Hand the in-flight load over to the history.
    ///
    /// Used when back/forward lands on the entry of the module already being
    /// loaded: the entry exists, so completing the load must not write one.
    pub fn adopt_pending_from_history(&mut self) {
        if let Some(pending) = self.pending.as_mut() {
            debug!(module = %pending.id, generation = pending.generation, "load adopted by history");
            pending.source = ActivationSource::History;
        }
    }

    /// Drain finished fetches without blocking and apply them.
    pub fn poll_completions<H: HistoryBackend>(
        &mut self,
        navigation: &mut NavigationSynchronizer<H>,
    ) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(completion) = self.completion_rx.try_recv() {
            outcomes.push(self.complete(completion, navigation));
        }
        outcomes
    }

    /// Wait for the next finished fetch.
    pub async fn next_completion(&mut self) -> Option<LoadCompletion> {
        self.completion_rx.recv().await
    }

    /// Apply a finished fetch.
    pub fn complete<H: HistoryBackend>(
        &mut self,
        completion: LoadCompletion,
        navigation: &mut NavigationSynchronizer<H>,
    ) -> LoadOutcome {
        let LoadCompletion {
            generation,
            id,
            result,
        } = completion;

        if generation != self.generation {
            debug!(module = %id, generation, current = self.generation, "discarding stale load");
            return LoadOutcome::Stale { id, generation };
        }
        let Some(pending) = self.pending.take() else {
            return LoadOutcome::Stale { id, generation };
        };
        let indicator_visible = self.indicator_elapsed();

        let bundle = match result {
            Ok(bundle) => bundle,
            Err(source) => {
                let error = LoadError::Fetch { id: id.clone(), source };
                warn!(module = %id, %error, "module fetch failed");
                self.viewport = Viewport::Error {
                    id,
                    message: error.to_string(),
                };
                return LoadOutcome::Failed {
                    error,
                    indicator_visible,
                };
            }
        };

        let Some(entry) = bundle.into_entry() else {
            warn!(module = %id, "{}", LoadError::ContractViolation(id.clone()));
            self.viewport = Viewport::Catalog;
            match pending.source.history_write() {
                Some(HistoryWrite::Push) => navigation.reflect_home(),
                Some(HistoryWrite::Replace) => navigation.replace_home(),
                None => {}
            }
            return LoadOutcome::ContractViolation {
                id,
                indicator_visible,
            };
        };

        let title = self
            .catalog
            .by_id(&id)
            .map(|d| d.display_name.clone())
            .unwrap_or_else(|| id.clone());
        let mut mount = MountPoint::new(id.as_str(), title);
        let mut instance = entry();
        if let Err(e) = instance.init(&mut mount) {
            if let Err(cleanup_err) = instance.cleanup() {
                warn!(module = %id, error = %cleanup_err, "cleanup after failed init also failed");
            }
            let error = LoadError::Init {
                id: id.clone(),
                reason: format!("{:#}", e),
            };
            warn!(module = %id, %error, "module init failed");
            self.viewport = Viewport::Error {
                id,
                message: error.to_string(),
            };
            return LoadOutcome::Failed {
                error,
                indicator_visible,
            };
        }

        let handle = match self.slot.install_mounted(mount, instance) {
            Ok(handle) => handle,
            Err(e) => {
                // activate() emptied the slot and only the current generation installs
                warn!(module = %id, error = %e, "install rejected");
                self.viewport = Viewport::Error {
                    id: id.clone(),
                    message: e.to_string(),
                };
                return LoadOutcome::Failed {
                    error: LoadError::Init {
                        id,
                        reason: e.to_string(),
                    },
                    indicator_visible,
                };
            }
        };

        self.viewport = Viewport::Module { id: id.clone() };
        match pending.source.history_write() {
            Some(HistoryWrite::Push) => navigation.reflect(&id),
            Some(HistoryWrite::Replace) => navigation.replace(&id),
            None => {}
        }
        info!(module = %id, generation, visible_ms = indicator_visible.as_millis() as u64, "module active");

        LoadOutcome::Installed {
            handle,
            indicator_visible,
        }
    }

    fn indicator_elapsed(&self) -> Duration {
        match &self.viewport {
            Viewport::Loading(indicator) => indicator.shown_at.elapsed(),
            _ => Duration::ZERO,
        }
    }

    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn slot(&self) -> &ActiveModuleSlot {
        &self.slot
    }

    pub fn slot_mut(&mut self) -> &mut ActiveModuleSlot {
        &mut self.slot
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn min_transition(&self) -> Duration {
        self.min_transition
    }

    /// Id of the live module.
    pub fn current_id(&self) -> Option<&str> {
        self.slot.current_id()
    }

    /// Id of the module currently being loaded.
    pub fn pending_target(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.id.as_str())
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.viewport, Viewport::Loading(_))
    }

    /// True when the catalog is showing with nothing live or loading.
    pub fn is_home(&self) -> bool {
        matches!(self.viewport, Viewport::Catalog) && self.slot.is_empty() && self.pending.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use url::Url;

    use crate::catalog::ModuleDescriptor;
    use crate::module::{Module, ModuleRegistry};
    use crate::navigation::{HistoryEntry, PopStateAction, SessionHistory, DEFAULT_BASE_URL};

    type Log = Arc<Mutex<Vec<String>>>;

    struct Probe {
        name: String,
        log: Log,
        fail_init: bool,
        fail_cleanup: bool,
    }

    impl Module for Probe {
        fn init(&mut self, mount: &mut MountPoint) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("init {}", self.name));
            if self.fail_init {
                anyhow::bail!("no display for {}", mount.title());
            }
            Ok(())
        }

        fn cleanup(&mut self) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("cleanup {}", self.name));
            if self.fail_cleanup {
                anyhow::bail!("cleanup exploded");
            }
            Ok(())
        }
    }

    fn register_probe(registry: &mut ModuleRegistry, id: &'static str, log: &Log, fail_init: bool, fail_cleanup: bool) {
        let log = log.clone();
        registry.register(id, move || {
            Box::new(Probe {
                name: id.to_string(),
                log: log.clone(),
                fail_init,
                fail_cleanup,
            })
        });
    }

    struct Harness {
        loader: ModuleLoader,
        nav: NavigationSynchronizer<SessionHistory>,
        log: Log,
    }

    impl Harness {
        /// Catalog: a, b (no entry point), c (fetch fails), d (init fails),
        /// e (cleanup fails), slow (2s fetch), y (disabled).
        fn new() -> Self {
            let catalog = ModuleCatalog::new(vec![
                ModuleDescriptor::new("a", "Alpha").with_icon("α"),
                ModuleDescriptor::new("b", "Bravo"),
                ModuleDescriptor::new("c", "Charlie"),
                ModuleDescriptor::new("d", "Delta"),
                ModuleDescriptor::new("e", "Echo"),
                ModuleDescriptor::new("slow", "Slow"),
                ModuleDescriptor::new("y", "Yankee").disabled(),
            ])
            .unwrap();

            let log = Log::default();
            let mut registry = ModuleRegistry::new();
            register_probe(&mut registry, "a", &log, false, false);
            registry.register_without_entry("b");
            registry.register_unavailable("c", "connection reset");
            register_probe(&mut registry, "d", &log, true, false);
            register_probe(&mut registry, "e", &log, false, true);
            register_probe(&mut registry, "slow", &log, false, false);
            register_probe(&mut registry, "y", &log, false, false);
            registry.set_latency("slow", Duration::from_millis(2000));

            let loader = ModuleLoader::new(Arc::new(catalog), Arc::new(registry), Handle::current());
            let nav = NavigationSynchronizer::new(SessionHistory::new(Url::parse(DEFAULT_BASE_URL).unwrap()));
            Self { loader, nav, log }
        }

        async fn settle(&mut self) -> LoadOutcome {
            let completion = self.loader.next_completion().await.unwrap();
            self.loader.complete(completion, &mut self.nav)
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_activation() {
        let mut h = Harness::new();
        let generation = h.loader.activate("a", ActivationSource::User).unwrap();
        assert_eq!(generation, 1);
        assert!(h.loader.is_loading());
        assert_eq!(h.loader.pending_target(), Some("a"));

        match h.settle().await {
            LoadOutcome::Installed {
                handle,
                indicator_visible,
            } => {
                assert_eq!(handle.id(), "a");
                assert!(indicator_visible >= MIN_TRANSITION);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(h.loader.current_id(), Some("a"));
        assert!(matches!(h.loader.viewport(), Viewport::Module { id } if id == "a"));
        assert_eq!(h.nav.current_module(), Some("a".to_string()));
        assert_eq!(h.nav.history().len(), 2);
        assert_eq!(h.log(), vec!["init a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_indicator_waits_for_minimum_on_fast_load() {
        let mut h = Harness::new();
        let start = Instant::now();
        h.loader.activate("a", ActivationSource::User).unwrap();

        // Still loading just before the minimum elapses
        tokio::time::advance(Duration::from_millis(1100)).await;
        assert!(h.loader.poll_completions(&mut h.nav).is_empty());
        assert!(h.loader.is_loading());

        h.settle().await;
        assert!(start.elapsed() >= MIN_TRANSITION);
        assert!(start.elapsed() < Duration::from_millis(1300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_load_hides_indicator_when_fetch_resolves() {
        let mut h = Harness::new();
        h.loader.activate("slow", ActivationSource::User).unwrap();

        match h.settle().await {
            LoadOutcome::Installed { indicator_visible, .. } => {
                assert!(indicator_visible >= Duration::from_millis(2000));
                assert!(indicator_visible < Duration::from_millis(2100));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_load_is_discarded() {
        let mut h = Harness::new();
        h.loader.activate("slow", ActivationSource::User).unwrap();
        h.loader.activate("a", ActivationSource::User).unwrap();

        // "a" finishes first (1.2s), "slow" later (2s)
        assert!(matches!(h.settle().await, LoadOutcome::Installed { ref handle, .. } if handle.id() == "a"));
        assert!(matches!(h.settle().await, LoadOutcome::Stale { ref id, generation: 1 } if id == "slow"));

        assert_eq!(h.loader.current_id(), Some("a"));
        assert!(matches!(h.loader.viewport(), Viewport::Module { id } if id == "a"));
        assert_eq!(h.log(), vec!["init a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_load_discarded_even_if_it_finishes_first() {
        let mut h = Harness::new();
        h.loader.activate("a", ActivationSource::User).unwrap();
        tokio::time::advance(Duration::from_millis(500)).await;
        h.loader.activate("slow", ActivationSource::User).unwrap();

        assert!(matches!(h.settle().await, LoadOutcome::Stale { ref id, .. } if id == "a"));
        // The newer load's indicator is untouched by the stale result
        assert!(h.loader.is_loading());
        assert!(matches!(h.settle().await, LoadOutcome::Installed { ref handle, .. } if handle.id() == "slow"));
        assert_eq!(h.log(), vec!["init slow"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_instance_across_activations() {
        let mut h = Harness::new();
        for id in ["a", "slow", "a"] {
            h.loader.activate(id, ActivationSource::User).unwrap();
            h.settle().await;
        }
        assert_eq!(
            h.log(),
            vec!["init a", "cleanup a", "init slow", "cleanup slow", "init a"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_id_fails_without_side_effects() {
        let mut h = Harness::new();
        h.loader.activate("a", ActivationSource::User).unwrap();
        h.settle().await;

        let err = h.loader.activate("missing", ActivationSource::User).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(ref id) if id == "missing"));
        assert_eq!(h.loader.generation(), 1);
        assert_eq!(h.loader.current_id(), Some("a"));
        assert!(!h.loader.is_loading());
        assert_eq!(h.log(), vec!["init a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_module_is_addressable() {
        let mut h = Harness::new();
        h.loader.activate("y", ActivationSource::DeepLink).unwrap();
        assert!(matches!(h.settle().await, LoadOutcome::Installed { .. }));
        assert_eq!(h.loader.current_id(), Some("y"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_entry_point_returns_to_catalog() {
        let mut h = Harness::new();
        h.loader.activate("a", ActivationSource::User).unwrap();
        h.settle().await;
        h.loader.activate("b", ActivationSource::User).unwrap();

        match h.settle().await {
            LoadOutcome::ContractViolation { id, indicator_visible } => {
                assert_eq!(id, "b");
                assert!(indicator_visible >= MIN_TRANSITION);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(h.loader.slot().is_empty());
        assert!(h.loader.is_home());
        assert_eq!(h.nav.current_module(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_shows_inline_error() {
        let mut h = Harness::new();
        h.loader.activate("c", ActivationSource::User).unwrap();

        match h.settle().await {
            LoadOutcome::Failed { error, indicator_visible } => {
                assert!(matches!(error, LoadError::Fetch { ref id, .. } if id == "c"));
                assert!(indicator_visible >= MIN_TRANSITION);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        match h.loader.viewport() {
            Viewport::Error { id, message } => {
                assert_eq!(id, "c");
                assert!(message.contains("connection reset"));
            }
            other => panic!("unexpected viewport: {:?}", other),
        }
        // No history entry for a failed load
        assert_eq!(h.nav.history().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_failure_cleans_up_and_reports() {
        let mut h = Harness::new();
        h.loader.activate("d", ActivationSource::User).unwrap();

        assert!(matches!(
            h.settle().await,
            LoadOutcome::Failed { error: LoadError::Init { .. }, .. }
        ));
        assert!(h.loader.slot().is_empty());
        assert_eq!(h.log(), vec!["init d", "cleanup d"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_cleanup_does_not_block_next_module() {
        let mut h = Harness::new();
        h.loader.activate("e", ActivationSource::User).unwrap();
        h.settle().await;
        h.loader.activate("a", ActivationSource::User).unwrap();

        assert!(matches!(h.settle().await, LoadOutcome::Installed { .. }));
        assert_eq!(h.log(), vec!["init e", "cleanup e", "init a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_return_home_discards_in_flight_load() {
        let mut h = Harness::new();
        h.loader.activate("a", ActivationSource::User).unwrap();
        h.loader.return_home();
        h.nav.reflect_home();

        assert!(matches!(h.settle().await, LoadOutcome::Stale { .. }));
        assert!(h.loader.is_home());
        assert_eq!(h.nav.current_module(), None);
        assert!(h.log().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deep_link_replaces_current_entry() {
        let mut h = Harness::new();
        h.loader.activate("a", ActivationSource::DeepLink).unwrap();
        h.settle().await;

        assert_eq!(h.nav.history().len(), 1);
        assert_eq!(h.nav.current_module(), Some("a".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_and_forward_never_write_history() {
        let mut h = Harness::new();
        h.loader.activate("a", ActivationSource::User).unwrap();
        h.settle().await;
        h.loader.activate("slow", ActivationSource::User).unwrap();
        h.settle().await;
        assert_eq!(h.nav.history().len(), 3);

        // Back to "a"
        let entry = h.nav.history_mut().back().unwrap();
        let action = h.nav.on_pop_state(&entry, &mut h.loader).unwrap();
        assert!(matches!(action, PopStateAction::Activating { ref id, .. } if id == "a"));
        h.settle().await;
        assert_eq!(h.loader.current_id(), Some("a"));
        assert_eq!(h.nav.history().len(), 3);
        assert_eq!(h.nav.history().position(), 1);

        // Back to the catalog entry
        let entry = h.nav.history_mut().back().unwrap();
        assert_eq!(h.nav.on_pop_state(&entry, &mut h.loader).unwrap(), PopStateAction::ReturnedHome);
        assert!(h.loader.is_home());

        // Forward again
        let entry = h.nav.history_mut().forward().unwrap();
        h.nav.on_pop_state(&entry, &mut h.loader).unwrap();
        h.settle().await;
        assert_eq!(h.loader.current_id(), Some("a"));
        assert_eq!(h.nav.history().len(), 3);
        assert_eq!(h.log(), vec!["init a", "cleanup a", "init slow", "cleanup slow", "init a", "cleanup a", "init a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deep_link_without_entry_point_replaces_with_home() {
        let mut h = Harness::new();
        h.nav = NavigationSynchronizer::new(SessionHistory::new(
            Url::parse("playdeck://local/?module=b").unwrap(),
        ));
        let target = h.nav.deep_link_target().unwrap();
        h.loader.activate(&target, ActivationSource::DeepLink).unwrap();

        assert!(matches!(h.settle().await, LoadOutcome::ContractViolation { .. }));
        assert!(h.loader.is_home());
        assert_eq!(h.nav.history().len(), 1);
        assert_eq!(h.nav.current_module(), None);
        assert_eq!(h.nav.current_url().as_str(), DEFAULT_BASE_URL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pop_state_onto_pending_module_keeps_forward_entries() {
        let mut h = Harness::new();
        h.loader.activate("a", ActivationSource::User).unwrap();
        h.settle().await;
        h.loader.return_home();
        h.nav.reflect_home();
        assert_eq!(h.nav.history().len(), 3);

        // Reopen "a", then step back onto its entry while the fetch runs
        h.loader.activate("a", ActivationSource::User).unwrap();
        let entry = h.nav.history_mut().back().unwrap();
        assert_eq!(h.nav.on_pop_state(&entry, &mut h.loader).unwrap(), PopStateAction::Unchanged);
        assert_eq!(h.loader.pending_target(), Some("a"));

        assert!(matches!(h.settle().await, LoadOutcome::Installed { .. }));
        assert_eq!(h.loader.current_id(), Some("a"));
        assert_eq!(h.nav.history().len(), 3);
        assert_eq!(h.nav.history().position(), 1);
        assert!(h.nav.history().can_go_forward());
        assert_eq!(h.nav.current_module(), Some("a".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pop_state_to_active_module_is_unchanged() {
        let mut h = Harness::new();
        h.loader.activate("a", ActivationSource::User).unwrap();
        h.settle().await;

        let entry = h.nav.history().current().clone();
        assert_eq!(h.nav.on_pop_state(&entry, &mut h.loader).unwrap(), PopStateAction::Unchanged);
        assert_eq!(h.log(), vec!["init a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pop_state_unknown_id_returns_home() {
        let mut h = Harness::new();
        h.loader.activate("a", ActivationSource::User).unwrap();
        h.settle().await;

        let entry = HistoryEntry::new(None, Url::parse("playdeck://local/?module=ghost").unwrap());
        let err = h.nav.on_pop_state(&entry, &mut h.loader).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
        assert!(h.loader.is_home());
    }
}
