//! In-process registry of module factories.
//!
//! Maps module ids to factories and serves them through [`ModuleFetcher`].
//! An optional latency, global or per id, stands in for the transport delay
//! of a real bundle fetch.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{Module, ModuleBundle, ModuleFetcher};
use crate::error::FetchError;

/// Shared constructor for a module.
pub type Factory = Arc<dyn Fn() -> Box<dyn Module> + Send + Sync>;

#[derive(Clone)]
enum Registration {
    Factory(Factory),
    /// Resolves, but without an entry point.
    MissingEntry,
    /// Fails with a transport error carrying this reason.
    Unavailable(String),
}

/// A [`ModuleFetcher`] backed by registered factories.
///
/// # Example
///
/// ```
/// use playdeck::module::{ModuleFetcher, ModuleRegistry};
///
/// # tokio_test::block_on(async {
/// let registry = ModuleRegistry::builtin();
/// let bundle = registry.fetch("counter").await.unwrap();
/// assert!(bundle.has_entry());
/// # });
/// ```
#[derive(Default)]
pub struct ModuleRegistry {
    entries: HashMap<String, Registration>,
    latency: Duration,
    latencies: HashMap<String, Duration>,
}

impl ModuleRegistry {
    /// Create an empty registry with no latency.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry serving the modules bundled with the binary.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        crate::apps::register_all(&mut registry);
        registry
    }

    /// Register a factory under `id`, replacing any earlier registration.
    pub fn register<F>(&mut self, id: &str, factory: F)
    where
        F: Fn() -> Box<dyn Module> + Send + Sync + 'static,
    {
        self.entries
            .insert(id.to_string(), Registration::Factory(Arc::new(factory)));
    }

    /// Register `id` as resolving to a bundle with no entry point.
    pub fn register_without_entry(&mut self, id: &str) {
        self.entries.insert(id.to_string(), Registration::MissingEntry);
    }

    /// Register `id` as failing to fetch with the given reason.
    pub fn register_unavailable(&mut self, id: &str, reason: &str) {
        self.entries
            .insert(id.to_string(), Registration::Unavailable(reason.to_string()));
    }

    /// Delay applied to every fetch without a per-id latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Delay applied to fetches of `id` only.
    pub fn set_latency(&mut self, id: &str, latency: Duration) {
        self.latencies.insert(id.to_string(), latency);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    fn latency_for(&self, id: &str) -> Duration {
        self.latencies.get(id).copied().unwrap_or(self.latency)
    }
}

#[async_trait]
impl ModuleFetcher for ModuleRegistry {
    async fn fetch(&self, id: &str) -> Result<ModuleBundle, FetchError> {
        let latency = self.latency_for(id);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match self.entries.get(id) {
            Some(Registration::Factory(factory)) => {
                let factory = Arc::clone(factory);
                Ok(ModuleBundle::new(id, move || factory()))
            }
            Some(Registration::MissingEntry) => Ok(ModuleBundle::without_entry(id)),
            Some(Registration::Unavailable(reason)) => Err(FetchError::Transport(reason.clone())),
            None => Err(FetchError::Unavailable(id.to_string())),
        }
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.entries.keys().collect();
        ids.sort();
        f.debug_struct("ModuleRegistry")
            .field("ids", &ids)
            .field("latency", &self.latency)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::MountPoint;

    struct Blank;

    impl Module for Blank {
        fn init(&mut self, _mount: &mut MountPoint) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn registry() -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        registry.register("blank", || Box::new(Blank));
        registry.register_without_entry("hollow");
        registry.register_unavailable("offline", "connection reset");
        registry
    }

    #[tokio::test]
    async fn test_fetch_registered_factory() {
        let bundle = registry().fetch("blank").await.unwrap();
        assert_eq!(bundle.id(), "blank");

        let mut module = (bundle.into_entry().unwrap())();
        assert!(module.init(&mut MountPoint::new("blank", "Blank")).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_without_entry() {
        let bundle = registry().fetch("hollow").await.unwrap();
        assert!(!bundle.has_entry());
    }

    #[tokio::test]
    async fn test_fetch_unavailable_and_unknown() {
        let registry = registry();
        assert_eq!(
            registry.fetch("offline").await.unwrap_err(),
            FetchError::Transport("connection reset".to_string())
        );
        assert_eq!(
            registry.fetch("nope").await.unwrap_err(),
            FetchError::Unavailable("nope".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_id_latency_overrides_default() {
        let mut registry = registry().with_latency(Duration::from_millis(100));
        registry.set_latency("blank", Duration::from_millis(700));

        let start = tokio::time::Instant::now();
        registry.fetch("hollow").await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(100) && elapsed < Duration::from_millis(700));

        let start = tokio::time::Instant::now();
        registry.fetch("blank").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(700));
    }

    #[test]
    fn test_builtin_registry_covers_builtin_catalog() {
        let registry = ModuleRegistry::builtin();
        for descriptor in crate::catalog::ModuleCatalog::builtin().all() {
            assert!(registry.contains(&descriptor.id), "{} not registered", descriptor.id);
        }
    }
}
