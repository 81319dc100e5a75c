//! The module contract and how module bundles are resolved.
//!
//! A module is an opaque unit the shell knows only through [`Module`]. Its
//! implementation is obtained asynchronously by id through a
//! [`ModuleFetcher`], which yields a [`ModuleBundle`]. The bundle's entry
//! point constructs the instance; [`Module::init`] then sets it up inside a
//! [`MountPoint`].

mod bundle;
mod registry;

pub use bundle::{EntryPoint, ModuleBundle};
pub use registry::ModuleRegistry;

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};

use crate::error::FetchError;

/// Shortest tick interval a module may request.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(16);

/// A pluggable mini-application.
///
/// `init` is called exactly once per instance. `cleanup` must release every
/// resource `init` acquired, must be idempotent, and must tolerate an `init`
/// that failed halfway.
pub trait Module {
    /// Build the module's state inside the given mount point.
    fn init(&mut self, mount: &mut MountPoint) -> anyhow::Result<()>;

    /// Release resources acquired by `init`.
    fn cleanup(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Draw the module into its region of the viewport.
    fn render(&mut self, _frame: &mut Frame, _area: Rect) {}

    /// Handle a key press. Returns true if the key was consumed.
    fn handle_key(&mut self, _key: KeyEvent) -> bool {
        false
    }

    /// Called at the interval requested through [`MountPoint::request_ticks`].
    fn tick(&mut self) {}
}

/// The region of the viewport handed to [`Module::init`].
///
/// Resources requested through the mount point are owned by the host, so
/// they are released at teardown even when the module's own cleanup fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    module_id: String,
    title: String,
    tick_interval: Option<Duration>,
}

impl MountPoint {
    pub fn new(module_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
            title: title.into(),
            tick_interval: None,
        }
    }

    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Ask the host to call [`Module::tick`] periodically.
    pub fn request_ticks(&mut self, interval: Duration) {
        self.tick_interval = Some(interval.max(MIN_TICK_INTERVAL));
    }

    pub fn tick_interval(&self) -> Option<Duration> {
        self.tick_interval
    }
}

/// Resolves a module id to its implementation.
///
/// This is the only suspension point in the lifecycle. The transport behind
/// it (in-process registry, plugin directory, network) is opaque to the
/// loader.
#[async_trait]
pub trait ModuleFetcher: Send + Sync + Debug {
    /// Fetch the bundle for `id`.
    async fn fetch(&self, id: &str) -> Result<ModuleBundle, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_point_tick_request_is_clamped() {
        let mut mount = MountPoint::new("clock", "Clock");
        assert_eq!(mount.tick_interval(), None);

        mount.request_ticks(Duration::from_millis(1));
        assert_eq!(mount.tick_interval(), Some(MIN_TICK_INTERVAL));

        mount.request_ticks(Duration::from_millis(250));
        assert_eq!(mount.tick_interval(), Some(Duration::from_millis(250)));
    }
}
