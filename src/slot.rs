//! The single holder of the live module instance.
//!
//! The slot is a two-state machine, `Empty` and `Active(id)`. Holding the id
//! and the instance in one enum variant makes "instance present iff id
//! present" hold by construction.

use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::SlotError;
use crate::module::{Module, MountPoint};

/// Explicit handle to an installed module, returned by
/// [`ActiveModuleSlot::install`].
///
/// Callers reach the live instance through the slot with this handle rather
/// than through a shared global. Handles go stale at teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleHandle {
    id: String,
    token: u64,
}

impl ModuleHandle {
    pub fn id(&self) -> &str {
        &self.id
    }
}

enum SlotState {
    Empty,
    Active {
        id: String,
        instance: Box<dyn Module>,
        token: u64,
        tick_interval: Option<Duration>,
    },
}

/// Holds at most one live [`Module`].
pub struct ActiveModuleSlot {
    state: SlotState,
    next_token: u64,
}

impl Default for ActiveModuleSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl ActiveModuleSlot {
    pub fn new() -> Self {
        Self {
            state: SlotState::Empty,
            next_token: 0,
        }
    }

    /// Install an initialized instance. Only legal from `Empty`.
    pub fn install(&mut self, id: &str, instance: Box<dyn Module>) -> Result<ModuleHandle, SlotError> {
        self.install_mounted(MountPoint::new(id, id), instance)
    }

    /// Install an instance along with the host resources it requested
    /// through its mount point.
    ///
    /// A rejected instance is cleaned up before it is dropped.
    pub fn install_mounted(
        &mut self,
        mount: MountPoint,
        mut instance: Box<dyn Module>,
    ) -> Result<ModuleHandle, SlotError> {
        if let SlotState::Active { id, .. } = &self.state {
            let occupant = id.clone();
            warn!(module = %mount.module_id(), occupant = %occupant, "install rejected: slot occupied");
            run_cleanup(mount.module_id(), instance.as_mut());
            return Err(SlotError::Occupied(occupant));
        }

        self.next_token += 1;
        let handle = ModuleHandle {
            id: mount.module_id().to_string(),
            token: self.next_token,
        };
        debug!(module = %handle.id, "module installed");
        self.state = SlotState::Active {
            id: handle.id.clone(),
            instance,
            token: handle.token,
            tick_interval: mount.tick_interval(),
        };
        Ok(handle)
    }

    /// Tear down the live module, if any.
    ///
    /// Calls the module's `cleanup`, logging and swallowing its error, then
    /// drops the instance, releases its tick timer and invalidates every
    /// handle issued for it. Calling this on an empty slot is a no-op.
    /// Returns true if a module was torn down.
    pub fn teardown(&mut self) -> bool {
        let SlotState::Active { id, mut instance, .. } =
            std::mem::replace(&mut self.state, SlotState::Empty)
        else {
            return false;
        };
        run_cleanup(&id, instance.as_mut());
        debug!(module = %id, "module torn down");
        true
    }

    pub fn current_id(&self) -> Option<&str> {
        match &self.state {
            SlotState::Empty => None,
            SlotState::Active { id, .. } => Some(id),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.state, SlotState::Empty)
    }

    /// Resolve a handle to the live instance. Stale handles resolve to `None`.
    pub fn instance_mut(&mut self, handle: &ModuleHandle) -> Option<&mut dyn Module> {
        match &mut self.state {
            SlotState::Active { instance, token, .. } if *token == handle.token => {
                let instance: &mut dyn Module = instance.as_mut();
                Some(instance)
            }
            _ => None,
        }
    }

    /// Tick interval requested by the live module.
    pub fn tick_interval(&self) -> Option<Duration> {
        match &self.state {
            SlotState::Active { tick_interval, .. } => *tick_interval,
            SlotState::Empty => None,
        }
    }
}

impl Drop for ActiveModuleSlot {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for ActiveModuleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveModuleSlot")
            .field("current_id", &self.current_id())
            .finish()
    }
}

fn run_cleanup(id: &str, instance: &mut dyn Module) {
    if let Err(e) = instance.cleanup() {
        warn!(module = %id, error = %e, "module cleanup failed; continuing teardown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    struct Probe {
        name: &'static str,
        log: Log,
        fail_cleanup: bool,
    }

    impl Module for Probe {
        fn init(&mut self, _mount: &mut MountPoint) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("init {}", self.name));
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

    fn probe(name: &'static str, log: &Log) -> Box<dyn Module> {
        Box::new(Probe {
            name,
            log: log.clone(),
            fail_cleanup: false,
        })
    }

    #[test]
    fn test_install_from_empty() {
        let log = Log::default();
        let mut slot = ActiveModuleSlot::new();
        assert!(slot.is_empty());

        let handle = slot.install("a", probe("a", &log)).unwrap();
        assert_eq!(handle.id(), "a");
        assert_eq!(slot.current_id(), Some("a"));
        assert!(slot.instance_mut(&handle).is_some());
    }

    #[test]
    fn test_install_rejected_when_occupied() {
        let log = Log::default();
        let mut slot = ActiveModuleSlot::new();
        slot.install("a", probe("a", &log)).unwrap();

        let err = slot.install("b", probe("b", &log)).unwrap_err();
        assert_eq!(err, SlotError::Occupied("a".to_string()));
        assert_eq!(slot.current_id(), Some("a"));
        // The rejected instance is cleaned up, the occupant is untouched
        assert_eq!(*log.lock().unwrap(), vec!["cleanup b"]);
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let log = Log::default();
        let mut slot = ActiveModuleSlot::new();
        slot.install("a", probe("a", &log)).unwrap();

        assert!(slot.teardown());
        assert!(!slot.teardown());
        assert!(slot.is_empty());
        assert_eq!(*log.lock().unwrap(), vec!["cleanup a"]);
    }

    #[test]
    fn test_teardown_on_empty_is_noop() {
        let mut slot = ActiveModuleSlot::new();
        assert!(!slot.teardown());
        assert!(slot.is_empty());
    }

    #[test]
    fn test_failed_cleanup_still_empties_slot() {
        let log = Log::default();
        let mut slot = ActiveModuleSlot::new();
        slot.install(
            "bad",
            Box::new(Probe {
                name: "bad",
                log: log.clone(),
                fail_cleanup: true,
            }),
        )
        .unwrap();

        assert!(slot.teardown());
        assert!(slot.is_empty());
        assert!(slot.install("b", probe("b", &log)).is_ok());
    }

    #[test]
    fn test_stale_handle_resolves_to_nothing() {
        let log = Log::default();
        let mut slot = ActiveModuleSlot::new();
        let first = slot.install("a", probe("a", &log)).unwrap();
        slot.teardown();
        let second = slot.install("a", probe("a", &log)).unwrap();

        assert!(slot.instance_mut(&first).is_none());
        assert!(slot.instance_mut(&second).is_some());
    }

    #[test]
    fn test_tick_interval_released_at_teardown() {
        let log = Log::default();
        let mut slot = ActiveModuleSlot::new();
        let mut mount = MountPoint::new("a", "A");
        mount.request_ticks(Duration::from_millis(100));
        slot.install_mounted(mount, probe("a", &log)).unwrap();
        assert_eq!(slot.tick_interval(), Some(Duration::from_millis(100)));

        slot.teardown();
        assert_eq!(slot.tick_interval(), None);
    }

    #[test]
    fn test_drop_cleans_up_live_module() {
        let log = Log::default();
        {
            let mut slot = ActiveModuleSlot::new();
            slot.install("a", probe("a", &log)).unwrap();
        }
        assert_eq!(*log.lock().unwrap(), vec!["cleanup a"]);
    }
}
