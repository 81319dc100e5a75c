//! Navigation synchronizer: keeps history and the active module in step.
//!
//! Two directions, with one rule between them:
//!
//! ```text
//!   loader / user ──reflect()──────────▶ history   (writes entries)
//!   history ──on_pop_state()──────────▶ loader    (never writes entries)
//! ```
//!
//! Reconciliation from a history event takes `&self`, so it cannot push or
//! replace entries; only [`NavigationSynchronizer::reflect`] and friends,
//! reached from user- or loader-initiated paths, can.

mod deep_link;
mod history;

pub use deep_link::{module_param, parse_deep_link, with_module_param};
pub use history::{HistoryBackend, HistoryEntry, NavState, SessionHistory};

use tracing::debug;
use url::Url;

use crate::error::LoadError;
use crate::loader::{ActivationSource, ModuleLoader};

/// Query parameter carrying the active module id.
pub const MODULE_PARAM: &str = "module";

/// Location of the shell when no other base URL is configured.
pub const DEFAULT_BASE_URL: &str = "playdeck://local/";

/// What a pop-state event did to the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopStateAction {
    /// The entry already matches the active or loading module.
    Unchanged,
    /// A history-sourced activation was started.
    Activating { id: String, generation: u64 },
    /// The entry has no module; the shell returned to the catalog.
    ReturnedHome,
}

/// Bridge between the module lifecycle and a [`HistoryBackend`].
#[derive(Debug)]
pub struct NavigationSynchronizer<H: HistoryBackend> {
    history: H,
}

impl<H: HistoryBackend> NavigationSynchronizer<H> {
    pub fn new(history: H) -> Self {
        Self { history }
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    /// Mutable access for traversal (back/forward). Traversal moves the
    /// cursor; the resulting entry must then go through [`Self::on_pop_state`].
    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    /// Push an entry for `id`.
    pub fn reflect(&mut self, id: &str) {
        let entry = self.entry_for(Some(id));
        debug!(url = %entry.url, "history push");
        self.history.push(entry);
    }

    /// Push an entry with the module parameter removed.
    pub fn reflect_home(&mut self) {
        let entry = self.entry_for(None);
        debug!(url = %entry.url, "history push (home)");
        self.history.push(entry);
    }

    /// Rewrite the current entry for `id` without adding one.
    pub fn replace(&mut self, id: &str) {
        let entry = self.entry_for(Some(id));
        debug!(url = %entry.url, "history replace");
        self.history.replace(entry);
    }

    /// Rewrite the current entry with the module parameter removed.
    pub fn replace_home(&mut self) {
        let entry = self.entry_for(None);
        debug!(url = %entry.url, "history replace (home)");
        self.history.replace(entry);
    }

    /// URL of the current entry.
    pub fn current_url(&self) -> &Url {
        &self.history.current().url
    }

    /// Module named by the current entry's URL.
    pub fn current_module(&self) -> Option<String> {
        module_param(self.current_url())
    }

    /// Module a deep link asks to open at startup.
    pub fn deep_link_target(&self) -> Option<String> {
        self.current_module()
    }

    /// Reconcile the lifecycle with an entry the history just moved to.
    ///
    /// Reads the module id from the entry's state, falling back to its URL.
    /// A different id starts a history-sourced activation, which will not
    /// write history when it completes. The id of a load already in flight
    /// keeps that load but stops it from writing history. No id returns to the catalog. An id
    /// missing from the catalog also returns to the catalog and reports
    /// [`LoadError::NotFound`].
    pub fn on_pop_state(
        &self,
        entry: &HistoryEntry,
        loader: &mut ModuleLoader,
    ) -> Result<PopStateAction, LoadError> {
        let target = match &entry.state {
            Some(state) => state.module_id.clone(),
            None => module_param(&entry.url),
        };
        debug!(url = %entry.url, target = ?target, "pop state");

        let Some(id) = target else {
            if loader.is_home() {
                return Ok(PopStateAction::Unchanged);
            }
            loader.return_home();
            return Ok(PopStateAction::ReturnedHome);
        };

        if loader.current_id() == Some(id.as_str()) {
            return Ok(PopStateAction::Unchanged);
        }
        if loader.pending_target() == Some(id.as_str()) {
            loader.adopt_pending_from_history();
            return Ok(PopStateAction::Unchanged);
        }

        match loader.activate(&id, ActivationSource::History) {
            Ok(generation) => Ok(PopStateAction::Activating { id, generation }),
            Err(e) => {
                loader.return_home();
                Err(e)
            }
        }
    }

    fn entry_for(&self, id: Option<&str>) -> HistoryEntry {
        let url = with_module_param(self.current_url(), id);
        HistoryEntry::new(
            Some(NavState {
                module_id: id.map(str::to_string),
            }),
            url,
        )
    }
}
