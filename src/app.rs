//! Application state: the view host around the module lifecycle.
//!
//! The catalog list, the filter and the category tabs live here. Everything
//! that concerns which module is live is delegated to the [`ModuleLoader`]
//! and the [`NavigationSynchronizer`]; the app only keeps the handle of the
//! installed module so it can route keys, ticks and drawing to it.

use std::time::{Duration, Instant};

use crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};
use tracing::{debug, info};

use crate::catalog::ModuleDescriptor;
use crate::loader::{ActivationSource, LoadOutcome, ModuleLoader, Viewport};
use crate::navigation::{HistoryBackend, HistoryEntry, NavigationSynchronizer, PopStateAction, SessionHistory};
use crate::slot::ModuleHandle;
use crate::ui::Theme;

/// How long a status message stays in the status bar.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,

    loader: ModuleLoader,
    navigation: NavigationSynchronizer<SessionHistory>,
    active: Option<ModuleHandle>,
    last_tick: Instant,

    // Catalog browsing
    pub selected_index: usize,
    /// First catalog row on screen, written back by the renderer.
    pub catalog_offset: usize,
    pub category: Option<String>,
    pub filter_text: String,
    pub filter_active: bool,

    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(loader: ModuleLoader, navigation: NavigationSynchronizer<SessionHistory>, theme: Theme) -> Self {
        Self {
            running: true,
            show_help: false,
            loader,
            navigation,
            active: None,
            last_tick: Instant::now(),
            selected_index: 0,
            catalog_offset: 0,
            category: None,
            filter_text: String::new(),
            filter_active: false,
            theme,
            status_message: None,
        }
    }

    pub fn loader(&self) -> &ModuleLoader {
        &self.loader
    }

    pub fn navigation(&self) -> &NavigationSynchronizer<SessionHistory> {
        &self.navigation
    }

    pub fn viewport(&self) -> &Viewport {
        self.loader.viewport()
    }

    pub fn in_catalog(&self) -> bool {
        matches!(self.loader.viewport(), Viewport::Catalog)
    }

    /// Handle of the installed module, if any.
    pub fn active(&self) -> Option<&ModuleHandle> {
        self.active.as_ref()
    }

    /// Follow the deep link on the initial history entry, if there is one.
    ///
    /// An unknown id leaves the catalog showing and strips the parameter
    /// from the current entry.
    pub fn start(&mut self) {
        let Some(id) = self.navigation.deep_link_target() else {
            return;
        };
        info!(module = %id, "following deep link");
        if let Err(e) = self.loader.activate(&id, ActivationSource::DeepLink) {
            self.navigation.replace_home();
            self.set_status_message(e.to_string());
        }
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_TTL {
                return Some(msg);
            }
        }
        None
    }

    /// Breadcrumb for the status bar.
    pub fn breadcrumb(&self) -> String {
        let name = |id: &str| {
            self.loader
                .catalog()
                .by_id(id)
                .map(|d| d.display_name.clone())
                .unwrap_or_else(|| id.to_string())
        };
        match self.loader.viewport() {
            Viewport::Catalog => match &self.category {
                Some(category) => format!("Catalog > {}", category),
                None => "Catalog".to_string(),
            },
            Viewport::Loading(indicator) => format!("Catalog > {} (loading)", indicator.name),
            Viewport::Module { id } => format!("Catalog > {}", name(id)),
            Viewport::Error { id, .. } => format!("Catalog > {} (failed)", name(id)),
        }
    }

    /// Descriptors shown in the catalog list: enabled, in the selected
    /// category, matching the filter.
    pub fn visible_modules(&self) -> Vec<&ModuleDescriptor> {
        let catalog = self.loader.catalog();
        let base = match &self.category {
            Some(category) => catalog.by_category(category),
            None => catalog.enabled(),
        };
        base.into_iter().filter(|d| self.matches_filter(d)).collect()
    }

    /// Check if a descriptor matches the current filter.
    pub fn matches_filter(&self, descriptor: &ModuleDescriptor) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        let search = self.filter_text.to_lowercase();
        descriptor.display_name.to_lowercase().contains(&search)
            || descriptor.id.to_lowercase().contains(&search)
            || descriptor.description.to_lowercase().contains(&search)
    }

    pub fn selected_module(&self) -> Option<&ModuleDescriptor> {
        self.visible_modules().get(self.selected_index).copied()
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.visible_modules().len().saturating_sub(1);
        self.selected_index = (self.selected_index + n).min(max);
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_index = self.selected_index.saturating_sub(n);
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_index = self.visible_modules().len().saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let max = self.visible_modules().len().saturating_sub(1);
        self.selected_index = self.selected_index.min(max);
    }

    /// Cycle the category tab: all, then each category in catalog order.
    pub fn next_category(&mut self) {
        let categories: Vec<String> = self
            .loader
            .catalog()
            .categories()
            .into_iter()
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        self.category = match &self.category {
            None => categories.first().cloned(),
            Some(current) => categories
                .iter()
                .position(|c| c == current)
                .and_then(|i| categories.get(i + 1).cloned()),
        };
        self.selected_index = 0;
    }

    /// Activate the module under the cursor.
    pub fn open_selected(&mut self) {
        let Some(id) = self.selected_module().map(|d| d.id.clone()) else {
            return;
        };
        self.open(&id);
    }

    /// Activate `id` on behalf of the user.
    pub fn open(&mut self, id: &str) {
        match self.loader.activate(id, ActivationSource::User) {
            Ok(_) => self.active = None,
            Err(e) => self.set_status_message(e.to_string()),
        }
    }

    /// Leave the module viewport for the catalog.
    ///
    /// A home entry is pushed only when the current entry names a module.
    /// Loads still in flight and failed loads never got an entry of their own.
    pub fn return_home(&mut self) {
        if self.loader.is_home() {
            return;
        }
        self.loader.return_home();
        if self.navigation.current_module().is_some() {
            self.navigation.reflect_home();
        }
        self.active = None;
    }

    /// Step back through history.
    pub fn go_back(&mut self) {
        match self.navigation.history_mut().back() {
            Some(entry) => self.apply_pop_state(entry),
            None => self.set_status_message("Already at the oldest entry".to_string()),
        }
    }

    /// Step forward through history.
    pub fn go_forward(&mut self) {
        match self.navigation.history_mut().forward() {
            Some(entry) => self.apply_pop_state(entry),
            None => self.set_status_message("Already at the newest entry".to_string()),
        }
    }

    fn apply_pop_state(&mut self, entry: HistoryEntry) {
        debug!(url = %entry.url, "history traversal");
        match self.navigation.on_pop_state(&entry, &mut self.loader) {
            Ok(PopStateAction::Unchanged) => {}
            Ok(PopStateAction::Activating { .. }) | Ok(PopStateAction::ReturnedHome) => {
                self.active = None;
            }
            Err(e) => {
                self.active = None;
                self.set_status_message(e.to_string());
            }
        }
    }

    /// Apply any fetches that finished since the last call.
    ///
    /// Returns true if the viewport may have changed.
    pub fn process_completions(&mut self) -> bool {
        let outcomes = self.loader.poll_completions(&mut self.navigation);
        let changed = !outcomes.is_empty();
        for outcome in outcomes {
            self.handle_outcome(outcome);
        }
        changed
    }

    fn handle_outcome(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Installed { handle, .. } => {
                self.active = Some(handle);
                self.last_tick = Instant::now();
            }
            LoadOutcome::ContractViolation { id, .. } => {
                self.active = None;
                self.set_status_message(format!("{} cannot be started", id));
            }
            LoadOutcome::Failed { .. } => self.active = None,
            LoadOutcome::Stale { .. } => {}
        }
    }

    /// Drive the live module's timer.
    pub fn tick(&mut self) {
        let Some(handle) = &self.active else {
            return;
        };
        let Some(interval) = self.loader.slot().tick_interval() else {
            return;
        };
        if self.last_tick.elapsed() < interval {
            return;
        }
        self.last_tick = Instant::now();
        if let Some(module) = self.loader.slot_mut().instance_mut(handle) {
            module.tick();
        }
    }

    /// Offer a key to the live module. Returns true if it consumed the key.
    pub fn module_key(&mut self, key: KeyEvent) -> bool {
        let Some(handle) = &self.active else {
            return false;
        };
        self.loader
            .slot_mut()
            .instance_mut(handle)
            .map(|module| module.handle_key(key))
            .unwrap_or(false)
    }

    /// Draw the live module into `area`. Returns false if nothing is live.
    pub fn render_module(&mut self, frame: &mut Frame, area: Rect) -> bool {
        let Some(handle) = &self.active else {
            return false;
        };
        match self.loader.slot_mut().instance_mut(handle) {
            Some(module) => {
                module.render(frame, area);
                true
            }
            None => false,
        }
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// Clear the filter text and exit filter mode.
    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
    }

    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
        self.clamp_selection();
    }

    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
        self.clamp_selection();
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// History cursor position and length, for the header.
    pub fn history_position(&self) -> (usize, usize) {
        let history = self.navigation.history();
        (history.position() + 1, history.len())
    }
}
