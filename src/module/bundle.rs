//! Fetched module bundles.

use std::fmt;

use super::Module;

/// Constructor for a module instance, delivered by a fetch.
///
/// Must be `Send` because bundles cross from the fetch task back to the
/// event loop. The instance it builds stays on the event loop.
pub type EntryPoint = Box<dyn FnOnce() -> Box<dyn Module> + Send>;

/// The result of fetching a module by id.
///
/// A bundle without an entry point does not satisfy the module contract;
/// the loader reports it as a contract violation.
pub struct ModuleBundle {
    id: String,
    entry: Option<EntryPoint>,
}

impl ModuleBundle {
    /// Create a bundle whose entry point builds the module.
    pub fn new<F>(id: impl Into<String>, entry: F) -> Self
    where
        F: FnOnce() -> Box<dyn Module> + Send + 'static,
    {
        Self {
            id: id.into(),
            entry: Some(Box::new(entry)),
        }
    }

    /// Create a bundle that lacks the `init` entry point.
    pub fn without_entry(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entry: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn has_entry(&self) -> bool {
        self.entry.is_some()
    }

    /// Consume the bundle, yielding its entry point if it has one.
    pub fn into_entry(self) -> Option<EntryPoint> {
        self.entry
    }
}

impl fmt::Debug for ModuleBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleBundle")
            .field("id", &self.id)
            .field("has_entry", &self.has_entry())
            .finish()
    }
}
