//! Error types for the module lifecycle.

use thiserror::Error;

/// Errors raised while building a [`ModuleCatalog`](crate::catalog::ModuleCatalog).
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Two descriptors share the same id.
    #[error("Duplicate module id: {0}")]
    DuplicateId(String),

    /// The id cannot be used verbatim as a URL query value.
    #[error("Module id is not a URL-query-safe token: {0:?}")]
    InvalidId(String),

    /// The catalog file could not be read.
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog file is not a JSON array of descriptors.
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised by the [`ActiveModuleSlot`](crate::slot::ActiveModuleSlot).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SlotError {
    /// `install` was called while another module is still live.
    #[error("Slot still holds module {0}; it must be torn down first")]
    Occupied(String),
}

/// Errors that can occur while fetching a module bundle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Nothing is registered under this id.
    #[error("No bundle is available for module {0}")]
    Unavailable(String),

    /// The bundle exists but could not be delivered.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Terminal failures of a single activation attempt. None are retried.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The id is not in the catalog. Raised before anything is torn down.
    #[error("Unknown module: {0}")]
    NotFound(String),

    /// The fetched bundle has no `init` entry point.
    #[error("Module {0} does not expose an init entry point")]
    ContractViolation(String),

    /// The bundle could not be fetched.
    #[error("Failed to load module {id}: {source}")]
    Fetch {
        id: String,
        #[source]
        source: FetchError,
    },

    /// The module's own `init` returned an error.
    #[error("Module {id} failed to start: {reason}")]
    Init { id: String, reason: String },
}

impl LoadError {
    /// The module id this error refers to.
    pub fn module_id(&self) -> &str {
        match self {
            LoadError::NotFound(id) | LoadError::ContractViolation(id) => id,
            LoadError::Fetch { id, .. } | LoadError::Init { id, .. } => id,
        }
    }
}
