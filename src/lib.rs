//! # playdeck
//!
//! A terminal front end that presents a catalog of independent mini-apps
//! ("modules") and loads exactly one at a time into a shared viewport.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Application                         │
//! │  ┌─────────┐   ┌──────────┐   ┌──────┐   ┌──────────┐        │
//! │  │ events  │──▶│   app    │──▶│  ui  │──▶│ Terminal │        │
//! │  └─────────┘   └────┬─────┘   └──────┘   └──────────┘        │
//! │                     │                                        │
//! │        ┌────────────┴─────────────┐                          │
//! │        ▼                          ▼                          │
//! │  ┌───────────┐  reflect   ┌──────────────┐                   │
//! │  │  loader   │───────────▶│  navigation  │◀── back/forward   │
//! │  └─┬───┬───┬─┘◀───────────└──────────────┘                   │
//! │    │   │   │   on_pop_state                                  │
//! │    ▼   ▼   ▼                                                 │
//! │ catalog slot fetcher (tokio task) ──▶ completion channel     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`catalog`]**: immutable module descriptors and lookup
//! - **[`module`]**: the [`Module`] contract, bundles, and the async
//!   [`ModuleFetcher`] that resolves an id to a bundle
//! - **[`slot`]**: the [`ActiveModuleSlot`], which holds at most one live module
//! - **[`loader`]**: the [`ModuleLoader`], which fetches, waits out the minimum
//!   transition, and installs; newer requests supersede older ones
//! - **[`navigation`]**: keeps a URL-shaped session history in step with the
//!   live module, and handles deep links
//! - **[`app`]**, **[`events`]**, **[`ui`]**: the ratatui view host
//!
//! ## Usage
//!
//! ```bash
//! # Browse the bundled catalog
//! playdeck
//!
//! # Open a module straight away
//! playdeck --module counter
//! playdeck --module 'playdeck://local/?module=stopwatch'
//!
//! # Print the catalog as JSON and exit
//! playdeck --list --category time
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::sync::Arc;
//! use playdeck::{ActivationSource, LoadOutcome, ModuleCatalog, ModuleLoader, ModuleRegistry};
//! use playdeck::navigation::{NavigationSynchronizer, SessionHistory, DEFAULT_BASE_URL};
//!
//! # tokio_test::block_on(async {
//! let mut loader = ModuleLoader::new(
//!     Arc::new(ModuleCatalog::builtin()),
//!     Arc::new(ModuleRegistry::builtin()),
//!     tokio::runtime::Handle::current(),
//! )
//! .with_min_transition(std::time::Duration::ZERO);
//! let mut nav = NavigationSynchronizer::new(SessionHistory::new(DEFAULT_BASE_URL.parse().unwrap()));
//!
//! loader.activate("counter", ActivationSource::User).unwrap();
//! let completion = loader.next_completion().await.unwrap();
//! assert!(matches!(loader.complete(completion, &mut nav), LoadOutcome::Installed { .. }));
//! assert_eq!(nav.current_module().as_deref(), Some("counter"));
//! # });
//! ```

pub mod app;
pub mod apps;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod loader;
pub mod module;
pub mod navigation;
pub mod slot;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use catalog::{ModuleCatalog, ModuleDescriptor};
pub use error::{CatalogError, FetchError, LoadError, SlotError};
pub use loader::{ActivationSource, LoadOutcome, ModuleLoader, Viewport, MIN_TRANSITION};
pub use module::{Module, ModuleBundle, ModuleFetcher, ModuleRegistry, MountPoint};
pub use navigation::{NavigationSynchronizer, SessionHistory};
pub use slot::{ActiveModuleSlot, ModuleHandle};
