//! Module catalog: the static registry of module descriptors.
//!
//! The catalog is pure data plus lookup. It is built once at startup, either
//! from the bundled modules ([`ModuleCatalog::builtin`]) or from a JSON file
//! ([`ModuleCatalog::load`]), and never mutated afterwards.
//!
//! ```
//! use playdeck::catalog::{ModuleCatalog, ModuleDescriptor};
//!
//! let catalog = ModuleCatalog::new(vec![
//!     ModuleDescriptor::new("x", "X"),
//!     ModuleDescriptor::new("y", "Y").disabled(),
//! ])
//! .unwrap();
//!
//! assert_eq!(catalog.enabled().len(), 1);
//! assert!(catalog.by_id("y").is_some());
//! ```

mod descriptor;

pub use descriptor::{is_query_safe, ModuleDescriptor};

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::CatalogError;

/// Ordered, validated set of module descriptors.
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    descriptors: Vec<ModuleDescriptor>,
}

impl ModuleCatalog {
    /// Build a catalog, rejecting duplicate or non-query-safe ids.
    pub fn new(descriptors: Vec<ModuleDescriptor>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for descriptor in &descriptors {
            if !is_query_safe(&descriptor.id) {
                return Err(CatalogError::InvalidId(descriptor.id.clone()));
            }
            if !seen.insert(descriptor.id.as_str()) {
                return Err(CatalogError::DuplicateId(descriptor.id.clone()));
            }
        }
        Ok(Self { descriptors })
    }

    /// Load a catalog from a JSON array of descriptors.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        let descriptors: Vec<ModuleDescriptor> = serde_json::from_str(&content)?;
        Self::new(descriptors)
    }

    /// The catalog of modules bundled with the binary.
    pub fn builtin() -> Self {
        Self {
            descriptors: crate::apps::descriptors(),
        }
    }

    /// Every descriptor, in insertion order.
    pub fn all(&self) -> &[ModuleDescriptor] {
        &self.descriptors
    }

    /// Descriptors shown when browsing.
    pub fn enabled(&self) -> Vec<&ModuleDescriptor> {
        self.descriptors.iter().filter(|d| d.enabled).collect()
    }

    /// Look up any descriptor, enabled or not.
    pub fn by_id(&self, id: &str) -> Option<&ModuleDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    /// Enabled descriptors in the given category.
    pub fn by_category(&self, category: &str) -> Vec<&ModuleDescriptor> {
        self.descriptors
            .iter()
            .filter(|d| d.enabled && d.category == category)
            .collect()
    }

    /// Distinct categories of enabled descriptors, in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for d in self.descriptors.iter().filter(|d| d.enabled) {
            if !d.category.is_empty() && !categories.contains(&d.category.as_str()) {
                categories.push(&d.category);
            }
        }
        categories
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
