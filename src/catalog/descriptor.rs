//! Module descriptors: the immutable catalog entries.

use serde::{Deserialize, Serialize};

/// Static metadata describing one loadable module.
///
/// Descriptors are created once at startup and never mutated. Field aliases
/// accept the camelCase spelling used by hand-written catalog files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Unique key, used verbatim as the `module` query parameter.
    pub id: String,
    /// Human readable name shown in the catalog and loading indicator.
    #[serde(alias = "displayName")]
    pub display_name: String,
    /// Single glyph shown next to the name.
    #[serde(default, alias = "iconGlyph")]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    /// Disabled modules are hidden from browsing but still addressable by id.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ModuleDescriptor {
    /// Create an enabled descriptor with no icon, description or category.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            icon: String::new(),
            description: String::new(),
            category: String::new(),
            enabled: true,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Mark the descriptor as hidden from the browsable catalog.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Check whether an id can be placed in a URL query without escaping.
///
/// Accepts the RFC 3986 unreserved set: ASCII alphanumerics plus `-`, `_`,
/// `.` and `~`.
pub fn is_query_safe(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
}
