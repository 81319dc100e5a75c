//! Modules bundled with the binary.
//!
//! Two working demonstration modules plus two disabled entries that are only
//! reachable by deep link: `sandbox` resolves without an entry point and
//! `relay` fails to fetch. They keep the failure paths of the loader
//! reachable from a real session.

mod counter;
mod stopwatch;

pub use counter::Counter;
pub use stopwatch::Stopwatch;

use crate::catalog::ModuleDescriptor;
use crate::module::ModuleRegistry;

/// Descriptors for the bundled modules, in catalog order.
pub fn descriptors() -> Vec<ModuleDescriptor> {
    vec![
        ModuleDescriptor::new("stopwatch", "Stopwatch")
            .with_icon("⏱")
            .with_description("Start, stop and lap a running timer")
            .with_category("time"),
        ModuleDescriptor::new("counter", "Counter")
            .with_icon("#")
            .with_description("Tally things with the arrow keys")
            .with_category("tools"),
        ModuleDescriptor::new("sandbox", "Sandbox")
            .with_icon("?")
            .with_description("Bundle without an entry point")
            .with_category("lab")
            .disabled(),
        ModuleDescriptor::new("relay", "Relay")
            .with_icon("~")
            .with_description("Bundle whose host never answers")
            .with_category("lab")
            .disabled(),
    ]
}

/// Register every bundled module with `registry`.
pub fn register_all(registry: &mut ModuleRegistry) {
    registry.register("stopwatch", || Box::new(Stopwatch::new()));
    registry.register("counter", || Box::new(Counter::new()));
    registry.register_without_entry("sandbox");
    registry.register_unavailable("relay", "bundle host unreachable");
}
