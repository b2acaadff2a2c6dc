//! Saved filter presets
//!
//! This module handles:
//! - The persistence API presets are created, listed and deleted through
//! - The client-side registry that orders presets and detects stale selections

mod registry;
mod store;

pub use registry::PresetRegistry;
pub use store::{InMemoryPresetStore, PresetStore};

#[cfg(test)]
pub use store::MockPresetStore;
