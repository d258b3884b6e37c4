//! Developer tooling: debug panel with ranged controls, scene inspector.
//!
//! # Invariants
//! - An inactive panel records nothing and costs nothing.
//! - Destroying the panel twice is a no-op.

mod inspector;
mod panel;

pub use inspector::{NodeInfo, SceneInspector, SceneSummary};
pub use panel::{Control, ControlId, DEBUG_FRAGMENT, DebugPanel, FolderId};

pub fn crate_info() -> &'static str {
    "experience-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
