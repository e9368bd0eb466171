use serde::{Deserialize, Serialize};

/// A container watcher instance and its liveness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watcher {
    /// Watcher name, e.g. `local`.
    pub name: String,
    /// Whether the watcher is currently running a scan.
    pub running: bool,
}

impl Watcher {
    pub fn new(name: impl Into<String>, running: bool) -> Self {
        Self {
            name: name.into(),
            running,
        }
    }
}
