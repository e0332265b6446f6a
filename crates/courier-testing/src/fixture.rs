//! Contract fixture loader.
//!
//! Loads golden files from `contracts/` for webhook and HTTP contract tests.

use std::path::{Path, PathBuf};

use serde_json::Value;

/// Loads fixture files relative to the workspace root.
///
/// # Example
/// ```no_run
/// use courier_testing::fixture::Fixture;
/// let event = Fixture::load("contracts/webhook/follow.json");
/// ```
pub struct Fixture;

impl Fixture {
    fn workspace_root() -> PathBuf {
        let start = std::env::var("CARGO_MANIFEST_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap());
        let root = start
            .ancestors()
            .find(|a| a.join("contracts").is_dir())
            .map(Path::to_path_buf);
        root.unwrap_or(start)
    }

    /// Raw bytes of `workspace_root/path`. Panics if missing.
    pub fn bytes(relative_path: &str) -> Vec<u8> {
        let full_path = Self::workspace_root().join(relative_path);
        std::fs::read(&full_path)
            .unwrap_or_else(|e| panic!("fixture not found at {}: {}", full_path.display(), e))
    }

    /// Parsed JSON of `workspace_root/path`. Panics if missing or invalid.
    pub fn load(relative_path: &str) -> Value {
        serde_json::from_slice(&Self::bytes(relative_path))
            .unwrap_or_else(|e| panic!("invalid JSON in fixture {}: {}", relative_path, e))
    }
}
