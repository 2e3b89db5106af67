//! Architectural Enforcement Integration Tests
//!
//! Workspace-level tests that scan sources and manifests:
//! - `analyzer-core` stays free of terminal UI crates
//! - HTTP lives in the core; the TUI never talks to the network directly
//! - Production code uses no blocking HTTP client and no thread sleeps

use std::path::{Path, PathBuf};

/// Workspace root, two levels above this crate
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// Production lines of every `.rs` file under `dir` (relative to the root)
///
/// Each file is cut at its first `#[cfg(test)]`; comment-only lines are
/// dropped. Yields `(path, line number, line)`.
#[must_use]
pub fn production_lines(dir: &str) -> Vec<(PathBuf, usize, String)> {
    let root = workspace_root().join(dir);
    let mut lines = Vec::new();

    for entry in walkdir::WalkDir::new(&root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
    {
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            continue;
        };

        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("#[cfg(test)]") {
                break;
            }
            if trimmed.starts_with("//") {
                continue;
            }
            lines.push((entry.path().to_path_buf(), idx + 1, line.to_string()));
        }
    }

    lines
}

/// Contents of a manifest relative to the root
///
/// # Panics
///
/// Panics if the manifest cannot be read.
#[must_use]
pub fn manifest(relative: &str) -> String {
    let path = workspace_root().join(relative);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}
