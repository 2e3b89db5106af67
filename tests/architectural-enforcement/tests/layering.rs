//! Integration Test: Layering
//!
//! **Policy**: `analyzer-core` is UI-free. Everything that draws lives in
//! `tui`; everything that talks HTTP lives in the core.

use architectural_enforcement::{manifest, production_lines};

const UI_CRATES: &[&str] = &["ratatui", "crossterm"];

#[test]
fn test_core_manifest_has_no_ui_dependencies() {
    let toml = manifest("analyzer/core/Cargo.toml");
    for krate in UI_CRATES {
        assert!(
            !toml.lines().any(|l| l.trim_start().starts_with(krate)),
            "analyzer-core must not depend on {krate}"
        );
    }
}

#[test]
fn test_core_sources_never_import_ui_crates() {
    let violations: Vec<String> = production_lines("analyzer/core/src")
        .into_iter()
        .filter(|(_, _, line)| {
            UI_CRATES
                .iter()
                .any(|k| line.contains(&format!("{k}::")))
        })
        .map(|(path, n, line)| format!("{}:{} - {}", path.display(), n, line.trim()))
        .collect();

    assert!(
        violations.is_empty(),
        "UI code in analyzer-core:\n{}",
        violations.join("\n")
    );
}

#[test]
fn test_tui_does_not_depend_on_http_client() {
    let toml = manifest("tui/Cargo.toml");
    assert!(
        !toml.lines().any(|l| l.trim_start().starts_with("reqwest")),
        "the TUI must reach the service through analyzer-core"
    );
}
