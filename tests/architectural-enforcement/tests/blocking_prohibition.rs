//! Integration Test: Blocking Call Prohibition
//!
//! **Policy**: production code runs on the tokio runtime and must not block
//! it. No `reqwest::blocking`, no `std::thread::sleep`.

use architectural_enforcement::production_lines;

const PRODUCTION_DIRS: &[&str] = &["analyzer/core/src", "tui/src"];

const FORBIDDEN: &[(&str, &str)] = &[
    ("reqwest::blocking", "use the async reqwest client"),
    ("thread::sleep", "use tokio::time::sleep"),
    ("block_on(", "await instead of blocking on a future"),
];

#[test]
fn test_no_blocking_calls_in_production_code() {
    let mut violations = Vec::new();

    for dir in PRODUCTION_DIRS {
        for (path, n, line) in production_lines(dir) {
            for (pattern, fix) in FORBIDDEN {
                if line.contains(pattern) {
                    violations.push(format!(
                        "{}:{} - {} ({fix})",
                        path.display(),
                        n,
                        line.trim()
                    ));
                }
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Blocking calls in production code:\n{}",
        violations.join("\n")
    );
}

#[test]
fn test_scanner_sees_production_sources() {
    // Guards against the scan silently covering nothing
    assert!(!production_lines("analyzer/core/src").is_empty());
    assert!(!production_lines("tui/src").is_empty());
}
