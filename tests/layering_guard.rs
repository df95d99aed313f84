//! Layering guardrails to keep the outcome model free of runtime dependencies.
//!
//! `conductor_core` holds the types shared by host and runner (outcomes, results, verdicts). It must stay
//! usable without an async runtime, so this test scans its `Cargo.toml` and fails if `tokio` appears in
//! `[dependencies]`.

#[test]
fn core_does_not_depend_on_tokio() {
    let manifest = include_str!("../crates/conductor_core/Cargo.toml");
    let mut in_dependencies = false;

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        // Track when we enter/exit the `[dependencies]` table.
        if line.starts_with('[') {
            if line == "[dependencies]" {
                in_dependencies = true;
                continue;
            }
            if in_dependencies {
                break;
            }
        }

        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        if line_no_comment.starts_with("tokio") {
            panic!("`tokio` must not appear in conductor_core [dependencies]");
        }
    }
}

/// The root crate depends on the core crate by path, never the other way round.
#[test]
fn core_does_not_depend_on_conductor() {
    let manifest = include_str!("../crates/conductor_core/Cargo.toml");
    assert!(
        !manifest
            .lines()
            .map(|l| l.split('#').next().unwrap_or("").trim())
            .any(|l| l.starts_with("conductor ") || l.starts_with("conductor=")),
        "conductor_core must not depend on the conductor crate"
    );
}
