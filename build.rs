//! Embeds a human-readable version string as `BUILD_INFO_HUMAN`.
//!
//! The string is `{CARGO_PKG_VERSION} ({git}) {rustc --version}` where
//! `{git}` is `git describe --tags --dirty` when a tag is reachable, or
//! `v{version}-{commit timestamp}-{short sha}[+dirty]` otherwise. Parts
//! that cannot be determined (no git, no rustc on PATH) are left out.

use std::process::Command;

use chrono::{DateTime, Utc};

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

fn main() {
    for path in ["src", "build.rs", "Cargo.toml"] {
        println!("cargo:rerun-if-changed={path}");
    }

    let version = env!("CARGO_PKG_VERSION");
    let build_info = [
        Some(version.to_string()),
        Some(format!("({})", describe(version))),
        run("rustc", &["--version"]),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");

    println!("cargo:rustc-env=BUILD_INFO_HUMAN={build_info}");
}

fn run(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn git(args: &[&str]) -> Option<String> {
    run("git", args)
}

fn describe(version: &str) -> String {
    match git(&["describe", "--tags", "--dirty"]) {
        Some(tagged) => tagged,
        None => pseudo_version(version),
    }
}

fn pseudo_version(version: &str) -> String {
    let commit = git(&["rev-parse", "--short=12", "HEAD"]).unwrap_or_else(|| "unknown".into());
    // `cargo install --git` drops a .cargo-ok marker into the checkout.
    let dirty = git(&["status", "--porcelain"])
        .is_some_and(|status| status.lines().any(|line| line.get(3..) != Some(".cargo-ok")));

    let committed_at = git(&["log", "-1", "--format=%ct"])
        .and_then(|secs| secs.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0));
    let timestamp = match committed_at {
        Some(at) if !dirty => at,
        _ => Utc::now(),
    }
    .format(TIMESTAMP_FORMAT);

    let suffix = if dirty { "+dirty" } else { "" };
    format!("v{version}-{timestamp}-{commit}{suffix}")
}
