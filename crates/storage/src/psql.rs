//! Parsing `psql` output.
//!
//! psql runs with `VERBOSITY=verbose`, so errors carry their SQLSTATE:
//! `ERROR:  23505: duplicate key value violates unique constraint ...`.
//! Reading the statement from stdin adds a `psql:<stdin>:1: ` location prefix.

use std::sync::LazyLock;

use regex::Regex;

static SQLSTATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:psql:[^:\n]*:\d+:\s*)?(?:ERROR|FATAL|PANIC):\s+([0-9A-Z]{5}):").expect("valid SQLSTATE regex")
});

static INSERT_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^INSERT \d+ (\d+)\s*$").expect("valid INSERT tag regex"));

/// SQLSTATE of the first error in `stderr`, if psql printed one.
pub fn sqlstate(stderr: &str) -> Option<&str> {
    SQLSTATE_RE.captures(stderr).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Row count from an `INSERT <oid> <rows>` command tag.
pub fn inserted_rows(stdout: &str) -> Option<u64> {
    INSERT_TAG_RE.captures(stdout).and_then(|c| c.get(1)).and_then(|m| m.as_str().parse().ok())
}

/// The error lines of `stderr` without the `DETAIL`/`LOCATION` noise.
pub fn error_message(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("LOCATION:"))
        .collect();
    if lines.is_empty() { "psql exited with an error".to_owned() } else { lines.join(" ") }
}
