// src/engine/progress.rs

//! Progress extraction from sync tool output.

use std::sync::LazyLock;

use regex::Regex;

// rsync --info=progress2 prints lines like "  1,234,567  45%  1.23MB/s  0:00:10".
static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)(\d{1,3})%").expect("percent regex is valid"));

/// Parse a progress fraction from one stdout segment, if it carries one.
pub fn parse_progress(segment: &str) -> Option<f64> {
    let caps = PERCENT.captures(segment)?;
    let percent: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some(percent / 100.0)
}
