use once_cell::sync::Lazy;
use regex::Regex;

static HMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+):(\d+):(\d+)").expect("static h:m:s pattern"));

/// Parse the first `h:mm:ss` run found in `text` into seconds.
///
/// Returns `None` when no such run exists (or a component overflows), which
/// callers must keep distinct from `Some(0)`.
pub fn secs_until(text: &str) -> Option<u64> {
    let caps = HMS.captures(text)?;
    let hours: u64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: u64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: u64 = caps.get(3)?.as_str().parse().ok()?;
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}
