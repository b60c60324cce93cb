//! Pace and elapsed-time normalization
//!
//! Both parsers match at the start of the text only and ignore whatever
//! follows a successful match, so "3:45 min/km" parses like "3:45". They never
//! fail loudly: unparseable text is `None`.

use regex::Regex;
use std::sync::OnceLock;

fn pace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([0-9]+):([0-9]+)").expect("pace pattern compiles"))
}

fn elapsed_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([0-9]+):([0-9]+):([0-9]+)").expect("elapsed pattern compiles")
    })
}

/// Parses a pace given as "MM:SS" into fractional minutes
///
/// Seconds are not range-checked: "4:75" is 5.25.
///
/// # Examples
///
/// ```
/// use vasa_harvest::extract::parse_pace;
///
/// assert_eq!(parse_pace("3:45"), Some(3.75));
/// assert_eq!(parse_pace("abc"), None);
/// ```
pub fn parse_pace(text: &str) -> Option<f64> {
    let captures = pace_pattern().captures(text)?;
    let minutes: u64 = captures[1].parse().ok()?;
    let seconds: u64 = captures[2].parse().ok()?;

    Some(minutes as f64 + seconds as f64 / 60.0)
}

/// Parses an elapsed time given as "HH:MM:SS" into whole seconds
///
/// Returns `None` when the text does not match or the total overflows.
///
/// # Examples
///
/// ```
/// use vasa_harvest::extract::parse_elapsed;
///
/// assert_eq!(parse_elapsed("01:02:03"), Some(3723));
/// assert_eq!(parse_elapsed("bad"), None);
/// ```
pub fn parse_elapsed(text: &str) -> Option<u64> {
    let captures = elapsed_pattern().captures(text)?;
    let hours: u64 = captures[1].parse().ok()?;
    let minutes: u64 = captures[2].parse().ok()?;
    let seconds: u64 = captures[3].parse().ok()?;

    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}
