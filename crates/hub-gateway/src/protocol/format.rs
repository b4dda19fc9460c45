//! Message text formatting

use chrono::NaiveTime;
use std::time::Duration;

/// Separator between messages coalesced into one outbound frame
pub const FRAME_SEPARATOR: char = '\n';

/// Normalize inbound text: line breaks become spaces, surrounding whitespace is trimmed
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

/// Prefix a normalized body with its sender and wall-clock time
///
/// Produces `[sender][HH:MM:SS] body`.
#[must_use]
pub fn stamp(sender: &str, at: NaiveTime, body: &str) -> String {
    format!("[{sender}][{}] {body}", at.format("%H:%M:%S"))
}

/// Notice broadcast when a session joins
#[must_use]
pub fn online_notice(name: &str) -> String {
    format!("[{name}] is online")
}

/// Notice broadcast when a session leaves on its own
#[must_use]
pub fn offline_notice(name: &str) -> String {
    format!("[{name}] went offline")
}

/// Notice broadcast when a session is disconnected for inactivity
#[must_use]
pub fn forced_offline_notice(name: &str, idle: Duration) -> String {
    format!(
        "[{name}] was inactive for more than {} and has been disconnected",
        describe(idle)
    )
}

fn describe(idle: Duration) -> String {
    if idle.subsec_millis() == 0 {
        format!("{} seconds", idle.as_secs())
    } else {
        format!("{} ms", idle.as_millis())
    }
}
