//! Message truncation for the alert body line.
//!
//! Alerts have room for a single line of message text. Longer messages are
//! cut and end with an ellipsis.

/// Ellipsis appended to truncated messages.
pub const ELLIPSIS: &str = "...";

/// Truncate `message` to at most `max_chars` characters, ellipsis included.
///
/// Messages that fit are returned unchanged. The cut is made on character
/// boundaries (not bytes), so multi-byte Unicode is never split.
pub fn truncate_message(message: &str, max_chars: usize) -> String {
    if message.len() <= max_chars {
        return message.to_owned();
    }

    let total = message.chars().count();
    if total <= max_chars {
        return message.to_owned();
    }

    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let head: String = message.chars().take(keep).collect();
    format!("{head}{ELLIPSIS}")
}
