//! Human-readable mute durations.

/// Renders a duration in seconds for chat replies.
///
/// Under a minute: `"SS 秒"`. Otherwise: `"MM 分 SS 秒"`. Both fields are
/// zero-padded to two digits; minutes are not capped.
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{seconds:02} 秒")
    } else {
        format!("{:02} 分 {:02} 秒", seconds / 60, seconds % 60)
    }
}
