//! Reply rendering.

use crate::config::schema::MessageTemplates;
use crate::game::format_duration;

/// Substitutes `{user}` and `{duration}` in `template`.
#[must_use]
pub fn render(template: &str, mention: &str, mute_secs: u64) -> String {
    template
        .replace("{user}", mention)
        .replace("{duration}", &format_duration(mute_secs))
}

/// The two announcements that follow a hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitReply {
    /// Sent right after the mute
    pub killed: String,
    /// Sent after the configured delay
    pub new_round: String,
}

impl HitReply {
    /// Renders both announcements.
    #[must_use]
    pub fn new(templates: &MessageTemplates, mention: &str, mute_secs: u64) -> Self {
        Self {
            killed: render(&templates.killed, mention, mute_secs),
            new_round: render(&templates.new_round, mention, mute_secs),
        }
    }
}

/// Renders the reply to a blank.
#[must_use]
pub fn survived_reply(templates: &MessageTemplates, mention: &str, mute_secs: u64) -> String {
    render(&templates.survived, mention, mute_secs)
}
