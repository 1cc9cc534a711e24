//! Configuration schema.
//!
//! [`RawConfig`] mirrors the YAML file, every field optional. The loader
//! validates it and resolves it into a [`RouletteConfig`] with all defaults
//! applied, which is what the rest of the crate consumes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::{EscalationRule, GameRules, Probability};

// ============================================================================
// Defaults
// ============================================================================

/// Default chance that a shot hits.
pub const DEFAULT_PROBABILITY: f64 = 0.2;

/// Default mute for the first hit of a round, in seconds.
pub const DEFAULT_INIT_TIME: u64 = 30;

/// Default seconds added per blank.
pub const DEFAULT_TIME_STEP: u64 = 30;

/// Default command name.
pub const DEFAULT_COMMAND_NAME: &str = "开枪";

/// Default command description.
pub const DEFAULT_COMMAND_DESCRIPTION: &str = "对自己开一枪，看看会不会死哦";

/// Default usage text.
pub const DEFAULT_COMMAND_USAGE: &str = "开枪后，随机概率对其禁言\n如果没禁言则增加下一次禁言的时间";

/// Default message announcing the shooter was hit.
pub const DEFAULT_KILLED: &str = "嘻嘻嘻，{user} 被杀死了！";

/// Default message announcing a fresh round.
pub const DEFAULT_NEW_ROUND: &str = "撒，让我们来开始新一轮的游戏吧。（上弹中）";

/// Default reply to a blank.
pub const DEFAULT_SURVIVED: &str =
    "{user} 这枪空了，恭喜你躲过一劫！\n禁言时间将增加到 {duration}！";

/// Default delay before the new-round message, in milliseconds.
pub const DEFAULT_NEW_ROUND_DELAY_MS: u64 = 1000;

// ============================================================================
// Raw (file) schema
// ============================================================================

/// Configuration exactly as written in the YAML file.
///
/// Accepts both `snake_case` keys and the `camelCase` spellings
/// (`initTime`, `timeStep`, `timeStepMin`, `timeStepMax`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    /// Chance that a shot hits, in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,

    /// Mute for the first hit of a round, in seconds.
    #[serde(default, alias = "initTime", skip_serializing_if = "Option::is_none")]
    pub init_time: Option<u64>,

    /// Fixed seconds added per blank.
    #[serde(default, alias = "timeStep", skip_serializing_if = "Option::is_none")]
    pub time_step: Option<u64>,

    /// Lower bound of a random step, in seconds.
    #[serde(default, alias = "timeStepMin", skip_serializing_if = "Option::is_none")]
    pub time_step_min: Option<u64>,

    /// Upper bound of a random step, in seconds.
    #[serde(default, alias = "timeStepMax", skip_serializing_if = "Option::is_none")]
    pub time_step_max: Option<u64>,

    /// Seed for a reproducible shot sequence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Command registration metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<RawCommand>,

    /// Reply templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<RawMessages>,
}

/// `command:` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCommand {
    /// Name users type to fire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// One-line description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Longer usage text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
}

/// `messages:` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawMessages {
    /// Sent when the shooter is hit. Supports `{user}` and `{duration}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub killed: Option<String>,

    /// Sent after `killed` once the next round is loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_round: Option<String>,

    /// Reply to a blank. Supports `{user}` and `{duration}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survived: Option<String>,

    /// Delay before `new_round` is delivered, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_round_delay_ms: Option<u64>,
}

// ============================================================================
// Resolved schema
// ============================================================================

/// Command registration metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Name users type to fire
    pub name: String,
    /// One-line description
    pub description: String,
    /// Longer usage text
    pub usage: String,
}

impl Default for CommandSpec {
    fn default() -> Self {
        Self {
            name: DEFAULT_COMMAND_NAME.to_string(),
            description: DEFAULT_COMMAND_DESCRIPTION.to_string(),
            usage: DEFAULT_COMMAND_USAGE.to_string(),
        }
    }
}

/// Reply templates with `{user}` and `{duration}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplates {
    /// Sent when the shooter is hit
    pub killed: String,
    /// Sent after `killed`
    pub new_round: String,
    /// Reply to a blank
    pub survived: String,
    /// Delay before `new_round` is delivered
    pub new_round_delay: Duration,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            killed: DEFAULT_KILLED.to_string(),
            new_round: DEFAULT_NEW_ROUND.to_string(),
            survived: DEFAULT_SURVIVED.to_string(),
            new_round_delay: Duration::from_millis(DEFAULT_NEW_ROUND_DELAY_MS),
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouletteConfig {
    /// Parameters of the game itself
    pub rules: GameRules,
    /// Command registration metadata
    pub command: CommandSpec,
    /// Reply templates
    pub messages: MessageTemplates,
    /// Seed for the shot sequence, OS entropy when `None`
    pub seed: Option<u64>,
}

impl RawConfig {
    /// Resolves the escalation rule, preferring the explicit form present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the step fields conflict.
    pub fn escalation(&self) -> Result<EscalationRule, ConfigError> {
        match (self.time_step, self.time_step_min, self.time_step_max) {
            (Some(step), None, None) => Ok(EscalationRule::Fixed(step)),
            (None, None, None) => Ok(EscalationRule::Fixed(DEFAULT_TIME_STEP)),
            (None, Some(min), Some(max)) => {
                EscalationRule::range(min, max).ok_or_else(|| ConfigError::InvalidValue {
                    field: "time_step_min".to_string(),
                    value: min.to_string(),
                    expected: format!("at most time_step_max ({max})"),
                })
            }
            _ => Err(ConfigError::InvalidValue {
                field: "time_step".to_string(),
                value: format!(
                    "time_step={:?}, time_step_min={:?}, time_step_max={:?}",
                    self.time_step, self.time_step_min, self.time_step_max
                ),
                expected: "either time_step or both time_step_min and time_step_max".to_string(),
            }),
        }
    }

    /// Applies defaults and produces the configuration the game runs on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for values the validator
    /// would also reject.
    pub fn resolve(self) -> Result<RouletteConfig, ConfigError> {
        let raw_probability = self.probability.unwrap_or(DEFAULT_PROBABILITY);
        let probability =
            Probability::new(raw_probability).ok_or_else(|| ConfigError::InvalidValue {
                field: "probability".to_string(),
                value: raw_probability.to_string(),
                expected: "a number between 0 and 1".to_string(),
            })?;
        let escalation = self.escalation()?;

        let command = self.command.unwrap_or_default();
        let messages = self.messages.unwrap_or_default();
        let defaults = MessageTemplates::default();

        Ok(RouletteConfig {
            rules: GameRules {
                probability,
                initial_mute_secs: self.init_time.unwrap_or(DEFAULT_INIT_TIME),
                escalation,
            },
            command: CommandSpec {
                name: command
                    .name
                    .map_or_else(|| DEFAULT_COMMAND_NAME.to_string(), |n| n.trim().to_string()),
                description: command
                    .description
                    .unwrap_or_else(|| DEFAULT_COMMAND_DESCRIPTION.to_string()),
                usage: command
                    .usage
                    .unwrap_or_else(|| DEFAULT_COMMAND_USAGE.to_string()),
            },
            messages: MessageTemplates {
                killed: messages.killed.unwrap_or(defaults.killed),
                new_round: messages.new_round.unwrap_or(defaults.new_round),
                survived: messages.survived.unwrap_or(defaults.survived),
                new_round_delay: messages
                    .new_round_delay_ms
                    .map_or(defaults.new_round_delay, Duration::from_millis),
            },
            seed: self.seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mapping_resolves_to_defaults() {
        let raw: RawConfig = serde_yaml::from_str("{}").unwrap();
        let config = raw.resolve().unwrap();
        assert_eq!(config, RouletteConfig::default());
        assert_eq!(config.rules.initial_mute_secs, 30);
        assert_eq!(config.rules.escalation, EscalationRule::Fixed(30));
        assert_eq!(config.command.name, "开枪");
    }

    #[test]
    fn camel_case_keys_are_accepted() {
        let raw: RawConfig =
            serde_yaml::from_str("probability: 0.5\ninitTime: 60\ntimeStep: 10\n").unwrap();
        let config = raw.resolve().unwrap();
        assert_eq!(config.rules.initial_mute_secs, 60);
        assert_eq!(config.rules.escalation, EscalationRule::Fixed(10));
    }

    #[test]
    fn range_step_resolves_to_range_rule() {
        let raw: RawConfig =
            serde_yaml::from_str("time_step_min: 10\ntime_step_max: 40\n").unwrap();
        assert_eq!(
            raw.escalation().unwrap(),
            EscalationRule::Range { min: 10, max: 40 }
        );
    }

    #[test]
    fn mixed_step_forms_are_rejected() {
        let raw: RawConfig =
            serde_yaml::from_str("time_step: 10\ntime_step_min: 10\ntime_step_max: 40\n").unwrap();
        assert!(matches!(
            raw.escalation(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn half_range_is_rejected() {
        let raw: RawConfig = serde_yaml::from_str("time_step_max: 40\n").unwrap();
        assert!(raw.escalation().is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<RawConfig, _> = serde_yaml::from_str("probabilty: 0.5\n");
        assert!(result.is_err());
    }

    #[test]
    fn out_of_range_probability_does_not_resolve() {
        let raw = RawConfig {
            probability: Some(1.5),
            ..RawConfig::default()
        };
        assert!(raw.resolve().is_err());
    }

    #[test]
    fn messages_override_individually() {
        let raw: RawConfig = serde_yaml::from_str(
            "messages:\n  killed: \"{user} is out\"\n  new_round_delay_ms: 0\n",
        )
        .unwrap();
        let config = raw.resolve().unwrap();
        assert_eq!(config.messages.killed, "{user} is out");
        assert_eq!(config.messages.survived, DEFAULT_SURVIVED);
        assert_eq!(config.messages.new_round_delay, Duration::ZERO);
    }
}
