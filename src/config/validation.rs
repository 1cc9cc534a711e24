//! Configuration validation.
//!
//! Runs on the deserialized [`RawConfig`] before defaults are applied, so it
//! can tell an absent field from an explicit one. Validation collects ALL
//! errors rather than stopping at the first.

use crate::config::schema::{DEFAULT_SURVIVED, RawConfig};
use crate::error::{Severity, ValidationIssue};

/// Bounds the original plugin's sliders allowed for `init_time`.
const RECOMMENDED_INIT_TIME: std::ops::RangeInclusive<u64> = 30..=300;

/// Largest step the original plugin's slider allowed.
const RECOMMENDED_MAX_STEP: u64 = 120;

// ============================================================================
// Public API
// ============================================================================

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration and returns every issue found.
    pub fn validate(&mut self, config: &RawConfig) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_probability(config);
        self.validate_init_time(config);
        self.validate_escalation(config);
        self.validate_command(config);
        self.validate_messages(config);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    fn validate_probability(&mut self, config: &RawConfig) {
        let Some(p) = config.probability else {
            return;
        };
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            self.add_error(
                "probability",
                &format!("Probability must be between 0 and 1, got {p}"),
            );
        } else if p == 0.0 {
            self.add_warning("probability", "Probability is 0: nobody will ever be muted");
        }
    }

    fn validate_init_time(&mut self, config: &RawConfig) {
        if let Some(init) = config.init_time
            && !RECOMMENDED_INIT_TIME.contains(&init)
        {
            self.add_warning(
                "init_time",
                &format!(
                    "Initial mute of {init}s is outside the usual {}..={}s",
                    RECOMMENDED_INIT_TIME.start(),
                    RECOMMENDED_INIT_TIME.end()
                ),
            );
        }
    }

    fn validate_escalation(&mut self, config: &RawConfig) {
        match (config.time_step, config.time_step_min, config.time_step_max) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                self.add_error(
                    "time_step",
                    "Cannot combine 'time_step' with 'time_step_min'/'time_step_max'. \
                     Use either a fixed step or a range.",
                );
            }
            (None, Some(_), None) => {
                self.add_error("time_step_max", "'time_step_min' requires 'time_step_max'");
            }
            (None, None, Some(_)) => {
                self.add_error("time_step_min", "'time_step_max' requires 'time_step_min'");
            }
            (None, Some(min), Some(max)) if min > max => {
                self.add_error(
                    "time_step_min",
                    &format!("'time_step_min' ({min}) exceeds 'time_step_max' ({max})"),
                );
            }
            _ => {}
        }

        let largest = config.time_step.or(config.time_step_max).unwrap_or(0);
        if largest > RECOMMENDED_MAX_STEP {
            self.add_warning(
                "time_step",
                &format!("Step of up to {largest}s exceeds the usual {RECOMMENDED_MAX_STEP}s"),
            );
        }
    }

    fn validate_command(&mut self, config: &RawConfig) {
        let Some(name) = config.command.as_ref().and_then(|c| c.name.as_deref()) else {
            return;
        };
        if name.trim().is_empty() {
            self.add_error("command.name", "Command name is required and cannot be empty");
        } else if name.trim().contains(char::is_whitespace) {
            self.add_error("command.name", "Command name cannot contain whitespace");
        }
    }

    fn validate_messages(&mut self, config: &RawConfig) {
        let Some(messages) = config.messages.as_ref() else {
            return;
        };
        let survived = messages.survived.as_deref().unwrap_or(DEFAULT_SURVIVED);
        if !survived.contains("{duration}") {
            self.add_warning(
                "messages.survived",
                "Template does not mention '{duration}', players won't see the new mute time",
            );
        }
        if messages
            .new_round_delay_ms
            .is_some_and(|ms| ms > 60_000)
        {
            self.add_warning(
                "messages.new_round_delay_ms",
                "New-round message is delayed by more than a minute",
            );
        }
    }

    /// Adds an error to the collection.
    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    /// Adds a warning to the collection.
    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}
