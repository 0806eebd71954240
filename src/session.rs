use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::differ::CharState;
use crate::error::ConfigError;

pub const DEFAULT_COUNTDOWN_SECS: u32 = 3;
pub const MAX_COUNTDOWN_SECS: u32 = 10;
pub const DEFAULT_DURATION_SECS: u64 = 60;

/// Difficulty tag attached to every session and result.
///
/// Stored results may carry tags this build does not know about; those
/// deserialize to `Unrecognized` and score with a neutral multiplier.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
    Code,
    #[serde(other)]
    #[value(skip)]
    Unrecognized,
}

impl Difficulty {
    /// Difficulties a session can be started with
    pub const PLAYABLE: [Difficulty; 5] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
        Difficulty::Expert,
        Difficulty::Code,
    ];

    pub fn from_tag(tag: &str) -> Self {
        Self::PLAYABLE
            .into_iter()
            .find(|d| d.to_string().eq_ignore_ascii_case(tag.trim()))
            .unwrap_or(Difficulty::Unrecognized)
    }

    pub fn is_playable(&self) -> bool {
        *self != Difficulty::Unrecognized
    }
}

/// How mistakes feed the error heatmap during a session
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum_macros::Display,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorCountPolicy {
    /// A position counts once per session, the first time it turns incorrect
    #[default]
    FirstPerPosition,
    /// Every keystroke that lands a wrong character counts
    EveryKeystroke,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub difficulty: Difficulty,
    /// `None` runs until the whole text is typed
    pub duration: Option<Duration>,
    /// Zero disables the countdown
    pub countdown_secs: u32,
    pub error_policy: ErrorCountPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Intermediate,
            duration: Some(Duration::from_secs(DEFAULT_DURATION_SECS)),
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            error_policy: ErrorCountPolicy::default(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.difficulty.is_playable() {
            return Err(ConfigError::UnsupportedDifficulty(self.difficulty));
        }
        if self.duration.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::ZeroDuration);
        }
        if self.countdown_secs > MAX_COUNTDOWN_SECS {
            return Err(ConfigError::CountdownTooLong(self.countdown_secs));
        }
        Ok(())
    }

    pub fn countdown_enabled(&self) -> bool {
        self.countdown_secs > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionPhase {
    Idle,
    Countdown,
    Running,
    Paused,
    Complete,
}

/// Final record of one session, built once at the Complete transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub wpm: f64,
    pub cpm: f64,
    pub accuracy: f64,
    /// seconds elapsed while running
    pub time: f64,
    pub date: DateTime<Local>,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub correct_chars: usize,
    #[serde(default)]
    pub incorrect_chars: usize,
    /// standard deviation of the per-second wpm samples
    #[serde(default)]
    pub consistency: f64,
}

/// Consistent view of a session handed to the rendering layer
#[derive(Debug, Clone, Copy)]
pub struct SessionSnapshot<'a> {
    pub phase: SessionPhase,
    pub states: &'a [CharState],
    pub current_index: Option<usize>,
    pub elapsed: Duration,
    pub remaining: Option<Duration>,
    pub countdown: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseChanged {
        from: SessionPhase,
        to: SessionPhase,
    },
    /// The typed buffer or the clock-derived fields changed
    Updated,
    /// Delivered exactly once per session
    Completed(SessionResult),
}

/// Subscriber for session changes (renderers, achievement tracking)
pub trait SessionObserver {
    fn on_event(&mut self, event: &SessionEvent, snapshot: &SessionSnapshot<'_>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn difficulty_from_tag() {
        assert_eq!(Difficulty::from_tag("advanced"), Difficulty::Advanced);
        assert_eq!(Difficulty::from_tag(" CODE "), Difficulty::Code);
        assert_eq!(Difficulty::from_tag("nightmare"), Difficulty::Unrecognized);
    }

    #[test]
    fn unknown_difficulty_deserializes_as_unrecognized() {
        let d: Difficulty = serde_json::from_str("\"nightmare\"").unwrap();
        assert_eq!(d, Difficulty::Unrecognized);
        let d: Difficulty = serde_json::from_str("\"expert\"").unwrap();
        assert_eq!(d, Difficulty::Expert);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
        assert!(SessionConfig::default().countdown_enabled());
    }

    #[test]
    fn config_validation_rejects_bad_values() {
        let cfg = SessionConfig {
            duration: Some(Duration::ZERO),
            ..SessionConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroDuration));

        let cfg = SessionConfig {
            countdown_secs: 11,
            ..SessionConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::CountdownTooLong(11)));

        let cfg = SessionConfig {
            difficulty: Difficulty::Unrecognized,
            ..SessionConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::UnsupportedDifficulty(Difficulty::Unrecognized))
        );
    }

    #[test]
    fn untimed_config_is_valid() {
        let cfg = SessionConfig {
            duration: None,
            countdown_secs: 0,
            ..SessionConfig::default()
        };
        assert!(cfg.validate().is_ok());
        assert!(!cfg.countdown_enabled());
    }

    #[test]
    fn result_serde_roundtrip() {
        let result = SessionResult {
            wpm: 72.0,
            cpm: 360.0,
            accuracy: 96.0,
            time: 60.0,
            date: Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap(),
            difficulty: Difficulty::Code,
            correct_chars: 360,
            incorrect_chars: 15,
            consistency: 4.5,
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: SessionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
    }

    #[test]
    fn result_missing_additive_fields_default() {
        let json = r#"{"wpm":50.0,"cpm":250.0,"accuracy":90.0,"time":30.0,
            "date":"2026-01-02T10:00:00+00:00","difficulty":"beginner"}"#;
        let result: SessionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.correct_chars, 0);
        assert_eq!(result.consistency, 0.0);
        assert_eq!(result.difficulty, Difficulty::Beginner);
    }
}
