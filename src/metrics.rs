use std::time::Duration;

use crate::differ::{count, CharState};

pub const CHARS_PER_WORD: f64 = 5.0;

/// Floor for the elapsed-minutes divisor: one millisecond
const MIN_ELAPSED_MINUTES: f64 = 1.0 / 60_000.0;

/// Speed and accuracy derived from a character state array and elapsed time
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metrics {
    pub elapsed_secs: f64,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    pub cpm: f64,
    pub wpm: f64,
    pub accuracy: f64,
}

impl Metrics {
    /// Pure read over the states; never mutates them
    pub fn sample(states: &[CharState], elapsed: Duration) -> Self {
        let correct_chars = count(states, CharState::Correct);
        let incorrect_chars = count(states, CharState::Incorrect);
        let elapsed_secs = elapsed.as_secs_f64();

        let cpm = chars_per_minute(correct_chars, elapsed_secs);

        Self {
            elapsed_secs,
            correct_chars,
            incorrect_chars,
            cpm,
            wpm: words_per_minute(correct_chars, elapsed_secs),
            accuracy: accuracy(correct_chars, incorrect_chars),
        }
    }

    pub fn total_typed(&self) -> usize {
        self.correct_chars + self.incorrect_chars
    }

    /// Wpm as shown to the user
    pub fn reported_wpm(&self) -> f64 {
        self.wpm.round()
    }

    pub fn reported_cpm(&self) -> f64 {
        self.cpm.round()
    }

    pub fn reported_accuracy(&self) -> f64 {
        self.accuracy.round()
    }
}

pub fn elapsed_minutes(elapsed_secs: f64) -> f64 {
    (elapsed_secs / 60.0).max(MIN_ELAPSED_MINUTES)
}

/// Correct characters per minute; zero when no time has passed
pub fn chars_per_minute(correct_chars: usize, elapsed_secs: f64) -> f64 {
    if !elapsed_secs.is_finite() || elapsed_secs <= 0.0 {
        return 0.0;
    }
    correct_chars as f64 / elapsed_minutes(elapsed_secs)
}

pub fn words_per_minute(correct_chars: usize, elapsed_secs: f64) -> f64 {
    chars_per_minute(correct_chars, elapsed_secs) / CHARS_PER_WORD
}

pub fn accuracy(correct_chars: usize, incorrect_chars: usize) -> f64 {
    let total = correct_chars + incorrect_chars;
    if total == 0 {
        return 0.0;
    }
    ((correct_chars as f64 / total as f64) * 100.0).clamp(0.0, 100.0)
}
