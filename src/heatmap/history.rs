use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Days of error history kept
pub const HISTORY_RETENTION: usize = 14;

/// Percentage change beyond which the trend is no longer neutral
const TREND_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorHistoryEntry {
    pub date: NaiveDate,
    pub count: u64,
}

/// Daily error totals, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorHistory {
    entries: Vec<ErrorHistoryEntry>,
}

impl ErrorHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a history from stored entries, normalising order and retention
    pub fn from_entries(entries: Vec<ErrorHistoryEntry>) -> Self {
        let mut history = Self::new();
        for entry in entries {
            history.upsert(entry.date, entry.count);
        }
        history
    }

    pub fn entries(&self) -> &[ErrorHistoryEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn count_on(&self, date: NaiveDate) -> u64 {
        self.entries
            .iter()
            .find(|e| e.date == date)
            .map_or(0, |e| e.count)
    }

    /// Sets the total for `date`, replacing an existing entry for that day
    pub fn upsert(&mut self, date: NaiveDate, count: u64) {
        match self.entries.iter_mut().find(|e| e.date == date) {
            Some(entry) => entry.count = count,
            None => self.entries.push(ErrorHistoryEntry { date, count }),
        }
        self.entries.sort_by_key(|e| e.date);
        if self.entries.len() > HISTORY_RETENTION {
            let excess = self.entries.len() - HISTORY_RETENTION;
            self.entries.drain(..excess);
        }
    }

    /// Adds `errors` to the total for `date`
    pub fn add_errors(&mut self, date: NaiveDate, errors: u64) {
        let today_total = self.count_on(date) + errors;
        self.upsert(date, today_total);
    }

    pub fn trend(&self) -> TrendReport {
        match (self.entries.first(), self.entries.last()) {
            (Some(first), Some(last)) => TrendReport::between(first.count, last.count),
            _ => TrendReport::between(0, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Trend {
    /// fewer errors than before
    #[strum(serialize = "positive")]
    Positive,
    #[strum(serialize = "negative")]
    Negative,
    #[strum(serialize = "neutral")]
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendReport {
    pub trend: Trend,
    /// signed change from first to last entry, in percent
    pub change: f64,
    /// magnitude of the change, rounded
    pub percentage: u32,
}

impl TrendReport {
    pub fn between(first: u64, last: u64) -> Self {
        let change = if first == 0 {
            0.0
        } else {
            (last as f64 - first as f64) / first as f64 * 100.0
        };

        let trend = if change < -TREND_THRESHOLD {
            Trend::Positive
        } else if change > TREND_THRESHOLD {
            Trend::Negative
        } else {
            Trend::Neutral
        };

        Self {
            trend,
            change,
            percentage: change.abs().round() as u32,
        }
    }
}
