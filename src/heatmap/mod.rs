pub mod history;
pub mod insights;
pub mod keyboard;

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::differ::CharState;
use crate::session::ErrorCountPolicy;

pub use history::{ErrorHistory, ErrorHistoryEntry, Trend, TrendReport, HISTORY_RETENTION};
pub use insights::{display_key, generate_insights, Insight, InsightKind};
pub use keyboard::{locate, Finger, Hand, KeyPosition, KeyRow};

/// Key an error is recorded under: the expected character, lowercased
pub fn error_key(expected: char) -> char {
    expected.to_lowercase().next().unwrap_or(expected)
}

/// Cumulative error count per character
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorHeatmap {
    counts: BTreeMap<char, u64>,
}

impl ErrorHeatmap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_counts(counts: impl IntoIterator<Item = (char, u64)>) -> Self {
        let mut heatmap = Self::new();
        for (c, n) in counts {
            heatmap.add(c, n);
        }
        heatmap
    }

    pub fn record(&mut self, c: char) {
        self.add(c, 1);
    }

    pub fn add(&mut self, c: char, n: u64) {
        if n > 0 {
            *self.counts.entry(error_key(c)).or_insert(0) += n;
        }
    }

    pub fn get(&self, c: char) -> u64 {
        self.counts.get(&error_key(c)).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, u64)> + '_ {
        self.counts.iter().map(|(c, n)| (*c, *n))
    }

    /// Most-missed characters, highest count first, ties by character
    pub fn top_keys(&self, n: usize) -> Vec<(char, u64)> {
        self.iter()
            .filter(|(_, count)| *count > 0)
            .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)))
            .take(n)
            .collect()
    }

    pub fn breakdown(&self) -> HeatmapBreakdown {
        HeatmapBreakdown::from_heatmap(self)
    }
}

/// Errors found during one session, according to the counting policy
#[derive(Debug, Clone)]
pub struct SessionErrors {
    policy: ErrorCountPolicy,
    counted_positions: HashSet<usize>,
    last_typed: Vec<char>,
    total: usize,
}

impl SessionErrors {
    pub fn new(policy: ErrorCountPolicy) -> Self {
        Self {
            policy,
            counted_positions: HashSet::new(),
            last_typed: Vec::new(),
            total: 0,
        }
    }

    pub fn policy(&self) -> ErrorCountPolicy {
        self.policy
    }

    /// Errors counted so far this session
    pub fn total(&self) -> usize {
        self.total
    }

    /// Inspects a fresh state array and returns the keys of newly counted errors.
    ///
    /// Under [`ErrorCountPolicy::EveryKeystroke`] a position counts whenever
    /// its typed character changed since the last call and is now wrong.
    pub fn observe(&mut self, target: &[char], states: &[CharState], typed: &[char]) -> Vec<char> {
        let typed_len = typed.len().min(states.len());
        let fresh: Vec<char> = match self.policy {
            ErrorCountPolicy::FirstPerPosition => (0..typed_len)
                .filter(|idx| states[*idx] == CharState::Incorrect)
                .filter(|idx| self.counted_positions.insert(*idx))
                .map(|idx| error_key(target[idx]))
                .collect(),
            ErrorCountPolicy::EveryKeystroke => (0..typed_len)
                .filter(|idx| states[*idx] == CharState::Incorrect)
                .filter(|idx| self.last_typed.get(*idx) != Some(&typed[*idx]))
                .map(|idx| error_key(target[idx]))
                .collect(),
        };

        self.last_typed = typed[..typed_len].to_vec();
        self.total += fresh.len();
        fresh
    }
}

/// Session errors folded into the long-term heatmap and daily history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorAggregator {
    heatmap: ErrorHeatmap,
    history: ErrorHistory,
}

impl ErrorAggregator {
    pub fn new(heatmap: ErrorHeatmap, history: ErrorHistory) -> Self {
        Self { heatmap, history }
    }

    pub fn heatmap(&self) -> &ErrorHeatmap {
        &self.heatmap
    }

    pub fn history(&self) -> &ErrorHistory {
        &self.history
    }

    /// Records new errors; returns false when there was nothing to record
    pub fn record_errors(&mut self, keys: &[char], today: NaiveDate) -> bool {
        if keys.is_empty() {
            return false;
        }

        for key in keys {
            self.heatmap.record(*key);
        }
        self.history.add_errors(today, keys.len() as u64);

        debug!(
            new_errors = keys.len(),
            today_total = self.history.count_on(today),
            "recorded typing errors"
        );
        true
    }

    pub fn breakdown(&self) -> HeatmapBreakdown {
        self.heatmap.breakdown()
    }

    pub fn trend(&self) -> TrendReport {
        self.history.trend()
    }

    pub fn insights(&self) -> Vec<Insight> {
        generate_insights(&self.heatmap, &self.history)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketShare<K> {
    pub bucket: K,
    pub count: u64,
    /// share of all errors, rounded
    pub percent: u32,
}

/// Error totals grouped by keyboard row, hand and finger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapBreakdown {
    pub total: u64,
    pub rows: Vec<BucketShare<KeyRow>>,
    pub hands: Vec<BucketShare<Hand>>,
    pub fingers: Vec<BucketShare<Finger>>,
}

pub fn percent_of(count: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    (count as f64 / total as f64 * 100.0).round() as u32
}

impl HeatmapBreakdown {
    pub fn from_heatmap(heatmap: &ErrorHeatmap) -> Self {
        let total = heatmap.total();
        let located: Vec<(KeyPosition, u64)> = heatmap
            .iter()
            .filter_map(|(c, n)| locate(c).map(|pos| (pos, n)))
            .collect();

        let sum_where = |pred: &dyn Fn(&KeyPosition) -> bool| -> u64 {
            located
                .iter()
                .filter(|(pos, _)| pred(pos))
                .map(|(_, n)| *n)
                .sum()
        };

        let rows = keyboard::ROWS
            .iter()
            .map(|row| {
                let count = sum_where(&|pos: &KeyPosition| pos.row == Some(*row));
                BucketShare {
                    bucket: *row,
                    count,
                    percent: percent_of(count, total),
                }
            })
            .collect();

        let hands = keyboard::HANDS
            .iter()
            .map(|hand| {
                let count = sum_where(&|pos: &KeyPosition| pos.hand() == Some(*hand));
                BucketShare {
                    bucket: *hand,
                    count,
                    percent: percent_of(count, total),
                }
            })
            .collect();

        let fingers = keyboard::FINGERS
            .iter()
            .map(|finger| {
                let count = sum_where(&|pos: &KeyPosition| pos.finger == *finger);
                BucketShare {
                    bucket: *finger,
                    count,
                    percent: percent_of(count, total),
                }
            })
            .collect();

        Self {
            total,
            rows,
            hands,
            fingers,
        }
    }

    pub fn row(&self, row: KeyRow) -> BucketShare<KeyRow> {
        find_bucket(&self.rows, row)
    }

    pub fn hand(&self, hand: Hand) -> BucketShare<Hand> {
        find_bucket(&self.hands, hand)
    }

    pub fn finger(&self, finger: Finger) -> BucketShare<Finger> {
        find_bucket(&self.fingers, finger)
    }
}

fn find_bucket<K: Copy + PartialEq>(shares: &[BucketShare<K>], bucket: K) -> BucketShare<K> {
    shares
        .iter()
        .find(|s| s.bucket == bucket)
        .copied()
        .unwrap_or(BucketShare {
            bucket,
            count: 0,
            percent: 0,
        })
}
