use super::history::{ErrorHistory, Trend};
use super::keyboard::{Hand, KeyRow};
use super::{BucketShare, ErrorHeatmap};

/// Hand share gap (in points) that counts as an imbalance
const HAND_IMBALANCE_POINTS: u32 = 20;
/// Row share (percent) that counts as a concentration of errors
const ROW_CONCENTRATION_PERCENT: u32 = 40;
/// Minimum errors before a finger or key is singled out
const MIN_FLAGGED_ERRORS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InsightKind {
    HandImbalance,
    RowConcentration,
    WeakFinger,
    ProblemKey,
    Trend,
    General,
}

impl InsightKind {
    /// Lower sorts first
    pub fn priority(&self) -> u8 {
        match self {
            InsightKind::HandImbalance => 1,
            InsightKind::RowConcentration => 2,
            InsightKind::WeakFinger => 3,
            InsightKind::ProblemKey => 4,
            InsightKind::Trend => 5,
            InsightKind::General => 9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
}

impl Insight {
    fn new(kind: InsightKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Rule-based feedback over the heatmap and history.
///
/// Each rule is evaluated independently; results are ordered by priority.
/// When nothing fires, two general tips are returned.
pub fn generate_insights(heatmap: &ErrorHeatmap, history: &ErrorHistory) -> Vec<Insight> {
    let breakdown = heatmap.breakdown();
    let mut insights = Vec::new();

    let left = breakdown.hand(Hand::Left);
    let right = breakdown.hand(Hand::Right);
    if left.percent.abs_diff(right.percent) > HAND_IMBALANCE_POINTS {
        let (weaker, stronger) = if left.percent > right.percent {
            (left, right)
        } else {
            (right, left)
        };
        insights.push(Insight::new(
            InsightKind::HandImbalance,
            "Hand imbalance",
            format!(
                "Your {} hand is stronger: {}% of errors come from your {} hand versus {}%. \
                 Slow down on {}-hand keys.",
                stronger.bucket, weaker.percent, weaker.bucket, stronger.percent, weaker.bucket
            ),
        ));
    }

    for row in breakdown
        .rows
        .iter()
        .filter(|r| r.percent > ROW_CONCENTRATION_PERCENT)
    {
        insights.push(Insight::new(
            InsightKind::RowConcentration,
            format!("{} row struggles", capitalize(&row.bucket.to_string())),
            format!(
                "{}% of your errors are on the {} row. {}",
                row.percent,
                row.bucket,
                row_tip(row.bucket)
            ),
        ));
    }

    if let Some(finger) = single_max(&breakdown.fingers) {
        if finger.count > MIN_FLAGGED_ERRORS {
            insights.push(Insight::new(
                InsightKind::WeakFinger,
                "Weakest finger",
                format!(
                    "Your {} makes the most mistakes ({} errors, {}%). \
                     Practise drills for the keys it covers.",
                    finger.bucket, finger.count, finger.percent
                ),
            ));
        }
    }

    if let Some((key, count)) = heatmap.top_keys(1).first().copied() {
        if count > MIN_FLAGGED_ERRORS {
            insights.push(Insight::new(
                InsightKind::ProblemKey,
                "Most missed key",
                format!("'{}' has been mistyped {} times.", display_key(key), count),
            ));
        }
    }

    let trend = history.trend();
    match trend.trend {
        Trend::Positive => insights.push(Insight::new(
            InsightKind::Trend,
            "Improving",
            format!(
                "Daily errors are down {}% over the last {} days.",
                trend.percentage,
                history.len()
            ),
        )),
        Trend::Negative => insights.push(Insight::new(
            InsightKind::Trend,
            "Errors rising",
            format!(
                "Daily errors are up {}% over the last {} days. Try shorter, slower sessions.",
                trend.percentage,
                history.len()
            ),
        )),
        Trend::Neutral => {}
    }

    if insights.is_empty() {
        insights.push(Insight::new(
            InsightKind::General,
            "Keep practising",
            "Short daily sessions build muscle memory faster than occasional long ones.",
        ));
        insights.push(Insight::new(
            InsightKind::General,
            "Accuracy first",
            "Aim for accuracy before speed; speed follows once the motions are reliable.",
        ));
    }

    insights.sort_by_key(|i| i.kind.priority());
    insights
}

/// The bucket with the highest count, if no other bucket ties it
fn single_max<K: Copy>(shares: &[BucketShare<K>]) -> Option<BucketShare<K>> {
    let max = shares.iter().map(|s| s.count).max()?;
    let mut leaders = shares.iter().filter(|s| s.count == max);
    let leader = leaders.next().copied()?;
    if leaders.next().is_some() {
        return None;
    }
    Some(leader)
}

fn row_tip(row: KeyRow) -> &'static str {
    match row {
        KeyRow::Top => "Practise reaching up from the home row and returning.",
        KeyRow::Home => "Keep your fingers anchored on the home keys.",
        KeyRow::Bottom => "Practise reaching down without lifting your wrists.",
    }
}

/// Printable name for a key, spelling out whitespace
pub fn display_key(key: char) -> String {
    match key {
        ' ' => "space".to_string(),
        '\n' => "enter".to_string(),
        '\t' => "tab".to_string(),
        c => c.to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heatmap::history::ErrorHistoryEntry;
    use chrono::NaiveDate;

    fn history(first: u64, last: u64) -> ErrorHistory {
        ErrorHistory::from_entries(vec![
            ErrorHistoryEntry {
                date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
                count: first,
            },
            ErrorHistoryEntry {
                date: NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
                count: last,
            },
        ])
    }

    fn kinds(insights: &[Insight]) -> Vec<InsightKind> {
        insights.iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_fallbacks_when_nothing_fires() {
        let insights = generate_insights(&ErrorHeatmap::new(), &ErrorHistory::new());
        assert_eq!(kinds(&insights), vec![InsightKind::General, InsightKind::General]);
    }

    #[test]
    fn test_hand_imbalance_names_hands() {
        // all left hand, spread across rows and fingers
        let heatmap = ErrorHeatmap::from_counts([('q', 1), ('s', 1), ('c', 1), ('f', 1)]);
        let insights = generate_insights(&heatmap, &ErrorHistory::new());
        let hand = insights
            .iter()
            .find(|i| i.kind == InsightKind::HandImbalance)
            .unwrap();
        assert!(hand.message.starts_with("Your right hand is stronger"));
        assert!(hand.message.contains("100% of errors come from your left hand"));
    }

    #[test]
    fn test_row_concentration() {
        // home row 6/10, balanced hands
        let heatmap = ErrorHeatmap::from_counts([('a', 3), (';', 3), ('q', 2), ('p', 2)]);
        let insights = generate_insights(&heatmap, &ErrorHistory::new());
        let rows: Vec<_> = insights
            .iter()
            .filter(|i| i.kind == InsightKind::RowConcentration)
            .collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Home row struggles");
        assert!(rows[0].message.starts_with("60%"));
    }

    #[test]
    fn test_weak_finger_requires_unique_max_above_five() {
        let heatmap = ErrorHeatmap::from_counts([('e', 6), ('i', 2)]);
        let insights = generate_insights(&heatmap, &ErrorHistory::new());
        assert!(insights
            .iter()
            .any(|i| i.kind == InsightKind::WeakFinger && i.message.contains("left middle")));

        let tied = ErrorHeatmap::from_counts([('e', 6), ('i', 6)]);
        let insights = generate_insights(&tied, &ErrorHistory::new());
        assert!(!insights.iter().any(|i| i.kind == InsightKind::WeakFinger));

        let few = ErrorHeatmap::from_counts([('e', 5), ('i', 1)]);
        let insights = generate_insights(&few, &ErrorHistory::new());
        assert!(!insights.iter().any(|i| i.kind == InsightKind::WeakFinger));
    }

    #[test]
    fn test_trend_insights() {
        let insights = generate_insights(&ErrorHeatmap::new(), &history(10, 4));
        assert_eq!(kinds(&insights), vec![InsightKind::Trend]);
        assert!(insights[0].message.contains("down 60%"));

        let insights = generate_insights(&ErrorHeatmap::new(), &history(4, 10));
        assert_eq!(insights[0].title, "Errors rising");
    }

    #[test]
    fn test_insights_sorted_by_priority() {
        let heatmap = ErrorHeatmap::from_counts([('q', 9), ('a', 1), ('z', 1)]);
        let insights = generate_insights(&heatmap, &history(10, 2));
        let k = kinds(&insights);
        let mut sorted = k.clone();
        sorted.sort_by_key(|k| k.priority());
        assert_eq!(k, sorted);
        assert_eq!(k.first(), Some(&InsightKind::HandImbalance));
        assert_eq!(k.last(), Some(&InsightKind::Trend));
        assert!(!k.contains(&InsightKind::General));
    }

    #[test]
    fn test_problem_key_display() {
        let heatmap = ErrorHeatmap::from_counts([(' ', 8)]);
        let insights = generate_insights(&heatmap, &ErrorHistory::new());
        let key = insights
            .iter()
            .find(|i| i.kind == InsightKind::ProblemKey)
            .unwrap();
        assert_eq!(key.message, "'space' has been mistyped 8 times.");
    }
}
