use crate::session::{Difficulty, SessionResult};

/// Longest test duration that still earns a time bonus
const TIME_BONUS_CAP_SECS: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum_macros::Display)]
pub enum Grade {
    #[strum(serialize = "F")]
    F,
    #[strum(serialize = "D")]
    D,
    #[strum(serialize = "C")]
    C,
    #[strum(serialize = "C+")]
    CPlus,
    #[strum(serialize = "B")]
    B,
    #[strum(serialize = "B+")]
    BPlus,
    #[strum(serialize = "A")]
    A,
    #[strum(serialize = "A+")]
    APlus,
    #[strum(serialize = "S")]
    S,
    #[strum(serialize = "S+")]
    SPlus,
}

/// Lower bounds, highest first; the first match wins
const GRADE_THRESHOLDS: [(u32, Grade); 9] = [
    (200, Grade::SPlus),
    (175, Grade::S),
    (150, Grade::APlus),
    (125, Grade::A),
    (100, Grade::BPlus),
    (80, Grade::B),
    (60, Grade::CPlus),
    (40, Grade::C),
    (30, Grade::D),
];

/// Coarse grade bucket, used for colouring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeCategory {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl GradeCategory {
    /// Derived from the first letter of the grade text only
    pub fn from_grade_str(grade: &str) -> Self {
        match grade.chars().next() {
            Some('S') => GradeCategory::S,
            Some('A') => GradeCategory::A,
            Some('B') => GradeCategory::B,
            Some('C') => GradeCategory::C,
            Some('D') => GradeCategory::D,
            _ => GradeCategory::F,
        }
    }
}

impl Grade {
    pub fn category(&self) -> GradeCategory {
        GradeCategory::from_grade_str(&self.to_string())
    }
}

pub fn difficulty_multiplier(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Beginner => 0.8,
        Difficulty::Intermediate => 1.0,
        Difficulty::Advanced => 1.2,
        Difficulty::Expert => 1.4,
        Difficulty::Code => 1.5,
        Difficulty::Unrecognized => 1.0,
    }
}

pub fn accuracy_multiplier(accuracy: f64) -> f64 {
    (accuracy / 100.0).clamp(0.5, 1.2)
}

pub fn time_multiplier(time_secs: f64) -> f64 {
    1.0 + time_secs.clamp(0.0, TIME_BONUS_CAP_SECS) / 600.0
}

/// Composite score combining speed, accuracy, difficulty and duration
pub fn score(result: &SessionResult) -> u32 {
    if !(result.wpm > 0.0) {
        return 0;
    }

    let raw = result.wpm
        * accuracy_multiplier(result.accuracy)
        * difficulty_multiplier(result.difficulty)
        * time_multiplier(result.time);

    raw.round() as u32
}

pub fn grade(score: u32) -> Grade {
    GRADE_THRESHOLDS
        .iter()
        .find(|(min, _)| score >= *min)
        .map(|(_, grade)| *grade)
        .unwrap_or(Grade::F)
}

/// How a finished result stands against earlier results of the same difficulty
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestComparison {
    pub previous_best_wpm: Option<f64>,
    pub is_new_best: bool,
    /// 1-based position by wpm among same-difficulty results, this one included
    pub rank: usize,
}

pub fn compare_to_bests(result: &SessionResult, history: &[SessionResult]) -> BestComparison {
    let previous_best_wpm = history
        .iter()
        .filter(|r| r.difficulty == result.difficulty)
        .map(|r| r.wpm)
        .fold(None, |best: Option<f64>, wpm| Some(best.map_or(wpm, |b| b.max(wpm))));

    let is_new_best = previous_best_wpm.map_or(result.wpm > 0.0, |best| result.wpm > best);

    let rank = history
        .iter()
        .filter(|r| r.difficulty == result.difficulty && r.wpm > result.wpm)
        .count()
        + 1;

    BestComparison {
        previous_best_wpm,
        is_new_best,
        rank,
    }
}
