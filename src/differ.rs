/// Classification of one target position against the typed buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CharState {
    Neutral,
    Correct,
    Incorrect,
    Current,
}

/// Classifies every position of `target` against the full typed buffer.
///
/// The result always has `target.len()` entries. Typed characters past the end
/// of the target are ignored. At most one entry is `Current`, and only while
/// `running` and the buffer is shorter than the target.
pub fn diff(target: &[char], typed: &[char], running: bool) -> Vec<CharState> {
    let typed_len = typed.len().min(target.len());

    target
        .iter()
        .enumerate()
        .map(|(idx, expected)| {
            if idx < typed_len {
                if typed[idx] == *expected {
                    CharState::Correct
                } else {
                    CharState::Incorrect
                }
            } else if idx == typed_len && running {
                CharState::Current
            } else {
                CharState::Neutral
            }
        })
        .collect()
}

/// Convenience over [`diff`] for string inputs
pub fn diff_str(target: &str, typed: &str, running: bool) -> Vec<CharState> {
    let target: Vec<char> = target.chars().collect();
    let typed: Vec<char> = typed.chars().collect();
    diff(&target, &typed, running)
}

pub fn current_index(states: &[CharState]) -> Option<usize> {
    states.iter().position(|s| *s == CharState::Current)
}

pub fn count(states: &[CharState], state: CharState) -> usize {
    states.iter().filter(|s| **s == state).count()
}

/// True once the buffer covers the whole target (including an empty target)
pub fn is_complete(target_len: usize, typed_len: usize) -> bool {
    typed_len >= target_len
}
