use crate::models::Level;

pub const QUESTION_COUNT: i32 = 8;
pub const MIN_SCORE: i32 = QUESTION_COUNT;
pub const MAX_SCORE: i32 = QUESTION_COUNT * 4;

/// Highest score that still maps to `Beginner`
pub const BEGINNER_MAX_SCORE: i32 = 14;
/// Highest score that still maps to `Intermediate`
pub const INTERMEDIATE_MAX_SCORE: i32 = 23;

pub fn is_valid_score(score: i32) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&score)
}

/// Fitness level for a questionnaire score in `MIN_SCORE..=MAX_SCORE`
pub fn level_for_score(score: i32) -> Level {
    if score <= BEGINNER_MAX_SCORE {
        Level::Beginner
    } else if score <= INTERMEDIATE_MAX_SCORE {
        Level::Intermediate
    } else {
        Level::Advanced
    }
}
