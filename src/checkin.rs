use crate::error::{FocusError, FocusResult};
use crate::models::CheckinOutcome;

pub const PASSING_QUIZ_SCORE: i32 = 7;
pub const PASSING_FOCUS_MINUTES: i32 = 60;

pub const MAX_QUIZ_SCORE: i32 = 10;
pub const MAX_FOCUS_MINUTES: i32 = 24 * 60;

/// Both thresholds are exclusive: a score of exactly 7 or exactly 60 minutes fails.
pub fn evaluate(quiz_score: i32, focus_minutes: i32) -> CheckinOutcome {
    if quiz_score > PASSING_QUIZ_SCORE && focus_minutes > PASSING_FOCUS_MINUTES {
        CheckinOutcome::Success
    } else {
        CheckinOutcome::Failed
    }
}

pub fn validate(quiz_score: i32, focus_minutes: i32) -> FocusResult<()> {
    if !(0..=MAX_QUIZ_SCORE).contains(&quiz_score) {
        return Err(FocusError::Validation(format!(
            "quiz_score must be between 0 and {MAX_QUIZ_SCORE}, got {quiz_score}"
        )));
    }
    if !(0..=MAX_FOCUS_MINUTES).contains(&focus_minutes) {
        return Err(FocusError::Validation(format!(
            "focus_minutes must be between 0 and {MAX_FOCUS_MINUTES}, got {focus_minutes}"
        )));
    }
    Ok(())
}
