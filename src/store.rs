use async_trait::async_trait;

use crate::error::FocusResult;
use crate::models::{CheckinOutcome, Intervention, InterventionId, Student, StudentId};

/// Storage seam for the focus-mode operations.
///
/// Every mutating method is a single unit of work: either all of its rows
/// change or none do, and the affected student row is serialised against
/// concurrent writers for the duration.
#[async_trait]
pub trait FocusStore: Send + Sync {
    async fn fetch_student(&self, id: StudentId) -> FocusResult<Option<Student>>;

    async fn fetch_intervention(&self, id: InterventionId) -> FocusResult<Option<Intervention>>;

    /// Appends a daily log and moves the student to `normal` or `locked`.
    ///
    /// Fails with `NotFound` for an unknown student and with `InvalidState`
    /// unless the student is currently `normal`.
    async fn record_checkin(
        &self,
        student_id: StudentId,
        quiz_score: i32,
        focus_minutes: i32,
        outcome: CheckinOutcome,
    ) -> FocusResult<()>;

    /// Creates an `assigned` intervention for the locked student with the
    /// highest id and moves that student to `remedial`.
    async fn assign_to_latest_locked(
        &self,
        title: &str,
        description: &str,
    ) -> FocusResult<StudentId>;

    /// Completes the student's active intervention and returns them to `normal`.
    async fn complete_active(&self, student_id: StudentId) -> FocusResult<()>;
}
