use std::sync::Arc;

use crate::checkin;
use crate::error::{FocusError, FocusResult};
use crate::models::{FailureAlert, StudentId, StudentState};
use crate::notify::FailureNotifier;
use crate::store::FocusStore;

pub const DEFAULT_TASK_DESCRIPTION: &str = "Check email for details";

/// The four focus-mode operations over a store and a dispatcher notifier.
pub struct FocusService<S> {
    store: S,
    notifier: Arc<dyn FailureNotifier>,
}

impl<S: FocusStore> FocusService<S> {
    pub fn new(store: S, notifier: Arc<dyn FailureNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Composite state for one student. Read-only.
    pub async fn get_state(&self, student_id: StudentId) -> FocusResult<StudentState> {
        let student = self
            .store
            .fetch_student(student_id)
            .await?
            .ok_or(FocusError::NotFound(student_id))?;

        let intervention = match student.current_intervention_id {
            Some(intervention_id) => Some(
                self.store
                    .fetch_intervention(intervention_id)
                    .await?
                    .ok_or(FocusError::DanglingIntervention {
                        student_id,
                        intervention_id,
                    })?,
            ),
            None => None,
        };

        Ok(StudentState::new(student, intervention))
    }

    pub async fn submit_daily_checkin(
        &self,
        student_id: StudentId,
        quiz_score: i32,
        focus_minutes: i32,
    ) -> FocusResult<StudentState> {
        checkin::validate(quiz_score, focus_minutes)?;
        let outcome = checkin::evaluate(quiz_score, focus_minutes);

        self.store
            .record_checkin(student_id, quiz_score, focus_minutes, outcome)
            .await?;
        tracing::info!(student_id, quiz_score, focus_minutes, %outcome, "daily check-in recorded");

        if !outcome.passed() {
            tracing::info!(student_id, "student locked after failed check-in");
            self.notifier.notify(FailureAlert {
                student_id,
                quiz_score,
                focus_minutes,
            });
        }

        self.get_state(student_id).await
    }

    /// Attaches a task to the most recently created locked student.
    pub async fn assign_intervention(
        &self,
        task_title: &str,
        task_description: Option<&str>,
    ) -> FocusResult<StudentState> {
        let title = task_title.trim();
        if title.is_empty() {
            return Err(FocusError::Validation("task_title must not be empty".to_string()));
        }
        let description = task_description
            .map(str::trim)
            .filter(|description| !description.is_empty())
            .unwrap_or(DEFAULT_TASK_DESCRIPTION);

        let student_id = self
            .store
            .assign_to_latest_locked(title, description)
            .await?;
        tracing::info!(student_id, title, "intervention assigned");

        self.get_state(student_id).await
    }

    pub async fn complete_intervention(&self, student_id: StudentId) -> FocusResult<StudentState> {
        self.store.complete_active(student_id).await?;
        tracing::info!(student_id, "intervention completed");

        self.get_state(student_id).await
    }
}
