use thiserror::Error;

use crate::models::{InterventionId, StudentId};

/// Failures surfaced by the focus-mode operations.
#[derive(Debug, Error)]
pub enum FocusError {
    #[error("student {0} not found")]
    NotFound(StudentId),

    #[error("no locked student found")]
    NoLockedStudent,

    #[error("{0}")]
    InvalidState(String),

    #[error("invalid input: {0}")]
    Validation(String),

    /// The student points at an intervention row that does not exist.
    #[error("student {student_id} references missing intervention {intervention_id}")]
    DanglingIntervention {
        student_id: StudentId,
        intervention_id: InterventionId,
    },

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl FocusError {
    pub fn no_active_intervention() -> Self {
        Self::InvalidState("no active intervention".to_string())
    }

    /// Stable identifier sent to clients alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::NoLockedStudent => "no_locked_student",
            Self::InvalidState(_) => "invalid_state",
            Self::Validation(_) => "validation",
            Self::DanglingIntervention { .. } | Self::Store(_) => "server_error",
        }
    }

    /// Whether the failure is the caller's to fix rather than ours.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::DanglingIntervention { .. } | Self::Store(_))
    }
}

pub type FocusResult<T> = Result<T, FocusError>;
