use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type StudentId = i32;
pub type InterventionId = i32;

/// Where a student sits in the check-in lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    /// Free to submit daily check-ins.
    Normal,
    /// Failed the last check-in, waiting for the dispatcher to assign a task.
    Locked,
    /// Has an assigned task that must be completed.
    Remedial,
}

impl StudentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Locked => "locked",
            Self::Remedial => "remedial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckinOutcome {
    Success,
    Failed,
}

impl CheckinOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn passed(self) -> bool {
        matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterventionStatus {
    Assigned,
    Completed,
}

impl InterventionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognised {kind} value {value:?}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

macro_rules! text_enum {
    ($ty:ty, $kind:literal, [$($variant:ident),+]) => {
        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                $(
                    if value == Self::$variant.as_str() {
                        return Ok(Self::$variant);
                    }
                )+
                Err(UnknownVariant {
                    kind: $kind,
                    value: value.to_string(),
                })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(StudentStatus, "student status", [Normal, Locked, Remedial]);
text_enum!(CheckinOutcome, "check-in status", [Success, Failed]);
text_enum!(InterventionStatus, "intervention status", [Assigned, Completed]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub status: StudentStatus,
    pub current_intervention_id: Option<InterventionId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Intervention {
    pub id: InterventionId,
    pub title: String,
    pub description: String,
    pub status: InterventionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyLog {
    pub quiz_score: i32,
    pub focus_minutes: i32,
    pub status: CheckinOutcome,
    pub created_at: DateTime<Utc>,
}

/// A student's profile merged with its active intervention, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentState {
    pub id: StudentId,
    pub name: String,
    pub status: StudentStatus,
    pub current_intervention_id: Option<InterventionId>,
    pub intervention: Option<Intervention>,
}

impl StudentState {
    pub fn new(student: Student, intervention: Option<Intervention>) -> Self {
        Self {
            id: student.id,
            name: student.name,
            status: student.status,
            current_intervention_id: student.current_intervention_id,
            intervention,
        }
    }
}

/// Payload sent to the dispatcher when a check-in fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FailureAlert {
    pub student_id: StudentId,
    pub quiz_score: i32,
    pub focus_minutes: i32,
}
