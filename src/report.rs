use std::fmt::Write;

use chrono::{Duration, NaiveDate, Utc};

use crate::models::{DailyLog, Intervention, InterventionStatus, StudentState};

#[derive(Debug, Clone, PartialEq)]
pub struct CheckinSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
    /// Consecutive passes counted back from the newest log.
    pub current_streak: usize,
}

pub fn cutoff_date(since_days: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(since_days.max(1))
}

/// `logs` must be ordered newest first.
pub fn summarize(logs: &[DailyLog]) -> CheckinSummary {
    let passed = logs.iter().filter(|log| log.status.passed()).count();
    let total = logs.len();

    CheckinSummary {
        total,
        passed,
        failed: total - passed,
        pass_rate: if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64
        },
        current_streak: logs.iter().take_while(|log| log.status.passed()).count(),
    }
}

pub fn build_report(
    state: &StudentState,
    since_days: i64,
    cutoff: NaiveDate,
    logs: &[DailyLog],
    interventions: &[Intervention],
) -> String {
    let summary = summarize(logs);
    let mut output = String::new();

    let _ = writeln!(output, "# Focus Mode Check-in Report");
    let _ = writeln!(
        output,
        "Generated for {} (#{}) covering {} days (check-ins since {})",
        state.name, state.id, since_days, cutoff
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "Current status: **{}**", state.status);
    if let Some(intervention) = &state.intervention {
        let _ = writeln!(output, "Active task: {}", intervention.title);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Check-in Summary");
    if summary.total == 0 {
        let _ = writeln!(output, "No check-ins recorded for this window.");
    } else {
        let _ = writeln!(
            output,
            "- {} check-ins: {} passed, {} failed ({:.0}% pass rate)",
            summary.total,
            summary.passed,
            summary.failed,
            summary.pass_rate * 100.0
        );
        let _ = writeln!(output, "- Current passing streak: {}", summary.current_streak);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Check-ins");
    if logs.is_empty() {
        let _ = writeln!(output, "No check-ins recorded for this window.");
    } else {
        for log in logs.iter().take(7) {
            let _ = writeln!(
                output,
                "- {}: quiz {}/10, {} focus minutes ({})",
                log.created_at.format("%Y-%m-%d %H:%M"),
                log.quiz_score,
                log.focus_minutes,
                log.status
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Interventions");
    if interventions.is_empty() {
        let _ = writeln!(output, "No interventions assigned.");
    } else {
        let completed = interventions
            .iter()
            .filter(|intervention| intervention.status == InterventionStatus::Completed)
            .count();
        let _ = writeln!(
            output,
            "{} assigned, {} completed.",
            interventions.len(),
            completed
        );
        for intervention in interventions {
            let _ = writeln!(
                output,
                "- {} ({}): {}",
                intervention.title, intervention.status, intervention.description
            );
        }
    }

    output
}
