use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::{FocusError, FocusResult};
use crate::models::{
    CheckinOutcome, DailyLog, Intervention, InterventionId, InterventionStatus, Student, StudentId,
    StudentStatus, UnknownVariant,
};
use crate::store::FocusStore;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let students = vec![(1, "Jordan Rivera"), (2, "Avery Lee"), (3, "Kiara Patel")];

    for (id, name) in students {
        upsert_student(pool, id, name).await?;
    }
    sync_student_sequence(pool).await?;

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        id: StudentId,
        name: String,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut upserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let name = row.name.trim();
        if name.is_empty() {
            anyhow::bail!("student {} has an empty name", row.id);
        }
        if upsert_student(pool, row.id, name).await? {
            upserted += 1;
        }
    }
    sync_student_sequence(pool).await?;

    Ok(upserted)
}

async fn upsert_student(pool: &PgPool, id: StudentId, name: &str) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO focus_mode.students (id, name)
        VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name
        "#,
    )
    .bind(id)
    .bind(name)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Explicit ids bypass the serial sequence, so point it at the id after the highest one.
async fn sync_student_sequence(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        SELECT setval(
            pg_get_serial_sequence('focus_mode.students', 'id'),
            COALESCE(MAX(id), 0) + 1,
            false
        )
        FROM focus_mode.students
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn fetch_daily_logs(
    pool: &PgPool,
    student_id: StudentId,
    since_date: NaiveDate,
) -> anyhow::Result<Vec<DailyLog>> {
    let rows = sqlx::query(
        r#"
        SELECT quiz_score, focus_minutes, status, created_at
        FROM focus_mode.daily_logs
        WHERE student_id = $1 AND created_at >= $2::date
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(student_id)
    .bind(since_date)
    .fetch_all(pool)
    .await?;

    let mut logs = Vec::with_capacity(rows.len());
    for row in rows {
        logs.push(DailyLog {
            quiz_score: row.try_get("quiz_score")?,
            focus_minutes: row.try_get("focus_minutes")?,
            status: decode_text(&row, "status")?,
            created_at: row.try_get("created_at")?,
        });
    }

    Ok(logs)
}

pub async fn fetch_intervention_history(
    pool: &PgPool,
    student_id: StudentId,
) -> anyhow::Result<Vec<Intervention>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, description, status
        FROM focus_mode.interventions
        WHERE student_id = $1
        ORDER BY id DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    let mut interventions = Vec::with_capacity(rows.len());
    for row in &rows {
        interventions.push(intervention_from_row(row)?);
    }
    Ok(interventions)
}

fn decode_text<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = UnknownVariant>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

fn student_from_row(row: &PgRow) -> Result<Student, sqlx::Error> {
    Ok(Student {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        status: decode_text(row, "status")?,
        current_intervention_id: row.try_get("current_intervention_id")?,
    })
}

fn intervention_from_row(row: &PgRow) -> Result<Intervention, sqlx::Error> {
    Ok(Intervention {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: decode_text(row, "status")?,
    })
}

/// Postgres-backed [`FocusStore`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FocusStore for PgStore {
    async fn fetch_student(&self, id: StudentId) -> FocusResult<Option<Student>> {
        let row = sqlx::query(
            "SELECT id, name, status, current_intervention_id FROM focus_mode.students WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(student_from_row).transpose()?)
    }

    async fn fetch_intervention(&self, id: InterventionId) -> FocusResult<Option<Intervention>> {
        let row = sqlx::query(
            "SELECT id, title, description, status FROM focus_mode.interventions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(intervention_from_row).transpose()?)
    }

    async fn record_checkin(
        &self,
        student_id: StudentId,
        quiz_score: i32,
        focus_minutes: i32,
        outcome: CheckinOutcome,
    ) -> FocusResult<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT status FROM focus_mode.students WHERE id = $1 FOR UPDATE")
            .bind(student_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(FocusError::NotFound(student_id))?;
        let status: StudentStatus = decode_text(&row, "status")?;
        if status != StudentStatus::Normal {
            return Err(FocusError::InvalidState(format!(
                "check-ins are closed while {status}"
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO focus_mode.daily_logs (student_id, quiz_score, focus_minutes, status)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(student_id)
        .bind(quiz_score)
        .bind(focus_minutes)
        .bind(outcome.as_str())
        .execute(&mut *tx)
        .await?;

        let next = if outcome.passed() {
            StudentStatus::Normal
        } else {
            StudentStatus::Locked
        };
        sqlx::query("UPDATE focus_mode.students SET status = $1 WHERE id = $2")
            .bind(next.as_str())
            .bind(student_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn assign_to_latest_locked(
        &self,
        title: &str,
        description: &str,
    ) -> FocusResult<StudentId> {
        let mut tx = self.pool.begin().await?;

        // A row that leaves `locked` while we wait on it is re-evaluated by Postgres
        // under FOR UPDATE and skipped, so the status needs no second check.
        let student_id: StudentId = sqlx::query(
            r#"
            SELECT id FROM focus_mode.students
            WHERE status = $1
            ORDER BY id DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(StudentStatus::Locked.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(FocusError::NoLockedStudent)?
        .try_get("id")?;

        let intervention_id: InterventionId = sqlx::query(
            r#"
            INSERT INTO focus_mode.interventions (student_id, title, description, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(student_id)
        .bind(title)
        .bind(description)
        .bind(InterventionStatus::Assigned.as_str())
        .fetch_one(&mut *tx)
        .await?
        .try_get("id")?;

        sqlx::query(
            "UPDATE focus_mode.students SET status = $1, current_intervention_id = $2 WHERE id = $3",
        )
        .bind(StudentStatus::Remedial.as_str())
        .bind(intervention_id)
        .bind(student_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(student_id)
    }

    async fn complete_active(&self, student_id: StudentId) -> FocusResult<()> {
        let mut tx = self.pool.begin().await?;

        let intervention_id: Option<InterventionId> = sqlx::query(
            "SELECT current_intervention_id FROM focus_mode.students WHERE id = $1 FOR UPDATE",
        )
        .bind(student_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(FocusError::NotFound(student_id))?
        .try_get("current_intervention_id")?;
        let intervention_id = intervention_id.ok_or_else(FocusError::no_active_intervention)?;

        sqlx::query("UPDATE focus_mode.interventions SET status = $1 WHERE id = $2")
            .bind(InterventionStatus::Completed.as_str())
            .bind(intervention_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE focus_mode.students SET status = $1, current_intervention_id = NULL WHERE id = $2",
        )
        .bind(StudentStatus::Normal.as_str())
        .bind(student_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
