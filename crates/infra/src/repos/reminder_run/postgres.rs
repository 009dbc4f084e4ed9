use super::IReminderRunRepo;
use crate::repos::shared::postgres::{datetime_from_millis, parse_column};
use sqlx::{types::Uuid, FromRow, PgPool};
use subtrack_domain::{ReminderRun, RunStatus, ID};

pub struct PostgresReminderRunRepo {
    pool: PgPool,
}

impl PostgresReminderRunRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReminderRunRaw {
    run_uid: Uuid,
    subscription_uid: Uuid,
    status: String,
    outcome: Option<String>,
    error: Option<String>,
    created: i64,
    updated: i64,
}

impl ReminderRunRaw {
    fn into_domain(self) -> anyhow::Result<ReminderRun> {
        Ok(ReminderRun {
            id: self.run_uid.into(),
            subscription_id: self.subscription_uid.into(),
            status: parse_column("status", &self.status)?,
            outcome: self
                .outcome
                .map(|outcome| parse_column("outcome", &outcome))
                .transpose()?,
            error: self.error,
            created: datetime_from_millis(self.created)?,
            updated: datetime_from_millis(self.updated)?,
        })
    }
}

#[async_trait::async_trait]
impl IReminderRunRepo for PostgresReminderRunRepo {
    async fn insert(&self, run: &ReminderRun) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reminder_runs
            (run_uid, subscription_uid, status, outcome, error, created, updated)
            VALUES($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(run.id.inner_ref())
        .bind(run.subscription_id.inner_ref())
        .bind(run.status.as_str())
        .bind(run.outcome.map(|o| o.as_str()))
        .bind(&run.error)
        .bind(run.created.timestamp_millis())
        .bind(run.updated.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save(&self, run: &ReminderRun) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE reminder_runs
            SET status = $2,
            outcome = $3,
            error = $4,
            updated = $5
            WHERE run_uid = $1
            "#,
        )
        .bind(run.id.inner_ref())
        .bind(run.status.as_str())
        .bind(run.outcome.map(|o| o.as_str()))
        .bind(&run.error)
        .bind(run.updated.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, run_id: &ID) -> anyhow::Result<Option<ReminderRun>> {
        let raw: Option<ReminderRunRaw> = sqlx::query_as(
            r#"
            SELECT * FROM reminder_runs AS r
            WHERE r.run_uid = $1
            "#,
        )
        .bind(run_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        raw.map(|raw| raw.into_domain()).transpose()
    }

    async fn find_by_status(&self, status: RunStatus) -> anyhow::Result<Vec<ReminderRun>> {
        let raws: Vec<ReminderRunRaw> = sqlx::query_as(
            r#"
            SELECT * FROM reminder_runs AS r
            WHERE r.status = $1
            ORDER BY r.created
            "#,
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        raws.into_iter().map(|raw| raw.into_domain()).collect()
    }
}
