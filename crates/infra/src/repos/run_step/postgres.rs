use super::IRunStepRepo;
use crate::repos::shared::postgres::datetime_from_millis;
use sqlx::{types::Uuid, FromRow, PgPool};
use subtrack_domain::{RunStep, RunStepState, ID};

pub struct PostgresRunStepRepo {
    pool: PgPool,
}

impl PostgresRunStepRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RunStepRaw {
    run_uid: Uuid,
    step_name: String,
    state: serde_json::Value,
    created: i64,
    updated: i64,
}

impl RunStepRaw {
    fn into_domain(self) -> anyhow::Result<RunStep> {
        let state: RunStepState = serde_json::from_value(self.state)?;
        Ok(RunStep {
            run_id: self.run_uid.into(),
            name: self.step_name,
            state,
            created: datetime_from_millis(self.created)?,
            updated: datetime_from_millis(self.updated)?,
        })
    }
}

#[async_trait::async_trait]
impl IRunStepRepo for PostgresRunStepRepo {
    async fn upsert(&self, step: &RunStep) -> anyhow::Result<()> {
        let state = serde_json::to_value(&step.state)?;
        sqlx::query(
            r#"
            INSERT INTO reminder_run_steps
            (run_uid, step_name, state, created, updated)
            VALUES($1, $2, $3, $4, $5)
            ON CONFLICT (run_uid, step_name) DO UPDATE
            SET state = EXCLUDED.state,
            updated = EXCLUDED.updated
            "#,
        )
        .bind(step.run_id.inner_ref())
        .bind(&step.name)
        .bind(state)
        .bind(step.created.timestamp_millis())
        .bind(step.updated.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, run_id: &ID, name: &str) -> anyhow::Result<Option<RunStep>> {
        let raw: Option<RunStepRaw> = sqlx::query_as(
            r#"
            SELECT * FROM reminder_run_steps AS s
            WHERE s.run_uid = $1 AND s.step_name = $2
            "#,
        )
        .bind(run_id.inner_ref())
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        raw.map(|raw| raw.into_domain()).transpose()
    }

    async fn find_by_run(&self, run_id: &ID) -> anyhow::Result<Vec<RunStep>> {
        let raws: Vec<RunStepRaw> = sqlx::query_as(
            r#"
            SELECT * FROM reminder_run_steps AS s
            WHERE s.run_uid = $1
            ORDER BY s.created, s.step_order
            "#,
        )
        .bind(run_id.inner_ref())
        .fetch_all(&self.pool)
        .await?;

        raws.into_iter().map(|raw| raw.into_domain()).collect()
    }
}
