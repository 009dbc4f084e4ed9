use super::ISubscriptionRepo;
use crate::repos::shared::postgres::{datetime_from_millis, parse_column};
use sqlx::{types::Uuid, FromRow, PgPool};
use subtrack_domain::{Subscription, SubscriptionOwner, ID};

pub struct PostgresSubscriptionRepo {
    pool: PgPool,
}

impl PostgresSubscriptionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SubscriptionRaw {
    subscription_uid: Uuid,
    user_uid: Uuid,
    user_name: String,
    user_email: String,
    name: String,
    price: f64,
    currency: String,
    frequency: String,
    category: String,
    payment_method: String,
    status: String,
    start_date: i64,
    renewal_date: i64,
}

impl SubscriptionRaw {
    fn into_domain(self) -> anyhow::Result<Subscription> {
        Ok(Subscription {
            id: self.subscription_uid.into(),
            name: self.name,
            price: self.price,
            currency: parse_column("currency", &self.currency)?,
            frequency: parse_column("frequency", &self.frequency)?,
            category: parse_column("category", &self.category)?,
            payment_method: self.payment_method,
            status: parse_column("status", &self.status)?,
            start_date: datetime_from_millis(self.start_date)?,
            renewal_date: datetime_from_millis(self.renewal_date)?,
            user: SubscriptionOwner {
                id: self.user_uid.into(),
                name: self.user_name,
                email: self.user_email,
            },
        })
    }
}

#[async_trait::async_trait]
impl ISubscriptionRepo for PostgresSubscriptionRepo {
    async fn insert(&self, subscription: &Subscription) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO users(user_uid, name, email)
            VALUES($1, $2, $3)
            ON CONFLICT (user_uid) DO UPDATE
            SET name = EXCLUDED.name,
            email = EXCLUDED.email
            "#,
        )
        .bind(subscription.user.id.inner_ref())
        .bind(&subscription.user.name)
        .bind(&subscription.user.email)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions
            (subscription_uid, user_uid, name, price, currency, frequency, category, payment_method, status, start_date, renewal_date)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(subscription.id.inner_ref())
        .bind(subscription.user.id.inner_ref())
        .bind(&subscription.name)
        .bind(subscription.price)
        .bind(subscription.currency.as_str())
        .bind(subscription.frequency.as_str())
        .bind(subscription.category.as_str())
        .bind(&subscription.payment_method)
        .bind(subscription.status.as_str())
        .bind(subscription.start_date.timestamp_millis())
        .bind(subscription.renewal_date.timestamp_millis())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn save(&self, subscription: &Subscription) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET name = $2,
            price = $3,
            currency = $4,
            frequency = $5,
            category = $6,
            payment_method = $7,
            status = $8,
            start_date = $9,
            renewal_date = $10
            WHERE subscription_uid = $1
            "#,
        )
        .bind(subscription.id.inner_ref())
        .bind(&subscription.name)
        .bind(subscription.price)
        .bind(subscription.currency.as_str())
        .bind(subscription.frequency.as_str())
        .bind(subscription.category.as_str())
        .bind(&subscription.payment_method)
        .bind(subscription.status.as_str())
        .bind(subscription.start_date.timestamp_millis())
        .bind(subscription.renewal_date.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, subscription_id: &ID) -> anyhow::Result<Option<Subscription>> {
        let raw: Option<SubscriptionRaw> = sqlx::query_as(
            r#"
            SELECT s.*, u.name AS user_name, u.email AS user_email FROM subscriptions AS s
            INNER JOIN users AS u ON u.user_uid = s.user_uid
            WHERE s.subscription_uid = $1
            "#,
        )
        .bind(subscription_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        raw.map(|raw| raw.into_domain()).transpose()
    }
}
