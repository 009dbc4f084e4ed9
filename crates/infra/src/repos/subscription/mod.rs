mod inmemory;
mod postgres;

pub use inmemory::InMemorySubscriptionRepo;
pub use postgres::PostgresSubscriptionRepo;
use subtrack_domain::{Subscription, ID};

/// Read access to the subscription record store. Writes are owned by the
/// CRUD layer and only exposed here for seeding and status changes.
#[async_trait::async_trait]
pub trait ISubscriptionRepo: Send + Sync {
    async fn insert(&self, subscription: &Subscription) -> anyhow::Result<()>;
    async fn save(&self, subscription: &Subscription) -> anyhow::Result<()>;
    /// Finds a subscription together with its owner. A storage failure is an
    /// error, a missing record is `Ok(None)`.
    async fn find(&self, subscription_id: &ID) -> anyhow::Result<Option<Subscription>>;
}

#[cfg(test)]
mod tests {
    use crate::SubtrackContext;
    use chrono::{Duration, TimeZone, Utc};
    use subtrack_domain::{
        Category, Currency, Frequency, Subscription, SubscriptionOwner, SubscriptionStatus, ID,
    };

    fn subscription() -> Subscription {
        let start_date = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Subscription {
            id: Default::default(),
            name: "Gym".into(),
            price: 30.0,
            currency: Currency::Usd,
            frequency: Frequency::Monthly,
            category: Category::Lifestyle,
            payment_method: "Debit card".into(),
            status: SubscriptionStatus::Active,
            start_date,
            renewal_date: start_date + Duration::days(30),
            user: SubscriptionOwner {
                id: Default::default(),
                name: "Linus".into(),
                email: "linus@example.com".into(),
            },
        }
    }

    #[tokio::test]
    async fn crud() {
        let ctx = SubtrackContext::create_inmemory();
        let mut sub = subscription();

        ctx.repos
            .subscriptions
            .insert(&sub)
            .await
            .expect("To insert subscription");
        let found = ctx
            .repos
            .subscriptions
            .find(&sub.id)
            .await
            .expect("Storage to work")
            .expect("To find subscription");
        assert_eq!(found, sub);

        sub.status = SubscriptionStatus::Cancelled;
        ctx.repos
            .subscriptions
            .save(&sub)
            .await
            .expect("To save subscription");
        let found = ctx.repos.subscriptions.find(&sub.id).await.unwrap().unwrap();
        assert_eq!(found.status, SubscriptionStatus::Cancelled);

        assert!(ctx
            .repos
            .subscriptions
            .find(&ID::new())
            .await
            .expect("Storage to work")
            .is_none());
    }
}
