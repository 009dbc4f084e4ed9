use super::ISubscriptionRepo;
use crate::repos::shared::inmemory_repo::*;
use std::sync::Mutex;
use subtrack_domain::{Subscription, ID};

pub struct InMemorySubscriptionRepo {
    subscriptions: Mutex<Vec<Subscription>>,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self {
            subscriptions: Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl ISubscriptionRepo for InMemorySubscriptionRepo {
    async fn insert(&self, subscription: &Subscription) -> anyhow::Result<()> {
        insert(subscription, &self.subscriptions);
        Ok(())
    }

    async fn save(&self, subscription: &Subscription) -> anyhow::Result<()> {
        save(subscription, &self.subscriptions);
        Ok(())
    }

    async fn find(&self, subscription_id: &ID) -> anyhow::Result<Option<Subscription>> {
        Ok(find(subscription_id, &self.subscriptions))
    }
}
