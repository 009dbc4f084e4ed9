use chrono::{DateTime, TimeZone, Utc};
use std::sync::Mutex;

// Mocking out time so that it is possible to run tests that depend on time.
#[async_trait::async_trait]
pub trait ISys: Send + Sync {
    /// The current timestamp in millis
    fn get_timestamp_millis(&self) -> i64;

    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.get_timestamp_millis())
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Suspends the calling task until `at`. Returns immediately when `at`
    /// is not in the future.
    async fn sleep_until(&self, at: DateTime<Utc>);
}

/// System that gets the real time and is used when not testing
pub struct RealSys {}

#[async_trait::async_trait]
impl ISys for RealSys {
    fn get_timestamp_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    async fn sleep_until(&self, at: DateTime<Utc>) {
        // Only a timer is held while sleeping
        if let Ok(duration) = (at - Utc::now()).to_std() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Virtual clock for tests. Time only moves when told to, and sleeping
/// jumps straight to the wake up time.
pub struct ManualSys {
    now: Mutex<DateTime<Utc>>,
}

impl ManualSys {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.lock();
        *now = *now + by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.now.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait::async_trait]
impl ISys for ManualSys {
    fn get_timestamp_millis(&self) -> i64 {
        self.lock().timestamp_millis()
    }

    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }

    async fn sleep_until(&self, at: DateTime<Utc>) {
        let mut now = self.lock();
        if at > *now {
            *now = at;
        }
    }
}
