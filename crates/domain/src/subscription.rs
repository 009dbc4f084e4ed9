use crate::{
    date::is_before_day,
    shared::entity::{Entity, ID},
};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            _ => Err(anyhow::anyhow!("Unknown subscription status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// Length of one billing period, used when no renewal date is given
    pub fn renewal_period(&self) -> Duration {
        let days = match self {
            Self::Daily => 1,
            Self::Weekly => 7,
            Self::Monthly => 30,
            Self::Quarterly => 90,
            Self::Yearly => 365,
        };
        Duration::days(days)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Frequency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(anyhow::anyhow!("Unknown subscription frequency: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Inr,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Inr => "INR",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::Usd
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            "INR" => Ok(Self::Inr),
            _ => Err(anyhow::anyhow!("Unknown currency: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Sports,
    News,
    Entertainment,
    Lifestyle,
    Technology,
    Finance,
    Politics,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sports => "sports",
            Self::News => "news",
            Self::Entertainment => "entertainment",
            Self::Lifestyle => "lifestyle",
            Self::Technology => "technology",
            Self::Finance => "finance",
            Self::Politics => "politics",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sports" => Ok(Self::Sports),
            "news" => Ok(Self::News),
            "entertainment" => Ok(Self::Entertainment),
            "lifestyle" => Ok(Self::Lifestyle),
            "technology" => Ok(Self::Technology),
            "finance" => Ok(Self::Finance),
            "politics" => Ok(Self::Politics),
            "other" => Ok(Self::Other),
            _ => Err(anyhow::anyhow!("Unknown subscription category: {}", s)),
        }
    }
}

/// The `User` owning a `Subscription`, projected down to what is
/// needed for addressing reminders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionOwner {
    pub id: ID,
    pub name: String,
    /// Recipient of every reminder for the owner's subscriptions
    pub email: String,
}

/// A recurring paid `Subscription` whose upcoming renewal the owner
/// should be reminded about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: ID,
    pub name: String,
    pub price: f64,
    pub currency: Currency,
    pub frequency: Frequency,
    pub category: Category,
    pub payment_method: String,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub renewal_date: DateTime<Utc>,
    pub user: SubscriptionOwner,
}

#[derive(Error, Debug, PartialEq)]
pub enum InvalidSubscription {
    #[error("Subscription name must be between 2 and 100 characters, got: `{0}`")]
    Name(String),
    #[error("Subscription price must be zero or positive, got: {0}")]
    Price(f64),
    #[error("Subscription payment method is required")]
    PaymentMethod,
    #[error("Renewal date must be after the start date")]
    RenewalBeforeStart,
}

/// Input for creating a `Subscription`. The renewal date and status are
/// derived when building the `Subscription`.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub name: String,
    pub price: f64,
    pub currency: Currency,
    pub frequency: Frequency,
    pub category: Category,
    pub payment_method: String,
    pub start_date: DateTime<Utc>,
    pub renewal_date: Option<DateTime<Utc>>,
    pub user: SubscriptionOwner,
}

impl Subscription {
    /// Builds a `Subscription`, filling in a missing renewal date from the
    /// billing frequency and marking it `Expired` when the renewal day has
    /// already passed at `now`.
    pub fn new(
        input: NewSubscription,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<Self, InvalidSubscription> {
        let renewal_date = input
            .renewal_date
            .unwrap_or_else(|| input.start_date + input.frequency.renewal_period());
        let status = if is_before_day(&renewal_date, &now, tz) {
            SubscriptionStatus::Expired
        } else {
            SubscriptionStatus::Active
        };

        let subscription = Self {
            id: Default::default(),
            name: input.name.trim().to_string(),
            price: input.price,
            currency: input.currency,
            frequency: input.frequency,
            category: input.category,
            payment_method: input.payment_method.trim().to_string(),
            status,
            start_date: input.start_date,
            renewal_date,
            user: input.user,
        };
        subscription.validate()?;

        Ok(subscription)
    }

    pub fn validate(&self) -> Result<(), InvalidSubscription> {
        let name_len = self.name.trim().chars().count();
        if !(2..=100).contains(&name_len) {
            return Err(InvalidSubscription::Name(self.name.clone()));
        }
        if self.price.is_nan() || self.price < 0.0 {
            return Err(InvalidSubscription::Price(self.price));
        }
        if self.payment_method.trim().is_empty() {
            return Err(InvalidSubscription::PaymentMethod);
        }
        if self.renewal_date <= self.start_date {
            return Err(InvalidSubscription::RenewalBeforeStart);
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// Price line shown to the owner, e.g. `USD 9.99 (monthly)`
    pub fn price_description(&self) -> String {
        format!("{} {} ({})", self.currency, self.price, self.frequency)
    }
}

impl Entity<ID> for Subscription {
    fn id(&self) -> ID {
        self.id.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::UTC;

    fn owner() -> SubscriptionOwner {
        SubscriptionOwner {
            id: Default::default(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
        }
    }

    fn input(start_date: DateTime<Utc>, renewal_date: Option<DateTime<Utc>>) -> NewSubscription {
        NewSubscription {
            name: "  Netflix Premium ".into(),
            price: 15.99,
            currency: Currency::Usd,
            frequency: Frequency::Monthly,
            category: Category::Entertainment,
            payment_method: "Credit Card".into(),
            start_date,
            renewal_date,
            user: owner(),
        }
    }

    #[test]
    fn derives_renewal_date_from_frequency() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 10, 0, 0).unwrap();

        let sub = Subscription::new(input(start, None), now, &UTC).expect("Valid subscription");
        assert_eq!(sub.renewal_date, start + Duration::days(30));
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.name, "Netflix Premium");
    }

    #[test]
    fn marks_past_renewals_as_expired() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();

        let sub = Subscription::new(input(start, None), now, &UTC).expect("Valid subscription");
        assert_eq!(sub.status, SubscriptionStatus::Expired);
        assert!(!sub.is_active());
    }

    #[test]
    fn renewal_on_the_current_day_is_still_active() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let renewal = Utc.with_ymd_and_hms(2025, 2, 1, 1, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 20, 0, 0).unwrap();

        let sub = Subscription::new(input(start, Some(renewal)), now, &UTC)
            .expect("Valid subscription");
        assert!(sub.is_active());
    }

    #[test]
    fn rejects_invalid_subscriptions() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let now = start;

        let mut bad_name = input(start, None);
        bad_name.name = " a ".into();
        assert!(matches!(
            Subscription::new(bad_name, now, &UTC),
            Err(InvalidSubscription::Name(_))
        ));

        let mut bad_price = input(start, None);
        bad_price.price = -1.0;
        assert_eq!(
            Subscription::new(bad_price, now, &UTC),
            Err(InvalidSubscription::Price(-1.0))
        );

        let mut no_payment = input(start, None);
        no_payment.payment_method = "   ".into();
        assert_eq!(
            Subscription::new(no_payment, now, &UTC),
            Err(InvalidSubscription::PaymentMethod)
        );

        let renewal_before_start = input(start, Some(start - Duration::days(1)));
        assert_eq!(
            Subscription::new(renewal_before_start, now, &UTC),
            Err(InvalidSubscription::RenewalBeforeStart)
        );
    }

    #[test]
    fn describes_price_with_currency_and_frequency() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let sub = Subscription::new(input(start, None), start, &UTC).expect("Valid subscription");
        assert_eq!(sub.price_description(), "USD 15.99 (monthly)");
    }

    #[test]
    fn serializes_enums_like_the_record_store() {
        assert_eq!(
            serde_json::to_string(&SubscriptionStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(serde_json::to_string(&Currency::Gbp).unwrap(), "\"GBP\"");
        assert_eq!("quarterly".parse::<Frequency>().unwrap(), Frequency::Quarterly);
    }
}
