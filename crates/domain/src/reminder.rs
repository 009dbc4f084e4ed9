use crate::StepName;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// A `ReminderRule` says that the owner of a `Subscription` should be
/// notified `days_before` days before the renewal date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRule {
    /// Display and audit name of the reminder, e.g. "Final day reminder".
    /// Never used to decide how a reminder is delivered.
    pub label: String,
    pub days_before: u32,
}

impl ReminderRule {
    pub fn new(label: impl Into<String>, days_before: u32) -> Self {
        Self {
            label: label.into(),
            days_before,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum InvalidReminderRules {
    #[error("At least one reminder rule is required")]
    Empty,
    #[error("Reminder rules must be strictly decreasing in days before renewal, but `{0}` does not come after a larger value")]
    NotStrictlyDecreasing(String),
    #[error("The last reminder rule must fire on the renewal day, but `{0}` does not")]
    MissingFinalDay(String),
    #[error("Reminder label `{0}` is used by more than one rule")]
    DuplicateLabel(String),
    #[error("Reminder label `{0}` is reserved for another step of a reminder run")]
    ReservedLabel(String),
}

/// Ordered rule set, earliest reminder first and ending with the
/// renewal day itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderRules(Vec<ReminderRule>);

impl ReminderRules {
    pub fn new(rules: Vec<ReminderRule>) -> Result<Self, InvalidReminderRules> {
        let last = match rules.last() {
            Some(last) => last,
            None => return Err(InvalidReminderRules::Empty),
        };
        if last.days_before != 0 {
            return Err(InvalidReminderRules::MissingFinalDay(last.label.clone()));
        }
        for pair in rules.windows(2) {
            if pair[1].days_before >= pair[0].days_before {
                return Err(InvalidReminderRules::NotStrictlyDecreasing(
                    pair[1].label.clone(),
                ));
            }
        }
        let mut labels = HashSet::new();
        for rule in &rules {
            if StepName::is_reserved(&rule.label) {
                return Err(InvalidReminderRules::ReservedLabel(rule.label.clone()));
            }
            if !labels.insert(rule.label.as_str()) {
                return Err(InvalidReminderRules::DuplicateLabel(rule.label.clone()));
            }
        }

        Ok(Self(rules))
    }

    pub fn rules(&self) -> &[ReminderRule] {
        &self.0
    }
}

impl Default for ReminderRules {
    fn default() -> Self {
        Self(vec![
            ReminderRule::new("7 days before reminder", 7),
            ReminderRule::new("5 days before reminder", 5),
            ReminderRule::new("2 days before reminder", 2),
            ReminderRule::new("1 day before reminder", 1),
            ReminderRule::new("Final day reminder", 0),
        ])
    }
}

/// A `ReminderRule` resolved against a concrete renewal date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedReminder {
    pub label: String,
    pub days_before: u32,
    pub remind_at: DateTime<Utc>,
}

impl PlannedReminder {
    /// The renewal day reminder ends the run once sent
    pub fn is_final(&self) -> bool {
        self.days_before == 0
    }
}

/// Resolves every rule to `renewal_date - days_before` days, keeping rule order
pub fn compute_plan(renewal_date: DateTime<Utc>, rules: &ReminderRules) -> Vec<PlannedReminder> {
    rules
        .rules()
        .iter()
        .map(|rule| PlannedReminder {
            label: rule.label.clone(),
            days_before: rule.days_before,
            remind_at: renewal_date - Duration::days(i64::from(rule.days_before)),
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_rules_are_valid() {
        let rules = ReminderRules::default();
        assert_eq!(ReminderRules::new(rules.rules().to_vec()), Ok(rules));
    }

    #[test]
    fn rejects_invalid_rule_sets() {
        assert_eq!(ReminderRules::new(vec![]), Err(InvalidReminderRules::Empty));
        assert_eq!(
            ReminderRules::new(vec![ReminderRule::new("a", 3), ReminderRule::new("b", 1)]),
            Err(InvalidReminderRules::MissingFinalDay("b".into()))
        );
        assert_eq!(
            ReminderRules::new(vec![
                ReminderRule::new("a", 3),
                ReminderRule::new("b", 3),
                ReminderRule::new("c", 0)
            ]),
            Err(InvalidReminderRules::NotStrictlyDecreasing("b".into()))
        );
        assert_eq!(
            ReminderRules::new(vec![
                ReminderRule::new("a", 1),
                ReminderRule::new("b", 4),
                ReminderRule::new("c", 0)
            ]),
            Err(InvalidReminderRules::NotStrictlyDecreasing("b".into()))
        );
    }

    #[test]
    fn rejects_labels_that_collide_with_step_names() {
        assert_eq!(
            ReminderRules::new(vec![
                ReminderRule::new("get subscription", 1),
                ReminderRule::new("today", 0)
            ]),
            Err(InvalidReminderRules::ReservedLabel("get subscription".into()))
        );
        assert_eq!(
            ReminderRules::new(vec![
                ReminderRule::new("soon", 1),
                ReminderRule::new("check renewal date", 0)
            ]),
            Err(InvalidReminderRules::ReservedLabel("check renewal date".into()))
        );
        assert_eq!(
            ReminderRules::new(vec![
                ReminderRule::new("sleep until today", 1),
                ReminderRule::new("today", 0)
            ]),
            Err(InvalidReminderRules::ReservedLabel("sleep until today".into()))
        );
        assert_eq!(
            ReminderRules::new(vec![
                ReminderRule::new("reminder", 3),
                ReminderRule::new("reminder", 0)
            ]),
            Err(InvalidReminderRules::DuplicateLabel("reminder".into()))
        );
    }

    #[test]
    fn single_final_day_rule_is_valid() {
        assert!(ReminderRules::new(vec![ReminderRule::new("today", 0)]).is_ok());
    }

    #[test]
    fn computes_one_date_per_rule() {
        let renewal = Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0).unwrap();
        let plan = compute_plan(renewal, &ReminderRules::default());

        let dates = plan.iter().map(|r| r.remind_at).collect::<Vec<_>>();
        assert_eq!(
            dates,
            vec![
                Utc.with_ymd_and_hms(2025, 3, 3, 9, 30, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 3, 5, 9, 30, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 3, 8, 9, 30, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 3, 9, 9, 30, 0).unwrap(),
                renewal,
            ]
        );
        let labels = plan.iter().map(|r| r.label.as_str()).collect::<Vec<_>>();
        assert_eq!(
            labels,
            vec![
                "7 days before reminder",
                "5 days before reminder",
                "2 days before reminder",
                "1 day before reminder",
                "Final day reminder"
            ]
        );
        assert!(plan[4].is_final());
        assert!(plan[..4].iter().all(|r| !r.is_final()));
    }

    #[test]
    fn planned_dates_strictly_increase_for_any_valid_rule_set() {
        let renewal = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();
        let rule_sets = vec![
            vec![30, 14, 7, 0],
            vec![365, 1, 0],
            vec![0],
            vec![10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0],
        ];

        for days in rule_sets {
            let rules = ReminderRules::new(
                days.iter()
                    .map(|d| ReminderRule::new(format!("{} days", d), *d))
                    .collect(),
            )
            .expect("Valid rule set");
            let plan = compute_plan(renewal, &rules);

            assert_eq!(plan.len(), days.len());
            for (planned, d) in plan.iter().zip(days.iter()) {
                assert_eq!(renewal - planned.remind_at, Duration::days(i64::from(*d)));
            }
            for pair in plan.windows(2) {
                assert!(pair[0].remind_at < pair[1].remind_at);
            }
        }
    }
}
