mod base;
mod reminder;
mod status;

pub(crate) use base::BaseClient;
pub use base::{APIError, APIResponse};
use reminder::ReminderClient;
use status::StatusClient;
use std::sync::Arc;

pub use subtrack_api_structs::dtos::*;
pub use subtrack_domain::{RunOutcome, RunStatus, RunStepState, ID};

// Domain
pub use subtrack_api_structs::dtos::ReminderRunDTO as ReminderRun;
pub use subtrack_api_structs::dtos::RunStepDTO as RunStep;

/// Subtrack Server SDK
///
/// The SDK contains methods for interacting with the Subtrack server
/// API.
#[derive(Clone)]
pub struct SubtrackSDK {
    pub reminder: ReminderClient,
    pub status: StatusClient,
}

impl SubtrackSDK {
    pub fn new(address: String) -> Self {
        let base = Arc::new(BaseClient::new(address));
        let reminder = ReminderClient::new(base.clone());
        let status = StatusClient::new(base);

        Self { reminder, status }
    }
}
