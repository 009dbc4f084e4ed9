mod get_reminder_run;
pub mod send_reminders;
pub mod trigger_reminders;

use actix_web::web;
use get_reminder_run::get_reminder_run_controller;
use trigger_reminders::trigger_reminders_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/workflows/subscription/reminder",
        web::post().to(trigger_reminders_controller),
    );
    cfg.route(
        "/workflows/subscription/reminder/{run_id}",
        web::get().to(get_reminder_run_controller),
    );
}
