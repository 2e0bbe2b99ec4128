mod create_event;
mod delete_event;
mod delete_events;
mod get_event;
mod get_event_changes;
mod get_events;
mod seed_sample_events;
mod signal_event_ended;
mod subscribers;
mod update_event;

use actix_web::web;
use create_event::create_event_controller;
use delete_event::delete_event_controller;
use delete_events::delete_events_controller;
use get_event::get_event_controller;
use get_event_changes::get_event_changes_controller;
use get_events::get_events_controller;
pub use seed_sample_events::SeedSampleEventsUseCase;
use seed_sample_events::seed_sample_events_controller;
use signal_event_ended::signal_event_ended_controller;
use update_event::update_event_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/events", web::post().to(create_event_controller));
    cfg.route("/events", web::get().to(get_events_controller));
    cfg.route("/events", web::delete().to(delete_events_controller));
    cfg.route(
        "/events/changes",
        web::get().to(get_event_changes_controller),
    );
    cfg.route(
        "/events/samples",
        web::post().to(seed_sample_events_controller),
    );

    cfg.route("/events/{event_id}", web::get().to(get_event_controller));
    cfg.route("/events/{event_id}", web::put().to(update_event_controller));
    cfg.route(
        "/events/{event_id}",
        web::delete().to(delete_event_controller),
    );
    cfg.route(
        "/events/{event_id}/ended",
        web::post().to(signal_event_ended_controller),
    );
}
