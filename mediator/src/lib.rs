//! Mediator between a learning agent and a video player.
//!
//! The agent and the player never talk to each other directly. The agent
//! posts actions and polls for reports; the player polls for actions and
//! posts reports. This crate holds the two buffers in between and exposes
//! them over HTTP.

#[macro_use]
extern crate rocket;

pub mod queues;
mod routes;

use rocket::fairing::AdHoc;
use rocket::figment::Figment;
use rocket::{Build, Rocket};

pub use queues::Mediator;

/// Rocket configuration listening on `address:port`, on top of whatever
/// Rocket itself picks up from `Rocket.toml` and `ROCKET_*` variables.
pub fn figment(address: &str, port: u16) -> Figment {
    rocket::Config::figment()
        .merge(("address", address))
        .merge(("port", port))
}

/// Assemble the web service around an already constructed `Mediator`.
pub fn rocket(figment: Figment, mediator: Mediator) -> Rocket<Build> {
    rocket::custom(figment)
        .manage(mediator)
        .mount(
            "/",
            routes![
                routes::index,
                routes::get_state,
                routes::post_state,
                routes::get_action,
                routes::post_action,
            ],
        )
        .register("/", catchers![routes::not_found])
        .attach(AdHoc::on_liftoff("Mediator address", |rocket| {
            Box::pin(async move {
                log::info!(
                    "[MEDIATOR] Listening on http://{}:{}",
                    rocket.config().address,
                    rocket.config().port
                );
            })
        }))
        .attach(AdHoc::on_shutdown("Mediator statistics", |rocket| {
            Box::pin(async move {
                if let Some(mediator) = rocket.state::<Mediator>() {
                    log::info!("[STATS] {}", mediator.statistics());
                }
                // Flush log. Important when we are shutting down.
                log::logger().flush();
            })
        }))
}
