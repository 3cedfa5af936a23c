#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod account;
pub mod api;
pub mod authenticator;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod roster;
pub mod voting;

pub use config::Config;

/// Assemble the server: routes, logging, and the fairings that load the
/// configuration and choose the store at ignition.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(logging::LoggerFairing)
        .attach(config::ConfigFairing)
        .attach(config::StoreFairing)
}

/// A server over the given store and configuration, skipping the fairings
/// that would otherwise read them from the environment.
#[cfg(test)]
pub(crate) fn rocket_for_store(store: model::store::Store, config: Config) -> Rocket<Build> {
    let admin = config
        .admin_credential()
        .expect("example config has a valid administrator");
    rocket::build()
        .mount("/", api::routes())
        .attach(logging::LoggerFairing)
        .manage(config)
        .manage(admin)
        .manage(store)
}
