use log::{error, info, LevelFilter};
use rocket::{Error as RocketError, Ignite, Rocket};
use thiserror::Error;

/// Errors that stop the server from running at all.
#[derive(Debug, Error)]
enum Error {
    #[error("Failed to ignite: {0}")]
    Ignite(#[source] RocketError),
    #[error("Server stopped abnormally: {0}")]
    Launch(#[source] RocketError),
}

async fn ignite() -> Result<Rocket<Ignite>, Error> {
    info!("Configuring server...");
    let rocket = onevote_backend::build()
        .ignite()
        .await
        .map_err(Error::Ignite)?;
    info!("...server configured (profile `{}`)", rocket.figment().profile());
    Ok(rocket)
}

async fn run() -> Result<(), Error> {
    let rocket = ignite().await?;
    // The logger fairing reports from here on.
    log4rs_dynamic_filters::DynamicLevelFilter::set("rocket", LevelFilter::Off);
    let _ = rocket.launch().await.map_err(Error::Launch)?;
    info!("Server stopped");
    Ok(())
}

#[rocket::main]
async fn main() {
    log4rs::init_file("log4rs.yaml", log4rs_dynamic_filters::default_deserializers())
        .expect("Failed to initialise logging");
    info!("Initialised logging");

    if let Err(err) = run().await {
        error!("{err}");
        error!("Critical failure, shutting down");
        std::process::exit(1)
    }
}
