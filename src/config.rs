use chrono::Duration;
use log::{error, info, warn};
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::error::Result;
use crate::model::{
    common::IdNumber,
    db::AdminCredential,
    mongodb::{ensure_candidate_counter_exists, ensure_indexes_exist, Coll},
    store::Store,
};

/// Database name used when `db_name` is not configured.
const DEFAULT_DATABASE: &str = "onevote";

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    auth_ttl: u32,
    admin_id_number: String,
    // secrets
    jwt_secret: String,
    admin_password: String,
}

impl Config {
    /// Valid lifetime of auth tokens in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Build the administrator credential, hashing the configured password.
    pub fn admin_credential(&self) -> Result<AdminCredential> {
        let id_number: IdNumber = self.admin_id_number.parse()?;
        AdminCredential::new(id_number, &self.admin_password)
    }
}

/// A fairing that loads the application config and puts it, along with the
/// administrator credential derived from it, in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Hash the admin password once, up front.
        let admin = match config.admin_credential() {
            Ok(admin) => admin,
            Err(e) => {
                error!("Invalid administrator config: {e}");
                return Err(rocket);
            }
        };
        info!("Administrator identity is {}", admin.id_number);

        // Manage the state.
        rocket = rocket.manage(config).manage(admin);
        Ok(rocket)
    }
}

/// Configuration for the store.
#[derive(Deserialize)]
struct StoreConfig {
    // secrets
    db_uri: Option<String>,
    // non-secrets
    db_name: Option<String>,
}

/// A fairing that chooses the store, connects to MongoDB if one is
/// configured, performs any setup necessary, and places the [`Store`] into
/// managed state.
pub struct StoreFairing;

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<StoreConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load store config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        let Some(db_uri) = config.db_uri else {
            warn!("No `db_uri` configured: using a volatile in-memory store");
            return Ok(rocket.manage(Store::memory()));
        };

        info!("Loaded database config, connecting...");
        // Construct the connection.
        let client = match MongoClient::with_uri_str(db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db_name = config
            .db_name
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let db = client.database(&db_name);

        // Ensure the required indexes and counters exist.
        if let Err(e) = ensure_indexes_exist(&db).await {
            error!("Failed to set up database indexes: {e}");
            return Err(rocket);
        }
        if let Err(e) = ensure_candidate_counter_exists(&Coll::from_db(&db)).await {
            error!("Failed to set up candidate counter: {e}");
            return Err(rocket);
        }
        info!("...database connection online, using {db_name}");

        // Manage the state.
        rocket = rocket.manage(Store::mongo(client, db));
        Ok(rocket)
    }
}
