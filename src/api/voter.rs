use rocket::{serde::json::Json, Route, State};

use crate::{
    account,
    authenticator::Identity,
    error::{Error, Result},
    model::{
        api::{auth::PasswordChangeRequest, profile::ProfileView},
        db::AdminCredential,
        store::Store,
    },
};

pub fn routes() -> Vec<Route> {
    routes![get_profile, change_password]
}

#[get("/profile")]
async fn get_profile(
    identity: std::result::Result<Identity, Error>,
    admin: &State<AdminCredential>,
) -> Result<Json<ProfileView>> {
    Ok(Json(account::profile(identity?, admin)))
}

#[put("/profile/password", data = "<request>", format = "json")]
async fn change_password(
    identity: std::result::Result<Identity, Error>,
    request: Json<PasswordChangeRequest>,
    store: Store,
) -> Result<()> {
    account::change_password(&*store, &identity?, request.into_inner()).await
}
