use rocket::{response::status, serde::json::Json, Route};

use crate::{
    authenticator::Identity,
    error::{Error, Result},
    model::{
        api::candidate::{CandidateRequest, CandidateSummary},
        store::Store,
    },
    roster,
};

pub fn routes() -> Vec<Route> {
    routes![create_candidate, update_candidate, delete_candidate]
}

#[post("/candidates", data = "<request>", format = "json")]
async fn create_candidate(
    identity: std::result::Result<Identity, Error>,
    request: Json<CandidateRequest>,
    store: Store,
) -> Result<status::Created<Json<CandidateSummary>>> {
    let candidate = roster::create_candidate(&*store, &identity?, request.into_inner()).await?;
    let location = format!("/candidates/{}", candidate.id);
    Ok(status::Created::new(location).body(Json(candidate.into())))
}

#[put("/candidates/<candidate_id>", data = "<request>", format = "json")]
async fn update_candidate(
    identity: std::result::Result<Identity, Error>,
    candidate_id: &str,
    request: Json<CandidateRequest>,
    store: Store,
) -> Result<Json<CandidateSummary>> {
    let candidate =
        roster::update_candidate(&*store, &identity?, candidate_id, request.into_inner()).await?;
    Ok(Json(candidate.into()))
}

#[delete("/candidates/<candidate_id>")]
async fn delete_candidate(
    identity: std::result::Result<Identity, Error>,
    candidate_id: &str,
    store: Store,
) -> Result<()> {
    roster::delete_candidate(&*store, &identity?, candidate_id).await
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json::json,
    };

    use super::*;
    use crate::error::{ErrorBody, ErrorKind};
    use crate::model::mongodb::Id;

    async fn create(client: &Client, name: &str, party: &str) -> CandidateSummary {
        let response = client
            .post(uri!(create_candidate))
            .header(ContentType::JSON)
            .body(json!(CandidateRequest::example(name, party)).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
        response.into_json().await.unwrap()
    }

    #[backend_test(admin)]
    async fn create_update_delete(client: Client, store: Store) {
        let created = create(&client, "Carol", "Green").await;
        let id: Id = created.id.parse().unwrap();
        assert_eq!(store.candidate(id).await.unwrap().unwrap().name, "Carol");

        let response = client
            .put(format!("/candidates/{}", created.id))
            .header(ContentType::JSON)
            .body(json!({ "party": "Gold" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let updated = response.into_json::<CandidateSummary>().await.unwrap();
        assert_eq!(updated.name, "Carol");
        assert_eq!(updated.party, "Gold");

        let response = client
            .delete(format!("/candidates/{}", created.id))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(store.candidate(id).await.unwrap(), None);

        let response = client
            .delete(format!("/candidates/{}", created.id))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(admin)]
    async fn create_requires_name_and_party(client: Client) {
        let response = client
            .post(uri!(create_candidate))
            .header(ContentType::JSON)
            .body(json!({ "name": "Carol" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        let body = response.into_json::<ErrorBody>().await.unwrap();
        assert_eq!(body.error, ErrorKind::InvalidArgument);
    }

    #[backend_test(admin)]
    async fn malformed_ids_are_bad_requests(client: Client) {
        let response = client
            .put("/candidates/not-an-id")
            .header(ContentType::JSON)
            .body(json!({ "name": "X" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());

        let response = client.delete("/candidates/not-an-id").dispatch().await;
        assert_eq!(Status::BadRequest, response.status());

        let response = client
            .put(format!("/candidates/{}", Id::new()))
            .header(ContentType::JSON)
            .body(json!({ "name": "X" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(voter)]
    async fn voters_cannot_manage_candidates(client: Client, store: Store) {
        let existing = store
            .insert_candidate("A".into(), "Red".into())
            .await
            .unwrap();

        let response = client
            .post(uri!(create_candidate))
            .header(ContentType::JSON)
            .body(json!(CandidateRequest::example("B", "Blue")).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());

        let response = client
            .delete(format!("/candidates/{}", existing.id))
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());

        assert_eq!(store.candidates().await.unwrap(), vec![existing]);
    }

    #[backend_test(admin)]
    async fn deleted_candidate_cannot_be_voted_for(client: Client, store: Store) {
        let created = create(&client, "Carol", "Green").await;
        client
            .delete(format!("/candidates/{}", created.id))
            .dispatch()
            .await;

        // Switch the client over to a voter.
        store
            .insert_voter(crate::model::db::VoterCore::example())
            .await
            .unwrap();
        let response = client
            .post("/login")
            .header(ContentType::JSON)
            .body(json!(crate::model::api::auth::LoginRequest::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let response = client.post(format!("/vote/{}", created.id)).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }
}
