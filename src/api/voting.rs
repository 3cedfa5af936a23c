use rocket::{serde::json::Json, Route};

use crate::{
    authenticator::Identity,
    error::{Error, Result},
    model::{
        api::candidate::{CandidateSummary, CandidateTally},
        store::Store,
    },
    roster, voting,
};

pub fn routes() -> Vec<Route> {
    routes![candidates, vote, counts]
}

#[get("/candidates")]
async fn candidates(
    identity: std::result::Result<Identity, Error>,
    store: Store,
) -> Result<Json<Vec<CandidateSummary>>> {
    let candidates = roster::list_candidates(&*store, &identity?).await?;
    Ok(Json(candidates.into_iter().map(Into::into).collect()))
}

#[post("/vote/<candidate_id>")]
async fn vote(
    identity: std::result::Result<Identity, Error>,
    candidate_id: &str,
    store: Store,
) -> Result<Json<CandidateTally>> {
    let candidate = voting::cast_vote(&*store, &identity?, candidate_id).await?;
    Ok(Json(candidate.into()))
}

#[get("/vote/counts")]
async fn counts(
    identity: std::result::Result<Identity, Error>,
    store: Store,
) -> Result<Json<Vec<CandidateTally>>> {
    let results = roster::results(&*store, &identity?).await?;
    Ok(Json(results.into_iter().map(Into::into).collect()))
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
    use crate::model::{
        api::{
            auth::{LoginRequest, RegisterRequest},
            profile::ProfileView,
        },
        db::{Candidate, VoterCore},
        mongodb::Id,
    };

    async fn two_candidates(store: &Store) -> (Candidate, Candidate) {
        let a = store.insert_candidate("A".into(), "Red".into()).await.unwrap();
        let b = store.insert_candidate("B".into(), "Blue".into()).await.unwrap();
        (a, b)
    }

    async fn counts_of(client: &Client) -> Vec<CandidateTally> {
        let response = client.get(uri!(counts)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        response.into_json().await.unwrap()
    }

    #[backend_test]
    async fn register_login_vote_once(client: Client, store: Store) {
        let response = client
            .post("/signup")
            .header(ContentType::JSON)
            .body(json!(RegisterRequest::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());

        let response = client
            .post("/login")
            .header(ContentType::JSON)
            .body(json!(LoginRequest::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let (a, b) = two_candidates(&store).await;
        let listed = client
            .get(uri!(candidates))
            .dispatch()
            .await
            .into_json::<Vec<CandidateSummary>>()
            .await
            .unwrap();
        assert_eq!(
            listed,
            vec![
                CandidateSummary::from(a.clone()),
                CandidateSummary::from(b.clone())
            ]
        );

        let response = client.post(format!("/vote/{}", a.id)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let tally = response.into_json::<CandidateTally>().await.unwrap();
        assert_eq!(tally.vote_count, 1);

        let response = client.post(format!("/vote/{}", b.id)).dispatch().await;
        assert_eq!(Status::Forbidden, response.status());
        let body = response.into_json::<ErrorBody>().await.unwrap();
        assert_eq!(body.error, ErrorKind::AlreadyVoted);

        let counts = counts_of(&client).await;
        assert_eq!(counts[0].id, a.id.to_hex());
        assert_eq!(counts[0].vote_count, 1);
        assert_eq!(counts[1].id, b.id.to_hex());
        assert_eq!(counts[1].vote_count, 0);

        let profile = client
            .get("/profile")
            .dispatch()
            .await
            .into_json::<ProfileView>()
            .await
            .unwrap();
        assert!(profile.has_voted);
    }

    #[backend_test(voter)]
    async fn vote_for_missing_or_malformed_candidate(client: Client, store: Store) {
        let response = client.post(format!("/vote/{}", Id::new())).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
        let body = response.into_json::<ErrorBody>().await.unwrap();
        assert_eq!(body.error, ErrorKind::InvalidCandidate);

        let response = client.post("/vote/12345").dispatch().await;
        assert_eq!(Status::BadRequest, response.status());

        let voter = store
            .voter(&VoterCore::example().id_number)
            .await
            .unwrap()
            .unwrap();
        assert!(!voter.has_voted);
    }

    #[backend_test(admin)]
    async fn admin_cannot_vote(client: Client, store: Store) {
        let (a, _) = two_candidates(&store).await;
        for target in [a.id.to_hex(), Id::new().to_hex(), "12345".to_string()] {
            let response = client.post(format!("/vote/{target}")).dispatch().await;
            assert_eq!(Status::Forbidden, response.status());
        }
        assert_eq!(store.candidate(a.id).await.unwrap().unwrap().vote_count, 0);
    }

    #[backend_test(admin)]
    async fn admin_sees_counts(client: Client, store: Store) {
        two_candidates(&store).await;
        let counts = counts_of(&client).await;
        assert_eq!(counts.len(), 2);
        assert!(counts.iter().all(|c| c.vote_count == 0));
    }

    #[backend_test]
    async fn anonymous_callers_are_refused(client: Client, store: Store) {
        let (a, _) = two_candidates(&store).await;

        let responses = [
            client.get(uri!(candidates)).dispatch().await,
            client.get(uri!(counts)).dispatch().await,
            client.post(format!("/vote/{}", a.id)).dispatch().await,
        ];
        for response in responses {
            assert_eq!(Status::Unauthorized, response.status());
        }
        assert_eq!(store.candidate(a.id).await.unwrap().unwrap().vote_count, 0);
    }
}
