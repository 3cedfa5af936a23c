use rocket::{
    http::{Cookie, CookieJar, Status},
    response::status,
    serde::json::Json,
    Route, State,
};

use crate::{
    account,
    authenticator::Authenticator,
    error::Result,
    model::{
        api::{
            auth::{AuthToken, LoginRequest, LoginResponse, RegisterRequest, AUTH_TOKEN_COOKIE},
            profile::ProfileView,
        },
        db::AdminCredential,
        store::Store,
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![signup, login, logout]
}

#[post("/signup", data = "<request>", format = "json")]
pub async fn signup(
    request: Json<RegisterRequest>,
    store: Store,
    admin: &State<AdminCredential>,
) -> Result<status::Created<Json<ProfileView>>> {
    let voter = account::register(&*store, admin, request.into_inner()).await?;
    Ok(status::Created::new("/profile").body(Json(voter.into())))
}

#[post("/login", data = "<request>", format = "json")]
pub async fn login(
    request: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    store: Store,
    admin: &State<AdminCredential>,
    config: &State<Config>,
) -> Result<Json<LoginResponse>> {
    let LoginRequest {
        id_number,
        password,
        is_admin,
    } = request.into_inner();
    let id_number = account::required(id_number, "idNumber")?;
    let password = account::required(password, "password")?;

    let identity = Authenticator::new(admin, &*store)
        .login(id_number.trim(), &password, is_admin)
        .await?;

    let id_number = identity.id_number(admin).to_string();
    let role = identity.role();
    let jwt = AuthToken::new(id_number.clone(), role).encode(config)?;
    cookies.add(AuthToken::cookie(jwt.clone(), config));

    Ok(Json(LoginResponse {
        role,
        id_number,
        token: jwt,
    }))
}

#[delete("/auth")]
pub fn logout(cookies: &CookieJar) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}

#[cfg(test)]
mod tests {
    use rocket::{http::ContentType, local::asynchronous::Client, serde::json::serde_json::json};

    use super::*;
    use crate::error::{ErrorBody, ErrorKind, INVALID_CREDENTIALS};
    use crate::model::{
        api::auth::Role,
        common::IdNumber,
        db::{admin::ADMIN_EXAMPLE_PASSWORD, voter::EXAMPLE_PASSWORD},
    };

    #[backend_test]
    async fn signup_creates_voter(client: Client, store: Store) {
        let response = client
            .post(uri!(signup))
            .header(ContentType::JSON)
            .body(json!(RegisterRequest::example()).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Created, response.status());
        let profile = response.into_json::<ProfileView>().await.unwrap();
        assert_eq!(profile.id_number, "111122223333");
        assert_eq!(profile.email.as_deref(), Some("asha@example.org"));
        assert!(!profile.has_voted);

        let voter = store.voter(&IdNumber::example()).await.unwrap().unwrap();
        assert!(!voter.has_voted);
    }

    #[backend_test]
    async fn signup_rejects_duplicates(client: Client) {
        for expected in [Status::Created, Status::Conflict] {
            let response = client
                .post(uri!(signup))
                .header(ContentType::JSON)
                .body(json!(RegisterRequest::example()).to_string())
                .dispatch()
                .await;
            assert_eq!(expected, response.status());
        }
    }

    #[backend_test]
    async fn signup_rejects_malformed_id(client: Client) {
        let response = client
            .post(uri!(signup))
            .header(ContentType::JSON)
            .body(json!({ "idNumber": "1234", "password": "p1" }).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::BadRequest, response.status());
        let body = response.into_json::<ErrorBody>().await.unwrap();
        assert_eq!(body.error, ErrorKind::InvalidArgument);
    }

    #[backend_test(voter)]
    async fn voter_login_sets_cookie(client: Client) {
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());

        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(json!(LoginRequest::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let body = response.into_json::<LoginResponse>().await.unwrap();
        assert_eq!(body.role, Role::Voter);
        assert_eq!(body.id_number, "111122223333");
        assert!(!body.token.is_empty());
    }

    #[backend_test(admin)]
    async fn admin_login(client: Client) {
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());

        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(json!(LoginRequest::admin_example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let body = response.into_json::<LoginResponse>().await.unwrap();
        assert_eq!(body.role, Role::Admin);
        assert_eq!(body.id_number, "123456789111");
    }

    #[backend_test]
    async fn login_failures_look_identical(client: Client, store: Store) {
        store
            .insert_voter(crate::model::db::VoterCore::example())
            .await
            .unwrap();

        let attempts = [
            json!({ "idNumber": "111122223333", "password": "wrong" }),
            json!({ "idNumber": "444455556666", "password": EXAMPLE_PASSWORD }),
            json!({ "idNumber": "nonsense", "password": EXAMPLE_PASSWORD }),
            json!({ "idNumber": "123456789111", "password": "wrong", "isAdmin": true }),
            json!({ "idNumber": "123456789111", "password": ADMIN_EXAMPLE_PASSWORD }),
        ];
        let mut bodies = Vec::new();
        for attempt in attempts {
            let response = client
                .post(uri!(login))
                .header(ContentType::JSON)
                .body(attempt.to_string())
                .dispatch()
                .await;
            assert_eq!(Status::Unauthorized, response.status());
            bodies.push(response.into_string().await.unwrap());
        }

        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_none());
        let expected = json!({ "error": "invalidCredentials", "message": INVALID_CREDENTIALS });
        for body in bodies {
            let body: rocket::serde::json::Value =
                rocket::serde::json::serde_json::from_str(&body).unwrap();
            assert_eq!(body, expected);
        }
    }

    #[backend_test]
    async fn login_requires_both_fields(client: Client, store: Store) {
        store
            .insert_voter(crate::model::db::VoterCore::example())
            .await
            .unwrap();

        let attempts = [
            json!({}),
            json!({ "idNumber": "111122223333" }),
            json!({ "password": EXAMPLE_PASSWORD }),
            json!({ "idNumber": "", "password": EXAMPLE_PASSWORD }),
            json!({ "idNumber": "111122223333", "password": "" }),
        ];
        for attempt in attempts {
            let response = client
                .post(uri!(login))
                .header(ContentType::JSON)
                .body(attempt.to_string())
                .dispatch()
                .await;
            assert_eq!(Status::BadRequest, response.status(), "{attempt}");
            let body = response.into_json::<ErrorBody>().await.unwrap();
            assert_eq!(body.error, ErrorKind::InvalidArgument);
        }
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_none());
    }

    #[backend_test(voter)]
    async fn logout_removes_cookie(client: Client) {
        let response = client.delete(uri!(logout)).dispatch().await;

        assert_eq!(Status::Ok, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_none());

        let response = client.get("/profile").dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
    }
}
