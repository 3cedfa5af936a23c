//! Voter accounts: registration, profiles and passwords.

use log::info;

use crate::authenticator::Identity;
use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::{PasswordChangeRequest, RegisterRequest},
        profile::ProfileView,
    },
    common::{hash_password_blocking, verify_password_blocking, IdNumber},
    db::{AdminCredential, Profile, Voter, VoterCore},
    store::CredentialStore,
};

/// Unwrap a request field that must be present and non-empty.
pub(crate) fn required(field: Option<String>, name: &str) -> Result<String> {
    field
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::InvalidArgument(format!("`{name}` is required")))
}

/// Register a new voter who has not yet voted.
pub async fn register<S>(store: &S, admin: &AdminCredential, request: RegisterRequest) -> Result<Voter>
where
    S: CredentialStore + ?Sized,
{
    let id_number: IdNumber = required(request.id_number, "idNumber")?.parse()?;
    let password = required(request.password, "password")?;
    if id_number == admin.id_number {
        return Err(Error::Conflict(format!(
            "ID number {id_number} is already registered"
        )));
    }

    let profile = Profile::normalised(request.name, request.email, request.phone);
    let voter = VoterCore::new(id_number, hash_password_blocking(&password).await?, profile);
    let voter = store.insert_voter(voter).await?;
    info!("Registered voter {}", voter.id);
    Ok(voter)
}

/// The caller's own profile.
pub fn profile(identity: Identity, admin: &AdminCredential) -> ProfileView {
    match identity {
        Identity::Admin => admin.into(),
        Identity::Voter(voter) => voter.into(),
    }
}

/// Replace a voter's password, given their current one.
pub async fn change_password<S>(
    store: &S,
    identity: &Identity,
    request: PasswordChangeRequest,
) -> Result<()>
where
    S: CredentialStore + ?Sized,
{
    let voter = match identity {
        Identity::Admin => {
            return Err(Error::forbidden(
                "The administrator password is set by configuration",
            ))
        }
        Identity::Voter(voter) => voter,
    };

    let current = request.current_password.unwrap_or_default();
    if !verify_password_blocking(&voter.password_hash, &current).await {
        return Err(Error::InvalidCredentials);
    }
    let new_password = required(request.new_password, "newPassword")?;

    let updated = store
        .set_password_hash(&voter.id_number, hash_password_blocking(&new_password).await?)
        .await?;
    if !updated {
        return Err(Error::not_found(format!("Voter {}", voter.id)));
    }
    info!("Voter {} changed their password", voter.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authenticator::Authenticator;
    use crate::model::{common::verify_password, db::voter::EXAMPLE_PASSWORD, store::Store};

    async fn registered(store: &Store) -> Identity {
        let voter = register(&**store, &AdminCredential::example(), RegisterRequest::example())
            .await
            .unwrap();
        Identity::Voter(voter)
    }

    #[backend_test]
    async fn register_normalises_profile(store: Store) {
        let Identity::Voter(voter) = registered(&store).await else {
            panic!("registered as admin");
        };
        assert_eq!(voter.id_number, IdNumber::example());
        assert_eq!(voter.email.as_deref(), Some("asha@example.org"));
        assert!(!voter.has_voted);
        assert_ne!(voter.password_hash, EXAMPLE_PASSWORD);
        assert!(verify_password(&voter.password_hash, EXAMPLE_PASSWORD));
    }

    #[backend_test]
    async fn register_validates_fields(store: Store) {
        let admin = AdminCredential::example();
        let bad_requests = [
            RegisterRequest {
                id_number: Some("12345".into()),
                ..RegisterRequest::example()
            },
            RegisterRequest {
                id_number: None,
                ..RegisterRequest::example()
            },
            RegisterRequest {
                password: Some(String::new()),
                ..RegisterRequest::example()
            },
            RegisterRequest {
                password: None,
                ..RegisterRequest::example()
            },
        ];
        for request in bad_requests {
            let result = register(&*store, &admin, request).await;
            assert!(matches!(result, Err(Error::InvalidArgument(_))));
        }
        assert!(store.voter(&IdNumber::example()).await.unwrap().is_none());
    }

    #[backend_test]
    async fn duplicate_and_admin_registrations_conflict(store: Store) {
        let admin = AdminCredential::example();
        registered(&store).await;

        let again = register(&*store, &admin, RegisterRequest::example()).await;
        assert!(matches!(again, Err(Error::Conflict(_))));

        let as_admin = RegisterRequest {
            id_number: Some(admin.id_number.to_string()),
            ..RegisterRequest::example()
        };
        let result = register(&*store, &admin, as_admin).await;
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[backend_test]
    async fn profiles(store: Store) {
        let admin = AdminCredential::example();
        let view = profile(registered(&store).await, &admin);
        assert_eq!(view.id_number, "111122223333");
        assert_eq!(view.name.as_deref(), Some("Asha Rao"));
        assert!(!view.has_voted);

        let view = profile(Identity::Admin, &admin);
        assert_eq!(view.id_number, "123456789111");
        assert_eq!(view.name.as_deref(), Some("Admin User"));
    }

    #[backend_test]
    async fn change_password_then_login(store: Store) {
        let admin = AdminCredential::example();
        let voter = registered(&store).await;
        let request = PasswordChangeRequest {
            current_password: Some(EXAMPLE_PASSWORD.into()),
            new_password: Some("p2".into()),
        };
        change_password(&*store, &voter, request).await.unwrap();

        let auth = Authenticator::new(&admin, &*store);
        assert!(auth.login("111122223333", "p2", false).await.is_ok());
        assert!(matches!(
            auth.login("111122223333", EXAMPLE_PASSWORD, false).await,
            Err(Error::InvalidCredentials)
        ));
    }

    #[backend_test]
    async fn change_password_failures(store: Store) {
        let voter = registered(&store).await;

        let wrong_current = PasswordChangeRequest {
            current_password: Some("wrong".into()),
            new_password: Some("p2".into()),
        };
        let result = change_password(&*store, &voter, wrong_current).await;
        assert!(matches!(result, Err(Error::InvalidCredentials)));

        let empty_new = PasswordChangeRequest {
            current_password: Some(EXAMPLE_PASSWORD.into()),
            new_password: Some(String::new()),
        };
        let result = change_password(&*store, &voter, empty_new).await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));

        let admin = PasswordChangeRequest {
            current_password: Some("anything".into()),
            new_password: Some("p2".into()),
        };
        let result = change_password(&*store, &Identity::Admin, admin).await;
        assert!(matches!(result, Err(Error::Forbidden(_))));
    }
}
