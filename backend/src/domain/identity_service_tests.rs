//! Tests for the identity service.

use std::sync::Arc;

use chrono::{Duration, Utc};

use super::*;
use crate::domain::ports::{MockIdentityRepository, MockPasswordHasher, MockTokenService};
use crate::domain::test_support::{customer, mechanic, unique_phone};
use crate::domain::{
    CustomerId, EmailAddress, ErrorCode, PasswordHash, PersonName, PhoneNumber,
};

fn make_service(
    identities: MockIdentityRepository,
    passwords: MockPasswordHasher,
    tokens: MockTokenService,
) -> IdentityService {
    let identities: Arc<dyn IdentityRepository> = Arc::new(identities);
    let passwords: Arc<dyn PasswordHasher> = Arc::new(passwords);
    let auth = AuthService::new(identities.clone(), Arc::new(tokens), passwords.clone());
    IdentityService::new(identities, passwords, auth)
}

fn profile() -> Profile {
    Profile {
        name: PersonName::new("Dana Scully").expect("valid name"),
        email: EmailAddress::new("dana@shop.test").expect("valid email"),
        phone: PhoneNumber::new("555-123-4567").expect("valid phone"),
    }
}

fn password() -> PlainPassword {
    PlainPassword::new("correct-horse").expect("valid password")
}

fn hashing_passwords() -> MockPasswordHasher {
    let mut passwords = MockPasswordHasher::new();
    passwords
        .expect_hash()
        .returning(|plain| Ok(PasswordHash::from_encoded(format!("hashed:{}", plain.expose()))));
    passwords
}

#[tokio::test]
async fn register_stores_a_hashed_password_and_zero_counter() {
    let mut identities = MockIdentityRepository::new();
    identities
        .expect_insert()
        .withf(|new_identity| {
            let account = new_identity.account();
            new_identity.role() == Role::Customer
                && account.password_hash.as_str() == "hashed:correct-horse"
                && account.revocation_counter == 0
        })
        .times(1)
        .return_once(|new_identity| match new_identity {
            NewIdentity::Customer { account } => Ok(Identity::Customer(crate::domain::Customer {
                id: CustomerId::new(1),
                account,
            })),
            NewIdentity::Mechanic { .. } => Err(Error::internal("unexpected role")),
        });

    let service = make_service(identities, hashing_passwords(), MockTokenService::new());
    let identity = service
        .register(Registration::Customer {
            profile: profile(),
            password: password(),
        })
        .await
        .expect("registration succeeds");
    assert_eq!(identity.key(), IdentityKey::Customer(CustomerId::new(1)));
}

#[tokio::test]
async fn register_surfaces_duplicate_email() {
    let mut identities = MockIdentityRepository::new();
    identities
        .expect_insert()
        .times(1)
        .return_once(|_| Err(crate::domain::ports::duplicate_email()));

    let service = make_service(identities, hashing_passwords(), MockTokenService::new());
    let err = service
        .register(Registration::Mechanic {
            profile: profile(),
            password: password(),
            salary: Salary::new(40_000).expect("valid salary"),
        })
        .await
        .expect_err("duplicate");
    assert_eq!(err.code(), ErrorCode::DuplicateValue);
    assert_eq!(err.message(), "Email already associated with an account");
}

#[tokio::test]
async fn customers_cannot_set_a_salary() {
    let service = make_service(
        MockIdentityRepository::new(),
        MockPasswordHasher::new(),
        MockTokenService::new(),
    );
    let update = ProfileUpdate {
        salary: Some(Salary::new(1).expect("valid salary")),
        ..ProfileUpdate::default()
    };
    let err = service
        .update_self(&Principal::new(customer(1)), update)
        .await
        .expect_err("salary is not a customer field");
    assert_eq!(err.code(), ErrorCode::ValidationFailed);
}

#[tokio::test]
async fn contact_changes_keep_existing_tokens_valid() {
    let current = mechanic(2);
    let new_phone = unique_phone();
    let mut updated = current.clone();
    let mut identities = MockIdentityRepository::new();
    let expected_phone = new_phone.clone();
    identities
        .expect_update()
        .withf(move |_, changes| {
            changes.phone.as_ref() == Some(&expected_phone) && !changes.revoke_tokens
        })
        .times(1)
        .return_once(move |_, changes| {
            changes.apply_to(&mut updated);
            Ok(updated)
        });

    let service = make_service(identities, MockPasswordHasher::new(), MockTokenService::new());
    let outcome = service
        .update_self(
            &Principal::new(current),
            ProfileUpdate {
                phone: Some(new_phone.clone()),
                ..ProfileUpdate::default()
            },
        )
        .await
        .expect("update succeeds");
    assert!(outcome.token.is_none());
    assert_eq!(outcome.identity.account().profile.phone, new_phone);
}

#[tokio::test]
async fn password_change_revokes_and_reissues() {
    let current = customer(3);
    let mut updated = current.clone();
    let mut identities = MockIdentityRepository::new();
    identities
        .expect_update()
        .withf(|_, changes| changes.revoke_tokens && changes.password_hash.is_some())
        .times(1)
        .return_once(move |_, changes| {
            changes.apply_to(&mut updated);
            Ok(updated)
        });
    let mut tokens = MockTokenService::new();
    tokens
        .expect_issue()
        .withf(|_, _, counter| *counter == 1)
        .times(1)
        .return_once(|_, _, _| {
            Ok(IssuedToken {
                token: "fresh".to_owned(),
                expires_at: Utc::now() + Duration::minutes(60),
            })
        });

    let service = make_service(identities, hashing_passwords(), tokens);
    let outcome = service
        .update_self(
            &Principal::new(current),
            ProfileUpdate {
                password: Some(PlainPassword::new("another-secret").expect("valid")),
                ..ProfileUpdate::default()
            },
        )
        .await
        .expect("update succeeds");
    assert_eq!(outcome.identity.revocation_counter(), 1);
    assert_eq!(outcome.token.map(|t| t.token).as_deref(), Some("fresh"));
}

#[tokio::test]
async fn get_reports_missing_identities() {
    let mut identities = MockIdentityRepository::new();
    identities.expect_find().times(1).return_once(|_| Ok(None));

    let service = make_service(identities, MockPasswordHasher::new(), MockTokenService::new());
    let err = service
        .get(IdentityKey::Customer(CustomerId::new(99)))
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(err.message(), "Customer 99 not found");
}

#[tokio::test]
async fn delete_self_targets_the_callers_key() {
    let current = mechanic(4);
    let key = current.key();
    let mut identities = MockIdentityRepository::new();
    identities
        .expect_delete()
        .withf(move |k| *k == key)
        .times(1)
        .return_once(|_| Ok(()));

    let service = make_service(identities, MockPasswordHasher::new(), MockTokenService::new());
    service
        .delete_self(&Principal::new(current))
        .await
        .expect("delete succeeds");
}
