use chrono::{Duration, Utc};
use storefront_api::{
    error::AppError,
    middleware::auth::{AuthUser, ensure_admin},
    services::auth_service::{decode_token, hash_password, issue_token},
};
use uuid::Uuid;

fn with_secret() {
    // Every test sets the same value, so concurrent writes agree.
    unsafe { std::env::set_var("JWT_SECRET", "test-secret") };
}

#[test]
fn issued_token_carries_role_and_a_day_of_validity() {
    with_secret();
    let user_id = Uuid::new_v4();

    let (token, expires_at) = issue_token(user_id, "admin").unwrap();
    let claims = decode_token(&token).unwrap();

    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.role, "admin");
    let ttl = expires_at - Utc::now();
    assert!(ttl > Duration::hours(23) && ttl <= Duration::hours(24));
}

#[test]
fn tampered_token_is_unauthorized() {
    with_secret();
    let (token, _) = issue_token(Uuid::new_v4(), "user").unwrap();
    let tampered = format!("{token}x");

    assert!(matches!(decode_token(&tampered), Err(AppError::Unauthorized(_))));
    assert!(matches!(decode_token("not-a-jwt"), Err(AppError::Unauthorized(_))));
}

#[test]
fn only_admins_pass_the_admin_check() {
    let admin = AuthUser {
        user_id: Uuid::new_v4(),
        role: "admin".into(),
    };
    let customer = AuthUser {
        user_id: Uuid::new_v4(),
        role: "user".into(),
    };

    assert!(ensure_admin(&admin).is_ok());
    assert!(matches!(ensure_admin(&customer), Err(AppError::Forbidden)));
}

#[test]
fn password_hashes_are_salted() {
    let first = hash_password("correct horse").unwrap();
    let second = hash_password("correct horse").unwrap();
    assert_ne!(first, second);
    assert!(first.starts_with("$argon2"));
}
