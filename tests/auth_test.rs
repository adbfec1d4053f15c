//! Authentication and authorization tests: password hashing, session
//! context roles, validation helpers and error status mapping.

mod common;

use actix_web::ResponseError;
use actix_web::http::StatusCode;

use fieldops::auth::password;
use fieldops::auth::session::SessionContext;
use fieldops::auth::validate::{validate_email, validate_password};
use fieldops::errors::AppError;
use fieldops::forms::FieldError;
use fieldops::models::allocation::{AllocationStatus, NewAllocation, NewSite};
use fieldops::models::user::{Role, User};
use common::*;

const TEST_PASSWORD: &str = "field-work-2025";

fn user(id: i64, role: &str) -> User {
    User {
        id,
        email: format!("user{id}@example.com"),
        display_name: "Sipho Ndlovu".to_string(),
        password: String::new(),
        role: role.to_string(),
    }
}

#[test]
fn test_hash_and_verify() {
    let hash = password::hash_password(TEST_PASSWORD).expect("Failed to hash password");

    assert!(password::verify_password(TEST_PASSWORD, &hash).expect("Verification failed"));
    assert!(!password::verify_password("wrong", &hash).expect("Verification failed"));
}

#[test]
fn test_hashes_are_salted() {
    let a = password::hash_password(TEST_PASSWORD).expect("hash");
    let b = password::hash_password(TEST_PASSWORD).expect("hash");
    assert_ne!(a, b);
}

#[test]
fn test_session_context_from_user() {
    let ctx = SessionContext::for_user(&user(ENGINEER_ID, "engineer")).expect("known role");

    assert_eq!(ctx.role, Role::Engineer);
    assert!(!ctx.is_admin());
    assert_eq!(ctx.initial(), "S");
}

#[test]
fn test_unknown_role_gets_no_session() {
    assert!(SessionContext::for_user(&user(1, "superuser")).is_none());
}

#[test]
fn test_engineers_edit_only_their_own_records() {
    let engineer = SessionContext::for_user(&user(ENGINEER_ID, "engineer")).expect("ctx");
    let admin = SessionContext::for_user(&user(1, "admin")).expect("ctx");

    assert!(engineer.can_edit(ENGINEER_ID));
    assert!(!engineer.can_edit(OTHER_ENGINEER_ID));
    assert!(admin.can_edit(OTHER_ENGINEER_ID));
}

#[test]
fn test_email_and_password_rules() {
    assert!(validate_email("engineer@example.com").is_none());
    assert!(validate_email("not-an-email").is_some());
    assert!(validate_password("short").is_some());
    assert!(validate_password(TEST_PASSWORD).is_none());
}

#[test]
fn test_error_status_codes() {
    assert_eq!(AppError::Validation(vec!["Region is required".into()]).status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(AppError::Field(FieldError::InvalidPath("a.b.c".into())).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::PermissionDenied("admin".into()).status_code(), StatusCode::FORBIDDEN);
    assert_eq!(AppError::Session("Not signed in".into()).status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::Db(sqlx::Error::PoolTimedOut).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(AppError::Incomplete(vec!["Region".into()]).status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(AppError::Blocking("canceled".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

async fn error_body(err: AppError) -> serde_json::Value {
    let body = actix_web::body::to_bytes(err.error_response().into_body())
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json body")
}

#[tokio::test]
async fn test_validation_message_depends_on_the_error() {
    let general = error_body(AppError::Validation(vec!["Site name is required".into()])).await;
    assert_eq!(general["error"], "Some values are missing or invalid.");
    assert_eq!(general["details"][0], "Site name is required");

    let submit = error_body(AppError::Incomplete(vec!["Region".into()])).await;
    assert_eq!(submit["error"], "Please complete the required fields before submitting.");
    assert_eq!(submit["details"][0], "Region");
}

#[test]
fn test_allocation_status_moves_forward_one_step() {
    use AllocationStatus::*;

    assert!(Allocated.can_move_to(InProgress));
    assert!(InProgress.can_move_to(Completed));
    assert!(!Allocated.can_move_to(Completed));
    assert!(!Completed.can_move_to(Allocated));
    assert!(!InProgress.can_move_to(InProgress));
}

#[test]
fn test_site_and_allocation_validation() {
    let site = NewSite {
        name: " ".into(),
        region: REGION.into(),
        site_code: String::new(),
        address: String::new(),
        gps_coordinates: String::new(),
    };
    assert_eq!(site.validate(), vec!["Site name is required".to_string()]);

    let allocation = NewAllocation { site_id: 1, engineer_id: 2, due_date: "next week".into(), notes: String::new() };
    assert_eq!(allocation.validate().len(), 1);

    let open_ended = NewAllocation { site_id: 1, engineer_id: 2, due_date: String::new(), notes: String::new() };
    assert!(open_ended.validate().is_empty());
}
