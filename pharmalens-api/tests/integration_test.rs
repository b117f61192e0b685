/// Integration tests for the PharmaLens API
///
/// These drive the full router (auth middleware included) against a live
/// PostgreSQL. They are `#[ignore]`d by default; run them with a
/// disposable database:
///
/// ```bash
/// DATABASE_URL=postgresql://localhost/pharmalens_test cargo test -- --ignored
/// ```
///
/// The scan submission pipeline itself needs the external OCR/AI
/// services and is covered by unit tests on the clients and upload
/// validation instead.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use common::TestContext;
use http_body_util::BodyExt;
use pharmalens_shared::models::password_reset_token::PasswordResetToken;
use pharmalens_shared::models::scan::{CreateScan, ScanRecord};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_register_and_login_flow() {
    let ctx = TestContext::new().await.unwrap();
    let suffix = Uuid::new_v4();
    let username = format!("alice-{}", suffix);
    let email = format!("alice-{}@example.com", suffix);

    // Register
    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"username": username, "email": email, "password": "secret1"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["role"], "user");

    // Duplicate registration conflicts
    let (status, _) = ctx
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"username": username, "email": email, "password": "secret1"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Login with the username
    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"username": username, "password": "secret1"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "user");

    // Login with the email works too
    let (status, _) = ctx
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"username": email, "password": "secret1"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Wrong password and unknown account answer identically
    let (status, wrong_pw) = ctx
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"username": username, "password": "not-it"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown) = ctx
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"username": "nobody-here", "password": "whatever"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw["message"], unknown["message"]);

    // Cleanup the registered account
    sqlx::query("DELETE FROM users WHERE username = $1")
        .bind(&username)
        .execute(&ctx.db)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_me_requires_token() {
    let ctx = TestContext::new().await.unwrap();

    let (status, _) = ctx.request("GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx
        .request("GET", "/api/auth/me", Some(&ctx.user_auth()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], ctx.user.username);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_password_reset_flow() {
    let ctx = TestContext::new().await.unwrap();

    // Unknown email answers with the same generic message
    let (status, unknown) = ctx
        .request(
            "POST",
            "/api/auth/forgot-password",
            None,
            Some(json!({"email": "nobody@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Known email: debug config exposes the token
    let (status, known) = ctx
        .request(
            "POST",
            "/api/auth/forgot-password",
            None,
            Some(json!({"email": ctx.user.email})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(known["message"], unknown["message"]);

    let token = known["resetToken"].as_str().expect("debug token").to_string();

    // Redeem the token
    let (status, _) = ctx
        .request(
            "POST",
            "/api/auth/reset-password",
            None,
            Some(json!({"token": token, "newPassword": "brand-new-pw"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Login with the new password
    let (status, _) = ctx
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"username": ctx.user.username, "password": "brand-new-pw"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // A used token never authorizes a second change
    let (status, _) = ctx
        .request(
            "POST",
            "/api/auth/reset-password",
            None,
            Some(json!({"token": token, "newPassword": "another-pw"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_expired_reset_token_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let expired_at = Utc::now() - Duration::minutes(5);
    let token = PasswordResetToken::create(&ctx.db, ctx.user.id, "ab".repeat(32).as_str(), expired_at)
        .await
        .unwrap();

    let (status, _) = ctx
        .request(
            "POST",
            "/api/auth/reset-password",
            None,
            Some(json!({"token": token.token, "newPassword": "whatever-pw"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_dashboard_admin_routes_require_admin() {
    let ctx = TestContext::new().await.unwrap();

    for uri in ["/api/dashboard/users", "/api/dashboard/all-scans"] {
        let (status, _) = ctx.request("GET", uri, Some(&ctx.user_auth()), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} should be admin-only", uri);

        let (status, _) = ctx.request("GET", uri, Some(&ctx.admin_auth()), None).await;
        assert_eq!(status, StatusCode::OK, "{} should open for admins", uri);
    }

    let delete_uri = format!("/api/dashboard/users/{}", ctx.user.id);
    let (status, _) = ctx
        .request("DELETE", &delete_uri, Some(&ctx.user_auth()), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_admin_cannot_target_self_or_other_admins() {
    let ctx = TestContext::new().await.unwrap();

    // Self-delete
    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/api/dashboard/users/{}", ctx.admin.id),
            Some(&ctx.admin_auth()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Self role-change
    let (status, _) = ctx
        .request(
            "PUT",
            &format!("/api/dashboard/users/{}/role", ctx.admin.id),
            Some(&ctx.admin_auth()),
            Some(json!({"role": "user"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Role-change on a regular user works, and promotes exactly once
    let (status, _) = ctx
        .request(
            "PUT",
            &format!("/api/dashboard/users/{}/role", ctx.user.id),
            Some(&ctx.admin_auth()),
            Some(json!({"role": "admin"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // The target is an admin now, so further changes are refused
    let (status, _) = ctx
        .request(
            "PUT",
            &format!("/api/dashboard/users/{}/role", ctx.user.id),
            Some(&ctx.admin_auth()),
            Some(json!({"role": "user"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // And deleting the freshly promoted admin is refused too
    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/api/dashboard/users/{}", ctx.user.id),
            Some(&ctx.admin_auth()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown role value
    let (status, _) = ctx
        .request(
            "PUT",
            &format!("/api/dashboard/users/{}/role", ctx.user.id),
            Some(&ctx.admin_auth()),
            Some(json!({"role": "superuser"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_delete_user_cascades_only_their_scans() {
    let ctx = TestContext::new().await.unwrap();

    use pharmalens_shared::auth::password::hash_password;
    use pharmalens_shared::models::user::{CreateUser, User, UserRole};

    let suffix = Uuid::new_v4();
    let victim = User::create(
        &ctx.db,
        CreateUser {
            username: format!("victim-{}", suffix),
            email: format!("victim-{}@example.com", suffix),
            password_hash: hash_password("secret1").unwrap(),
            role: UserRole::User,
        },
    )
    .await
    .unwrap();

    for owner in [victim.id, ctx.user.id] {
        ScanRecord::create(
            &ctx.db,
            CreateScan {
                user_id: owner,
                image_filename: "scan-test.jpg".to_string(),
                ocr_result: "Paracetamol 500mg".to_string(),
                ai_analysis: "1. Nama Obat: Paracetamol".to_string(),
                scan_date: Utc::now(),
            },
        )
        .await
        .unwrap();
    }

    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/api/dashboard/users/{}", victim.id),
            Some(&ctx.admin_auth()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // The victim's scans are gone, the other user's survive
    assert_eq!(ScanRecord::count_for_user(&ctx.db, victim.id).await.unwrap(), 0);
    assert_eq!(ScanRecord::count_for_user(&ctx.db, ctx.user.id).await.unwrap(), 1);
    assert!(User::find_by_id(&ctx.db, victim.id).await.unwrap().is_none());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_scan_history_is_owner_scoped() {
    let ctx = TestContext::new().await.unwrap();

    let scan = ScanRecord::create(
        &ctx.db,
        CreateScan {
            user_id: ctx.user.id,
            image_filename: "scan-history.jpg".to_string(),
            ocr_result: "Paracetamol 500mg".to_string(),
            ai_analysis: "1. Nama Obat: Paracetamol".to_string(),
            scan_date: Utc::now(),
        },
    )
    .await
    .unwrap();

    // The owner sees exactly their entry
    let (status, body) = ctx
        .request("GET", "/api/scan/history", Some(&ctx.user_auth()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["ocr_result"], "Paracetamol 500mg");

    // Detail endpoint: owner gets it, others get 404
    let detail_uri = format!("/api/scan/{}", scan.id);
    let (status, _) = ctx
        .request("GET", &detail_uri, Some(&ctx.user_auth()), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .request("GET", &detail_uri, Some(&ctx.admin_auth()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_stats_are_role_scoped() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .request("GET", "/api/dashboard/stats", Some(&ctx.user_auth()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["stats"].get("myScans").is_some());
    assert!(body["stats"].get("totalUsers").is_none());

    let (status, body) = ctx
        .request("GET", "/api/dashboard/stats", Some(&ctx.admin_auth()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["stats"].get("totalUsers").is_some());
    assert!(body["stats"].get("totalScans").is_some());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_scan_submission_requires_an_image_part() {
    let ctx = TestContext::new().await.unwrap();

    // A well-formed multipart body that carries no image part
    let boundary = "pharmalens-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"scan_date\"\r\n\r\n2026-03-01T09:30:00+07:00\r\n--{b}--\r\n",
        b = boundary
    );

    let request = Request::builder()
        .method("POST")
        .uri("/api/scan")
        .header("authorization", ctx.user_auth())
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["message"], "No image file provided");

    // No record was created for the rejected submission
    assert_eq!(ScanRecord::count_for_user(&ctx.db, ctx.user.id).await.unwrap(), 0);

    ctx.cleanup().await.unwrap();
}
