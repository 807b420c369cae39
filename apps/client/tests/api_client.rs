mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use recruit_client::api::{ApiClient, Upload};
use recruit_client::auth::TokenIdentity;
use recruit_client::errors::ApiError;
use recruit_client::models::application::{ApplicationCreate, ApplicationStatus, ApplicationUpdate};
use recruit_client::models::cv::{CvAnalysis, ExportTemplate, OptimizedCv};
use recruit_client::models::photo::{Background, PhotoEnhanceParams};

use support::{FakeBackend, TestServer, TOKEN};

fn cv_upload() -> Upload {
    Upload::new("cv.pdf", "application/pdf", b"%PDF-1.4 cv".to_vec())
}

const JD: &str = "We are hiring a backend engineer with Rust, Kubernetes and Postgres experience.";

#[tokio::test]
async fn test_authenticated_request_carries_bearer_token() {
    let server = TestServer::start(FakeBackend::with_free_uses(3)).await;

    let profile = server.api.users().profile().await.unwrap();
    assert_eq!(profile.uid, support::UID);
    assert_eq!(profile.free_uses_remaining, 3);
    assert_eq!(
        server.backend.auth_headers("GET /users/me"),
        vec![Some(format!("Bearer {TOKEN}"))]
    );
}

#[tokio::test]
async fn test_no_content_reply_yields_unit() {
    let server = TestServer::start(FakeBackend::default()).await;
    let id = server.backend.seed_application("Acme", "Engineer", "saved");

    server.api.applications().delete(&id).await.unwrap();
    assert!(server.backend.applications().is_empty());
}

#[tokio::test]
async fn test_string_detail_is_surfaced() {
    let server = TestServer::start(FakeBackend::default()).await;

    let err = server.api.cover_letters().get("missing").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    match err {
        ApiError::Status { message, .. } => assert_eq!(message, "Cover letter not found"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_payment_required_keeps_structured_detail() {
    let server = TestServer::start(FakeBackend::with_free_uses(0)).await;

    let err = server
        .api
        .cv()
        .optimize(&cv_upload(), JD, None)
        .await
        .unwrap_err();
    assert!(err.is_payment_required());
    match err {
        ApiError::Status { message, data, .. } => {
            assert!(message.starts_with("You've used all your free AI uses"));
            assert_eq!(data.unwrap()["detail"]["upgrade_url"], "/pricing");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_non_json_error_body_falls_back_to_default_message() {
    let server = TestServer::start(FakeBackend::default()).await;
    server.backend.fail("GET /users/me/stats", 500, json!("boom"));

    let err = server.api.users().stats().await.unwrap_err();
    match err {
        ApiError::Status { status, message, data } => {
            assert_eq!(status, 500);
            assert_eq!(message, "An error occurred");
            assert_eq!(data, Some(json!("boom")));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_token_failure_still_sends_request_without_header() {
    let server = TestServer::start(FakeBackend::default()).await;
    server.identity.break_token("refresh failed");

    let analysis = server.api.cv().analyze(&cv_upload(), JD).await.unwrap();
    assert!(matches!(analysis, CvAnalysis::Preview(_)));
    assert_eq!(server.backend.auth_headers("POST /cv/analyze"), vec![None]);
}

#[tokio::test]
async fn test_signed_out_protected_call_gets_unauthorized() {
    let server = TestServer::start(FakeBackend::default()).await;
    let api = ApiClient::with_timeout(
        &server.base_url,
        Duration::from_secs(5),
        Arc::new(TokenIdentity::signed_out()),
    )
    .unwrap();

    let err = api.users().profile().await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(server.backend.auth_headers("GET /users/me"), vec![None]);
}

#[tokio::test]
async fn test_public_analyze_never_sends_token() {
    let server = TestServer::start(FakeBackend::default()).await;

    let analysis = server.api.cv().analyze_public(&cv_upload(), JD).await.unwrap();
    assert!(analysis.analysis_id().is_none());
    assert_eq!(server.backend.auth_headers("POST /cv/analyze"), vec![None]);
}

#[tokio::test]
async fn test_full_analysis_and_optimize_forward_analysis_id() {
    let server = TestServer::start(FakeBackend::with_free_uses(3)).await;

    let analysis = server.api.cv().analyze(&cv_upload(), JD).await.unwrap();
    let id = analysis.analysis_id().unwrap().to_string();
    let form = server.backend.form("POST /cv/analyze");
    assert_eq!(form["file"], "cv.pdf");
    assert_eq!(form["job_description"], JD);

    server.api.cv().optimize(&cv_upload(), JD, Some(&id)).await.unwrap();
    assert_eq!(server.backend.form("POST /cv/optimize")["analysis_id"], id);
    assert_eq!(server.backend.free_uses(), 2);
}

#[tokio::test]
async fn test_export_returns_pdf_blob_and_sends_template() {
    let server = TestServer::start(FakeBackend::default()).await;
    let cv = OptimizedCv {
        contact_name: "Ada Lovelace".into(),
        summary: "Engineer".into(),
        ..Default::default()
    };

    let blob = server
        .api
        .cv()
        .export_pdf(&cv, ExportTemplate::Executive)
        .await
        .unwrap();
    assert_eq!(blob.content_type.as_deref(), Some("application/pdf"));
    assert!(blob.bytes.starts_with(b"%PDF"));

    let body = server.backend.body("POST /cv/export").unwrap();
    assert_eq!(body["template"], "executive");
    assert_eq!(body["contact_name"], "Ada Lovelace");
}

#[tokio::test]
async fn test_binary_error_uses_caller_fallback() {
    let server = TestServer::start(FakeBackend::default()).await;
    server.backend.fail("POST /cv/export", 500, json!({}));

    let err = server
        .api
        .cv()
        .export_pdf(&OptimizedCv::default(), ExportTemplate::Classic)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Export failed"));
}

#[tokio::test]
async fn test_photo_enhance_sends_params_as_form_fields() {
    let server = TestServer::start(FakeBackend::premium()).await;
    let params = PhotoEnhanceParams {
        background: Background::Office,
        ..Default::default()
    };
    let photo = Upload::new("me.png", "image/png", b"\x89PNG".to_vec());

    let blob = server.api.photos().enhance(&photo, &params).await.unwrap();
    assert_eq!(blob.content_type.as_deref(), Some("image/png"));

    let form = server.backend.form("POST /photos/enhance");
    assert_eq!(form["background"], "office");
    assert_eq!(form["brightness"], "1.1");
    assert_eq!(form["sharpness"], "1.2");
    assert_eq!(form["file.content_type"], "image/png");
}

#[tokio::test]
async fn test_application_update_sends_only_set_fields() {
    let server = TestServer::start(FakeBackend::default()).await;
    let created = server
        .api
        .applications()
        .create(&ApplicationCreate {
            company_name: "Acme".into(),
            position: "Engineer".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.status, ApplicationStatus::Saved);

    let updated = server
        .api
        .applications()
        .update(&created.id, &ApplicationUpdate::status_only(ApplicationStatus::Interview))
        .await
        .unwrap();
    assert_eq!(updated.status, ApplicationStatus::Interview);
    assert_eq!(updated.company_name, "Acme");

    let sent = server
        .backend
        .body(&format!("PUT /applications/{}", created.id))
        .unwrap();
    assert_eq!(sent, json!({"status": "interview"}));
}

#[tokio::test]
async fn test_list_endpoints_send_limits() {
    let server = TestServer::start(FakeBackend::default()).await;

    server.api.cover_letters().list(20).await.unwrap();
    server.api.applications().list(50).await.unwrap();

    assert_eq!(server.backend.query("GET /cover-letters")["limit"], "20");
    assert_eq!(server.backend.query("GET /applications/")["limit"], "50");
}

#[tokio::test]
async fn test_portal_passes_return_url_as_query() {
    let server = TestServer::start(FakeBackend::premium()).await;

    let session = server
        .api
        .subscriptions()
        .portal("http://localhost:3000/settings?tab=billing")
        .await
        .unwrap();
    assert!(session.portal_url.starts_with("https://billing.example.com/"));
    assert_eq!(
        server.backend.query("POST /subscriptions/portal")["return_url"],
        "http://localhost:3000/settings?tab=billing"
    );
}

#[tokio::test]
async fn test_plan_status_reflects_counter() {
    let server = TestServer::start(FakeBackend::with_free_uses(2)).await;

    let status = server.api.subscriptions().plan_status().await.unwrap();
    assert_eq!(status.free_uses_remaining, 2);
}
