//! Whole-page flows through `PageContext`.

use super::harness::{
    returning_user, session_for, MockAuthService, MockStore, RecordingNavigator, TestGate,
};
use crate::guard::PageKind;
use crate::guard_fsm::GuardState;
use crate::login_page::StatusLine;
use crate::page::{on_missing_config, PageContext};
use crate::redirect::RedirectPolicy;
use crate::transport::RequestInit;
use crate::types::AuthEvent;
use crate::AuthError;
use std::time::Duration;

async fn wait_for_redirect(navigator: &RecordingNavigator) -> String {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let Some(destination) = navigator.last_redirect() {
                return destination;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("no redirect issued")
}

#[tokio::test]
async fn protected_page_renders_and_authenticates_api_calls() {
    let gate = TestGate::new(
        MockAuthService::with_session(session_for("t@ri.edu.sg", "T")),
        "https://app.test/admin",
    );
    let page = PageContext::open(PageKind::Protected, TestGate::settings(), gate.deps())
        .await
        .unwrap();

    assert_eq!(page.state(), GuardState::Authorized);
    assert_eq!(page.authorized_user().unwrap().id, "user-t");
    assert!(page.login_page().is_none());

    page.fetch("/api/data", RequestInit::default()).await.unwrap();
    page.fetch("/public/asset.png", RequestInit::default())
        .await
        .unwrap();

    let requests = gate.transport.requests();
    assert_eq!(requests[0].authorization(), Some("Bearer T"));
    assert!(requests[1].authorization().is_none());
    page.close();
}

#[tokio::test]
async fn protected_page_without_session_redirects_and_blocks_api_calls() {
    let gate = TestGate::new(MockAuthService::new(), "https://app.test/admin/data");
    let page = PageContext::open(PageKind::Protected, TestGate::settings(), gate.deps())
        .await
        .unwrap();

    assert_eq!(page.state(), GuardState::Unauthorized);
    assert_eq!(
        gate.navigator.replaced(),
        vec!["/login.html?redirect=%2Fadmin%2Fdata".to_string()]
    );

    let err = page
        .fetch("/api/data", RequestInit::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Unauthenticated(_)));
    assert_eq!(gate.transport.request_count(), 0);
}

#[tokio::test]
async fn login_page_with_existing_session_moves_on() {
    let gate = TestGate::new(
        MockAuthService::with_session(returning_user(session_for("t@ri.edu.sg", "T"))),
        "https://app.test/login.html?redirect=%2Freports",
    );
    let page = PageContext::open(PageKind::Login, TestGate::settings(), gate.deps())
        .await
        .unwrap();

    assert_eq!(page.state(), GuardState::Authorized);
    assert_eq!(gate.navigator.replaced(), vec!["/reports".to_string()]);
}

#[tokio::test]
async fn otp_login_flow_records_login_and_redirects() {
    let gate = TestGate::new(
        MockAuthService::new(),
        "https://app.test/login.html?redirect=%2Freports",
    );
    gate.auth
        .set_verified_session(returning_user(session_for("t@ufinity.com", "T")));
    let page = PageContext::open(PageKind::Login, TestGate::settings(), gate.deps())
        .await
        .unwrap();
    assert!(gate.navigator.replaced().is_empty());

    let login = page.login_page().unwrap();
    assert_eq!(
        login.send_code("t@ufinity.com").await,
        StatusLine::success("OTP sent. Check your inbox.")
    );
    assert_eq!(
        gate.auth.otp_requests()[0].redirect_to.as_deref(),
        Some("https://app.test/welcome")
    );
    assert_eq!(
        login.verify(None, "123456").await,
        StatusLine::success("Signed in successfully.")
    );

    assert_eq!(wait_for_redirect(&gate.navigator).await, "/reports");
    let rows = gate.store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].1["email"], "t@ufinity.com");
    assert_eq!(rows[0].1["user_agent"], "gate-tests/1.0");
    assert_eq!(page.state(), GuardState::Authorized);
}

#[tokio::test]
async fn otp_login_redirects_even_when_audit_insert_fails() {
    let gate = TestGate::with_store(
        MockAuthService::new(),
        MockStore::failing("permission denied for table user_logins"),
        "https://app.test/login.html",
    );
    let page = PageContext::open(PageKind::Login, TestGate::settings(), gate.deps())
        .await
        .unwrap();

    let login = page.login_page().unwrap();
    login.send_code("t@schools.gov.sg").await;
    login.verify(None, "123456").await;

    // Never signed in before, so the first-login destination wins.
    assert_eq!(wait_for_redirect(&gate.navigator).await, "/welcome");
    assert!(gate.store.rows().is_empty());
}

#[tokio::test]
async fn navbar_sign_out_returns_to_login() {
    let gate = TestGate::new(
        MockAuthService::with_session(session_for("t@ri.edu.sg", "T")),
        "https://app.test/admin/reports",
    );
    let page = PageContext::open(PageKind::Protected, TestGate::settings(), gate.deps())
        .await
        .unwrap();

    let destination = page.sign_out().await;

    assert_eq!(destination, "/login.html?redirect=%2Fadmin");
    assert_eq!(gate.navigator.replaced(), vec![destination]);
    assert!(gate.auth.stored_session().is_none());
}

#[tokio::test]
async fn navbar_sign_out_redirects_even_when_service_fails() {
    let auth = MockAuthService::with_session(session_for("t@ri.edu.sg", "T"));
    auth.fail_sign_out_with("network error");
    let gate = TestGate::new(auth, "https://app.test/admin");
    let page = PageContext::open(PageKind::Protected, TestGate::settings(), gate.deps())
        .await
        .unwrap();

    assert_eq!(page.sign_out().await, "/login.html?redirect=%2Fadmin");
    assert_eq!(gate.navigator.replaced().len(), 1);
}

#[tokio::test]
async fn sign_out_elsewhere_kicks_protected_page_to_login() {
    let gate = TestGate::new(
        MockAuthService::with_session(session_for("t@ri.edu.sg", "T")),
        "https://app.test/admin/data?x=1",
    );
    let page = PageContext::open(PageKind::Protected, TestGate::settings(), gate.deps())
        .await
        .unwrap();

    gate.auth.emit(AuthEvent::signed_out());

    assert_eq!(
        wait_for_redirect(&gate.navigator).await,
        "/login.html?redirect=%2Fadmin%2Fdata%3Fx%3D1"
    );
    assert!(page.oracle().cached().is_none());
}

#[test]
fn missing_config_fails_closed_on_protected_pages() {
    let err = AuthError::Config("SUPABASE_URL is not set".to_string());
    let redirects = RedirectPolicy::default();

    let navigator = RecordingNavigator::new("https://app.test/admin");
    let status = on_missing_config(PageKind::Protected, &navigator, &redirects, &err);
    assert!(status.is_error());
    assert_eq!(
        navigator.replaced(),
        vec!["/login.html?redirect=%2Fadmin".to_string()]
    );

    let navigator = RecordingNavigator::new("https://app.test/login.html");
    let status = on_missing_config(PageKind::Login, &navigator, &redirects, &err);
    assert!(status.error.contains("SUPABASE_URL is not set"));
    assert!(navigator.replaced().is_empty());
}
