//! Authenticated fetch against mock collaborators.

use super::harness::{session_for, MockAuthService, MockTransport, RecordingNavigator};
use crate::interceptor::{CredentialPolicy, FetchInterceptor};
use crate::redirect::RedirectPolicy;
use crate::session::SessionOracle;
use crate::transport::{RequestInit, StructuredRequest};
use crate::AuthError;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use std::sync::Arc;

const PAGE: &str = "https://app.test/admin/data?tab=2";

struct Fixture {
    auth: Arc<MockAuthService>,
    transport: Arc<MockTransport>,
    navigator: Arc<RecordingNavigator>,
    interceptor: FetchInterceptor,
}

fn fixture(auth: MockAuthService, policy: CredentialPolicy) -> Fixture {
    let auth = Arc::new(auth);
    let transport = Arc::new(MockTransport::new());
    let navigator = Arc::new(RecordingNavigator::new(PAGE));
    let oracle = Arc::new(SessionOracle::new(auth.clone()));
    let interceptor = FetchInterceptor::new(
        oracle,
        transport.clone(),
        navigator.clone(),
        RedirectPolicy::default(),
        policy,
    );
    Fixture {
        auth,
        transport,
        navigator,
        interceptor,
    }
}

#[tokio::test]
async fn enforce_without_session_redirects_before_sending() {
    let f = fixture(MockAuthService::new(), CredentialPolicy::Enforce);

    let err = f
        .interceptor
        .fetch("/api/data", RequestInit::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Unauthenticated(_)));
    assert_eq!(f.transport.request_count(), 0);
    assert_eq!(
        f.navigator.replaced(),
        vec!["/login.html?redirect=%2Fadmin%2Fdata%3Ftab%3D2".to_string()]
    );
}

#[tokio::test]
async fn enforce_redirects_when_session_lookup_fails() {
    let auth = MockAuthService::new();
    auth.fail_get_session_with("service unavailable");
    let f = fixture(auth, CredentialPolicy::Enforce);

    let err = f
        .interceptor
        .fetch("/api/data", RequestInit::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Remote(_)));
    assert_eq!(f.transport.request_count(), 0);
    assert!(f.navigator.last_redirect().is_some());
}

#[tokio::test]
async fn best_effort_without_session_sends_without_header() {
    let f = fixture(MockAuthService::new(), CredentialPolicy::BestEffort);

    let response = f
        .interceptor
        .fetch("/api/data", RequestInit::default())
        .await
        .unwrap();

    assert!(response.is_success());
    let requests = f.transport.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].authorization().is_none());
    assert!(f.navigator.replaced().is_empty());
}

#[tokio::test]
async fn protected_call_gets_bearer_token() {
    for policy in [CredentialPolicy::Enforce, CredentialPolicy::BestEffort] {
        let f = fixture(MockAuthService::with_session(session_for("t@ri.edu.sg", "T")), policy);
        f.interceptor
            .fetch("/api/data", RequestInit::default())
            .await
            .unwrap();
        let requests = f.transport.requests();
        assert_eq!(requests[0].url, "https://app.test/api/data");
        assert_eq!(requests[0].authorization(), Some("Bearer T"));
        assert!(f.navigator.replaced().is_empty());
    }
}

#[tokio::test]
async fn unprotected_calls_pass_through_unmodified() {
    let f = fixture(
        MockAuthService::with_session(session_for("t@ri.edu.sg", "T")),
        CredentialPolicy::Enforce,
    );

    for target in [
        "/public/asset.png",
        "https://cdn.other.test/api/data",
        "http://[::1",
    ] {
        f.interceptor
            .fetch(target, RequestInit::default())
            .await
            .unwrap();
    }

    let requests = f.transport.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.authorization().is_none()));
    assert_eq!(requests[2].url, "http://[::1");
    // No credential lookup happens for calls that do not need one.
    assert_eq!(f.auth.get_session_calls(), 0);
}

#[tokio::test]
async fn structured_request_keeps_headers_and_options() {
    let f = fixture(
        MockAuthService::with_session(session_for("t@ri.edu.sg", "T")),
        CredentialPolicy::Enforce,
    );

    let mut request = StructuredRequest::new(Method::POST, "https://app.test/api/items");
    request
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    request
        .headers
        .insert(AUTHORIZATION, HeaderValue::from_static("Bearer stale"));
    request.body = Some(r#"{"name":"x"}"#.to_string());

    f.interceptor
        .fetch(request, RequestInit::default())
        .await
        .unwrap();

    let sent = &f.transport.requests()[0];
    assert_eq!(sent.method, Method::POST);
    assert_eq!(sent.body.as_deref(), Some(r#"{"name":"x"}"#));
    assert_eq!(sent.headers.get(CONTENT_TYPE).unwrap(), "application/json");
    assert_eq!(sent.authorization(), Some("Bearer T"));
    assert_eq!(sent.headers.get_all(AUTHORIZATION).iter().count(), 1);
}

#[tokio::test]
async fn token_is_looked_up_once_and_then_cached() {
    let f = fixture(
        MockAuthService::with_session(session_for("t@ri.edu.sg", "T")),
        CredentialPolicy::Enforce,
    );

    for _ in 0..3 {
        f.interceptor
            .fetch("/api/data", RequestInit::default())
            .await
            .unwrap();
    }
    assert_eq!(f.auth.get_session_calls(), 1);
    assert_eq!(f.transport.request_count(), 3);
}
