//! Request lifecycle scenarios against the scripted fake transport.
//!
//! Covers both consumer faces: `Observer` subscriptions and the
//! `futures::Stream` returned by `Request::stream`.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use futures::stream::{FusedStream, StreamExt};
use serde_json::json;
use xhr_core::config::{REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE};
use xhr_core::fake::{FakeFactory, FakeTransport, Notification, RecordingObserver};
use xhr_core::{
    ConfigOverrides, ErrorKind, HttpMethod, RawResponse, RequestContext, ResponseSnapshot,
    ResponseTransform, ResponseType, XhrClient,
};

fn client(transport: &FakeTransport) -> XhrClient<FakeFactory> {
    XhrClient::new(
        FakeFactory::new()
            .with_same_domain(transport.clone())
            .with_cross_domain(transport.clone()),
    )
}

fn json_context() -> RequestContext<serde_json::Value> {
    RequestContext::new(ResponseTransform::json())
}

#[test]
fn json_get_emits_value_then_completes() {
    let transport = FakeTransport::new();
    let observer = RecordingObserver::new();
    let options = ConfigOverrides::new("/x")
        .method(HttpMethod::Get)
        .response_type(ResponseType::Json);
    let _subscription = client(&transport)
        .request(None, options, json_context())
        .subscribe(observer.clone());

    transport.respond(200, r#"{"a":1}"#);

    assert_eq!(
        observer.notifications(),
        vec![Notification::Next(json!({"a": 1})), Notification::Completed]
    );
}

#[test]
fn unauthorized_reports_body() {
    let transport = FakeTransport::new();
    let observer = RecordingObserver::<serde_json::Value>::new();
    let _subscription = client(&transport)
        .get(ConfigOverrides::new("/x"), json_context())
        .subscribe(observer.clone());

    transport.respond(401, "denied");

    assert_eq!(
        observer.notifications(),
        vec![Notification::Error {
            kind: ErrorKind::Auth,
            message: "denied".to_string()
        }]
    );
}

#[test]
fn server_error_without_body_reports_status() {
    let transport = FakeTransport::new();
    let observer = RecordingObserver::<serde_json::Value>::new();
    let _subscription = client(&transport)
        .get(ConfigOverrides::new("/x"), json_context())
        .subscribe(observer.clone());

    transport.respond(500, "");

    assert_eq!(
        observer.notifications(),
        vec![Notification::Error {
            kind: ErrorKind::Http,
            message: "Response code 500".to_string()
        }]
    );
}

#[test]
fn throwing_transform_is_invalid_payload_only() {
    let transport = FakeTransport::new();
    let observer = RecordingObserver::<serde_json::Value>::new();
    let _subscription = client(&transport)
        .get(ConfigOverrides::new("/x"), json_context())
        .subscribe(observer.clone());

    transport.respond(200, "{not json");

    let notifications = observer.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(observer.error_kinds(), vec![ErrorKind::InvalidPayload]);
}

#[test]
fn legacy_no_content_matches_no_content() {
    let transport = FakeTransport::new();
    let context = RequestContext::new(ResponseTransform::text());
    let request = client(&transport).get(ConfigOverrides::new("/x"), context);

    let legacy = RecordingObserver::new();
    let _s1 = request.subscribe(legacy.clone());
    transport.respond(1223, "");

    let plain = RecordingObserver::new();
    let _s2 = request.subscribe(plain.clone());
    transport.respond(204, "");

    assert_eq!(legacy.notifications(), plain.notifications());
    assert_eq!(
        plain.notifications(),
        vec![Notification::Next(String::new()), Notification::Completed]
    );
}

#[test]
fn timeout_before_completion_reports_once() {
    let transport = FakeTransport::new();
    let observer = RecordingObserver::<serde_json::Value>::new();
    let _subscription = client(&transport)
        .get(
            ConfigOverrides::new("/x").timeout(Duration::from_millis(50)),
            json_context(),
        )
        .subscribe(observer.clone());

    transport.fire_timeout();
    transport.respond(200, r#"{"a":1}"#);

    assert_eq!(
        observer.notifications(),
        vec![Notification::Error {
            kind: ErrorKind::Timeout,
            message: "timeout error".to_string()
        }]
    );
}

#[test]
fn cancel_before_completion_aborts_once_without_events() {
    let transport = FakeTransport::new();
    let observer = RecordingObserver::<serde_json::Value>::new();
    let mut subscription = client(&transport)
        .get(ConfigOverrides::new("/x"), json_context())
        .subscribe(observer.clone());

    subscription.dispose();
    subscription.dispose();
    transport.respond(200, r#"{"a":1}"#);

    assert_eq!(transport.abort_count(), 1);
    assert!(observer.notifications().is_empty());
}

#[test]
fn cancel_after_completion_is_noop() {
    let transport = FakeTransport::new();
    let observer = RecordingObserver::<serde_json::Value>::new();
    let mut subscription = client(&transport)
        .get(ConfigOverrides::new("/x"), json_context())
        .subscribe(observer.clone());

    transport.respond(200, r#"{"a":1}"#);
    subscription.dispose();

    assert_eq!(transport.abort_count(), 0);
    assert_eq!(observer.notifications().len(), 2);
}

#[test]
fn same_domain_request_carries_requested_with() {
    let transport = FakeTransport::new();
    let _subscription = client(&transport)
        .get(ConfigOverrides::new("/x"), json_context())
        .subscribe(RecordingObserver::new());

    let headers = transport.headers_at_send().unwrap();
    assert_eq!(
        headers.get(REQUESTED_WITH_HEADER).map(String::as_str),
        Some(REQUESTED_WITH_VALUE)
    );
}

#[test]
fn cross_domain_request_omits_requested_with() {
    let transport = FakeTransport::new();
    let factory = FakeFactory::new().with_cross_domain(transport.clone());
    let _subscription = XhrClient::new(factory.clone())
        .get(ConfigOverrides::new("/x").cross_domain(true), json_context())
        .subscribe(RecordingObserver::new());

    let headers = transport.headers_at_send().unwrap();
    assert!(!headers.contains_key(REQUESTED_WITH_HEADER));
    assert_eq!(factory.created(), vec![xhr_core::TransportKind::CrossDomain]);
}

#[test]
fn credentials_flag_follows_explicit_false_only() {
    let transport = FakeTransport::new();
    let _s1 = client(&transport)
        .get(ConfigOverrides::new("/x"), json_context())
        .subscribe(RecordingObserver::new());
    assert_eq!(transport.with_credentials(), Some(true));

    let _s2 = client(&transport)
        .get(
            ConfigOverrides::new("/x").with_credentials(false),
            json_context(),
        )
        .subscribe(RecordingObserver::new());
    assert_eq!(transport.with_credentials(), Some(false));
}

#[test]
fn structured_json_response_is_used() {
    let transport = FakeTransport::new();
    let observer = RecordingObserver::new();
    let _subscription = client(&transport)
        .get(ConfigOverrides::new("/x"), json_context())
        .subscribe(observer.clone());

    transport.complete(ResponseSnapshot {
        response: Some(RawResponse::Json(json!({"a": 2}))),
        ..ResponseSnapshot::completed(200, "")
    });

    assert_eq!(
        observer.notifications(),
        vec![Notification::Next(json!({"a": 2})), Notification::Completed]
    );
}

#[test]
fn dispose_racing_completion_never_emits_and_aborts() {
    for _ in 0..500 {
        let transport = FakeTransport::new();
        let observer = RecordingObserver::<serde_json::Value>::new();
        let mut subscription = client(&transport)
            .get(ConfigOverrides::new("/x"), json_context())
            .subscribe(observer.clone());

        let barrier = Arc::new(Barrier::new(2));
        let responder = {
            let barrier = Arc::clone(&barrier);
            let transport = transport.clone();
            thread::spawn(move || {
                barrier.wait();
                transport.respond(200, r#"{"a":1}"#);
            })
        };
        barrier.wait();
        subscription.dispose();
        responder.join().unwrap();

        let aborts = transport.abort_count();
        assert!(aborts <= 1, "aborted {aborts} times");
        match observer.notifications().as_slice() {
            [] => {}
            [Notification::Next(value), Notification::Completed] => {
                assert_eq!(*value, json!({"a": 1}));
                assert_eq!(aborts, 0, "emitted and aborted");
            }
            other => panic!("unexpected notifications: {other:?}"),
        }
    }
}

// --- stream face ---

#[tokio::test]
async fn stream_yields_single_value_then_ends() {
    let transport = FakeTransport::new();
    let mut stream = client(&transport)
        .get(ConfigOverrides::new("/x"), json_context())
        .stream();

    transport.respond(200, r#"{"a":1}"#);

    let value = stream.next().await.unwrap().unwrap();
    assert_eq!(value, json!({"a": 1}));
    assert!(stream.is_terminated());
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn stream_yields_single_error() {
    let transport = FakeTransport::new();
    let mut stream = client(&transport)
        .get(ConfigOverrides::new("/x"), json_context())
        .stream();

    transport.respond(410, "gone for good");

    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Gone);
    assert!(err.is_retry_candidate());
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn stream_completes_from_another_thread() {
    let transport = FakeTransport::new();
    let mut stream = client(&transport)
        .get(ConfigOverrides::new("/x"), json_context())
        .stream();

    let remote = transport.clone();
    let worker = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        remote.respond(200, r#"{"a":3}"#);
    });

    let value = stream.next().await.unwrap().unwrap();
    worker.join().unwrap();
    assert_eq!(value, json!({"a": 3}));
}

#[tokio::test]
async fn cancelled_stream_ends_without_item() {
    let transport = FakeTransport::new();
    let mut stream = client(&transport)
        .get(ConfigOverrides::new("/x"), json_context())
        .stream();

    stream.cancel();
    transport.respond(200, r#"{"a":1}"#);

    assert!(stream.next().await.is_none());
    assert_eq!(transport.abort_count(), 1);
}

#[test]
fn dropping_stream_aborts_request() {
    let transport = FakeTransport::new();
    let stream = client(&transport)
        .get(ConfigOverrides::new("/x"), json_context())
        .stream();

    drop(stream);

    assert_eq!(transport.abort_count(), 1);
}

#[tokio::test]
async fn dropping_finished_stream_does_not_abort() {
    let transport = FakeTransport::new();
    let mut stream = client(&transport)
        .get(ConfigOverrides::new("/x"), json_context())
        .stream();

    transport.respond(200, r#"{"a":1}"#);
    let _ = stream.next().await;
    drop(stream);

    assert_eq!(transport.abort_count(), 0);
}

#[tokio::test]
async fn transport_creation_failure_reaches_stream() {
    let client = XhrClient::new(FakeFactory::new());
    let mut stream = client
        .get(ConfigOverrides::new("/x"), json_context())
        .stream();

    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportCreation);
    assert!(stream.next().await.is_none());
}
