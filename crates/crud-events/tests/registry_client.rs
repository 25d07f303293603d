mod common;

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;
use crud_events::config::RegistryConfig;
use crud_events::{
    Codec, DescriptorKey, DescriptorStore, Envelope, EventBus, EventInterceptor, JsonCodec,
    MemoryBus, Publisher, RegistryClient, RegistryError, SchemaAnnouncement, StoreError,
};

fn write_schema(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn registry_config(server: &MockServer, token_env: &str) -> RegistryConfig {
    RegistryConfig {
        address: server.uri(),
        token_env: token_env.to_string(),
        ..Default::default()
    }
}

fn descriptor_body(id: &str, reference: &str, version: i32) -> serde_json::Value {
    json!({
        "MessageId": id,
        "MessageReference": reference,
        "Version": version
    })
}

#[tokio::test]
async fn register_then_intercept_publishes_registered_identity() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir, "widget.schema", "message Widget {}");

    Mock::given(method("POST"))
        .and(path("/register_message"))
        .and(header("Authorization", "token-abc"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({
            "application_id": "app1",
            "package_name": "pkgA",
            "message_name": "Widget",
            "encoded_message": "bWVzc2FnZSBXaWRnZXQge30="
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(descriptor_body(WIDGET_ID, "pkgA.Widget.v1", 1)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = DescriptorStore::new_shared();
    let client = RegistryClient::new(&registry_config(&server, "SECRET_JWT"), store.clone())
        .unwrap()
        .with_auth_token(Some("token-abc".into()));

    let descriptor = client
        .register_message("app1", "pkgA", "Widget", &schema)
        .await
        .unwrap();
    assert_eq!(descriptor.message_id.to_string(), WIDGET_ID);
    assert_eq!(descriptor.message_reference, "pkgA.Widget.v1");
    assert_eq!(descriptor.version, 1);

    let bus = Arc::new(RecordingBus::new());
    let interceptor = EventInterceptor::new(
        events_config(true),
        store,
        Some(bus.clone() as Arc<dyn EventBus>),
    )
    .unwrap();
    let request = widget("bolt");
    let result: Result<(), HandlerError> = interceptor
        .intercept(request.clone(), |_| async { Ok(()) })
        .await;
    assert_eq!(result, Ok(()));

    let calls = bus.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!((calls[0].bus_name.as_str(), calls[0].topic.as_str()), ("pubsub", "crud"));
    let envelope: Envelope = JsonCodec.decode(&calls[0].data).unwrap();
    assert_eq!(envelope.message_uuid.to_string(), WIDGET_ID);
    assert_eq!(envelope.reference, "pkgA.Widget.v1");
    assert_eq!(envelope.encoded_payload, JsonCodec.encode(&request).unwrap());
}

#[tokio::test]
async fn missing_credential_omits_authorization_header() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir, "widget.schema", "message Widget {}");

    Mock::given(method("POST"))
        .and(path("/register_message"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(descriptor_body(WIDGET_ID, "pkgA.Widget.v1", 1)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = RegistryClient::new(
        &registry_config(&server, "CRUD_EVENTS_TEST_TOKEN_UNSET"),
        DescriptorStore::new_shared(),
    )
    .unwrap()
    .with_auth_token(None);

    client
        .register_message("app1", "pkgA", "Widget", &schema)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn second_registration_replaces_the_first() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let v1 = write_schema(&dir, "widget_v1.schema", "v1");
    let v2 = write_schema(&dir, "widget_v2.schema", "v2");
    let second_id = "22222222-2222-2222-2222-222222222222";

    // "v1" and "v2" encode to "djE=" and "djI=".
    Mock::given(method("POST"))
        .and(path("/register_message"))
        .and(body_json(json!({
            "application_id": "app1",
            "package_name": "pkgA",
            "message_name": "Widget",
            "encoded_message": "djE="
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(descriptor_body(WIDGET_ID, "pkgA.Widget.v1", 1)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/register_message"))
        .and(body_json(json!({
            "application_id": "app1",
            "package_name": "pkgA",
            "message_name": "Widget",
            "encoded_message": "djI="
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message_id": second_id,
            "message_reference": "pkgA.Widget.v2",
            "version": 2
        })))
        .mount(&server)
        .await;

    let store = DescriptorStore::new_shared();
    let client = RegistryClient::new(
        &registry_config(&server, "CRUD_EVENTS_TEST_TOKEN_UNSET"),
        store.clone(),
    )
    .unwrap();

    client.register_message("app1", "pkgA", "Widget", &v1).await.unwrap();
    client.register_message("app1", "pkgA", "Widget", &v2).await.unwrap();

    let stored = store
        .get(&DescriptorKey::for_message("app1", "pkgA", "Widget"))
        .unwrap();
    assert_eq!(stored.message_id.to_string(), second_id);
    assert_eq!(stored.message_reference, "pkgA.Widget.v2");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn missing_schema_file_is_io_error() {
    let server = MockServer::start().await;
    let client = RegistryClient::new(
        &registry_config(&server, "CRUD_EVENTS_TEST_TOKEN_UNSET"),
        DescriptorStore::new_shared(),
    )
    .unwrap();

    let err = client
        .register_message("app1", "pkgA", "Widget", "/nonexistent/widget.schema")
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Io { .. }));
}

#[tokio::test]
async fn rejected_registration_is_reported_and_not_stored() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir, "widget.schema", "message Widget {}");

    Mock::given(method("POST"))
        .and(path("/register_message"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&server)
        .await;

    let store = DescriptorStore::new_shared();
    let client = RegistryClient::new(
        &registry_config(&server, "CRUD_EVENTS_TEST_TOKEN_UNSET"),
        store.clone(),
    )
    .unwrap();

    let err = client
        .register_message("app1", "pkgA", "Widget", &schema)
        .await
        .unwrap_err();
    match err {
        RegistryError::Rejected { status, body, .. } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid token");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn unparseable_response_is_parse_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir, "widget.schema", "message Widget {}");

    Mock::given(method("POST"))
        .and(path("/register_message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MessageId": "not-a-uuid",
            "MessageReference": "pkgA.Widget.v1"
        })))
        .mount(&server)
        .await;

    let store = DescriptorStore::new_shared();
    let client = RegistryClient::new(
        &registry_config(&server, "CRUD_EVENTS_TEST_TOKEN_UNSET"),
        store.clone(),
    )
    .unwrap();

    let err = client
        .register_message("app1", "pkgA", "Widget", &schema)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Parse(_)));
    assert_eq!(
        store.get(&DescriptorKey::for_message("app1", "pkgA", "Widget")),
        Err(StoreError::NotFound(DescriptorKey::for_message(
            "app1", "pkgA", "Widget"
        )))
    );
}

#[tokio::test]
async fn unreachable_registry_is_registration_error() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir, "widget.schema", "message Widget {}");
    let config = RegistryConfig {
        // Port 9 (discard) is not expected to accept HTTP connections.
        address: "http://127.0.0.1:9".to_string(),
        token_env: "CRUD_EVENTS_TEST_TOKEN_UNSET".to_string(),
        timeout_secs: 2,
        ..Default::default()
    };
    let client = RegistryClient::new(&config, DescriptorStore::new_shared()).unwrap();

    let err = client
        .register_message("app1", "pkgA", "Widget", &schema)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Registration(_)));
}

#[tokio::test]
async fn successful_registration_is_announced() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir, "widget.schema", "message Widget {}");

    Mock::given(method("POST"))
        .and(path("/register_message"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(descriptor_body(WIDGET_ID, "pkgA.Widget.v1", 4)),
        )
        .mount(&server)
        .await;

    let bus = MemoryBus::new_shared();
    let mut receiver = bus.subscribe();
    let client = RegistryClient::new(
        &registry_config(&server, "CRUD_EVENTS_TEST_TOKEN_UNSET"),
        DescriptorStore::new_shared(),
    )
    .unwrap()
    .with_announcements(
        Publisher::with_client(bus.clone()),
        "pubsub",
        "schemas",
    );

    client
        .register_message("app1", "pkgA", "Widget", &schema)
        .await
        .unwrap();

    let event = receiver.recv().await.unwrap();
    assert_eq!(event.topic, "schemas");
    let announcement = SchemaAnnouncement::decode(&event.data).unwrap();
    assert_eq!(announcement.application_id, "app1");
    assert_eq!(announcement.message_name, "Widget");
    assert_eq!(announcement.version, 4);
    assert_eq!(announcement.encoded_file, b"message Widget {}");
}

#[tokio::test]
async fn failed_announcement_does_not_fail_registration() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir, "widget.schema", "message Widget {}");

    Mock::given(method("POST"))
        .and(path("/register_message"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(descriptor_body(WIDGET_ID, "pkgA.Widget.v1", 1)),
        )
        .mount(&server)
        .await;

    let bus = Arc::new(RecordingBus::failing());
    let client = RegistryClient::new(
        &registry_config(&server, "CRUD_EVENTS_TEST_TOKEN_UNSET"),
        DescriptorStore::new_shared(),
    )
    .unwrap()
    .with_announcements(Publisher::with_client(bus.clone()), "pubsub", "schemas");

    let descriptor = client
        .register_message("app1", "pkgA", "Widget", &schema)
        .await
        .unwrap();
    assert_eq!(descriptor.message_reference, "pkgA.Widget.v1");
    assert_eq!(bus.calls().len(), 1);
    assert!(client.store().contains(&DescriptorKey::for_message("app1", "pkgA", "Widget")));
}
