use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::StatusCode;
use httpmock::prelude::*;

use crate::checker::Checker;
use crate::cluster::kubeconfig::{BearerToken, ClusterCredentials};
use crate::cluster::{ClusterError, KubeClient, SecretSource};
use crate::config::settings::ExporterConfig;
use crate::observability::metrics::Metrics;
use crate::tests::common::{
    base_claims, json, render, sample_value, token_with, ANNOTATION_KEY, EXPIRES_IN,
};

fn client_for(server: &MockServer, token: BearerToken) -> KubeClient {
    KubeClient::new(ClusterCredentials {
        server: server.base_url(),
        bearer_token: Some(token),
        ..ClusterCredentials::default()
    })
    .expect("client")
}

fn static_token() -> BearerToken {
    BearerToken::Static("test-token".to_owned())
}

#[tokio::test]
async fn lists_namespace_names() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/namespaces")
                .header("authorization", "Bearer test-token");
            then.status(200).json_body(json!({
                "kind": "NamespaceList",
                "metadata": {},
                "items": [
                    {"metadata": {"name": "default"}},
                    {"metadata": {"name": "kube-system"}},
                    {"metadata": {}}
                ]
            }));
        })
        .await;

    let client = client_for(&server, static_token());
    let namespaces = client.list_namespaces().await.unwrap();

    mock.assert_async().await;
    assert_eq!(namespaces, vec!["default".to_owned(), "kube-system".to_owned()]);
}

#[tokio::test]
async fn secrets_are_filtered_and_decoded() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/namespaces/ns1/secrets")
                .query_param("labelSelector", "team=a")
                .query_param("limit", "500");
            then.status(200).json_body(json!({
                "kind": "SecretList",
                "metadata": {"continue": ""},
                "items": [{
                    "metadata": {
                        "name": "sa-token",
                        "namespace": "ns1",
                        "annotations": {ANNOTATION_KEY: "tok"}
                    },
                    "data": {
                        "tok": STANDARD.encode("header.payload.sig\n"),
                        "broken": "%%% not base64 %%%"
                    }
                }]
            }));
        })
        .await;

    let client = client_for(&server, static_token());
    let secrets = client.list_secrets("ns1", Some("team=a")).await.unwrap();

    mock.assert_async().await;
    assert_eq!(secrets.len(), 1);
    let secret = &secrets[0];
    assert_eq!(secret.name, "sa-token");
    assert_eq!(secret.namespace, "ns1");
    assert_eq!(secret.annotated_key(ANNOTATION_KEY), "tok");
    assert_eq!(secret.value("tok"), b"header.payload.sig\n");
    assert!(!secret.data.contains_key("broken"));
}

#[tokio::test]
async fn secret_without_data_has_empty_values() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/namespaces/ns1/secrets");
            then.status(200).json_body(json!({
                "items": [{"metadata": {"name": "empty"}}]
            }));
        })
        .await;

    let client = client_for(&server, static_token());
    let secrets = client.list_secrets("ns1", None).await.unwrap();

    assert_eq!(secrets[0].namespace, "ns1");
    assert!(secrets[0].value("tok").is_empty());
    assert_eq!(secrets[0].annotated_key(ANNOTATION_KEY), "");
}

#[tokio::test]
async fn forbidden_surfaces_the_status_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/namespaces");
            then.status(403).json_body(json!({
                "kind": "Status",
                "status": "Failure",
                "message": "namespaces is forbidden: User \"system:serviceaccount:default:jwt\" cannot list resource",
                "reason": "Forbidden",
                "code": 403
            }));
        })
        .await;

    let client = client_for(&server, static_token());
    match client.list_namespaces().await {
        Err(ClusterError::Status { status, message, .. }) => {
            assert_eq!(status, StatusCode::FORBIDDEN);
            assert!(message.starts_with("namespaces is forbidden"), "{}", message);
        }
        other => panic!("expected a status error, got {:?}", other),
    }
}

#[tokio::test]
async fn non_json_body_is_a_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/namespaces");
            then.status(200).body("<html>proxy login</html>");
        })
        .await;

    let client = client_for(&server, static_token());
    assert!(matches!(
        client.list_namespaces().await,
        Err(ClusterError::Decode { .. })
    ));
}

#[tokio::test]
async fn unreachable_server_is_a_request_error() {
    let client = KubeClient::new(ClusterCredentials {
        server: "http://127.0.0.1:1".to_owned(),
        ..ClusterCredentials::default()
    })
    .unwrap();

    assert!(matches!(
        client.list_namespaces().await,
        Err(ClusterError::Request { .. })
    ));
}

#[tokio::test]
async fn token_file_is_read_on_every_request() {
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("token");
    std::fs::write(&token_path, "first\n").unwrap();

    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/namespaces")
                .header("authorization", "Bearer first");
            then.status(200).json_body(json!({"items": []}));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/namespaces")
                .header("authorization", "Bearer second");
            then.status(200).json_body(json!({"items": []}));
        })
        .await;

    let client = client_for(&server, BearerToken::File(token_path.clone()));
    client.list_namespaces().await.unwrap();
    std::fs::write(&token_path, "second").unwrap();
    client.list_namespaces().await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn basic_auth_is_sent_without_a_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/namespaces")
                .header("authorization", format!("Basic {}", STANDARD.encode("admin:secret")));
            then.status(200).json_body(json!({"items": []}));
        })
        .await;

    let client = KubeClient::new(ClusterCredentials {
        server: server.base_url(),
        basic_auth: Some(("admin".to_owned(), "secret".to_owned())),
        ..ClusterCredentials::default()
    })
    .unwrap();
    client.list_namespaces().await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn cycle_against_the_api_server() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/namespaces");
            then.status(200).json_body(json!({
                "items": [{"metadata": {"name": "ns1"}}]
            }));
        })
        .await;
    let secrets = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/namespaces/ns1/secrets")
                .query_param("labelSelector", "team=a");
            then.status(200).json_body(json!({
                "items": [{
                    "metadata": {
                        "name": "sa-token",
                        "namespace": "ns1",
                        "annotations": {ANNOTATION_KEY: "tok"}
                    },
                    "data": {"tok": STANDARD.encode(token_with(base_claims(3600)))}
                }]
            }));
        })
        .await;

    let metrics = Metrics::new().unwrap();
    let config = ExporterConfig {
        label_selectors: vec!["team=a".to_owned()],
        ..ExporterConfig::default()
    };
    let mut checker = Checker::new(&config, client_for(&server, static_token()), metrics.clone());
    let report = checker.run_cycle().await;

    secrets.assert_async().await;
    assert_eq!(report.errors, 0);
    assert_eq!(report.exported, 1);
    let value = sample_value(
        &render(&metrics),
        EXPIRES_IN,
        &["secret_namespace=\"ns1\"", "secret_name=\"sa-token\"", "secret_key=\"tok\""],
    )
    .unwrap();
    assert!((3590.0..=3600.0).contains(&value), "{}", value);
}
