#![allow(clippy::unwrap_used)]
// End-to-end lifecycle tests: configuration tree in, HTTP against a mock
// control plane, configuration tree out.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tmc_core::{
    Block, CoreError, Credentials, ErrorKind, Lifecycle, PollSettings, ResourceKind, TmcClient,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, TmcClient) {
    let server = MockServer::start().await;
    let client = TmcClient::with_client(
        &server.uri(),
        reqwest::Client::new(),
        Credentials::AccessToken(SecretString::from("static-token")),
    )
    .unwrap();
    (server, client)
}

fn tree(value: Value) -> Block {
    value.as_object().cloned().unwrap()
}

fn fast_poll() -> PollSettings {
    PollSettings::new(Duration::from_millis(10), Duration::from_secs(5))
}

fn dp_tree() -> Block {
    tree(json!({
        "scope": [{
            "cluster": [{
                "name": "c1",
                "management_cluster_name": "attached",
                "provisioner_name": "attached"
            }]
        }],
        "spec": [{ "backup_location_names": ["default"] }]
    }))
}

fn dp_object(phase: &str) -> Value {
    json!({
        "fullName": {
            "clusterName": "c1",
            "managementClusterName": "attached",
            "provisionerName": "attached"
        },
        "meta": { "uid": "dp-1" },
        "spec": { "backupLocationNames": ["default"] },
        "status": { "phase": phase }
    })
}

fn dp_list(phase: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "dataProtections": [dp_object(phase)] }))
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "error": "not found",
        "code": 5,
        "message": "data protection not found"
    }))
}

// ── Cluster group ───────────────────────────────────────────────────

#[tokio::test]
async fn test_cluster_group_create_round_trip() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1alpha1/clustergroups"))
        .and(body_partial_json(json!({
            "clusterGroup": {
                "fullName": { "name": "g1" },
                "meta": { "description": "prod", "labels": { "env": "prod" } }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "clusterGroup": {
                "fullName": { "name": "g1", "orgId": "org-1" },
                "meta": {
                    "uid": "cg-1",
                    "description": "prod",
                    "labels": { "env": "prod" },
                    "resourceVersion": "1"
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let input = tree(json!({
        "name": "g1",
        "meta": [{ "description": "prod", "labels": { "env": "prod" } }]
    }));
    let state = Lifecycle::new(&client)
        .create(ResourceKind::ClusterGroup, &input)
        .await
        .unwrap();

    assert_eq!(
        Value::Object(state),
        json!({
            "name": "g1",
            "meta": [{
                "description": "prod",
                "labels": { "env": "prod" },
                "uid": "cg-1",
                "resource_version": "1"
            }]
        })
    );
}

#[tokio::test]
async fn test_cluster_group_read_not_found_clears_state() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1alpha1/clustergroups/g1"))
        .respond_with(not_found())
        .mount(&server)
        .await;

    let state = Lifecycle::new(&client)
        .read(ResourceKind::ClusterGroup, &tree(json!({ "name": "g1" })))
        .await
        .unwrap();
    assert!(state.is_none());
}

#[tokio::test]
async fn test_cluster_group_delete_already_gone_is_success() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/v1alpha1/clustergroups/g1"))
        .respond_with(not_found())
        .expect(1)
        .mount(&server)
        .await;

    Lifecycle::new(&client)
        .delete(ResourceKind::ClusterGroup, &tree(json!({ "name": "g1" })))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_conflict_is_surfaced_with_resource_identity() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1alpha1/clustergroups"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": "already exists",
            "code": 6,
            "message": "cluster group g1 already exists"
        })))
        .mount(&server)
        .await;

    let err = Lifecycle::new(&client)
        .create(ResourceKind::ClusterGroup, &tree(json!({ "name": "g1" })))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.to_string().starts_with("create cluster_group/g1:"), "{err}");
}

#[tokio::test]
async fn test_invalid_tree_fails_before_any_request() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = Lifecycle::new(&client)
        .create(ResourceKind::ClusterGroup, &tree(json!({ "name": 7 })))
        .await
        .unwrap_err();
    assert!(err.is_validation(), "{err:?}");
}

// ── Data protection ─────────────────────────────────────────────────

#[tokio::test]
async fn test_data_protection_create_polls_until_ready() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1alpha1/clusters/c1/dataprotection"))
        .and(body_partial_json(json!({
            "dataProtection": {
                "fullName": { "clusterName": "c1", "managementClusterName": "attached" },
                "spec": { "backupLocationNames": ["default"] }
            }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "dataProtection": dp_object("PENDING") })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1alpha1/clusters/c1/dataprotection"))
        .and(query_param("fullName.managementClusterName", "attached"))
        .respond_with(dp_list("CREATING"))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1alpha1/clusters/c1/dataprotection"))
        .respond_with(dp_list("READY"))
        .mount(&server)
        .await;

    let state = Lifecycle::new(&client)
        .with_poll(fast_poll())
        .create(ResourceKind::DataProtection, &dp_tree())
        .await
        .unwrap();

    assert_eq!(state.get("phase"), Some(&json!("READY")));
    assert_eq!(state.get("scope"), dp_tree().get("scope"));
    assert_eq!(
        state.get("spec"),
        Some(&json!([{ "backup_location_names": ["default"], "selector": [] }]))
    );
}

#[tokio::test]
async fn test_data_protection_error_phase_is_fatal() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1alpha1/clusters/c1/dataprotection"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "dataProtection": dp_object("PENDING") })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1alpha1/clusters/c1/dataprotection"))
        .respond_with(dp_list("ERROR"))
        .expect(1)
        .mount(&server)
        .await;

    let err = Lifecycle::new(&client)
        .with_poll(fast_poll())
        .create(ResourceKind::DataProtection, &dp_tree())
        .await
        .unwrap_err();

    assert!(matches!(err.root(), CoreError::RemoteFailed { .. }), "{err:?}");
    assert!(err.to_string().contains("data_protection on cluster/c1"));
}

#[tokio::test]
async fn test_data_protection_vanishing_after_ready_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1alpha1/clusters/c1/dataprotection"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "dataProtection": dp_object("PENDING") })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1alpha1/clusters/c1/dataprotection"))
        .respond_with(dp_list("READY"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1alpha1/clusters/c1/dataprotection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "dataProtections": [] })))
        .mount(&server)
        .await;

    let err = Lifecycle::new(&client)
        .with_poll(fast_poll())
        .create(ResourceKind::DataProtection, &dp_tree())
        .await
        .unwrap_err();

    assert!(matches!(err.root(), CoreError::Gone { .. }), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!err.is_validation());
}

#[tokio::test]
async fn test_data_protection_create_times_out() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1alpha1/clusters/c1/dataprotection"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "dataProtection": dp_object("PENDING") })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1alpha1/clusters/c1/dataprotection"))
        .respond_with(dp_list("CREATING"))
        .mount(&server)
        .await;

    let err = Lifecycle::new(&client)
        .with_poll(PollSettings::new(
            Duration::from_millis(10),
            Duration::from_millis(50),
        ))
        .create(ResourceKind::DataProtection, &dp_tree())
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "{err:?}");
}

#[tokio::test]
async fn test_data_protection_delete_waits_until_gone() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/v1alpha1/clusters/c1/dataprotection"))
        .and(query_param("fullName.provisionerName", "attached"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1alpha1/clusters/c1/dataprotection"))
        .respond_with(dp_list("DELETING"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1alpha1/clusters/c1/dataprotection"))
        .respond_with(not_found())
        .expect(1)
        .mount(&server)
        .await;

    Lifecycle::new(&client)
        .with_poll(fast_poll())
        .delete(ResourceKind::DataProtection, &dp_tree())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_data_protection_read_empty_list_clears_state() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1alpha1/clustergroups/g1/dataprotection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "dataProtections": [] })))
        .mount(&server)
        .await;

    let input = tree(json!({ "scope": [{ "cluster_group": [{ "name": "g1" }] }] }));
    let state = Lifecycle::new(&client)
        .read(ResourceKind::DataProtection, &input)
        .await
        .unwrap();
    assert!(state.is_none());
}

#[tokio::test]
async fn test_ambiguous_scope_makes_no_request() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let input = tree(json!({
        "scope": [{
            "cluster": [{ "name": "c1" }],
            "cluster_group": [{ "name": "g1" }]
        }]
    }));
    let err = Lifecycle::new(&client)
        .create(ResourceKind::DataProtection, &input)
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert!(err.to_string().contains("more than one scope block found"));
}

// ── Credential refresh ──────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_refreshes_and_retries_once() {
    let server = MockServer::start().await;
    let csp_url = Url::parse(&server.uri()).unwrap();

    Mock::given(method("POST"))
        .and(path("/csp/gateway/am/api/auth/api-tokens/authorize"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "access_token": "expired" })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/csp/gateway/am/api/auth/api-tokens/authorize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "fresh" })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1alpha1/clustergroups/g1"))
        .and(header("authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "unauthenticated",
            "code": 16,
            "message": "token expired"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1alpha1/clustergroups/g1"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "clusterGroup": { "fullName": { "name": "g1" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = TmcClient::with_client(
        &server.uri(),
        reqwest::Client::new(),
        Credentials::ApiToken {
            token: SecretString::from("api-token"),
            csp_url,
        },
    )
    .unwrap();

    let state = Lifecycle::new(&client)
        .read(ResourceKind::ClusterGroup, &tree(json!({ "name": "g1" })))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(state.get("name"), Some(&json!("g1")));
}
