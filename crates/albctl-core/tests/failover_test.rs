#![allow(clippy::unwrap_used)]
// Core workflows against a mock controller.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use albctl_core::ops::{alerts, failover};
use albctl_core::{AuthCredentials, Controller, ControllerConfig, CoreError};

// ── Helpers ─────────────────────────────────────────────────────────

async fn connect(server: &MockServer) -> Controller {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "csrftoken=tok-1; Path=/")
                .set_body_json(json!({"version": {"Version": "22.1.5"}})),
        )
        .mount(server)
        .await;

    let config = ControllerConfig::new(
        Url::parse(&server.uri()).unwrap(),
        AuthCredentials::Password {
            username: "admin".into(),
            password: SecretString::from("secret".to_string()),
        },
    );
    Controller::connect(config).await.unwrap()
}

fn pool_group() -> serde_json::Value {
    json!({
        "uuid": "poolgroup-1",
        "name": "pg",
        "members": [
            {"pool_ref": "https://ctrl/api/pool/pool-primary", "priority_label": "10"},
            {"pool_ref": "https://ctrl/api/pool/pool-backup", "priority_label": "5"}
        ]
    })
}

async fn mount_group(server: &MockServer, primary_state: &str, backup_state: &str) {
    Mock::given(method("GET"))
        .and(path("/api/poolgroup"))
        .and(query_param("refers_to", "pool:pool-primary"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"count": 1, "results": [pool_group()]})),
        )
        .mount(server)
        .await;
    for (uuid, name, state) in [
        ("pool-primary", "primary", primary_state),
        ("pool-backup", "backup", backup_state),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/api/pool/{uuid}/runtime/detail")))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!([{"name": name, "oper_status": {"state": state}}]),
            ))
            .mount(server)
            .await;
    }
}

// ── Failover ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_adopts_controller_version() {
    let server = MockServer::start().await;
    let ctrl = connect(&server).await;
    assert_eq!(ctrl.api_version().as_deref(), Some("22.1.5"));
    assert_eq!(ctrl.tenant(), "admin");
}

#[tokio::test]
async fn test_failover_swaps_after_conflict() {
    let server = MockServer::start().await;
    let ctrl = connect(&server).await;
    mount_group(&server, "OPER_DOWN", "OPER_UP").await;

    let swapped = json!({"members": [
        {"priority_label": "5"},
        {"priority_label": "10"}
    ]});
    Mock::given(method("PUT"))
        .and(path("/api/poolgroup/poolgroup-1"))
        .respond_with(ResponseTemplate::new(412))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/poolgroup/poolgroup-1"))
        .and(body_partial_json(swapped))
        .respond_with(ResponseTemplate::new(200).set_body_json(pool_group()))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = failover::failover(&ctrl, "pool-primary", "primary")
        .await
        .unwrap();
    assert_eq!(
        outcome.to_string(),
        "Pool backup priority changed to 10, Pool primary priority changed to 5"
    );
}

#[tokio::test]
async fn test_failover_gives_up_after_five_conflicts() {
    let server = MockServer::start().await;
    let ctrl = connect(&server).await;
    mount_group(&server, "OPER_DOWN", "OPER_UP").await;

    Mock::given(method("PUT"))
        .and(path("/api/poolgroup/poolgroup-1"))
        .respond_with(ResponseTemplate::new(412))
        .expect(5)
        .mount(&server)
        .await;

    let err = failover::failover(&ctrl, "pool-primary", "primary")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::OperationFailed { ref message } if message == "Too many retry attempts - aborting!"));
}

#[tokio::test]
async fn test_failover_leaves_healthy_group_alone() {
    let server = MockServer::start().await;
    let ctrl = connect(&server).await;
    mount_group(&server, "OPER_UP", "OPER_DOWN").await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = failover::failover(&ctrl, "pool-primary", "primary")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        failover::FailoverOutcome::NoActionNeeded {
            up: "primary".into(),
            down: "backup".into()
        }
    );
}

#[tokio::test]
async fn test_failover_without_pool_group() {
    let server = MockServer::start().await;
    let ctrl = connect(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/poolgroup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 0, "results": []})))
        .mount(&server)
        .await;

    let outcome = failover::failover(&ctrl, "pool-x", "lonely")
        .await
        .unwrap();
    assert_eq!(outcome.to_string(), "No pool group found referencing pool lonely");
}

// ── Alerts ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_clear_vs_down_alerts() {
    let server = MockServer::start().await;
    let ctrl = connect(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/alert"))
        .and(query_param("obj_ref", "virtualservice-1"))
        .and(query_param("search", "(event_id,VS_DOWN)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "results": [{"uuid": "alert-1"}, {"uuid": "alert-2"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/alert/alert-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/alert/alert-2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let cleared = alerts::clear_vs_down_alerts(&ctrl, "virtualservice-1")
        .await
        .unwrap();
    assert_eq!(cleared, vec!["alert-1".to_owned()]);
}
