//! Contract tests for the collaborator clients against wiremock servers.
//!
//! ## Endpoints Tested
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET    | `{any}` | `fetch_*` |
//! | PUT    | `/{path}` | `host_*` |
//! | POST   | `/v1/service-offers/sign` | `sign_service_*` |
//! | POST   | `/v1/label-levels/sign` | `sign_label_level_*` |
//! | POST   | `/v1/participants/{id}/service-endpoints` | `add_service_endpoint_*` |
//! | POST   | `/v1/publish/service-offer` | `publish_*` |
//! | GET/POST | `/v1/secret/{id}` | `vault_*` |

use std::collections::HashMap;

use serde_json::json;
use trustgate_client::{
    ClientConfig, ClientError, DocumentFetcher, DocumentHost, MessageBroker, PublishMessage,
    SecretStore, ServiceSignRequest, Signer, SigningContext, TrustClient, PRIVATE_KEY_ENTRY,
};
use trustgate_core::{Did, ParticipantId};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(mock_server: &MockServer) -> TrustClient {
    let config = ClientConfig::local_mock(&mock_server.uri(), "test-token").unwrap();
    TrustClient::new(config).unwrap()
}

fn ctx() -> SigningContext {
    SigningContext {
        participant_id: ParticipantId::new(),
        did: Did::new("did:web:acme.example").unwrap(),
        verification_method: "did:web:acme.example#JWK2020-RSA".into(),
        private_key: zeroize::Zeroizing::new("pk".into()),
    }
}

// ── Remote fetch ─────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_json_returns_document() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resources/r1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"holderSignature": "x"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let url = format!("{}/resources/r1.json", mock_server.uri());
    let doc = client.fetcher().fetch_json(&url).await.unwrap();
    assert_eq!(doc["holderSignature"], "x");
}

#[tokio::test]
async fn fetch_json_maps_404_to_status_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let url = format!("{}/missing.json", mock_server.uri());
    match client.fetcher().fetch_json(&url).await.unwrap_err() {
        ClientError::Status { status, body, .. } => {
            assert_eq!(status, 404);
            assert_eq!(body, "gone");
        }
        other => panic!("expected Status, got: {other:?}"),
    }
}

#[tokio::test]
async fn fetch_json_rejects_non_json_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html/>"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let url = format!("{}/tnc", mock_server.uri());
    let err = client.fetcher().fetch_json(&url).await.unwrap_err();
    assert!(matches!(err, ClientError::Deserialization { .. }));

    let text = client.fetcher().fetch_text(&url).await.unwrap();
    assert_eq!(text, "<html/>");
}

// ── Hosting ──────────────────────────────────────────────────────────

#[tokio::test]
async fn host_puts_document_at_path() {
    let mock_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/p1/service_ab12_policy.json"))
        .and(body_partial_json(json!({"@type": "policy"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    client
        .host()
        .host("p1/service_ab12_policy.json", &json!({"@type": "policy"}))
        .await
        .unwrap();
}

#[tokio::test]
async fn host_surfaces_server_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.host().host("p/x.json", &json!({})).await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 503, .. }));
}

// ── Signer ───────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_service_sends_claims_and_parses_string_vc() {
    let mock_server = MockServer::start().await;
    let signed = json!({"selfDescriptionCredential": {}, "complianceCredential": {"id": "c1"}});
    Mock::given(method("POST"))
        .and(path("/v1/service-offers/sign"))
        .and(body_partial_json(json!({
            "name": "service_ab12",
            "did": "did:web:acme.example",
            "credentialSubject": {"gx:policy": ["https://h/p.json"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "serviceVc": signed.to_string(),
            "veracityData": {"trustIndex": 0.8}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let req = ServiceSignRequest {
        name: "service_ab12".into(),
        url: "https://h/p/service_ab12.json".into(),
        credential_subject: json!({"gx:policy": ["https://h/p.json"]}),
    };
    let out = client.signer().sign_service(&ctx(), &req).await.unwrap();
    assert_eq!(out.service_vc, signed);
    assert_eq!(out.veracity_data, Some(json!({"trustIndex": 0.8})));
}

#[tokio::test]
async fn sign_service_without_veracity() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/service-offers/sign"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "serviceVc": {"complianceCredential": {}},
            "veracityData": null
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let req = ServiceSignRequest {
        name: "n".into(),
        url: "u".into(),
        credential_subject: json!({}),
    };
    let out = client.signer().sign_service(&ctx(), &req).await.unwrap();
    assert!(out.veracity_data.is_none());
}

#[tokio::test]
async fn sign_label_level_handles_absent_result() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/label-levels/sign"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"labelLevelVc": null})))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let out = client
        .signer()
        .sign_label_level(&ctx(), &json!({"P1.1.1": "Yes"}), "https://h/o.json")
        .await
        .unwrap();
    assert!(out.is_none());
}

#[tokio::test]
async fn add_service_endpoint_posts_to_participant() {
    let mock_server = MockServer::start().await;
    let pid = ParticipantId::new();
    Mock::given(method("POST"))
        .and(path(format!("/v1/participants/{pid}/service-endpoints")))
        .and(body_partial_json(json!({"type": "LinkedDomains"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    client
        .signer()
        .add_service_endpoint(pid, "https://h/o.json", "LinkedDomains", "https://h/o.json")
        .await
        .unwrap();
}

// ── Broker ───────────────────────────────────────────────────────────

#[tokio::test]
async fn publish_returns_status_and_location() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/publish/service-offer"))
        .and(body_partial_json(json!({"source": "https://issuer"})))
        .respond_with(
            ResponseTemplate::new(201).insert_header("Location", "https://broker/messages/msg-42"),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let receipt = client
        .broker()
        .publish(&PublishMessage {
            source: "https://issuer".into(),
            data: json!({"id": "c1"}),
        })
        .await
        .unwrap();
    assert_eq!(receipt.status, 201);
    assert_eq!(receipt.location.as_deref(), Some("https://broker/messages/msg-42"));
}

#[tokio::test]
async fn publish_does_not_fail_on_server_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let receipt = client
        .broker()
        .publish(&PublishMessage {
            source: "s".into(),
            data: json!({}),
        })
        .await
        .unwrap();
    assert_eq!(receipt.status, 500);
    assert!(receipt.location.is_none());
}

// ── Secret store ─────────────────────────────────────────────────────

#[tokio::test]
async fn vault_get_sends_token_and_reads_entries() {
    let mock_server = MockServer::start().await;
    let pid = ParticipantId::new();
    Mock::given(method("GET"))
        .and(path(format!("/v1/secret/{pid}")))
        .and(header("X-Vault-Token", "test-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"pkcs8.key": "k"}})),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let entries = client.vault().get(pid).await.unwrap();
    assert_eq!(entries.get(PRIVATE_KEY_ENTRY).map(String::as_str), Some("k"));
}

#[tokio::test]
async fn vault_get_404_is_empty() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    assert!(client.vault().get(ParticipantId::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn vault_put_posts_entries() {
    let mock_server = MockServer::start().await;
    let pid = ParticipantId::new();
    Mock::given(method("POST"))
        .and(path(format!("/v1/secret/{pid}")))
        .and(body_partial_json(json!({"data": {"pkcs8.key": "k"}})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let entries = HashMap::from([(PRIVATE_KEY_ENTRY.to_string(), "k".to_string())]);
    client.vault().put(pid, &entries).await.unwrap();
}
