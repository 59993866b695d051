use pactdesk::{
    ApiClient, ApiConfig, AskRequest, ContractStatus, DashboardCore, DashboardOptions, MemoryKv,
    RiskLevel, SessionManager, SqliteKv, UploadRequest,
};
use serde_json::json;
use std::sync::Arc;
use tokio::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn contracts_payload() -> serde_json::Value {
    json!([
        {"id": "c1", "name": "MSA 2025", "parties": "Microsoft & ABC Corp",
         "expiry": "2025-12-31", "status": "Active", "risk": "Medium"},
        {"id": "c2", "name": "Network Services Agreement", "parties": "TelNet & ABC Corp",
         "expiry": "2025-10-10", "status": "Renewal Due", "risk": "High"},
        {"id": "c3", "name": "Software License Agreement", "parties": "Adobe & XYZ Inc",
         "expiry": "2024-12-15", "status": "Expired", "risk": "Low"},
        {"id": "c4", "name": "Cloud Services Contract", "parties": "AWS & TechCorp",
         "expiry": "2026-03-20", "status": "Active", "risk": "Low"},
        {"id": "c5", "name": "Vendor NDA Addendum", "parties": "Dell & Manufacturing Inc",
         "expiry": "2025-08-15", "status": "Renewal Due", "risk": "Medium"},
        // One record with a status outside the enumeration, one malformed.
        {"id": "c6", "name": "Pilot Agreement", "parties": "Acme",
         "status": "Suspended", "risk": "Critical"},
        {"name": "no id at all"}
    ])
}

fn client_for(server: &MockServer) -> Arc<ApiClient> {
    Arc::new(
        ApiClient::new(ApiConfig {
            base_url: server.uri(),
            ..ApiConfig::default()
        })
        .expect("api client"),
    )
}

fn core_for(api: Arc<ApiClient>, kv: Arc<dyn pactdesk::KvStore>) -> DashboardCore {
    DashboardCore::with_options(
        api,
        kv,
        DashboardOptions {
            page_size: 10,
            quiescence: Duration::from_millis(10),
        },
    )
}

#[tokio::test]
async fn login_persists_token_and_authorizes_the_contract_load() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"username": "demo", "password": "test123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok-1"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/contracts"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(contracts_payload()))
        .mount(&server)
        .await;

    let api = client_for(&server);
    let kv: Arc<dyn pactdesk::KvStore> = Arc::new(MemoryKv::new());
    let session = SessionManager::restore(api.clone(), kv.clone());
    session.login("demo", "test123").await.expect("login succeeds");
    assert!(session.is_authenticated());
    assert_eq!(
        kv.get("token").expect("kv get").as_deref(),
        Some("tok-1"),
        "token must be persisted for the next session"
    );

    let core = core_for(api, kv);
    core.load().await;

    let view = core.view();
    // Five clean records plus the unknown-status one; the malformed entry is dropped.
    assert_eq!(view.kpis.total, 6);
    assert_eq!(view.kpis.active, 2);
    assert_eq!(view.kpis.renewal_due, 2);
    assert_eq!(view.kpis.expired, 1);
    assert_eq!(view.kpis.high_risk, 1);
    assert!(view.error.is_none());
}

#[tokio::test]
async fn rejected_login_surfaces_an_auth_error_and_persists_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid credentials"))
        .mount(&server)
        .await;

    let api = client_for(&server);
    let kv: Arc<dyn pactdesk::KvStore> = Arc::new(MemoryKv::new());
    let session = SessionManager::restore(api.clone(), kv.clone());

    let error = session
        .login("demo", "wrong")
        .await
        .expect_err("login must fail");
    assert!(error.to_string().contains("AUTH_FAILED"));
    assert!(error.to_string().contains("Invalid credentials"));
    assert!(!session.is_authenticated());
    assert_eq!(kv.get("token").expect("kv get"), None);
}

#[tokio::test]
async fn refresh_failure_retains_the_previous_collection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contracts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(contracts_payload()))
        .mount(&server)
        .await;

    let api = client_for(&server);
    let core = core_for(api, Arc::new(MemoryKv::new()));
    core.load().await;
    assert_eq!(core.view().kpis.total, 6);

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/contracts"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    core.refresh().await;
    let view = core.view();
    assert_eq!(view.kpis.total, 6, "stale data beats no data");
    let error = view.error.expect("error string recorded");
    assert!(error.contains("FETCH_FAILED"));
    assert!(error.contains("500"));
}

#[tokio::test]
async fn unauthorized_contract_load_reads_as_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contracts"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    let core = core_for(client_for(&server), Arc::new(MemoryKv::new()));
    core.load().await;

    let view = core.view();
    assert_eq!(view.kpis.total, 0);
    let error = view.error.expect("error string recorded");
    assert!(error.contains("AUTH_FAILED"));
}

#[tokio::test]
async fn filter_state_survives_across_core_instances() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contracts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(contracts_payload()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("temp dir");
    let kv_path = dir.path().join("state.sqlite");

    {
        let kv: Arc<dyn pactdesk::KvStore> =
            Arc::new(SqliteKv::new(&kv_path).expect("open kv"));
        let core = core_for(client_for(&server), kv);
        core.set_status_filter(Some(ContractStatus::RenewalDue));
        core.set_risk_filter(Some(RiskLevel::High));
    }

    let kv: Arc<dyn pactdesk::KvStore> = Arc::new(SqliteKv::new(&kv_path).expect("reopen kv"));
    let core = core_for(client_for(&server), kv);
    core.load().await;

    let state = core.filter_state();
    assert_eq!(state.status_filter, Some(ContractStatus::RenewalDue));
    assert_eq!(state.risk_filter, Some(RiskLevel::High));

    let view = core.view();
    assert_eq!(view.page.items.len(), 1);
    assert_eq!(view.page.items[0].id, "c2");
}

#[tokio::test]
async fn contract_detail_upload_and_ask_pass_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contracts/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c1", "name": "MSA 2025", "parties": "Microsoft & ABC Corp",
            "expiry": "2025-12-31", "status": "Active", "risk": "Medium",
            "start": "2023-01-01",
            "clauses": [
                {"title": "Termination", "summary": "90 days notice period.", "confidence": 0.82}
            ],
            "insights": [
                {"risk": "High", "message": "Liability cap excludes data breach costs."}
            ],
            "evidence": [
                {"source": "Section 12.2", "snippet": "Total liability limited.", "relevance": 0.91}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "doc_id": "d42", "filename": "nda.pdf"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_json(json!({"question": "What is the liability cap?", "doc_id": "c1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "Twelve months' fees.",
            "retrieved_chunks": [
                {"chunk_id": "c1_0", "text": "Total liability limited to 12 months' fees.", "relevance": 0.91}
            ]
        })))
        .mount(&server)
        .await;

    let api = client_for(&server);

    let detail = api.contract_detail("c1").await.expect("detail");
    assert_eq!(detail.contract.id, "c1");
    assert_eq!(detail.clauses.len(), 1);
    assert_eq!(detail.insights[0].risk, RiskLevel::High);

    let uploaded = api
        .upload(&UploadRequest {
            filename: "nda.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            expiry: None,
            status: None,
            risk: None,
        })
        .await
        .expect("upload");
    assert_eq!(uploaded.doc_id, "d42");

    let answered = api
        .ask(&AskRequest {
            question: "What is the liability cap?".to_string(),
            doc_id: Some("c1".to_string()),
        })
        .await
        .expect("ask");
    assert_eq!(answered.answer, "Twelve months' fees.");
    assert_eq!(answered.retrieved_chunks.len(), 1);
}
