//! Integration tests for SOP Master
//!
//! These tests drive the full pipeline: notes in, Gemini (mocked over HTTP)
//! in the middle, `.docx` package out.

use std::io::Read;
use std::sync::Arc;

use sop_master::config::Config;
use sop_master::docx::render_docx;
use sop_master::format_document;
use sop_master::generator::{GeminiGenerator, MockGenerator};
use sop_master::mcp::{SessionStore, ToolRegistry};
use sop_master::models::Block;
use sop_master::orchestrator::{AccessPolicy, Orchestrator, OrchestratorError};
use sop_master::utils::HttpClient;

const SOP_MARKDOWN: &str = "## 目標\n完成月報\n\n## 執行步驟\n1. **匯出**報表\n2. 寄送主管\n- 注意截止日\n";

fn gemini_body(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": {"parts": [{"text": text}], "role": "model"},
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

fn read_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut xml = String::new();
    file.read_to_string(&mut xml).unwrap();
    xml
}

fn gemini_orchestrator(base_url: &str, policy: AccessPolicy) -> Orchestrator {
    let http = HttpClient::new().unwrap();
    let generator = GeminiGenerator::with_endpoint(http, base_url, "gemini-test");
    Orchestrator::new(Arc::new(generator), policy, Some("test-key".into()))
}

#[tokio::test]
async fn test_generate_and_export_against_mock_api() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-test:generateContent")
        .match_header("x-goog-api-key", "test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_body(SOP_MARKDOWN))
        .expect(1)
        .create_async()
        .await;

    let orchestrator = gemini_orchestrator(&server.url(), AccessPolicy::default());
    let mut session = orchestrator.new_session();

    let markdown = orchestrator
        .generate(&mut session, "下週要交月報，先匯出報表再寄給主管")
        .await
        .unwrap()
        .to_string();
    assert_eq!(markdown, SOP_MARKDOWN);

    let artifact = orchestrator.export_docx(&session).unwrap();
    let document = read_part(&artifact.bytes, "word/document.xml");
    assert!(document.contains("Standard Operating Procedure"));
    assert!(document.contains("執行步驟"));
    assert!(document.contains("<w:b/>"));
    assert!(document.contains("1. "));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_upstream_error_is_reported_and_not_counted() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-test:generateContent")
        .with_status(429)
        .with_body(r#"{"error":{"code":429,"message":"Resource has been exhausted"}}"#)
        .create_async()
        .await;

    let policy = AccessPolicy {
        max_usage: Some(10),
        ..AccessPolicy::default()
    };
    let orchestrator = gemini_orchestrator(&server.url(), policy);
    let mut session = orchestrator.new_session();

    let err = orchestrator.generate(&mut session, "notes").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::UpstreamGenerationError(_)));
    assert!(err.user_message().contains("Resource has been exhausted"));
    assert_eq!(session.usage_count(), 0);
    assert_eq!(orchestrator.remaining_quota(&session), Some(10));
}

#[tokio::test]
async fn test_quota_enforced_through_mcp_tools() {
    let mock = Arc::new(MockGenerator::with_response(SOP_MARKDOWN));
    let policy = AccessPolicy {
        password: Some("Secret".into()),
        max_usage: Some(2),
        purchase_link: Some("https://example.com/buy".into()),
        ..AccessPolicy::default()
    };
    let orchestrator = Orchestrator::new(mock.clone(), policy, Some("key".into()));
    let tools = ToolRegistry::for_store(SessionStore::new(Arc::new(orchestrator)));
    let notes = serde_json::json!({"notes": "開會紀錄"});

    let err = tools
        .execute("unlock", serde_json::json!({"password": "secret"}), None)
        .await
        .unwrap_err();
    assert!(err.contains("https://example.com/buy"));

    tools
        .execute("unlock", serde_json::json!({"password": "Secret"}), None)
        .await
        .unwrap();

    for _ in 0..2 {
        tools.execute("generate_sop", notes.clone(), None).await.unwrap();
    }
    let err = tools.execute("generate_sop", notes, None).await.unwrap_err();
    assert!(err.starts_with("[quota_exceeded]"));
    assert_eq!(mock.calls(), 2);

    let status = tools
        .execute("session_status", serde_json::Value::Null, None)
        .await
        .unwrap();
    assert_eq!(status["usage_count"], 2);
    assert_eq!(status["remaining_quota"], 0);
    assert_eq!(status["has_result"], true);

    let sop = tools.execute("get_sop", serde_json::Value::Null, None).await.unwrap();
    assert_eq!(sop["markdown"], SOP_MARKDOWN);
    assert_eq!(sop["blocks"][0]["kind"], "heading");
}

#[tokio::test]
async fn test_http_sessions_do_not_share_gate_or_quota() {
    let mock = Arc::new(MockGenerator::with_response(SOP_MARKDOWN));
    let policy = AccessPolicy {
        password: Some("Secret".into()),
        max_usage: Some(1),
        ..AccessPolicy::default()
    };
    let orchestrator = Orchestrator::new(mock.clone(), policy, Some("key".into()));
    let tools = ToolRegistry::for_store(SessionStore::new(Arc::new(orchestrator)));
    let notes = serde_json::json!({"notes": "開會紀錄"});

    tools
        .execute("unlock", serde_json::json!({"password": "Secret"}), Some("a"))
        .await
        .unwrap();
    tools
        .execute("generate_sop", notes.clone(), Some("a"))
        .await
        .unwrap();

    let err = tools
        .execute("generate_sop", notes.clone(), Some("b"))
        .await
        .unwrap_err();
    assert!(err.starts_with("[authentication_failed]"));

    tools
        .execute("unlock", serde_json::json!({"password": "Secret"}), Some("b"))
        .await
        .unwrap();
    tools
        .execute("generate_sop", notes, Some("b"))
        .await
        .unwrap();

    let status_a = tools
        .execute("session_status", serde_json::Value::Null, Some("a"))
        .await
        .unwrap();
    let status_b = tools
        .execute("session_status", serde_json::Value::Null, Some("b"))
        .await
        .unwrap();
    assert_eq!(status_a["usage_count"], 1);
    assert_eq!(status_b["usage_count"], 1);
    assert_eq!(mock.calls(), 2);
}

#[test]
fn test_example_document_structure() {
    let doc = format_document("## 目標\n完成報告\n- 收集資料\n1. 開會\n");
    assert_eq!(
        doc.blocks(),
        &[
            Block::Heading {
                level: 0,
                text: "Standard Operating Procedure".into()
            },
            Block::Heading {
                level: 1,
                text: "目標".into()
            },
            Block::Paragraph("完成報告".into()),
            Block::BulletItem("收集資料".into()),
            Block::NumberedItem("1. 開會".into()),
        ]
    );

    let bytes = render_docx(&doc).unwrap();
    let styles = read_part(&bytes, "word/styles.xml");
    assert!(styles.contains("Heading1"));
}

#[test]
fn test_policy_from_config() {
    let mut config = Config::default();
    config.access.password = Some("pw".into());
    config.access.unlimited = true;
    config.document.title = "SOP".into();

    let policy = AccessPolicy::from(&config);
    assert_eq!(policy.password.as_deref(), Some("pw"));
    assert_eq!(policy.max_usage, None);
    assert_eq!(policy.title, "SOP");
}
