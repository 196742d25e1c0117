use std::sync::mpsc;
use std::time::Duration;

use karte::api::chat::{ChatService, HttpChatService, PollingChatService, StreamError};
use karte::api::directory::{HttpSessionDirectory, SessionDirectory};
use karte::core::action::{Action, Effect, update};
use karte::core::ingest::StreamIngestor;
use karte::core::message::{Role, STREAM_ERROR_NOTICE};
use karte::core::state::App;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helper Functions
// ============================================================================

fn fresh_app() -> App {
    App::new(chrono::Local::now())
}

/// Run one full submit cycle against an open service: submit, ingest the
/// stream, and apply every resulting action.
async fn run_cycle(app: &mut App, service: &dyn ChatService, text: &str) {
    let effect = update(app, Action::Submit(text.to_string()));
    assert_eq!(effect, Effect::StartCycle);

    let history: Vec<karte::api::types::WireMessage> = app
        .store
        .messages()
        .iter()
        .filter(|m| !(m.role == Role::Assistant && m.content.is_empty()))
        .map(karte::api::types::WireMessage::from)
        .collect();

    let (tx, rx) = mpsc::channel();
    match service.open(&app.current_session.id, history).await {
        Ok(stream) => StreamIngestor::new(stream).run(tx).await,
        Err(e) => {
            tx.send(Action::StreamFailed(e)).unwrap();
        }
    }

    while let Ok(action) = rx.try_recv() {
        update(app, action);
    }
}

// ============================================================================
// HTTP streaming transport
// ============================================================================

#[tokio::test]
async fn test_http_stream_appends_full_answer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_partial_json(serde_json::json!({
            "messages": [{"role": "user", "content": "頭痛がします"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("まず水分をとってください"))
        .mount(&mock_server)
        .await;

    let service = HttpChatService::new(mock_server.uri());
    let mut app = fresh_app();
    run_cycle(&mut app, &service, "頭痛がします").await;

    // Exactly one user and one assistant message per successful submit.
    assert_eq!(app.store.len(), 2);
    assert_eq!(app.store.messages()[0].role, Role::User);
    assert_eq!(app.store.messages()[0].content, "頭痛がします");
    assert_eq!(app.store.messages()[1].role, Role::Assistant);
    assert_eq!(app.store.messages()[1].content, "まず水分をとってください");
    assert!(!app.is_loading);
    assert!(!app.is_thinking);
}

#[tokio::test]
async fn test_http_stream_server_error_appends_sentinel() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let service = HttpChatService::new(mock_server.uri());
    let mut app = fresh_app();
    run_cycle(&mut app, &service, "質問").await;

    assert_eq!(app.store.len(), 2);
    assert_eq!(app.store.messages()[1].content, STREAM_ERROR_NOTICE);
    assert!(!app.is_loading);
    assert!(!app.is_thinking);
}

#[tokio::test]
async fn test_http_stream_open_reports_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let service = HttpChatService::new(mock_server.uri());
    let result = service.open("s1", Vec::new()).await;
    assert!(matches!(result, Err(StreamError::Server { status: 503 })));
}

// ============================================================================
// Polling byte-queue transport
// ============================================================================

#[tokio::test]
async fn test_polling_transport_honors_done_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    // Queue drains fragment by fragment; mocks expire in mount order.
    for chunk in [r#"{"chunk":"痛み"}"#, r#"{"chunk":null}"#, r#"{"chunk":"について"}"#] {
        Mock::given(method("POST"))
            .and(path("/chat/poll"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(chunk.as_bytes().to_vec(), "application/json"),
            )
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/chat/poll"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"chunk":"[DONE]"}"#.as_bytes().to_vec(), "application/json"),
        )
        .mount(&mock_server)
        .await;

    let service = PollingChatService::new(mock_server.uri(), Duration::from_millis(5));
    let mut app = fresh_app();
    run_cycle(&mut app, &service, "お腹が痛い").await;

    let answer = &app.store.messages()[1].content;
    assert_eq!(answer, "痛みについて");
    assert!(!answer.contains("[DONE]"), "the sentinel token must never reach the store");
    assert!(!app.is_loading);
}

#[tokio::test]
async fn test_polling_transport_surfaces_poll_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/poll"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"chunk":"途中"}"#.as_bytes().to_vec(), "application/json"),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/poll"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let service = PollingChatService::new(mock_server.uri(), Duration::from_millis(5));
    let mut app = fresh_app();
    run_cycle(&mut app, &service, "質問").await;

    // Partial content kept, sentinel appended.
    assert_eq!(
        app.store.messages()[1].content,
        format!("途中{STREAM_ERROR_NOTICE}")
    );
}

// ============================================================================
// Session directory
// ============================================================================

#[tokio::test]
async fn test_list_sessions_normalizes_bare_ids() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"sessions":["20240601_090000","20240602_100000"]}"#.as_bytes().to_vec(),
            "application/json",
        ))
        .mount(&mock_server)
        .await;

    let directory = HttpSessionDirectory::new(mock_server.uri());
    let sessions = directory.list_sessions().await.unwrap();

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].id, "20240601_090000");
    assert_eq!(sessions[0].name, "20240601_090000");
}

#[tokio::test]
async fn test_list_sessions_normalizes_records() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"sessions":[{"id":"a","name":"腹痛の相談"},{"id":"b","name":""}]}"#
                .as_bytes()
                .to_vec(),
            "application/json",
        ))
        .mount(&mock_server)
        .await;

    let directory = HttpSessionDirectory::new(mock_server.uri());
    let sessions = directory.list_sessions().await.unwrap();

    assert_eq!(sessions[0].name, "腹痛の相談");
    // Empty name resolves to the id at the ingress boundary.
    assert_eq!(sessions[1].name, "b");
}

#[tokio::test]
async fn test_history_roundtrip_into_store() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/history/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"history":[
                {"role":"user","content":"お腹が痛い"},
                {"role":"assistant","content":"いつからですか"}
            ]}"#
            .as_bytes()
            .to_vec(),
            "application/json",
        ))
        .mount(&mock_server)
        .await;

    let directory = HttpSessionDirectory::new(mock_server.uri());
    let turns = directory.history("s1").await.unwrap();

    let mut app = fresh_app();
    update(&mut app, Action::OpenSession("s1".to_string()));
    update(
        &mut app,
        Action::HistoryLoaded {
            session_id: "s1".to_string(),
            turns,
        },
    );

    let messages = app.store.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "お腹が痛い");
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "いつからですか");
}

#[tokio::test]
async fn test_create_and_rename_hit_their_endpoints() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/new_session"))
        .and(body_partial_json(serde_json::json!({
            "session_id": "20240613_212417",
            "name": "2024年06月13日 21時24分17秒"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/update_session_name"))
        .and(body_partial_json(serde_json::json!({
            "session_id": "20240613_212417",
            "name": "経過観察"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let directory = HttpSessionDirectory::new(mock_server.uri());
    directory
        .create_session("20240613_212417", "2024年06月13日 21時24分17秒")
        .await
        .unwrap();
    directory
        .rename_session("20240613_212417", "経過観察")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_directory_failure_is_an_error_not_a_panic() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    let directory = HttpSessionDirectory::new(mock_server.uri());
    assert!(directory.list_sessions().await.is_err());
}
