use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use roundtable_core::attachment::{AttachmentService, AttachmentUpload};
use roundtable_core::roundtable::{ChatRequest, RoundtableTransport, ServerEvent};
use roundtable_core::session::{DiscussionMode, Session, SessionGateway};
use roundtable_core::settings::SessionSettings;
use roundtable_interaction::{
    ApiClient, HttpAttachmentService, HttpRoundtableTransport, HttpSessionGateway,
    StreamEventDispatcher,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[derive(Clone, Default)]
struct MockState {
    chat_bodies: Arc<Mutex<Vec<Value>>>,
    patched: Arc<Mutex<Vec<(String, Value)>>>,
    auth_headers: Arc<Mutex<Vec<String>>>,
}

fn session_json(id: &str) -> Value {
    json!({
        "id": id,
        "discussion_mode": "moderated",
        "participants": [{"id": "c1", "name": "Ava"}],
        "moderator": {"id": "m", "name": "Mod"},
        "is_active": true
    })
}

async fn chat(
    State(state): State<MockState>,
    Path(session_id): Path<String>,
    headers: axum::http::HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        state.auth_headers.lock().expect("auth lock").push(auth.to_string());
    }
    state.chat_bodies.lock().expect("chat lock").push(body);

    if session_id == "closed" {
        return (StatusCode::CONFLICT, Json(json!({"detail": "Session has ended"})))
            .into_response();
    }

    let chunks: Vec<Result<String, std::io::Error>> = vec![
        Ok("data: {\"type\":\"round_start\",\"round\":1}\n\ndata: {\"type\":\"coach_".to_string()),
        Ok("start\",\"coach_id\":\"c1\",\"name\":\"Ava\"}\n\n".to_string()),
        Ok("data: {broken json\n\n".to_string()),
        Ok("data: {\"type\":\"content\",\"coach_id\":\"c1\",\"content\":\"Hi\"}\n\n".to_string()),
        Ok("data: {\"type\":\"coach_end\",\"coach_id\":\"c1\"}\n\ndata: [DONE]\n\n".to_string()),
    ];
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(futures::stream::iter(chunks)),
    )
        .into_response()
}

async fn upload(body: Bytes) -> Response {
    let text = String::from_utf8_lossy(&body);
    if text.contains("too-big.png") {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({"detail": "File too large"})),
        )
            .into_response();
    }
    Json(json!({"id": "f1", "url": "https://files.example.com/f1", "size": 4})).into_response()
}

async fn extract(body: Bytes) -> Json<Value> {
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("name=\"file\""));
    Json(json!({"text": "Net P&L: +2.3R"}))
}

async fn transcribe() -> Json<Value> {
    Json(json!({"transcription": "I moved my stop too early"}))
}

async fn list_sessions() -> Json<Value> {
    Json(json!({"sessions": [session_json("s1"), session_json("s2")]}))
}

async fn get_session(Path(session_id): Path<String>) -> Response {
    if session_id == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found"}))).into_response();
    }
    Json(session_json(&session_id)).into_response()
}

async fn patch_settings(
    State(state): State<MockState>,
    Path(session_id): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    state
        .patched
        .lock()
        .expect("patched lock")
        .push((session_id, body));
    StatusCode::NO_CONTENT
}

async fn spawn_mock_server() -> (String, MockState, oneshot::Sender<()>) {
    let state = MockState::default();
    let app = Router::new()
        .route("/api/roundtable/sessions", get(list_sessions))
        .route("/api/roundtable/sessions/{session_id}", get(get_session))
        .route("/api/roundtable/sessions/{session_id}/chat", post(chat))
        .route(
            "/api/roundtable/sessions/{session_id}/settings",
            patch(patch_settings),
        )
        .route("/api/files/upload", post(upload))
        .route("/api/files/extract", post(extract))
        .route("/api/files/transcribe", post(transcribe))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server listener");
    let address: SocketAddr = listener.local_addr().expect("mock listener local addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .expect("run mock server");
    });
    (format!("http://{address}/api"), state, shutdown_tx)
}

fn api(base_url: &str) -> ApiClient {
    ApiClient::new(base_url, Some("secret-token".to_string()), Duration::from_secs(5))
        .expect("api client")
}

fn chat_request(session_id: &str) -> ChatRequest {
    let session = Session {
        id: session_id.to_string(),
        title: None,
        discussion_mode: DiscussionMode::Free,
        participants: Vec::new(),
        moderator: None,
        debate_style: None,
        is_active: true,
        settings: None,
        created_at: None,
    };
    ChatRequest::new(&session, "How did I trade today?", Vec::new(), 2, &SessionSettings::default())
}

fn upload_file(name: &str) -> AttachmentUpload {
    AttachmentUpload {
        file_name: name.to_string(),
        mime_type: "image/png".to_string(),
        bytes: vec![1, 2, 3, 4],
    }
}

#[tokio::test]
async fn test_stream_is_decoded_in_order_across_chunks() {
    let (base_url, state, _shutdown) = spawn_mock_server().await;
    let transport = HttpRoundtableTransport::new(api(&base_url));

    let stream = transport
        .open_stream(&chat_request("s1"))
        .await
        .expect("open stream");
    let mut dispatcher = StreamEventDispatcher::new(stream);
    let mut events = Vec::new();
    while let Some(event) = dispatcher.next_event().await {
        events.push(event.expect("no transport error"));
    }

    assert_eq!(
        events,
        vec![
            ServerEvent::RoundStart { round: 1 },
            ServerEvent::CoachStart {
                coach_id: "c1".into(),
                name: "Ava".into(),
                avatar: None
            },
            ServerEvent::Content {
                coach_id: "c1".into(),
                content: "Hi".into()
            },
            ServerEvent::CoachEnd {
                coach_id: "c1".into()
            },
            ServerEvent::Done,
        ]
    );

    let bodies = state.chat_bodies.lock().expect("chat lock").clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["content"], "How did I trade today?");
    assert_eq!(bodies[0]["max_rounds"], 2);
    let auth = state.auth_headers.lock().expect("auth lock").clone();
    assert_eq!(auth, vec!["Bearer secret-token".to_string()]);
}

#[tokio::test]
async fn test_non_success_status_is_api_error_with_detail() {
    let (base_url, _state, _shutdown) = spawn_mock_server().await;
    let transport = HttpRoundtableTransport::new(api(&base_url));

    let err = match transport.open_stream(&chat_request("closed")).await {
        Ok(_) => panic!("expected an error"),
        Err(err) => err,
    };
    assert!(err.is_remote());
    assert!(err.to_string().contains("Session has ended"));
    assert!(err.to_string().contains("409"));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("addr");
    drop(listener);

    let transport = HttpRoundtableTransport::new(api(&format!("http://{address}/api")));
    let err = match transport.open_stream(&chat_request("s1")).await {
        Ok(_) => panic!("expected an error"),
        Err(err) => err,
    };
    assert!(matches!(err, roundtable_core::RoundtableError::Transport { .. }));
}

#[tokio::test]
async fn test_attachment_endpoints() {
    let (base_url, _state, _shutdown) = spawn_mock_server().await;
    let service = HttpAttachmentService::new(api(&base_url));

    let uploaded = service.upload(&upload_file("chart.png")).await.expect("upload");
    assert_eq!(uploaded.id, "f1");
    assert_eq!(uploaded.size, Some(4));

    let err = service
        .upload(&upload_file("too-big.png"))
        .await
        .expect_err("upload should fail");
    assert!(err.to_string().contains("File too large"));

    let text = service
        .extract_text(&upload_file("journal.pdf"))
        .await
        .expect("extract");
    assert_eq!(text, "Net P&L: +2.3R");

    let transcript = service
        .transcribe(&upload_file("memo.mp3"))
        .await
        .expect("transcribe");
    assert_eq!(transcript, "I moved my stop too early");
}

#[tokio::test]
async fn test_session_gateway() {
    let (base_url, state, _shutdown) = spawn_mock_server().await;
    let gateway = HttpSessionGateway::new(api(&base_url));

    let sessions = gateway.list().await.expect("list");
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].discussion_mode, DiscussionMode::Moderated);

    let session = gateway.get("s1").await.expect("get").expect("present");
    assert_eq!(session.coach("m").map(|c| c.name.as_str()), Some("Mod"));
    assert!(gateway.get("missing").await.expect("get missing").is_none());

    let mut settings = SessionSettings::default();
    settings.model.temperature = 0.3;
    gateway
        .patch_settings("s1", &settings)
        .await
        .expect("patch settings");
    let patched = state.patched.lock().expect("patched lock").clone();
    assert_eq!(patched.len(), 1);
    assert_eq!(patched[0].0, "s1");
    assert!((patched[0].1["model"]["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    assert_eq!(patched[0].1["knowledgeBase"]["topK"], 5);
}
