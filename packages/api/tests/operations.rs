use std::convert::Infallible;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use pulsewire::{
    CancellationToken, ClientConfig, EventSource, Outcome, ProgressConfig, Pulsewire,
    ReconnectPolicy,
};
use serde_json::{Value, json};

/// In-process stand-in for the research backend.
#[derive(Clone, Default)]
struct Backend {
    polls: Arc<AtomicU32>,
    ingest_start: Arc<Mutex<Option<Value>>>,
    push_received: Arc<Mutex<Vec<Value>>>,
}

impl Backend {
    fn record(&self, message: Value) {
        self.push_received.lock().unwrap().push(message);
    }

    fn received(&self) -> Vec<Value> {
        self.push_received.lock().unwrap().clone()
    }
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "services": {"vector_store": "up"}}))
}

async fn ingest_start(State(backend): State<Backend>, Json(body): Json<Value>) -> impl IntoResponse {
    *backend.ingest_start.lock().unwrap() = Some(body);
    let chunks: Vec<Result<&'static str, Infallible>> = vec![
        Ok("{\"status\":\"searching\",\"progress_percent\":0}\n{\"status\":\"ingest"),
        Ok("ing\",\"progress_percent\":50}\n"),
        Ok("{\"status\":\"success\",\"papers_added\":12}\n"),
    ];
    (
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(futures::stream::iter(chunks)),
    )
}

/// The status endpoint never learns about runs started over HTTP.
async fn ingest_status(State(backend): State<Backend>) -> Json<Value> {
    backend.polls.fetch_add(1, Ordering::SeqCst);
    Json(json!({"status": "idle"}))
}

async fn analysis(Path(id): Path<String>) -> impl IntoResponse {
    if id == "a-17" {
        (StatusCode::OK, Json(json!({"id": "a-17", "answer": "graphs all the way down"})))
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"error": "Analysis not found"})))
    }
}

async fn ingest_socket(ws: WebSocketUpgrade, State(backend): State<Backend>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| push_session(socket, backend))
}

async fn research_socket(ws: WebSocketUpgrade, State(backend): State<Backend>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| push_session(socket, backend))
}

/// Records every JSON message and answers the two start messages. A
/// research query of "hold" gets one progress update and is never finished.
async fn push_session(mut socket: WebSocket, backend: Backend) {
    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else { continue };
        let Ok(value) = serde_json::from_str::<Value>(&text) else { continue };
        backend.record(value.clone());

        let replies = match value["type"].as_str() {
            Some("start_ingestion") => vec![json!({"status": "completed", "progress": 100})],
            Some("execute_analysis") if value["query"] == "hold" => vec![
                json!({"type": "progress", "status": "retrieving", "progress_percent": 10}),
            ],
            Some("execute_analysis") => vec![
                json!({"type": "progress", "status": "retrieving", "progress_percent": 30, "message": "searching papers"}),
                json!({"type": "complete", "result": {"answer": "graphs all the way down"}}),
            ],
            _ => Vec::new(),
        };
        for reply in replies {
            if socket.send(Message::Text(reply.to_string())).await.is_err() {
                return;
            }
        }
    }
}

async fn serve(backend: Backend) -> String {
    let app = Router::new()
        .route("/api/health/", get(health))
        .route("/api/ingest/start/", post(ingest_start))
        .route("/api/ingest/status/", get(ingest_status))
        .route("/api/research/:id/", get(analysis))
        .route("/ws/ingest/", get(ingest_socket))
        .route("/ws/research/", get(research_socket))
        .with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

async fn client(backend: &Backend) -> Pulsewire {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = ClientConfig::new(&serve(backend.clone()).await)
        .unwrap()
        .with_progress(ProgressConfig::default().with_poll_interval(Duration::from_millis(100)))
        .with_reconnect(ReconnectPolicy::new(1, Duration::from_millis(50), 2.0));
    Pulsewire::new(config).unwrap()
}

#[tokio::test]
async fn test_health_probe() {
    let backend = Backend::default();
    let client = client(&backend).await;

    let health = client.health().await.unwrap();
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn test_fetch_stored_analysis() {
    let backend = Backend::default();
    let client = client(&backend).await;

    let analysis = client.analysis("a-17").await.unwrap();
    assert_eq!(analysis["answer"], "graphs all the way down");

    let err = client.analysis("missing").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

    assert!(client.analysis("  ").await.unwrap_err().is_builder());
    assert!(client.analysis("a/b").await.unwrap_err().is_builder());
}

#[tokio::test]
async fn test_ingestion_over_http_follows_start_stream() {
    let backend = Backend::default();
    let mut client = client(&backend).await;

    let mut seen = Vec::new();
    let timeline = client
        .ingestion()
        .days(3)
        .max_results(50)
        .run(&CancellationToken::new(), |event| {
            seen.push((event.source, event.status.clone()));
        })
        .await
        .unwrap();

    assert_eq!(
        *backend.ingest_start.lock().unwrap(),
        Some(json!({"days": 3, "max_results": 50}))
    );
    // idle polls are not progress; the stream alone finishes the run
    assert_eq!(
        seen.iter().filter(|(source, _)| *source == EventSource::Stream).cloned().collect::<Vec<_>>(),
        vec![
            (EventSource::Stream, "searching".to_string()),
            (EventSource::Stream, "ingesting".to_string()),
            (EventSource::Stream, "success".to_string()),
        ]
    );
    assert_eq!(timeline.outcome(), Some(Outcome::Completed));
    let last = timeline.last().unwrap();
    assert_eq!(last.source, EventSource::Stream);
    assert_eq!(last.payload["papers_added"], 12);
    assert!(backend.received().is_empty(), "no push message in HTTP mode");
    assert!(client.connections().is_empty());
}

#[tokio::test]
async fn test_ingestion_via_push_sends_start_message() {
    let backend = Backend::default();
    let mut client = client(&backend).await;

    let timeline = client
        .ingestion()
        .via_push(true)
        .run(&CancellationToken::new(), |_| {})
        .await
        .unwrap();

    assert_eq!(timeline.outcome(), Some(Outcome::Completed));
    assert!(backend.ingest_start.lock().unwrap().is_none());
    assert_eq!(
        backend.received()[0],
        json!({"type": "start_ingestion", "days": 7, "max_results": 100})
    );
}

#[tokio::test]
async fn test_research_over_push() {
    let backend = Backend::default();
    let mut client = client(&backend).await;

    let mut seen = Vec::new();
    let timeline = client
        .research("  graph rag ")
        .run(&CancellationToken::new(), |event| {
            seen.push((event.status.clone(), event.progress, event.message.clone()));
        })
        .await
        .unwrap();

    assert_eq!(
        backend.received(),
        vec![json!({
            "type": "execute_analysis",
            "query": "graph rag",
            "analysis_type": "comprehensive",
        })]
    );
    assert_eq!(
        seen,
        vec![
            ("retrieving".to_string(), 30.0, Some("searching papers".to_string())),
            ("complete".to_string(), 100.0, None),
        ]
    );
    assert_eq!(timeline.outcome(), Some(Outcome::Completed));
    assert_eq!(
        timeline.last().unwrap().payload["result"]["answer"],
        "graphs all the way down"
    );
}

#[tokio::test]
async fn test_cancelled_research_sends_cancel_message() {
    let backend = Backend::default();
    let mut client = client(&backend).await;
    let cancel = CancellationToken::new();

    let timeline = client
        .research("hold")
        .run(&cancel, |_| cancel.cancel())
        .await
        .unwrap();

    assert_eq!(timeline.outcome(), Some(Outcome::Cancelled));
    assert_eq!(timeline.len(), 1);

    // the cancel frame is flushed before the socket closes
    tokio::time::timeout(Duration::from_secs(5), async {
        while backend.received().len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("cancel message delivered");
    assert_eq!(backend.received()[1], json!({"type": "cancel"}));
}

#[tokio::test]
async fn test_invalid_parameters_send_nothing() {
    let backend = Backend::default();
    let mut client = client(&backend).await;

    let err = client
        .research("ab")
        .run(&CancellationToken::new(), |_| {})
        .await
        .unwrap_err();
    assert!(err.is_builder());

    let err = client
        .ingestion()
        .days(0)
        .run(&CancellationToken::new(), |_| {})
        .await
        .unwrap_err();
    assert!(err.is_builder());

    assert!(backend.ingest_start.lock().unwrap().is_none());
    assert_eq!(backend.polls.load(Ordering::SeqCst), 0);
    assert!(backend.received().is_empty());
}
