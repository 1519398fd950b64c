mod common;

use std::cell::Cell;
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode as AxumStatus, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use futures::StreamExt;
use pulsewire_client::http::{ParsedBody, Request};
use pulsewire_client::{ClientConfig, RequestExecutor, StatusCode};
use serde_json::{Value, json};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

fn ndjson_body(chunks: Vec<&'static [u8]>) -> impl IntoResponse {
    let chunks: Vec<Result<Bytes, Infallible>> =
        chunks.into_iter().map(|c| Ok(Bytes::from_static(c))).collect();
    (
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(futures::stream::iter(chunks)),
    )
}

/// Raises its flag when the server drops the response body.
struct BodyDropped(Arc<AtomicBool>);

impl Drop for BodyDropped {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// NDJSON body that emits one record every 20 ms and never ends.
fn endless_body(dropped: Arc<AtomicBool>) -> impl IntoResponse {
    let records = futures::stream::unfold((0u64, BodyDropped(dropped)), |(n, guard)| async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let line = format!("{{\"status\":\"ingesting\",\"n\":{n}}}\n");
        Some((Ok::<_, Infallible>(Bytes::from(line)), (n + 1, guard)))
    });
    (
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(records),
    )
}

fn backend() -> Router {
    backend_with_flag(Arc::new(AtomicBool::new(false)))
}

fn backend_with_flag(endless_dropped: Arc<AtomicBool>) -> Router {
    Router::new()
        .route(
            "/api/ingest/endless/",
            get(move || {
                let dropped = Arc::clone(&endless_dropped);
                async move { endless_body(dropped) }
            }),
        )
        .route(
            "/api/ingest/status/",
            get(|| async { Json(json!({"status": "idle", "progress": 0})) }),
        )
        .route("/text", get(|| async { "plain words" }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "too late"
            }),
        )
        .route(
            "/broken",
            get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route(
            "/echo",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let agent = headers
                    .get(header::USER_AGENT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({"received": body, "user_agent": agent}))
            }),
        )
        .route(
            "/api/ingest/start/",
            post(|| async {
                ndjson_body(vec![
                    b"{\"status\":\"searching\",\"progress_percent\":0}\n{\"title\":\"caf\xC3".as_slice(),
                    b"\xA9\"}\n{\"status\":".as_slice(),
                    b"oops}\n".as_slice(),
                    b"{\"status\":\"completed\",\"progress_percent\":100}\n{\"partial\"".as_slice(),
                ])
            }),
        )
}

async fn executor() -> RequestExecutor {
    common::init_logging();
    let base = serve(backend()).await;
    RequestExecutor::new(ClientConfig::new(&base).unwrap()).unwrap()
}

#[tokio::test]
async fn test_json_body_is_parsed() {
    let executor = executor().await;
    let body = executor
        .execute(&Request::get("api/ingest/status/"))
        .await
        .unwrap();
    assert_eq!(body.into_json(), Some(json!({"status": "idle", "progress": 0})));
}

#[tokio::test]
async fn test_text_body_is_verbatim() {
    let executor = executor().await;
    let body = executor.execute(&Request::get("text")).await.unwrap();
    assert_eq!(body.as_text(), Some("plain words"));
}

#[tokio::test]
async fn test_json_request_body_and_user_agent() {
    let executor = executor().await;
    let request = Request::post("echo").json(&json!({"days": 7})).unwrap();
    let body = executor.execute(&request).await.unwrap().into_json().unwrap();

    assert_eq!(body["received"], json!({"days": 7}));
    assert!(body["user_agent"].as_str().unwrap().starts_with("pulsewire/"));
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let executor = executor().await;

    let err = executor.execute(&Request::get("missing")).await.unwrap_err();
    assert!(err.is_status());
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert!(err.url().unwrap().path().ends_with("/missing"));

    let err = executor.execute(&Request::get("broken")).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));

    let stats = executor.stats().snapshot();
    assert_eq!(stats.requests_total, 2);
    assert_eq!(stats.requests_failed, 2);
}

#[tokio::test]
async fn test_timeout_before_headers() {
    let executor = executor().await;
    let request = Request::get("slow").timeout(Duration::from_millis(200));

    let started = std::time::Instant::now();
    let err = executor.execute(&request).await.unwrap_err();
    assert!(err.is_timeout());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(executor.stats().snapshot().requests_timed_out, 1);
}

#[tokio::test]
async fn test_ndjson_body_is_an_opaque_stream() {
    let executor = executor().await;
    let body = executor
        .execute(&Request::post("api/ingest/start/"))
        .await
        .unwrap();
    let stream = match body {
        ParsedBody::Stream(stream) => stream,
        other => panic!("expected a stream, got {other:?}"),
    };
    assert_eq!(stream.status(), StatusCode::OK);

    let items: Vec<_> = stream.ndjson::<Value>().collect().await;
    assert_eq!(items.len(), 4);
    assert_eq!(items[1].as_ref().unwrap(), &json!({"title": "caf\u{e9}"}));
    assert!(items[2].as_ref().unwrap_err().is_parse());
    assert_eq!(items[3].as_ref().unwrap()["status"], "completed");
}

#[tokio::test]
async fn test_execute_streaming_dispatches_in_order() {
    let executor = executor().await;
    let mut records = Vec::new();
    let mut errors = Vec::new();
    let mut completed = None;

    let summary = executor
        .execute_streaming(
            &Request::post("api/ingest/start/"),
            |record: Value| records.push(record),
            |err| errors.push(err),
            |summary| completed = Some(*summary),
        )
        .await
        .unwrap();

    assert_eq!(
        records,
        vec![
            json!({"status": "searching", "progress_percent": 0}),
            json!({"title": "caf\u{e9}"}),
            json!({"status": "completed", "progress_percent": 100}),
        ]
    );
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_parse());
    assert_eq!(summary.records, 3);
    assert_eq!(summary.parse_errors, 1);
    assert_eq!(completed, Some(summary));

    let stats = executor.stats().snapshot();
    assert_eq!(stats.records_decoded, 3);
    assert_eq!(stats.parse_errors, 1);
}

#[tokio::test]
async fn test_execute_streaming_surfaces_status_without_callbacks() {
    let executor = executor().await;
    let calls = Cell::new(0);

    let err = executor
        .execute_streaming(
            &Request::get("missing"),
            |_: Value| calls.set(calls.get() + 1),
            |_| calls.set(calls.get() + 1),
            |_| calls.set(calls.get() + 1),
        )
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(calls.get(), 0);
}

#[tokio::test]
async fn test_dropping_streaming_call_stops_callbacks_and_releases_body() {
    common::init_logging();
    let dropped = Arc::new(AtomicBool::new(false));
    let base = serve(backend_with_flag(Arc::clone(&dropped))).await;
    let executor = RequestExecutor::new(ClientConfig::new(&base).unwrap()).unwrap();

    let records = Arc::new(AtomicUsize::new(0));
    let completed = Arc::new(AtomicBool::new(false));
    let request = Request::get("api/ingest/endless/");
    let call = executor.execute_streaming(
        &request,
        {
            let records = Arc::clone(&records);
            move |_: Value| {
                records.fetch_add(1, Ordering::SeqCst);
            }
        },
        |_| {},
        {
            let completed = Arc::clone(&completed);
            move |_| completed.store(true, Ordering::SeqCst)
        },
    );

    tokio::select! {
        _ = call => panic!("an endless body never completes"),
        () = tokio::time::sleep(Duration::from_millis(300)) => {}
    }
    let seen = records.load(Ordering::SeqCst);
    assert!(seen > 0, "records arrived before the call was dropped");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(records.load(Ordering::SeqCst), seen, "no record after drop");
    assert!(!completed.load(Ordering::SeqCst));

    tokio::time::timeout(Duration::from_secs(5), async {
        while !dropped.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("server sees the transfer abandoned");
}
