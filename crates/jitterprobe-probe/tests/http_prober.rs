//! HttpProber against a local axum server.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::routing::{any, get};
use jitterprobe_core::{Entry, RequestSpec, ResponseSpec};
use jitterprobe_probe::{HttpProber, ProbeError, Prober};

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/", get(|| async { "hello world, status: green" }))
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "status: green but 500") }),
        )
        .route("/method", any(|method: Method| async move { method.to_string() }))
        .route(
            "/headers",
            get(|headers: HeaderMap| async move {
                headers
                    .get("x-probe")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("missing")
                    .to_string()
            }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "too late"
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn entry(url: String, matcher: &str) -> Entry {
    Entry::new("local", RequestSpec::get(url), ResponseSpec::new(matcher))
}

#[tokio::test]
async fn body_matching_pattern_is_a_match() {
    let base = spawn_server().await;
    let prober = HttpProber::new().unwrap();

    assert!(prober.probe(&entry(format!("{base}/"), r"status:\s*green")).await.unwrap());
    assert!(!prober.probe(&entry(format!("{base}/"), "red")).await.unwrap());
}

#[tokio::test]
async fn pattern_is_searched_not_anchored() {
    let base = spawn_server().await;
    let prober = HttpProber::new().unwrap();

    assert!(prober.probe(&entry(format!("{base}/"), "world")).await.unwrap());
    assert!(!prober.probe(&entry(format!("{base}/"), "^world")).await.unwrap());
}

#[tokio::test]
async fn non_2xx_body_is_still_matched() {
    let base = spawn_server().await;
    let prober = HttpProber::new().unwrap();

    assert!(prober.probe(&entry(format!("{base}/broken"), "green")).await.unwrap());
}

#[tokio::test]
async fn configured_method_is_sent() {
    let base = spawn_server().await;
    let prober = HttpProber::new().unwrap();

    let mut e = entry(format!("{base}/method"), "^POST$");
    e.request.method = "POST".to_string();
    assert!(prober.probe(&e).await.unwrap());

    e.request.method = "DELETE".to_string();
    assert!(!prober.probe(&e).await.unwrap());
}

#[tokio::test]
async fn configured_headers_are_sent() {
    let base = spawn_server().await;
    let prober = HttpProber::new().unwrap();

    let mut e = entry(format!("{base}/headers"), "^abc: def$");
    e.request.headers = vec!["X-Probe:   abc: def  ".to_string()];
    assert!(prober.probe(&e).await.unwrap());

    e.request.headers.clear();
    e.response.matcher = "^missing$".to_string();
    assert!(prober.probe(&e).await.unwrap());
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let base = spawn_server().await;
    let prober = HttpProber::new().unwrap();

    let mut e = entry(format!("{base}/slow"), "too late");
    e.request.timeout_ms = 100;
    let err = prober.probe(&e).await.unwrap_err();
    assert!(matches!(err, ProbeError::Timeout(100)), "got {err:?}");
}
