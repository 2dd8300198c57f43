//! Integration tests for the axum instrumentation and the status endpoint.

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use futures_util::FutureExt;
use statsnap::{Config, HttpMuxer, Registry, Snapshot};
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

fn registry(http_sample_percent: u8) -> Registry {
    let cfg = Config {
        snapshot_interval: Duration::ZERO,
        http_sample_percent,
        ..Config::default()
    };
    Registry::new(cfg, CancellationToken::new()).unwrap()
}

async fn send(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_string(resp: Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn count(snap: &Snapshot, name: &str) -> i64 {
    snap.get(name)
        .unwrap_or_else(|| panic!("missing stat {name}"))
        .value
        .as_int()
        .unwrap()
}

async fn sleep_1() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

async fn sleep_5() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

async fn give_up() -> &'static str {
    panic!("i give up")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_are_all_counted() {
    let reg = registry(100);
    let app: Router = HttpMuxer::new(&reg, "http")
        .get("/sleep/1", sleep_1)
        .get("/sleep/5", sleep_5)
        .get("/404", || async { (StatusCode::NOT_FOUND, "404") })
        .get("/500", || async { (StatusCode::INTERNAL_SERVER_ERROR, "500") })
        .get("/164", || async { StatusCode::from_u16(164).unwrap() })
        .into_router();

    let mut tasks = Vec::new();
    for _ in 0..10 {
        for uri in ["/sleep/1", "/sleep/5", "/404", "/500", "/164"] {
            let app = app.clone();
            tasks.push(tokio::spawn(async move { send(&app, uri).await.status() }));
        }
    }
    for t in tasks {
        t.await.unwrap();
    }

    let snap = reg.flush().await;
    for stat in &snap {
        println!("{} = {:?}", stat.name, stat.value);
    }

    assert_eq!(count(&snap, "http./sleep/1.GET.200.count"), 10);
    assert_eq!(count(&snap, "http./sleep/5.GET.200.count"), 10);
    assert_eq!(count(&snap, "http./500.GET.500.count"), 10);
    assert_eq!(count(&snap, "http./404.GET.404.count"), 10);
    assert_eq!(count(&snap, "http./164.GET.0.count"), 10);
    assert_eq!(count(&snap, "http./404.GET.panic.count"), 0);

    let timer = snap.get("http./sleep/5.GET.time").unwrap().value.as_timer().unwrap();
    assert_eq!(timer.count, 10);
    assert!(timer.min >= 5_000_000, "min = {}", timer.min);
}

#[tokio::test]
async fn test_panic_is_counted_and_reraised() {
    let reg = registry(100);
    let app: Router = HttpMuxer::new(&reg, "http").get("/panic", give_up).into_router();

    let req = Request::get("/panic").body(Body::empty()).unwrap();
    let result = AssertUnwindSafe(app.oneshot(req)).catch_unwind().await;

    let payload = result.expect_err("panic must propagate");
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"i give up"));

    let snap = reg.flush().await;
    assert_eq!(count(&snap, "http./panic.GET.panic.count"), 1);
    assert_eq!(count(&snap, "http./panic.GET.0.count"), 1);
    assert_eq!(
        snap.get("http./panic.GET.time").unwrap().value.as_timer().unwrap().count,
        1
    );
}

#[tokio::test]
async fn test_zero_sampling_records_nothing() {
    let reg = registry(0);
    let app: Router = HttpMuxer::new(&reg, "http")
        .get("/ok", || async { "ok" })
        .get("/panic", give_up)
        .into_router();

    for _ in 0..5 {
        assert_eq!(send(&app, "/ok").await.status(), StatusCode::OK);
    }
    let req = Request::get("/panic").body(Body::empty()).unwrap();
    assert!(AssertUnwindSafe(app.oneshot(req)).catch_unwind().await.is_err());

    let snap = reg.flush().await;
    assert!(snap.get("http./ok.GET.200.count").is_none());
    assert_eq!(count(&snap, "http./ok.GET.0.count"), 0);
    assert_eq!(count(&snap, "http./panic.GET.panic.count"), 0);
    assert_eq!(snap.get("http./ok.GET.time").unwrap().value.as_timer().unwrap().count, 0);
}

#[tokio::test]
async fn test_methods_are_counted_separately() {
    let reg = registry(100);
    let app: Router = HttpMuxer::new(&reg, "api")
        .get("/items", || async { "list" })
        .post("/items", || async { StatusCode::CREATED })
        .handle(Method::DELETE, "/items", || async { StatusCode::NO_CONTENT })
        .into_router();

    send(&app, "/items").await;
    let post = Request::post("/items").body(Body::empty()).unwrap();
    assert_eq!(app.clone().oneshot(post).await.unwrap().status(), StatusCode::CREATED);
    let delete = Request::delete("/items").body(Body::empty()).unwrap();
    assert_eq!(app.clone().oneshot(delete).await.unwrap().status(), StatusCode::NO_CONTENT);

    let snap = reg.flush().await;
    assert_eq!(count(&snap, "api./items.GET.200.count"), 1);
    assert_eq!(count(&snap, "api./items.POST.201.count"), 1);
    assert_eq!(count(&snap, "api./items.DELETE.204.count"), 1);
}

#[tokio::test]
async fn test_unrouted_method_is_not_counted() {
    let reg = registry(100);
    let app: Router = HttpMuxer::new(&reg, "http")
        .get("/items", || async { "list" })
        .post("/items", || async { StatusCode::CREATED })
        .into_router();

    let put = Request::put("/items").body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(put).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

    let snap = reg.flush().await;
    assert!(
        !snap.iter().any(|s| s.name.as_str().ends_with(".405.count")),
        "405 must not be recorded"
    );
    for method in ["GET", "POST"] {
        let timer = snap
            .get(&format!("http./items.{method}.time"))
            .unwrap()
            .value
            .as_timer()
            .unwrap();
        assert_eq!(timer.count, 0, "{method} timer");
        assert_eq!(count(&snap, &format!("http./items.{method}.0.count")), 0);
    }
}

#[tokio::test]
#[should_panic(expected = "already registered")]
async fn test_duplicate_route_panics() {
    let reg = registry(100);
    let _ = HttpMuxer::<()>::new(&reg, "http")
        .get("/twice", || async { "a" })
        .get("/twice", || async { "b" });
}

#[tokio::test]
async fn test_status_handler_renders_nested_json() {
    let reg = registry(100);
    let app: Router = reg.http_muxer("http").into_router();

    reg.new_timer("some.timer", 100).add(Duration::from_secs(1));
    reg.new_counter("module.counter", false).add(100);
    reg.new_gauge("my.gauge").set(9);
    reg.new_string_gauge("str.gauge").set("some string");
    reg.flush().await;

    let resp = send(&app, "/_status").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/json");

    let expected = [
        "{",
        "\t\"module\": {",
        "\t\t\"counter\": 100",
        "\t},",
        "\t\"my\": {",
        "\t\t\"gauge\": 9",
        "\t},",
        "\t\"some\": {",
        "\t\t\"timer\": {",
        "\t\t\t\"count\": 1,",
        "\t\t\t\"max\": 1000000000,",
        "\t\t\t\"mean\": 1000000000,",
        "\t\t\t\"min\": 1000000000,",
        "\t\t\t\"p50\": 1000000000,",
        "\t\t\t\"p75\": 1000000000,",
        "\t\t\t\"p90\": 1000000000,",
        "\t\t\t\"p95\": 1000000000,",
        "\t\t\t\"stddev\": 0",
        "\t\t}",
        "\t},",
        "\t\"str\": {",
        "\t\t\"gauge\": \"some string\"",
        "\t}",
        "}",
    ]
    .join("\n");
    assert_eq!(body_string(resp).await, expected);
}

#[tokio::test]
async fn test_status_handler_encode_error_is_500() {
    let reg = registry(100);
    let app: Router = reg.http_muxer("http").into_router();

    reg.new_float_gauge("bad.float").set(f64::NAN);
    reg.flush().await;

    let resp = send(&app, "/_status").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(resp).await.is_empty());
}

#[tokio::test]
async fn test_empty_status_key_mounts_nothing() {
    let cfg = Config {
        snapshot_interval: Duration::ZERO,
        status_key: String::new(),
        ..Config::default()
    };
    let reg = Registry::new(cfg, CancellationToken::new()).unwrap();
    let app: Router = reg.http_muxer("http").into_router();

    assert_eq!(send(&app, "/_status").await.status(), StatusCode::NOT_FOUND);
}
