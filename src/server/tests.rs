//! Tests for the assembled server: route table, embedded document
//! passthrough, and the shutdown sequence.

use crate::config::Config;
use crate::server::HttpServer;
use crate::server::state::AppState;
use crate::utils::error::ServiceError;
use actix_web::http::StatusCode;
use actix_web::http::header;
use actix_web::{test, web};
use bytes::Bytes;
use std::time::Duration;

const OPENAPI_FIXTURE: &[u8] = b"openapi: 3.0.3\ninfo:\n  title: Test API\n  version: 0.0.1\n";

fn test_state() -> web::Data<AppState> {
    web::Data::new(AppState::new(
        Config::default(),
        Bytes::from_static(OPENAPI_FIXTURE),
    ))
}

#[actix_web::test]
async fn health_reports_status_and_increasing_uptime() {
    let app = test::init_service(HttpServer::create_app(test_state())).await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    assert!(content_type.starts_with("application/json"));

    let first: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(first["status"], "healthy");
    assert_eq!(first["version"], env!("CARGO_PKG_VERSION"));
    assert!(first["revision"].is_string());
    assert!(first["timestamp"].is_string());

    tokio::time::sleep(Duration::from_millis(15)).await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    let second: serde_json::Value = test::read_body_json(res).await;

    let uptime = |v: &serde_json::Value| -> f64 {
        v["uptime"]
            .as_str()
            .and_then(|s| s.strip_suffix('s'))
            .and_then(|s| s.parse().ok())
            .unwrap()
    };
    assert!(uptime(&second) > uptime(&first));
}

#[actix_web::test]
async fn openapi_document_served_verbatim() {
    let app = test::init_service(HttpServer::create_app(test_state())).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/openapi.yaml").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/yaml"
    );
    assert_eq!(
        res.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );

    let body = test::read_body(res).await;
    assert_eq!(&body[..], OPENAPI_FIXTURE);
}

#[actix_web::test]
async fn debug_routes_answer_200() {
    let app = test::init_service(HttpServer::create_app(test_state())).await;

    for path in [
        "/debug/pprof/",
        "/debug/pprof/cmdline",
        "/debug/pprof/profile",
        "/debug/pprof/symbol",
        "/debug/pprof/trace",
        "/debug/vars",
    ] {
        let res = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK, "path: {path}");
    }
}

#[actix_web::test]
async fn debug_vars_reports_runtime_info() {
    let app = test::init_service(HttpServer::create_app(test_state())).await;

    let res =
        test::call_service(&app, test::TestRequest::get().uri("/debug/vars").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let vars: serde_json::Value = test::read_body_json(res).await;
    assert!(vars["cmdline"].is_array());
    assert_eq!(vars["version"], env!("CARGO_PKG_VERSION"));
    assert!(vars["uptime"].as_str().unwrap().ends_with('s'));
}

#[actix_web::test]
async fn unknown_paths_return_404() {
    let app = test::init_service(HttpServer::create_app(test_state())).await;

    for path in ["/nope", "/debug/pprof/heap", "/debug/unknown", "/healthz"] {
        let res = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "path: {path}");
    }
}

#[actix_web::test]
async fn run_until_returns_cleanly_on_shutdown_trigger() {
    let config = Config {
        port: 0, // ephemeral port, nothing else binds it
        ..Config::default()
    };
    let server = HttpServer::new(config, Bytes::from_static(OPENAPI_FIXTURE));
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let task = tokio::spawn(server.run_until(async {
        let _ = rx.await;
    }));

    // Let the listener come up before triggering shutdown
    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(()).unwrap();

    let res = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("shutdown did not complete in time")
        .expect("server task panicked");
    assert!(res.is_ok(), "unexpected error: {res:?}");
}

#[actix_web::test]
async fn drain_overrun_surfaces_shutdown_error() {
    use tokio::io::AsyncWriteExt;

    // Reserve a concrete port so the held-open connection knows where to go
    let port = {
        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    };
    let config = Config {
        host: "127.0.0.1".to_string(),
        port,
        shutdown_timeout: Duration::from_secs(1),
    };
    let server = HttpServer::new(config, Bytes::from_static(OPENAPI_FIXTURE));
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let task = tokio::spawn(server.run_until(async {
        let _ = rx.await;
    }));
    tokio::time::sleep(Duration::from_millis(100)).await;

    // A connection with an unfinished request keeps the worker busy past
    // the grace period; the drain then force-closes it on expiry.
    let mut conn = tokio::net::TcpStream::connect(("127.0.0.1", port))
        .await
        .unwrap();
    conn.write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\n")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    tx.send(()).unwrap();

    let res = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("shutdown did not complete in time")
        .expect("server task panicked");
    assert!(
        matches!(res, Err(ServiceError::Shutdown(_))),
        "expected shutdown error, got: {res:?}"
    );
    drop(conn);
}
