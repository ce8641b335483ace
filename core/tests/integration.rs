//! End-to-end dispatch against the live echo server.
//!
//! # Design
//! Starts the mock server on a random port in a background tokio runtime,
//! then drives the blocking client over real HTTP. The echo payload is
//! decoded into a local struct so the two crates stay independent.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use courier::{Client, Context, Error, OutgoingRequest, Request};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct Echo {
    method: String,
    path: String,
    query: Option<String>,
    headers: BTreeMap<String, Vec<String>>,
    body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Order {
    id: u32,
    item: String,
    quantity: u16,
}

fn order() -> Order {
    Order {
        id: 42,
        item: "widget".to_string(),
        quantity: 3,
    }
}

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> Client {
    Client::builder()
        .base_url(format!("http://{addr}"))
        .header("X-Env", "test")
        .build()
        .unwrap()
}

#[test]
fn query_and_base_headers_reach_server() {
    let client = client(start_server());

    let resp = client
        .dispatch(
            Request::new()
                .get("echo/users")
                .query_param("id", "1")
                .header("X-Env", "request"),
        )
        .unwrap();

    assert!(resp.is_success());
    let echo: Echo = resp.json_body().unwrap();
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.path, "/echo/users");
    assert_eq!(echo.query.as_deref(), Some("id=1"));
    assert_eq!(echo.headers["x-env"], vec!["test", "request"]);
}

#[test]
fn json_round_trip() {
    let client = client(start_server());

    let resp = client
        .dispatch(Request::new().post("/reflect").json_body(&order()))
        .unwrap();

    assert_eq!(resp.header("content-type"), Some("application/json"));
    let back: Order = resp.json_body().unwrap();
    assert_eq!(back, order());
}

#[test]
fn yaml_and_xml_round_trip() {
    let client = client(start_server());

    let resp = client
        .dispatch(Request::new().post("/reflect").yaml_body(&order()))
        .unwrap();
    let back: Order = resp.yaml_body().unwrap();
    assert_eq!(back, order());

    let resp = client
        .dispatch(Request::new().post("/reflect").xml_body(&order()))
        .unwrap();
    assert_eq!(resp.header("content-type"), Some("application/xml"));
    let back: Order = resp.xml_body().unwrap();
    assert_eq!(back, order());
}

#[test]
fn form_and_text_bodies_reach_server() {
    let client = client(start_server());

    let resp = client
        .dispatch(Request::new().put("/echo/form").form_body(&[("name", "Ada L"), ("lang", "en")]))
        .unwrap();
    let echo: Echo = resp.json_body().unwrap();
    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.body, "name=Ada+L&lang=en");
    assert_eq!(echo.headers["content-type"], vec!["application/x-www-form-urlencoded"]);

    let resp = client
        .dispatch(Request::new().patch("/echo/text").text_body("plain words"))
        .unwrap();
    let echo: Echo = resp.json_body().unwrap();
    assert_eq!(echo.method, "PATCH");
    assert_eq!(echo.body, "plain words");
}

#[test]
fn multipart_body_reaches_server() {
    let client = client(start_server());

    let resp = client
        .dispatch(Request::new().post("/echo/upload").multipart_form_body(&[("title", "report")]))
        .unwrap();
    let echo: Echo = resp.json_body().unwrap();
    let content_type = &echo.headers["content-type"][0];
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    assert!(echo.body.contains("name=\"title\"\r\n\r\nreport\r\n"));
}

#[test]
fn status_classes_come_from_server() {
    let client = client(start_server());

    let resp = client.dispatch(Request::new().get("/status/404")).unwrap();
    assert!(resp.is_client_error());
    assert!(resp.is_error());
    assert!(!resp.is_success());
    assert_eq!(resp.text_body(), "status 404");

    let resp = client.dispatch(Request::new().get("/status/503")).unwrap();
    assert!(resp.is_server_error());

    let resp = client.dispatch(Request::new().delete("/status/204")).unwrap();
    assert!(resp.is_success());
    assert!(resp.body().is_empty());
}

#[test]
fn rejecting_middleware_sends_nothing() {
    let addr = start_server();
    let mut client = client(addr);
    client.use_middleware(|req: &mut OutgoingRequest| -> courier::Result<()> {
        if req.headers().contains_key("authorization") {
            Ok(())
        } else {
            Err(Error::middleware("missing credentials"))
        }
    });

    let err = client.dispatch(Request::new().get("/echo")).unwrap_err();
    assert!(matches!(err, Error::Middleware(_)));

    let resp = client
        .dispatch(Request::new().get("/echo").header("Authorization", "Bearer x"))
        .unwrap();
    assert!(resp.is_success());
}

#[test]
fn client_timeout_aborts_slow_call() {
    let addr = start_server();
    let client = Client::builder()
        .base_url(format!("http://{addr}"))
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let err = client.dispatch(Request::new().get("/delay/2000")).unwrap_err();
    assert!(matches!(err, Error::Timeout), "got {err:?}");
}

#[test]
fn context_deadline_aborts_slow_call() {
    let client = client(start_server());

    let err = client
        .dispatch(
            Request::new()
                .get("/delay/2000")
                .context(Context::with_timeout(Duration::from_millis(100))),
        )
        .unwrap_err();
    assert!(err.is_cancellation() || matches!(err, Error::Timeout), "got {err:?}");
}

#[test]
fn cancelling_context_aborts_in_flight_call() {
    let client = client(start_server());
    let ctx = Context::background();
    let canceller = ctx.clone();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        canceller.cancel();
    });

    let started = Instant::now();
    let err = client
        .dispatch(Request::new().get("/delay/3000").context(ctx))
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, Error::Cancelled), "got {err:?}");
    assert!(elapsed < Duration::from_secs(1), "cancel took {elapsed:?}");
}

#[test]
fn body_larger_than_ten_mib_is_fully_buffered() {
    let client = client(start_server());
    let size = 11 * 1024 * 1024;

    let resp = client
        .dispatch(Request::new().get(format!("/bytes/{size}")))
        .unwrap();

    assert!(resp.is_success());
    assert_eq!(resp.body().len(), size);
    assert!(resp.body().iter().all(|b| *b == b'x'));
}

#[test]
fn connection_refused_is_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = client(addr);

    let err = client.dispatch(Request::new().get("/echo")).unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
}
