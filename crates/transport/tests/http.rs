use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use config::{Protocol, TransportConfig};
use groups::{DispatchError, Dispatcher, GroupIdentity, GroupsClient, Modifiers};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::oneshot};
use transport::HttpDispatcher;

type Captured = Arc<Mutex<Vec<(String, BTreeMap<String, String>)>>>;

#[derive(Clone)]
struct CaptureState {
    captured: Captured,
    status: StatusCode,
    body: &'static str,
}

async fn handle(
    State(state): State<CaptureState>,
    uri: axum::http::Uri,
    Query(query): Query<BTreeMap<String, String>>,
) -> impl IntoResponse {
    state.captured.lock().unwrap().push((uri.path().to_string(), query));

    (state.status, state.body)
}

struct TestServer {
    port: u16,
    captured: Captured,
}

impl TestServer {
    async fn start(status: StatusCode, body: &'static str) -> Self {
        let captured = Captured::default();

        let state = CaptureState {
            captured: captured.clone(),
            status,
            body,
        };

        let app = Router::new()
            .route("/groups", get(handle))
            .route("/proxy/groups", get(handle))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { port, captured }
    }

    fn config(&self) -> TransportConfig {
        TransportConfig {
            host: "127.0.0.1".to_string(),
            protocol: Protocol::Http,
            port: Some(self.port),
            ..Default::default()
        }
    }

    fn requests(&self) -> Vec<(String, BTreeMap<String, String>)> {
        self.captured.lock().unwrap().clone()
    }
}

fn decode_data(query: &BTreeMap<String, String>) -> Value {
    let bytes = STANDARD.decode(&query["data"]).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn client(dispatcher: HttpDispatcher) -> GroupsClient {
    GroupsClient::new(SecretString::from("token".to_string()), dispatcher)
}

fn acme() -> GroupIdentity {
    GroupIdentity::new("company", "Acme Inc.")
}

#[tokio::test]
async fn sends_base64_encoded_data() {
    let server = TestServer::start(StatusCode::OK, "1").await;
    let client = client(HttpDispatcher::new(&server.config()).unwrap());

    let (sender, receiver) = oneshot::channel();

    client
        .union(acme(), json!({"tags": "a"}))
        .modifiers(Modifiers::new().ip("1.2.3.4"))
        .callback(move |result| {
            let _ = sender.send(result);
        })
        .send()
        .unwrap();

    assert_eq!(receiver.await.unwrap(), Ok(()));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);

    let (path, query) = &requests[0];
    assert_eq!(path, "/groups");
    assert_eq!(query["ip"], "0");
    assert_eq!(query["verbose"], "0");
    assert!(!query.contains_key("test"));

    insta::assert_json_snapshot!(decode_data(query), @r#"
    {
      "$group_id": "Acme Inc.",
      "$group_key": "company",
      "$ip": "1.2.3.4",
      "$token": "token",
      "$union": {
        "tags": [
          "a"
        ]
      }
    }
    "#);
}

#[tokio::test]
async fn plain_rejection_reaches_callback() {
    let server = TestServer::start(StatusCode::OK, "0").await;
    let client = client(HttpDispatcher::new(&server.config()).unwrap());

    let (sender, receiver) = oneshot::channel();

    client
        .delete_group(acme())
        .callback(move |result| {
            let _ = sender.send(result);
        })
        .send()
        .unwrap();

    assert_eq!(receiver.await.unwrap(), Err(DispatchError::Rejected("0".to_string())));
}

#[tokio::test]
async fn verbose_mode() {
    let server = TestServer::start(StatusCode::OK, r#"{"status": 0, "error": "token, missing or empty"}"#).await;

    let config = TransportConfig {
        verbose: true,
        ..server.config()
    };

    let dispatcher = HttpDispatcher::new(&config).unwrap();
    let request = client(dispatcher.clone()).unset(acme(), "plan").build().unwrap();

    let result = dispatcher.send(&request).await;

    insta::assert_debug_snapshot!(result, @r#"
    Err(
        Rejected(
            "token, missing or empty",
        ),
    )
    "#);

    assert_eq!(server.requests()[0].1["verbose"], "1");
}

#[tokio::test]
async fn geolocate_test_mode_and_path_prefix() {
    let server = TestServer::start(StatusCode::OK, "1").await;

    let config = TransportConfig {
        geolocate: true,
        test: true,
        path: "/proxy".to_string(),
        ..server.config()
    };

    let dispatcher = HttpDispatcher::new(&config).unwrap();
    let request = client(dispatcher.clone()).set(acme(), ("plan", "enterprise")).build().unwrap();

    assert_eq!(dispatcher.send(&request).await, Ok(()));

    let requests = server.requests();
    let (path, query) = &requests[0];
    assert_eq!(path, "/proxy/groups");
    assert_eq!(query["ip"], "1");
    assert_eq!(query["test"], "1");
    assert_eq!(decode_data(query)["$set"], json!({"plan": "enterprise"}));
}

#[tokio::test]
async fn http_error_status() {
    let server = TestServer::start(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;
    let dispatcher = HttpDispatcher::new(&server.config()).unwrap();

    let request = client(dispatcher.clone()).delete_group(acme()).build().unwrap();

    assert_eq!(
        dispatcher.send(&request).await,
        Err(DispatchError::Http {
            status: 500,
            body: "boom".to_string(),
        })
    );
}

#[tokio::test]
async fn connection_refused() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let config = TransportConfig {
        host: "127.0.0.1".to_string(),
        protocol: Protocol::Http,
        port: Some(port),
        ..Default::default()
    };

    let dispatcher = HttpDispatcher::new(&config).unwrap();
    let request = client(dispatcher.clone()).delete_group(acme()).build().unwrap();

    let (sender, receiver) = oneshot::channel();

    dispatcher.send_request(
        request,
        Some(Box::new(move |result| {
            let _ = sender.send(result);
        })),
    );

    assert!(matches!(receiver.await.unwrap(), Err(DispatchError::Connection(_))));
}

#[test]
fn requires_a_runtime() {
    let error = HttpDispatcher::new(&TransportConfig::default()).err().unwrap();

    insta::assert_snapshot!(error, @"HTTP dispatcher must be created within a tokio runtime");
}
