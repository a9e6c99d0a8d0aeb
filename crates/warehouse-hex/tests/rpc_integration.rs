use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use uuid::Uuid;
use warehouse_hex::application::AppState;
use warehouse_hex::auth::tokens::{TokenService, DEFAULT_TTL_SECS};
use warehouse_hex::errors::RpcCode;
use warehouse_hex::inbound::rpc::{RpcServer, RpcServerConfig};
use warehouse_repo::memory::InMemoryStore;
use warehouse_types::domain::user::Role;
use warehouse_types::ports::clock::SystemClock;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[derive(Deserialize)]
struct Response {
    code: RpcCode,
    result: Option<serde_json::Value>,
    error: Option<String>,
}

struct RpcClient {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl RpcClient {
    async fn connect(addr: &str) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    async fn call(&mut self, frame: serde_json::Value) -> Response {
        let mut line = frame.to_string();
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await.unwrap();
        let mut buf = String::new();
        self.reader.read_line(&mut buf).await.unwrap();
        serde_json::from_str(&buf).unwrap()
    }
}

async fn start_server() -> (String, Arc<TokenService>) {
    let port = find_free_port();
    let tokens = Arc::new(TokenService::new(b"rpc-test-secret", DEFAULT_TTL_SECS));
    let state = Arc::new(AppState::new(
        InMemoryStore::new(),
        SystemClock,
        tokens.clone(),
    ));

    // Seed one client account for the login round trip.
    state
        .users
        .register(warehouse_hex::application::user_service::NewUser {
            login: "carol".into(),
            password: "hunter2".into(),
            first_name: "Carol".into(),
            last_name: "King".into(),
            email: "carol@example.com".into(),
        })
        .await
        .unwrap();

    let server = RpcServer::new(
        state,
        RpcServerConfig {
            port: port.to_string(),
        },
    );
    tokio::spawn(async move {
        server.run().await.expect("rpc server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    (format!("127.0.0.1:{port}"), tokens)
}

#[tokio::test]
async fn login_and_order_lifecycle_over_rpc() {
    let (addr, tokens) = start_server().await;
    let mut client = RpcClient::connect(&addr).await;

    let login = client
        .call(serde_json::json!({
            "method": "login",
            "params": { "login": "carol", "password": "hunter2" }
        }))
        .await;
    assert_eq!(login.code, RpcCode::Ok);
    let token = login.result.unwrap()["token"].as_str().unwrap().to_owned();

    let created = client
        .call(serde_json::json!({
            "method": "create_order",
            "token": token.as_str(),
            "params": {
                "owner_user_id": null,
                "items": [
                    { "product_id": Uuid::new_v4(), "quantity": 2, "sell_price_cents": 500 }
                ]
            }
        }))
        .await;
    assert_eq!(created.code, RpcCode::Ok);
    let order = created.result.unwrap();
    assert_eq!(order["total_cents"], 1000);
    assert_eq!(order["status"], "Active");
    let order_id = order["id"].as_str().unwrap().to_owned();

    let fetched = client
        .call(serde_json::json!({
            "method": "get_order",
            "token": token.as_str(),
            "params": { "id": order_id.as_str() }
        }))
        .await;
    assert_eq!(fetched.code, RpcCode::Ok);

    // Status change as a client: PermissionDenied.
    let denied = client
        .call(serde_json::json!({
            "method": "change_status",
            "token": token.as_str(),
            "params": { "id": order_id.as_str(), "status": "Executed" }
        }))
        .await;
    assert_eq!(denied.code, RpcCode::PermissionDenied);
    assert!(denied.error.is_some());

    // As an employee it succeeds, and reverting is FailedPrecondition.
    let employee = tokens
        .issue(Uuid::new_v4(), "boss", Role::Employee, Utc::now())
        .unwrap();
    let executed = client
        .call(serde_json::json!({
            "method": "change_status",
            "token": employee.as_str(),
            "params": { "id": order_id.as_str(), "status": "Executed" }
        }))
        .await;
    assert_eq!(executed.code, RpcCode::Ok);

    let reverted = client
        .call(serde_json::json!({
            "method": "change_status",
            "token": employee.as_str(),
            "params": { "id": order_id.as_str(), "status": "Active" }
        }))
        .await;
    assert_eq!(reverted.code, RpcCode::FailedPrecondition);

    let deleted = client
        .call(serde_json::json!({
            "method": "delete_order",
            "token": employee.as_str(),
            "params": { "id": order_id.as_str() }
        }))
        .await;
    assert_eq!(deleted.code, RpcCode::Ok);

    let missing = client
        .call(serde_json::json!({
            "method": "delete_order",
            "token": employee.as_str(),
            "params": { "id": order_id.as_str() }
        }))
        .await;
    assert_eq!(missing.code, RpcCode::NotFound);
}

#[tokio::test]
async fn account_reads_are_self_or_employee_only_over_rpc() {
    let (addr, tokens) = start_server().await;
    let mut client = RpcClient::connect(&addr).await;

    let login = client
        .call(serde_json::json!({
            "method": "login",
            "params": { "login": "carol", "password": "hunter2" }
        }))
        .await;
    let result = login.result.unwrap();
    let token = result["token"].as_str().unwrap().to_owned();
    let carol_id = result["user"]["id"].as_str().unwrap().to_owned();

    let own = client
        .call(serde_json::json!({
            "method": "get_user",
            "token": token.as_str(),
            "params": { "id": carol_id.as_str() }
        }))
        .await;
    assert_eq!(own.code, RpcCode::Ok);
    let body = own.result.unwrap();
    assert_eq!(body["login"], "carol");
    assert!(body.get("password_hash").is_none());

    let other = client
        .call(serde_json::json!({
            "method": "get_user",
            "token": token.as_str(),
            "params": { "id": Uuid::new_v4() }
        }))
        .await;
    assert_eq!(other.code, RpcCode::PermissionDenied);

    let employee = tokens
        .issue(Uuid::new_v4(), "boss", Role::Employee, Utc::now())
        .unwrap();
    let read = client
        .call(serde_json::json!({
            "method": "get_user",
            "token": employee.as_str(),
            "params": { "id": carol_id.as_str() }
        }))
        .await;
    assert_eq!(read.code, RpcCode::Ok);
}

#[tokio::test]
async fn rpc_rejections_use_the_grpc_vocabulary() {
    let (addr, _tokens) = start_server().await;
    let mut client = RpcClient::connect(&addr).await;

    // Malformed frame.
    let malformed = client.call(serde_json::json!({ "method": "no_such" })).await;
    assert_eq!(malformed.code, RpcCode::InvalidArgument);

    // Missing token on an authenticated method.
    let unauthenticated = client
        .call(serde_json::json!({ "method": "list_orders" }))
        .await;
    assert_eq!(unauthenticated.code, RpcCode::Unauthenticated);

    // Bad credentials.
    let bad_login = client
        .call(serde_json::json!({
            "method": "login",
            "params": { "login": "carol", "password": "wrong" }
        }))
        .await;
    assert_eq!(bad_login.code, RpcCode::Unauthenticated);
    assert!(bad_login.result.is_none());

    // Login never consults the token field, even a garbage one.
    let with_token = client
        .call(serde_json::json!({
            "method": "login",
            "token": "not.a.jwt",
            "params": { "login": "carol", "password": "hunter2" }
        }))
        .await;
    assert_eq!(with_token.code, RpcCode::Ok);
}
