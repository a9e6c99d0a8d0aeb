//! RPC transport: newline-delimited JSON frames over TCP.
//!
//! Every response carries an [`RpcCode`] from the gRPC status vocabulary;
//! the mapping from [`AppError`] kinds lives in the error module, so this
//! adapter never invents status semantics of its own. Dispatch is a tagged
//! enum over the closed method set.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::application::AppState;
use crate::errors::{AppError, RpcCode};
use warehouse_types::domain::order::{LineItem, OrderStatus};
use warehouse_types::domain::user::Claims;
use warehouse_types::ports::clock::Clock;
use warehouse_types::ports::order_store::OrderStore;
use warehouse_types::ports::user_store::UserStore;

#[derive(Clone)]
pub struct RpcServerConfig {
    pub port: String,
}

pub struct RpcServer<S, C>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    pub state: Arc<AppState<S, C>>,
    pub config: RpcServerConfig,
}

#[derive(Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
enum RpcMethod {
    Login {
        login: String,
        password: String,
    },
    CreateOrder {
        owner_user_id: Option<Uuid>,
        items: Vec<LineItem>,
    },
    GetOrder {
        id: Uuid,
    },
    ListOrders,
    UpdateOrder {
        id: Uuid,
        items: Vec<LineItem>,
    },
    ChangeStatus {
        id: Uuid,
        status: OrderStatus,
    },
    DeleteOrder {
        id: Uuid,
    },
    GetUser {
        id: Uuid,
    },
}

#[derive(Deserialize)]
struct RpcRequest {
    token: Option<String>,
    #[serde(flatten)]
    call: RpcMethod,
}

#[derive(Serialize)]
pub struct RpcResponse {
    pub code: RpcCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RpcResponse {
    fn ok(result: serde_json::Value) -> Self {
        Self {
            code: RpcCode::Ok,
            result: Some(result),
            error: None,
        }
    }

    fn err(code: RpcCode, message: String) -> Self {
        Self {
            code,
            result: None,
            error: Some(message),
        }
    }
}

impl From<AppError> for RpcResponse {
    fn from(err: AppError) -> Self {
        err.log();
        let message = match err.rpc_code() {
            // Same hygiene as the HTTP projection: internal detail stays
            // server-side.
            RpcCode::Internal => "internal error".to_string(),
            _ => err.message().to_owned(),
        };
        Self::err(err.rpc_code(), message)
    }
}

impl<S, C> RpcServer<S, C>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    pub fn new(state: Arc<AppState<S, C>>, config: RpcServerConfig) -> Self {
        Self { state, config }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting rpc server on {}", addr);
        let listener = TcpListener::bind(addr).await?;
        loop {
            let (socket, peer) = listener.accept().await?;
            let state = self.state.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(socket, state).await {
                    tracing::debug!(%peer, error = %e, "rpc connection closed");
                }
            });
        }
    }
}

async fn handle_connection<S, C>(
    socket: tokio::net::TcpStream,
    state: Arc<AppState<S, C>>,
) -> std::io::Result<()>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    let (reader, mut writer) = socket.into_split();
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = dispatch(&state, &line).await;
        let mut frame = serde_json::to_string(&response)
            .unwrap_or_else(|_| "{\"code\":\"Internal\",\"error\":\"internal error\"}".into());
        frame.push('\n');
        writer.write_all(frame.as_bytes()).await?;
    }
    Ok(())
}

fn authenticate<S, C>(
    state: &AppState<S, C>,
    token: Option<&str>,
) -> Result<Claims, AppError>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    let token = token.ok_or_else(|| AppError::unauthorized("missing token"))?;
    state.tokens.verify(token, state.clock.now())
}

async fn dispatch<S, C>(state: &AppState<S, C>, line: &str) -> RpcResponse
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    let request: RpcRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            return RpcResponse::err(RpcCode::InvalidArgument, format!("malformed request: {e}"))
        }
    };

    match handle(state, request).await {
        Ok(value) => RpcResponse::ok(value),
        Err(e) => e.into(),
    }
}

/// One exhaustive match over the method set. `login` is the only
/// unauthenticated call; every other arm verifies the token first.
async fn handle<S, C>(
    state: &AppState<S, C>,
    request: RpcRequest,
) -> Result<serde_json::Value, AppError>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    let RpcRequest { token, call } = request;
    let token = token.as_deref();
    match call {
        RpcMethod::Login { login, password } => {
            let (token, user) = state.users.login(&login, &password).await?;
            Ok(serde_json::json!({ "token": token, "user": user }))
        }
        RpcMethod::CreateOrder {
            owner_user_id,
            items,
        } => {
            let claims = authenticate(state, token)?;
            to_value(state.orders.create_order(&claims, owner_user_id, items).await?)
        }
        RpcMethod::GetOrder { id } => {
            let claims = authenticate(state, token)?;
            to_value(state.orders.get_order(&claims, id).await?)
        }
        RpcMethod::ListOrders => {
            let claims = authenticate(state, token)?;
            to_value(state.orders.list_orders(&claims).await?)
        }
        RpcMethod::UpdateOrder { id, items } => {
            let claims = authenticate(state, token)?;
            to_value(state.orders.update_order(&claims, id, items).await?)
        }
        RpcMethod::ChangeStatus { id, status } => {
            let claims = authenticate(state, token)?;
            to_value(state.orders.change_status(&claims, id, status).await?)
        }
        RpcMethod::DeleteOrder { id } => {
            let claims = authenticate(state, token)?;
            state.orders.delete_order(&claims, id).await?;
            Ok(serde_json::json!({ "deleted": true }))
        }
        RpcMethod::GetUser { id } => {
            let claims = authenticate(state, token)?;
            to_value(state.users.get_user(&claims, id).await?)
        }
    }
}

fn to_value<T: Serialize>(value: T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value)
        .map_err(|e| AppError::internal("failed to serialize result").with_cause(anyhow::anyhow!(e)))
}
