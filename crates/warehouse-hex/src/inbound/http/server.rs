use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{delete, get, patch, post, put},
    serve, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::AppState;
use crate::errors::AppError;
use warehouse_types::domain::order::{LineItem, Order, OrderStatus};
use warehouse_types::domain::user::{Claims, Role, User};
use warehouse_types::ports::clock::Clock;
use warehouse_types::ports::order_store::OrderStore;
use warehouse_types::ports::user_store::UserStore;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
}

pub struct HttpServer<S, C>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    pub state: Arc<AppState<S, C>>,
    pub config: HttpServerConfig,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub login: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub owner_user_id: Option<Uuid>,
    pub items: Vec<LineItem>,
}

#[derive(Deserialize)]
pub struct UpdateOrderRequest {
    pub items: Vec<LineItem>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

#[derive(Serialize)]
struct CreateOrderResponse {
    id: String,
    number: u64,
    total_cents: u64,
    status: OrderStatus,
}

impl From<Order> for CreateOrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            number: order.number,
            total_cents: order.total_cents,
            status: order.status,
        }
    }
}

/// Extracts and verifies the bearer token. A missing or garbled header is
/// the same `Unauthorized` as a failed verification.
fn bearer_claims<S, C>(state: &AppState<S, C>, headers: &HeaderMap) -> Result<Claims, AppError>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::unauthorized("missing bearer token"))?;
    state.tokens.verify(token, state.clock.now())
}

fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|e| AppError::validation(e.to_string()))
}

impl<S, C> HttpServer<S, C>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    pub fn new(state: Arc<AppState<S, C>>, config: HttpServerConfig) -> Self {
        Self { state, config }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        let app = Router::new()
            .route("/health", get(health))
            .route("/register", post(register::<S, C>))
            .route("/login", post(login::<S, C>))
            .route("/orders", post(create_order::<S, C>))
            .route("/orders", get(list_orders::<S, C>))
            .route("/orders/{id}", get(get_order::<S, C>))
            .route("/orders/{id}", put(update_order::<S, C>))
            .route("/orders/{id}/status", patch(update_status::<S, C>))
            .route("/orders/{id}", delete(delete_order::<S, C>))
            .route("/users/{id}", get(get_user::<S, C>))
            .route("/users/{id}/role", patch(change_role::<S, C>))
            .layer(CatchPanicLayer::new())
            .layer(trace_layer)
            .with_state(self.state);

        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting http server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn register<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    let user = state
        .users
        .register(crate::application::user_service::NewUser {
            login: payload.login,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    let (token, user) = state.users.login(&payload.login, &payload.password).await?;
    Ok(Json(LoginResponse { token, user }))
}

async fn create_order<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    headers: HeaderMap,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), AppError>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    let claims = bearer_claims(&state, &headers)?;
    let order = state
        .orders
        .create_order(&claims, payload.owner_user_id, payload.items)
        .await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

async fn get_order<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    let claims = bearer_claims(&state, &headers)?;
    let order = state.orders.get_order(&claims, parse_id(&id)?).await?;
    Ok(Json(order))
}

async fn list_orders<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Order>>, AppError>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    let claims = bearer_claims(&state, &headers)?;
    let orders = state.orders.list_orders(&claims).await?;
    Ok(Json(orders))
}

async fn update_order<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<UpdateOrderRequest>,
) -> Result<Json<Order>, AppError>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    let claims = bearer_claims(&state, &headers)?;
    let updated = state
        .orders
        .update_order(&claims, parse_id(&id)?, payload.items)
        .await?;
    Ok(Json(updated))
}

async fn update_status<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, AppError>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    let claims = bearer_claims(&state, &headers)?;
    let updated = state
        .orders
        .change_status(&claims, parse_id(&id)?, payload.status)
        .await?;
    Ok(Json(updated))
}

async fn delete_order<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    let claims = bearer_claims(&state, &headers)?;
    state.orders.delete_order(&claims, parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_user<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    let claims = bearer_claims(&state, &headers)?;
    let user = state.users.get_user(&claims, parse_id(&id)?).await?;
    Ok(Json(user))
}

async fn change_role<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<Json<User>, AppError>
where
    S: OrderStore + UserStore + Clone,
    C: Clock + Clone,
{
    let claims = bearer_claims(&state, &headers)?;
    let user = state
        .users
        .change_role(&claims, parse_id(&id)?, payload.role)
        .await?;
    Ok(Json(user))
}
