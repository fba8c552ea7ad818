//! Axum handlers.
//!
//! Handlers take the raw body bytes and parse them themselves so that a
//! missing, malformed, non-UTF-8 or over-specified body is answered with
//! `INVALID_REQUEST`, and an oversized one with `PAYLOAD_TOO_LARGE`, in the
//! gateway's own error shape rather than axum's rejection text.

use crate::domain::{ApiError, GatewayError, GatewayResult};
use crate::schema::*;
use crate::service::Gateway;
use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

type HandlerResult<T> = Result<Json<T>, GatewayError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// Every gateway route, without middleware.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/metrics", get(metrics))
        .route("/users", get(users))
        .route("/check", post(check))
        .route("/check-qtum-address", post(check_address))
        .route("/getAccessToken", post(access_token))
        .route("/register", post(register))
        .route("/confirm", post(confirm))
        .route("/create", post(create))
        .route("/withdraw", post(withdraw))
        .route("/encode-support", post(encode_support))
        .route("/encode-deposit", post(encode_deposit))
        .route("/init", post(init))
        .route("/support", post(support))
        .route("/deposit", post(deposit))
        .with_state(state)
}

/// Buffered request body.
struct RawBody(Bytes);

#[async_trait]
impl<S> FromRequest<S> for RawBody
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Bytes::from_request(req, state)
            .await
            .map(RawBody)
            .map_err(|rejection| {
                if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    GatewayError::PayloadTooLarge
                } else {
                    GatewayError::InvalidRequest(rejection.body_text())
                }
            })
    }
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> GatewayResult<T> {
    Ok(serde_json::from_slice(body)?)
}

/// Like [`parse`], but an empty body is an empty object.
fn parse_or_default<T: DeserializeOwned + Default>(body: &[u8]) -> GatewayResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        Ok(T::default())
    } else {
        parse(body)
    }
}

async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    Json(state.gateway.ping())
}

async fn metrics(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.gateway.metrics().to_json())
}

async fn users(State(state): State<AppState>) -> HandlerResult<UsersResponse> {
    Ok(Json(state.gateway.users().await?))
}

async fn check(State(state): State<AppState>, RawBody(body): RawBody) -> HandlerResult<CheckResponse> {
    Ok(Json(state.gateway.check(parse(&body)?).await?))
}

async fn check_address(State(state): State<AppState>, RawBody(body): RawBody) -> HandlerResult<CheckAddressResponse> {
    Ok(Json(state.gateway.check_address(parse(&body)?).await?))
}

async fn access_token(State(state): State<AppState>, RawBody(body): RawBody) -> HandlerResult<AccessTokenResponse> {
    Ok(Json(state.gateway.access_token(parse(&body)?).await?))
}

async fn register(State(state): State<AppState>, RawBody(body): RawBody) -> HandlerResult<RegisterResponse> {
    Ok(Json(state.gateway.register(parse(&body)?).await?))
}

async fn confirm(State(state): State<AppState>, RawBody(body): RawBody) -> HandlerResult<ConfirmResponse> {
    Ok(Json(state.gateway.confirm(parse(&body)?).await?))
}

async fn create(State(state): State<AppState>, RawBody(body): RawBody) -> HandlerResult<CreateResponse> {
    Ok(Json(state.gateway.create(parse(&body)?).await?))
}

async fn withdraw(State(state): State<AppState>, RawBody(body): RawBody) -> HandlerResult<WithdrawResponse> {
    Ok(Json(state.gateway.withdraw(parse(&body)?).await?))
}

async fn encode_support(State(state): State<AppState>, RawBody(body): RawBody) -> HandlerResult<EncodeSupportResponse> {
    Ok(Json(state.gateway.encode_support(parse(&body)?)))
}

async fn encode_deposit(State(state): State<AppState>, RawBody(body): RawBody) -> HandlerResult<EncodeDepositResponse> {
    Ok(Json(state.gateway.encode_deposit(parse(&body)?).await?))
}

async fn init(State(state): State<AppState>, RawBody(body): RawBody) -> HandlerResult<InitResponse> {
    Ok(Json(state.gateway.init(parse_or_default(&body)?).await?))
}

async fn support(State(state): State<AppState>, RawBody(body): RawBody) -> HandlerResult<SupportResponse> {
    Ok(Json(state.gateway.support(parse(&body)?).await?))
}

async fn deposit(State(state): State<AppState>, RawBody(body): RawBody) -> HandlerResult<DepositResponse> {
    Ok(Json(state.gateway.deposit(parse(&body)?).await?))
}
