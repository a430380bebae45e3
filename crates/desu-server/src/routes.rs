//! HTTP routes: `GET /info`, `POST /`, `GET /`, all under the configured prefix.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::error;

use desu_core::protocol::{ListQuery, MessageList, NewMessage, ServerInfo, SubmitReceipt};
use desu_core::record::DEFAULT_LIMIT;
use desu_core::traits::Relay;

use crate::relay::LocalRelay;

type AppState = Arc<LocalRelay>;

/// A failed store call, reported as a 500 with a JSON body.
struct ApiError(desu_core::Error);

impl From<desu_core::Error> for ApiError {
    fn from(err: desu_core::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "Request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

pub(crate) fn router(relay: AppState) -> Router {
    let prefix = relay.config().route_prefix();

    let mut router = Router::new()
        .route(&format!("{prefix}/info"), get(info))
        .route(&format!("{prefix}/"), get(list).post(submit));

    if !prefix.is_empty() {
        router = router.route(&prefix, get(list).post(submit));
    }

    router.layer(TraceLayer::new_for_http()).with_state(relay)
}

async fn info(State(relay): State<AppState>) -> Result<Json<ServerInfo>, ApiError> {
    Ok(Json(relay.info().await?))
}

async fn submit(
    State(relay): State<AppState>,
    Json(message): Json<NewMessage>,
) -> Result<Json<SubmitReceipt>, ApiError> {
    Ok(Json(relay.post(message).await?))
}

async fn list(
    State(relay): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<MessageList>, ApiError> {
    let query = list_query(&params);
    let messages = relay.list(&query).await?;
    Ok(Json(MessageList { messages }))
}

fn param<T: FromStr>(params: &HashMap<String, String>, key: &str) -> Option<T> {
    params.get(key).and_then(|v| v.trim().parse().ok())
}

/// Lenient query parsing: anything absent or unparseable falls back to its
/// default, and a zero limit means the default page size.
fn list_query(params: &HashMap<String, String>) -> ListQuery {
    ListQuery {
        min_time: param(params, "minTime").unwrap_or(0),
        offset: param(params, "offset").unwrap_or(0),
        limit: param(params, "limit")
            .filter(|limit: &usize| *limit > 0)
            .unwrap_or(DEFAULT_LIMIT),
    }
}
