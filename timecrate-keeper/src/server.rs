//! HTTP surface of a keeper process.

use crate::error::KeeperError;
use crate::keeper::{Keeper, ShareDecision};
use crate::protocol::{
    ErrorResponse, HealthResponse, ShareRequest, ShareResponse, StoreShareRequest,
    StoreShareResponse,
};
use crate::store::StoreOutcome;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::future::Future;
use std::sync::Arc;
use timecrate_types::CrateId;
use tokio::net::TcpListener;
use tracing::error;

fn err_json(status: StatusCode, msg: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: msg.to_string(),
        }),
    )
        .into_response()
}

/// Builds the keeper's router.
pub fn router(keeper: Arc<Keeper>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/shares", post(store_share))
        .route("/shares/{crate_id}/request", post(request_share))
        .with_state(keeper)
}

/// Serves the keeper until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    keeper: Arc<Keeper>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(keeper))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health(State(keeper): State<Arc<Keeper>>) -> Response {
    match keeper.share_count().await {
        Ok(shares) => Json(HealthResponse {
            status: "ok".to_string(),
            keeper: keeper.id().to_string(),
            shares,
        })
        .into_response(),
        Err(e) => {
            error!("health check failed: {e}");
            err_json(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

async fn store_share(
    State(keeper): State<Arc<Keeper>>,
    Json(req): Json<StoreShareRequest>,
) -> Response {
    match keeper.store_share(req.crate_id, req.share).await {
        Ok(outcome) => {
            let status = match outcome {
                StoreOutcome::Stored => StatusCode::CREATED,
                StoreOutcome::Unchanged => StatusCode::OK,
            };
            (status, Json(StoreShareResponse { outcome })).into_response()
        }
        Err(e @ KeeperError::AlreadyStored(_)) => err_json(StatusCode::CONFLICT, e),
        Err(e @ KeeperError::EmptyShare) => err_json(StatusCode::BAD_REQUEST, e),
        Err(e) => err_json(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

async fn request_share(
    State(keeper): State<Arc<Keeper>>,
    Path(crate_id): Path<CrateId>,
    Json(req): Json<ShareRequest>,
) -> Response {
    match keeper
        .request_share(crate_id, &req.requester, &req.crate_ref)
        .await
    {
        Ok(ShareDecision::Granted(share)) => {
            (StatusCode::OK, Json(ShareResponse::Granted { share })).into_response()
        }
        Ok(ShareDecision::Denied(reason)) => {
            (StatusCode::FORBIDDEN, Json(ShareResponse::Denied { reason })).into_response()
        }
        Err(KeeperError::AuthorityUnavailable(_)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ShareResponse::AuthorityUnavailable),
        )
            .into_response(),
        Err(e) => err_json(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}
