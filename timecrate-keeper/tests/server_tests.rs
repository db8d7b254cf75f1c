mod support;

use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::json;
use support::*;
use timecrate_keeper::protocol::{HealthResponse, ShareResponse, StoreShareResponse};
use timecrate_keeper::StoreOutcome;
use timecrate_types::{CrateId, DenialReason};

async fn post(url: String, body: serde_json::Value) -> reqwest::Response {
    reqwest::Client::new().post(url).json(&body).send().await.unwrap()
}

#[tokio::test]
async fn health_reports_share_count() {
    let (keeper, _) = keeper();
    keeper.store_share(CrateId::new(), SHARE.into()).await.unwrap();
    let running = spawn_keeper(keeper).await;

    let resp = reqwest::get(format!("{}/health", running.base_url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = resp.json().await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.keeper, "test-keeper");
    assert_eq!(health.shares, 1);
}

#[tokio::test]
async fn store_status_codes() {
    let (keeper, _) = keeper();
    let running = spawn_keeper(keeper).await;
    let url = format!("{}/shares", running.base_url);
    let id = CrateId::new();

    let resp = post(url.clone(), json!({"crate_id": id, "share": SHARE})).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: StoreShareResponse = resp.json().await.unwrap();
    assert_eq!(body.outcome, StoreOutcome::Stored);

    let resp = post(url.clone(), json!({"crate_id": id, "share": SHARE})).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: StoreShareResponse = resp.json().await.unwrap();
    assert_eq!(body.outcome, StoreOutcome::Unchanged);

    let resp = post(url.clone(), json!({"crate_id": id, "share": "0309abcd"})).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = post(url, json!({"crate_id": CrateId::new(), "share": ""})).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn request_is_granted_only_when_ready() {
    let (keeper, authority) = keeper();
    let id = CrateId::new();
    keeper.store_share(id, SHARE.into()).await.unwrap();
    register(&authority, &id, false);
    let running = spawn_keeper(keeper).await;

    let url = format!("{}/shares/{id}/request", running.base_url);
    let body = json!({"requester": OWNER, "crate_ref": crate_ref(id)});

    let resp = post(url.clone(), body.clone()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        resp.json::<ShareResponse>().await.unwrap(),
        ShareResponse::Denied {
            reason: DenialReason::NotReady
        }
    );

    authority.set_ready(&token_for(&id), true);

    let resp = post(url, body).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.json::<ShareResponse>().await.unwrap(),
        ShareResponse::Granted {
            share: SHARE.to_string()
        }
    );
}

#[tokio::test]
async fn non_owner_is_forbidden() {
    let (keeper, authority) = keeper();
    let id = CrateId::new();
    keeper.store_share(id, SHARE.into()).await.unwrap();
    register(&authority, &id, true);
    let running = spawn_keeper(keeper).await;

    let resp = post(
        format!("{}/shares/{id}/request", running.base_url),
        json!({"requester": STRANGER, "crate_ref": crate_ref(id)}),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        resp.json::<ShareResponse>().await.unwrap(),
        ShareResponse::Denied {
            reason: DenialReason::NotOwner
        }
    );
}

#[tokio::test]
async fn authority_outage_is_service_unavailable() {
    let (keeper, authority) = keeper();
    let id = CrateId::new();
    keeper.store_share(id, SHARE.into()).await.unwrap();
    register(&authority, &id, true);
    authority.set_unavailable(true);
    let running = spawn_keeper(keeper).await;

    let resp = post(
        format!("{}/shares/{id}/request", running.base_url),
        json!({"requester": OWNER, "crate_ref": crate_ref(id)}),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        resp.json::<ShareResponse>().await.unwrap(),
        ShareResponse::AuthorityUnavailable
    );
}

#[tokio::test]
async fn malformed_crate_id_is_rejected() {
    let (keeper, _) = keeper();
    let running = spawn_keeper(keeper).await;

    let resp = post(
        format!("{}/shares/not-a-uuid/request", running.base_url),
        json!({"requester": OWNER, "crate_ref": crate_ref(CrateId::new())}),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
