use std::time::Duration;
use timecrate_keeper::{Authority, AuthorityError, HttpAuthority};
use timecrate_types::{CrateId, CrateRef, Identity};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn setup(server: &MockServer) -> HttpAuthority {
    HttpAuthority::new(&server.uri(), Duration::from_millis(500)).unwrap()
}

fn crate_ref() -> CrateRef {
    CrateRef::new(CrateId::new(), "42")
}

// --- Ownership ---

#[tokio::test]
async fn owner_query_passes_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/crates/42/owner"))
        .and(query_param("identity", "0xA11CE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"is_owner": true})))
        .mount(&server)
        .await;

    let authority = setup(&server);
    let owner = authority
        .is_current_owner(&crate_ref(), &Identity::new("0xA11CE"))
        .await
        .unwrap();
    assert!(owner);
}

#[tokio::test]
async fn non_owner_is_false() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/crates/42/owner"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"is_owner": false})))
        .mount(&server)
        .await;

    let authority = setup(&server);
    let owner = authority
        .is_current_owner(&crate_ref(), &Identity::new("0xB0B"))
        .await
        .unwrap();
    assert!(!owner);
}

// --- Readiness ---

#[tokio::test]
async fn ready_flag_is_read() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/crates/42/ready"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ready": false})))
        .mount(&server)
        .await;

    let authority = setup(&server);
    assert!(!authority.is_release_ready(&crate_ref()).await.unwrap());
}

#[tokio::test]
async fn every_call_reaches_the_authority() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/crates/42/ready"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ready": true})))
        .expect(3)
        .mount(&server)
        .await;

    let authority = setup(&server);
    let r = crate_ref();
    for _ in 0..3 {
        assert!(authority.is_release_ready(&r).await.unwrap());
    }
}

// --- Failures ---

#[tokio::test]
async fn not_found_is_unknown_crate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let authority = setup(&server);
    assert_eq!(
        authority.is_release_ready(&crate_ref()).await.unwrap_err(),
        AuthorityError::UnknownCrate
    );
}

#[tokio::test]
async fn server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let authority = setup(&server);
    let err = authority
        .is_current_owner(&crate_ref(), &Identity::new("0xA11CE"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthorityError::Unavailable(_)));
}

#[tokio::test]
async fn malformed_body_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let authority = setup(&server);
    assert!(matches!(
        authority.is_release_ready(&crate_ref()).await,
        Err(AuthorityError::Unavailable(_))
    ));
}

#[tokio::test]
async fn slow_authority_times_out_as_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"ready": true}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let authority = setup(&server);
    assert!(matches!(
        authority.is_release_ready(&crate_ref()).await,
        Err(AuthorityError::Unavailable(_))
    ));
}

#[tokio::test]
async fn unreachable_authority_is_unavailable() {
    let authority = HttpAuthority::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
    assert!(matches!(
        authority.is_release_ready(&crate_ref()).await,
        Err(AuthorityError::Unavailable(_))
    ));
}

#[tokio::test]
async fn token_id_is_path_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/crates/a%2Fb/ready"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ready": true})))
        .mount(&server)
        .await;

    let authority = setup(&server);
    let r = CrateRef::new(CrateId::new(), "a/b");
    assert!(authority.is_release_ready(&r).await.unwrap());
}
