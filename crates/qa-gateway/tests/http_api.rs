//! End-to-end scenarios through the axum router with in-memory collaborators.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use qa_gateway::adapters::identity::JwtAccessTokenIssuer;
use qa_gateway::adapters::memory::{InMemoryChain, InMemoryFeed, StaticIdentityVerifier};
use qa_gateway::adapters::pending::InMemoryPendingStore;
use qa_gateway::domain::config::ContractsConfig;
use qa_gateway::domain::{CanonicalAddress, Network, Verb};
use qa_gateway::{build_router, Collaborators, Gateway, GatewayConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const ALICE_ADDR: &str = "qUbxboqjBRp96j3La8D1RYkyqx5uQbJPoW";
const ALICE_HEX: &str = "7926223070547d2d15b2ef5e7383e541c338ffe9";
const BOB_ADDR: &str = "qHfQ5uKcbWvJ4dhyfy1Vh4RRtETb2AA14v";

struct TestApp {
    chain: Arc<InMemoryChain>,
    feed: Arc<InMemoryFeed>,
    identities: Arc<StaticIdentityVerifier>,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("qa_gateway=debug")
            .with_test_writer()
            .try_init();

        let mut config = GatewayConfig::default();
        config.node.network = Network::Testnet;
        config.contracts = ContractsConfig {
            registry: CanonicalAddress::from_bytes([1; 20]),
            achievements: CanonicalAddress::from_bytes([2; 20]),
            rewards: CanonicalAddress::from_bytes([3; 20]),
        };
        config.http.max_body_size = 4096;
        config.confirmation.poll_interval = Duration::from_millis(5);
        config.confirmation.timeout = Duration::from_secs(5);

        let chain = Arc::new(InMemoryChain::new(Network::Testnet));
        let feed = Arc::new(InMemoryFeed::new());
        let identities = Arc::new(
            StaticIdentityVerifier::new()
                .with_user("alice", "alice-token", "Alice")
                .with_user("bob", "bob-token", "Bob"),
        );
        let collaborators = Collaborators {
            chain: chain.clone(),
            identities: identities.clone(),
            tokens: Arc::new(JwtAccessTokenIssuer::new("secret", "test", Duration::from_secs(60))),
            feed: feed.clone(),
            pending: Arc::new(InMemoryPendingStore::new()),
        };
        let gateway = Arc::new(Gateway::new(collaborators, &config));

        Self {
            router: build_router(gateway, &config),
            chain,
            feed,
            identities,
        }
    }

    fn seed_alice(&self) {
        self.chain
            .seed_user(CanonicalAddress::from_hex(ALICE_HEX).unwrap(), "alice", "Alice");
    }

    async fn send(&self, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map(Body::from).unwrap_or_else(Body::empty))
            .unwrap();
        self.dispatch(request).await
    }

    async fn post_bytes(&self, uri: &str, bytes: Vec<u8>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .header("content-length", bytes.len())
            .body(Body::from(bytes))
            .unwrap();
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body.to_string())).await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }
}

fn alice_register() -> Value {
    json!({"address": ALICE_ADDR, "user": "alice", "token": "alice-token"})
}

#[tokio::test]
async fn ping() {
    let app = TestApp::new();
    let (status, body) = app.get("/ping").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"pong": "pong"}));
}

#[tokio::test]
async fn register_not_an_address_touches_nothing() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/register",
            json!({"address": "not-an-address", "user": "alice", "token": "alice-token"}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_ADDRESS");
    assert_eq!(app.chain.stats().total(), 0);
    assert_eq!(app.identities.validations(), 0);
    assert!(app.feed.events().is_empty());
}

#[tokio::test]
async fn register_bad_token() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/register",
            json!({"address": ALICE_ADDR, "user": "alice", "token": "stolen"}),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_TOKEN");
    assert_eq!(app.chain.stats().calls(), 0);
}

#[tokio::test]
async fn double_register_is_pending_until_confirmed() {
    let app = TestApp::new();

    let (status, first) = app.post("/register", alice_register()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["hexAddress"], ALICE_HEX);
    assert_eq!(first["userProfileName"], "Alice");

    let (status, second) = app.post("/register", alice_register()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(second["error"], "REGISTRATION_PENDING");

    let (_, check) = app.post("/check", json!({"user": "alice"})).await;
    assert_eq!(check, json!({"exists": false, "pending": true}));

    app.chain.mine();
    let mut cleared = false;
    for _ in 0..200 {
        let (_, check) = app.post("/check", json!({"user": "alice"})).await;
        if check == json!({"exists": true}) {
            cleared = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(cleared, "pending flag was never cleared");

    let events = app.feed.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].verb, Verb::Register);
    assert_eq!(events[0].target.as_str(), first["txid"].as_str().unwrap());

    let (status, third) = app.post("/register", alice_register()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(third["error"], "USER_EXISTS");
}

#[tokio::test]
async fn create_verb_depends_on_previous_link() {
    let app = TestApp::new();
    app.seed_alice();

    let base = json!({
        "user": "alice", "token": "alice-token", "address": ALICE_ADDR,
        "link": "https://ach/2", "title": "Second"
    });
    let (status, created) = app.post("/create", base.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["previousLink"], "");
    assert!(created["contentHash"].as_str().unwrap().starts_with("0x"));

    let mut update = base;
    update["previousLink"] = json!("https://ach/1");
    let (status, updated) = app.post("/create", update).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["previousLink"], "https://ach/1");

    let verbs: Vec<_> = app.feed.events().iter().map(|e| e.verb).collect();
    assert_eq!(verbs, vec![Verb::Create, Verb::Update]);
}

#[tokio::test]
async fn confirm_by_non_owner_is_forbidden() {
    let app = TestApp::new();
    app.seed_alice();

    let (status, body) = app
        .post(
            "/confirm",
            json!({"address": BOB_ADDR, "user": "alice", "token": "alice-token", "link": "l"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "INVALID_ADDRESS_OWNER");
    assert!(app.chain.submissions().is_empty());
}

#[tokio::test]
async fn init_twice_reports_initialized_address() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::POST, "/init", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rewardsAddress"], "0303030303030303030303030303030303030303");

    let (status, body) = app.post("/init", json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ALREADY_INITIALIZED");
    assert_eq!(body["initializedAddress"], "0303030303030303030303030303030303030303");
    assert_eq!(app.chain.submissions().len(), 1);
}

#[tokio::test]
async fn unknown_fields_are_rejected() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/check", json!({"user": "alice", "admin": true}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_REQUEST");

    let (status, body) = app.send(Method::POST, "/check", Some("{".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_REQUEST");
}

#[tokio::test]
async fn oversized_body_rejected() {
    let app = TestApp::new();
    let huge = "x".repeat(8192);
    let (status, body) = app.post("/check", json!({"user": huge.clone()})).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "PAYLOAD_TOO_LARGE");

    let declared = json!({"user": huge}).to_string().into_bytes();
    let (status, body) = app.post_bytes("/register", declared).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "PAYLOAD_TOO_LARGE");
    assert_eq!(app.identities.validations(), 0);
}

#[tokio::test]
async fn non_utf8_body_is_invalid_request() {
    let app = TestApp::new();
    let (status, body) = app.post_bytes("/check", b"{\xff\xfe}".to_vec()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_REQUEST");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn users_and_address_check() {
    let app = TestApp::new();
    app.seed_alice();

    let (status, body) = app.get("/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"usersList": [{"userAddress": ALICE_ADDR, "userAccount": "alice", "userName": "Alice"}]})
    );

    let (_, body) = app
        .post("/check-qtum-address", json!({"user": "alice", "walletAddress": ALICE_ADDR}))
        .await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["address"], ALICE_HEX);
}

#[tokio::test]
async fn feed_failure_after_submission_is_reported() {
    let app = TestApp::new();
    app.seed_alice();
    app.feed.set_failing(true);

    let (status, body) = app
        .post(
            "/confirm",
            json!({"address": ALICE_ADDR, "user": "alice", "token": "alice-token", "link": "l"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "FEED_ERROR");
    assert_eq!(app.chain.submissions().len(), 1);
}

#[tokio::test]
async fn metrics_and_request_id() {
    let app = TestApp::new();
    app.get("/ping").await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let metrics: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(metrics["requests"]["total"].as_u64().unwrap() >= 1);
}
