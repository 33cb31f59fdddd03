// tests/queue_roundtrip.rs
//
// Publish → queue → worker must leave the store in the same state as a direct
// POST /parse for the same URL.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt as _;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use recipe_ingest::config::AppConfig;
use recipe_ingest::gateway::PublishGateway;
use recipe_ingest::ingest::fetcher::{FetcherConfig, HttpFeedFetcher};
use recipe_ingest::queue::{MemoryQueue, MessageQueue, SqliteQueue};
use recipe_ingest::store::{MemoryStore, RecipeStore, SqliteStore};
use recipe_ingest::worker::WorkerConfig;
use recipe_ingest::{connect_services, router, AppState, IngestWorker, Ingestor};

const RECIPES_XML: &str = include_str!("fixtures/recipes_atom.xml");

async fn feed_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/recipes/.rss"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RECIPES_XML))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/down.rss"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    server
}

fn state(store: Arc<dyn RecipeStore>, queue: Arc<dyn MessageQueue>) -> AppState {
    let fetcher = HttpFeedFetcher::new(FetcherConfig::default()).expect("http client");
    AppState {
        ingestor: Arc::new(Ingestor::new(Arc::new(fetcher), store)),
        gateway: PublishGateway::new(queue),
        assets_dir: "assets".into(),
    }
}

fn post(uri: &str, url: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({ "url": url }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn queued_ingest_matches_direct_ingest() {
    let server = feed_server().await;
    let feed_url = format!("{}/r/recipes/.rss", server.uri());

    // Direct path
    let direct_store = Arc::new(MemoryStore::new());
    let direct = router(state(direct_store.clone(), Arc::new(MemoryQueue::new("unused"))));
    let resp = direct.oneshot(post("/parse", &feed_url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Queued path
    let queued_store = Arc::new(MemoryStore::new());
    let queue = Arc::new(MemoryQueue::new("feeds"));
    let st = state(queued_store.clone(), queue.clone());
    let worker = IngestWorker::spawn(queue.clone(), st.ingestor.clone(), WorkerConfig::default());

    let resp = router(st).oneshot(post("/publish", &feed_url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    queue.close();
    let stats = tokio::time::timeout(Duration::from_secs(10), worker.join())
        .await
        .expect("worker drains and stops");

    assert_eq!(stats.received, 1);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.persisted, 3);
    assert_eq!(
        queued_store.list_recipes().await.unwrap(),
        direct_store.list_recipes().await.unwrap()
    );
}

#[tokio::test]
async fn queued_fetch_failure_is_logged_and_writes_nothing() {
    let server = feed_server().await;
    let store = Arc::new(MemoryStore::new());
    let queue = Arc::new(MemoryQueue::new("feeds"));
    let st = state(store.clone(), queue.clone());
    let worker = IngestWorker::spawn(queue.clone(), st.ingestor.clone(), WorkerConfig::default());

    let resp = router(st)
        .oneshot(post("/publish", &format!("{}/down.rss", server.uri())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK, "enqueue succeeds regardless of outcome");

    queue.close();
    let stats = worker.join().await;
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.succeeded, 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn sqlite_backends_round_trip_in_order() {
    let server = feed_server().await;
    let store = Arc::new(SqliteStore::connect("sqlite::memory:", "cookbook").await.unwrap());
    let queue = Arc::new(
        SqliteQueue::connect("sqlite::memory:", "feeds", Duration::from_millis(20))
            .await
            .unwrap(),
    );
    let st = state(store.clone(), queue.clone());
    let worker = IngestWorker::spawn(queue.clone(), st.ingestor.clone(), WorkerConfig { buffer: 1 });

    let app = router(st);
    let url = format!("{}/r/recipes/.rss", server.uri());
    for _ in 0..2 {
        let resp = app.clone().oneshot(post("/publish", &url)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    // Wait for both messages to be processed.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while worker.stats().succeeded < 2 {
        assert!(tokio::time::Instant::now() < deadline, "worker did not finish in time");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let stats = worker.shutdown().await;

    assert_eq!(stats.succeeded, 2);
    assert_eq!(queue.depth().await.unwrap(), 0);
    let docs = store.list_recipes().await.unwrap();
    assert_eq!(docs.len(), 6, "no deduplication across runs");
    assert_eq!(docs[0].title, docs[3].title);
}

#[tokio::test]
async fn connect_services_wires_memory_backends() {
    let cfg = AppConfig::from_lookup(|k| {
        let v = match k {
            "STORE_URI" => Some("memory:"),
            "STORE_DATABASE" => Some("cookbook"),
            "QUEUE_URI" => Some("memory:"),
            "QUEUE_NAME" => Some("feeds"),
            _ => None,
        };
        v.map(str::to_string)
    })
    .unwrap();

    let services = connect_services(&cfg).await.expect("memory backends connect");
    assert_eq!(services.queue.name(), "feeds");
    assert!(services.state.ingestor.store().list_recipes().await.unwrap().is_empty());
}

#[tokio::test]
async fn connect_services_fails_fast_on_unknown_backend() {
    let cfg = AppConfig::from_lookup(|k| {
        let v = match k {
            "STORE_URI" => Some("mongodb://localhost:27017"),
            "STORE_DATABASE" => Some("cookbook"),
            "QUEUE_URI" => Some("memory:"),
            "QUEUE_NAME" => Some("feeds"),
            _ => None,
        };
        v.map(str::to_string)
    })
    .unwrap();

    let err = connect_services(&cfg).await.err().expect("must fail");
    assert!(format!("{err:#}").contains("unsupported store uri scheme"));
}
