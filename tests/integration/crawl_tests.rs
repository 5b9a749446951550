//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end against temporary data directories.

use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::sync::watch;
use ui_harvest::config::{
    Config, CrawlerConfig, ExtractionConfig, OutputConfig, SiteConfig, UserAgentConfig,
};
use ui_harvest::crawler::{build_http_client, Coordinator, CrawlReport, FetchScheduler};
use ui_harvest::storage::{open_storage, CrawlSnapshot, RecordLog, SnapshotStore, Storage};
use ui_harvest::{ComponentRecord, HarvestError, RunPhase};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_AGENT: &str = "TestBot/1.0.0 (+https://example.com/contact; test@example.com)";

/// Creates a test configuration crawling the mock server
fn create_test_config(base_url: &str, data_dir: &Path, max_pages: usize) -> Config {
    let host = url::Url::parse(base_url)
        .expect("Failed to parse base URL")
        .host_str()
        .expect("Failed to extract host")
        .to_string();

    Config {
        crawler: CrawlerConfig {
            max_pages,
            concurrency: 2,
            rate_limit_seconds: 0.0,
            request_timeout_seconds: 5.0,
            checkpoint_interval: 10,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        site: SiteConfig {
            allowed_host: host,
            seeds: vec![format!("{}/", base_url)],
        },
        output: OutputConfig {
            data_dir: data_dir.to_string_lossy().to_string(),
        },
        extraction: ExtractionConfig::default(),
    }
}

/// An HTML 200 response
fn page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(page(body))
        .mount(server)
        .await;
}

async fn crawl(config: Config) -> CrawlReport {
    let mut coordinator = Coordinator::new(config, false).expect("Failed to create coordinator");
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    coordinator.run(shutdown_rx).await.expect("Crawl failed")
}

fn snapshot(config: &Config) -> CrawlSnapshot {
    open_storage(&config.output)
        .expect("Failed to open storage")
        .load_snapshot()
        .expect("Failed to load snapshot")
        .expect("No snapshot written")
}

fn records(config: &Config) -> Vec<ComponentRecord> {
    open_storage(&config.output)
        .expect("Failed to open storage")
        .read_records()
        .expect("Failed to read records")
}

#[tokio::test]
async fn test_end_to_end_budget_of_two() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let data_dir = TempDir::new().unwrap();

    // No robots.txt: the 404 leaves everything allowed

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(page(
            r#"<html><head><title>Home</title></head><body>
            <h1>Welcome</h1>
            <button>Claim</button>
            <a href="/events">Events</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(page(
            r#"<html><head><title>Events</title></head><body>
            <h2>Upcoming Events</h2>
            <button>RSVP</button>
            <a href="https://elsewhere.example/">Elsewhere</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, data_dir.path(), 2);
    let report = crawl(config.clone()).await;

    assert_eq!(report.saved, 2);
    assert_eq!(report.frontier, 0);
    assert!(!report.interrupted);

    // Two raw documents
    let storage = open_storage(&config.output).unwrap();
    assert_eq!(storage.count_raw_documents().unwrap(), 2);

    // Two records, in fetch order
    let records = records(&config);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].headings, vec!["Welcome"]);
    assert_eq!(records[0].buttons, vec!["Claim"]);
    assert_eq!(records[1].url, format!("{}/events", base_url));
    assert_eq!(records[1].headings, vec!["Upcoming Events"]);
    assert_eq!(records[1].buttons, vec!["RSVP"]);
    assert_eq!(records[1].links, vec!["Elsewhere"]);

    // Frontier empty, visited holds both canonical URLs
    let snapshot = snapshot(&config);
    assert!(snapshot.frontier.is_empty());
    assert_eq!(
        snapshot.visited,
        vec![format!("{}/", base_url), format!("{}/events", base_url)]
    );
}

#[tokio::test]
async fn test_budget_is_never_exceeded() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let data_dir = TempDir::new().unwrap();

    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/p{}">p{}</a>"#, i, i))
        .collect();
    mount_page(&mock_server, "/", &links).await;
    for i in 0..10 {
        mount_page(&mock_server, &format!("/p{}", i), "<p>leaf</p>").await;
    }

    let config = create_test_config(&base_url, data_dir.path(), 4);
    let report = crawl(config.clone()).await;

    assert_eq!(report.saved, 4);
    assert_eq!(records(&config).len(), 4);
    assert_eq!(report.frontier, 7);
}

#[tokio::test]
async fn test_shared_links_are_fetched_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let data_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(page(r#"<a href="/a">A</a><a href="/b">B</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Both pages link to /c, to each other and back home
    for route in ["/a", "/b"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(page(
                r#"<a href="/c">C</a><a href="/c/">C again</a><a href="/">Home</a><a href="/a#x">A</a><a href="/b?ref=1">B</a>"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(page("<p>shared</p>").set_delay(Duration::from_millis(50)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, data_dir.path(), 50);
    let report = crawl(config.clone()).await;

    assert_eq!(report.saved, 4);
    assert_eq!(report.visited, 4);
    assert_eq!(report.frontier, 0);
    // Wiremock verifies every expect(1) when the server drops
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let data_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /private\n\nUser-agent: other\nDisallow: /"),
        )
        .mount(&mock_server)
        .await;

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/private/x">Private</a><a href="/public">Public</a>"#,
    )
    .await;
    mount_page(&mock_server, "/public", "<h1>Public</h1>").await;

    Mock::given(method("GET"))
        .and(path("/private/x"))
        .respond_with(page("<h1>Secret</h1>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, data_dir.path(), 10);
    let report = crawl(config.clone()).await;

    assert_eq!(report.saved, 2);
    assert_eq!(report.robots_skipped, 1);

    // Disallowed URLs are consumed so they are not retried on resume
    let snapshot = snapshot(&config);
    assert!(snapshot.visited.contains(&format!("{}/private/x", base_url)));
}

#[tokio::test]
async fn test_failures_are_consumed_without_retry() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let data_dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/data.json">Data</a><a href="/broken">Broken</a><a href="/gone">Gone</a>"#,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, data_dir.path(), 10);
    let report = crawl(config.clone()).await;

    assert_eq!(report.saved, 1);
    assert_eq!(report.failed, 3);
    assert_eq!(report.visited, 4);
    assert_eq!(records(&config).len(), 1);

    // A second run finds nothing left to do
    let report = crawl(config.clone()).await;
    assert_eq!(report.saved, 0);
    assert_eq!(report.failed, 0);
}

#[tokio::test]
async fn test_resume_after_checkpoint() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let data_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(page(r#"<a href="/a">A</a><a href="/b">B</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;
    for route in ["/a", "/b"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(page(r#"<h1>Leaf</h1><a href="/">Home</a>"#))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    // First run stops at the budget with /a and /b pending
    let config = create_test_config(&base_url, data_dir.path(), 1);
    let report = crawl(config.clone()).await;
    assert_eq!(report.saved, 1);

    let saved = snapshot(&config);
    assert_eq!(
        saved.frontier,
        vec![format!("{}/a", base_url), format!("{}/b", base_url)]
    );
    assert_eq!(saved.visited, vec![format!("{}/", base_url)]);

    // Second run continues from the snapshot only
    let config = create_test_config(&base_url, data_dir.path(), 10);
    let report = crawl(config.clone()).await;
    assert_eq!(report.saved, 2);
    assert_eq!(report.frontier, 0);

    // /a and /b complete in either order
    let mut urls: Vec<String> = records(&config).into_iter().map(|r| r.url).collect();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            format!("{}/", base_url),
            format!("{}/a", base_url),
            format!("{}/b", base_url),
        ]
    );
}

#[tokio::test]
async fn test_interrupt_finishes_in_flight_and_checkpoints() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let data_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            page(r#"<a href="/a">A</a><a href="/b">B</a>"#)
                .set_delay(Duration::from_millis(400)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    for route in ["/a", "/b"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(page("<p>never</p>"))
            .expect(0)
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(&base_url, data_dir.path(), 10);
    let mut coordinator = Coordinator::new(config.clone(), false).unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let interrupt = async {
        tokio::time::sleep(Duration::from_millis(150)).await;
        shutdown_tx.send(true).unwrap();
    };
    let (report, ()) = tokio::join!(coordinator.run(shutdown_rx), interrupt);
    let report = report.unwrap();

    assert!(report.interrupted);
    assert_eq!(report.saved, 1);
    assert_eq!(report.frontier, 2);

    let saved = snapshot(&config);
    assert_eq!(saved.visited, vec![format!("{}/", base_url)]);
    assert_eq!(
        saved.frontier,
        vec![format!("{}/a", base_url), format!("{}/b", base_url)]
    );
}

#[tokio::test]
async fn test_redirect_final_url_is_stored() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let data_dir = TempDir::new().unwrap();

    mount_page(&mock_server, "/", r#"<a href="/old">Old</a>"#).await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("Location", format!("{}/new/", base_url).as_str()),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new/"))
        .respond_with(page("<h1>New home</h1>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, data_dir.path(), 10);
    let report = crawl(config.clone()).await;

    assert_eq!(report.saved, 2);
    let records = records(&config);
    assert_eq!(records[1].url, format!("{}/new", base_url));

    let saved = snapshot(&config);
    assert!(saved.visited.contains(&format!("{}/old", base_url)));
    assert!(saved.visited.contains(&format!("{}/new", base_url)));
}

#[tokio::test]
async fn test_rate_limit_spacing_is_honored() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(page("<p>ok</p>"))
        .expect(4)
        .mount(&mock_server)
        .await;

    let ua = UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    };
    let client = build_http_client(&ua, Duration::from_secs(5)).unwrap();

    let delay = Duration::from_millis(200);
    let concurrency = 2;
    let scheduler = FetchScheduler::new(client, concurrency, delay);
    let url = url::Url::parse(&format!("{}/", mock_server.uri())).unwrap();

    let start = Instant::now();
    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..(2 * concurrency) {
        let scheduler = scheduler.clone();
        let url = url.clone();
        tasks.spawn(async move { scheduler.fetch(url).await });
    }

    let mut successes = 0;
    while let Some(joined) = tasks.join_next().await {
        if joined.unwrap().result.is_success() {
            successes += 1;
        }
    }

    // Two rounds of K slots, each round waiting at least one delay
    assert!(start.elapsed() >= delay * 2);
    assert_eq!(successes, 4);
}

#[tokio::test]
async fn test_fresh_start_ignores_saved_state() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let data_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(page("<h1>Home</h1>"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, data_dir.path(), 10);
    crawl(config.clone()).await;

    let mut coordinator = Coordinator::new(config.clone(), true).unwrap();
    let (_tx, rx) = watch::channel(false);
    let report = coordinator.run(rx).await.unwrap();

    assert_eq!(report.saved, 1);
    // The record log is append-only across runs
    assert_eq!(records(&config).len(), 2);
}

#[tokio::test]
async fn test_checkpoint_interval_persists_state_mid_run() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let data_dir = TempDir::new().unwrap();

    mount_page(&mock_server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(page("<h1>Slow</h1>").set_delay(Duration::from_millis(600)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(page("<p>never</p>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url, data_dir.path(), 10);
    config.crawler.concurrency = 1;
    config.crawler.checkpoint_interval = 1;
    let snapshots = SnapshotStore::new(config.output.state_dir());

    let mut coordinator = Coordinator::new(config.clone(), false).unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // While /a is still in flight, its dispatch has already been checkpointed
    let observe = async {
        tokio::time::sleep(Duration::from_millis(250)).await;
        let mid_run = snapshots.load().unwrap();
        shutdown_tx.send(true).unwrap();
        mid_run
    };
    let (report, mid_run) = tokio::join!(coordinator.run(shutdown_rx), observe);
    let report = report.unwrap();

    let mid_run = mid_run.expect("No checkpoint written during the run");
    assert_eq!(
        mid_run.visited,
        vec![format!("{}/", base_url), format!("{}/a", base_url)]
    );
    assert_eq!(mid_run.frontier, vec![format!("{}/b", base_url)]);

    assert!(report.interrupted);
    assert_eq!(report.saved, 2);
    assert_eq!(snapshot(&config), mid_run);
}

#[tokio::test]
async fn test_storage_failure_stops_the_run() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let data_dir = TempDir::new().unwrap();

    mount_page(&mock_server, "/", r#"<h1>Home</h1><a href="/a">A</a>"#).await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(page("<p>never</p>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, data_dir.path(), 10);
    let mut coordinator = Coordinator::new(config.clone(), false).unwrap();

    // Replace the raw document directory with a plain file
    let html_dir = config.output.html_dir();
    std::fs::remove_dir_all(&html_dir).unwrap();
    std::fs::write(&html_dir, b"not a directory").unwrap();

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let err = coordinator.run(shutdown_rx).await.unwrap_err();

    match err {
        HarvestError::Storage(e) => assert!(
            e.path().starts_with(&html_dir),
            "error names {}",
            e.path().display()
        ),
        other => panic!("expected a storage error, got {}", other),
    }
    assert_eq!(coordinator.phase(), RunPhase::Stopped);

    // No checkpoint follows a fatal error
    let state_dir = config.output.state_dir();
    assert!(!state_dir.join("visited.json").exists());
    assert!(!state_dir.join("frontier.json").exists());
    let log = RecordLog::new(&config.output.extracts_dir());
    assert!(log.read_all().unwrap().is_empty());
}

#[tokio::test]
async fn test_request_timeout_consumes_url() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let data_dir = TempDir::new().unwrap();

    mount_page(&mock_server, "/", r#"<a href="/slow">Slow</a>"#).await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(page("<h1>Too late</h1>").set_delay(Duration::from_secs(2)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url, data_dir.path(), 10);
    config.crawler.request_timeout_seconds = 0.5;

    let report = crawl(config.clone()).await;

    assert_eq!(report.saved, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.frontier, 0);
    assert_eq!(records(&config).len(), 1);

    let saved = snapshot(&config);
    assert!(saved.visited.contains(&format!("{}/slow", base_url)));
}
