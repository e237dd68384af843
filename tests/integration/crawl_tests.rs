//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drive the real
//! HTTP fetcher through full crawl runs.

use spidy_map::config::{Config, CrawlerConfig, GraphFormat, OutputConfig};
use spidy_map::crawler::prepare_crawl;
use spidy_map::output::{export_graph, CrawlStatistics};
use spidy_map::UrlId;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling from the given seeds
fn create_test_config(seeds: Vec<String>, budget: usize, workers: usize) -> Config {
    Config {
        seeds,
        crawler: CrawlerConfig {
            budget,
            workers,
            request_timeout_secs: 1,
            ..CrawlerConfig::default()
        },
        ..Config::default()
    }
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

/// Mounts the three-page site used by several tests:
/// `/a` links to `/b` and `/c`, `/b` is an image, `/c` never answers in time
async fn mount_small_site(mock_server: &MockServer) {
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(format!(
            r#"<html><body>
            <a href="{base}/b">An image</a>
            <a href="{base}/c">A slow page</a>
            </body></html>"#,
            base = base_url
        )))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png"),
        )
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(
            html(format!("<a href=\"{}/d\">never seen</a>", base_url))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_end_to_end_link_graph() {
    let mock_server = MockServer::start().await;
    mount_small_site(&mock_server).await;

    let base_url = mock_server.uri();
    let a = format!("{}/a", base_url);
    let b = format!("{}/b", base_url);
    let c = format!("{}/c", base_url);

    let config = create_test_config(vec![a.clone()], 10, 2);
    let coordinator = prepare_crawl(&config).expect("Failed to build coordinator");
    let report = coordinator.run().await.expect("Crawl failed");

    let registry = coordinator.registry();
    assert_eq!(registry.len(), 3, "Should register a, b and c only");

    let record_a = registry.lookup(UrlId::of(&a)).expect("a is registered");
    assert!(record_a.crawled);
    assert!(record_a.parsable);
    assert_eq!(record_a.outbound.len(), 2);
    assert!(record_a.outbound.contains(&UrlId::of(&b)));
    assert!(record_a.outbound.contains(&UrlId::of(&c)));

    let record_b = registry.lookup(UrlId::of(&b)).expect("b is registered");
    assert!(record_b.crawled);
    assert!(!record_b.parsable, "Images are not parsed for links");

    let record_c = registry.lookup(UrlId::of(&c)).expect("c is registered");
    assert!(record_c.crawled);
    assert!(!record_c.parsable, "Timed out pages are unparsable");

    assert_eq!(report.units_completed, 3);
    assert_eq!(report.frontier_size, 0);
    assert!(!report.interrupted);
    assert!(!report.budget_exhausted);
}

#[tokio::test]
async fn test_budget_limits_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let links: String = (1..=6)
        .map(|i| format!("<a href=\"{}/p{}\">{}</a>\n", base_url, i, i))
        .collect();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(links))
        .mount(&mock_server)
        .await;

    // Every leaf links back to the root
    Mock::given(method("GET"))
        .respond_with(html(format!("<a href=\"{}/\">home</a>", base_url)))
        .mount(&mock_server)
        .await;

    let config = create_test_config(vec![format!("{}/", base_url)], 3, 4);
    let coordinator = prepare_crawl(&config).expect("Failed to build coordinator");
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.units_completed, 3);
    assert!(report.budget_exhausted);
    assert!(report.frontier_size > 0, "Undiscovered pages stay pending");

    let stats = CrawlStatistics::from_registry(&coordinator.registry());
    assert_eq!(stats.crawled, 3);
    assert_eq!(stats.total_urls, 7);
}

#[tokio::test]
async fn test_status_code_does_not_affect_parsing() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_raw(
                format!("<a href=\"{}/found\">try here</a>", base_url),
                "text/html",
            ),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/found"))
        .respond_with(html("<p>no links</p>".to_string()))
        .mount(&mock_server)
        .await;

    let missing = format!("{}/missing", base_url);
    let config = create_test_config(vec![missing.clone()], 10, 1);
    let coordinator = prepare_crawl(&config).expect("Failed to build coordinator");
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.units_completed, 2);
    let record = coordinator
        .registry()
        .lookup(UrlId::of(&missing))
        .expect("seed is registered");
    assert!(record.parsable);
    assert!(record
        .outbound
        .contains(&UrlId::of(&format!("{}/found", base_url))));
}

#[tokio::test]
async fn test_redirects_are_followed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/new", base_url).as_str()),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html(format!(
            "<a href=\"{}/leaf\">leaf</a>",
            base_url
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/leaf"))
        .respond_with(html(String::new()))
        .mount(&mock_server)
        .await;

    let old = format!("{}/old", base_url);
    let config = create_test_config(vec![old.clone()], 10, 2);
    let coordinator = prepare_crawl(&config).expect("Failed to build coordinator");
    coordinator.run().await.expect("Crawl failed");

    // Links found behind a redirect belong to the requested URL
    let registry = coordinator.registry();
    let record = registry.lookup(UrlId::of(&old)).expect("seed is registered");
    assert!(record
        .outbound
        .contains(&UrlId::of(&format!("{}/leaf", base_url))));
    assert!(registry.lookup(UrlId::of(&format!("{}/new", base_url))).is_none());
}

#[tokio::test]
async fn test_ftp_link_does_not_abort_crawl() {
    let mock_server = MockServer::start().await;
    let ftp = "ftp://files.example.org/pub/x.txt";

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!("<a href=\"{}\">download</a>", ftp)))
        .mount(&mock_server)
        .await;

    let seed = format!("{}/", mock_server.uri());
    let config = create_test_config(vec![seed.clone()], 10, 2);
    let coordinator = prepare_crawl(&config).expect("Failed to build coordinator");
    let report = coordinator
        .run()
        .await
        .expect("An ftp link must not end the run");

    assert_eq!(report.units_completed, 2);

    let registry = coordinator.registry();
    let record = registry.lookup(UrlId::of(ftp)).expect("ftp link is registered");
    assert!(record.crawled);
    assert!(!record.parsable);
    assert!(registry
        .lookup(UrlId::of(&seed))
        .expect("seed is registered")
        .outbound
        .contains(&UrlId::of(ftp)));
}

#[tokio::test]
async fn test_graph_export_after_crawl() {
    let mock_server = MockServer::start().await;
    mount_small_site(&mock_server).await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = create_test_config(vec![format!("{}/a", mock_server.uri())], 10, 3);
    config.output = OutputConfig {
        graph_dir: temp_dir.path().to_string_lossy().into_owned(),
        format: GraphFormat::Json,
        label_threshold: 1,
    };

    let coordinator = prepare_crawl(&config).expect("Failed to build coordinator");
    coordinator.run().await.expect("Crawl failed");

    let graph_path =
        export_graph(&coordinator.registry(), &config.output).expect("Failed to export graph");
    let content = std::fs::read_to_string(&graph_path).expect("Graph file exists");
    let graph: serde_json::Value = serde_json::from_str(&content).expect("Valid JSON");

    let nodes = graph["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(graph["edges"].as_array().unwrap().len(), 2);

    // Only `a` has more than one outbound link
    let labeled: Vec<_> = nodes.iter().filter(|n| n.get("label").is_some()).collect();
    assert_eq!(labeled.len(), 1);
    assert_eq!(
        labeled[0]["label"].as_str().unwrap(),
        format!("{}/a", mock_server.uri())
    );
}
