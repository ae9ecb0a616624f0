//! Integration tests for the crawler
//!
//! Graph properties are checked against in-memory fetchers; the HTTP fetcher
//! is exercised end-to-end against wiremock servers.

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use sumi_fanout::config::{parse_config, UserAgentConfig};
use sumi_fanout::crawler::{
    build_fetcher, crawl, CountingFetcher, FetchedPage, Fetcher, HttpFetcher, ResultItem,
    StaticFetcher,
};
use sumi_fanout::{FetchError, FetchResult};
use tokio::sync::Barrier;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn graph(edges: Vec<(String, Vec<String>)>) -> StaticFetcher {
    edges
        .into_iter()
        .map(|(id, links)| {
            let content = format!("content of {}", id);
            (id, FetchedPage::new(content, links))
        })
        .collect()
}

fn id_set(items: &[ResultItem]) -> HashSet<String> {
    items.iter().map(|i| i.id.clone()).collect()
}

fn assert_no_repeats(items: &[ResultItem]) {
    let unique = id_set(items);
    assert_eq!(
        unique.len(),
        items.len(),
        "an identifier was emitted more than once: {:?}",
        items.iter().map(|i| &i.id).collect::<Vec<_>>()
    );
}

/// Every node links to every node, itself included
fn complete_graph(n: usize) -> StaticFetcher {
    let ids: Vec<String> = (0..n).map(|i| format!("n{}", i)).collect();
    graph(ids.iter().map(|id| (id.clone(), ids.clone())).collect())
}

#[tokio::test]
async fn test_complete_graph_fetches_each_node_once() {
    let counting = Arc::new(CountingFetcher::new(Arc::new(complete_graph(12))));

    let (items, report) = crawl("n0", 4, counting.clone()).collect_all().await;

    assert_eq!(items.len(), 12);
    assert_no_repeats(&items);
    assert_eq!(counting.max_calls_per_id(), 1);
    assert_eq!(counting.total_calls(), 12);
    assert_eq!(report.fetched, 12);
    assert_eq!(report.visited, 12);
    assert!(report.duplicates > 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_complete_graph_on_multi_thread_runtime() {
    for _ in 0..20 {
        let counting = Arc::new(CountingFetcher::new(Arc::new(complete_graph(8))));
        let (items, _) = crawl("n0", 3, counting.clone()).collect_all().await;

        assert_eq!(items.len(), 8);
        assert_no_repeats(&items);
        assert_eq!(counting.max_calls_per_id(), 1);
    }
}

#[tokio::test]
async fn test_long_cycle_terminates() {
    let n = 50;
    let edges = (0..n)
        .map(|i| (format!("c{}", i), vec![format!("c{}", (i + 1) % n)]))
        .collect();

    let (items, report) = crawl("c0", 64, Arc::new(graph(edges))).collect_all().await;

    assert_eq!(items.len(), n);
    assert_no_repeats(&items);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.depth_exhausted, 0);
}

#[tokio::test]
async fn test_depth_bound_on_chain() {
    let edges = (0..10)
        .map(|i| (format!("s{}", i), vec![format!("s{}", i + 1)]))
        .collect();

    let (items, report) = crawl("s0", 4, Arc::new(graph(edges))).collect_all().await;

    let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["s0", "s1", "s2", "s3"]);
    assert!(items.iter().all(|i| i.depth < 4));
    assert_eq!(report.depth_exhausted, 1);
}

#[tokio::test]
async fn test_failure_is_isolated_to_its_subtree() {
    // "bad" is missing, so "behind-bad" is unreachable; "ok" and its child are not
    let fetcher = graph(vec![
        ("root".into(), vec!["bad".into(), "ok".into()]),
        ("ok".into(), vec!["ok-child".into()]),
        ("ok-child".into(), vec![]),
        ("behind-bad".into(), vec![]),
    ]);

    let (items, report) = crawl("root", 5, Arc::new(fetcher)).collect_all().await;

    let expected: HashSet<String> = ["root", "ok", "ok-child"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(id_set(&items), expected);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].error, FetchError::NotFound("bad".to_string()));
}

#[tokio::test]
async fn test_items_from_one_child_keep_their_order() {
    let fetcher = graph(vec![
        ("root".into(), vec!["a1".into(), "b1".into()]),
        ("a1".into(), vec!["a2".into()]),
        ("a2".into(), vec!["a3".into()]),
        ("a3".into(), vec![]),
        ("b1".into(), vec!["b2".into()]),
        ("b2".into(), vec![]),
    ]);

    let (items, _) = crawl("root", 5, Arc::new(fetcher)).collect_all().await;
    let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    let position = |id: &str| ids.iter().position(|x| *x == id).unwrap();

    assert_eq!(ids[0], "root");
    assert!(position("a1") < position("a2"));
    assert!(position("a2") < position("a3"));
    assert!(position("b1") < position("b2"));
}

/// Holds every fetch of a listed identifier until all of them have arrived
struct RendezvousFetcher {
    inner: StaticFetcher,
    gated: HashSet<String>,
    barrier: Barrier,
}

#[async_trait]
impl Fetcher for RendezvousFetcher {
    async fn fetch(&self, id: &str) -> FetchResult<FetchedPage> {
        if self.gated.contains(id) {
            self.barrier.wait().await;
        }
        self.inner.fetch(id).await
    }
}

#[tokio::test]
async fn test_siblings_are_fetched_concurrently() {
    // If siblings were fetched one at a time the barrier would never open
    let siblings: Vec<String> = (0..5).map(|i| format!("sib{}", i)).collect();
    let mut edges = vec![("root".to_string(), siblings.clone())];
    edges.extend(siblings.iter().map(|s| (s.clone(), vec![])));

    let fetcher = Arc::new(RendezvousFetcher {
        inner: graph(edges),
        gated: siblings.iter().cloned().collect(),
        barrier: Barrier::new(siblings.len()),
    });

    let (items, _) = tokio::time::timeout(
        Duration::from_secs(5),
        crawl("root", 2, fetcher).collect_all(),
    )
    .await
    .expect("siblings were not fetched concurrently");

    assert_eq!(items.len(), 6);
}

/// Fetcher whose latency varies per identifier, to shuffle completion order
struct SlowFetcher {
    inner: StaticFetcher,
    delays: HashMap<String, u64>,
}

#[async_trait]
impl Fetcher for SlowFetcher {
    async fn fetch(&self, id: &str) -> FetchResult<FetchedPage> {
        if let Some(ms) = self.delays.get(id) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        self.inner.fetch(id).await
    }
}

#[tokio::test]
async fn test_stream_waits_for_slow_descendants() {
    let fetcher = SlowFetcher {
        inner: graph(vec![
            ("root".into(), vec!["fast".into(), "slow".into()]),
            ("fast".into(), vec![]),
            ("slow".into(), vec!["slow-child".into()]),
            ("slow-child".into(), vec![]),
        ]),
        delays: [("slow".to_string(), 50), ("slow-child".to_string(), 50)]
            .into_iter()
            .collect(),
    };

    let mut stream = crawl("root", 3, Arc::new(fetcher));
    let mut ids = Vec::new();
    while let Some(item) = stream.next().await {
        ids.push(item.id);
    }

    assert_eq!(ids.len(), 4);
    assert_eq!(ids.last().map(String::as_str), Some("slow-child"));
    assert_eq!(stream.report().fetched, 4);
}

#[tokio::test]
async fn test_dropped_stream_stops_the_crawl() {
    let edges: Vec<(String, Vec<String>)> = (0..20)
        .map(|i| (format!("s{}", i), vec![format!("s{}", i + 1)]))
        .collect();
    let delays = edges.iter().map(|(id, _)| (id.clone(), 20)).collect();
    let counting = Arc::new(CountingFetcher::new(Arc::new(SlowFetcher {
        inner: graph(edges),
        delays,
    })));

    let mut stream = crawl("s0", 20, counting.clone());
    let first = stream.next().await.map(|item| item.id);
    drop(stream);
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(first.as_deref(), Some("s0"));
    // s1 may already be in flight when the stream goes away, nothing after it
    assert!(
        counting.total_calls() <= 2,
        "crawl kept going after the stream was dropped: {} fetches",
        counting.total_calls()
    );
}

#[tokio::test]
async fn test_golang_sample_matches_expected_output() {
    let mut stream = crawl(
        "https://golang.org/",
        4,
        Arc::new(StaticFetcher::golang_sample()),
    );

    let mut found = HashMap::new();
    while let Some(item) = stream.next().await {
        found.insert(item.id, item.content);
    }

    assert_eq!(found.len(), 4);
    assert_eq!(found["https://golang.org/"], "The Go Programming Language");
    assert_eq!(found["https://golang.org/pkg/"], "Packages");
    assert_eq!(found["https://golang.org/pkg/fmt/"], "Package fmt");
    assert_eq!(found["https://golang.org/pkg/os/"], "Package os");
    assert!(stream.report().failed("https://golang.org/cmd/"));

    // The failed identifier was still claimed
    assert_eq!(
        stream.visited(),
        vec![
            "https://golang.org/",
            "https://golang.org/cmd/",
            "https://golang.org/pkg/",
            "https://golang.org/pkg/fmt/",
            "https://golang.org/pkg/os/",
        ]
    );
}

#[tokio::test]
async fn test_static_config_drives_crawl() {
    let config = parse_config(
        r#"
[crawler]
seed = "A"
max-depth = 2

[[page]]
id = "A"
content = "page A"
links = ["B", "C"]

[[page]]
id = "B"
content = "page B"
links = ["A"]

[[page]]
id = "C"
content = "page C"
"#,
    )
    .expect("config should parse");

    let fetcher = build_fetcher(&config).expect("fetcher should build");
    let (items, _) = crawl(config.crawler.seed, config.crawler.max_depth, fetcher)
        .collect_all()
        .await;

    let expected: HashSet<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
    assert_eq!(id_set(&items), expected);
}

fn test_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
        timeout_secs: 5,
    }
}

fn html_page(title: &str, links: &[String]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">link</a>"#, l))
        .collect();
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, anchors
        ),
        "text/html",
    )
}

#[tokio::test]
async fn test_http_crawl_follows_links_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            &[format!("{}/page1", base_url), "/page2".to_string()],
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html_page("Page 1", &["/".to_string(), "/page2#top".to_string()]))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html_page("Page 2", &["/page1".to_string()]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&test_user_agent()).expect("client should build");
    let seed = format!("{}/", base_url);
    let (items, report) = crawl(seed.clone(), 3, Arc::new(fetcher)).collect_all().await;

    let found: HashMap<String, String> = items
        .into_iter()
        .map(|i| (i.id, i.content))
        .collect();

    assert_eq!(found.len(), 3);
    assert_eq!(found[&seed], "Home");
    assert_eq!(found[&format!("{}/page1", base_url)], "Page 1");
    assert_eq!(found[&format!("{}/page2", base_url)], "Page 2");
    assert!(report.failures.is_empty());
    // `expect(1)` on each mock is verified when the server is dropped
}

#[tokio::test]
async fn test_http_errors_are_reported_not_fatal() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            &[
                "/missing".to_string(),
                "/image.png".to_string(),
                "/fine".to_string(),
            ],
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/image.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 8], "image/png"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fine"))
        .respond_with(html_page("Fine", &[]))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&test_user_agent()).expect("client should build");
    let (items, report) = crawl(format!("{}/", base_url), 2, Arc::new(fetcher))
        .collect_all()
        .await;

    let titles: HashSet<String> = items.into_iter().map(|i| i.content).collect();
    let expected: HashSet<String> = ["Home", "Fine"].iter().map(|s| s.to_string()).collect();
    assert_eq!(titles, expected);

    assert_eq!(report.failures.len(), 2);
    assert!(report.failures.iter().any(|f| matches!(
        f.error,
        FetchError::Http { status: 404, .. }
    )));
    assert!(report
        .failures
        .iter()
        .any(|f| matches!(f.error, FetchError::ContentMismatch { .. })));
}

#[tokio::test]
async fn test_http_unreachable_seed() {
    let fetcher = HttpFetcher::new(&test_user_agent()).expect("client should build");
    // Port 9 (discard) on localhost is essentially never listening
    let (items, report) = crawl("http://127.0.0.1:9/", 3, Arc::new(fetcher))
        .collect_all()
        .await;

    assert!(items.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0].error,
        FetchError::Network { .. }
    ));
}
