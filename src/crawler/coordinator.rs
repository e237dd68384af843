//! Crawler coordinator - main crawl orchestration logic
//!
//! This module runs a fixed pool of worker tasks over the shared frontier.
//! Each worker repeatedly:
//! - Takes a URL from the frontier
//! - Claims it in the registry (skipping URLs already crawled or in flight)
//! - Reserves a slot in the visit budget
//! - Fetches, classifies, and extracts links
//! - Registers discovered URLs, records edges, and feeds the frontier
//! - Marks the URL crawled
//!
//! The run ends when the frontier runs dry, the budget is spent, a stop is
//! requested, or a fatal error occurs.

use crate::config::CrawlerConfig;
use crate::crawler::budget::Budget;
use crate::crawler::classifier::{classify, is_parsable};
use crate::crawler::fetcher::{FetchError, FetchErrorKind, Fetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::find_links;
use crate::registry::Registry;
use crate::SpidyError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// How often (in completed units) progress is logged
const PROGRESS_INTERVAL: usize = 50;

/// Terminal result of one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Content was parsable; `links` matches were found in the body
    Parsed { links: usize },
    /// Content type is not on the parsable allow-list
    Unparsable,
    /// The fetch failed with a transient error
    Failed(FetchErrorKind),
}

/// Summary of a finished crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    /// Units of work completed
    pub units_completed: usize,
    /// URLs still pending in the frontier
    pub frontier_size: usize,
    /// The run was stopped by an operator request
    pub interrupted: bool,
    /// The run stopped because the budget was spent
    pub budget_exhausted: bool,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// State shared by every worker of a run
struct CrawlContext {
    registry: Arc<Registry>,
    frontier: Arc<Frontier>,
    budget: Budget,
    fetcher: Arc<dyn Fetcher>,
    request_timeout: Duration,
    data_ceiling: Option<u64>,
    stop_requested: AtomicBool,
}

impl CrawlContext {
    async fn worker_loop(&self, worker_id: usize) -> Result<(), SpidyError> {
        tracing::trace!("Worker {} started", worker_id);

        while let Some(url) = self.frontier.take().await {
            let result = self.process_url(&url).await;
            self.frontier.task_done();

            match result {
                Ok(Some(outcome)) => {
                    tracing::debug!("Worker {} finished {}: {:?}", worker_id, url, outcome);
                }
                Ok(None) => {}
                Err(e) => {
                    self.frontier.halt();
                    return Err(e);
                }
            }

            self.check_data_ceiling()?;
        }

        tracing::trace!("Worker {} exiting", worker_id);
        Ok(())
    }

    /// Runs one unit of work for `url`
    ///
    /// # Returns
    ///
    /// * `Ok(Some(outcome))` - The URL was fetched and reached a terminal state
    /// * `Ok(None)` - The URL was skipped (already handled, or no budget left)
    /// * `Err(SpidyError)` - A fatal error; the run must stop
    async fn process_url(&self, url: &str) -> Result<Option<Outcome>, SpidyError> {
        let id = self.registry.register(url);

        if !self.registry.claim(id)? {
            tracing::trace!("Skipping already processed URL {}", url);
            return Ok(None);
        }

        if !self.budget.try_reserve() {
            self.registry.release(id)?;
            self.frontier.add(url);
            self.frontier.halt();
            return Ok(None);
        }

        tracing::debug!("Starting crawl on {}", url);

        // No registry or frontier lock is held across this await
        let fetched = match tokio::time::timeout(self.request_timeout, self.fetcher.fetch(url)).await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::timeout(self.request_timeout)),
        };

        let outcome = match fetched {
            Err(e) if e.kind.is_transient() => {
                tracing::warn!("An error was raised trying to get {}: {}", url, e);
                self.registry.mark_unparsable(id)?;
                Outcome::Failed(e.kind)
            }
            Err(e) => {
                self.registry.mark_unparsable(id)?;
                self.registry.mark_crawled(id)?;
                self.budget.release();
                tracing::error!("Unclassified error fetching {}: {}", url, e);
                return Err(SpidyError::Fetch {
                    url: url.to_string(),
                    source: e,
                });
            }
            Ok(response) => {
                let mime = classify(&response.headers);
                if is_parsable(&mime) {
                    let mut links = 0;
                    for link in find_links(&response.body) {
                        let target = self.registry.register(link);
                        self.registry.add_edge(id, target)?;
                        self.frontier.add(link);
                        links += 1;
                    }
                    tracing::debug!("Found {} links on {}", links, url);
                    Outcome::Parsed { links }
                } else {
                    tracing::debug!("Unparsable MIME type {} at {}", mime, url);
                    self.registry.mark_unparsable(id)?;
                    Outcome::Unparsable
                }
            }
        };

        self.registry.mark_crawled(id)?;
        let completed = self.budget.complete();

        if completed % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "Progress: {} pages crawled, {} in frontier, {} URLs known",
                completed,
                self.frontier.len(),
                self.registry.len()
            );
        }

        if self.budget.is_exhausted() {
            tracing::info!("Budget of {} pages reached, stopping dispatch", completed);
            self.frontier.halt();
        }

        Ok(Some(outcome))
    }

    fn check_data_ceiling(&self) -> Result<(), SpidyError> {
        let Some(limit) = self.data_ceiling else {
            return Ok(());
        };

        let used = self.registry.approx_bytes() as u64;
        if used > limit {
            tracing::error!("Ran out of memory! Registry holds ~{} bytes", used);
            self.frontier.halt();
            return Err(SpidyError::MemoryCeiling { used, limit });
        }

        Ok(())
    }
}

/// Requests a graceful stop of a running crawl
///
/// Stopping halts dispatch; in-flight units finish (or time out) and `run`
/// returns a report with `interrupted` set.
#[derive(Clone)]
pub struct StopHandle {
    ctx: Arc<CrawlContext>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.ctx.stop_requested.store(true, Ordering::SeqCst);
        self.ctx.frontier.halt();
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    ctx: Arc<CrawlContext>,
    workers: usize,
}

impl Coordinator {
    /// Creates a coordinator with a fresh registry and frontier
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration (budget, workers, limits)
    /// * `fetcher` - The fetch capability shared by all workers
    pub fn new(config: &CrawlerConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let ctx = CrawlContext {
            registry: Arc::new(Registry::new()),
            frontier: Arc::new(Frontier::new()),
            budget: Budget::new(config.budget),
            fetcher,
            request_timeout: config.request_timeout(),
            data_ceiling: config.data_ceiling(),
            stop_requested: AtomicBool::new(false),
        };

        Self {
            ctx: Arc::new(ctx),
            workers: config.workers.max(1),
        }
    }

    /// Primes the frontier with seed URLs
    ///
    /// Returns the number of seeds that were not already pending.
    pub fn seed<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for url in urls {
            let url = url.as_ref();
            self.ctx.registry.register_seed(url);
            if self.ctx.frontier.add(url) {
                added += 1;
            }
        }
        added
    }

    /// The registry of this run
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.ctx.registry)
    }

    /// The frontier of this run
    pub fn frontier(&self) -> Arc<Frontier> {
        Arc::clone(&self.ctx.frontier)
    }

    /// Units of work completed so far
    pub fn units_completed(&self) -> usize {
        self.ctx.budget.completed()
    }

    /// Returns a handle that can stop the crawl from another task
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            ctx: Arc::clone(&self.ctx),
        }
    }

    /// Runs the crawl until the frontier is exhausted, the budget is spent,
    /// or a stop is requested
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The crawl ended normally or was interrupted
    /// * `Err(SpidyError)` - A fatal error (unclassified fetch failure or
    ///   memory ceiling) aborted the run
    pub async fn run(&self) -> Result<CrawlReport, SpidyError> {
        match self.ctx.budget.limit() {
            Some(limit) => tracing::info!(
                "Starting crawl with {} workers, budget {} pages",
                self.workers,
                limit
            ),
            None => tracing::warn!(
                "Starting crawl with {} workers and no budget; an unbounded crawl can exhaust memory",
                self.workers
            ),
        }

        let start_time = Instant::now();
        let mut workers = JoinSet::new();
        for worker_id in 0..self.workers {
            let ctx = Arc::clone(&self.ctx);
            workers.spawn(async move { ctx.worker_loop(worker_id).await });
        }

        let mut first_error = None;
        while let Some(joined) = workers.join_next().await {
            let result = joined
                .map_err(|e| SpidyError::Worker(e.to_string()))
                .and_then(|result| result);

            if let Err(e) = result {
                self.ctx.frontier.halt();
                first_error.get_or_insert(e);
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        let report = CrawlReport {
            units_completed: self.ctx.budget.completed(),
            frontier_size: self.ctx.frontier.len(),
            interrupted: self.ctx.stop_requested.load(Ordering::SeqCst),
            budget_exhausted: self.ctx.budget.is_exhausted(),
            elapsed: start_time.elapsed(),
        };

        tracing::info!(
            "Crawl finished: {} pages crawled in {:?}, {} left in frontier",
            report.units_completed,
            report.elapsed,
            report.frontier_size
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::FetchResponse;
    use crate::url::UrlId;
    use async_trait::async_trait;
    use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Scripted response for the in-memory fetcher
    #[derive(Clone)]
    enum Script {
        Page(&'static str, String),
        Fail(FetchErrorKind),
        Hang,
    }

    /// Fetcher that serves scripted responses and counts fetches per URL
    #[derive(Default)]
    struct ScriptedFetcher {
        scripts: HashMap<String, Script>,
        fetches: Mutex<HashMap<String, usize>>,
        total: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn page(mut self, url: &str, content_type: &'static str, body: impl Into<String>) -> Self {
            self.scripts
                .insert(url.to_string(), Script::Page(content_type, body.into()));
            self
        }

        fn fail(mut self, url: &str, kind: FetchErrorKind) -> Self {
            self.scripts.insert(url.to_string(), Script::Fail(kind));
            self
        }

        fn hang(mut self, url: &str) -> Self {
            self.scripts.insert(url.to_string(), Script::Hang);
            self
        }

        fn fetch_count(&self, url: &str) -> usize {
            self.fetches.lock().unwrap().get(url).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
            *self.fetches.lock().unwrap().entry(url.to_string()).or_default() += 1;
            self.total.fetch_add(1, Ordering::SeqCst);

            match self.scripts.get(url).cloned() {
                Some(Script::Page(content_type, body)) => {
                    let mut headers = HeaderMap::new();
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
                    Ok(FetchResponse {
                        status: 200,
                        headers,
                        body,
                    })
                }
                Some(Script::Fail(kind)) => Err(FetchError::new(kind, "scripted failure")),
                Some(Script::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(FetchError::new(FetchErrorKind::Other, "unreachable"))
                }
                None => Err(FetchError::new(FetchErrorKind::ConnectionError, "no such host")),
            }
        }
    }

    fn test_config(budget: usize, workers: usize) -> CrawlerConfig {
        CrawlerConfig {
            budget,
            workers,
            request_timeout_secs: 1,
            max_redirects: 10,
            data_ceiling: 0,
        }
    }

    /// A chain of `n` html pages, each linking to the next
    fn chain(n: usize) -> ScriptedFetcher {
        (0..n).fold(ScriptedFetcher::default(), |fetcher, i| {
            fetcher.page(
                &format!("http://example.test/{}", i),
                "text/html",
                format!("<a href=\"http://example.test/{}\">next</a>", i + 1),
            )
        })
    }

    const A: &str = "http://example.test/a";
    const B: &str = "http://example.test/b";
    const C: &str = "http://example.test/c";

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let fetcher = ScriptedFetcher::default()
            .page(
                A,
                "text/html",
                format!(r#"<a href="{}">b</a> <a href="{}">c</a>"#, B, C),
            )
            .page(B, "image/png", "\u{89}PNG")
            .hang(C);

        let coordinator = Coordinator::new(&test_config(100, 4), Arc::new(fetcher));
        coordinator.seed([A]);
        let report = coordinator.run().await.unwrap();

        let registry = coordinator.registry();
        assert_eq!(registry.len(), 3);

        let a = registry.lookup(UrlId::of(A)).unwrap();
        assert!(a.crawled);
        assert!(a.parsable);
        assert_eq!(a.outbound.len(), 2);
        assert!(a.outbound.contains(&UrlId::of(B)));
        assert!(a.outbound.contains(&UrlId::of(C)));

        let b = registry.lookup(UrlId::of(B)).unwrap();
        assert!(b.crawled);
        assert!(!b.parsable);

        let c = registry.lookup(UrlId::of(C)).unwrap();
        assert!(c.crawled);
        assert!(!c.parsable);

        assert!(coordinator.frontier().is_empty());
        assert_eq!(report.units_completed, 3);
        assert_eq!(report.frontier_size, 0);
        assert!(!report.interrupted);
        assert!(!report.budget_exhausted);
    }

    #[tokio::test]
    async fn test_budget_is_never_exceeded() {
        for budget in [1, 2, 3, 7] {
            for workers in [1, 4] {
                let coordinator = Coordinator::new(&test_config(budget, workers), Arc::new(chain(20)));
                coordinator.seed(["http://example.test/0"]);
                let report = coordinator.run().await.unwrap();

                assert_eq!(report.units_completed, budget);
                assert!(report.budget_exhausted);
                let crawled = coordinator
                    .registry()
                    .records()
                    .iter()
                    .filter(|record| record.crawled)
                    .count();
                assert_eq!(crawled, budget);
            }
        }
    }

    #[tokio::test]
    async fn test_budget_leaves_pending_urls_in_frontier() {
        let coordinator = Coordinator::new(&test_config(1, 1), Arc::new(chain(5)));
        coordinator.seed(["http://example.test/0"]);
        let report = coordinator.run().await.unwrap();

        assert_eq!(report.units_completed, 1);
        assert_eq!(report.frontier_size, 1);
        assert!(!coordinator
            .registry()
            .is_crawled(UrlId::of("http://example.test/1")));
    }

    #[tokio::test]
    async fn test_each_url_fetched_once() {
        // Every page links to every other page, including itself
        let urls: Vec<String> = (0..10).map(|i| format!("http://example.test/{}", i)).collect();
        let body = urls.join(" ");
        let fetcher = urls.iter().fold(ScriptedFetcher::default(), |f, url| {
            f.page(url, "text/html", body.clone())
        });
        let fetcher = Arc::new(fetcher);

        let coordinator = Coordinator::new(&test_config(0, 8), fetcher.clone());
        coordinator.seed(urls.iter());
        let report = coordinator.run().await.unwrap();

        assert_eq!(report.units_completed, 10);
        for url in &urls {
            assert_eq!(fetcher.fetch_count(url), 1, "{} fetched more than once", url);
            let record = coordinator.registry().lookup(UrlId::of(url)).unwrap();
            assert_eq!(record.outbound.len(), 10);
        }
        assert_eq!(fetcher.total.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_transient_failures_do_not_abort() {
        let fetcher = ScriptedFetcher::default()
            .page(
                A,
                "text/html",
                format!("{} {} http://example.test/d http://example.test/e", B, C),
            )
            .fail(B, FetchErrorKind::TooManyRedirects)
            .fail(C, FetchErrorKind::EncodingError)
            .fail("http://example.test/d", FetchErrorKind::Timeout);
        // e is unscripted and fails with a connection error

        let coordinator = Coordinator::new(&test_config(100, 2), Arc::new(fetcher));
        coordinator.seed([A]);
        let report = coordinator.run().await.unwrap();

        assert_eq!(report.units_completed, 5);
        for record in coordinator.registry().records() {
            assert!(record.crawled);
            assert_eq!(record.parsable, record.url == A);
        }
    }

    #[tokio::test]
    async fn test_unclassified_failure_is_fatal() {
        let fetcher = ScriptedFetcher::default()
            .page(A, "text/html", B)
            .fail(B, FetchErrorKind::Other);

        let coordinator = Coordinator::new(&test_config(100, 1), Arc::new(fetcher));
        coordinator.seed([A]);
        let result = coordinator.run().await;

        match result {
            Err(SpidyError::Fetch { url, source }) => {
                assert_eq!(url, B);
                assert_eq!(source.kind, FetchErrorKind::Other);
            }
            other => panic!("expected fatal fetch error, got {:?}", other),
        }
        assert_eq!(coordinator.units_completed(), 1);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_unparsable() {
        struct NoHeaders;

        #[async_trait]
        impl Fetcher for NoHeaders {
            async fn fetch(&self, _url: &str) -> Result<FetchResponse, FetchError> {
                Ok(FetchResponse {
                    status: 200,
                    headers: HeaderMap::new(),
                    body: "http://example.test/hidden".to_string(),
                })
            }
        }

        let coordinator = Coordinator::new(&test_config(100, 1), Arc::new(NoHeaders));
        coordinator.seed([A]);
        let report = coordinator.run().await.unwrap();

        assert_eq!(report.units_completed, 1);
        assert_eq!(coordinator.registry().len(), 1);
        let record = coordinator.registry().lookup(UrlId::of(A)).unwrap();
        assert!(record.crawled);
        assert!(!record.parsable);
    }

    #[tokio::test]
    async fn test_memory_ceiling_is_fatal() {
        let mut config = test_config(0, 1);
        config.data_ceiling = 1;

        let coordinator = Coordinator::new(&config, Arc::new(chain(10)));
        coordinator.seed(["http://example.test/0"]);
        let result = coordinator.run().await;

        assert!(matches!(
            result,
            Err(SpidyError::MemoryCeiling { limit: 1, .. })
        ));
        assert!(coordinator.frontier().is_halted());
    }

    #[tokio::test]
    async fn test_stop_handle_interrupts_run() {
        let fetcher = ScriptedFetcher::default()
            .page(A, "text/html", B)
            .hang(B);

        let coordinator = Coordinator::new(&test_config(0, 2), Arc::new(fetcher));
        coordinator.seed([A]);

        let stop = coordinator.stop_handle();
        let run = coordinator.run();
        tokio::pin!(run);

        // Let the crawl reach the hanging fetch, then stop it
        tokio::select! {
            _ = &mut run => panic!("run should still be waiting on the hanging fetch"),
            _ = tokio::time::sleep(Duration::from_millis(100)) => {}
        }
        stop.stop();

        // The hanging fetch still finishes through the request timeout
        let report = run.await.unwrap();

        assert!(report.interrupted);
        assert_eq!(report.units_completed, 2);
        assert!(coordinator.registry().is_crawled(UrlId::of(A)));
    }

    #[tokio::test]
    async fn test_no_seeds_finishes_immediately() {
        let coordinator = Coordinator::new(&test_config(100, 4), Arc::new(chain(0)));
        let report = coordinator.run().await.unwrap();

        assert_eq!(report.units_completed, 0);
        assert_eq!(report.frontier_size, 0);
    }

    #[test]
    fn test_seed_counts_new_urls() {
        let coordinator = Coordinator::new(&test_config(100, 1), Arc::new(chain(0)));
        assert_eq!(coordinator.seed([A, B, A]), 2);
        assert_eq!(coordinator.registry().seeds().len(), 2);
        assert_eq!(coordinator.frontier().len(), 2);
    }
}
