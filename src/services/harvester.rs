// src/services/harvester.rs

//! Pagination driver service.
//!
//! Drives the per-page pipeline (cache lookup → build → execute with
//! backoff → normalize → cache put) across pages until upstream
//! reports no further pages, the page limit is reached, or a terminal
//! failure occurs. Per-page failures are contained: the driver records
//! them and moves on to the next page, so callers always get the
//! partial records plus a failure summary.
//!
//! Harvest runs are restartable: the page number lives in the
//! `QuerySpec`, so resuming after a crash is just starting a new run
//! at the page to resume from.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::events::{EventSink, HarvestEvent, LogSink};
use crate::models::{
    Credential, HarvestConfig, HarvestOutcome, NormalizedPage, PageFailure, QuerySpec, RecordKind,
};
use crate::services::backoff::{self, BackoffPolicy};
use crate::services::{normalize, request, transport};
use crate::storage::ResultCache;
use crate::utils::{self, http};

/// Service for harvesting normalized records from a paginated API.
pub struct Harvester {
    config: Arc<HarvestConfig>,
    client: Client,
    cache: Option<Arc<dyn ResultCache>>,
    sink: Arc<dyn EventSink>,
}

impl Harvester {
    /// Create a new harvester with the given configuration.
    pub fn new(config: Arc<HarvestConfig>) -> Result<Self> {
        let client = http::create_async_client(&config.http)?;
        Ok(Self {
            config,
            client,
            cache: None,
            sink: Arc::new(LogSink),
        })
    }

    /// Attach a result cache backend.
    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the default log-forwarding event sink.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Run the full pipeline for a single page.
    pub async fn fetch_page(
        &self,
        spec: &QuerySpec,
        credential: &Credential,
        kind: RecordKind,
        cancel: &CancellationToken,
    ) -> Result<NormalizedPage> {
        spec.validate()?;

        let key = utils::cache_key(spec, kind);
        if let Some(cache) = self.active_cache() {
            if let Some(entry) = cache.get(&key).await? {
                log::debug!("cache hit for page {}", spec.page);
                return Ok(entry.page);
            }
        }

        let descriptor = request::build(spec, credential, &self.config.http.endpoint)?;
        let policy = BackoffPolicy::from_config(&self.config.retry);
        let timeout = self.config.http.timeout();

        let (body, charset) = backoff::run(&policy, spec.page, cancel, self.sink.as_ref(), || {
            transport::execute(&self.client, &descriptor, timeout)
        })
        .await?;

        let page = normalize::normalize(&body, charset.as_deref(), kind, self.sink.as_ref())?;

        if let Some(cache) = self.active_cache() {
            cache.put(&key, page.clone(), self.config.cache.ttl()).await?;
        }

        self.sink.emit(&HarvestEvent::Success {
            page: spec.page,
            records: page.records.len(),
        });
        Ok(page)
    }

    /// Harvest pages starting at `spec.page`, up to the page limit.
    pub async fn harvest(
        &self,
        spec: &QuerySpec,
        credential: &Credential,
        kind: RecordKind,
        cancel: &CancellationToken,
    ) -> Result<HarvestOutcome> {
        spec.validate()?;
        self.drive(spec.page, cancel, |page| {
            let page_spec = spec.with_page(page);
            async move { self.fetch_page(&page_spec, credential, kind, cancel).await }
        })
        .await
    }

    /// Harvest several specs concurrently, bounded by the configured
    /// concurrency limit.
    pub async fn harvest_many(
        &self,
        specs: Vec<QuerySpec>,
        credential: &Credential,
        kind: RecordKind,
        cancel: &CancellationToken,
    ) -> Vec<(QuerySpec, Result<HarvestOutcome>)> {
        let concurrency = self.config.harvest.concurrency.max(1);
        stream::iter(specs)
            .map(|spec| async move {
                let result = self.harvest(&spec, credential, kind, cancel).await;
                (spec, result)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await
    }

    fn active_cache(&self) -> Option<&Arc<dyn ResultCache>> {
        if self.config.cache.enabled {
            self.cache.as_ref()
        } else {
            None
        }
    }

    /// Page loop shared by `harvest` and the tests.
    ///
    /// `Fatal`, `Cancelled`, and `InvalidSpec` abort the run; any other
    /// per-page failure is recorded and the loop continues.
    async fn drive<F, Fut>(
        &self,
        start_page: u32,
        cancel: &CancellationToken,
        mut fetch: F,
    ) -> Result<HarvestOutcome>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<NormalizedPage>>,
    {
        let page_limit = self.config.harvest.page_limit;
        let delay = Duration::from_millis(self.config.harvest.request_delay_ms);
        let mut outcome = HarvestOutcome::default();

        for offset in 0..page_limit {
            if cancel.is_cancelled() {
                return Err(AppError::Cancelled);
            }
            if offset > 0 && !delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(AppError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            let page = start_page + offset;
            match fetch(page).await {
                Ok(normalized) => {
                    outcome.pages_fetched += 1;
                    outcome.dropped_records += normalized.dropped;
                    let has_next = normalized.has_next;
                    outcome.records.extend(normalized.records);
                    if !has_next {
                        break;
                    }
                }
                Err(e) if e.is_terminal() => return Err(e),
                Err(e) => {
                    self.sink.emit(&HarvestEvent::PageFailed {
                        page,
                        error: e.to_string(),
                    });
                    outcome.failures.push(PageFailure {
                        page,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::models::NormalizedRecord;

    fn harvester(page_limit: u32) -> Harvester {
        let mut config = HarvestConfig::default();
        config.harvest.page_limit = page_limit;
        config.harvest.request_delay_ms = 0;
        Harvester::new(Arc::new(config)).unwrap()
    }

    fn page_with(titles: &[&str], has_next: bool) -> NormalizedPage {
        let records = titles
            .iter()
            .map(|title| {
                let mut fields = BTreeMap::new();
                fields.insert("title".to_string(), serde_json::json!(title));
                fields.insert("link".to_string(), serde_json::json!("https://e.com"));
                NormalizedRecord {
                    kind: RecordKind::SearchResult,
                    fields,
                }
            })
            .collect();
        NormalizedPage {
            records,
            dropped: 0,
            has_next,
        }
    }

    fn titles(outcome: &HarvestOutcome) -> Vec<&str> {
        outcome
            .records
            .iter()
            .filter_map(|r| r.text("title"))
            .collect()
    }

    #[tokio::test]
    async fn failed_page_is_skipped_and_the_run_continues() {
        let h = harvester(3);
        let cancel = CancellationToken::new();
        let outcome = h
            .drive(1, &cancel, |page| async move {
                match page {
                    2 => Err(AppError::retries_exhausted(5, "HTTP 503")),
                    _ => {
                        let title = format!("p{page}");
                        Ok(page_with(&[title.as_str()], true))
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(titles(&outcome), vec!["p1", "p3"]);
        assert_eq!(outcome.pages_fetched, 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].page, 2);
    }

    #[tokio::test]
    async fn run_stops_when_upstream_reports_no_next_page() {
        let h = harvester(10);
        let cancel = CancellationToken::new();
        let outcome = h
            .drive(1, &cancel, |page| async move {
                let title = format!("p{page}");
                Ok(page_with(&[title.as_str()], page < 2))
            })
            .await
            .unwrap();

        assert_eq!(titles(&outcome), vec!["p1", "p2"]);
        assert_eq!(outcome.pages_fetched, 2);
    }

    #[tokio::test]
    async fn page_limit_bounds_the_walk() {
        let h = harvester(4);
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let outcome = h
            .drive(1, &cancel, |page| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    let title = format!("p{page}");
                    Ok(page_with(&[title.as_str()], true))
                }
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(outcome.pages_fetched, 4);
    }

    #[tokio::test]
    async fn restart_resumes_from_requested_page() {
        let h = harvester(2);
        let cancel = CancellationToken::new();
        let outcome = h
            .drive(5, &cancel, |page| async move {
                let title = format!("p{page}");
                Ok(page_with(&[title.as_str()], true))
            })
            .await
            .unwrap();

        assert_eq!(titles(&outcome), vec!["p5", "p6"]);
    }

    #[tokio::test]
    async fn fatal_aborts_the_whole_run() {
        let h = harvester(5);
        let cancel = CancellationToken::new();
        let result = h
            .drive(1, &cancel, |page| async move {
                match page {
                    2 => Err(AppError::fatal(403, "page 2")),
                    _ => Ok(page_with(&["p"], true)),
                }
            })
            .await;

        assert!(matches!(result, Err(AppError::Fatal { status: 403, .. })));
    }

    #[tokio::test]
    async fn cancellation_between_pages_aborts() {
        let h = harvester(5);
        let cancel = CancellationToken::new();
        let cancel_for_fetch = cancel.clone();
        let result = h
            .drive(1, &cancel, move |page| {
                let cancel = cancel_for_fetch.clone();
                async move {
                    if page == 1 {
                        cancel.cancel();
                    }
                    Ok(page_with(&["p"], true))
                }
            })
            .await;

        assert!(matches!(result, Err(AppError::Cancelled)));
    }

    #[tokio::test]
    async fn dropped_records_accumulate_across_pages() {
        let h = harvester(2);
        let cancel = CancellationToken::new();
        let outcome = h
            .drive(1, &cancel, |page| async move {
                let title = format!("p{page}");
                let mut p = page_with(&[title.as_str()], true);
                p.dropped = 1;
                Ok(p)
            })
            .await
            .unwrap();

        assert_eq!(outcome.dropped_records, 2);
        assert!(outcome.is_clean());
    }
}
