use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use storyline_common::StorylineError;
use storyline_config::StorylineConfig;
use storyline_http::{DocumentSource, HttpClient, HttpDocumentSource, HttpError};
use storyline_scan::{Story, StoryScanner};
use thiserror::Error;

use crate::cache::PageCache;

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("failed to fetch {location}: {source}")]
    Fetch {
        location: String,
        #[source]
        source: HttpError,
    },
    #[error("http client setup failed: {0}")]
    Client(#[source] HttpError),
    #[error(transparent)]
    Local(#[from] StorylineError),
}

/// Stories from one extraction plus the count that was asked for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Harvest {
    pub stories: Vec<Story>,
    pub requested: usize,
}

impl Harvest {
    pub fn extracted(&self) -> usize {
        self.stories.len()
    }

    /// Fewer stories than requested: a data condition, not a fault.
    pub fn is_insufficient(&self) -> bool {
        self.stories.len() < self.requested
    }
}

/// Fetch (or reuse) the page, scan it, report the outcome.
pub struct Harvester {
    source: Arc<dyn DocumentSource>,
    scanner: StoryScanner,
    cache: PageCache,
    heading_tag: String,
    limit: usize,
}

impl Harvester {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        scanner: StoryScanner,
        cache: PageCache,
        heading_tag: impl Into<String>,
        limit: usize,
    ) -> Self {
        Self {
            source,
            scanner,
            cache,
            heading_tag: heading_tag.into(),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Download the page and overwrite the cached copy.
    pub async fn refresh_page(&self) -> Result<String, HarvestError> {
        let html = self
            .source
            .fetch_document()
            .await
            .map_err(|source| HarvestError::Fetch {
                location: self.source.location(),
                source,
            })?;
        self.cache.store_page(&html).await?;
        Ok(html)
    }

    pub async fn harvest(&self, fetch: bool) -> Result<Harvest, HarvestError> {
        self.harvest_with_limit(fetch, self.limit).await
    }

    /// With `fetch` the page is downloaded first, otherwise the cached copy
    /// is scanned.
    pub async fn harvest_with_limit(
        &self,
        fetch: bool,
        limit: usize,
    ) -> Result<Harvest, HarvestError> {
        let html = if fetch {
            self.refresh_page().await?
        } else {
            self.cache.load_page().await?
        };

        let stories = self
            .scanner
            .extract_stories(&html, &self.heading_tag, limit);
        let harvest = Harvest {
            stories,
            requested: limit,
        };
        if harvest.is_insufficient() {
            tracing::warn!(
                extracted = harvest.extracted(),
                requested = limit,
                fetched = fetch,
                "harvest.insufficient"
            );
        } else {
            tracing::info!(extracted = harvest.extracted(), fetched = fetch, "harvest.complete");
        }
        Ok(harvest)
    }
}

/// Wire the HTTP source, scanner and cache described by `cfg`.
pub fn build_from_config(cfg: &StorylineConfig) -> Result<Harvester, HarvestError> {
    let mut client = HttpClient::new(&cfg.source.base_url)
        .map_err(HarvestError::Client)?
        .with_timeout(Duration::from_secs(cfg.source.timeout_secs))
        .with_retries(cfg.source.retries);
    if let Some(agent) = &cfg.source.user_agent {
        client = client.with_user_agent(agent).map_err(HarvestError::Client)?;
    }
    let source = HttpDocumentSource::new(client, cfg.source.path.clone());

    let scanner = StoryScanner::new(cfg.source.base()?)
        .with_label_tag(&cfg.extract.label_tag)
        .with_min_title_chars(cfg.extract.min_title_chars);

    Ok(Harvester::new(
        Arc::new(source),
        scanner,
        PageCache::new(cfg.cache.page_file.clone()),
        cfg.extract.heading_tag.clone(),
        cfg.extract.limit,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticPage {
        html: Option<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DocumentSource for StaticPage {
        async fn fetch_document(&self) -> Result<String, HttpError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.html.clone().ok_or(HttpError::Api {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: "down".into(),
                request_id: "-".into(),
            })
        }

        fn location(&self) -> String {
            "https://time.com/".into()
        }
    }

    fn page(blocks: usize) -> String {
        (0..blocks)
            .map(|i| format!(r#"<h3><a href="/story/{i}/"><span>Story {i}</span></a></h3>"#))
            .collect()
    }

    fn harvester(html: Option<String>, dir: &std::path::Path) -> (Harvester, Arc<StaticPage>) {
        let source = Arc::new(StaticPage {
            html,
            calls: AtomicUsize::new(0),
        });
        let h = Harvester::new(
            source.clone(),
            StoryScanner::default(),
            PageCache::new(dir.join("site.txt")),
            "h3",
            6,
        );
        (h, source)
    }

    #[tokio::test]
    async fn fetch_stores_page_and_extracts() {
        let tmp = tempfile::tempdir().unwrap();
        let (h, source) = harvester(Some(page(8)), tmp.path());

        let harvest = h.harvest(true).await.unwrap();
        assert_eq!(harvest.extracted(), 6);
        assert!(!harvest.is_insufficient());
        assert_eq!(harvest.stories[0].link, "https://time.com/story/0/");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.cache().load_page().await.unwrap(), page(8));
    }

    #[tokio::test]
    async fn cached_page_is_used_without_fetch() {
        let tmp = tempfile::tempdir().unwrap();
        let (h, source) = harvester(None, tmp.path());
        h.cache().store_page(&page(4)).await.unwrap();

        let harvest = h.harvest(false).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(harvest.extracted(), 4);
        assert_eq!(harvest.requested, 6);
        assert!(harvest.is_insufficient());
    }

    #[tokio::test]
    async fn explicit_limit_overrides_default() {
        let tmp = tempfile::tempdir().unwrap();
        let (h, _) = harvester(Some(page(8)), tmp.path());
        let harvest = h.harvest_with_limit(true, 2).await.unwrap();
        assert_eq!(harvest.extracted(), 2);
        assert_eq!(harvest.requested, 2);
    }

    #[tokio::test]
    async fn fetch_failure_is_a_hard_error() {
        let tmp = tempfile::tempdir().unwrap();
        let (h, _) = harvester(None, tmp.path());
        let err = h.harvest(true).await.unwrap_err();
        assert!(matches!(err, HarvestError::Fetch { .. }));
        assert!(err.to_string().starts_with("failed to fetch https://time.com/"));
    }

    #[tokio::test]
    async fn missing_cache_is_a_hard_error() {
        let tmp = tempfile::tempdir().unwrap();
        let (h, _) = harvester(None, tmp.path());
        let err = h.harvest(false).await.unwrap_err();
        assert!(matches!(err, HarvestError::Local(StorylineError::Cache { .. })));
    }

    #[test]
    fn builds_from_default_config() {
        let h = build_from_config(&StorylineConfig::default()).unwrap();
        assert_eq!(h.limit(), 6);
        assert_eq!(h.cache().page_file(), std::path::Path::new("site.txt"));
    }

    #[test]
    fn rejects_bad_user_agent() {
        let mut cfg = StorylineConfig::default();
        cfg.source.user_agent = Some("bad\nagent".into());
        assert!(matches!(
            build_from_config(&cfg),
            Err(HarvestError::Client(HttpError::Build(_)))
        ));
    }
}
