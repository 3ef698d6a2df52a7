use crate::config::FundEntry;
use crate::core::{ExtractionTrace, FundSnapshot, MetricRecord, Payload};
use crate::extract::labels::{SHARPE_KEYWORDS, VOLATILITY_KEYWORDS};
use crate::extract::{extract_performance, extract_ratios, extract_ter};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// The three provider views that feed one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageView {
    Performance,
    Ratios,
    Fees,
}

impl PageView {
    /// Value of the `tab` query parameter on the provider's snapshot URL.
    fn tab(self) -> u8 {
        match self {
            PageView::Performance => 1,
            PageView::Ratios => 2,
            PageView::Fees => 5,
        }
    }
}

/// Source of raw page HTML, behind a trait so tests skip the network.
#[async_trait]
pub trait PageProvider: Send + Sync {
    /// URL of one view of one entry's snapshot.
    fn page_url(&self, id: &str, view: PageView) -> String;

    /// Fetches that view's HTML.
    async fn fetch_page(&self, id: &str, view: PageView) -> Result<String>;
}

pub struct HttpPageProvider {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPageProvider {
    /// `timeout` bounds the whole request including the body read. There is
    /// no retry: a view that fails stays failed until the next rebuild.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fundsnap/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpPageProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl PageProvider for HttpPageProvider {
    fn page_url(&self, id: &str, view: PageView) -> String {
        format!(
            "{}/es/funds/snapshot/snapshot.aspx?id={}&tab={}",
            self.base_url,
            id,
            view.tab()
        )
    }

    async fn fetch_page(&self, id: &str, view: PageView) -> Result<String> {
        let url = self.page_url(id, view);
        debug!("Requesting page {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to request {url}"))?
            .error_for_status()
            .with_context(|| format!("Provider returned an error status for {url}"))?;

        response
            .text()
            .await
            .with_context(|| format!("Failed to read response body of {url}"))
    }
}

/// Anything that can produce a complete payload; the snapshot cache depends
/// on this seam rather than on the scraper directly.
#[async_trait]
pub trait PayloadBuilder: Send + Sync {
    async fn build_payload(&self) -> Result<Payload>;
}

/// Scrapes every configured entry and assembles the payload.
pub struct SnapshotBuilder {
    pages: Arc<dyn PageProvider>,
    funds: Vec<FundEntry>,
    plans: Vec<FundEntry>,
}

impl SnapshotBuilder {
    pub fn new(pages: Arc<dyn PageProvider>, funds: Vec<FundEntry>, plans: Vec<FundEntry>) -> Self {
        SnapshotBuilder {
            pages,
            funds,
            plans,
        }
    }

    /// One entry, three views fetched concurrently. A failed view degrades
    /// its own metrics and leaves a note in the snapshot's trace; it never
    /// sinks the entry, let alone the whole payload.
    #[instrument(
        name = "EntrySnapshot",
        skip(self, entry),
        fields(id = %entry.id, name = %entry.name)
    )]
    async fn entry_snapshot(&self, entry: &FundEntry) -> FundSnapshot {
        let source_url = self.pages.page_url(&entry.id, PageView::Performance);

        let (performance_page, ratios_page, fees_page) = futures::join!(
            self.pages.fetch_page(&entry.id, PageView::Performance),
            self.pages.fetch_page(&entry.id, PageView::Ratios),
            self.pages.fetch_page(&entry.id, PageView::Fees),
        );

        let (performance, mut trace) = match performance_page {
            Ok(html) => extract_performance(&html),
            Err(e) => {
                warn!("Performance view failed for {}: {:#}", entry.id, e);
                (
                    MetricRecord::new(),
                    ExtractionTrace::from_error(format!("performance: {e:#}")),
                )
            }
        };

        let (sharpe, volatility) = match ratios_page {
            Ok(html) => (
                extract_ratios(&html, SHARPE_KEYWORDS),
                extract_ratios(&html, VOLATILITY_KEYWORDS),
            ),
            Err(e) => {
                warn!("Ratios view failed for {}: {:#}", entry.id, e);
                trace.record_error(format!("ratios: {e:#}"));
                (MetricRecord::new(), MetricRecord::new())
            }
        };

        let ter = match fees_page {
            Ok(html) => extract_ter(&html),
            Err(e) => {
                warn!("Fees view failed for {}: {:#}", entry.id, e);
                trace.record_error(format!("fees: {e:#}"));
                "-".to_string()
            }
        };

        FundSnapshot {
            id: entry.id.clone(),
            name: entry.name.clone(),
            isin: entry.isin.clone(),
            category: entry.category.clone(),
            comment: entry.comment.clone(),
            performance,
            sharpe,
            volatility,
            ter,
            source_url,
            debug: trace,
        }
    }
}

#[async_trait]
impl PayloadBuilder for SnapshotBuilder {
    async fn build_payload(&self) -> Result<Payload> {
        debug!(
            "Building payload for {} funds and {} plans",
            self.funds.len(),
            self.plans.len()
        );

        let mut funds = Vec::with_capacity(self.funds.len());
        for entry in &self.funds {
            funds.push(self.entry_snapshot(entry).await);
        }
        let mut plans = Vec::with_capacity(self.plans.len());
        for entry in &self.plans {
            plans.push(self.entry_snapshot(entry).await);
        }

        Ok(Payload {
            last_updated: Utc::now(),
            funds,
            plans,
        })
    }
}
