use adsync_reconcile::{FetchFailure, FetchOutcome, Fetched, Publisher};
use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::retry::FetchSettings;

/// Publisher fetch contract.
///
/// Implementations must be `Send + Sync`; the runtime shares one instance
/// across concurrent fetches behind an `Arc<dyn Fetcher>`. Failures are
/// values, never panics: the caller turns them into UNREACHABLE results.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, publisher: &Publisher) -> FetchOutcome;
}

/// reqwest-backed fetcher: HTTPS first, optional HTTP fallback, per-request
/// timeout, bounded retry.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
    settings: FetchSettings,
    /// Replaces `scheme://domain` for every publisher. Tests and mirrors.
    base_urls: Option<Vec<String>>,
}

impl HttpFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .context("http client build failed")?;
        Ok(Self {
            http,
            settings,
            base_urls: None,
        })
    }

    /// Fetch from fixed origins, tried in order, instead of the publisher's
    /// own domain.
    pub fn new_with_base_urls(settings: FetchSettings, base_urls: Vec<String>) -> Result<Self> {
        let mut fetcher = Self::new(settings)?;
        fetcher.base_urls = Some(base_urls);
        Ok(fetcher)
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// URLs to try for one attempt, in preference order.
    pub fn candidate_urls(&self, publisher: &Publisher) -> Vec<String> {
        match &self.base_urls {
            Some(bases) => bases
                .iter()
                .map(|b| format!("{}{}", b.trim_end_matches('/'), publisher.app_ads_path))
                .collect(),
            None => {
                let mut urls = vec![publisher.url("https")];
                if self.settings.allow_http_fallback {
                    urls.push(publisher.url("http"));
                }
                urls
            }
        }
    }

    /// One attempt: each candidate in turn, first success wins. On failure
    /// the last candidate's failure is returned.
    async fn attempt(&self, publisher: &Publisher) -> FetchOutcome {
        let mut last: Option<FetchFailure> = None;
        for url in self.candidate_urls(publisher) {
            match self.get_once(&url).await {
                Ok(fetched) => return Ok(fetched),
                Err(failure) => {
                    debug!(publisher = %publisher.domain, url = %url, error = %failure, "candidate failed");
                    last = Some(failure);
                }
            }
        }
        Err(last.unwrap_or_else(|| FetchFailure::Connection {
            message: "no candidate url".to_string(),
        }))
    }

    async fn get_once(&self, url: &str) -> FetchOutcome {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, &e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            return Err(FetchFailure::NotFound {
                status: status.as_u16(),
                message: format!("{url} returned HTTP {}", status.as_u16()),
            });
        }
        if !status.is_success() {
            return Err(FetchFailure::HttpStatus {
                status: status.as_u16(),
                message: format!("{url} returned HTTP {}", status.as_u16()),
            });
        }

        let final_url = resp.url().to_string();
        let body = resp.bytes().await.map_err(|e| classify(url, &e))?;
        let text = String::from_utf8(body.to_vec()).map_err(|e| FetchFailure::Decode {
            message: format!("{url}: body is not UTF-8: {e}"),
        })?;
        Ok(Fetched::new(final_url, text))
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, publisher: &Publisher) -> FetchOutcome {
        let policy = self.settings.retry;
        let mut attempt = 1;
        loop {
            match self.attempt(publisher).await {
                Ok(fetched) => {
                    debug!(publisher = %publisher.domain, url = %fetched.url, attempt, "fetched");
                    return Ok(fetched);
                }
                Err(failure) if failure.is_retryable() && attempt < policy.attempts() => {
                    let delay = policy.delay_after(attempt);
                    warn!(
                        publisher = %publisher.domain,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure,
                        "fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => {
                    warn!(publisher = %publisher.domain, attempt, error = %failure, "fetch failed");
                    return Err(failure);
                }
            }
        }
    }
}

fn classify(url: &str, e: &reqwest::Error) -> FetchFailure {
    let message = format!("{url}: {e}");
    if e.is_timeout() {
        FetchFailure::Timeout { message }
    } else if e.is_decode() || e.is_body() {
        FetchFailure::Decode { message }
    } else {
        FetchFailure::Connection { message }
    }
}
