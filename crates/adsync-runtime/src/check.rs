use std::collections::BTreeSet;
use std::sync::Arc;

use adsync_fetch::{Fetcher, Publisher};
use adsync_reconcile::{reconcile_outcome, ReconciliationResult, Report};
use adsync_records::MasterList;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use tracing::{info, warn};

/// Inputs of one check run.
#[derive(Clone)]
pub struct CheckRun {
    pub master: Arc<MasterList>,
    pub fetcher: Arc<dyn Fetcher>,
    /// Upper bound on in-flight fetches. Zero is treated as one.
    pub concurrency: usize,
}

impl CheckRun {
    pub fn new(master: Arc<MasterList>, fetcher: Arc<dyn Fetcher>, concurrency: usize) -> Self {
        Self {
            master,
            fetcher,
            concurrency,
        }
    }

    /// Fetch and reconcile every publisher.
    ///
    /// A publisher's fetch failure becomes its UNREACHABLE result; it never
    /// aborts the others. Each domain is checked once (first roster entry
    /// wins) and appears exactly once in the report.
    pub async fn run(&self, roster: &[Publisher], generated_at: DateTime<Utc>) -> Report {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut unique: Vec<&Publisher> = Vec::with_capacity(roster.len());
        for p in roster {
            if seen.insert(p.domain.as_str()) {
                unique.push(p);
            } else {
                warn!(publisher = %p.domain, "duplicate roster entry skipped");
            }
        }

        info!(
            publishers = unique.len(),
            master_records = self.master.len(),
            fetcher = self.fetcher.name(),
            concurrency = self.concurrency.max(1),
            "check run started"
        );

        let results: Vec<(String, ReconciliationResult)> = stream::iter(unique)
            .map(|publisher| self.check_one(publisher))
            .buffer_unordered(self.concurrency.max(1))
            .collect()
            .await;

        let mut report = Report::new(&self.master, generated_at);
        for (domain, result) in results {
            report.insert(domain, result);
        }

        let s = &report.summary;
        info!(
            total = s.total,
            ok = s.ok,
            missing_records = s.missing_records,
            unreachable = s.unreachable,
            parse_error = s.parse_error,
            "check run finished"
        );
        report
    }

    async fn check_one(&self, publisher: &Publisher) -> (String, ReconciliationResult) {
        let outcome = self.fetcher.fetch(publisher).await;
        let result = reconcile_outcome(&self.master, outcome);
        info!(
            publisher = %publisher.domain,
            status = %result.status,
            missing = result.missing.len(),
            conflicts = result.conflicts.len(),
            "publisher checked"
        );
        (publisher.domain.clone(), result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsync_fetch::{FetchFailure, FetchOutcome, Fetched};
    use adsync_reconcile::PublisherStatus;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves fixed texts; unknown domains are connection failures.
    struct MockFetcher {
        pages: BTreeMap<String, String>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Fetcher for MockFetcher {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn fetch(&self, publisher: &Publisher) -> FetchOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.pages.get(&publisher.domain) {
                Some(text) => Ok(Fetched::new(publisher.url("https"), text.clone())),
                None => Err(FetchFailure::Connection {
                    message: format!("{}: connection refused", publisher.domain),
                }),
            }
        }
    }

    #[tokio::test]
    async fn duplicate_roster_entries_are_fetched_once() {
        let fetcher = Arc::new(MockFetcher {
            pages: BTreeMap::from([("a.example".to_string(), "x.com, 1, DIRECT\n".to_string())]),
            calls: AtomicUsize::new(0),
        });
        let master = Arc::new(MasterList::from_text("x.com, 1, DIRECT\n").unwrap());
        let run = CheckRun::new(master, fetcher.clone(), 0);

        let roster = vec![Publisher::new("a.example"), Publisher::new("A.EXAMPLE")];
        let report = run.run(&roster, Utc::now()).await;

        assert_eq!(report.len(), 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.get("a.example").unwrap().status, PublisherStatus::Ok);
    }
}
