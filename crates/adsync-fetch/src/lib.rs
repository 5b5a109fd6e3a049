//! adsync-fetch
//!
//! Publisher fetch collaborator. Retrieves a publisher's app-ads.txt over
//! HTTPS (HTTP fallback) and reports failures as typed values.
//!
//! This crate does not parse or reconcile; callers hand the text to
//! adsync-reconcile.

mod fetcher;
mod retry;

pub use adsync_reconcile::{FetchFailure, FetchOutcome, Fetched, Publisher};
pub use fetcher::{Fetcher, HttpFetcher};
pub use retry::{FetchSettings, RetryPolicy};
