use std::fmt;

use adsync_records::{MalformedReason, OtherLine, Record};
use serde::{Deserialize, Serialize};

/// Compliance classification of one publisher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublisherStatus {
    Ok,
    MissingRecords,
    Unreachable,
    ParseError,
}

impl PublisherStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublisherStatus::Ok => "OK",
            PublisherStatus::MissingRecords => "MISSING_RECORDS",
            PublisherStatus::Unreachable => "UNREACHABLE",
            PublisherStatus::ParseError => "PARSE_ERROR",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, PublisherStatus::Ok)
    }
}

impl fmt::Display for PublisherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

pub const DEFAULT_APP_ADS_PATH: &str = "/app-ads.txt";

/// One publisher to check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    /// Lower-cased, trimmed. Identifies the publisher in the report.
    pub domain: String,
    pub name: String,
    /// Always starts with '/'.
    pub app_ads_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl Publisher {
    pub fn new(domain: impl AsRef<str>) -> Self {
        let domain = domain.as_ref().trim().to_ascii_lowercase();
        Self {
            name: domain.clone(),
            domain,
            app_ads_path: DEFAULT_APP_ADS_PATH.to_string(),
            notes: String::new(),
        }
    }

    /// Empty names fall back to the domain.
    pub fn with_name(mut self, name: impl AsRef<str>) -> Self {
        let name = name.as_ref().trim();
        if !name.is_empty() {
            self.name = name.to_string();
        }
        self
    }

    /// Empty paths keep the default; a leading '/' is added when absent.
    pub fn with_path(mut self, path: impl AsRef<str>) -> Self {
        let path = path.as_ref().trim();
        if !path.is_empty() {
            self.app_ads_path = if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{path}")
            };
        }
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// `scheme://domain/path`
    pub fn url(&self, scheme: &str) -> String {
        format!("{scheme}://{}{}", self.domain, self.app_ads_path)
    }
}

// ---------------------------------------------------------------------------
// Fetch outcome
// ---------------------------------------------------------------------------

/// Why a publisher's file could not be retrieved.
///
/// Serialized as `{"kind": ..., "message": ...}` (plus `status` for HTTP
/// failures).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchFailure {
    Timeout { message: String },
    NotFound { status: u16, message: String },
    HttpStatus { status: u16, message: String },
    Connection { message: String },
    Decode { message: String },
}

impl FetchFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchFailure::Timeout { .. } => "timeout",
            FetchFailure::NotFound { .. } => "not_found",
            FetchFailure::HttpStatus { .. } => "http_status",
            FetchFailure::Connection { .. } => "connection",
            FetchFailure::Decode { .. } => "decode",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            FetchFailure::Timeout { message }
            | FetchFailure::NotFound { message, .. }
            | FetchFailure::HttpStatus { message, .. }
            | FetchFailure::Connection { message }
            | FetchFailure::Decode { message } => message,
        }
    }

    /// A definite "not found" answer is final; everything else may be
    /// transient.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchFailure::NotFound { .. })
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind(), self.message())
    }
}

impl std::error::Error for FetchFailure {}

/// Raw text retrieved for a publisher and the URL that served it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fetched {
    pub url: String,
    pub text: String,
}

impl Fetched {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }
}

pub type FetchOutcome = Result<Fetched, FetchFailure>;

// ---------------------------------------------------------------------------
// Per-publisher result
// ---------------------------------------------------------------------------

/// Same (ad system, account) in master and publisher under different
/// relationships.
///
/// Field order gives the reporting order: by master record, then publisher
/// record.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationshipConflict {
    pub master: Record,
    pub publisher: Record,
}

impl fmt::Display for RelationshipConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "master '{}' vs publisher '{}'",
            self.master, self.publisher
        )
    }
}

/// A publisher line that could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedLine {
    pub line_no: usize,
    pub text: String,
    pub reason: MalformedReason,
}

impl MalformedLine {
    pub(crate) fn from_other(line: &OtherLine) -> Option<Self> {
        line.malformed_reason().map(|reason| Self {
            line_no: line.line_no,
            text: line.text.clone(),
            reason: reason.clone(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub status: PublisherStatus,
    /// In master, absent from the publisher. Carries master certification ids.
    pub missing: Vec<Record>,
    /// In the publisher, absent from master. Informational only.
    pub extra: Vec<Record>,
    pub conflicts: Vec<RelationshipConflict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FetchFailure>,
    #[serde(default)]
    pub publisher_record_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub malformed: Vec<MalformedLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl ReconciliationResult {
    pub(crate) fn empty(status: PublisherStatus) -> Self {
        Self {
            status,
            missing: Vec::new(),
            extra: Vec::new(),
            conflicts: Vec::new(),
            failure_reason: None,
            publisher_record_count: 0,
            malformed: Vec::new(),
            source_url: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publisher_defaults_and_normalization() {
        let p = Publisher::new("  Studio-A.Example ").with_name("").with_path("ads/app-ads.txt");
        assert_eq!(p.domain, "studio-a.example");
        assert_eq!(p.name, "studio-a.example");
        assert_eq!(p.app_ads_path, "/ads/app-ads.txt");
        assert_eq!(p.url("https"), "https://studio-a.example/ads/app-ads.txt");
        assert_eq!(Publisher::new("x.io").with_path(" ").app_ads_path, "/app-ads.txt");
    }

    #[test]
    fn status_serializes_screaming() {
        let v = serde_json::to_value(PublisherStatus::MissingRecords).unwrap();
        assert_eq!(v, "MISSING_RECORDS");
        assert_eq!(PublisherStatus::ParseError.to_string(), "PARSE_ERROR");
    }

    #[test]
    fn only_not_found_is_final() {
        let nf = FetchFailure::NotFound {
            status: 404,
            message: "gone".to_string(),
        };
        assert!(!nf.is_retryable());
        assert_eq!(nf.to_string(), "not_found: gone");
        assert!(FetchFailure::HttpStatus {
            status: 503,
            message: "busy".to_string()
        }
        .is_retryable());
    }
}
