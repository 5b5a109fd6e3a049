//! adsync-sellers
//!
//! Structural checks for a sellers.json document, plus a cross-check of its
//! seller ids against the master app-ads.txt.
//!
//! Rules:
//! - No IO. Callers hand over text or an already parsed value.
//! - Errors make the document invalid; warnings never do.
//! - Findings come out in document order.

use std::collections::BTreeSet;
use std::fmt;

use adsync_records::MasterList;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sellers ids listed at most in one cross-check warning.
pub const MAX_LISTED_IDS: usize = 50;

const SELLER_TYPES: [&str; 3] = ["PUBLISHER", "INTERMEDIARY", "BOTH"];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SellersError {
    /// The text is not JSON at all.
    InvalidJson(String),
}

impl fmt::Display for SellersError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SellersError::InvalidJson(msg) => write!(f, "sellers.json is not valid JSON: {msg}"),
        }
    }
}

impl std::error::Error for SellersError {}

pub fn parse_sellers_json(text: &str) -> Result<Value, SellersError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    serde_json::from_str(text).map_err(|e| SellersError::InvalidJson(e.to_string()))
}

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    /// Location in the document, e.g. `sellers[3].seller_id`.
    pub path: String,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
        };
        write!(f, "{tag} {}: {}", self.path, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellersReport {
    pub seller_count: usize,
    pub findings: Vec<Finding>,
}

impl SellersReport {
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> + '_ {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> + '_ {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.findings.push(Finding {
            severity: Severity::Error,
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.findings.push(Finding {
            severity: Severity::Warning,
            path: path.into(),
            message: message.into(),
        });
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate the shape of a parsed sellers.json document.
pub fn validate_sellers(doc: &Value) -> SellersReport {
    let mut report = SellersReport::default();

    let Some(root) = doc.as_object() else {
        report.error("$", "top level must be an object");
        return report;
    };

    match root.get("version") {
        None => report.error("version", "missing required key"),
        Some(Value::String(v)) if v.trim() == "1.0" => {}
        Some(Value::String(v)) => report.warn("version", format!("expected \"1.0\", got {v:?}")),
        Some(_) => report.error("version", "must be a string"),
    }

    if let Some(ids) = root.get("identifiers") {
        validate_identifiers(ids, &mut report);
    }

    match root.get("sellers") {
        None => report.error("sellers", "missing required key"),
        Some(Value::Array(sellers)) => {
            report.seller_count = sellers.len();
            let mut seen: BTreeSet<String> = BTreeSet::new();
            for (i, seller) in sellers.iter().enumerate() {
                validate_seller(i, seller, &mut seen, &mut report);
            }
        }
        Some(_) => report.error("sellers", "must be an array"),
    }

    report
}

fn validate_identifiers(ids: &Value, report: &mut SellersReport) {
    let Some(ids) = ids.as_array() else {
        report.error("identifiers", "must be an array");
        return;
    };
    for (i, id) in ids.iter().enumerate() {
        let path = format!("identifiers[{i}]");
        let Some(obj) = id.as_object() else {
            report.error(path, "must be an object");
            continue;
        };
        for key in ["name", "value"] {
            if text_field(obj, key).map_or(true, |v| v.is_empty()) {
                report.error(format!("{path}.{key}"), "missing or empty");
            }
        }
    }
}

fn validate_seller(i: usize, seller: &Value, seen: &mut BTreeSet<String>, report: &mut SellersReport) {
    let path = format!("sellers[{i}]");
    let Some(obj) = seller.as_object() else {
        report.error(path, "must be an object");
        return;
    };

    match text_field(obj, "seller_id") {
        None => report.error(format!("{path}.seller_id"), "missing required key"),
        Some(id) if id.is_empty() => report.error(format!("{path}.seller_id"), "must not be empty"),
        Some(id) => {
            if !seen.insert(id.clone()) {
                report.error(format!("{path}.seller_id"), format!("duplicate seller_id {id:?}"));
            }
        }
    }

    match text_field(obj, "seller_type") {
        None => report.error(format!("{path}.seller_type"), "missing required key"),
        Some(t) if SELLER_TYPES.contains(&t.to_ascii_uppercase().as_str()) => {}
        Some(t) => report.error(
            format!("{path}.seller_type"),
            format!("must be one of PUBLISHER, INTERMEDIARY or BOTH, got {t:?}"),
        ),
    }

    let mut confidential = false;
    for key in ["is_confidential", "is_passthrough"] {
        let Some(v) = obj.get(key) else { continue };
        match flag(v) {
            Some(on) => {
                if key == "is_confidential" {
                    confidential = on;
                }
            }
            None => report.error(format!("{path}.{key}"), "must be 0 or 1"),
        }
    }

    if !confidential && text_field(obj, "name").map_or(true, |n| n.is_empty()) {
        report.error(format!("{path}.name"), "required unless is_confidential is 1");
    }

    match text_field(obj, "domain") {
        None if !confidential => {
            report.warn(format!("{path}.domain"), "missing for a non-confidential seller")
        }
        None => {}
        Some(d) if d.is_empty() => report.error(format!("{path}.domain"), "must not be empty"),
        Some(d) => {
            let lower = d.to_ascii_lowercase();
            if lower.starts_with("http://") || lower.starts_with("https://") {
                report.warn(format!("{path}.domain"), format!("{d:?} includes a URL scheme"));
            } else if d.chars().any(|c| c.is_whitespace() || c == '/' || c == ':') {
                report.warn(format!("{path}.domain"), format!("{d:?} does not look like a bare domain"));
            }
        }
    }
}

/// A scalar field rendered as trimmed text. Numbers are accepted where
/// strings are expected; null counts as missing.
fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn flag(v: &Value) -> Option<bool> {
    match v {
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim() {
            "0" => Some(false),
            "1" => Some(true),
            _ => None,
        },
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Cross-check
// ---------------------------------------------------------------------------

/// Seller ids in `doc` that no master record for `system_domain` carries as
/// its publisher account id. Sorted and unique.
pub fn missing_seller_ids(doc: &Value, master: &MasterList, system_domain: &str) -> Vec<String> {
    let system_domain = system_domain.trim().to_ascii_lowercase();
    let known: BTreeSet<&str> = master
        .records()
        .filter(|r| r.ad_system_domain() == system_domain)
        .map(|r| r.publisher_account_id())
        .collect();

    let ids: BTreeSet<String> = doc
        .get("sellers")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .filter_map(|obj| text_field(obj, "seller_id"))
        .filter(|id| !id.is_empty() && !known.contains(id.as_str()))
        .collect();
    ids.into_iter().collect()
}

/// Validate, then warn about seller ids the master does not list for
/// `system_domain`.
pub fn check_sellers(doc: &Value, master: &MasterList, system_domain: &str) -> SellersReport {
    let mut report = validate_sellers(doc);
    let missing = missing_seller_ids(doc, master, system_domain);
    if !missing.is_empty() {
        let shown: Vec<&str> = missing.iter().take(MAX_LISTED_IDS).map(String::as_str).collect();
        let more = missing.len().saturating_sub(shown.len());
        let mut message = format!(
            "{} seller_id(s) not found in master records for {}: {}",
            missing.len(),
            system_domain.trim().to_ascii_lowercase(),
            shown.join(", ")
        );
        if more > 0 {
            message.push_str(&format!(" (+{more} more)"));
        }
        report.warn("sellers", message);
    }
    report
}
