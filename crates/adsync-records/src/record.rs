//! Record model for a single app-ads.txt authorization line.
//!
//! Every raw line maps to exactly one [`LineKind`]. A bad line becomes
//! [`LineKind::Malformed`] with a reason; classification never fails.
//!
//! Canonical text form:
//!
//! ```text
//! <ad system domain>, <publisher account id>, <DIRECT|RESELLER>[, <cert authority id>]
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Relationship
// ---------------------------------------------------------------------------

/// Declared relationship between the publisher and the ad system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Relationship {
    Direct,
    Reseller,
}

impl Relationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Direct => "DIRECT",
            Relationship::Reseller => "RESELLER",
        }
    }

    /// Case-insensitive parse of `DIRECT` / `RESELLER`.
    pub fn parse(s: &str) -> Option<Self> {
        let t = s.trim();
        if t.eq_ignore_ascii_case("DIRECT") {
            Some(Relationship::Direct)
        } else if t.eq_ignore_ascii_case("RESELLER") {
            Some(Relationship::Reseller)
        } else {
            None
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Identity keys
// ---------------------------------------------------------------------------

/// Identity of a record: `(ad system domain, publisher account id, relationship)`.
///
/// Field order matches the canonical total order, so the derived `Ord` is the
/// sort order of a canonical list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub ad_system_domain: String,
    pub publisher_account_id: String,
    pub relationship: Relationship,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.ad_system_domain, self.publisher_account_id, self.relationship
        )
    }
}

/// The `(ad system domain, publisher account id)` pair, ignoring relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountKey {
    pub ad_system_domain: String,
    pub publisher_account_id: String,
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One authorization entry.
///
/// Construct through [`Record::new`] (or parsing) so the domain is always
/// trimmed and lower-cased. The publisher account id is only trimmed; it is
/// compared case-sensitively.
///
/// The derived `Ord` sorts by identity key first, then certification id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RecordFields")]
pub struct Record {
    ad_system_domain: String,
    publisher_account_id: String,
    relationship: Relationship,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    certification_authority_id: Option<String>,
}

#[derive(Deserialize)]
struct RecordFields {
    ad_system_domain: String,
    publisher_account_id: String,
    relationship: Relationship,
    #[serde(default)]
    certification_authority_id: Option<String>,
}

impl From<RecordFields> for Record {
    fn from(f: RecordFields) -> Self {
        let r = Record::new(f.ad_system_domain, f.publisher_account_id, f.relationship);
        match f.certification_authority_id {
            Some(c) => r.with_certification(c),
            None => r,
        }
    }
}

impl Record {
    pub fn new(
        ad_system_domain: impl AsRef<str>,
        publisher_account_id: impl AsRef<str>,
        relationship: Relationship,
    ) -> Self {
        Self {
            ad_system_domain: ad_system_domain.as_ref().trim().to_ascii_lowercase(),
            publisher_account_id: publisher_account_id.as_ref().trim().to_string(),
            relationship,
            certification_authority_id: None,
        }
    }

    /// Attach a certification authority id (trimmed). An empty id is kept as
    /// `Some("")`, which is distinct from absent.
    pub fn with_certification(mut self, cert: impl AsRef<str>) -> Self {
        self.certification_authority_id = Some(cert.as_ref().trim().to_string());
        self
    }

    pub fn ad_system_domain(&self) -> &str {
        &self.ad_system_domain
    }

    pub fn publisher_account_id(&self) -> &str {
        &self.publisher_account_id
    }

    pub fn relationship(&self) -> Relationship {
        self.relationship
    }

    pub fn certification_authority_id(&self) -> Option<&str> {
        self.certification_authority_id.as_deref()
    }

    /// `true` when a non-empty certification authority id is present.
    pub fn has_certification(&self) -> bool {
        self.certification_authority_id
            .as_deref()
            .is_some_and(|c| !c.is_empty())
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            ad_system_domain: self.ad_system_domain.clone(),
            publisher_account_id: self.publisher_account_id.clone(),
            relationship: self.relationship,
        }
    }

    pub fn account(&self) -> AccountKey {
        AccountKey {
            ad_system_domain: self.ad_system_domain.clone(),
            publisher_account_id: self.publisher_account_id.clone(),
        }
    }

    /// `true` when both records share the same identity key.
    pub fn same_key(&self, other: &Record) -> bool {
        self.ad_system_domain == other.ad_system_domain
            && self.publisher_account_id == other.publisher_account_id
            && self.relationship == other.relationship
    }

    /// Canonical single-line form.
    pub fn serialize(&self) -> String {
        let mut out = format!(
            "{}, {}, {}",
            self.ad_system_domain, self.publisher_account_id, self.relationship
        );
        match self.certification_authority_id.as_deref() {
            Some("") => out.push(','),
            Some(cert) => {
                out.push_str(", ");
                out.push_str(cert);
            }
            None => {}
        }
        out
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

// ---------------------------------------------------------------------------
// Line classification
// ---------------------------------------------------------------------------

/// Why a line could not be read as a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MalformedReason {
    /// Not 3 or 4 comma-separated fields.
    FieldCount { found: usize },
    /// A required field was empty.
    EmptyField { field: String },
    /// Domain and account id may not contain whitespace.
    WhitespaceInField { field: String },
    /// Relationship was neither DIRECT nor RESELLER.
    BadRelationship { value: String },
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::FieldCount { found } => {
                write!(f, "expected 3 or 4 comma-separated fields, found {found}")
            }
            MalformedReason::EmptyField { field } => write!(f, "field '{field}' is empty"),
            MalformedReason::WhitespaceInField { field } => {
                write!(f, "field '{field}' contains whitespace")
            }
            MalformedReason::BadRelationship { value } => {
                write!(f, "relationship '{value}' is not DIRECT or RESELLER")
            }
        }
    }
}

impl std::error::Error for MalformedReason {}

/// Classification of one raw line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Record(Record),
    Blank,
    Comment,
    /// IAB variable declaration such as `contact=ads@example.com`.
    Variable { key: String, value: String },
    Malformed(MalformedReason),
}

impl LineKind {
    pub fn is_comment_or_blank(&self) -> bool {
        matches!(self, LineKind::Blank | LineKind::Comment)
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            LineKind::Record(r) => Some(r),
            _ => None,
        }
    }
}

const FIELD_DOMAIN: &str = "ad system domain";
const FIELD_ACCOUNT: &str = "publisher account id";
const FIELD_RELATIONSHIP: &str = "relationship";

/// Classify a raw line.
pub fn parse_line(raw: &str) -> LineKind {
    let line = raw.trim_start_matches('\u{feff}').trim();
    if line.is_empty() {
        return LineKind::Blank;
    }
    if line.starts_with('#') {
        return LineKind::Comment;
    }

    // Inline comment: everything after '#' is ignored.
    let content = match line.find('#') {
        Some(i) => line[..i].trim_end(),
        None => line,
    };

    if !content.contains(',') {
        if let Some((key, value)) = content.split_once('=') {
            let key = key.trim();
            if !key.is_empty() && !key.contains(char::is_whitespace) {
                return LineKind::Variable {
                    key: key.to_string(),
                    value: value.trim().to_string(),
                };
            }
        }
    }

    let mut fields: Vec<&str> = content.split(',').map(str::trim).collect();
    while fields.len() > 4 && fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    if fields.len() < 3 || fields.len() > 4 {
        return LineKind::Malformed(MalformedReason::FieldCount {
            found: fields.iter().filter(|f| !f.is_empty()).count(),
        });
    }

    for (value, name) in [(fields[0], FIELD_DOMAIN), (fields[1], FIELD_ACCOUNT)] {
        if value.is_empty() {
            return LineKind::Malformed(MalformedReason::EmptyField {
                field: name.to_string(),
            });
        }
        if value.contains(char::is_whitespace) {
            return LineKind::Malformed(MalformedReason::WhitespaceInField {
                field: name.to_string(),
            });
        }
    }

    if fields[2].is_empty() {
        return LineKind::Malformed(MalformedReason::EmptyField {
            field: FIELD_RELATIONSHIP.to_string(),
        });
    }
    let Some(relationship) = Relationship::parse(fields[2]) else {
        return LineKind::Malformed(MalformedReason::BadRelationship {
            value: fields[2].to_string(),
        });
    };

    let record = Record::new(fields[0], fields[1], relationship);
    LineKind::Record(match fields.get(3) {
        Some(cert) => record.with_certification(cert),
        None => record,
    })
}

/// Error returned by `Record::from_str` for lines that are not records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseRecordError {
    NotARecord,
    Malformed(MalformedReason),
}

impl fmt::Display for ParseRecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseRecordError::NotARecord => write!(f, "line is a comment, blank or variable"),
            ParseRecordError::Malformed(reason) => write!(f, "malformed record: {reason}"),
        }
    }
}

impl std::error::Error for ParseRecordError {}

impl FromStr for Record {
    type Err = ParseRecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_line(s) {
            LineKind::Record(r) => Ok(r),
            LineKind::Malformed(reason) => Err(ParseRecordError::Malformed(reason)),
            _ => Err(ParseRecordError::NotARecord),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
