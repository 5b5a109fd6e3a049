//! adsync-records
//!
//! Record model and list store for app-ads.txt authorization lines.
//!
//! - `record`: one line, its strict classification and canonical form
//! - `list`: ordered records + preserved non-record lines, canonicalization
//! - `master`: the immutable canonical master list
//! - `update`: absorbing partner lists into the master
//!
//! Deterministic, pure logic. No IO.

pub mod list;
pub mod master;
pub mod record;
pub mod update;

pub use list::{
    CanonicalizeReport, CertConflict, OtherKind, OtherLine, RecordLine, RecordList, Reformatted,
};
pub use master::{MasterList, StructuralError, BEGIN_MARKER, END_MARKER};
pub use record::{
    parse_line, AccountKey, LineKind, MalformedReason, ParseRecordError, Record, RecordKey,
    Relationship,
};
pub use update::{absorb, MasterChange, PartnerList, SourcedLine, SourcedRecord};
