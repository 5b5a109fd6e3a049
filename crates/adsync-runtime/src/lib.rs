//! adsync-runtime
//!
//! Orchestration around the pure core:
//! - `check`: bounded-parallel fetch + reconcile of a roster into a Report
//! - `update`: master file IO and absorbing partner files
//!
//! No rendering here; artifacts are written by adsync-artifacts.

mod check;
mod update;

pub use check::CheckRun;
pub use update::{
    load_master, partner_files, plan_update, read_partner_lists, write_master, UpdateOutcome,
};
