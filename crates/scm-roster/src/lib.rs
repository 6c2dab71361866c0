//! scm-roster
//!
//! Channel membership reconciliation core.
//!
//! - Cursor pagination with a hard page cap (truncation is reported, not hidden)
//! - Directory normalization (deleted accounts and the system bot are dropped)
//! - Set algebra between a desired email roster and current channel members
//! - Report sections in a fixed order
//!
//! Deterministic logic apart from awaiting the [`RosterSource`] collaborator.
//! No HTTP, no Slack wire types, no credentials.

mod engine;
mod normalizer;
mod pager;
mod report;
mod source;
mod types;

pub use engine::reconcile;
pub use normalizer::{normalize, to_canonical, SYSTEM_BOT_ID};
pub use pager::{fetch_all, Page, Paged, PagerPolicy, DEFAULT_MAX_PAGES};
pub use report::{format, Report, ReportContext, ReportSection, ReportWarning};
pub use source::{run_reconciliation, ReconcileRun, RosterSource, SourceError};
pub use types::*;
