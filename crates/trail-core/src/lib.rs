//! Core analytics for browsing history.
//!
//! This crate contains the pipeline stages:
//! - Normalization: validating raw export rows into events
//! - Enrichment: domain, category and calendar features per event
//! - Segmentation: splitting the sorted timeline into idle-gap sessions
//! - Aggregation: summary tables for reporting

pub mod aggregate;
pub mod category;
pub mod enrich;
pub mod event;
pub mod normalize;
pub mod pipeline;
pub mod segment;
mod types;

pub use aggregate::{
    CountRow, DomainVisits, SessionLength, SessionStats, ShareRow, Summary, SummaryTable,
};
pub use category::{CategoryRule, CategoryTable, UNCATEGORIZED};
pub use event::{EnrichedEvent, Event, RawRecord, Timestamped};
pub use normalize::{DiscardReason, NormalizeReport};
pub use pipeline::{Analysis, AnalysisConfig, PipelineError, analyze};
pub use segment::{SegmentError, Session, segment};
pub use types::{CategoryMatch, DomainMode, IdleThreshold, ValidationError, parse_timezone};
