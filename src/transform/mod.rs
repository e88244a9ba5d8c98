//! The in-memory core of the pipeline: feed repair, duration parsing,
//! filtering and enrichment, aggregation and CSV rendering.

pub mod aggregate;
pub mod duration;
pub mod enrich;
pub mod records;
pub mod repair;
pub mod report;

pub use aggregate::aggregate;
pub use duration::{parse_duration, parse_duration_strict, try_parse_duration, DurationMode};
pub use enrich::filter_and_enrich;
pub use records::parse_records;
pub use repair::{repair_in_place, repair_text};
