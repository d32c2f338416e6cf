//! Record shaping for transcript segments and session summaries.
//!
//! Callers hand in loosely-typed camelCase fields (usually straight from a
//! JSON payload) and get back the exact row shape the data store expects.
//! Required identifiers are checked here; everything else gets a default.

mod error;
mod summary;
mod timestamp;
mod transcript;

pub use error::{RecordError, RecordResult};
pub use summary::{
    create_summary_update_fields, create_summary_update_fields_at, SummaryFields, SummaryUpdate,
};
pub use timestamp::{format_timestamp, normalize_timestamp, TimestampInput};
pub use transcript::{
    create_transcript_record, create_transcript_record_at, TranscriptFields, TranscriptRecord,
    TranscriptSegment,
};
