//! Consumer group offset reconciliation and watermark snapshots.

mod merge;
mod reconcile;
mod watermarks;

pub use merge::{merge_offsets_metadata, merge_partition_offsets};
pub use reconcile::{get_current_offsets, FetchOutcome};
pub use watermarks::{
    get_consumer_offsets_metadata, get_watermark_for_regex, get_watermark_for_topic,
    OffsetSnapshot,
};
