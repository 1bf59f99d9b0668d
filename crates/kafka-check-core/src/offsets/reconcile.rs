//! Current offset lookup across the configured offset storage.

use tracing::{debug, info};

use super::merge_offsets_metadata;
use crate::config::{OffsetBackend, OffsetStorage};
use crate::kafka::{ClusterClient, TopicOffsets};
use crate::{Error, Result};

/// Outcome of a best-effort backend fetch
#[derive(Debug)]
pub enum FetchOutcome<T> {
    Ok(T),
    /// The backend has nothing for this group, e.g. no group coordinator
    BackendUnavailable(Error),
    Fatal(Error),
}

impl<T> From<Result<T>> for FetchOutcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => FetchOutcome::Ok(value),
            Err(e) if e.is_group_coordinator_unavailable() => FetchOutcome::BackendUnavailable(e),
            Err(e) => FetchOutcome::Fatal(e),
        }
    }
}

/// Get the current consumer offsets from Zookeeper, Kafka, or both.
pub async fn get_current_offsets<C>(
    client: &C,
    group: &str,
    topics: &[String],
    raise_on_error: bool,
    offset_storage: OffsetStorage,
) -> Result<TopicOffsets>
where
    C: ClusterClient + ?Sized,
{
    match offset_storage.single_backend() {
        Some(backend) => {
            client
                .fetch_consumer_offsets(group, topics, raise_on_error, backend)
                .await
        }
        None => get_current_offsets_dual(client, group, topics).await,
    }
}

/// Fetch from both backends and keep the higher offset per partition.
///
/// Both fetches skip missing topics and partitions. A group that never
/// committed to Kafka has no coordinator; that backend then contributes
/// nothing.
async fn get_current_offsets_dual<C>(
    client: &C,
    group: &str,
    topics: &[String],
) -> Result<TopicOffsets>
where
    C: ClusterClient + ?Sized,
{
    let zk_offsets = client
        .fetch_consumer_offsets(group, topics, false, OffsetBackend::Zookeeper)
        .await?;

    let kafka_result = client
        .fetch_consumer_offsets(group, topics, false, OffsetBackend::Kafka)
        .await;
    let kafka_offsets = match FetchOutcome::from(kafka_result) {
        FetchOutcome::Ok(offsets) => offsets,
        FetchOutcome::BackendUnavailable(e) => {
            info!("No Kafka offsets for group {}: {}", group, e);
            TopicOffsets::new()
        }
        FetchOutcome::Fatal(e) => return Err(e),
    };

    let merged = merge_offsets_metadata(topics, [&zk_offsets, &kafka_offsets]);
    debug!(
        "Merged dual offsets for group {} across {} topics",
        group,
        merged.len()
    );
    Ok(merged)
}
