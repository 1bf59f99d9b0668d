//! Cluster client capability trait.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{TopicOffsets, TopicPartitionMetadata, TopicWatermarks};
use crate::config::OffsetBackend;
use crate::Result;

/// The cluster operations the checks consume.
///
/// Implementations own the wire protocol and connection handling; the
/// checks only ever read through this interface.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Reload cluster metadata.
    ///
    /// Fails with [`crate::KafkaError::ClusterUnavailable`] when the cluster is
    /// temporarily unreachable. No topic list is passed so that a refresh
    /// can never auto-create a topic on the broker.
    async fn refresh_metadata(&self) -> Result<()>;

    /// Topic directory as of the last refresh.
    fn topic_partitions(&self) -> TopicPartitionMetadata;

    /// Committed offsets of `group` for `topics` from a single backend.
    ///
    /// With `raise_on_error` missing topics and partitions fail the call,
    /// otherwise they are left out of the result.
    async fn fetch_consumer_offsets(
        &self,
        group: &str,
        topics: &[String],
        raise_on_error: bool,
        backend: OffsetBackend,
    ) -> Result<TopicOffsets>;

    /// High and low watermarks for `topics`.
    async fn fetch_watermarks(
        &self,
        topics: &[String],
        raise_on_error: bool,
    ) -> Result<TopicWatermarks>;
}

/// Refresh client metadata, retrying exactly once if the cluster is unavailable.
///
/// A just-elected or recovering cluster frequently rejects the first
/// metadata request and accepts the next one. A second failure is returned
/// to the caller.
pub async fn refresh_metadata<C>(client: &C) -> Result<()>
where
    C: ClusterClient + ?Sized,
{
    match client.refresh_metadata().await {
        Err(e) if e.is_cluster_unavailable() => {
            warn!("Metadata refresh failed ({}), retrying once", e);
            client.refresh_metadata().await?;
        }
        other => other?,
    }

    debug!("Refreshed cluster metadata");
    Ok(())
}
