//! Replica health checks.
//!
//! Finds, per broker, the partitions it replicates while missing from the
//! ISR, and reports whether the cluster meets a minimum in-sync replica
//! count.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::kafka::{
    refresh_metadata, BrokerId, BrokerRecord, ClusterClient, TopicPartition,
    TopicPartitionMetadata,
};
use crate::Result;

/// Outcome of a check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// No partition is below the required in-sync replica count
    #[default]
    Healthy,
    /// At least one partition is under-replicated
    Critical,
}

/// Result of an under-replication check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnderReplicatedReport {
    /// Overall status
    pub status: HealthStatus,
    /// Required in-sync replicas per partition
    pub min_replication: usize,
    /// Broker the report was restricted to, if any
    pub broker_id: Option<BrokerId>,
    /// Broker -> partitions it should replicate but is out of sync for
    pub under_replicated: BTreeMap<BrokerId, Vec<TopicPartition>>,
    /// Distinct under-replicated partitions
    pub partition_count: usize,
    /// Check timestamp (epoch ms)
    pub checked_at: i64,
}

impl UnderReplicatedReport {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl std::fmt::Display for UnderReplicatedReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            HealthStatus::Healthy => write!(f, "OK: ")?,
            HealthStatus::Critical => write!(f, "CRITICAL: ")?,
        }
        writeln!(
            f,
            "{} under replicated partitions (min in-sync replicas: {})",
            self.partition_count, self.min_replication
        )?;
        for (broker, partitions) in &self.under_replicated {
            let names: Vec<String> = partitions.iter().map(ToString::to_string).collect();
            writeln!(f, "  broker {}: {}", broker, names.join(", "))?;
        }
        Ok(())
    }
}

/// Map each broker to the partitions it replicates but is missing from
/// the ISR of, for partitions with fewer than `min_replication` in-sync
/// replicas.
///
/// Partitions meeting the threshold are never flagged, even if some of
/// their replicas are out of sync. The order of each broker's list is
/// unspecified.
pub fn process_topic_partition_metadata(
    metadata: &TopicPartitionMetadata,
    min_replication: usize,
) -> BTreeMap<BrokerId, Vec<TopicPartition>> {
    let mut result: BTreeMap<BrokerId, Vec<TopicPartition>> = BTreeMap::new();

    for (topic, partitions) in metadata {
        for (&partition, replicas) in partitions {
            if replicas.isr.len() >= min_replication {
                continue;
            }
            for broker in replicas.out_of_sync_replicas() {
                result
                    .entry(broker)
                    .or_default()
                    .push(TopicPartition::new(topic.clone(), partition));
            }
        }
    }

    result
}

/// Render brokers as a comma separated `host:port` list, in ascending broker id order.
pub fn prepare_host_list(brokers: &BTreeMap<BrokerId, BrokerRecord>) -> String {
    brokers
        .values()
        .map(BrokerRecord::address)
        .collect::<Vec<_>>()
        .join(",")
}

/// Refresh metadata and report partitions below `min_replication` in-sync replicas.
///
/// With `broker_id` set only that broker's partitions are reported.
pub async fn check_under_replicated<C>(
    client: &C,
    min_replication: usize,
    broker_id: Option<BrokerId>,
) -> Result<UnderReplicatedReport>
where
    C: ClusterClient + ?Sized,
{
    refresh_metadata(client).await?;

    let metadata = client.topic_partitions();
    let mut under_replicated = process_topic_partition_metadata(&metadata, min_replication);
    if let Some(id) = broker_id {
        under_replicated.retain(|broker, _| *broker == id);
    }

    let partition_count = under_replicated
        .values()
        .flatten()
        .collect::<BTreeSet<_>>()
        .len();
    let status = if partition_count == 0 {
        HealthStatus::Healthy
    } else {
        HealthStatus::Critical
    };

    match status {
        HealthStatus::Healthy => info!(
            "No under replicated partitions across {} topics",
            metadata.len()
        ),
        HealthStatus::Critical => warn!(
            "{} under replicated partitions on {} brokers",
            partition_count,
            under_replicated.len()
        ),
    }
    debug!("Checked with min_replication={}", min_replication);

    Ok(UnderReplicatedReport {
        status,
        min_replication,
        broker_id,
        under_replicated,
        partition_count,
        checked_at: chrono::Utc::now().timestamp_millis(),
    })
}
