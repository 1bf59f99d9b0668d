//! Point-in-time cluster metadata snapshots.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type BrokerId = i32;
pub type PartitionId = i32;
pub type Offset = i64;

/// partition -> offset
pub type PartitionOffsets = BTreeMap<PartitionId, Offset>;

/// topic -> partition -> offset
pub type TopicOffsets = BTreeMap<String, PartitionOffsets>;

/// topic -> partition -> watermarks
pub type TopicWatermarks = BTreeMap<String, BTreeMap<PartitionId, Watermarks>>;

/// topic -> partition -> replica assignment
pub type TopicPartitionMetadata = BTreeMap<String, BTreeMap<PartitionId, ReplicaSet>>;

/// Broker connection info
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerRecord {
    pub id: BrokerId,
    pub host: String,
    pub port: u16,
}

impl BrokerRecord {
    pub fn new(id: BrokerId, host: impl Into<String>, port: u16) -> Self {
        Self {
            id,
            host: host.into(),
            port,
        }
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Replica assignment of one partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaSet {
    pub leader: BrokerId,
    pub replicas: Vec<BrokerId>,
    /// In-sync replicas, a subset of `replicas`
    pub isr: Vec<BrokerId>,
}

impl ReplicaSet {
    pub fn new(leader: BrokerId, replicas: &[BrokerId], isr: &[BrokerId]) -> Self {
        Self {
            leader,
            replicas: replicas.to_vec(),
            isr: isr.to_vec(),
        }
    }

    /// Replicas that are not currently in the ISR
    pub fn out_of_sync_replicas(&self) -> impl Iterator<Item = BrokerId> + '_ {
        self.replicas
            .iter()
            .copied()
            .filter(move |broker| !self.isr.contains(broker))
    }
}

/// High and low watermark of a partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermarks {
    /// Latest produced offset
    pub highmark: Offset,
    /// Earliest retained offset
    pub lowmark: Offset,
}

/// A (topic, partition) pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: PartitionId,
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: PartitionId) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.topic, self.partition)
    }
}
