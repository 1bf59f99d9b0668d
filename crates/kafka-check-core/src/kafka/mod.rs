//! Cluster data model and the client capabilities the checks depend on.

mod client;
mod memory;
mod metadata;

pub use client::{refresh_metadata, ClusterClient};
pub use memory::MemoryCluster;
pub use metadata::{
    BrokerId, BrokerRecord, Offset, PartitionId, PartitionOffsets, ReplicaSet, TopicOffsets,
    TopicPartition, TopicPartitionMetadata, TopicWatermarks, Watermarks,
};
