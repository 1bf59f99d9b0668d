//! Kafka Check Core Library
//!
//! This crate provides the read-only diagnostics behind the cluster checks:
//! reconciling consumer group offsets across offset storage backends,
//! assembling offset and watermark snapshots, and finding brokers that
//! are missing from the ISR of the partitions they replicate.

pub mod config;
pub mod error;
pub mod health;
pub mod kafka;
pub mod offsets;

pub use config::{CheckConfig, OffsetBackend, OffsetStorage};
pub use error::{Error, KafkaError, Result};
pub use health::{
    check_under_replicated, prepare_host_list, process_topic_partition_metadata, HealthStatus,
    UnderReplicatedReport,
};
pub use kafka::{
    refresh_metadata, BrokerId, BrokerRecord, ClusterClient, MemoryCluster, Offset,
    PartitionId, PartitionOffsets, ReplicaSet, TopicOffsets, TopicPartition,
    TopicPartitionMetadata, TopicWatermarks, Watermarks,
};
pub use offsets::{
    get_consumer_offsets_metadata, get_current_offsets, get_watermark_for_regex,
    get_watermark_for_topic, merge_offsets_metadata, merge_partition_offsets, FetchOutcome,
    OffsetSnapshot,
};
