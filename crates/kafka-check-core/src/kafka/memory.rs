//! In-memory cluster for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

use super::{
    ClusterClient, Offset, PartitionId, ReplicaSet, TopicOffsets, TopicPartitionMetadata,
    TopicWatermarks, Watermarks,
};
use crate::config::OffsetBackend;
use crate::error::KafkaError;
use crate::{Error, Result};

/// In-memory cluster snapshot implementing [`ClusterClient`]
///
/// Serves fixed topic metadata, watermarks and committed offsets, and can
/// inject the transient failures the checks are expected to absorb.
pub struct MemoryCluster {
    topics: TopicPartitionMetadata,
    watermarks: TopicWatermarks,
    /// (backend, group) -> committed offsets
    committed: HashMap<(OffsetBackend, String), TopicOffsets>,
    coordinator_available: bool,
    state: Mutex<MemoryClusterState>,
}

#[derive(Default)]
struct MemoryClusterState {
    pending_refresh_failures: u32,
    refresh_calls: u32,
    offset_fetches: Vec<OffsetBackend>,
    watermark_fetches: Vec<Vec<String>>,
}

impl MemoryCluster {
    /// Create an empty cluster with a reachable group coordinator
    pub fn new() -> Self {
        Self {
            topics: TopicPartitionMetadata::new(),
            watermarks: TopicWatermarks::new(),
            committed: HashMap::new(),
            coordinator_available: true,
            state: Mutex::new(MemoryClusterState::default()),
        }
    }

    /// Add a partition to the topic directory
    pub fn with_partition(
        mut self,
        topic: &str,
        partition: PartitionId,
        replicas: ReplicaSet,
    ) -> Self {
        self.topics
            .entry(topic.to_string())
            .or_default()
            .insert(partition, replicas);
        self
    }

    /// Set the watermarks served for a partition
    pub fn with_watermarks(
        mut self,
        topic: &str,
        partition: PartitionId,
        highmark: Offset,
        lowmark: Offset,
    ) -> Self {
        self.watermarks
            .entry(topic.to_string())
            .or_default()
            .insert(partition, Watermarks { highmark, lowmark });
        self
    }

    /// Record a committed offset for a group in one backend
    pub fn with_committed_offset(
        mut self,
        backend: OffsetBackend,
        group: &str,
        topic: &str,
        partition: PartitionId,
        offset: Offset,
    ) -> Self {
        self.committed
            .entry((backend, group.to_string()))
            .or_default()
            .entry(topic.to_string())
            .or_default()
            .insert(partition, offset);
        self
    }

    /// Make Kafka-backend offset fetches fail with `GroupCoordinatorNotAvailable`
    pub fn without_group_coordinator(mut self) -> Self {
        self.coordinator_available = false;
        self
    }

    /// Fail the next `count` metadata refreshes with `ClusterUnavailable`
    pub fn fail_next_refreshes(self, count: u32) -> Self {
        self.state.lock().pending_refresh_failures = count;
        self
    }

    /// Number of metadata refreshes attempted so far
    pub fn refresh_calls(&self) -> u32 {
        self.state.lock().refresh_calls
    }

    /// Backends queried for offsets, in call order
    pub fn offset_fetches(&self) -> Vec<OffsetBackend> {
        self.state.lock().offset_fetches.clone()
    }

    /// Topic lists requested for watermarks, in call order
    pub fn watermark_fetches(&self) -> Vec<Vec<String>> {
        self.state.lock().watermark_fetches.clone()
    }

    fn check_topic(&self, topic: &str, raise_on_error: bool) -> Result<bool> {
        if self.topics.contains_key(topic) {
            Ok(true)
        } else if raise_on_error {
            Err(Error::TopicNotFound(topic.to_string()))
        } else {
            Ok(false)
        }
    }
}

impl Default for MemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClusterClient for MemoryCluster {
    async fn refresh_metadata(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.refresh_calls += 1;
        if state.pending_refresh_failures > 0 {
            state.pending_refresh_failures -= 1;
            return Err(KafkaError::ClusterUnavailable("no broker answered".to_string()).into());
        }
        Ok(())
    }

    fn topic_partitions(&self) -> TopicPartitionMetadata {
        self.topics.clone()
    }

    async fn fetch_consumer_offsets(
        &self,
        group: &str,
        topics: &[String],
        raise_on_error: bool,
        backend: OffsetBackend,
    ) -> Result<TopicOffsets> {
        self.state.lock().offset_fetches.push(backend);

        if backend == OffsetBackend::Kafka && !self.coordinator_available {
            return Err(KafkaError::GroupCoordinatorNotAvailable {
                group: group.to_string(),
            }
            .into());
        }

        let committed = self.committed.get(&(backend, group.to_string()));
        let mut result = TopicOffsets::new();
        for topic in topics {
            if !self.check_topic(topic, raise_on_error)? {
                continue;
            }
            let partitions = committed
                .and_then(|offsets| offsets.get(topic))
                .cloned()
                .unwrap_or_default();
            result.insert(topic.clone(), partitions);
        }
        Ok(result)
    }

    async fn fetch_watermarks(
        &self,
        topics: &[String],
        raise_on_error: bool,
    ) -> Result<TopicWatermarks> {
        self.state.lock().watermark_fetches.push(topics.to_vec());

        let mut result = TopicWatermarks::new();
        for topic in topics {
            if !self.check_topic(topic, raise_on_error)? {
                continue;
            }
            let known = self.watermarks.get(topic);
            let mut partitions: BTreeMap<PartitionId, Watermarks> = BTreeMap::new();
            for &partition in self.topics.get(topic).into_iter().flat_map(BTreeMap::keys) {
                match known.and_then(|w| w.get(&partition)) {
                    Some(marks) => {
                        partitions.insert(partition, *marks);
                    }
                    None if raise_on_error => {
                        return Err(Error::PartitionNotFound {
                            topic: topic.clone(),
                            partition,
                        });
                    }
                    None => {}
                }
            }
            result.insert(topic.clone(), partitions);
        }
        Ok(result)
    }
}
