//! Per-partition offset snapshots combining group offsets and watermarks.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::get_current_offsets;
use crate::config::OffsetStorage;
use crate::kafka::{refresh_metadata, ClusterClient, Offset, PartitionId, TopicWatermarks};
use crate::{Error, Result};

/// Consumer offsets of one topic partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetSnapshot {
    pub topic: String,
    pub partition: PartitionId,
    /// Committed group offset
    pub current: Offset,
    /// High watermark
    pub highmark: Offset,
    /// Low watermark
    pub lowmark: Offset,
}

impl OffsetSnapshot {
    /// Messages between the committed offset and the high watermark.
    ///
    /// Negative if the group is ahead of the high watermark.
    pub fn lag(&self) -> i64 {
        self.highmark.saturating_sub(self.current)
    }

    /// Whether `lowmark <= current <= highmark`
    pub fn is_within_watermarks(&self) -> bool {
        self.lowmark <= self.current && self.current <= self.highmark
    }
}

/// Refresh metadata, then fetch group offsets and watermarks for `topics`.
///
/// Returns one snapshot list per topic present in the group offsets. A
/// partition with a committed offset but no watermark fails the call with
/// [`Error::WatermarkNotFound`] when `raise_on_error` is set, and is
/// skipped with a warning otherwise.
pub async fn get_consumer_offsets_metadata<C>(
    client: &C,
    group: &str,
    topics: &[String],
    raise_on_error: bool,
    offset_storage: OffsetStorage,
) -> Result<BTreeMap<String, Vec<OffsetSnapshot>>>
where
    C: ClusterClient + ?Sized,
{
    refresh_metadata(client).await?;

    let group_offsets =
        get_current_offsets(client, group, topics, raise_on_error, offset_storage).await?;
    let watermarks = client.fetch_watermarks(topics, raise_on_error).await?;

    let mut result = BTreeMap::new();
    for (topic, partitions) in &group_offsets {
        let topic_watermarks = watermarks.get(topic);
        let mut snapshots = Vec::with_capacity(partitions.len());

        for (&partition, &current) in partitions {
            let Some(marks) = topic_watermarks.and_then(|w| w.get(&partition)) else {
                if raise_on_error {
                    return Err(Error::WatermarkNotFound {
                        topic: topic.clone(),
                        partition,
                    });
                }
                warn!(
                    "Skipping {}:{} for group {}: offset {} has no watermark",
                    topic, partition, group, current
                );
                continue;
            };

            let snapshot = OffsetSnapshot {
                topic: topic.clone(),
                partition,
                current,
                highmark: marks.highmark,
                lowmark: marks.lowmark,
            };
            if !snapshot.is_within_watermarks() {
                debug!(
                    "Offset {} of group {} on {}:{} is outside watermarks [{}, {}]",
                    current, group, topic, partition, marks.lowmark, marks.highmark
                );
            }
            snapshots.push(snapshot);
        }

        result.insert(topic.clone(), snapshots);
    }

    Ok(result)
}

/// Refresh metadata, then fetch watermarks for a single topic.
pub async fn get_watermark_for_topic<C>(client: &C, topic: &str) -> Result<TopicWatermarks>
where
    C: ClusterClient + ?Sized,
{
    refresh_metadata(client).await?;
    client.fetch_watermarks(&[topic.to_string()], true).await
}

/// Refresh metadata, then fetch watermarks for every known topic matching `pattern`.
///
/// The pattern may match anywhere in the topic name.
pub async fn get_watermark_for_regex<C>(client: &C, pattern: &str) -> Result<TopicWatermarks>
where
    C: ClusterClient + ?Sized,
{
    let regex = Regex::new(pattern).map_err(|source| Error::InvalidTopicPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    refresh_metadata(client).await?;

    let topics: Vec<String> = client
        .topic_partitions()
        .into_keys()
        .filter(|topic| regex.is_match(topic))
        .collect();
    debug!("Pattern {:?} matched {} topics", pattern, topics.len());

    client.fetch_watermarks(&topics, true).await
}
