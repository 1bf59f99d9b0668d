//! Reductions over partition offset maps.

use crate::kafka::{PartitionOffsets, TopicOffsets};

/// Merge the partition offsets of a single topic, keeping the highest
/// offset seen for every partition.
pub fn merge_partition_offsets<'a, I>(sources: I) -> PartitionOffsets
where
    I: IntoIterator<Item = &'a PartitionOffsets>,
{
    let mut merged = PartitionOffsets::new();
    for source in sources {
        for (&partition, &offset) in source {
            let entry = merged.entry(partition).or_insert(0);
            *entry = (*entry).max(offset);
        }
    }
    merged
}

/// Merge `topic -> partition -> offset` responses for the given topics.
///
/// Every requested topic is present in the result; a topic no response
/// knows about maps to an empty partition map.
pub fn merge_offsets_metadata<'a, I>(topics: &[String], responses: I) -> TopicOffsets
where
    I: IntoIterator<Item = &'a TopicOffsets>,
    I::IntoIter: Clone,
{
    let responses = responses.into_iter();
    topics
        .iter()
        .map(|topic| {
            let partitions = merge_partition_offsets(
                responses.clone().filter_map(|response| response.get(topic)),
            );
            (topic.clone(), partitions)
        })
        .collect()
}
