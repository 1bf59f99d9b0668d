//! Offset reconciliation and watermark assembly tests.

use kafka_check_core::{
    get_consumer_offsets_metadata, get_current_offsets, get_watermark_for_regex,
    get_watermark_for_topic, merge_offsets_metadata, merge_partition_offsets, ClusterClient,
    Error, KafkaError, OffsetBackend, OffsetSnapshot, OffsetStorage, PartitionOffsets,
    ReplicaSet, TopicOffsets,
};

use super::helpers::{connection_failed, topics, two_topic_cluster, ScriptedClient, GROUP};

fn partition_offsets(pairs: &[(i32, i64)]) -> PartitionOffsets {
    pairs.iter().copied().collect()
}

fn topic_offsets(topic: &str, pairs: &[(i32, i64)]) -> TopicOffsets {
    TopicOffsets::from([(topic.to_string(), partition_offsets(pairs))])
}

// ============================================================================
// Merge Primitives
// ============================================================================

#[test]
fn merge_is_associative() {
    let a = partition_offsets(&[(0, 1), (1, 8)]);
    let b = partition_offsets(&[(0, 4), (2, 2)]);
    let c = partition_offsets(&[(1, 3), (2, 9)]);

    let left = merge_partition_offsets([&merge_partition_offsets([&a, &b]), &c]);
    let right = merge_partition_offsets([&a, &merge_partition_offsets([&b, &c])]);

    assert_eq!(left, right);
    assert_eq!(left, partition_offsets(&[(0, 4), (1, 8), (2, 9)]));
}

#[test]
fn merge_offsets_metadata_without_sources() {
    let requested = topics(&["orders", "payments"]);
    let merged = merge_offsets_metadata(&requested, std::iter::empty::<&TopicOffsets>());

    assert_eq!(merged.len(), 2);
    assert!(merged.values().all(|partitions| partitions.is_empty()));
}

// ============================================================================
// Offset Reconciler
// ============================================================================

#[test]
fn invalid_storage_is_rejected_before_fetching() {
    let err = "cassandra".parse::<OffsetStorage>().unwrap_err();
    assert!(matches!(err, Error::InvalidOffsetStorage(ref v) if v == "cassandra"));
    assert!(err.to_string().contains("cassandra"));
}

#[tokio::test]
async fn dual_zookeeper_ahead_wins() {
    let client = ScriptedClient::new(
        Ok(topic_offsets("orders", &[(0, 9), (1, 4)])),
        Ok(topic_offsets("orders", &[(0, 7), (1, 6)])),
    );

    let offsets = get_current_offsets(
        &client,
        GROUP,
        &topics(&["orders"]),
        true,
        OffsetStorage::Dual,
    )
    .await
    .unwrap();

    assert_eq!(offsets["orders"], partition_offsets(&[(0, 9), (1, 6)]));
    assert_eq!(client.calls(), vec!["zookeeper", "kafka"]);
}

#[tokio::test]
async fn dual_coordinator_unavailable_uses_zookeeper_only() {
    let client = ScriptedClient::new(
        Ok(topic_offsets("orders", &[(0, 5)])),
        Err(KafkaError::GroupCoordinatorNotAvailable {
            group: GROUP.to_string(),
        }
        .into()),
    );

    let offsets = get_current_offsets(
        &client,
        GROUP,
        &topics(&["orders"]),
        true,
        OffsetStorage::Dual,
    )
    .await
    .unwrap();

    assert_eq!(offsets["orders"], partition_offsets(&[(0, 5)]));
}

#[tokio::test]
async fn dual_other_kafka_errors_propagate() {
    let client =
        ScriptedClient::new(Ok(topic_offsets("orders", &[(0, 5)])), Err(connection_failed()));

    let err = get_current_offsets(
        &client,
        GROUP,
        &topics(&["orders"]),
        true,
        OffsetStorage::Dual,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Kafka(KafkaError::ConnectionFailed { .. })));
}

#[tokio::test]
async fn dual_zookeeper_errors_propagate_without_kafka_fetch() {
    let client = ScriptedClient::new(Err(connection_failed()), Ok(TopicOffsets::new()));

    let result =
        get_current_offsets(&client, GROUP, &topics(&["orders"]), true, OffsetStorage::Dual).await;

    assert!(result.is_err());
    assert_eq!(client.calls(), vec!["zookeeper"]);
}

// ============================================================================
// Offsets-and-Watermarks Assembler
// ============================================================================

#[tokio::test]
async fn assembles_snapshots_per_topic() {
    let cluster = two_topic_cluster()
        .with_committed_offset(OffsetBackend::Kafka, GROUP, "orders", 0, 60)
        .with_committed_offset(OffsetBackend::Kafka, GROUP, "orders", 1, 200)
        .with_committed_offset(OffsetBackend::Kafka, GROUP, "payments", 0, 30);

    let result = get_consumer_offsets_metadata(
        &cluster,
        GROUP,
        &topics(&["orders", "payments"]),
        true,
        OffsetStorage::Kafka,
    )
    .await
    .unwrap();

    assert_eq!(cluster.refresh_calls(), 1);
    assert_eq!(result.len(), 2);
    assert_eq!(
        result["orders"],
        vec![
            OffsetSnapshot {
                topic: "orders".to_string(),
                partition: 0,
                current: 60,
                highmark: 100,
                lowmark: 0,
            },
            OffsetSnapshot {
                topic: "orders".to_string(),
                partition: 1,
                current: 200,
                highmark: 250,
                lowmark: 50,
            },
        ]
    );
    assert_eq!(result["payments"][0].lag(), 0);
}

#[tokio::test]
async fn assembler_dual_mode_reports_higher_offset() {
    let cluster = two_topic_cluster()
        .with_committed_offset(OffsetBackend::Zookeeper, GROUP, "orders", 0, 5)
        .with_committed_offset(OffsetBackend::Kafka, GROUP, "orders", 0, 7);

    let result = get_consumer_offsets_metadata(
        &cluster,
        GROUP,
        &topics(&["orders"]),
        false,
        OffsetStorage::Dual,
    )
    .await
    .unwrap();

    assert_eq!(result["orders"].len(), 1);
    assert_eq!(result["orders"][0].current, 7);
}

#[tokio::test]
async fn assembler_retries_refresh_once() {
    let cluster = two_topic_cluster()
        .with_committed_offset(OffsetBackend::Kafka, GROUP, "orders", 0, 1)
        .fail_next_refreshes(1);

    let result = get_consumer_offsets_metadata(
        &cluster,
        GROUP,
        &topics(&["orders"]),
        true,
        OffsetStorage::Kafka,
    )
    .await
    .unwrap();

    assert_eq!(cluster.refresh_calls(), 2);
    assert_eq!(result["orders"][0].current, 1);
}

#[tokio::test]
async fn assembler_fails_after_second_refresh_failure() {
    let cluster = two_topic_cluster().fail_next_refreshes(2);

    let err = get_consumer_offsets_metadata(
        &cluster,
        GROUP,
        &topics(&["orders"]),
        true,
        OffsetStorage::Kafka,
    )
    .await
    .unwrap_err();

    assert!(err.is_cluster_unavailable());
    assert!(cluster.offset_fetches().is_empty());
}

#[tokio::test]
async fn missing_watermark_raises_when_requested() {
    let cluster =
        two_topic_cluster().with_committed_offset(OffsetBackend::Kafka, GROUP, "orders", 7, 12);

    let err = get_consumer_offsets_metadata(
        &cluster,
        GROUP,
        &topics(&["orders"]),
        true,
        OffsetStorage::Kafka,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        Error::WatermarkNotFound { ref topic, partition: 7 } if topic == "orders"
    ));
}

#[tokio::test]
async fn missing_watermark_skipped_when_lenient() {
    let cluster = two_topic_cluster()
        .with_committed_offset(OffsetBackend::Kafka, GROUP, "orders", 0, 12)
        .with_committed_offset(OffsetBackend::Kafka, GROUP, "orders", 7, 12);

    let result = get_consumer_offsets_metadata(
        &cluster,
        GROUP,
        &topics(&["orders"]),
        false,
        OffsetStorage::Kafka,
    )
    .await
    .unwrap();

    let partitions: Vec<i32> = result["orders"].iter().map(|s| s.partition).collect();
    assert_eq!(partitions, vec![0]);
}

#[tokio::test]
async fn missing_topic_raises_when_requested() {
    let cluster = two_topic_cluster();

    let err = get_consumer_offsets_metadata(
        &cluster,
        GROUP,
        &topics(&["inventory"]),
        true,
        OffsetStorage::Kafka,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::TopicNotFound(ref t) if t == "inventory"));
}

#[tokio::test]
async fn out_of_range_offsets_are_surfaced_not_rejected() {
    let cluster =
        two_topic_cluster().with_committed_offset(OffsetBackend::Kafka, GROUP, "payments", 0, 3);

    let result = get_consumer_offsets_metadata(
        &cluster,
        GROUP,
        &topics(&["payments"]),
        true,
        OffsetStorage::Kafka,
    )
    .await
    .unwrap();

    let snapshot = &result["payments"][0];
    assert!(!snapshot.is_within_watermarks());
    assert_eq!(snapshot.lag(), 27);
}

// ============================================================================
// Watermark lookups
// ============================================================================

#[tokio::test]
async fn watermark_for_topic() {
    let cluster = two_topic_cluster();

    let watermarks = get_watermark_for_topic(&cluster, "orders").await.unwrap();

    assert_eq!(watermarks.len(), 1);
    assert_eq!(watermarks["orders"][&1].highmark, 250);
    assert_eq!(watermarks["orders"][&1].lowmark, 50);
    assert_eq!(cluster.refresh_calls(), 1);
}

#[tokio::test]
async fn watermark_for_unknown_topic_fails() {
    let cluster = two_topic_cluster();
    let err = get_watermark_for_topic(&cluster, "inventory").await.unwrap_err();
    assert!(matches!(err, Error::TopicNotFound(_)));
}

#[tokio::test]
async fn partition_without_watermark_raises_not_found() {
    let cluster = two_topic_cluster()
        .with_partition("payments", 1, ReplicaSet::new(2, &[2, 3], &[2, 3]))
        .with_committed_offset(OffsetBackend::Kafka, GROUP, "payments", 0, 20);

    let err = get_consumer_offsets_metadata(
        &cluster,
        GROUP,
        &topics(&["payments"]),
        true,
        OffsetStorage::Kafka,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        Error::PartitionNotFound { ref topic, partition: 1 } if topic == "payments"
    ));
}

#[tokio::test]
async fn partition_without_watermark_omitted_when_lenient() {
    let cluster = two_topic_cluster()
        .with_partition("payments", 1, ReplicaSet::new(2, &[2, 3], &[2, 3]))
        .with_committed_offset(OffsetBackend::Kafka, GROUP, "payments", 0, 20);

    let result = get_consumer_offsets_metadata(
        &cluster,
        GROUP,
        &topics(&["payments"]),
        false,
        OffsetStorage::Kafka,
    )
    .await
    .unwrap();
    let watermarks = cluster.fetch_watermarks(&topics(&["payments"]), false).await.unwrap();

    assert_eq!(result["payments"].len(), 1);
    assert_eq!(result["payments"][0].current, 20);
    assert_eq!(watermarks["payments"].keys().collect::<Vec<_>>(), vec![&0]);
}

#[tokio::test]
async fn watermark_for_regex_matches_anywhere() {
    let cluster = two_topic_cluster();

    let watermarks = get_watermark_for_regex(&cluster, "ment").await.unwrap();

    assert_eq!(watermarks.keys().collect::<Vec<_>>(), vec!["payments"]);
    assert_eq!(cluster.watermark_fetches(), vec![vec!["payments".to_string()]]);
}

#[tokio::test]
async fn watermark_for_regex_without_matches() {
    let cluster = two_topic_cluster();

    let watermarks = get_watermark_for_regex(&cluster, "^inventory$").await.unwrap();

    assert!(watermarks.is_empty());
}

#[tokio::test]
async fn watermark_for_invalid_regex() {
    let cluster = two_topic_cluster();

    let err = get_watermark_for_regex(&cluster, "orders(").await.unwrap_err();

    assert!(matches!(err, Error::InvalidTopicPattern { .. }));
    assert_eq!(cluster.refresh_calls(), 0);
}
