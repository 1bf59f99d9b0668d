//! Error types for the Kafka check core library.

use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Kafka check library.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown offset storage mode
    #[error("Unknown offset storage choice: {0} (expected one of zookeeper, kafka, dual)")]
    InvalidOffsetStorage(String),

    /// Topic selection pattern does not compile
    #[error("Invalid topic pattern {pattern:?}: {source}")]
    InvalidTopicPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Kafka protocol error
    #[error("Kafka error: {0}")]
    Kafka(#[from] KafkaError),

    /// Topic not found
    #[error("Topic not found: {0}")]
    TopicNotFound(String),

    /// Partition not found
    #[error("Partition {partition} not found for topic {topic}")]
    PartitionNotFound { topic: String, partition: i32 },

    /// Committed offset without a matching watermark entry
    #[error("No watermark for {topic}:{partition}")]
    WatermarkNotFound { topic: String, partition: i32 },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the transient "cluster currently unavailable" condition.
    pub fn is_cluster_unavailable(&self) -> bool {
        matches!(self, Error::Kafka(KafkaError::ClusterUnavailable(_)))
    }

    /// True when no group coordinator could be found for the group.
    pub fn is_group_coordinator_unavailable(&self) -> bool {
        matches!(
            self,
            Error::Kafka(KafkaError::GroupCoordinatorNotAvailable { .. })
        )
    }
}

/// Kafka-specific errors
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum KafkaError {
    /// Cluster temporarily unreachable (e.g. during leader election)
    #[error("Kafka cluster unavailable: {0}")]
    ClusterUnavailable(String),

    /// No coordinator for the group, typically because it never committed to Kafka
    #[error("Group coordinator not available for group {group}")]
    GroupCoordinatorNotAvailable { group: String },

    /// Connection failed
    #[error("Failed to connect to broker {broker}: {message}")]
    ConnectionFailed { broker: String, message: String },

    /// Timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
