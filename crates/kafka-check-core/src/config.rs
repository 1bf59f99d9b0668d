//! Configuration structures for offset and replica health checks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::health::{check_under_replicated, UnderReplicatedReport};
use crate::kafka::{BrokerId, ClusterClient};
use crate::offsets::{get_consumer_offsets_metadata, OffsetSnapshot};
use crate::{Error, Result};

/// A single backend holding consumer group offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetBackend {
    /// Offsets committed to Zookeeper by legacy consumers
    Zookeeper,
    /// Offsets committed to Kafka's internal offsets topic
    Kafka,
}

impl fmt::Display for OffsetBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffsetBackend::Zookeeper => write!(f, "zookeeper"),
            OffsetBackend::Kafka => write!(f, "kafka"),
        }
    }
}

/// Where the authoritative consumer group offsets live
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum OffsetStorage {
    Zookeeper,
    #[default]
    Kafka,
    /// Both backends, reconciled by taking the higher offset
    Dual,
}

impl OffsetStorage {
    /// The backend to query directly, or `None` for dual mode.
    pub fn single_backend(self) -> Option<OffsetBackend> {
        match self {
            OffsetStorage::Zookeeper => Some(OffsetBackend::Zookeeper),
            OffsetStorage::Kafka => Some(OffsetBackend::Kafka),
            OffsetStorage::Dual => None,
        }
    }
}

impl FromStr for OffsetStorage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "zookeeper" => Ok(OffsetStorage::Zookeeper),
            "kafka" => Ok(OffsetStorage::Kafka),
            "dual" => Ok(OffsetStorage::Dual),
            other => Err(Error::InvalidOffsetStorage(other.to_string())),
        }
    }
}

impl TryFrom<String> for OffsetStorage {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for OffsetStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffsetStorage::Zookeeper => write!(f, "zookeeper"),
            OffsetStorage::Kafka => write!(f, "kafka"),
            OffsetStorage::Dual => write!(f, "dual"),
        }
    }
}

/// Configuration for one diagnostic run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Consumer group to inspect
    #[serde(default)]
    pub group: Option<String>,

    /// Topics to collect offsets for
    #[serde(default)]
    pub topics: Vec<String>,

    /// Offset storage mode (zookeeper, kafka or dual)
    #[serde(default)]
    pub offset_storage: OffsetStorage,

    /// Fail on missing topics/partitions instead of skipping them (default: true)
    #[serde(default = "default_raise_on_error")]
    pub raise_on_error: bool,

    /// Minimum number of in-sync replicas per partition (default: 2)
    #[serde(default = "default_min_replication_factor")]
    pub min_replication_factor: usize,

    /// Restrict the under-replication report to this broker
    #[serde(default)]
    pub broker_id: Option<BrokerId>,
}

fn default_raise_on_error() -> bool {
    true
}

fn default_min_replication_factor() -> usize {
    2
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            group: None,
            topics: Vec::new(),
            offset_storage: OffsetStorage::default(),
            raise_on_error: default_raise_on_error(),
            min_replication_factor: default_min_replication_factor(),
            broker_id: None,
        }
    }
}

impl CheckConfig {
    /// Parse a YAML configuration document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: CheckConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.min_replication_factor == 0 {
            return Err(Error::Config(
                "min_replication_factor must be > 0".to_string(),
            ));
        }

        let has_group = self.group.as_deref().is_some_and(|g| !g.is_empty());
        if !self.topics.is_empty() && !has_group {
            return Err(Error::Config(
                "group must be specified when topics are listed".to_string(),
            ));
        }

        Ok(())
    }

    /// Offset snapshots for the configured group and topics
    pub async fn consumer_offsets<C>(
        &self,
        client: &C,
    ) -> Result<BTreeMap<String, Vec<OffsetSnapshot>>>
    where
        C: ClusterClient + ?Sized,
    {
        let group = self
            .group
            .as_deref()
            .filter(|g| !g.is_empty())
            .ok_or_else(|| Error::Config("group is required for offset checks".to_string()))?;

        get_consumer_offsets_metadata(
            client,
            group,
            &self.topics,
            self.raise_on_error,
            self.offset_storage,
        )
        .await
    }

    /// Under-replication report using the configured threshold and broker
    pub async fn under_replicated<C>(&self, client: &C) -> Result<UnderReplicatedReport>
    where
        C: ClusterClient + ?Sized,
    {
        check_under_replicated(client, self.min_replication_factor, self.broker_id).await
    }
}
