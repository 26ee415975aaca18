use std::fmt;

use serde::{Deserialize, Serialize};

/// Service type. Drives `topology::classify_layer` below.
///
/// ```yaml
/// type: SPRING_BOOT
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    SpringBoot,
    ExpressJs,
    FastApi,
    DotNet,
    Go,
    NextJs,
    ReactSpa,
    Flutter,
    Gateway,
    Database,
    Cache,
    Broker,
    Worker,
    Mcp,
    Library,
    Cli,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceLifecycle {
    Active,
    Inactive,
    Deprecated,
    Archived,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceType::SpringBoot => "SPRING_BOOT",
            ServiceType::ExpressJs => "EXPRESS_JS",
            ServiceType::FastApi => "FAST_API",
            ServiceType::DotNet => "DOT_NET",
            ServiceType::Go => "GO",
            ServiceType::NextJs => "NEXT_JS",
            ServiceType::ReactSpa => "REACT_SPA",
            ServiceType::Flutter => "FLUTTER",
            ServiceType::Gateway => "GATEWAY",
            ServiceType::Database => "DATABASE",
            ServiceType::Cache => "CACHE",
            ServiceType::Broker => "BROKER",
            ServiceType::Worker => "WORKER",
            ServiceType::Mcp => "MCP",
            ServiceType::Library => "LIBRARY",
            ServiceType::Cli => "CLI",
            ServiceType::Other => "OTHER",
        };
        f.write_str(s)
    }
}

impl Default for ServiceLifecycle {
    fn default() -> Self {
        ServiceLifecycle::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Up,
    Down,
    Degraded,
    Unknown,
}

impl Default for HealthStatus {
    fn default() -> Self {
        HealthStatus::Unknown
    }
}

/// Port type. Governs which `PortRange` an auto-allocation searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortType {
    HttpApi,
    Database,
    Redis,
    Kafka,
    KafkaInternal,
    Zookeeper,
    Grpc,
    WebSocket,
    Debug,
    Actuator,
    FrontendDev,
    Custom,
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PortType::HttpApi => "HTTP_API",
            PortType::Database => "DATABASE",
            PortType::Redis => "REDIS",
            PortType::Kafka => "KAFKA",
            PortType::KafkaInternal => "KAFKA_INTERNAL",
            PortType::Zookeeper => "ZOOKEEPER",
            PortType::Grpc => "GRPC",
            PortType::WebSocket => "WEB_SOCKET",
            PortType::Debug => "DEBUG",
            PortType::Actuator => "ACTUATOR",
            PortType::FrontendDev => "FRONTEND_DEV",
            PortType::Custom => "CUSTOM",
        };
        f.write_str(s)
    }
}

impl PortType {
    /// The twelve default ranges `seed-default-ranges` persists.
    pub fn all() -> [PortType; 12] {
        [
            PortType::HttpApi,
            PortType::Database,
            PortType::Redis,
            PortType::Kafka,
            PortType::KafkaInternal,
            PortType::Zookeeper,
            PortType::Grpc,
            PortType::WebSocket,
            PortType::Debug,
            PortType::Actuator,
            PortType::FrontendDev,
            PortType::Custom,
        ]
    }

    /// Default `[start, end]` bounds for a freshly seeded team, loosely
    /// spaced the way a hand-maintained port map would be.
    pub fn default_range(self) -> (u32, u32) {
        match self {
            PortType::HttpApi => (8080, 8199),
            PortType::Database => (5432, 5499),
            PortType::Redis => (6379, 6399),
            PortType::Kafka => (9092, 9099),
            PortType::KafkaInternal => (9192, 9199),
            PortType::Zookeeper => (2181, 2189),
            PortType::Grpc => (9090, 9091),
            PortType::WebSocket => (8400, 8449),
            PortType::Debug => (5005, 5099),
            PortType::Actuator => (8500, 8549),
            PortType::FrontendDev => (3000, 3099),
            PortType::Custom => (9500, 9599),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DependencyType {
    HttpRest,
    Grpc,
    KafkaTopic,
    DatabaseShared,
    RedisCache,
    MessageQueue,
    FileShare,
    Other,
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DependencyType::HttpRest => "HTTP_REST",
            DependencyType::Grpc => "GRPC",
            DependencyType::KafkaTopic => "KAFKA_TOPIC",
            DependencyType::DatabaseShared => "DATABASE_SHARED",
            DependencyType::RedisCache => "REDIS_CACHE",
            DependencyType::MessageQueue => "MESSAGE_QUEUE",
            DependencyType::FileShare => "FILE_SHARE",
            DependencyType::Other => "OTHER",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    DockerVolume,
    DockerNetwork,
    S3Bucket,
    Queue,
    SecretStore,
    DnsRecord,
    Other,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceType::DockerVolume => "DOCKER_VOLUME",
            ResourceType::DockerNetwork => "DOCKER_NETWORK",
            ResourceType::S3Bucket => "S3_BUCKET",
            ResourceType::Queue => "QUEUE",
            ResourceType::SecretStore => "SECRET_STORE",
            ResourceType::DnsRecord => "DNS_RECORD",
            ResourceType::Other => "OTHER",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigSource {
    Manual,
    AutoGenerated,
    Inherited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolutionCategory {
    Platform,
    Product,
    Internal,
    Experimental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolutionStatus {
    Active,
    Planned,
    Deprecated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Core,
    Supporting,
    Infrastructure,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateType {
    DockerCompose,
    ApplicationYml,
    ClaudeCodeHeader,
    EnvFile,
}
