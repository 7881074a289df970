//! Client configuration types and builders.

use std::collections::HashSet;
use std::time::Duration;

use compact_core::serialization::{Compact, CompactRegistration};
use compact_core::{ByteOrder, CompactError};

/// Default pause between two schema replication attempts.
const DEFAULT_RETRY_PAUSE: Duration = Duration::from_secs(1);
/// Default maximum number of schema replication attempts.
const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Configuration error returned when validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for CompactError {
    fn from(err: ConfigError) -> Self {
        CompactError::Configuration(err.message)
    }
}

/// Settings of the schema replication loop.
#[derive(Debug, Clone)]
pub struct SchemaReplicationConfig {
    retry_pause: Duration,
    max_attempts: u32,
}

impl SchemaReplicationConfig {
    /// Creates a new replication configuration builder.
    pub fn builder() -> SchemaReplicationConfigBuilder {
        SchemaReplicationConfigBuilder::new()
    }

    /// Returns the pause between two attempts.
    pub fn retry_pause(&self) -> Duration {
        self.retry_pause
    }

    /// Returns the maximum number of sends before giving up.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for SchemaReplicationConfig {
    fn default() -> Self {
        Self {
            retry_pause: DEFAULT_RETRY_PAUSE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Builder for `SchemaReplicationConfig`.
#[derive(Debug, Clone, Default)]
pub struct SchemaReplicationConfigBuilder {
    retry_pause: Option<Duration>,
    max_attempts: Option<u32>,
}

impl SchemaReplicationConfigBuilder {
    /// Creates a new replication configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pause between two attempts.
    pub fn retry_pause(mut self, pause: Duration) -> Self {
        self.retry_pause = Some(pause);
        self
    }

    /// Sets the maximum number of sends before giving up.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Builds the replication configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `max_attempts` is zero.
    pub fn build(self) -> Result<SchemaReplicationConfig, ConfigError> {
        let retry_pause = self.retry_pause.unwrap_or(DEFAULT_RETRY_PAUSE);
        let max_attempts = self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);

        if max_attempts == 0 {
            return Err(ConfigError::new("max_attempts must be at least 1"));
        }

        Ok(SchemaReplicationConfig {
            retry_pause,
            max_attempts,
        })
    }
}

/// Compact serialization configuration.
#[derive(Debug, Clone)]
pub struct CompactConfig {
    byte_order: ByteOrder,
    registrations: Vec<CompactRegistration>,
    replication: SchemaReplicationConfig,
}

impl CompactConfig {
    /// Creates a new compact configuration builder.
    pub fn builder() -> CompactConfigBuilder {
        CompactConfigBuilder::new()
    }

    /// Returns the byte order of serialized data.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Returns the types registered for decoding by type name.
    pub fn registrations(&self) -> &[CompactRegistration] {
        &self.registrations
    }

    /// Returns the replication configuration.
    pub fn replication(&self) -> &SchemaReplicationConfig {
        &self.replication
    }
}

impl Default for CompactConfig {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::default(),
            registrations: Vec::new(),
            replication: SchemaReplicationConfig::default(),
        }
    }
}

/// Builder for `CompactConfig`.
#[derive(Debug, Clone, Default)]
pub struct CompactConfigBuilder {
    byte_order: Option<ByteOrder>,
    registrations: Vec<CompactRegistration>,
    replication: SchemaReplicationConfigBuilder,
}

impl CompactConfigBuilder {
    /// Creates a new compact configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the byte order of serialized data.
    pub fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = Some(byte_order);
        self
    }

    /// Registers a type so data written by it can be decoded without
    /// naming the type at the call site.
    pub fn register<T: Compact + Default>(mut self) -> Self {
        self.registrations.push(CompactRegistration::of::<T>());
        self
    }

    /// Configures replication settings using a builder function.
    pub fn replication<F>(mut self, f: F) -> Self
    where
        F: FnOnce(SchemaReplicationConfigBuilder) -> SchemaReplicationConfigBuilder,
    {
        self.replication = f(self.replication);
        self
    }

    /// Builds the compact configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - two registered types share a compact type name
    /// - the replication configuration is invalid
    pub fn build(self) -> Result<CompactConfig, ConfigError> {
        let mut names = HashSet::new();
        for registration in &self.registrations {
            if !names.insert(registration.type_name()) {
                return Err(ConfigError::new(format!(
                    "type name '{}' is registered more than once",
                    registration.type_name()
                )));
            }
        }

        let replication = self.replication.build()?;

        Ok(CompactConfig {
            byte_order: self.byte_order.unwrap_or_default(),
            registrations: self.registrations,
            replication,
        })
    }
}
