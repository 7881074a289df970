//! Async client side of Compact serialization.
//!
//! Wraps the synchronous codec of `compact-core` with the coordination a
//! cluster client needs: schemas are replicated to every member before data
//! that uses them is written, and unknown schemas are fetched before data is
//! read.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use compact_client::{
//!     ClusterMembership, CompactConfig, CompactSerializationService, SchemaInvoker,
//! };
//!
//! async fn connect(
//!     membership: Arc<dyn ClusterMembership>,
//!     invoker: Arc<dyn SchemaInvoker>,
//! ) -> Result<CompactSerializationService, Box<dyn std::error::Error>> {
//!     let config = CompactConfig::builder()
//!         .replication(|r| r.retry_pause(Duration::from_millis(500)).max_attempts(20))
//!         .build()?;
//!     Ok(CompactSerializationService::new(config, membership, invoker))
//! }
//! ```

pub mod cluster;
pub mod config;
pub mod schema_service;
pub mod service;

pub use cluster::{ClusterMembership, Member, SchemaInvoker};
pub use config::{
    CompactConfig, CompactConfigBuilder, ConfigError, SchemaReplicationConfig,
    SchemaReplicationConfigBuilder,
};
pub use schema_service::SchemaService;
pub use service::CompactSerializationService;

pub use compact_core::{CompactError, Result};
