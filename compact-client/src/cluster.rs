//! Seam between schema coordination and the cluster invocation layer.

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use compact_core::serialization::Schema;
use compact_core::Result;
use uuid::Uuid;

/// A cluster member as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Member {
    /// Unique identifier of the member.
    pub uuid: Uuid,
    /// Network address of the member.
    pub address: SocketAddr,
}

impl Member {
    /// Creates a new cluster member.
    pub fn new(uuid: Uuid, address: SocketAddr) -> Self {
        Self { uuid, address }
    }

    /// Returns the member's UUID.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the member's address.
    pub fn address(&self) -> SocketAddr {
        self.address
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Member[{}]:{}", self.address, self.uuid)
    }
}

/// Current view of the cluster member list.
pub trait ClusterMembership: Send + Sync {
    /// Returns a snapshot of the current members.
    fn members(&self) -> Vec<Member>;
}

/// Schema messages sent to cluster members.
///
/// Implemented by the invocation layer; each call carries that layer's own
/// timeout and connection error handling.
#[async_trait]
pub trait SchemaInvoker: Send + Sync {
    /// Sends a schema to one member, which distributes it in the cluster.
    ///
    /// Returns the UUIDs of every member known to hold the schema.
    async fn send_schema(&self, member: &Member, schema: Arc<Schema>) -> Result<HashSet<Uuid>>;

    /// Asks one member for the schema with the given id.
    async fn fetch_schema(&self, member: &Member, schema_id: i64) -> Result<Option<Schema>>;

    /// Sends several schemas to one member in a single message.
    async fn send_all_schemas(&self, member: &Member, schemas: Vec<Arc<Schema>>) -> Result<()>;
}
