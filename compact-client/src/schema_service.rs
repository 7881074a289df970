//! Schema replication and lookup against the cluster.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use compact_core::serialization::{Schema, SchemaRegistry};
use compact_core::{CompactError, Result};
use rand::seq::SliceRandom;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::cluster::{ClusterMembership, Member, SchemaInvoker};
use crate::config::SchemaReplicationConfig;

/// Makes schemas known to the cluster and fetches unknown ones from it.
///
/// A schema is only marked replicated once a single send is acknowledged by
/// every member of the current member list. Replication of one schema is
/// serialized within the process, different schemas replicate concurrently.
pub struct SchemaService {
    registry: Arc<SchemaRegistry>,
    membership: Arc<dyn ClusterMembership>,
    invoker: Arc<dyn SchemaInvoker>,
    config: SchemaReplicationConfig,
    in_flight: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
    shutdown: CancellationToken,
}

impl SchemaService {
    /// Creates a new schema service.
    pub fn new(
        registry: Arc<SchemaRegistry>,
        membership: Arc<dyn ClusterMembership>,
        invoker: Arc<dyn SchemaInvoker>,
        config: SchemaReplicationConfig,
    ) -> Self {
        Self {
            registry,
            membership,
            invoker,
            config,
            in_flight: Mutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Returns the local schema registry.
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Returns the replication configuration.
    pub fn config(&self) -> &SchemaReplicationConfig {
        &self.config
    }

    /// Replicates a schema to every cluster member and binds it to the
    /// originating type.
    ///
    /// # Errors
    ///
    /// - `SchemaReplicationFailed` when `max_attempts` sends did not reach
    ///   every member
    /// - `ClientShutdown` when the service is shut down meanwhile
    /// - any error of the invocation layer, unchanged
    #[instrument(
        name = "schema_service.replicate",
        skip(self, schema, type_id),
        fields(schema_id = schema.schema_id(), type_name = %schema.type_name())
    )]
    pub async fn replicate(&self, schema: Arc<Schema>, type_id: Option<TypeId>) -> Result<()> {
        let schema_id = schema.schema_id();
        let lock = self.lock_for(schema_id);
        let result = {
            let _guard = lock.lock().await;
            self.replicate_locked(schema, type_id).await
        };
        self.release(schema_id, lock);
        result
    }

    async fn replicate_locked(&self, schema: Arc<Schema>, type_id: Option<TypeId>) -> Result<()> {
        if self.registry.is_replicated(schema.schema_id()) {
            tracing::debug!("schema already replicated");
            return self.registry.mark_replicated(schema, type_id);
        }

        let max_attempts = self.config.max_attempts();
        for attempt in 1..=max_attempts {
            if self.shutdown.is_cancelled() {
                return Err(CompactError::ClientShutdown);
            }

            let member = self.random_member()?;
            tracing::debug!(attempt, member = %member, "sending schema");
            let acknowledged = self
                .invoker
                .send_schema(&member, Arc::clone(&schema))
                .await?;

            let members = self.membership.members();
            let missing = members
                .iter()
                .filter(|m| !acknowledged.contains(&m.uuid))
                .count();
            if missing == 0 {
                self.registry.mark_replicated(Arc::clone(&schema), type_id)?;
                tracing::debug!(attempt, "schema replicated to every member");
                return Ok(());
            }

            if attempt == max_attempts {
                break;
            }

            tracing::warn!(
                attempt,
                missing,
                pause_ms = self.config.retry_pause().as_millis() as u64,
                "schema is not on every member yet, retrying"
            );
            tokio::select! {
                _ = self.shutdown.cancelled() => return Err(CompactError::ClientShutdown),
                _ = tokio::time::sleep(self.config.retry_pause()) => {}
            }
        }

        tracing::error!(attempts = max_attempts, "schema replication exhausted");
        Err(CompactError::SchemaReplicationFailed {
            schema_id: schema.schema_id(),
            type_name: schema.type_name().to_string(),
            attempts: max_attempts,
        })
    }

    /// Fetches a schema from the cluster and stores it locally.
    ///
    /// # Errors
    ///
    /// Fails when no member knows the schema; retrying cannot help then.
    #[instrument(name = "schema_service.fetch", skip(self))]
    pub async fn fetch_schema(&self, schema_id: i64) -> Result<Arc<Schema>> {
        if let Some(schema) = self.registry.get(schema_id) {
            return Ok(schema);
        }
        if self.shutdown.is_cancelled() {
            return Err(CompactError::ClientShutdown);
        }

        let member = self.random_member()?;
        tracing::debug!(member = %member, "fetching schema");
        match self.invoker.fetch_schema(&member, schema_id).await? {
            Some(schema) if schema.schema_id() == schema_id => {
                let schema = self.registry.register_fetched(schema)?;
                tracing::debug!(type_name = %schema.type_name(), "schema fetched");
                Ok(schema)
            }
            Some(schema) => Err(CompactError::Serialization(format!(
                "member {} returned schema {} when asked for schema {}",
                member,
                schema.schema_id(),
                schema_id
            ))),
            None => {
                tracing::error!("schema is not known to the cluster");
                Err(CompactError::Serialization(format!(
                    "the schema {} cannot be found in the cluster",
                    schema_id
                )))
            }
        }
    }

    /// Sends every replicated schema to the cluster in one message.
    ///
    /// Called after connecting to a cluster that may have lost its schemas,
    /// so that data written earlier stays readable there.
    #[instrument(name = "schema_service.send_all", skip(self))]
    pub async fn send_all_schemas(&self) -> Result<()> {
        let schemas = self.registry.replicated_schemas();
        if schemas.is_empty() {
            tracing::debug!("there is no schema to send to the cluster");
            return Ok(());
        }
        let member = self.random_member()?;
        tracing::debug!(count = schemas.len(), member = %member, "sending all schemas");
        self.invoker.send_all_schemas(&member, schemas).await
    }

    /// Cancels every in-flight replication and rejects new work.
    pub fn shutdown(&self) {
        tracing::debug!("schema service shutting down");
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn lock_for(&self, schema_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(in_flight.entry(schema_id).or_default())
    }

    /// Forgets the lock of a schema once nobody else is waiting on it.
    fn release(&self, schema_id: i64, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference is held by the map and one by `lock`.
        if Arc::strong_count(&lock) == 2 {
            in_flight.remove(&schema_id);
        }
    }

    fn in_flight_count(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn random_member(&self) -> Result<Member> {
        let members = self.membership.members();
        members
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| CompactError::Connection("no cluster member is available".to_string()))
    }
}

impl std::fmt::Debug for SchemaService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaService")
            .field("schemas", &self.registry.len())
            .field("config", &self.config)
            .field("in_flight", &self.in_flight_count())
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::net::SocketAddr;
    use std::time::Duration;

    use async_trait::async_trait;
    use compact_core::serialization::{FieldDescriptor, FieldKind};
    use uuid::Uuid;

    struct SingleMember {
        member: Member,
    }

    impl ClusterMembership for SingleMember {
        fn members(&self) -> Vec<Member> {
            vec![self.member.clone()]
        }
    }

    #[async_trait]
    impl SchemaInvoker for SingleMember {
        async fn send_schema(&self, _member: &Member, _schema: Arc<Schema>) -> Result<HashSet<Uuid>> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(HashSet::from([self.member.uuid]))
        }

        async fn fetch_schema(&self, _member: &Member, _schema_id: i64) -> Result<Option<Schema>> {
            Ok(None)
        }

        async fn send_all_schemas(&self, _member: &Member, _schemas: Vec<Arc<Schema>>) -> Result<()> {
            Ok(())
        }
    }

    fn service() -> SchemaService {
        let address: SocketAddr = "127.0.0.1:5701".parse().unwrap();
        let cluster = Arc::new(SingleMember {
            member: Member::new(Uuid::new_v4(), address),
        });
        SchemaService::new(
            Arc::new(SchemaRegistry::new()),
            cluster.clone(),
            cluster,
            SchemaReplicationConfig::default(),
        )
    }

    fn schema(name: &str) -> Arc<Schema> {
        Arc::new(Schema::new(name, [FieldDescriptor::new("x", FieldKind::Int32)]).unwrap())
    }

    #[tokio::test]
    async fn test_lock_is_dropped_after_replication() {
        let service = service();
        let schema = schema("A");
        service.replicate(Arc::clone(&schema), None).await.unwrap();
        assert_eq!(service.in_flight_count(), 0);
        assert!(service.registry().is_replicated(schema.schema_id()));
    }

    #[tokio::test]
    async fn test_lock_is_dropped_after_concurrent_replications() {
        let service = service();
        let a = schema("A");
        let b = schema("B");
        let (r1, r2, r3) = tokio::join!(
            service.replicate(Arc::clone(&a), None),
            service.replicate(Arc::clone(&a), None),
            service.replicate(Arc::clone(&b), None),
        );
        r1.unwrap();
        r2.unwrap();
        r3.unwrap();
        assert_eq!(service.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_lock_is_dropped_after_failure() {
        let service = service();
        service.shutdown();
        let err = service.replicate(schema("A"), None).await.unwrap_err();
        assert!(matches!(err, CompactError::ClientShutdown));
        assert_eq!(service.in_flight_count(), 0);
    }
}
