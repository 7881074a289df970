//! Compact serialization with transparent schema coordination.

use std::any::Any;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use compact_core::serialization::{Compact, CompactSerializer, GenericRecord, SchemaRegistry};
use compact_core::{CompactError, Result};
use tracing::instrument;

use crate::cluster::{ClusterMembership, SchemaInvoker};
use crate::config::CompactConfig;
use crate::schema_service::SchemaService;

/// Serializes and deserializes Compact values, replicating and fetching
/// schemas as needed.
///
/// The serializer itself never blocks on the cluster: it raises
/// `SchemaNotReplicated` or `SchemaNotFound`, and [`execute`] resolves the
/// signal and runs the operation again from the start.
///
/// [`execute`]: CompactSerializationService::execute
#[derive(Debug)]
pub struct CompactSerializationService {
    serializer: CompactSerializer,
    schemas: SchemaService,
}

impl CompactSerializationService {
    /// Creates a service with an empty schema registry.
    pub fn new(
        config: CompactConfig,
        membership: Arc<dyn ClusterMembership>,
        invoker: Arc<dyn SchemaInvoker>,
    ) -> Self {
        let registry = Arc::new(SchemaRegistry::new());
        let mut serializer =
            CompactSerializer::with_byte_order(Arc::clone(&registry), config.byte_order());
        for registration in config.registrations() {
            serializer.register(*registration);
        }
        let schemas = SchemaService::new(
            registry,
            membership,
            invoker,
            config.replication().clone(),
        );
        Self {
            serializer,
            schemas,
        }
    }

    pub fn serializer(&self) -> &CompactSerializer {
        &self.serializer
    }

    pub fn schema_service(&self) -> &SchemaService {
        &self.schemas
    }

    /// Runs `op` until it completes without a schema signal.
    ///
    /// Each signal is resolved once: a schema that is still reported missing
    /// after it was replicated or fetched fails the operation.
    #[instrument(name = "compact.execute", skip_all)]
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut resolved = HashSet::new();
        loop {
            match op().await {
                Err(CompactError::SchemaNotReplicated {
                    schema,
                    type_name,
                    type_id,
                }) => {
                    if !resolved.insert(schema.schema_id()) {
                        return Err(CompactError::Serialization(format!(
                            "schema {} of type '{}' is still not usable after replication",
                            schema.schema_id(),
                            type_name
                        )));
                    }
                    tracing::debug!(
                        schema_id = schema.schema_id(),
                        type_name = %type_name,
                        "replicating schema before retrying"
                    );
                    self.schemas.replicate(schema, Some(type_id)).await?;
                }
                Err(CompactError::SchemaNotFound { schema_id }) => {
                    if !resolved.insert(schema_id) {
                        return Err(CompactError::SchemaNotFound { schema_id });
                    }
                    tracing::debug!(schema_id, "fetching schema before retrying");
                    self.schemas.fetch_schema(schema_id).await?;
                }
                other => return other,
            }
        }
    }

    /// Serializes a value, replicating its schemas first if needed.
    pub async fn to_data<T: Compact>(&self, value: &T) -> Result<Vec<u8>> {
        self.execute(move || async move { self.serializer.serialize(value) })
            .await
    }

    /// Deserializes data written by `T`, fetching unknown schemas first.
    pub async fn to_object<T: Compact + Default>(&self, data: &[u8]) -> Result<T> {
        self.execute(move || async move { self.serializer.deserialize::<T>(data) })
            .await
    }

    /// Deserializes data into whichever registered type wrote it.
    pub async fn to_object_any(&self, data: &[u8]) -> Result<Box<dyn Any + Send>> {
        self.execute(move || async move { self.serializer.deserialize_any(data) })
            .await
    }

    /// Decodes data into a [`GenericRecord`].
    pub async fn to_generic_record(&self, data: &[u8]) -> Result<GenericRecord> {
        self.execute(move || async move { self.serializer.to_generic_record(data) })
            .await
    }

    /// Re-sends every replicated schema, for use after reconnecting.
    pub async fn send_all_schemas(&self) -> Result<()> {
        self.schemas.send_all_schemas().await
    }

    /// Shuts down schema coordination; pending replications fail.
    pub fn shutdown(&self) {
        self.schemas.shutdown();
    }
}
