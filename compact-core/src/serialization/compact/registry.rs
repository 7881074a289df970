//! Local schema registry shared by serialization and replication.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{CompactError, Result};

use super::{CompactObject, Schema, SchemaResolver, SchemaWriter};

/// Whether a schema has been acknowledged by every cluster member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    /// Known locally only, either fetched from the cluster or not yet sent.
    LocalOnly,
    /// Acknowledged by every member of the cluster.
    Replicated,
}

#[derive(Debug)]
struct Entry {
    schema: Arc<Schema>,
    state: SchemaState,
}

#[derive(Debug, Default)]
struct Inner {
    by_id: HashMap<i64, Entry>,
    by_type: HashMap<TypeId, Arc<Schema>>,
}

/// Thread-safe registry of schemas keyed by id and by originating type.
///
/// Entries are only ever added or promoted to [`SchemaState::Replicated`];
/// nothing is removed for the lifetime of the registry.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    inner: RwLock<Inner>,
}

fn check_collision(existing: &Schema, incoming: &Schema) -> Result<()> {
    if existing != incoming {
        return Err(CompactError::SchemaIdCollision {
            schema_id: incoming.schema_id(),
            existing: existing.type_name().to_string(),
            incoming: incoming.type_name().to_string(),
        });
    }
    Ok(())
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the schema with the given id, if known.
    pub fn get(&self, schema_id: i64) -> Option<Arc<Schema>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.by_id.get(&schema_id).map(|e| Arc::clone(&e.schema))
    }

    /// Returns the replicated schema bound to a Rust type, if any.
    pub fn schema_for_type(&self, type_id: TypeId) -> Option<Arc<Schema>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.by_type.get(&type_id).cloned()
    }

    /// Stores a schema fetched from the cluster.
    ///
    /// The schema stays `LocalOnly`: it came from the cluster but nothing
    /// here proves that every member holds it. Returns the stored instance,
    /// which is the existing one if the id was already known.
    pub fn register_fetched(&self, schema: Schema) -> Result<Arc<Schema>> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = inner.by_id.get(&schema.schema_id()) {
            check_collision(&entry.schema, &schema)?;
            return Ok(Arc::clone(&entry.schema));
        }
        let schema = Arc::new(schema);
        inner.by_id.insert(
            schema.schema_id(),
            Entry {
                schema: Arc::clone(&schema),
                state: SchemaState::LocalOnly,
            },
        );
        Ok(schema)
    }

    /// Records that every cluster member acknowledged the schema, and binds
    /// it to the originating type if one is given.
    pub fn mark_replicated(&self, schema: Arc<Schema>, type_id: Option<TypeId>) -> Result<()> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(type_id) = type_id {
            if let Some(bound) = inner.by_type.get(&type_id) {
                if bound.schema_id() != schema.schema_id() {
                    return Err(CompactError::SchemaTypeConflict {
                        type_name: schema.type_name().to_string(),
                        existing: bound.schema_id(),
                        incoming: schema.schema_id(),
                    });
                }
            }
        }
        let schema = match inner.by_id.get_mut(&schema.schema_id()) {
            Some(entry) => {
                check_collision(&entry.schema, &schema)?;
                entry.state = SchemaState::Replicated;
                Arc::clone(&entry.schema)
            }
            None => {
                inner.by_id.insert(
                    schema.schema_id(),
                    Entry {
                        schema: Arc::clone(&schema),
                        state: SchemaState::Replicated,
                    },
                );
                schema
            }
        };
        if let Some(type_id) = type_id {
            inner.by_type.insert(type_id, schema);
        }
        Ok(())
    }

    /// Returns true if the schema with the given id is replicated.
    pub fn is_replicated(&self, schema_id: i64) -> bool {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        matches!(
            inner.by_id.get(&schema_id),
            Some(Entry {
                state: SchemaState::Replicated,
                ..
            })
        )
    }

    /// Returns every replicated schema, for re-sending after a reconnect.
    pub fn replicated_schemas(&self) -> Vec<Arc<Schema>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut schemas: Vec<Arc<Schema>> = inner
            .by_id
            .values()
            .filter(|e| e.state == SchemaState::Replicated)
            .map(|e| Arc::clone(&e.schema))
            .collect();
        schemas.sort_by_key(|s| s.schema_id());
        schemas
    }

    /// Number of known schemas, in any state.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SchemaResolver for SchemaRegistry {
    fn schema_for_object(&self, value: &dyn CompactObject) -> Result<Arc<Schema>> {
        let type_id = value.compact_type_id();
        if let Some(schema) = self.schema_for_type(type_id) {
            return Ok(schema);
        }

        let derived = SchemaWriter::schema_of(value)?;
        let known = {
            let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            inner.by_id.get(&derived.schema_id()).map(|e| (Arc::clone(&e.schema), e.state))
        };
        match known {
            Some((schema, SchemaState::Replicated)) => {
                check_collision(&schema, &derived)?;
                self.mark_replicated(Arc::clone(&schema), Some(type_id))?;
                Ok(schema)
            }
            _ => Err(CompactError::SchemaNotReplicated {
                schema: Arc::new(derived),
                type_name: value.compact_type_name().to_string(),
                type_id,
            }),
        }
    }

    fn schema_by_id(&self, schema_id: i64) -> Result<Arc<Schema>> {
        self.get(schema_id)
            .ok_or(CompactError::SchemaNotFound { schema_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::compact::test_support::{Address, Person};
    use crate::serialization::compact::{FieldDescriptor, FieldKind};

    fn schema(type_name: &str, fields: &[(&str, FieldKind)]) -> Schema {
        Schema::new(
            type_name,
            fields.iter().map(|&(n, k)| FieldDescriptor::new(n, k)),
        )
        .unwrap()
    }

    #[test]
    fn test_unknown_type_signals_not_replicated() {
        let registry = SchemaRegistry::new();
        let err = registry.schema_for_object(&Person::sample()).unwrap_err();
        match err {
            CompactError::SchemaNotReplicated {
                schema, type_name, ..
            } => {
                assert_eq!(type_name, "Person");
                assert_eq!(schema.type_name(), "Person");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_replicated_schema_resolves_and_binds_type() {
        let registry = SchemaRegistry::new();
        let person = Person::sample();
        let derived = Arc::new(SchemaWriter::schema_of(&person).unwrap());
        registry.mark_replicated(Arc::clone(&derived), None).unwrap();
        assert!(registry.schema_for_type(TypeId::of::<Person>()).is_none());

        let resolved = registry.schema_for_object(&person).unwrap();
        assert_eq!(resolved.schema_id(), derived.schema_id());
        assert!(registry.schema_for_type(TypeId::of::<Person>()).is_some());
    }

    #[test]
    fn test_fetched_schema_is_local_only() {
        let registry = SchemaRegistry::new();
        let fetched = registry
            .register_fetched(SchemaWriter::schema_of(&Address::sample()).unwrap())
            .unwrap();
        assert!(!registry.is_replicated(fetched.schema_id()));
        assert!(registry.schema_by_id(fetched.schema_id()).is_ok());
        assert!(matches!(
            registry.schema_for_object(&Address::sample()),
            Err(CompactError::SchemaNotReplicated { .. })
        ));
        assert!(registry.replicated_schemas().is_empty());
    }

    #[test]
    fn test_mark_replicated_promotes_fetched_entry() {
        let registry = SchemaRegistry::new();
        let fetched = registry
            .register_fetched(schema("A", &[("x", FieldKind::Int32)]))
            .unwrap();
        registry.mark_replicated(Arc::clone(&fetched), None).unwrap();
        assert!(registry.is_replicated(fetched.schema_id()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.replicated_schemas().len(), 1);
    }

    #[test]
    fn test_register_fetched_is_idempotent() {
        let registry = SchemaRegistry::new();
        let first = registry
            .register_fetched(schema("A", &[("x", FieldKind::Int32)]))
            .unwrap();
        let second = registry
            .register_fetched(schema("A", &[("x", FieldKind::Int32)]))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_schema_by_id_missing() {
        let registry = SchemaRegistry::new();
        assert!(matches!(
            registry.schema_by_id(5),
            Err(CompactError::SchemaNotFound { schema_id: 5 })
        ));
    }

    #[test]
    fn test_id_reused_by_another_schema_collides_on_fetch() {
        let registry = SchemaRegistry::new();
        let a = schema("A", &[("x", FieldKind::Int32)]);
        let id = a.schema_id();
        registry.register_fetched(a).unwrap();

        let b = schema("B", &[("y", FieldKind::String)]).with_schema_id(id);
        let err = registry.register_fetched(b).unwrap_err();
        match err {
            CompactError::SchemaIdCollision {
                schema_id,
                existing,
                incoming,
            } => {
                assert_eq!(schema_id, id);
                assert_eq!(existing, "A");
                assert_eq!(incoming, "B");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(registry.get(id).unwrap().type_name(), "A");
    }

    #[test]
    fn test_id_reused_by_another_schema_collides_on_replication() {
        let registry = SchemaRegistry::new();
        let a = Arc::new(schema("A", &[("x", FieldKind::Int32)]));
        let id = a.schema_id();
        registry.mark_replicated(a, None).unwrap();

        let b = Arc::new(schema("A", &[("x", FieldKind::Int64)]).with_schema_id(id));
        let err = registry.mark_replicated(b, None).unwrap_err();
        assert!(matches!(
            err,
            CompactError::SchemaIdCollision { schema_id, .. } if schema_id == id
        ));
        assert_eq!(registry.get(id).unwrap().field_kind("x"), FieldKind::Int32);
    }

    #[test]
    fn test_type_bound_to_another_schema_conflicts() {
        let registry = SchemaRegistry::new();
        let a = Arc::new(schema("A", &[("x", FieldKind::Int32)]));
        let b = Arc::new(schema("A", &[("y", FieldKind::Int32)]));
        let type_id = TypeId::of::<Person>();
        registry.mark_replicated(a, Some(type_id)).unwrap();
        let err = registry.mark_replicated(b, Some(type_id)).unwrap_err();
        assert!(matches!(err, CompactError::SchemaTypeConflict { .. }));
    }
}
