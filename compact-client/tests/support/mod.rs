//! In-memory cluster double and sample types for the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use compact_client::{
    ClusterMembership, CompactConfig, CompactSerializationService, Member, SchemaInvoker,
};
use compact_core::serialization::{
    Compact, CompactReader, CompactReaderExt, CompactWriter, CompactWriterExt, Schema,
};
use compact_core::Result;

/// A cluster whose last member may lag behind: it only acknowledges schemas
/// from the given send onwards, or never.
pub struct FakeCluster {
    members: Vec<Member>,
    schemas: Mutex<HashMap<i64, Schema>>,
    bulk_sends: Mutex<Vec<Vec<i64>>>,
    sends: AtomicU32,
    fetches: AtomicU32,
    last_member_acks_from: Option<u32>,
}

impl FakeCluster {
    pub fn new(member_count: u16) -> Self {
        Self::lagging(member_count, Some(1))
    }

    pub fn lagging(member_count: u16, last_member_acks_from: Option<u32>) -> Self {
        let members = (0..member_count)
            .map(|i| {
                let address: SocketAddr = format!("127.0.0.1:{}", 5701 + i).parse().unwrap();
                Member::new(Uuid::new_v4(), address)
            })
            .collect();
        Self {
            members,
            schemas: Mutex::new(HashMap::new()),
            bulk_sends: Mutex::new(Vec::new()),
            sends: AtomicU32::new(0),
            fetches: AtomicU32::new(0),
            last_member_acks_from,
        }
    }

    pub fn sends(&self) -> u32 {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn knows(&self, schema_id: i64) -> bool {
        self.schemas.lock().unwrap().contains_key(&schema_id)
    }

    pub fn bulk_sends(&self) -> Vec<Vec<i64>> {
        self.bulk_sends.lock().unwrap().clone()
    }

    pub fn service(self: &Arc<Self>, config: CompactConfig) -> CompactSerializationService {
        CompactSerializationService::new(config, Arc::clone(self) as _, Arc::clone(self) as _)
    }
}

impl ClusterMembership for FakeCluster {
    fn members(&self) -> Vec<Member> {
        self.members.clone()
    }
}

#[async_trait]
impl SchemaInvoker for FakeCluster {
    async fn send_schema(&self, _member: &Member, schema: Arc<Schema>) -> Result<HashSet<Uuid>> {
        let attempt = self.sends.fetch_add(1, Ordering::SeqCst) + 1;
        self.schemas
            .lock()
            .unwrap()
            .insert(schema.schema_id(), Schema::clone(&schema));

        let last = self.members.len() - 1;
        let last_acks = matches!(self.last_member_acks_from, Some(from) if attempt >= from);
        Ok(self
            .members
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != last || last_acks)
            .map(|(_, m)| m.uuid)
            .collect())
    }

    async fn fetch_schema(&self, _member: &Member, schema_id: i64) -> Result<Option<Schema>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.schemas.lock().unwrap().get(&schema_id).cloned())
    }

    async fn send_all_schemas(&self, _member: &Member, schemas: Vec<Arc<Schema>>) -> Result<()> {
        let mut ids = Vec::with_capacity(schemas.len());
        let mut store = self.schemas.lock().unwrap();
        for schema in schemas {
            ids.push(schema.schema_id());
            store.insert(schema.schema_id(), Schema::clone(&schema));
        }
        self.bulk_sends.lock().unwrap().push(ids);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub name: Option<String>,
    pub age: i32,
}

impl Person {
    pub fn new(name: &str, age: i32) -> Self {
        Self {
            name: Some(name.to_string()),
            age,
        }
    }
}

impl Compact for Person {
    fn get_type_name() -> &'static str {
        "Person"
    }

    fn write(&self, writer: &mut dyn CompactWriter) -> Result<()> {
        writer.write_string("name", self.name.as_deref())?;
        writer.write_int32("age", self.age)
    }

    fn read(&mut self, reader: &mut dyn CompactReader) -> Result<()> {
        self.name = reader.read_string("name")?;
        self.age = reader.read_int32("age")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub city: Option<String>,
}

impl Compact for Address {
    fn get_type_name() -> &'static str {
        "Address"
    }

    fn write(&self, writer: &mut dyn CompactWriter) -> Result<()> {
        writer.write_string("city", self.city.as_deref())
    }

    fn read(&mut self, reader: &mut dyn CompactReader) -> Result<()> {
        self.city = reader.read_string("city")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Team {
    pub lead: Option<Person>,
    pub members: Option<Vec<Option<Person>>>,
}

impl Compact for Team {
    fn get_type_name() -> &'static str {
        "Team"
    }

    fn write(&self, writer: &mut dyn CompactWriter) -> Result<()> {
        writer.write_compact("lead", self.lead.as_ref())?;
        writer.write_array_of_compact("members", self.members.as_deref())
    }

    fn read(&mut self, reader: &mut dyn CompactReader) -> Result<()> {
        self.lead = reader.read_compact("lead")?;
        self.members = reader.read_array_of_compact("members")?;
        Ok(())
    }
}
