//! Benchmarks for Compact encoding and decoding.

use std::sync::Arc;

use compact_core::serialization::{
    Compact, CompactReader, CompactSerializer, CompactWriter, SchemaRegistry, SchemaWriter,
};
use compact_core::Result;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

#[derive(Debug, Default, Clone)]
struct Order {
    id: i64,
    customer: Option<String>,
    quantity: i32,
    express: bool,
    prices: Option<Vec<f64>>,
    notes: Option<Vec<Option<String>>>,
}

impl Compact for Order {
    fn get_type_name() -> &'static str {
        "Order"
    }

    fn write(&self, writer: &mut dyn CompactWriter) -> Result<()> {
        writer.write_int64("id", self.id)?;
        writer.write_string("customer", self.customer.as_deref())?;
        writer.write_int32("quantity", self.quantity)?;
        writer.write_boolean("express", self.express)?;
        writer.write_array_of_float64("prices", self.prices.as_deref())?;
        writer.write_array_of_string("notes", self.notes.as_deref())
    }

    fn read(&mut self, reader: &mut dyn CompactReader) -> Result<()> {
        self.id = reader.read_int64("id")?;
        self.customer = reader.read_string("customer")?;
        self.quantity = reader.read_int32("quantity")?;
        self.express = reader.read_boolean("express")?;
        self.prices = reader.read_array_of_float64("prices")?;
        self.notes = reader.read_array_of_string("notes")?;
        Ok(())
    }
}

fn order(items: usize) -> Order {
    Order {
        id: 42,
        customer: Some("benchmark-customer".to_string()),
        quantity: items as i32,
        express: true,
        prices: Some((0..items).map(|i| i as f64 * 1.5).collect()),
        notes: Some((0..items).map(|i| (i % 3 != 0).then(|| format!("note-{}", i))).collect()),
    }
}

fn serializer() -> CompactSerializer {
    let registry = SchemaRegistry::new();
    let schema = SchemaWriter::schema_of(&Order::default()).unwrap();
    registry
        .mark_replicated(Arc::new(schema), Some(std::any::TypeId::of::<Order>()))
        .unwrap();
    CompactSerializer::new(Arc::new(registry))
}

fn bench_serialize(c: &mut Criterion) {
    let serializer = serializer();
    let mut group = c.benchmark_group("compact_serialize");

    for items in [1, 16, 256] {
        let value = order(items);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("items", items), &value, |b, v| {
            b.iter(|| black_box(serializer.serialize(v).unwrap()))
        });
    }

    group.finish();
}

fn bench_deserialize(c: &mut Criterion) {
    let serializer = serializer();
    let mut group = c.benchmark_group("compact_deserialize");

    for items in [1, 16, 256] {
        let bytes = serializer.serialize(&order(items)).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("items", items), &bytes, |b, data| {
            b.iter(|| black_box(serializer.deserialize::<Order>(data).unwrap()))
        });
    }

    group.finish();
}

fn bench_generic_record(c: &mut Criterion) {
    let serializer = serializer();
    let bytes = serializer.serialize(&order(16)).unwrap();

    c.bench_function("compact_to_generic_record", |b| {
        b.iter(|| black_box(serializer.to_generic_record(&bytes).unwrap()))
    });
}

fn bench_schema_of(c: &mut Criterion) {
    let value = order(16);
    c.bench_function("compact_schema_of", |b| {
        b.iter(|| black_box(SchemaWriter::schema_of(&value).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_serialize,
    bench_deserialize,
    bench_generic_record,
    bench_schema_of
);
criterion_main!(benches);
