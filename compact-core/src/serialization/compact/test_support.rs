//! Compact types shared by the unit tests.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use rust_decimal::Decimal;

use crate::error::Result;

use super::{
    Compact, CompactObject, CompactReader, CompactReaderExt, CompactWriter, CompactWriterExt,
    SchemaRegistry, SchemaWriter,
};

/// Builds a registry in which the schemas of `values` are replicated and
/// bound to their types.
pub(crate) fn replicated_registry(values: &[&dyn CompactObject]) -> SchemaRegistry {
    let registry = SchemaRegistry::new();
    for value in values {
        let schema = SchemaWriter::schema_of(*value).unwrap();
        registry
            .mark_replicated(Arc::new(schema), Some(value.compact_type_id()))
            .unwrap();
    }
    registry
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Person {
    pub name: String,
    pub age: i32,
    pub active: bool,
    pub score: Option<f64>,
}

impl Person {
    pub(crate) fn sample() -> Self {
        Self {
            name: "Ada".to_string(),
            age: 36,
            active: true,
            score: Some(9.5),
        }
    }
}

impl Compact for Person {
    fn get_type_name() -> &'static str {
        "Person"
    }

    fn write(&self, writer: &mut dyn CompactWriter) -> Result<()> {
        writer.write_string("name", Some(&self.name))?;
        writer.write_int32("age", self.age)?;
        writer.write_boolean("active", self.active)?;
        writer.write_nullable_float64("score", self.score)
    }

    fn read(&mut self, reader: &mut dyn CompactReader) -> Result<()> {
        self.name = reader.read_string("name")?.unwrap_or_default();
        self.age = reader.read_int32("age")?;
        self.active = reader.read_boolean("active")?;
        self.score = reader.read_nullable_float64("score")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Address {
    pub street: Option<String>,
    pub number: i16,
}

impl Address {
    pub(crate) fn sample() -> Self {
        Self {
            street: Some("Main Street".to_string()),
            number: 12,
        }
    }
}

impl Compact for Address {
    fn get_type_name() -> &'static str {
        "Address"
    }

    fn write(&self, writer: &mut dyn CompactWriter) -> Result<()> {
        writer.write_string("street", self.street.as_deref())?;
        writer.write_int16("number", self.number)
    }

    fn read(&mut self, reader: &mut dyn CompactReader) -> Result<()> {
        self.street = reader.read_string("street")?;
        self.number = reader.read_int16("number")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Employee {
    pub id: i64,
    pub person: Option<Person>,
    pub team: Option<Vec<Option<Person>>>,
}

impl Employee {
    pub(crate) fn sample() -> Self {
        let colleague = Person {
            name: "Grace".to_string(),
            age: 45,
            active: false,
            score: None,
        };
        Self {
            id: 1001,
            person: Some(Person::sample()),
            team: Some(vec![Some(colleague), None]),
        }
    }
}

impl Compact for Employee {
    fn get_type_name() -> &'static str {
        "Employee"
    }

    fn write(&self, writer: &mut dyn CompactWriter) -> Result<()> {
        writer.write_int64("id", self.id)?;
        writer.write_compact("person", self.person.as_ref())?;
        writer.write_array_of_compact("team", self.team.as_deref())
    }

    fn read(&mut self, reader: &mut dyn CompactReader) -> Result<()> {
        self.id = reader.read_int64("id")?;
        self.person = reader.read_compact("person")?;
        self.team = reader.read_array_of_compact("team")?;
        Ok(())
    }
}

/// One field of every supported kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct AllKinds {
    pub boolean: bool,
    pub int8: i8,
    pub int16: i16,
    pub int32: i32,
    pub int64: i64,
    pub float32: f32,
    pub float64: f64,
    pub string: Option<String>,
    pub decimal: Option<Decimal>,
    pub time: Option<NaiveTime>,
    pub date: Option<NaiveDate>,
    pub timestamp: Option<NaiveDateTime>,
    pub timestamp_tz: Option<DateTime<FixedOffset>>,
    pub compact: Option<Address>,
    pub booleans: Option<Vec<bool>>,
    pub int8s: Option<Vec<i8>>,
    pub int16s: Option<Vec<i16>>,
    pub int32s: Option<Vec<i32>>,
    pub int64s: Option<Vec<i64>>,
    pub float32s: Option<Vec<f32>>,
    pub float64s: Option<Vec<f64>>,
    pub strings: Option<Vec<Option<String>>>,
    pub decimals: Option<Vec<Option<Decimal>>>,
    pub times: Option<Vec<Option<NaiveTime>>>,
    pub dates: Option<Vec<Option<NaiveDate>>>,
    pub timestamps: Option<Vec<Option<NaiveDateTime>>>,
    pub timestamp_tzs: Option<Vec<Option<DateTime<FixedOffset>>>>,
    pub compacts: Option<Vec<Option<Address>>>,
    pub nullable_boolean: Option<bool>,
    pub nullable_int8: Option<i8>,
    pub nullable_int16: Option<i16>,
    pub nullable_int32: Option<i32>,
    pub nullable_int64: Option<i64>,
    pub nullable_float32: Option<f32>,
    pub nullable_float64: Option<f64>,
    pub nullable_booleans: Option<Vec<Option<bool>>>,
    pub nullable_int8s: Option<Vec<Option<i8>>>,
    pub nullable_int16s: Option<Vec<Option<i16>>>,
    pub nullable_int32s: Option<Vec<Option<i32>>>,
    pub nullable_int64s: Option<Vec<Option<i64>>>,
    pub nullable_float32s: Option<Vec<Option<f32>>>,
    pub nullable_float64s: Option<Vec<Option<f64>>>,
}

impl AllKinds {
    pub(crate) fn sample() -> Self {
        let date = NaiveDate::from_ymd_opt(2021, 6, 30).unwrap();
        let time = NaiveTime::from_hms_nano_opt(8, 15, 59, 123_456_789).unwrap();
        let timestamp = NaiveDateTime::new(date, time);
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let timestamp_tz = offset.from_local_datetime(&timestamp).unwrap();
        let decimal = Decimal::from_str("-12345.6789").unwrap();
        Self {
            boolean: true,
            int8: -8,
            int16: 1616,
            int32: -323_232,
            int64: 6_464_646_464,
            float32: 3.25,
            float64: -6.125,
            string: Some("compact".to_string()),
            decimal: Some(decimal),
            time: Some(time),
            date: Some(date),
            timestamp: Some(timestamp),
            timestamp_tz: Some(timestamp_tz),
            compact: Some(Address::sample()),
            booleans: Some(vec![true, false, true, true, false, false, true, false, true]),
            int8s: Some(vec![1, -1]),
            int16s: Some(vec![]),
            int32s: Some(vec![i32::MIN, 0, i32::MAX]),
            int64s: None,
            float32s: Some(vec![0.5]),
            float64s: Some(vec![1.5, 2.5]),
            strings: Some(vec![Some("a".to_string()), None]),
            decimals: Some(vec![None, Some(Decimal::ONE)]),
            times: Some(vec![Some(time)]),
            dates: Some(vec![Some(date), None]),
            timestamps: Some(vec![Some(timestamp)]),
            timestamp_tzs: Some(vec![None, Some(timestamp_tz)]),
            compacts: Some(vec![Some(Address::default()), None, Some(Address::sample())]),
            nullable_boolean: Some(false),
            nullable_int8: None,
            nullable_int16: Some(-16),
            nullable_int32: Some(32),
            nullable_int64: None,
            nullable_float32: Some(-0.25),
            nullable_float64: None,
            nullable_booleans: Some(vec![Some(true), None]),
            nullable_int8s: Some(vec![None]),
            nullable_int16s: Some(vec![Some(7)]),
            nullable_int32s: None,
            nullable_int64s: Some(vec![Some(1), None, Some(3)]),
            nullable_float32s: Some(vec![]),
            nullable_float64s: Some(vec![Some(0.0)]),
        }
    }
}

impl Compact for AllKinds {
    fn get_type_name() -> &'static str {
        "AllKinds"
    }

    fn write(&self, w: &mut dyn CompactWriter) -> Result<()> {
        w.write_boolean("boolean", self.boolean)?;
        w.write_int8("int8", self.int8)?;
        w.write_int16("int16", self.int16)?;
        w.write_int32("int32", self.int32)?;
        w.write_int64("int64", self.int64)?;
        w.write_float32("float32", self.float32)?;
        w.write_float64("float64", self.float64)?;
        w.write_string("string", self.string.as_deref())?;
        w.write_decimal("decimal", self.decimal)?;
        w.write_time("time", self.time)?;
        w.write_date("date", self.date)?;
        w.write_timestamp("timestamp", self.timestamp)?;
        w.write_timestamp_with_timezone("timestamp_tz", self.timestamp_tz)?;
        w.write_compact("compact", self.compact.as_ref())?;
        w.write_array_of_boolean("booleans", self.booleans.as_deref())?;
        w.write_array_of_int8("int8s", self.int8s.as_deref())?;
        w.write_array_of_int16("int16s", self.int16s.as_deref())?;
        w.write_array_of_int32("int32s", self.int32s.as_deref())?;
        w.write_array_of_int64("int64s", self.int64s.as_deref())?;
        w.write_array_of_float32("float32s", self.float32s.as_deref())?;
        w.write_array_of_float64("float64s", self.float64s.as_deref())?;
        w.write_array_of_string("strings", self.strings.as_deref())?;
        w.write_array_of_decimal("decimals", self.decimals.as_deref())?;
        w.write_array_of_time("times", self.times.as_deref())?;
        w.write_array_of_date("dates", self.dates.as_deref())?;
        w.write_array_of_timestamp("timestamps", self.timestamps.as_deref())?;
        w.write_array_of_timestamp_with_timezone("timestamp_tzs", self.timestamp_tzs.as_deref())?;
        w.write_array_of_compact("compacts", self.compacts.as_deref())?;
        w.write_nullable_boolean("nullable_boolean", self.nullable_boolean)?;
        w.write_nullable_int8("nullable_int8", self.nullable_int8)?;
        w.write_nullable_int16("nullable_int16", self.nullable_int16)?;
        w.write_nullable_int32("nullable_int32", self.nullable_int32)?;
        w.write_nullable_int64("nullable_int64", self.nullable_int64)?;
        w.write_nullable_float32("nullable_float32", self.nullable_float32)?;
        w.write_nullable_float64("nullable_float64", self.nullable_float64)?;
        w.write_array_of_nullable_boolean("nullable_booleans", self.nullable_booleans.as_deref())?;
        w.write_array_of_nullable_int8("nullable_int8s", self.nullable_int8s.as_deref())?;
        w.write_array_of_nullable_int16("nullable_int16s", self.nullable_int16s.as_deref())?;
        w.write_array_of_nullable_int32("nullable_int32s", self.nullable_int32s.as_deref())?;
        w.write_array_of_nullable_int64("nullable_int64s", self.nullable_int64s.as_deref())?;
        w.write_array_of_nullable_float32("nullable_float32s", self.nullable_float32s.as_deref())?;
        w.write_array_of_nullable_float64("nullable_float64s", self.nullable_float64s.as_deref())
    }

    fn read(&mut self, r: &mut dyn CompactReader) -> Result<()> {
        self.boolean = r.read_boolean("boolean")?;
        self.int8 = r.read_int8("int8")?;
        self.int16 = r.read_int16("int16")?;
        self.int32 = r.read_int32("int32")?;
        self.int64 = r.read_int64("int64")?;
        self.float32 = r.read_float32("float32")?;
        self.float64 = r.read_float64("float64")?;
        self.string = r.read_string("string")?;
        self.decimal = r.read_decimal("decimal")?;
        self.time = r.read_time("time")?;
        self.date = r.read_date("date")?;
        self.timestamp = r.read_timestamp("timestamp")?;
        self.timestamp_tz = r.read_timestamp_with_timezone("timestamp_tz")?;
        self.compact = r.read_compact("compact")?;
        self.booleans = r.read_array_of_boolean("booleans")?;
        self.int8s = r.read_array_of_int8("int8s")?;
        self.int16s = r.read_array_of_int16("int16s")?;
        self.int32s = r.read_array_of_int32("int32s")?;
        self.int64s = r.read_array_of_int64("int64s")?;
        self.float32s = r.read_array_of_float32("float32s")?;
        self.float64s = r.read_array_of_float64("float64s")?;
        self.strings = r.read_array_of_string("strings")?;
        self.decimals = r.read_array_of_decimal("decimals")?;
        self.times = r.read_array_of_time("times")?;
        self.dates = r.read_array_of_date("dates")?;
        self.timestamps = r.read_array_of_timestamp("timestamps")?;
        self.timestamp_tzs = r.read_array_of_timestamp_with_timezone("timestamp_tzs")?;
        self.compacts = r.read_array_of_compact("compacts")?;
        self.nullable_boolean = r.read_nullable_boolean("nullable_boolean")?;
        self.nullable_int8 = r.read_nullable_int8("nullable_int8")?;
        self.nullable_int16 = r.read_nullable_int16("nullable_int16")?;
        self.nullable_int32 = r.read_nullable_int32("nullable_int32")?;
        self.nullable_int64 = r.read_nullable_int64("nullable_int64")?;
        self.nullable_float32 = r.read_nullable_float32("nullable_float32")?;
        self.nullable_float64 = r.read_nullable_float64("nullable_float64")?;
        self.nullable_booleans = r.read_array_of_nullable_boolean("nullable_booleans")?;
        self.nullable_int8s = r.read_array_of_nullable_int8("nullable_int8s")?;
        self.nullable_int16s = r.read_array_of_nullable_int16("nullable_int16s")?;
        self.nullable_int32s = r.read_array_of_nullable_int32("nullable_int32s")?;
        self.nullable_int64s = r.read_array_of_nullable_int64("nullable_int64s")?;
        self.nullable_float32s = r.read_array_of_nullable_float32("nullable_float32s")?;
        self.nullable_float64s = r.read_array_of_nullable_float64("nullable_float64s")?;
        Ok(())
    }
}
