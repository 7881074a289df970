//! Schema definition and the Compact record layout.

use std::cmp::Reverse;
use std::collections::HashMap;

use crate::error::{CompactError, Result};
use crate::serialization::{DataInput, DataOutput, ObjectDataInput, ObjectDataOutput};

use super::rabin;
use super::FieldKind;

/// Descriptor for a field within a Compact schema.
///
/// Equality only considers the name and the kind; the layout positions are
/// derived from them by [`Schema::new`].
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    index: i32,
    offset: i32,
    bit_offset: i8,
}

impl FieldDescriptor {
    /// Creates a new field descriptor without layout information.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            index: -1,
            offset: -1,
            bit_offset: -1,
        }
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field kind.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Index into the offset table for variable-size fields, -1 otherwise.
    pub fn index(&self) -> i32 {
        self.index
    }

    /// Offset in the fixed region for fixed-size fields, -1 otherwise.
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Bit inside the byte at `offset` for booleans, -1 otherwise.
    pub fn bit_offset(&self) -> i8 {
        self.bit_offset
    }
}

impl PartialEq for FieldDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}

impl Eq for FieldDescriptor {}

/// Schema definition for Compact serialization.
///
/// A schema is fully determined by its type name and the set of
/// `(name, kind)` pairs. Fields are kept sorted by name and the layout is
/// computed once at construction.
#[derive(Debug, Clone)]
pub struct Schema {
    type_name: String,
    fields: Vec<FieldDescriptor>,
    field_indices: HashMap<String, usize>,
    schema_id: i64,
    var_sized_field_count: usize,
    fix_sized_fields_length: usize,
}

impl Schema {
    /// Creates a schema and computes its layout and id.
    ///
    /// Fails on duplicate field names and on kinds that can not be encoded.
    pub fn new(
        type_name: impl Into<String>,
        fields: impl IntoIterator<Item = FieldDescriptor>,
    ) -> Result<Self> {
        let type_name = type_name.into();
        let mut fields: Vec<FieldDescriptor> = fields
            .into_iter()
            .map(|f| FieldDescriptor::new(f.name, f.kind))
            .collect();
        fields.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));

        if let Some(pair) = fields.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(CompactError::DuplicateField {
                field: pair[0].name.clone(),
            });
        }
        if let Some(field) = fields.iter().find(|f| f.kind.is_unsupported()) {
            return Err(CompactError::Serialization(format!(
                "field '{}' of type '{}' has unsupported kind {}",
                field.name, type_name, field.kind
            )));
        }

        let mut fixed: Vec<usize> = Vec::new();
        let mut booleans: Vec<usize> = Vec::new();
        let mut var_sized: Vec<usize> = Vec::new();
        for (i, field) in fields.iter().enumerate() {
            match field.kind.size_in_bytes() {
                Some(0) => booleans.push(i),
                Some(_) => fixed.push(i),
                None => var_sized.push(i),
            }
        }

        fixed.sort_by_key(|&i| Reverse(fields[i].kind.size_in_bytes().unwrap_or(0)));

        let mut offset = 0usize;
        for &i in &fixed {
            fields[i].offset = offset as i32;
            offset += fields[i].kind.size_in_bytes().unwrap_or(0);
        }

        for (n, &i) in booleans.iter().enumerate() {
            fields[i].offset = offset as i32;
            fields[i].bit_offset = (n % 8) as i8;
            if n % 8 == 7 {
                offset += 1;
            }
        }
        if booleans.len() % 8 != 0 {
            offset += 1;
        }

        for (index, &i) in var_sized.iter().enumerate() {
            fields[i].index = index as i32;
        }

        let schema_id = rabin::schema_fingerprint(
            &type_name,
            fields.iter().map(|f| (f.name.as_str(), f.kind)),
        );
        let field_indices = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();

        Ok(Self {
            type_name,
            fields,
            field_indices,
            schema_id,
            var_sized_field_count: var_sized.len(),
            fix_sized_fields_length: offset,
        })
    }

    /// Returns the type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the schema ID (fingerprint).
    pub fn schema_id(&self) -> i64 {
        self.schema_id
    }

    /// Returns the number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns all field descriptors sorted by name.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.field_indices.get(name).map(|&i| &self.fields[i])
    }

    pub(crate) fn field_position(&self, name: &str) -> Option<usize> {
        self.field_indices.get(name).copied()
    }

    /// Returns true if a field with the given name exists.
    pub fn has_field(&self, name: &str) -> bool {
        self.field_indices.contains_key(name)
    }

    /// Returns the kind of a field, or `NotAvailable` if it does not exist.
    pub fn field_kind(&self, name: &str) -> FieldKind {
        self.field(name)
            .map(FieldDescriptor::kind)
            .unwrap_or(FieldKind::NotAvailable)
    }

    pub fn var_sized_field_count(&self) -> usize {
        self.var_sized_field_count
    }

    pub fn fix_sized_fields_length(&self) -> usize {
        self.fix_sized_fields_length
    }

    /// Replaces the fingerprint, so that two different schemas can share an id.
    #[cfg(test)]
    pub(crate) fn with_schema_id(mut self, schema_id: i64) -> Self {
        self.schema_id = schema_id;
        self
    }

    /// Writes the schema definition as sent to and fetched from the cluster.
    pub fn write_data(&self, output: &mut ObjectDataOutput) -> Result<()> {
        output.write_string(&self.type_name)?;
        output.write_int(self.fields.len() as i32)?;
        for field in &self.fields {
            output.write_string(&field.name)?;
            output.write_int(field.kind.id())?;
        }
        Ok(())
    }

    /// Reads a schema definition written by [`Schema::write_data`].
    pub fn read_data(input: &mut ObjectDataInput<'_>) -> Result<Self> {
        let type_name = input.read_string()?;
        let count = input.read_int()?;
        if count < 0 {
            return Err(CompactError::Serialization(format!(
                "invalid field count {} for schema of type '{}'",
                count, type_name
            )));
        }
        let mut fields = Vec::with_capacity((count as usize).min(input.remaining()));
        for _ in 0..count {
            let name = input.read_string()?;
            let kind = FieldKind::from_id(input.read_int()?)?;
            fields.push(FieldDescriptor::new(name, kind));
        }
        Self::new(type_name, fields)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.schema_id == other.schema_id
            && self.type_name == other.type_name
            && self.fields == other.fields
    }
}

impl Eq for Schema {}

impl std::hash::Hash for Schema {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.schema_id.hash(state);
    }
}
