//! Compatibility checks between two versions of a type's schema.

use std::collections::HashSet;

use super::Schema;

/// Result of schema evolution validation.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaEvolutionResult {
    /// Readers of either version can read data of the other; names are
    /// sorted.
    Compatible {
        added_fields: Vec<String>,
        removed_fields: Vec<String>,
    },
    Incompatible {
        reason: String,
    },
}

/// Validator for schema evolution compatibility.
///
/// Two schemas of one type are compatible when every field they share can
/// be read with the accessor of the other version, which allows only a
/// change between a primitive kind and its nullable variant.
#[derive(Debug, Clone, Default)]
pub struct SchemaEvolutionValidator;

impl SchemaEvolutionValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validates that schema evolution from old to new is compatible.
    pub fn validate_evolution(old_schema: &Schema, new_schema: &Schema) -> SchemaEvolutionResult {
        if old_schema.type_name() != new_schema.type_name() {
            return SchemaEvolutionResult::Incompatible {
                reason: format!(
                    "type name mismatch: '{}' vs '{}'",
                    old_schema.type_name(),
                    new_schema.type_name()
                ),
            };
        }

        for field in old_schema.fields() {
            if let Some(new_field) = new_schema.field(field.name()) {
                if !new_field.kind().is_readable_as(field.kind()) {
                    return SchemaEvolutionResult::Incompatible {
                        reason: format!(
                            "incompatible field kind change for '{}': {} -> {}",
                            field.name(),
                            field.kind(),
                            new_field.kind()
                        ),
                    };
                }
            }
        }

        let old_names: HashSet<&str> = old_schema.fields().iter().map(|f| f.name()).collect();
        let new_names: HashSet<&str> = new_schema.fields().iter().map(|f| f.name()).collect();

        let mut added_fields: Vec<String> = new_names
            .difference(&old_names)
            .map(|s| s.to_string())
            .collect();
        added_fields.sort();

        let mut removed_fields: Vec<String> = old_names
            .difference(&new_names)
            .map(|s| s.to_string())
            .collect();
        removed_fields.sort();

        SchemaEvolutionResult::Compatible {
            added_fields,
            removed_fields,
        }
    }
}
