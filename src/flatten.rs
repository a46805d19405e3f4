//! Expand a nested record schema into one ordered list of leaf fields.
//!
//! Each leaf keeps the path of field names from the root and derives two
//! spellings from it: a flag name (`database.pool_size` → `database-pool-size`)
//! and an env key (`DATABASE_POOL_SIZE`). Both come from the same join, so
//! they can never disagree about which field they name.
//!
//! Traversal is depth-first in declaration order. A record that nests itself,
//! directly or through a chain, is an unsupported field type rather than an
//! endless recursion, and two leaves whose flag names collide are rejected
//! with both paths.
//!
//! A leaf below a nested record with a default takes its fallback from that
//! default instance; the innermost defaulted ancestor wins.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::BoostError;
use crate::registry::SchemaRegistry;
use crate::schema::{FieldDescriptor, RecordSchema};
use crate::types::{FieldType, RecordRef};

/// One leaf field after flattening.
#[derive(Debug, Clone)]
pub struct FlatField {
    path: Vec<&'static str>,
    flag_name: String,
    env_key: String,
    descriptor: Arc<FieldDescriptor>,
    default: Option<Value>,
}

impl FlatField {
    fn new(
        path: Vec<&'static str>,
        descriptor: Arc<FieldDescriptor>,
        inherited: Option<&Value>,
    ) -> Self {
        let default = inherited
            .and_then(|parent| parent.get(descriptor.name()))
            .or_else(|| descriptor.default_value())
            .cloned();
        FlatField {
            flag_name: join_path(&path, '-', str::to_lowercase),
            env_key: join_path(&path, '_', str::to_uppercase),
            path,
            descriptor,
            default,
        }
    }

    /// Field names from the record root down to this leaf.
    pub fn path(&self) -> &[&'static str] {
        &self.path
    }

    /// Dotted form of the path, e.g. `database.pool_size`.
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }

    /// Flag-style flat name, e.g. `database-pool-size`.
    pub fn flag_name(&self) -> &str {
        &self.flag_name
    }

    /// The flat name as a long option, e.g. `--database-pool-size`.
    pub fn flag(&self) -> String {
        format!("--{}", self.flag_name)
    }

    /// Unprefixed env-style name, e.g. `DATABASE_POOL_SIZE`.
    pub fn env_key(&self) -> &str {
        &self.env_key
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    #[cfg(feature = "clap")]
    pub(crate) fn shared_descriptor(&self) -> Arc<FieldDescriptor> {
        Arc::clone(&self.descriptor)
    }

    pub fn declared_type(&self) -> &FieldType {
        self.descriptor.declared_type()
    }

    /// Fallback when no source supplies a value: the enclosing record's
    /// default if one covers this leaf, else the leaf's own default.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// No fallback and not Optional: some source must supply it.
    pub fn is_required(&self) -> bool {
        self.default.is_none() && !self.declared_type().is_optional()
    }
}

/// Join path segments with `sep`, normalizing `-`/`_` inside segments to the
/// same separator so `pool_size` and `pool-size` spell one name.
fn join_path(path: &[&str], sep: char, case: fn(&str) -> String) -> String {
    let segments: Vec<String> = path
        .iter()
        .map(|segment| case(&segment.replace(['-', '_'], &sep.to_string())))
        .collect();
    segments.join(&sep.to_string())
}

/// All leaf fields of one record type, in depth-first declaration order.
#[derive(Debug)]
pub struct FlatSchema {
    record: &'static str,
    fields: Vec<FlatField>,
}

impl FlatSchema {
    pub fn record_name(&self) -> &'static str {
        self.record
    }

    pub fn fields(&self) -> &[FlatField] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FlatField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a leaf by its flag-style flat name.
    pub fn get(&self, flag_name: &str) -> Option<&FlatField> {
        self.fields.iter().find(|f| f.flag_name == flag_name)
    }
}

impl<'a> IntoIterator for &'a FlatSchema {
    type Item = &'a FlatField;
    type IntoIter = std::slice::Iter<'a, FlatField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Flatten `root`, pulling nested schemas through `registry`.
pub fn flatten(registry: &SchemaRegistry, root: &RecordRef) -> Result<FlatSchema, BoostError> {
    let schema = registry.schema_of(root, &[])?;
    let mut fields = Vec::new();
    let mut prefix = Vec::new();
    let mut stack = vec![root.type_id];
    walk(registry, &schema, None, &mut prefix, &mut stack, &mut fields)?;
    check_conflicts(&fields)?;
    Ok(FlatSchema {
        record: root.type_name,
        fields,
    })
}

fn walk(
    registry: &SchemaRegistry,
    schema: &RecordSchema,
    inherited: Option<&Value>,
    prefix: &mut Vec<&'static str>,
    stack: &mut Vec<TypeId>,
    out: &mut Vec<FlatField>,
) -> Result<(), BoostError> {
    for field in schema.fields() {
        prefix.push(field.name());
        match field.declared_type() {
            FieldType::Record(nested) => {
                if stack.contains(&nested.type_id) {
                    return Err(BoostError::UnsupportedFieldType {
                        path: prefix.join("."),
                        reason: format!("record {} nests itself", nested.type_name),
                    });
                }
                let nested_schema = registry.schema_of(nested, prefix)?;
                let nested_default = field
                    .default_value()
                    .or_else(|| inherited.and_then(|parent| parent.get(field.name())));
                stack.push(nested.type_id);
                walk(registry, &nested_schema, nested_default, prefix, stack, out)?;
                stack.pop();
            }
            _ => out.push(FlatField::new(prefix.clone(), Arc::clone(field), inherited)),
        }
        prefix.pop();
    }
    Ok(())
}

fn check_conflicts(fields: &[FlatField]) -> Result<(), BoostError> {
    let mut seen: HashMap<&str, &FlatField> = HashMap::new();
    for field in fields {
        if let Some(existing) = seen.insert(&field.flag_name, field) {
            return Err(BoostError::FieldNameConflict {
                name: field.flag_name.clone(),
                first: existing.dotted_path(),
                second: field.dotted_path(),
            });
        }
    }
    Ok(())
}
