//! Record declaration: the typed field builder, descriptors and schema
//! validation.
//!
//! A record type describes itself once by implementing [`Record`]:
//!
//! ```ignore
//! #[derive(Deserialize)]
//! struct Server {
//!     host: String,
//!     port: u16,
//!     database: Database,
//! }
//!
//! impl Record for Server {
//!     fn schema() -> RecordSchema {
//!         RecordSchema::builder::<Self>()
//!             .field(Field::<String>::new("host").help("Address to bind"))
//!             .field(Field::<u16>::new("port").default(5432))
//!             .field(Field::<Database>::nested("database"))
//!             .build()
//!     }
//! }
//! ```
//!
//! Field names must match the serde names of the struct's fields: the
//! resolved values are assembled into a JSON object keyed by these names and
//! deserialized into the record.

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::BoostError;
use crate::types::{FieldType, FieldValue, RecordRef};

/// A type whose fields can be resolved from CLI flags, env vars and files.
pub trait Record: DeserializeOwned + 'static {
    fn schema() -> RecordSchema;
}

type Coercer = Box<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;
type Check = fn(&Value) -> Result<(), String>;

/// Static description of one declared field.
pub struct FieldDescriptor {
    name: &'static str,
    declared_type: FieldType,
    default: Option<Result<Value, String>>,
    coercer: Option<Coercer>,
    check: Option<Check>,
    help: Option<String>,
}

impl FieldDescriptor {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declared_type(&self) -> &FieldType {
        &self.declared_type
    }

    pub fn has_default(&self) -> bool {
        matches!(self.default, Some(Ok(_)))
    }

    pub fn default_value(&self) -> Option<&Value> {
        match &self.default {
            Some(Ok(value)) => Some(value),
            _ => None,
        }
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn has_custom_coercer(&self) -> bool {
        self.coercer.is_some()
    }

    /// Neither a default nor an Optional type: some source must supply it.
    pub fn is_required(&self) -> bool {
        !self.has_default() && !self.declared_type.is_optional()
    }

    pub(crate) fn custom_coercer(&self) -> Option<&(dyn Fn(&str) -> Result<Value, String> + Send + Sync)> {
        self.coercer.as_deref()
    }

    /// Confirm a built-in coerced value fits the concrete Rust type
    /// (integer width, unsigned-ness).
    pub(crate) fn check(&self, value: &Value) -> Result<(), String> {
        match self.check {
            Some(check) => check(value),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("default", &self.default)
            .field("custom_coercer", &self.coercer.is_some())
            .field("help", &self.help)
            .finish()
    }
}

fn check_as<T: DeserializeOwned + Serialize>(value: &Value) -> Result<(), String> {
    let typed = T::deserialize(value).map_err(|e| e.to_string())?;
    // Narrowing float casts saturate to infinity, which serializes as null.
    let back = serde_json::to_value(&typed).map_err(|e| e.to_string())?;
    if lost_number(value, &back) {
        return Err("number out of range for the declared type".into());
    }
    Ok(())
}

fn lost_number(before: &Value, after: &Value) -> bool {
    match (before, after) {
        (Value::Number(_), Value::Null) => true,
        (Value::Array(a), Value::Array(b)) => a.iter().zip(b).any(|(x, y)| lost_number(x, y)),
        (Value::Object(a), Value::Object(b)) => a
            .iter()
            .any(|(k, x)| b.get(k).is_some_and(|y| lost_number(x, y))),
        _ => false,
    }
}

/// Typed builder for a [`FieldDescriptor`].
///
/// The type parameter ties defaults and custom parsers to the field's Rust
/// type, so a `Field<u16>` cannot receive a string default.
pub struct Field<T> {
    descriptor: FieldDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FieldValue + DeserializeOwned + Serialize> Field<T> {
    pub fn new(name: &'static str) -> Self {
        Field {
            descriptor: FieldDescriptor {
                name,
                declared_type: T::field_type(),
                default: None,
                coercer: None,
                check: Some(check_as::<T>),
                help: None,
            },
            _marker: PhantomData,
        }
    }
}

impl<T: Serialize> Field<T> {
    /// Value used when no source supplies one.
    ///
    /// On a nested record the value covers every leaf below it: a leaf no
    /// source supplies takes its value from this instance.
    pub fn default(mut self, value: T) -> Self {
        self.descriptor.default = Some(serde_json::to_value(value).map_err(|e| e.to_string()));
        self
    }
}

impl<T: FieldValue + Serialize> Field<T> {
    /// Replace built-in coercion with `parse`, which receives the raw string.
    pub fn parse_with<F, E>(mut self, parse: F) -> Self
    where
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        self.descriptor.coercer = Some(Box::new(move |raw| {
            let value = parse(raw).map_err(|e| e.to_string())?;
            serde_json::to_value(value).map_err(|e| e.to_string())
        }));
        self
    }
}

impl<R: Record> Field<R> {
    pub fn nested(name: &'static str) -> Self {
        Field {
            descriptor: FieldDescriptor {
                name,
                declared_type: FieldType::Record(RecordRef::of::<R>()),
                default: None,
                coercer: None,
                check: None,
                help: None,
            },
            _marker: PhantomData,
        }
    }
}

impl<T> Field<T> {
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.descriptor.help = Some(text.into());
        self
    }
}

impl<T> From<Field<T>> for FieldDescriptor {
    fn from(field: Field<T>) -> Self {
        field.descriptor
    }
}

/// Ordered field descriptors for one record type.
#[derive(Debug)]
pub struct RecordSchema {
    type_name: &'static str,
    fields: Vec<Arc<FieldDescriptor>>,
}

impl RecordSchema {
    pub fn builder<R: ?Sized + 'static>() -> RecordSchemaBuilder {
        RecordSchemaBuilder {
            type_name: std::any::type_name::<R>(),
            fields: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[Arc<FieldDescriptor>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name).map(Arc::as_ref)
    }
}

pub struct RecordSchemaBuilder {
    type_name: &'static str,
    fields: Vec<Arc<FieldDescriptor>>,
}

impl RecordSchemaBuilder {
    pub fn field(mut self, field: impl Into<FieldDescriptor>) -> Self {
        self.fields.push(Arc::new(field.into()));
        self
    }

    pub fn build(self) -> RecordSchema {
        RecordSchema {
            type_name: self.type_name,
            fields: self.fields,
        }
    }
}

const SUPPORTED_TYPES: &str = "supported field types are int, float, str and bool; \
    lists and maps of them or of optional ones; Optional around a scalar; nested records";

/// Check one record's declared fields. Nested records are checked when the
/// flattener reaches them; `prefix` is the path of the record within its root.
pub(crate) fn validate(schema: &RecordSchema, prefix: &[&str]) -> Result<(), BoostError> {
    let mut seen = HashSet::new();
    for field in schema.fields() {
        let path = dotted(prefix, field.name);
        if field.name.is_empty() {
            return Err(BoostError::UnsupportedFieldType {
                path,
                reason: "field name is empty".into(),
            });
        }
        if !seen.insert(field.name) {
            return Err(BoostError::FieldNameConflict {
                name: field.name.to_string(),
                first: path.clone(),
                second: path,
            });
        }
        if let Some(Err(reason)) = &field.default {
            return Err(BoostError::InvalidDefault {
                path,
                reason: reason.clone(),
            });
        }
        if let (FieldType::Record(_), Some(default)) = (&field.declared_type, field.default_value())
            && !default.is_object()
        {
            return Err(BoostError::InvalidDefault {
                path,
                reason: "a nested record default must serialize to a map".into(),
            });
        }
        if field.has_custom_coercer() {
            if let FieldType::Record(_) = field.declared_type {
                return Err(BoostError::UnsupportedFieldType {
                    path,
                    reason: "a nested record cannot have a custom parser".into(),
                });
            }
            continue;
        }
        validate_type(&field.declared_type).map_err(|reason| {
            BoostError::UnsupportedFieldType {
                path,
                reason: format!("{reason}; {SUPPORTED_TYPES}"),
            }
        })?;
    }
    Ok(())
}

fn validate_type(ty: &FieldType) -> Result<(), String> {
    match ty {
        FieldType::Int | FieldType::Float | FieldType::Str | FieldType::Bool => Ok(()),
        FieldType::Record(_) => Ok(()),
        FieldType::Optional(inner) if inner.is_scalar() => Ok(()),
        FieldType::Optional(inner) => Err(format!("{ty} is not supported, {inner} cannot be optional")),
        FieldType::List(item) if item.is_simple() => Ok(()),
        FieldType::List(_) => Err(format!("{ty} is not supported")),
        FieldType::Map(key, value) => {
            if !matches!(**key, FieldType::Str | FieldType::Int) {
                return Err(format!("{ty} is not supported, map keys must be string or integer"));
            }
            if !value.is_simple() {
                return Err(format!("{ty} is not supported"));
            }
            Ok(())
        }
    }
}

pub(crate) fn dotted(prefix: &[&str], name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{name}", prefix.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{AppConfig, BadListConfig, ServerConfig};
    use std::collections::{BTreeMap, HashMap};

    #[test]
    fn builder_keeps_declaration_order() {
        let schema = AppConfig::schema();
        let names: Vec<_> = schema.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["host", "port", "debug", "tags", "database"]);
    }

    #[test]
    fn schema_is_repeatable() {
        let a = AppConfig::schema();
        let b = AppConfig::schema();
        assert_eq!(a.fields().len(), b.fields().len());
        for (x, y) in a.fields().iter().zip(b.fields()) {
            assert_eq!(x.name(), y.name());
            assert_eq!(x.declared_type(), y.declared_type());
            assert_eq!(x.default_value(), y.default_value());
        }
    }

    #[test]
    fn default_is_stored_as_json() {
        let field: FieldDescriptor = Field::<u16>::new("port").default(5432).into();
        assert!(field.has_default());
        assert_eq!(field.default_value(), Some(&Value::from(5432)));
        assert!(!field.is_required());
    }

    #[test]
    fn optional_without_default_is_not_required() {
        let field: FieldDescriptor = Field::<Option<String>>::new("url").into();
        assert!(!field.has_default());
        assert!(!field.is_required());
    }

    #[test]
    fn plain_field_without_default_is_required() {
        let field: FieldDescriptor = Field::<i32>::new("count").into();
        assert!(field.is_required());
    }

    #[test]
    fn help_text_is_kept() {
        let field: FieldDescriptor = Field::<String>::new("host").help("Bind address").into();
        assert_eq!(field.help(), Some("Bind address"));
    }

    #[test]
    fn check_rejects_out_of_range_integer() {
        let field: FieldDescriptor = Field::<u8>::new("level").into();
        assert!(field.check(&Value::from(200)).is_ok());
        assert!(field.check(&Value::from(300)).is_err());
        assert!(field.check(&Value::from(-1)).is_err());
    }

    #[test]
    fn check_rejects_float_beyond_declared_width() {
        let field: FieldDescriptor = Field::<f32>::new("ratio").into();
        assert!(field.check(&Value::from(0.25)).is_ok());
        assert!(field.check(&Value::from(1e300)).is_err());

        let field: FieldDescriptor = Field::<Vec<f32>>::new("ratios").into();
        assert!(field.check(&serde_json::json!([1.0, 1e300])).is_err());
    }

    #[test]
    fn nested_default_is_stored_as_object() {
        let field: FieldDescriptor = Field::<ServerConfig>::nested("db")
            .default(ServerConfig {
                host: "localhost".into(),
                port: 5432,
            })
            .into();
        assert_eq!(
            field.default_value(),
            Some(&serde_json::json!({"host": "localhost", "port": 5432}))
        );
        validate_one(field).unwrap();
    }

    #[test]
    fn custom_parser_output_is_json() {
        let field: FieldDescriptor = Field::<f64>::new("ratio")
            .parse_with(|raw: &str| {
                raw.trim_end_matches('%')
                    .parse::<f64>()
                    .map(|v| v / 100.0)
            })
            .into();
        let coerce = field.custom_coercer().unwrap();
        assert_eq!(coerce("50%").unwrap(), Value::from(0.5));
        assert!(coerce("half").is_err());
    }

    fn validate_one(field: impl Into<FieldDescriptor>) -> Result<(), BoostError> {
        let schema = RecordSchema::builder::<()>().field(field).build();
        validate(&schema, &[])
    }

    #[test]
    fn supported_shapes_validate() {
        validate_one(Field::<i64>::new("a")).unwrap();
        validate_one(Field::<Option<f64>>::new("b")).unwrap();
        validate_one(Field::<Vec<Option<String>>>::new("c")).unwrap();
        validate_one(Field::<HashMap<String, Option<i32>>>::new("d")).unwrap();
        validate_one(Field::<BTreeMap<u32, bool>>::new("e")).unwrap();
    }

    #[test]
    fn nested_list_is_unsupported() {
        let err = validate_one(Field::<Vec<Vec<i32>>>::new("buckets")).unwrap_err();
        assert!(matches!(err, BoostError::UnsupportedFieldType { ref path, .. } if path == "buckets"));
    }

    #[test]
    fn optional_list_is_unsupported() {
        let err = validate_one(Field::<Option<Vec<i32>>>::new("values")).unwrap_err();
        assert!(matches!(err, BoostError::UnsupportedFieldType { .. }));
    }

    #[test]
    fn optional_map_is_unsupported() {
        let err = validate_one(Field::<Option<HashMap<String, i32>>>::new("mapping")).unwrap_err();
        assert!(matches!(err, BoostError::UnsupportedFieldType { .. }));
    }

    #[test]
    fn list_of_maps_is_unsupported() {
        let err = validate_one(Field::<Vec<HashMap<String, i32>>>::new("items")).unwrap_err();
        assert!(matches!(err, BoostError::UnsupportedFieldType { .. }));
    }

    #[test]
    fn map_of_lists_is_unsupported() {
        let err = validate_one(Field::<HashMap<String, Vec<i32>>>::new("data")).unwrap_err();
        assert!(matches!(err, BoostError::UnsupportedFieldType { .. }));
    }

    #[test]
    fn bool_map_key_is_unsupported() {
        let err = validate_one(Field::<HashMap<bool, String>>::new("flags")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("flags"));
        assert!(msg.contains("map keys"));
    }

    #[test]
    fn nested_optional_is_unsupported() {
        let err = validate_one(Field::<Option<Option<i32>>>::new("maybe")).unwrap_err();
        assert!(matches!(err, BoostError::UnsupportedFieldType { .. }));
    }

    #[test]
    fn custom_parser_skips_shape_check() {
        let field = Field::<Vec<Vec<i32>>>::new("grid").parse_with(|raw: &str| {
            raw.split(';')
                .map(|row| row.split(',').map(str::parse::<i32>).collect())
                .collect::<Result<Vec<Vec<i32>>, _>>()
        });
        validate_one(field).unwrap();
    }

    #[test]
    fn duplicate_field_name_conflicts() {
        let schema = RecordSchema::builder::<()>()
            .field(Field::<i32>::new("x"))
            .field(Field::<String>::new("x"))
            .build();
        let err = validate(&schema, &["outer"]).unwrap_err();
        assert!(matches!(err, BoostError::FieldNameConflict { ref first, .. } if first == "outer.x"));
    }

    #[test]
    fn error_path_includes_prefix() {
        let err = validate(&BadListConfig::schema(), &["parent"]).unwrap_err();
        assert!(err.to_string().contains("parent.buckets"));
    }
}
