//! Declared field shapes and the raw values sources hand to the coercer.
//!
//! [`FieldValue`] maps a Rust type to its [`FieldType`] at compile time, so
//! a record author never spells the shape out by hand: `Field::<u16>::new`
//! is an Int field, `Field::<Vec<String>>::new` a List of Str, and so on.
//! Shapes the engine cannot coerce (`Vec<Vec<i64>>`, `Option<Vec<String>>`)
//! still implement `FieldValue`; they are rejected when the schema is
//! validated, with the offending field path in the error.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

use crate::schema::{Record, RecordSchema};

/// The declared shape of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Int,
    Float,
    Str,
    Bool,
    List(Box<FieldType>),
    Map(Box<FieldType>, Box<FieldType>),
    Optional(Box<FieldType>),
    Record(RecordRef),
}

impl FieldType {
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            FieldType::Int | FieldType::Float | FieldType::Str | FieldType::Bool
        )
    }

    /// A scalar, or an Optional wrapping a scalar.
    pub fn is_simple(&self) -> bool {
        match self {
            FieldType::Optional(inner) => inner.is_scalar(),
            other => other.is_scalar(),
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, FieldType::Optional(_))
    }

    /// List and Map fields accept several raw items.
    pub fn is_container(&self) -> bool {
        matches!(self, FieldType::List(_) | FieldType::Map(..))
    }

    /// Short upper-case placeholder used as a flag's value name in help.
    pub fn value_name(&self) -> &'static str {
        match self {
            FieldType::Int => "INT",
            FieldType::Float => "FLOAT",
            FieldType::Str => "STR",
            FieldType::Bool => "BOOL",
            FieldType::List(_) => "ITEM,...",
            FieldType::Map(..) => "KEY=VALUE,...",
            FieldType::Optional(inner) => inner.value_name(),
            FieldType::Record(_) => "RECORD",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Int => write!(f, "integer"),
            FieldType::Float => write!(f, "float"),
            FieldType::Str => write!(f, "string"),
            FieldType::Bool => write!(f, "boolean"),
            FieldType::List(item) => write!(f, "list of {item}"),
            FieldType::Map(key, value) => write!(f, "map of {key} to {value}"),
            FieldType::Optional(inner) => write!(f, "optional {inner}"),
            FieldType::Record(record) => write!(f, "record {}", record.type_name),
        }
    }
}

/// Handle on a nested record type: its identity plus a way to describe it.
///
/// The schema is produced on demand so that declaring a field never recurses;
/// cycles are caught when the flattener walks the nesting.
#[derive(Clone)]
pub struct RecordRef {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub(crate) schema: fn() -> RecordSchema,
}

impl RecordRef {
    pub fn of<R: Record>() -> Self {
        RecordRef {
            type_id: TypeId::of::<R>(),
            type_name: std::any::type_name::<R>(),
            schema: R::schema,
        }
    }
}

impl fmt::Debug for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordRef").field(&self.type_name).finish()
    }
}

impl PartialEq for RecordRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

/// A value as it arrives from a source, before coercion.
///
/// `Many` comes from repeated flags or TOML arrays; a single delimited token
/// such as `"a,b,c"` stays `Single` and is split by the coercer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Single(String),
    Many(Vec<String>),
}

impl RawValue {
    /// Items for container coercion: `Single` is one item, `Many` each entry.
    pub fn items(&self) -> Vec<&str> {
        match self {
            RawValue::Single(s) => vec![s.as_str()],
            RawValue::Many(items) => items.iter().map(String::as_str).collect(),
        }
    }

    /// The value a scalar field sees: `Many` collapses to its last entry.
    pub fn last(&self) -> Option<&str> {
        match self {
            RawValue::Single(s) => Some(s),
            RawValue::Many(items) => items.last().map(String::as_str),
        }
    }

    /// Comma-joined form, used for display and for custom coercers.
    pub fn joined(&self) -> String {
        match self {
            RawValue::Single(s) => s.clone(),
            RawValue::Many(items) => items.join(","),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Single(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Single(s)
    }
}

impl From<Vec<String>> for RawValue {
    fn from(items: Vec<String>) -> Self {
        RawValue::Many(items)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.joined())
    }
}

/// Rust types that can back a leaf field.
pub trait FieldValue {
    fn field_type() -> FieldType;
}

macro_rules! field_value {
    ($kind:ident: $($ty:ty),+) => {
        $(
            impl FieldValue for $ty {
                fn field_type() -> FieldType {
                    FieldType::$kind
                }
            }
        )+
    };
}

field_value!(Int: i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
field_value!(Float: f32, f64);
field_value!(Str: String, PathBuf);
field_value!(Bool: bool);

impl<T: FieldValue> FieldValue for Vec<T> {
    fn field_type() -> FieldType {
        FieldType::List(Box::new(T::field_type()))
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn field_type() -> FieldType {
        FieldType::Optional(Box::new(T::field_type()))
    }
}

impl<K: FieldValue, V: FieldValue, S> FieldValue for HashMap<K, V, S> {
    fn field_type() -> FieldType {
        FieldType::Map(Box::new(K::field_type()), Box::new(V::field_type()))
    }
}

impl<K: FieldValue, V: FieldValue> FieldValue for BTreeMap<K, V> {
    fn field_type() -> FieldType {
        FieldType::Map(Box::new(K::field_type()), Box::new(V::field_type()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_map_to_kinds() {
        assert_eq!(u16::field_type(), FieldType::Int);
        assert_eq!(i64::field_type(), FieldType::Int);
        assert_eq!(f32::field_type(), FieldType::Float);
        assert_eq!(String::field_type(), FieldType::Str);
        assert_eq!(PathBuf::field_type(), FieldType::Str);
        assert_eq!(bool::field_type(), FieldType::Bool);
    }

    #[test]
    fn containers_wrap_their_elements() {
        assert_eq!(
            Vec::<String>::field_type(),
            FieldType::List(Box::new(FieldType::Str))
        );
        assert_eq!(
            HashMap::<String, u32>::field_type(),
            FieldType::Map(Box::new(FieldType::Str), Box::new(FieldType::Int))
        );
        assert_eq!(
            Option::<bool>::field_type(),
            FieldType::Optional(Box::new(FieldType::Bool))
        );
    }

    #[test]
    fn simple_means_scalar_or_optional_scalar() {
        assert!(FieldType::Int.is_simple());
        assert!(Option::<i32>::field_type().is_simple());
        assert!(!Vec::<i32>::field_type().is_simple());
        assert!(!Option::<Vec<i32>>::field_type().is_simple());
    }

    #[test]
    fn display_names_nested_shapes() {
        let ty = HashMap::<String, Option<i64>>::field_type();
        assert_eq!(ty.to_string(), "map of string to optional integer");
    }

    #[test]
    fn raw_value_last_and_joined() {
        let many = RawValue::Many(vec!["a".into(), "b".into()]);
        assert_eq!(many.last(), Some("b"));
        assert_eq!(many.joined(), "a,b");
        assert_eq!(RawValue::from("x").items(), vec!["x"]);
    }
}
