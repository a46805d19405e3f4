//! Core resolution pipeline: merge raw sources and produce a typed record.
//!
//! Operates on pre-read source maps with no I/O, so the full pipeline is
//! testable with synthetic inputs. Steps:
//!
//! 1. Reject override keys that match no field (if strict)
//! 2. Merge sources left to right, then overrides on top (last writer wins)
//! 3. Per leaf: coerce the merged raw value, or take the declared default
//!    (an enclosing record's default first), or
//!    `null` for an Optional, or fail with `MissingRequiredField`
//! 4. Assemble the leaves into a nested JSON object by path
//! 5. Deserialize the object into the record type
//!
//! The first failure aborts the whole pass; no partial record is returned.

use std::iter;

use serde_json::{Map, Value};
use tracing::trace;

use crate::coerce;
use crate::env::EnvSource;
use crate::error::{BoostError, CoercionError};
use crate::flatten::{FlatField, FlatSchema};
use crate::merge;
use crate::schema::Record;
use crate::source::SourceMap;

/// Knobs for one resolution pass.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Fail on override keys that match no field.
    pub strict: bool,
    /// Env naming used in diagnostics, so errors can point at the variable
    /// as well as the flag. `None` when env loading is disabled.
    pub env: Option<EnvSource>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        ResolveOptions {
            strict: true,
            env: None,
        }
    }
}

/// Resolve `R` from `sources` (lowest precedence first) and `overrides`
/// (highest precedence).
pub fn resolve<R: Record>(
    flat: &FlatSchema,
    sources: &[SourceMap],
    overrides: &SourceMap,
    options: &ResolveOptions,
) -> Result<R, BoostError> {
    let object = resolve_object(flat, sources, overrides, options)?;
    serde_json::from_value(Value::Object(object)).map_err(|source| BoostError::Construction {
        record: flat.record_name(),
        source,
    })
}

/// Steps 1-4: the resolved record as a nested JSON object.
pub fn resolve_object(
    flat: &FlatSchema,
    sources: &[SourceMap],
    overrides: &SourceMap,
    options: &ResolveOptions,
) -> Result<Map<String, Value>, BoostError> {
    if options.strict {
        if let Some(key) = overrides.keys().find(|key| flat.get(key).is_none()) {
            return Err(BoostError::UnknownKey {
                key: key.to_string(),
                origin: "overrides".into(),
                line: 0,
            });
        }
    }

    let merged = merge::merge(sources.iter().chain(iter::once(overrides)));
    let mut root = Map::new();

    for field in flat {
        let descriptor = field.descriptor();
        let value = match merged.get(field.flag_name()) {
            Some(entry) => {
                trace!(field = field.flag_name(), layer = entry.layer, "resolved from source");
                coerce::coerce(&entry.value, descriptor, &field.dotted_path())
                    .map_err(|e| annotate(e, field, options))?
            }
            None => match field.default_value() {
                Some(default) => {
                    trace!(field = field.flag_name(), "resolved from default");
                    default.clone()
                }
                None if field.declared_type().is_optional() => Value::Null,
                None => {
                    return Err(BoostError::MissingRequiredField {
                        flag: field.flag(),
                        env: env_name(field, options),
                    });
                }
            },
        };
        insert_at(&mut root, field.path(), value);
    }

    Ok(root)
}

fn annotate(mut err: CoercionError, field: &FlatField, options: &ResolveOptions) -> BoostError {
    err.flag = field.flag();
    err.env = env_name(field, options);
    err.into()
}

fn env_name(field: &FlatField, options: &ResolveOptions) -> Option<String> {
    options.env.as_ref().map(|env| env.env_name(field))
}

/// `["database", "url"]` → `{ "database": { "url": value } }`, merging into
/// whatever `map` already holds for the parents.
fn insert_at(map: &mut Map<String, Value>, path: &[&str], value: Value) {
    match path {
        [] => {}
        [leaf] => {
            map.insert((*leaf).to_string(), value);
        }
        [head, rest @ ..] => {
            let child = map
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(child) = child {
                insert_at(child, rest, value);
            }
        }
    }
}
