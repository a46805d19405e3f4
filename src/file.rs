//! TOML files as a value source.
//!
//! A file's tables mirror the record nesting: `database.pool_size` is read
//! from `pool_size` under `[database]`. Values are handed on as raw strings
//! so they go through the same coercion as CLI and env input:
//!
//! - strings pass through as written, other scalars use their TOML spelling
//! - arrays become one raw item per element
//! - a table under a Map field becomes `key=value` items
//! - any other table, or a table or array inside a value, is a coercion error
//!
//! A missing file is skipped unless the source is marked
//! [`required`](FileSource::required). Only actual I/O errors (permissions,
//! etc.) and parse errors are propagated.
//!
//! In strict mode (the default) keys that match no field are rejected with
//! their line number.

use std::io;
use std::path::{Path, PathBuf};

use toml::{Table, Value};
use tracing::debug;

use crate::error::{BoostError, CoercionError};
use crate::flatten::{FlatField, FlatSchema};
use crate::source::{Source, SourceMap};
use crate::types::{FieldType, RawValue};

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
    strict: bool,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource {
            path: path.into(),
            required: false,
            strict: true,
        }
    }

    /// Fail with `IoError` when the file does not exist.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Reject keys that match no field. Default: true.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file, or `None` if it is missing and optional.
    fn load(&self) -> Result<Option<String>, BoostError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound && !self.required => {
                debug!(path = %self.path.display(), "config file not found, skipping");
                Ok(None)
            }
            Err(e) => Err(BoostError::IoError {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}

impl Source for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    fn read(&self, fields: &FlatSchema) -> Result<SourceMap, BoostError> {
        let Some(content) = self.load()? else {
            return Ok(SourceMap::new());
        };
        let map = parse_table(&content, &self.path, fields, self.strict)?;
        debug!(path = %self.path.display(), found = map.len(), "read config file");
        Ok(map)
    }
}

/// Parse TOML `content` and project it onto `fields`.
///
/// `path` is only used for error reporting.
pub fn parse_table(
    content: &str,
    path: &Path,
    fields: &FlatSchema,
    strict: bool,
) -> Result<SourceMap, BoostError> {
    let table: Table = toml::from_str(content).map_err(|e| BoostError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    if strict {
        if let Some(key) = find_unknown_key(&table, &[], fields) {
            let line = find_key_line(content, &key);
            return Err(BoostError::UnknownKey {
                key,
                origin: path.display().to_string(),
                line,
            });
        }
    }

    let mut map = SourceMap::new();
    for field in fields {
        if let Some(value) = lookup(&table, field.path()) {
            map.insert(field.flag_name(), raw_value(value, field)?);
        }
    }
    Ok(map)
}

fn lookup<'a>(table: &'a Table, path: &[&str]) -> Option<&'a Value> {
    let (leaf, parents) = path.split_last()?;
    let mut current = table;
    for segment in parents {
        current = current.get(*segment)?.as_table()?;
    }
    current.get(*leaf)
}

/// Tables are only meaningful under a Map field, and neither tables nor
/// arrays may appear inside a value.
fn raw_value(value: &Value, field: &FlatField) -> Result<RawValue, CoercionError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| scalar(item, field))
            .collect::<Result<_, _>>()
            .map(RawValue::Many),
        Value::Table(table) if matches!(field.declared_type(), FieldType::Map(..)) => table
            .iter()
            .map(|(k, v)| scalar(v, field).map(|v| format!("{k}={v}")))
            .collect::<Result<_, _>>()
            .map(RawValue::Many),
        other => scalar(other, field).map(RawValue::Single),
    }
}

/// TOML strings lose their quotes; other scalars keep their TOML spelling.
fn scalar(value: &Value, field: &FlatField) -> Result<String, CoercionError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Table(_) | Value::Array(_) => Err(CoercionError::new(
            field.dotted_path(),
            value.to_string(),
            field.declared_type().to_string(),
            format!("a TOML {} has no raw form here", value.type_str()),
        )),
        other => Ok(other.to_string()),
    }
}

/// First dotted key in `table` that is neither a field nor a table leading
/// to one.
fn find_unknown_key(table: &Table, prefix: &[&str], fields: &FlatSchema) -> Option<String> {
    for (key, value) in table {
        let mut path = prefix.to_vec();
        path.push(key.as_str());

        if let Some(field) = fields.iter().find(|f| f.path() == path.as_slice()) {
            if let Value::Table(inner) = value
                && !matches!(field.declared_type(), FieldType::Map(..))
            {
                return Some(match inner.keys().next() {
                    Some(first) => format!("{}.{first}", path.join(".")),
                    None => path.join("."),
                });
            }
            continue;
        }
        let is_parent = fields
            .iter()
            .any(|f| f.path().len() > path.len() && f.path().starts_with(&path));
        match value {
            Value::Table(inner) if is_parent => {
                if let Some(unknown) = find_unknown_key(inner, &path, fields) {
                    return Some(unknown);
                }
            }
            _ => return Some(path.join(".")),
        }
    }
    None
}

/// Find the 1-indexed line number for a key in TOML content.
///
/// For a dotted key like `"database.typo"`, tracks the current `[section]` header
/// while scanning and only matches the leaf key when inside the correct section.
///
/// Best-effort: handles standard `[section]` headers and bare key assignments
/// but not quoted keys or inline tables. Returns 0 if the key cannot be located.
fn find_key_line(content: &str, dotted_key: &str) -> usize {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    let Some((leaf, expected_section)) = segments.split_last() else {
        return 0;
    };

    let mut current_section: Vec<String> = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') && !trimmed.starts_with("[[") {
            let header = trimmed.trim_start_matches('[').trim_end_matches(']').trim();
            current_section = header.split('.').map(|s| s.trim().to_string()).collect();
            continue;
        }

        let in_right_section = expected_section.len() == current_section.len()
            && expected_section
                .iter()
                .zip(&current_section)
                .all(|(a, b)| *a == b);

        if in_right_section
            && let Some(after_key) = trimmed.strip_prefix(leaf)
            && after_key.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}
