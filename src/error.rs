use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoostError {
    #[error("Unsupported field type for '{path}': {reason}")]
    UnsupportedFieldType { path: String, reason: String },

    #[error("Field name conflict for '{name}': {first} vs {second}")]
    FieldNameConflict {
        name: String,
        first: String,
        second: String,
    },

    #[error("Invalid default for '{path}': {reason}")]
    InvalidDefault { path: String, reason: String },

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error("Missing required value for {}", describe_origin(.flag, .env.as_deref()))]
    MissingRequiredField { flag: String, env: Option<String> },

    #[error("Unknown key '{key}' in {origin}{}", line_suffix(.line))]
    UnknownKey {
        key: String,
        origin: String,
        line: usize,
    },

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to construct {record}: {source}")]
    Construction {
        record: &'static str,
        source: serde_json::Error,
    },
}

/// A raw value that could not become the field's declared type.
///
/// Built-in and custom coercion failures share this shape, so callers only
/// ever match one variant.
#[derive(Debug, Error)]
#[error("Invalid value '{raw}' for {}: expected {expected}: {reason}", describe_origin(.flag, .env.as_deref()))]
pub struct CoercionError {
    /// Dotted field path from the record root, e.g. `database.port`.
    pub path: String,
    /// Flag spelling of the field, e.g. `--database-port`.
    pub flag: String,
    /// Environment variable name, when env loading is enabled.
    pub env: Option<String>,
    pub raw: String,
    pub expected: String,
    pub reason: String,
}

impl CoercionError {
    pub(crate) fn new(
        path: impl Into<String>,
        raw: impl Into<String>,
        expected: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let path = path.into();
        CoercionError {
            flag: format!("--{}", path.replace(['.', '_'], "-").to_lowercase()),
            env: None,
            path,
            raw: raw.into(),
            expected: expected.into(),
            reason: reason.into(),
        }
    }
}

fn describe_origin(flag: &str, env: Option<&str>) -> String {
    match env {
        Some(env) => format!("{flag} (env {env})"),
        None => flag.to_string(),
    }
}

fn line_suffix(line: &usize) -> String {
    if *line == 0 {
        String::new()
    } else {
        format!(" (line {line})")
    }
}
