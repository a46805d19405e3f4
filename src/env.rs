use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::BoostError;
use crate::flatten::{FlatField, FlatSchema};
use crate::source::{Source, SourceMap};
use crate::types::RawValue;

/// Maps a prefix and a flat field to the env variable that feeds it.
pub type EnvNaming = fn(&str, &FlatField) -> String;

/// `<PREFIX><PATH_JOINED_BY_UNDERSCORE_UPPERCASED>`, e.g. `APP_DATABASE_URL`.
pub fn default_env_name(prefix: &str, field: &FlatField) -> String {
    format!("{prefix}{}", field.env_key())
}

/// Reads one env variable per flat field.
///
/// Variables are looked up by exact name. Unset variables are simply absent
/// from the result; a variable set to the empty string is present and
/// coerced like any other value (an empty list, for example).
///
/// By default the process environment is read at [`read`](Source::read)
/// time. [`with_vars`](Self::with_vars) substitutes a fixed set of pairs so
/// tests never touch the real environment.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    naming: EnvNaming,
    vars: Option<HashMap<String, String>>,
}

impl EnvSource {
    pub fn new(prefix: impl Into<String>) -> Self {
        EnvSource {
            prefix: prefix.into(),
            naming: default_env_name,
            vars: None,
        }
    }

    /// Replace the naming scheme (the prefix is still passed in).
    pub fn naming(mut self, naming: EnvNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Read from `vars` instead of the process environment.
    pub fn with_vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn env_name(&self, field: &FlatField) -> String {
        (self.naming)(&self.prefix, field)
    }

    /// Snapshot of the variables this source reads from.
    pub fn vars(&self) -> HashMap<String, String> {
        match &self.vars {
            Some(vars) => vars.clone(),
            None => process_vars(),
        }
    }

    /// Current value of `field`'s variable, if set.
    pub fn value_of(&self, field: &FlatField, vars: &HashMap<String, String>) -> Option<String> {
        vars.get(&self.env_name(field)).cloned()
    }
}

impl Source for EnvSource {
    fn name(&self) -> &str {
        "env"
    }

    fn read(&self, fields: &FlatSchema) -> Result<SourceMap, BoostError> {
        let vars = self.vars();
        let mut map = SourceMap::new();
        for field in fields {
            if let Some(value) = self.value_of(field, &vars) {
                map.insert(field.flag_name(), RawValue::Single(value));
            }
        }
        debug!(prefix = %self.prefix, found = map.len(), "read environment variables");
        Ok(map)
    }
}

/// The process environment, skipping entries that are not valid UTF-8.
pub fn process_vars() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                warn!(key = ?key, "skipping environment variable that is not valid UTF-8");
                None
            }
        })
        .collect()
}
