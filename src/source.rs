//! Raw value sources keyed by flat name.
//!
//! Every source produces a sparse [`SourceMap`]: only the fields it actually
//! has a value for. Absent keys fall through to lower-precedence sources and
//! finally to declared defaults.

use std::collections::BTreeMap;

use crate::error::BoostError;
use crate::flatten::FlatSchema;
use crate::types::RawValue;

/// Raw values keyed by flag-style flat name (`database-url`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    values: BTreeMap<String, RawValue>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. The key is normalized the same way as [`cli_source`]
    /// keys, so `--db-url`, `db_url` and `db-url` all land on `db-url`.
    pub fn insert(&mut self, key: &str, value: impl Into<RawValue>) -> Option<RawValue> {
        self.values.insert(normalize_key(key), value.into())
    }

    pub fn get(&self, flag_name: &str) -> Option<&RawValue> {
        self.values.get(flag_name)
    }

    pub fn contains(&self, flag_name: &str) -> bool {
        self.values.contains_key(flag_name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overlay `other` on top of `self`: keys in `other` win.
    pub fn extend(&mut self, other: SourceMap) {
        self.values.extend(other.values);
    }
}

impl<K: AsRef<str>, V: Into<RawValue>> FromIterator<(K, V)> for SourceMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = SourceMap::new();
        for (key, value) in iter {
            map.insert(key.as_ref(), value);
        }
        map
    }
}

impl IntoIterator for SourceMap {
    type Item = (String, RawValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, RawValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// A pluggable producer of raw values.
///
/// Sources are read in precedence order by the builder; see
/// [`BoostBuilder::source`](crate::BoostBuilder::source).
pub trait Source {
    /// Short label used in logs and in unknown-key errors.
    fn name(&self) -> &str;

    fn read(&self, fields: &FlatSchema) -> Result<SourceMap, BoostError>;
}

/// A fixed map is a source of itself.
impl Source for SourceMap {
    fn name(&self) -> &str {
        "map"
    }

    fn read(&self, _fields: &FlatSchema) -> Result<SourceMap, BoostError> {
        Ok(self.clone())
    }
}

/// Project an already-parsed argument result onto flat names.
///
/// Keys may be spelled `--db-host`, `db-host` or `db_host`. Entries whose
/// value is `None` (the argument was not given) are dropped so they cannot
/// shadow a lower-precedence source, as are keys that match no field.
pub fn cli_source<K, I>(parsed: I, fields: &FlatSchema) -> SourceMap
where
    K: AsRef<str>,
    I: IntoIterator<Item = (K, Option<RawValue>)>,
{
    let mut map = SourceMap::new();
    for (key, value) in parsed {
        let Some(value) = value else {
            continue;
        };
        let key = normalize_key(key.as_ref());
        if fields.get(&key).is_some() {
            map.values.insert(key, value);
        }
    }
    map
}

pub(crate) fn normalize_key(key: &str) -> String {
    key.trim_start_matches('-').replace('_', "-").to_lowercase()
}
