//! Build-once cache of validated record schemas and their flattened forms.
//!
//! A registry is an explicit object: create one at startup and hand it to
//! the builder, or use [`SchemaRegistry::global`] when threading one through
//! is not worth it. Entries are pure derived data, so a racing first use may
//! build a schema twice; the first insert wins and the duplicate is dropped.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::{debug, trace};

use crate::error::BoostError;
use crate::flatten::{self, FlatSchema};
use crate::schema::{self, Record, RecordSchema};
use crate::types::RecordRef;

#[derive(Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<TypeId, Arc<RecordSchema>>>,
    flat: RwLock<HashMap<TypeId, Arc<FlatSchema>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry, never torn down.
    pub fn global() -> &'static SchemaRegistry {
        static GLOBAL: OnceLock<SchemaRegistry> = OnceLock::new();
        GLOBAL.get_or_init(SchemaRegistry::new)
    }

    /// Validated schema for `R`, built on first use.
    pub fn schema<R: Record>(&self) -> Result<Arc<RecordSchema>, BoostError> {
        self.schema_of(&RecordRef::of::<R>(), &[])
    }

    /// Flattened leaf fields of `R`, built on first use.
    pub fn flatten<R: Record>(&self) -> Result<Arc<FlatSchema>, BoostError> {
        let type_id = TypeId::of::<R>();
        if let Some(flat) = read(&self.flat).get(&type_id) {
            trace!(record = flat.record_name(), "flat schema cache hit");
            return Ok(Arc::clone(flat));
        }

        let built = Arc::new(flatten::flatten(self, &RecordRef::of::<R>())?);
        debug!(
            record = built.record_name(),
            fields = built.len(),
            "flattened record schema"
        );
        let mut flat = self.flat.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(flat.entry(type_id).or_insert(built)))
    }

    /// Number of record schemas cached so far.
    pub fn len(&self) -> usize {
        read(&self.schemas).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `prefix` is where the record sits inside the root being flattened;
    /// validation errors report paths relative to that root.
    pub(crate) fn schema_of(
        &self,
        record: &RecordRef,
        prefix: &[&str],
    ) -> Result<Arc<RecordSchema>, BoostError> {
        if let Some(schema) = read(&self.schemas).get(&record.type_id) {
            return Ok(Arc::clone(schema));
        }

        let built = (record.schema)();
        schema::validate(&built, prefix)?;
        debug!(
            record = record.type_name,
            fields = built.fields().len(),
            "built record schema"
        );
        let mut schemas = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(
            schemas.entry(record.type_id).or_insert_with(|| Arc::new(built)),
        ))
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}
