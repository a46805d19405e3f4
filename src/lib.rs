//! Typed configuration records from CLI flags, environment variables and
//! TOML files. Describe a struct once, get flags, env vars and a typed value.
//!
//! ```ignore
//! let config: AppConfig = Boost::builder()
//!     .app_name("myapp")
//!     .cli_matches(&matches)
//!     .load()?;
//! ```
//!
//! That call reads `MYAPP_*` environment variables, layers the flags the
//! user passed on top, fills in declared defaults, and hands you a typed
//! struct.
//!
//! # Declaring a record
//!
//! A record is any `Deserialize` struct that also describes its fields through
//! [`Record::schema`]. The description is what drives flag names, env names,
//! coercion, defaults and help text:
//!
//! ```ignore
//! #[derive(Deserialize)]
//! struct AppConfig {
//!     host: String,
//!     port: u16,
//!     tags: Vec<String>,
//!     database: DbConfig,
//! }
//!
//! impl Record for AppConfig {
//!     fn schema() -> RecordSchema {
//!         RecordSchema::builder::<Self>()
//!             .field(Field::<String>::new("host").help("Address to bind"))
//!             .field(Field::<u16>::new("port").default(8080))
//!             .field(Field::<Vec<String>>::new("tags").default(vec![]))
//!             .field(Field::<DbConfig>::nested("database"))
//!             .build()
//!     }
//! }
//! ```
//!
//! Supported leaf types are integers, floats, strings (and paths) and bools;
//! `Vec` and `HashMap`/`BTreeMap` of those; and `Option` around a scalar.
//! Anything else is rejected with [`BoostError::UnsupportedFieldType`] the
//! first time the record is used, unless the field has its own parser via
//! [`Field::parse_with`].
//!
//! # Flattening
//!
//! Nested records flatten into one list of leaves. The path of field names
//! gives both spellings:
//!
//! | Path | Flag | Env (prefix `APP_`) |
//! |------|------|---------------------|
//! | `host` | `--host` | `APP_HOST` |
//! | `database.pool_size` | `--database-pool-size` | `APP_DATABASE_POOL_SIZE` |
//!
//! Two leaves that flatten to the same flag (`a.x` and `a_x`) are a
//! [`BoostError::FieldNameConflict`]; a record that nests itself is a
//! [`BoostError::UnsupportedFieldType`] naming the field where the cycle
//! closes.
//!
//! A nested record may carry a default of its own
//! (`Field::<DbConfig>::nested("database").default(...)`). Leaves below it
//! then fall back to that instance and are no longer required.
//!
//! # Layer precedence
//!
//! ```text
//! Declared defaults     Field::default(...)
//!        ↑ overridden by
//! Config files          .file(), later files win
//!        ↑ overridden by
//! Extra sources         .source(), later sources win
//!        ↑ overridden by
//! Environment vars      PREFIX_PATH
//!        ↑ overridden by
//! CLI values            .cli() / .cli_matches()
//!        ↑ overridden by
//! Overrides             .override_value()
//! ```
//!
//! Every layer is **sparse**: unset keys fall through to the layer below. A
//! field no layer supplies must have a default or be an `Option`, otherwise
//! loading fails with [`BoostError::MissingRequiredField`] naming its flag and
//! env variable.
//!
//! # Raw values
//!
//! Every source produces strings, and one coercer turns them into typed
//! values:
//!
//! - bools accept `true/yes/on/1` and `false/no/off/0`, any case
//! - lists split on `,`: `a,b,c` or `[a, b, c]`; an empty string is an empty list
//! - maps split on `,`, then each pair on the first `:` or `=`:
//!   `daily:100,monthly=3000`
//! - `null` or `None` clears an `Option`
//!
//! List and map flags may also be repeated; the values are concatenated.
//!
//! # Strict mode
//!
//! Strict mode is **on by default**. An unknown key in a config file fails
//! with the file path, key name and line number:
//!
//! ```text
//! Unknown key 'typo_key' in /etc/myapp.toml (line 5)
//! ```
//!
//! Override keys that match no field fail the same way. Turn it off with
//! [`.strict(false)`](BoostBuilder::strict).
//!
//! # Clap adapter
//!
//! The `cli` module (behind the `clap` feature, on by default) registers one
//! long option per field on a `clap::Command`, validates values with the same
//! coercer, and appends an "Environment variables set:" section to the help.
//! Without clap, feed [`BoostBuilder::argument_decls`] to any parser and pass
//! its output to [`BoostBuilder::cli`].
//!
//! # Error handling
//!
//! All fallible operations return [`BoostError`]. Schema errors (unsupported
//! types, name conflicts, cycles) are programming mistakes and surface on the
//! first use of a record; resolve-time errors name the offending flag and env
//! variable so they can be shown to users as-is.

pub mod error;
pub mod types;

mod builder;
#[cfg(feature = "clap")]
pub mod cli;
mod coerce;
mod emit;
mod env;
mod file;
mod flatten;
pub(crate) mod merge;
mod registry;
mod resolve;
mod schema;
mod source;

#[cfg(test)]
mod fixtures;

pub use builder::{Boost, BoostBuilder};
pub use coerce::{coerce, to_raw};
pub use emit::{ArgumentDecl, emit, env_section};
pub use env::{EnvNaming, EnvSource, default_env_name};
pub use error::{BoostError, CoercionError};
pub use file::FileSource;
pub use flatten::{FlatField, FlatSchema, flatten};
pub use registry::SchemaRegistry;
pub use resolve::{ResolveOptions, resolve, resolve_object};
pub use schema::{Field, FieldDescriptor, Record, RecordSchema, RecordSchemaBuilder};
pub use source::{Source, SourceMap, cli_source};
pub use types::{FieldType, FieldValue, RawValue, RecordRef};
