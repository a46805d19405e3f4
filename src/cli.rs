//! Clap adapter for boostargs.
//!
//! This module is the **optional integration layer** between the
//! framework-agnostic core and the [clap](https://docs.rs/clap) CLI parser.
//! It is compiled only when the `clap` Cargo feature is enabled (on by
//! default).
//!
//! [`command()`] registers one long option per record field on an existing
//! `clap::Command`. Values are validated by the same coercion the resolver
//! uses, but clap hands back the raw strings; [`matches_source()`] collects
//! the ones the user actually typed so they can be layered over env and
//! defaults by [`BoostBuilder::cli_matches()`](crate::BoostBuilder::cli_matches).
//!
//! Neither defaults nor required-ness are registered with clap: an absent flag
//! must fall through to files, extra sources and env. A required field no
//! layer supplies is reported by [`load()`](crate::BoostBuilder::load) as
//! [`BoostError::MissingRequiredField`]; the help text still says `Required`.
//!
//! If you use a different CLI parser, skip this module and feed
//! [`argument_decls()`](crate::BoostBuilder::argument_decls) to it, then
//! hand the parsed values to [`BoostBuilder::cli()`](crate::BoostBuilder::cli).

use std::sync::Arc;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::builder::BoostBuilder;
use crate::coerce;
use crate::emit::{self, ArgumentDecl};
use crate::error::BoostError;
use crate::flatten::{FlatField, FlatSchema};
use crate::schema::{FieldDescriptor, Record};
use crate::source::SourceMap;
use crate::types::RawValue;

/// Add one argument per field of `R`, plus the env section as after-help.
pub fn command<R: Record>(cmd: Command, builder: &BoostBuilder<R>) -> Result<Command, BoostError> {
    let flat = builder.flat()?;
    let decls = builder.argument_decls()?;
    let cmd = cmd.args(args(&flat, &decls));
    let section = emit::env_section(&decls);
    Ok(if section.is_empty() {
        cmd
    } else {
        cmd.after_help(section)
    })
}

/// Translate declarations into clap arguments.
pub fn args(flat: &FlatSchema, decls: &[ArgumentDecl]) -> Vec<Arg> {
    decls
        .iter()
        .filter_map(|decl| flat.get(&decl.id).map(|field| arg(field, decl)))
        .collect()
}

fn arg(field: &FlatField, decl: &ArgumentDecl) -> Arg {
    let mut arg = Arg::new(decl.id.clone())
        .long(decl.id.clone())
        .value_name(decl.value_name)
        .help(decl.help.clone())
        .value_parser(validator(field.shared_descriptor(), field.dotted_path()));

    arg = if decl.multiple {
        arg.action(ArgAction::Append)
    } else {
        arg.action(ArgAction::Set)
    };
    if decl.optional_value {
        arg = arg.num_args(0..=1).default_missing_value("true");
    }
    arg
}

/// Validate a raw value by coercing it, but keep the raw string.
fn validator(
    descriptor: Arc<FieldDescriptor>,
    path: String,
) -> impl Fn(&str) -> Result<String, String> + Clone + Send + Sync + 'static {
    move |raw: &str| {
        coerce::coerce(&RawValue::from(raw), &descriptor, &path)
            .map(|_| raw.to_string())
            .map_err(|e| format!("expected {}: {}", e.expected, e.reason))
    }
}

/// Raw values the user passed on the command line.
///
/// Arguments that are absent, filled by clap defaults, or not string-valued
/// are skipped.
pub fn matches_source(matches: &ArgMatches) -> SourceMap {
    let mut map = SourceMap::new();
    for id in matches.ids() {
        let id = id.as_str();
        if matches.value_source(id) != Some(ValueSource::CommandLine) {
            continue;
        }
        let Ok(Some(values)) = matches.try_get_many::<String>(id) else {
            continue;
        };
        let mut values: Vec<String> = values.cloned().collect();
        let value = if values.len() == 1 {
            RawValue::Single(values.remove(0))
        } else {
            RawValue::Many(values)
        };
        map.insert(id, value);
    }
    map
}
