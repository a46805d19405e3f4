//! Argument declarations for an external command-line parser.
//!
//! One [`ArgumentDecl`] per flat field, carrying everything a parser needs to
//! register a long option: flag, required-ness, value shape, and help text
//! with the default and any currently-set env variable spelled out. Nothing
//! here parses arguments.

use std::collections::HashMap;

use crate::coerce;
use crate::env::EnvSource;
use crate::flatten::{FlatField, FlatSchema};
use crate::types::FieldType;

/// Longest env value shown verbatim in help; longer ones are cut with `...`.
const MAX_ENV_DISPLAY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentDecl {
    /// Flag-style flat name, e.g. `database-url`.
    pub id: String,
    /// Long option, e.g. `--database-url`.
    pub flag: String,
    /// No default (own or inherited from an enclosing record) and not
    /// Optional.
    pub required: bool,
    /// Declared help text with the `Required` / `Default:` suffix and the
    /// env annotation applied.
    pub help: String,
    pub value_name: &'static str,
    /// The flag may be repeated (List and Map fields).
    pub multiple: bool,
    /// The flag may appear without a value (Bool fields; bare means `true`).
    pub optional_value: bool,
    pub default_display: Option<String>,
    pub env_name: Option<String>,
    pub env_value: Option<String>,
}

impl ArgumentDecl {
    fn new(field: &FlatField, env: Option<&EnvSource>, vars: &HashMap<String, String>) -> Self {
        let descriptor = field.descriptor();
        let declared = descriptor.declared_type();
        let default_display = field
            .default_value()
            .filter(|v| !v.is_null())
            .map(coerce::to_raw);
        let env_name = env.map(|env| env.env_name(field));
        let env_value = env.and_then(|env| env.value_of(field, vars));

        let mut help = with_suffix(
            descriptor.help(),
            field.is_required(),
            default_display.as_deref(),
        );
        if let (Some(name), Some(value)) = (&env_name, &env_value) {
            help.push_str(&format!(" [env: {name}={}]", truncate(value)));
        }

        ArgumentDecl {
            id: field.flag_name().to_string(),
            flag: field.flag(),
            required: field.is_required(),
            help,
            value_name: declared.value_name(),
            multiple: declared.is_container(),
            optional_value: is_bool(declared),
            default_display,
            env_name,
            env_value,
        }
    }
}

/// Emit one declaration per field of `flat`, in flattening order.
///
/// With `env`, each declaration carries its variable name and, when set, the
/// current value read from `env`'s variable snapshot.
pub fn emit(flat: &FlatSchema, env: Option<&EnvSource>) -> Vec<ArgumentDecl> {
    let vars = env.map(EnvSource::vars).unwrap_or_default();
    flat.iter()
        .map(|field| ArgumentDecl::new(field, env, &vars))
        .collect()
}

/// The "Environment variables set:" help section, or an empty string when no
/// declared variable is set.
pub fn env_section(decls: &[ArgumentDecl]) -> String {
    let set: Vec<(&str, &str, String)> = decls
        .iter()
        .filter_map(|d| match (&d.env_name, &d.env_value) {
            (Some(name), Some(value)) => Some((d.flag.as_str(), name.as_str(), truncate(value))),
            _ => None,
        })
        .collect();
    if set.is_empty() {
        return String::new();
    }

    let width = set.iter().map(|(flag, _, _)| flag.len()).max().unwrap_or(0);
    let mut out = String::from("Environment variables set:\n");
    for (flag, name, value) in set {
        out.push_str(&format!("  {flag:<width$}  {name}={value}\n"));
    }
    out
}

fn with_suffix(help: Option<&str>, required: bool, default: Option<&str>) -> String {
    let help = help.unwrap_or("").trim_end();
    let suffix = if required {
        "Required".to_string()
    } else if let Some(default) = default {
        format!("Default: {default}")
    } else {
        return help.to_string();
    };

    if help.is_empty() {
        suffix
    } else if help.ends_with('.') {
        format!("{help} {suffix}")
    } else {
        format!("{help}. {suffix}")
    }
}

fn truncate(value: &str) -> String {
    if value.chars().count() > MAX_ENV_DISPLAY {
        let cut: String = value.chars().take(MAX_ENV_DISPLAY - 3).collect();
        format!("{cut}...")
    } else {
        value.to_string()
    }
}

fn is_bool(ty: &FieldType) -> bool {
    match ty {
        FieldType::Bool => true,
        FieldType::Optional(inner) => is_bool(inner),
        _ => false,
    }
}
