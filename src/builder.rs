use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::emit::{self, ArgumentDecl};
use crate::env::{EnvNaming, EnvSource};
use crate::error::BoostError;
use crate::file::FileSource;
use crate::flatten::FlatSchema;
use crate::registry::SchemaRegistry;
use crate::resolve::{self, ResolveOptions};
use crate::schema::Record;
use crate::source::{self, Source, SourceMap};
use crate::types::RawValue;

/// Entry point for building a boostargs resolution.
pub struct Boost;

impl Boost {
    pub fn builder<R: Record>() -> BoostBuilder<R> {
        BoostBuilder::new()
    }
}

/// Builder for configuring and loading a record from layered sources.
///
/// Layers, lowest precedence first:
///
/// 1. declared defaults
/// 2. config files, in the order added with [`file()`](Self::file)
/// 3. extra sources, in the order added with [`source()`](Self::source)
/// 4. environment variables
/// 5. CLI values from [`cli()`](Self::cli) / `cli_matches()`
/// 6. overrides from [`override_value()`](Self::override_value)
pub struct BoostBuilder<R: Record> {
    app_name: Option<String>,
    env_prefix: Option<String>,
    env_enabled: bool,
    env_naming: Option<EnvNaming>,
    env_vars: Option<Vec<(String, String)>>,
    files: Vec<PathBuf>,
    sources: Vec<Box<dyn Source>>,
    cli: SourceMap,
    overrides: SourceMap,
    strict: bool,
    registry: Option<Arc<SchemaRegistry>>,
    _phantom: PhantomData<fn() -> R>,
}

impl<R: Record> BoostBuilder<R> {
    fn new() -> Self {
        Self {
            app_name: None,
            env_prefix: None,
            env_enabled: true,
            env_naming: None,
            env_vars: None,
            files: Vec::new(),
            sources: Vec::new(),
            cli: SourceMap::new(),
            overrides: SourceMap::new(),
            strict: true,
            registry: None,
            _phantom: PhantomData,
        }
    }

    /// Set the application name. Derives the env prefix when none is set:
    /// `my-app` → `MY_APP_`.
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// Override the environment variable prefix, used verbatim (include any
    /// trailing `_`).
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Disable environment variable loading entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Replace the env naming scheme (default: prefix + `PATH_UPPERCASED`).
    pub fn env_naming(mut self, naming: EnvNaming) -> Self {
        self.env_naming = Some(naming);
        self
    }

    /// Read env values from `vars` instead of the process environment.
    pub fn env_vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Add an optional TOML config file. Missing files are skipped; later
    /// files override earlier ones.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Add a custom source between files and the environment.
    pub fn source(mut self, source: impl Source + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Add parsed CLI values. Keys may be spelled `--db-host`, `db-host` or
    /// `db_host`; keys that match no field are ignored.
    pub fn cli(mut self, values: SourceMap) -> Self {
        self.cli.extend(values);
        self
    }

    /// Add the values the user actually passed in clap `matches`.
    #[cfg(feature = "clap")]
    pub fn cli_matches(self, matches: &clap::ArgMatches) -> Self {
        self.cli(crate::cli::matches_source(matches))
    }

    /// Force a value, above every other layer.
    pub fn override_value(mut self, key: &str, value: impl Into<RawValue>) -> Self {
        self.overrides.insert(key, value);
        self
    }

    /// Enable or disable strict mode (default: `true`).
    /// In strict mode, unknown keys in config files and overrides produce errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Use `registry` instead of the process-wide [`SchemaRegistry::global`].
    pub fn registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    fn effective_registry(&self) -> &SchemaRegistry {
        self.registry
            .as_deref()
            .unwrap_or_else(|| SchemaRegistry::global())
    }

    /// Resolve the effective env prefix (None if env disabled).
    fn effective_env_prefix(&self) -> Option<String> {
        if !self.env_enabled {
            return None;
        }
        if let Some(prefix) = &self.env_prefix {
            return Some(prefix.clone());
        }
        match &self.app_name {
            Some(app) => Some(format!("{}_", app.to_uppercase().replace('-', "_"))),
            None => Some(String::new()),
        }
    }

    fn effective_env(&self) -> Option<EnvSource> {
        let mut env = EnvSource::new(self.effective_env_prefix()?);
        if let Some(naming) = self.env_naming {
            env = env.naming(naming);
        }
        if let Some(vars) = &self.env_vars {
            env = env.with_vars(vars.iter().cloned());
        }
        Some(env)
    }

    pub(crate) fn flat(&self) -> Result<Arc<FlatSchema>, BoostError> {
        self.effective_registry().flatten::<R>()
    }

    /// Read every layer below the overrides, lowest precedence first.
    fn read_layers(
        &self,
        flat: &FlatSchema,
        env: Option<&EnvSource>,
    ) -> Result<Vec<SourceMap>, BoostError> {
        let mut layers = Vec::new();

        for path in &self.files {
            let file = FileSource::new(path).strict(self.strict);
            layers.push(file.read(flat)?);
        }
        for source in &self.sources {
            let map = source.read(flat)?;
            debug!(source = source.name(), found = map.len(), "read source");
            layers.push(map);
        }
        if let Some(env) = env {
            layers.push(env.read(flat)?);
        }
        let cli = source::cli_source(self.cli.iter().map(|(k, v)| (k, Some(v.clone()))), flat);
        debug!(found = cli.len(), "read CLI values");
        layers.push(cli);

        Ok(layers)
    }

    /// Load and resolve the record through all layers.
    pub fn load(self) -> Result<R, BoostError> {
        let flat = self.flat()?;
        let env = self.effective_env();
        let layers = self.read_layers(&flat, env.as_ref())?;
        let options = ResolveOptions {
            strict: self.strict,
            env,
        };
        resolve::resolve(&flat, &layers, &self.overrides, &options)
    }

    /// Argument declarations for every field, with env annotations when env
    /// loading is enabled.
    pub fn argument_decls(&self) -> Result<Vec<ArgumentDecl>, BoostError> {
        let flat = self.flat()?;
        Ok(emit::emit(&flat, self.effective_env().as_ref()))
    }

    /// The "Environment variables set:" help section (empty when none is set).
    pub fn env_help(&self) -> Result<String, BoostError> {
        Ok(emit::env_section(&self.argument_decls()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{AppConfig, ServerConfig};
    use std::fs;
    use tempfile::TempDir;

    fn builder<R: Record>() -> BoostBuilder<R> {
        Boost::builder::<R>()
            .registry(Arc::new(SchemaRegistry::new()))
            .env_vars(Vec::<(String, String)>::new())
    }

    fn cli(pairs: &[(&str, &str)]) -> SourceMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn app_name_derives_env_prefix() {
        let builder = Boost::builder::<AppConfig>().app_name("my-app");
        assert_eq!(builder.effective_env_prefix(), Some("MY_APP_".to_string()));
    }

    #[test]
    fn override_env_prefix() {
        let builder = Boost::builder::<AppConfig>()
            .app_name("myapp")
            .env_prefix("CUSTOM_");
        assert_eq!(builder.effective_env_prefix(), Some("CUSTOM_".to_string()));
    }

    #[test]
    fn no_app_name_means_empty_prefix() {
        let builder = Boost::builder::<AppConfig>();
        assert_eq!(builder.effective_env_prefix(), Some(String::new()));
    }

    #[test]
    fn no_env_disables_prefix() {
        let builder = Boost::builder::<AppConfig>().app_name("myapp").no_env();
        assert_eq!(builder.effective_env_prefix(), None);
        assert!(builder.effective_env().is_none());
    }

    #[test]
    fn load_defaults_only() {
        let config = builder::<AppConfig>().load().unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert_eq!(config.database.pool_size, 5);
    }

    #[test]
    fn env_overrides_defaults() {
        let config = builder::<AppConfig>()
            .app_name("app")
            .env_vars([("APP_PORT", "3000"), ("APP_DATABASE_URL", "pg://env")])
            .load()
            .unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.database.url.as_deref(), Some("pg://env"));
    }

    #[test]
    fn cli_overrides_env() {
        let config = builder::<AppConfig>()
            .app_name("app")
            .env_vars([("APP_PORT", "3000")])
            .cli(cli(&[("--port", "4000")]))
            .load()
            .unwrap();
        assert_eq!(config.port, 4000);
    }

    #[test]
    fn override_beats_cli() {
        let config = builder::<AppConfig>()
            .cli(cli(&[("port", "4000")]))
            .override_value("port", "5000")
            .load()
            .unwrap();
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn unknown_override_is_error_when_strict() {
        let result = builder::<AppConfig>().override_value("prot", "1").load();
        assert!(matches!(result, Err(BoostError::UnknownKey { .. })));
    }

    #[test]
    fn unknown_cli_keys_are_ignored() {
        let config = builder::<AppConfig>()
            .cli(cli(&[("verbose", "true"), ("host", "h")]))
            .load()
            .unwrap();
        assert_eq!(config.host, "h");
    }

    #[test]
    fn file_layer_below_env() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.toml");
        fs::write(&path, "host = \"file\"\nport = 1000\n[database]\npool_size = 2\n").unwrap();

        let config = builder::<AppConfig>()
            .app_name("app")
            .file(&path)
            .env_vars([("APP_PORT", "2000")])
            .load()
            .unwrap();
        assert_eq!(config.host, "file");
        assert_eq!(config.port, 2000);
        assert_eq!(config.database.pool_size, 2);
    }

    #[test]
    fn later_files_win() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.toml");
        let b = dir.path().join("b.toml");
        fs::write(&a, "port = 1\nhost = \"a\"\n").unwrap();
        fs::write(&b, "port = 2\n").unwrap();

        let config = builder::<AppConfig>().file(&a).file(&b).load().unwrap();
        assert_eq!(config.port, 2);
        assert_eq!(config.host, "a");
    }

    #[test]
    fn missing_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let config = builder::<AppConfig>()
            .file(dir.path().join("nope.toml"))
            .load()
            .unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn strict_file_rejects_unknown_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.toml");
        fs::write(&path, "prot = 1\n").unwrap();

        let result = builder::<AppConfig>().file(&path).load();
        assert!(matches!(result, Err(BoostError::UnknownKey { line: 1, .. })));

        let config = builder::<AppConfig>().file(&path).strict(false).load().unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn extra_source_between_files_and_env() {
        let extra: SourceMap = [("host", "extra"), ("port", "7")].into_iter().collect();
        let config = builder::<AppConfig>()
            .app_name("app")
            .source(extra)
            .env_vars([("APP_PORT", "8")])
            .load()
            .unwrap();
        assert_eq!(config.host, "extra");
        assert_eq!(config.port, 8);
    }

    #[test]
    fn missing_required_names_flag_and_env() {
        let err = builder::<ServerConfig>().app_name("db").load().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("--host"), "{msg}");
        assert!(msg.contains("DB_HOST"), "{msg}");
    }

    #[test]
    fn custom_env_naming() {
        fn dotted(prefix: &str, field: &crate::flatten::FlatField) -> String {
            format!("{prefix}{}", field.dotted_path())
        }
        let config = builder::<AppConfig>()
            .env_prefix("app.")
            .env_naming(dotted)
            .env_vars([("app.database.pool_size", "11")])
            .load()
            .unwrap();
        assert_eq!(config.database.pool_size, 11);
    }

    #[test]
    fn argument_decls_carry_env_values() {
        let builder = builder::<AppConfig>()
            .app_name("app")
            .env_vars([("APP_HOST", "0.0.0.0")]);
        let decls = builder.argument_decls().unwrap();
        let host = decls.iter().find(|d| d.id == "host").unwrap();
        assert_eq!(host.env_value.as_deref(), Some("0.0.0.0"));

        let help = builder.env_help().unwrap();
        assert!(help.contains("APP_HOST=0.0.0.0"));
    }

    #[test]
    fn env_help_empty_without_env() {
        let builder = builder::<AppConfig>().no_env();
        assert_eq!(builder.env_help().unwrap(), "");
    }
}
