//! Translator configuration.
//!
//! [`RiptideConfig`] is read from the `translator` section of
//! `config/config.toml` and from `RIPTIDE__TRANSLATOR__*` environment
//! variables. Nothing in the crate reads configuration implicitly; values
//! reach the translator and session only through their constructors.

use crate::dialect::{CapabilityRegistry, Dialect};
use crate::error::Result;
use crate::translate::Translator;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "RIPTIDE";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RiptideConfig {
    #[serde(default = "default_dialect")]
    pub dialect: Dialect,
    /// Cap on bound parameters per statement, tighter than the dialect's own
    #[serde(default)]
    pub max_parameters: Option<usize>,
    /// Log rendered statements at `trace` level before execution
    #[serde(default)]
    pub log_sql: bool,
}

fn default_dialect() -> Dialect {
    Dialect::Postgres
}

impl Default for RiptideConfig {
    fn default() -> Self {
        Self {
            dialect: default_dialect(),
            max_parameters: None,
            log_sql: false,
        }
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator("__")
}

fn section(settings: &Config) -> std::result::Result<RiptideConfig, ConfigError> {
    match settings.get::<RiptideConfig>("translator") {
        Ok(cfg) => Ok(cfg),
        Err(ConfigError::NotFound(_)) => Ok(RiptideConfig::default()),
        Err(e) => Err(ConfigError::Message(format!(
            "translator configuration could not be loaded: {e}"
        ))),
    }
}

impl RiptideConfig {
    /// Load from `config/config.toml` (optional) and the environment,
    /// falling back to the environment alone when the file is unreadable.
    ///
    /// A missing `translator` section yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if neither source can be read or the section
    /// does not deserialize.
    pub fn load() -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(env_source());

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if std::path::Path::new(CONFIG_FILE).exists() {
                    log::warn!("failed to load {CONFIG_FILE}, falling back to env: {err}");
                }
                Config::builder().add_source(env_source()).build().map_err(|env_err| {
                    ConfigError::Message(format!(
                        "failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                    ))
                })?
            }
        };
        Ok(section(&settings)?)
    }

    /// Parse a TOML document holding a `[translator]` table.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` on malformed TOML or invalid values.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Ok(section(&settings)?)
    }

    /// Translator for the configured dialect out of `registry`.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownDialect` if the registry has no entry for it.
    pub fn translator<'c>(&self, registry: &'c CapabilityRegistry) -> Result<Translator<'c>> {
        let translator = Translator::new(registry.get(self.dialect)?);
        Ok(match self.max_parameters {
            Some(max) => translator.with_max_parameters(max),
            None => translator,
        })
    }
}
