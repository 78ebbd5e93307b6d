//! `Config` (§3/§6), loaded with a `figment`-layered YAML file plus
//! environment overrides — the same pattern the teacher's `AppConfig` uses,
//! narrowed to this kernel's own schema (§10.3).

use std::path::Path;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ModelError, StartupError};
use crate::model::Document;

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TlsConfig {
    pub enabled: bool,
    pub cert: String,
    pub key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ValidateFlags {
    pub request: bool,
    pub response: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    /// Path to the OpenAPI 3 document. Empty means "no routes".
    pub oas3: Option<String>,
    /// `host:port`; empty resolves to `0.0.0.0:8000` in `init`.
    pub address: Option<String>,
    pub tls: TlsConfig,
    #[serde(rename = "static")]
    pub static_dir: Option<String>,
    pub validate: ValidateFlags,
    /// Populated by `init` from `oas3`; not part of the on-disk schema.
    #[serde(skip)]
    pub model: Option<Document>,
}

impl Config {
    /// Normalises defaults and loads the OpenAPI document. Idempotent: running
    /// it twice on the same struct produces the same field values (§8
    /// invariant 6), since every step here is either already-normalized-is-a-
    /// no-op or a pure function of already-normalized input.
    pub fn init(&mut self) -> Result<(), ModelError> {
        if self.tls.cert.is_empty() || self.tls.key.is_empty() {
            self.tls.enabled = false;
        }
        if self.address.as_deref().unwrap_or("").is_empty() {
            self.address = Some("0.0.0.0:8000".to_string());
        }
        if let Some(path) = self.oas3.as_deref() {
            if !path.is_empty() {
                self.model = Some(Document::load(path)?);
            }
        }
        Ok(())
    }

    /// Loads a YAML (or JSON, a syntactic subset of YAML for this schema's
    /// shapes) config file, merges `OAS3_`-prefixed environment overrides,
    /// then runs `init`.
    pub fn load(path: impl AsRef<Path>) -> Result<Config, StartupError> {
        let figment = Figment::new()
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("OAS3_").split("__"));
        let mut cfg: Config = figment.extract().map_err(ConfigError::Parse)?;
        cfg.init()?;
        Ok(cfg)
    }

    /// Loads `path` if given and valid, otherwise returns a defaulted config.
    /// Mirrors the source's `SafeLoad`: a bad or absent config file is not
    /// fatal on its own.
    pub fn load_or_default(path: Option<&Path>) -> Config {
        match path.map(Config::load) {
            Some(Ok(cfg)) => cfg,
            _ => {
                let mut cfg = Config::default();
                let _ = cfg.init();
                cfg
            }
        }
    }
}
