use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::{errors::ConfigError, options::ResolverOptions};

pub const DEFAULT_ENV_PREFIX: &str = "WIRING_";

/// Layers the sources of [`ResolverOptions`].
///
/// Sources are merged in this order, later sources override earlier ones:
/// 1. `ResolverOptions::default()`
/// 2. the TOML file, if one is set and exists
/// 3. environment variables with the prefix, e.g. `WIRING_FULL_BINDING_GRAPH`
#[derive(Debug, Clone)]
pub struct OptionsLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl Default for OptionsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// The merged sources, before extraction
    pub fn figment(&self) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(ResolverOptions::default()));

        if let Some(path) = &self.config_path {
            if path.exists() {
                tracing::debug!("Loading resolver options from '{}'", path.display());
                figment = figment.merge(Toml::file(path));
            } else {
                tracing::warn!(
                    "Resolver options file '{}' does not exist, using defaults",
                    path.display()
                );
            }
        }

        figment.merge(Env::prefixed(&self.env_prefix))
    }

    pub fn load(&self) -> Result<ResolverOptions, ConfigError> {
        let options: ResolverOptions = self.figment().extract()?;
        tracing::debug!("Resolver options: {:?}", options);
        Ok(options)
    }
}
