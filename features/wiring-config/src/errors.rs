/// Errors when trying to load resolver options
#[derive(thiserror::Error, Debug, Clone)]
pub enum ConfigError {
    /// A source could not be read or did not match the options
    #[error("Failed to load resolver options: {0}")]
    Extract(#[from] figment::Error),
}
