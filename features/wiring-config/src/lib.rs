//! Wiring Config holds the options that steer binding graph resolution and validation.
//!
//! Options are layered: built-in defaults, then an optional TOML file, then environment
//! variables prefixed with `WIRING_`. Later layers win.
//!
//! # Examples
//!
//! ```rust
//! use wiring_config::{OptionsLoader, ResolverOptions};
//!
//! let options = OptionsLoader::new().load().unwrap_or_default();
//! assert!(!ResolverOptions::default().full_binding_graph);
//! # let _ = options;
//! ```
//!
//! Wiring Config consists of the following components:
//!
//! 1. Options - the resolver options and their policies
//! 2. Loader - for layering the option sources
//! 3. Errors - for config errors

pub mod errors;
pub mod loader;
pub mod options;

pub use errors::ConfigError;
pub use loader::OptionsLoader;
pub use options::{ResolverOptions, Severity, UndeclaredMultibindings};
