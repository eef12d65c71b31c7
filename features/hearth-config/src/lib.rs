//! Hearth Config provides a registry of configs that can be injected in the rest of the
//! application.
//!
//! Hearth Config is split into two major parts:
//! 1. ConfigProvider: Used to create the registry of all configs and install it into a container
//! 2. Config<T>: A wrapper type to be able to resolve and retrieve configs
//!
//! # Examples
//!
//! ```rust
//! use hearth_config::provider::ConfigProvider;
//!
//! #[derive(Clone)]
//! struct AppConfig {
//!     host: String,
//!     port: u16,
//! }
//!
//! let mut config_provider = ConfigProvider::new();
//! config_provider
//!     .add_config(AppConfig {
//!         host: "localhost".to_string(),
//!         port: 8080_u16,
//!     })
//!     .unwrap();
//!
//! let retrieved_config = config_provider.get_config::<AppConfig>().unwrap();
//! assert_eq!(retrieved_config.host, "localhost");
//! assert_eq!(retrieved_config.port, 8080);
//! ```
//!
//! Hearth Config consists of the following components:
//!
//! 1. Config - for handling resolution of a single config
//! 2. Provider - for creating a registry of configs, adding and retrieving configs
//! 3. Errors - for config errors

pub mod config;
pub mod errors;
pub mod provider;

pub use config::Config;
pub use errors::ConfigError;
pub use provider::ConfigProvider;
