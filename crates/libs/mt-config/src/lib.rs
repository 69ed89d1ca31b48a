//! Configuration management for the Media Toolkit.
//!
//! Settings come from the process environment, optionally seeded from a
//! dotenv file (`data_settings/.env` by default). The prompt catalog for the
//! content panel is built in but can be replaced by a TOML file.
//!
//! # Usage
//!
//! ```rust,no_run
//! use mt_config::{load_env_file, AppConfig};
//!
//! load_env_file();
//! let config = AppConfig::from_env();
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

pub mod config;
pub mod env_file;
pub mod error;
pub mod prelude;
pub mod prompts;

pub use config::AppConfig;
pub use env_file::load_env_file;
pub use prompts::{PromptCatalog, PromptTemplate};
