//! Configuration loading and directory resolution.
//!
//! Config files: `wheelhouse.toml`, `wheelhouse.yaml`, or `wheelhouse.json`.
//! Searched in `./` then the platform config dir (`~/.config/wheelhouse/` on
//! Linux).
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod loader;
pub mod schema;

pub use {
    loader::{
        clear_config_dir, clear_data_dir, config_dir, data_dir, database_path, discover_and_load,
        find_or_default_config_path, load_config, set_config_dir, set_data_dir, uploads_dir,
    },
    schema::{AuthConfig, SeedConfig, ServerConfig, WheelhouseConfig},
};
