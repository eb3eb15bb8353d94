//! Configuration management for componentry
//!
//! Two layers of configuration exist:
//!
//! - `schema`/`io` - user settings in `~/.config/componentry/config.toml`
//!   (registry endpoints, project file name)
//! - `project` - the consumer project's `components.json` alias mapping
//!
//! `paths` locates the user-level files.
//!
//! ## Usage
//!
//! ```rust
//! use componentry::config;
//!
//! # fn example() -> anyhow::Result<()> {
//! let settings = config::load_settings()?;
//! let aliases = config::load_project_config(std::path::Path::new(&settings.project_config))?;
//! # Ok(())
//! # }
//! ```

pub mod io;
pub mod paths;
pub mod project;
pub mod schema;

pub use io::{load_settings, save_settings, set_setting, update_settings};
pub use paths::{get_componentry_dir, get_config_path, get_log_dir};
pub use project::{AliasConfiguration, COMPONENTS_ALIAS, load_project_config};
pub use schema::Settings;
