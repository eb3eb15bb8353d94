pub mod commands;
pub mod config;
pub mod error;
pub mod install;
pub mod logging;
pub mod prompt;
pub mod registry;
pub mod resolve;
pub mod scaffold;
pub mod template;

pub use error::{BuildError, ParseError, RegistryError};
pub use install::{InstallReport, Installer, Outcome};
pub use resolve::{InstallPlan, resolve};

/// Default port for `componentry serve`
pub const DEFAULT_SERVE_PORT: u16 = 8086;
