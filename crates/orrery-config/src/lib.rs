//! Configuration for the orrery.
//!
//! Settings persist as `config.ron` in the platform config directory, can be
//! re-read for hot reload, and are overridden from the command line via clap.

mod cli;
mod config;
mod error;

pub use cli::{CliArgs, InteractionArg};
pub use config::{CONFIG_FILE, Config, DebugConfig, RenderConfig, WindowConfig};
pub use error::ConfigError;
