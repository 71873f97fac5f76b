//! Command-line arguments for the orrery.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use orrery_sun::InteractionMode;

use crate::Config;

/// What a click on the sun does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InteractionArg {
    /// Push out, then fall back after the pulse.
    Pulse,
    /// Alternate between pushed out and at rest.
    Toggle,
}

impl From<InteractionArg> for InteractionMode {
    fn from(arg: InteractionArg) -> Self {
        match arg {
            InteractionArg::Pulse => InteractionMode::Pulse,
            InteractionArg::Toggle => InteractionMode::Toggle,
        }
    }
}

/// Orrery command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "orrery", about = "Voxel sun and orbiting section planets")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Seed for column placement and planet phases.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log filter (error, warn, info, debug, trace, or directives).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Sun click behaviour.
    #[arg(long, value_enum)]
    pub interaction: Option<InteractionArg>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(seed) = args.seed {
            self.sun.seed = Some(seed);
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(mode) = args.interaction {
            self.sun.interaction = mode.into();
        }
    }
}
