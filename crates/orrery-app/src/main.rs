//! The binary entry point for the orrery.

use clap::Parser;
use orrery_app::platform::PlatformDirs;
use orrery_app::reload::ConfigWatch;
use orrery_config::{CliArgs, Config};
use tracing::info;

fn main() {
    let args = CliArgs::parse();

    let dirs = match PlatformDirs::resolve_and_create(args.config.as_deref()) {
        Ok(dirs) => dirs,
        Err(e) => {
            eprintln!("Failed to initialize platform directories: {e}");
            std::process::exit(1);
        }
    };

    let file_config = match Config::load_or_create(&dirs.config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config, using defaults: {e}");
            Config::default()
        }
    };
    let watch = ConfigWatch::new(dirs.config_dir.clone(), args, file_config);
    let config = watch.effective();

    orrery_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    info!(
        config = %dirs.config_dir.display(),
        logs = %dirs.log_dir.display(),
        "Orrery starting"
    );

    if let Err(e) = orrery_app::window::run(config, Some(watch)) {
        tracing::error!("Event loop failed: {e}");
        std::process::exit(1);
    }
}
