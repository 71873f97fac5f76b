//! Polls `config.ron` while the orrery runs and hands back edited settings.

use std::path::PathBuf;
use std::time::Duration;

use orrery_config::{CliArgs, Config};
use tracing::{info, warn};

/// Time between re-reads of the config file.
pub const RELOAD_INTERVAL: Duration = Duration::from_secs(2);

pub struct ConfigWatch {
    dir: PathBuf,
    /// Re-applied over every reload so command-line values keep winning.
    overrides: CliArgs,
    /// Settings as last read from disk, before overrides.
    file: Config,
    last_poll: Duration,
    last_error: Option<String>,
}

impl ConfigWatch {
    pub fn new(dir: PathBuf, overrides: CliArgs, file: Config) -> Self {
        Self {
            dir,
            overrides,
            file,
            last_poll: Duration::ZERO,
            last_error: None,
        }
    }

    /// The file settings with the command-line overrides applied.
    pub fn effective(&self) -> Config {
        let mut config = self.file.clone();
        config.apply_cli_overrides(&self.overrides);
        config
    }

    /// Re-read the file once `RELOAD_INTERVAL` has passed since the last
    /// read. Returns the new effective settings when the file changed.
    pub fn poll(&mut self, now: Duration) -> Option<Config> {
        if now.saturating_sub(self.last_poll) < RELOAD_INTERVAL {
            return None;
        }
        self.last_poll = now;
        match self.file.reload(&self.dir) {
            Ok(Some(file)) => {
                self.file = file;
                self.last_error = None;
                info!(dir = %self.dir.display(), "config file changed");
                Some(self.effective())
            }
            Ok(None) => {
                self.last_error = None;
                None
            }
            Err(e) => {
                // A half-written file fails every poll until it is saved again.
                let message = e.to_string();
                if self.last_error.as_deref() != Some(message.as_str()) {
                    warn!(error = %message, "config reload failed, keeping current settings");
                    self.last_error = Some(message);
                }
                None
            }
        }
    }
}
