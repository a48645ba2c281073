use crate::error::{ForkerError, Result};
use serde::Deserialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming a configuration file when `--config` is absent.
pub const CONFIG_ENV_VAR: &str = "FORKER_CONFIG";

const DEFAULT_BUFFER_SIZE: usize = 1024;
const DEFAULT_FIFO_MODE: u32 = 0o666;

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct ForkerConfig {
    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub fifo: FifoConfig,

    #[serde(default)]
    pub detach: DetachConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RelayConfig {
    /// Bytes requested per read from the input source.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FifoConfig {
    /// Permission bits given to a named pipe created at the input path.
    #[serde(default = "default_fifo_mode")]
    pub mode: u32,
}

impl Default for FifoConfig {
    fn default() -> Self {
        Self {
            mode: DEFAULT_FIFO_MODE,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DetachConfig {
    /// Start a new session in the detached process, dropping the controlling terminal.
    #[serde(default = "default_true")]
    pub new_session: bool,
}

impl Default for DetachConfig {
    fn default() -> Self {
        Self { new_session: true }
    }
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_fifo_mode() -> u32 {
    DEFAULT_FIFO_MODE
}

fn default_true() -> bool {
    true
}

impl ForkerConfig {
    /// Resolve the configuration from an explicit path, then `FORKER_CONFIG`,
    /// then the built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        Self::resolve_with(explicit, std::env::var_os(CONFIG_ENV_VAR))
    }

    fn resolve_with(explicit: Option<&Path>, from_env: Option<OsString>) -> Result<Self> {
        let path = match (explicit, from_env) {
            (Some(path), _) => path.to_path_buf(),
            (None, Some(value)) if !value.is_empty() => PathBuf::from(value),
            _ => {
                log::trace!("No configuration file given, using defaults");
                return Ok(Self::default());
            }
        };

        Self::load(&path)
    }

    pub fn load(config_path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(config_path).map_err(|e| {
            ForkerError::ConfigFile(format!("Failed to read {}: {e}", config_path.display()))
        })?;
        let config: ForkerConfig = toml::from_str(&contents).map_err(|e| {
            ForkerError::InvalidConfig(format!("Failed to parse {}: {e}", config_path.display()))
        })?;
        config.validate()?;

        log::debug!("Loaded config from {config_path:?}");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.relay.buffer_size == 0 {
            return Err(ForkerError::InvalidConfig(
                "relay.buffer_size must be greater than zero".to_string(),
            ));
        }
        if self.fifo.mode > 0o777 {
            return Err(ForkerError::InvalidConfig(format!(
                "fifo.mode {:#o} has bits outside 0o777",
                self.fifo.mode
            )));
        }
        Ok(())
    }
}
