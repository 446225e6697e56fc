//! Bridge configuration
//!
//! Settings come from three layers: built-in defaults, an optional TOML file,
//! and command-line overrides (highest precedence).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default baud rate for the bridged device
pub const DEFAULT_BAUD: u32 = 9600;

/// Default read timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Default receiver poll interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Label shown in front of lines received from the device
pub const DEFAULT_REMOTE_LABEL: &str = "ESP32";

/// Label used for the local input prompt
pub const DEFAULT_LOCAL_LABEL: &str = "RPi";

/// Platform-specific default device path
pub fn default_port_path() -> &'static str {
    if cfg!(target_os = "linux") {
        "/dev/serial0"
    } else if cfg!(target_os = "macos") {
        "/dev/tty.usbserial"
    } else if cfg!(windows) {
        "COM1"
    } else {
        "/dev/ttyS0"
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Terminator appended to every transmitted line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    Crlf,
    /// `\r`
    Cr,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
            LineEnding::Cr => "\r",
        }
    }
}

/// Runtime configuration for the bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Serial device path (e.g., /dev/serial0, /dev/ttyUSB0, COM3)
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Read timeout for a single line, in milliseconds
    pub timeout_ms: u64,
    /// Sleep between polls when no bytes are waiting, in milliseconds
    pub poll_interval_ms: u64,
    /// Label printed before received lines
    pub remote_label: String,
    /// Label used for the input prompt
    pub local_label: String,
    /// Terminator appended to transmitted lines
    pub line_ending: LineEnding,
    /// Prefix received lines with local wall-clock time
    pub timestamps: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: default_port_path().to_string(),
            baud_rate: DEFAULT_BAUD,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            remote_label: DEFAULT_REMOTE_LABEL.to_string(),
            local_label: DEFAULT_LOCAL_LABEL.to_string(),
            line_ending: LineEnding::Lf,
            timestamps: false,
        }
    }
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub remote_label: Option<String>,
    pub local_label: Option<String>,
    pub line_ending: Option<LineEnding>,
    pub timestamps: bool,
}

impl BridgeConfig {
    /// Load a configuration file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the effective configuration from an optional file plus overrides
    pub fn resolve(path: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(baud) = overrides.baud_rate {
            self.baud_rate = baud;
        }
        if let Some(timeout) = overrides.timeout_ms {
            self.timeout_ms = timeout;
        }
        if let Some(label) = overrides.remote_label {
            self.remote_label = label;
        }
        if let Some(label) = overrides.local_label {
            self.local_label = label;
        }
        if let Some(ending) = overrides.line_ending {
            self.line_ending = ending;
        }
        if overrides.timestamps {
            self.timestamps = true;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port.trim().is_empty() {
            return Err(ConfigError::Invalid("port path is empty".into()));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud rate must be non-zero".into()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("read timeout must be non-zero".into()));
        }
        if self.remote_label.is_empty() || self.local_label.is_empty() {
            return Err(ConfigError::Invalid("labels must not be empty".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Prompt printed before each line of local input
    pub fn prompt(&self) -> String {
        format!("{} >> ", self.local_label)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
