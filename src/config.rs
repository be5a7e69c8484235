use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Receiver configuration.
///
/// Keys mirror `config.yaml` on the collector host. Every field has a
/// default, so a missing config file yields a fully working configuration;
/// unknown keys in the file are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiverConfig {
    /// Bind address for the HTTP listener
    #[serde(default = "default_listen_host")]
    pub listen_host: String,
    /// Bind port for the HTTP listener
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Root of the RMS data tree (leading `~` is expanded)
    #[serde(default = "default_data_dir")]
    pub rms_data_dir: String,
    /// Subdirectory for FF binaries
    #[serde(default = "default_captured_subdir")]
    pub captured_subdir: String,
    /// Subdirectory for timelapse stacks
    #[serde(default = "default_stack_subdir")]
    pub stack_subdir: String,
    /// Trigger the detection script after each FF upload
    #[serde(default)]
    pub rms_run_on_receive: bool,
    /// Command template for the detection run; the night directory is appended
    #[serde(default = "default_detect_script")]
    pub rms_detect_script: String,
    /// Minimum log severity (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format: "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_listen_host() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    8765
}

fn default_data_dir() -> String {
    "~/RMS_data".to_string()
}

fn default_captured_subdir() -> String {
    "CapturedFiles".to_string()
}

fn default_stack_subdir() -> String {
    "Stacks".to_string()
}

fn default_detect_script() -> String {
    "python3 -m RMS.DetectStarsAndMeteors".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl ReceiverConfig {
    /// Load configuration from an optional file plus environment overrides.
    ///
    /// A missing file is not an error; defaults apply. Environment
    /// variables prefixed `RECEIVER_` override file values
    /// (e.g. `RECEIVER_LISTEN_PORT=9000`).
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()).required(false))
            .add_source(config::Environment::with_prefix("RECEIVER").try_parsing(true))
            .build()?;

        config.try_deserialize().map_err(Into::into)
    }

    /// Root directory for FF binaries.
    pub fn captured_root(&self) -> PathBuf {
        expand_tilde(&self.rms_data_dir).join(&self.captured_subdir)
    }

    /// Root directory for timelapse stacks.
    pub fn stack_root(&self) -> PathBuf {
        expand_tilde(&self.rms_data_dir).join(&self.stack_subdir)
    }

    /// Bind address for the HTTP listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            listen_host: default_listen_host(),
            listen_port: default_listen_port(),
            rms_data_dir: default_data_dir(),
            captured_subdir: default_captured_subdir(),
            stack_subdir: default_stack_subdir(),
            rms_run_on_receive: false,
            rms_detect_script: default_detect_script(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// Expand a leading `~` to the user's home directory. Values from
/// config.yaml arrive as raw strings, so this mirrors what a shell
/// would have done.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        if path == "~" {
            return PathBuf::from(home);
        }
        if let Some(rest) = path.strip_prefix("~/") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}
