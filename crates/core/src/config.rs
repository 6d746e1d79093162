//! Service configuration.
//!
//! Settings are read once at startup into a [`ServiceConfig`] and handed to
//! the pipeline explicitly. [`ServiceConfig::from_lookup`] takes the variable
//! source as a closure so tests never touch the process environment.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Template file used when no override is configured.
pub const DEFAULT_TEMPLATE_PATH: &str = "public/templates/report_template.pptx";

/// How long the converter may run before it is killed.
pub const DEFAULT_CONVERSION_TIMEOUT: Duration = Duration::from_secs(120);

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

/// Environment variable names.
pub mod env {
    pub const TEMPLATE_PATH: &str = "PPTX_TEMPLATE_PATH";
    pub const TEMPLATE_URL: &str = "PPTX_TEMPLATE_URL";
    pub const CONVERTER_PATH: &str = "LIBREOFFICE_PATH";
    pub const CONVERSION_TIMEOUT_SECS: &str = "CONVERSION_TIMEOUT_SECS";
    pub const CONVERSION_WORK_DIR: &str = "CONVERSION_WORK_DIR";
    pub const HOST: &str = "HOST";
    pub const PORT: &str = "PORT";
}

/// Where the PPTX template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateLocation {
    /// A file on the local filesystem.
    Path(PathBuf),
    /// An HTTP(S) URL fetched on every request.
    Url(String),
}

impl TemplateLocation {
    /// Resolve a path override: it is used only if it exists, otherwise the
    /// default template path is used.
    pub fn from_path_override(path: Option<&Path>) -> Self {
        match path {
            Some(p) if p.exists() => Self::Path(p.to_path_buf()),
            Some(p) => {
                log::warn!(
                    "Template override {} does not exist, using {}",
                    p.display(),
                    DEFAULT_TEMPLATE_PATH
                );
                Self::default()
            }
            None => Self::default(),
        }
    }

    /// Human-readable form for logs and the health endpoint.
    pub fn describe(&self) -> String {
        match self {
            Self::Path(p) => p.display().to_string(),
            Self::Url(u) => u.clone(),
        }
    }
}

impl Default for TemplateLocation {
    fn default() -> Self {
        Self::Path(PathBuf::from(DEFAULT_TEMPLATE_PATH))
    }
}

/// Settings for the external PPTX-to-PDF converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterSettings {
    /// Explicit converter executable. `None` means look `soffice` up on `PATH`.
    pub executable: Option<PathBuf>,

    /// Maximum run time of one conversion.
    pub timeout: Duration,

    /// Parent directory for per-conversion scratch directories.
    /// `None` uses the system temp directory.
    pub work_dir: Option<PathBuf>,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            executable: None,
            timeout: DEFAULT_CONVERSION_TIMEOUT,
            work_dir: None,
        }
    }
}

impl ConverterSettings {
    /// Use a specific converter executable.
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// Set the conversion timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create scratch directories under `dir`.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }
}

/// Complete configuration of the report service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub template: TemplateLocation,
    pub converter: ConverterSettings,
    pub host: String,
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            template: TemplateLocation::default(),
            converter: ConverterSettings::default(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServiceConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration from an arbitrary variable source.
    ///
    /// Empty values count as unset. A template URL takes precedence over a
    /// template path.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let template = match get(env::TEMPLATE_URL) {
            Some(url) => TemplateLocation::Url(url.trim().to_string()),
            None => TemplateLocation::from_path_override(
                get(env::TEMPLATE_PATH).map(PathBuf::from).as_deref(),
            ),
        };

        let mut converter = ConverterSettings::default();
        if let Some(path) = get(env::CONVERTER_PATH) {
            converter.executable = Some(PathBuf::from(path));
        }
        if let Some(secs) = get(env::CONVERSION_TIMEOUT_SECS) {
            converter.timeout = parse_timeout(&secs)?;
        }
        if let Some(dir) = get(env::CONVERSION_WORK_DIR) {
            converter.work_dir = Some(PathBuf::from(dir));
        }

        let host = get(env::HOST).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(env::PORT) {
            Some(port) => port.trim().parse().map_err(|_| {
                Error::ConfigError(format!("{} must be a port number, got {:?}", env::PORT, port))
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            template,
            converter,
            host,
            port,
        })
    }
}

/// Parse a positive number of seconds.
pub fn parse_timeout(value: &str) -> Result<Duration> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(Error::ConfigError(format!(
            "{} must be a positive number of seconds, got {:?}",
            env::CONVERSION_TIMEOUT_SECS,
            value
        ))),
    }
}
