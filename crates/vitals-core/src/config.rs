//! Layered configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the config dir
//!    (~/.config/vitals/config.toml on Linux)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Environment variables are applied on top:
//! - `VITALS_API_URL`: scoring service base URL
//! - `VITALS_BACKEND`: `http` (default) or `mock`

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../config/vitals.toml");

/// Which scoring backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Http,
    Mock,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" | "remote" => Ok(Self::Http),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown backend: {}. Available: http, mock", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub backend: BackendKind,
    pub base_url: String,
    /// Upper bound for every remote call
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub debounce: Duration,
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub page_width_mm: f64,
    pub filename: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub simulation: SimulationConfig,
    pub export: ExportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                backend: BackendKind::Http,
                base_url: "http://127.0.0.1:8000".to_string(),
                request_timeout: Duration::from_secs(30),
            },
            simulation: SimulationConfig {
                debounce: Duration::from_millis(500),
            },
            export: ExportConfig {
                page_width_mm: 210.0,
                filename: "financial_health_report.pdf".to_string(),
            },
        }
    }
}

impl Config {
    /// Load from `path` if given, else the default override location, else the
    /// embedded defaults; then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = load_file(path)?;
        config.apply_overrides(
            std::env::var("VITALS_API_URL").ok(),
            std::env::var("VITALS_BACKEND").ok(),
        );
        Ok(config)
    }

    /// Apply URL/backend overrides. Unknown backends are logged and ignored.
    pub fn apply_overrides(&mut self, base_url: Option<String>, backend: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.service.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(backend) = backend {
            match backend.parse() {
                Ok(kind) => self.service.backend = kind,
                Err(e) => tracing::warn!(backend = %backend, "{}, keeping configured backend", e),
            }
        }
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vitals").join("config.toml"))
}

fn load_file(path: Option<&Path>) -> Result<Config> {
    let content = match path {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?,
        None => match default_config_path() {
            Some(default_path) if default_path.exists() => fs::read_to_string(&default_path)
                .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?,
            _ => DEFAULT_CONFIG.to_string(),
        },
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    service: Option<RawService>,
    simulation: Option<RawSimulation>,
    export: Option<RawExport>,
}

#[derive(Debug, Deserialize)]
struct RawService {
    backend: Option<String>,
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawSimulation {
    debounce_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawExport {
    page_width_mm: Option<f64>,
    filename: Option<String>,
}

/// Parse config from TOML content; absent keys keep their defaults
fn parse_config(content: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = Config::default();

    if let Some(service) = raw.service {
        if let Some(backend) = service.backend {
            config.service.backend = backend.parse().map_err(Error::Config)?;
        }
        if let Some(url) = service.base_url {
            config.service.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = service.request_timeout_secs {
            if secs == 0 {
                return Err(Error::Config("request_timeout_secs must be positive".into()));
            }
            config.service.request_timeout = Duration::from_secs(secs);
        }
    }

    if let Some(simulation) = raw.simulation {
        if let Some(ms) = simulation.debounce_ms {
            config.simulation.debounce = Duration::from_millis(ms);
        }
    }

    if let Some(export) = raw.export {
        if let Some(width) = export.page_width_mm {
            if !(width.is_finite() && width > 0.0) {
                return Err(Error::Config("page_width_mm must be positive".into()));
            }
            config.export.page_width_mm = width;
        }
        if let Some(filename) = export.filename {
            config.export.filename = filename;
        }
    }

    Ok(config)
}
