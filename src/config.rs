use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Smallest panel the fixed dashboard layout fits on.
pub const MIN_DISPLAY_WIDTH: u32 = 250;
pub const MIN_DISPLAY_HEIGHT: u32 = 122;
pub const MAX_DISPLAY_SIDE: u32 = 4096;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub primary: EndpointConfig,
    pub secondary: EndpointConfig,
    #[serde(default = "default_api_path")]
    pub api_path: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_interface")]
    pub interface: String,
    #[serde(default = "default_state_file")]
    pub state_file: String,
    #[serde(default = "default_require_root")]
    pub require_root: bool,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    #[serde(default = "default_display_width")]
    pub width: u32,
    #[serde(default = "default_display_height")]
    pub height: u32,
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default)]
    pub format: FrameFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    /// Packed 1-bit rows, bit set = white.
    #[default]
    Raw,
    /// Binary portable bitmap (P4).
    Pbm,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            primary: EndpointConfig {
                host: "192.168.1.250".to_string(),
                port: 85,
            },
            secondary: EndpointConfig {
                host: "192.168.68.250".to_string(),
                port: 80,
            },
            api_path: default_api_path(),
            timeout_ms: default_timeout_ms(),
            interface: default_interface(),
            state_file: default_state_file(),
            require_root: default_require_root(),
            display: DisplayConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_display_width(),
            height: default_display_height(),
            output_path: default_output_path(),
            format: FrameFormat::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("не удалось прочитать файл конфигурации {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("не удалось разобрать YAML в {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("ошибка валидации конфигурации: {0}")]
    Validation(String),
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let cfg: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_endpoint("primary", &self.primary)?;
        validate_endpoint("secondary", &self.secondary)?;

        if !self.api_path.starts_with('/') {
            return Err(ConfigError::Validation(
                "api_path должен начинаться с '/'".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "timeout_ms должен быть > 0".to_string(),
            ));
        }
        if self.interface.trim().is_empty() {
            return Err(ConfigError::Validation(
                "поле interface обязательно".to_string(),
            ));
        }
        if self.state_file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "поле state_file обязательно".to_string(),
            ));
        }

        validate_display(&self.display)?;

        Ok(())
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config.yaml.example")
    }
}

fn validate_endpoint(name: &str, endpoint: &EndpointConfig) -> Result<(), ConfigError> {
    if endpoint.host.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "{name}.host не должен быть пустым"
        )));
    }
    if endpoint.port == 0 {
        return Err(ConfigError::Validation(format!(
            "{name}.port должен быть в диапазоне 1..65535"
        )));
    }
    Ok(())
}

fn validate_display(cfg: &DisplayConfig) -> Result<(), ConfigError> {
    if cfg.width < MIN_DISPLAY_WIDTH || cfg.height < MIN_DISPLAY_HEIGHT {
        return Err(ConfigError::Validation(format!(
            "display должен быть не меньше {MIN_DISPLAY_WIDTH}x{MIN_DISPLAY_HEIGHT}, задано {}x{}",
            cfg.width, cfg.height
        )));
    }
    if cfg.width > MAX_DISPLAY_SIDE || cfg.height > MAX_DISPLAY_SIDE {
        return Err(ConfigError::Validation(format!(
            "display не может быть больше {MAX_DISPLAY_SIDE}x{MAX_DISPLAY_SIDE}, задано {}x{}",
            cfg.width, cfg.height
        )));
    }
    if cfg.output_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "display.output_path не должен быть пустым".to_string(),
        ));
    }
    Ok(())
}

fn default_api_path() -> String {
    "/admin/api.php".to_string()
}

const fn default_timeout_ms() -> u64 {
    8000
}

fn default_interface() -> String {
    "wlan0".to_string()
}

fn default_state_file() -> String {
    "/tmp/.pihole-dashboard-output".to_string()
}

const fn default_require_root() -> bool {
    true
}

const fn default_display_width() -> u32 {
    MIN_DISPLAY_WIDTH
}

const fn default_display_height() -> u32 {
    MIN_DISPLAY_HEIGHT
}

fn default_output_path() -> String {
    "/dev/epd0".to_string()
}
