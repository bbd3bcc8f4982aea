use crate::animation::{AnimationConfig, CycleStyle, CycleTiming};
use crate::error::{AppResult, ConfigErrorKind, InfraError};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub http_addr: String,   // e.g. "0.0.0.0:5001"
    pub telnet_addr: String, // e.g. "0.0.0.0:5023"
    /// YAML content file; the embedded content is used when unset
    #[serde(default)]
    pub content_path: Option<String>,
    /// Skip preference for telnet sessions and first-time visitors
    #[serde(default)]
    pub skip_typing: bool,
    #[serde(default)]
    pub animation: AnimationSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub typing_speed_ms: u64,
    pub cycle_style: CycleStyle,
    /// Defaults depend on the cycle style
    pub cycle_dwell_ms: Option<u64>,
    pub fade_ms: u64,
    pub cycle_type_ms: u64,
    pub cycle_delete_ms: u64,
    pub cycle_gap_ms: u64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            typing_speed_ms: 5,
            cycle_style: CycleStyle::Fade,
            cycle_dwell_ms: None,
            fade_ms: 500,
            cycle_type_ms: 100,
            cycle_delete_ms: 50,
            cycle_gap_ms: 500,
        }
    }
}

impl AnimationSettings {
    pub fn to_config(&self) -> AnimationConfig {
        let defaults = CycleTiming::for_style(self.cycle_style);
        AnimationConfig {
            char_delay: Duration::from_millis(self.typing_speed_ms),
            cycle_style: self.cycle_style,
            cycle: CycleTiming {
                dwell: self.cycle_dwell_ms.map(Duration::from_millis).unwrap_or(defaults.dwell),
                fade: Duration::from_millis(self.fade_ms),
                type_delay: Duration::from_millis(self.cycle_type_ms),
                delete_delay: Duration::from_millis(self.cycle_delete_ms),
                gap: Duration::from_millis(self.cycle_gap_ms),
            },
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| InfraError::Config {
            path: path.to_path_buf(),
            source: ConfigErrorKind::Read(e),
        })?;
        let cfg: Self = toml::from_str(&data).map_err(|e| InfraError::Config {
            path: path.to_path_buf(),
            source: ConfigErrorKind::Parse(e),
        })?;
        Ok(cfg)
    }

    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(get: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AnimationSettings::default();
        let animation = AnimationSettings {
            typing_speed_ms: parse_var(&get, "TYPING_SPEED_MS", defaults.typing_speed_ms)?,
            cycle_style: parse_var(&get, "CYCLE_STYLE", defaults.cycle_style)?,
            cycle_dwell_ms: match get("CYCLE_DWELL_MS") {
                Some(_) => Some(parse_var(&get, "CYCLE_DWELL_MS", 0)?),
                None => None,
            },
            fade_ms: parse_var(&get, "FADE_MS", defaults.fade_ms)?,
            cycle_type_ms: parse_var(&get, "CYCLE_TYPE_MS", defaults.cycle_type_ms)?,
            cycle_delete_ms: parse_var(&get, "CYCLE_DELETE_MS", defaults.cycle_delete_ms)?,
            cycle_gap_ms: parse_var(&get, "CYCLE_GAP_MS", defaults.cycle_gap_ms)?,
        };

        let cfg = Self {
            http_addr: get("HTTP_ADDR").unwrap_or_else(|| "0.0.0.0:5001".to_string()),
            telnet_addr: get("TELNET_ADDR").unwrap_or_else(|| "0.0.0.0:5023".to_string()),
            content_path: get("CONTENT_PATH").filter(|p| !p.trim().is_empty()),
            skip_typing: parse_var(&get, "SKIP_TYPING", false)?,
            animation,
        };

        Ok(cfg)
    }

    pub fn http_socket_addr(&self) -> AppResult<SocketAddr> {
        parse_addr(&self.http_addr)
    }

    pub fn telnet_socket_addr(&self) -> AppResult<SocketAddr> {
        parse_addr(&self.telnet_addr)
    }
}

fn parse_addr(raw: &str) -> AppResult<SocketAddr> {
    raw.trim()
        .parse()
        .map_err(|e| InfraError::Addr(raw.to_string(), e).into())
}

fn parse_var<F, T>(get: &F, key: &str, default: T) -> AppResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| InfraError::InvalidEnv(key.to_string(), e.to_string()).into()),
    }
}
